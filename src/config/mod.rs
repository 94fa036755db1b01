//! Configuration for FeedbackLoop.
//!
//! ## config.kdl - User preferences
//!
//! Located at `~/.config/feedbackloop/config.kdl` (or `$FL_CONFIG_DIR/config.kdl`).
//!
//! Contains:
//! - `output-format` - "json" or "human"
//! - `data-dir` - Where the storage file lives
//! - `storage-backend` - "file" or "memory"
//! - `log-filter` - `tracing` filter directive
//!
//! ## Precedence
//!
//! CLI flag > environment variable > config.kdl > defaults
//!
//! `fl config set <key> <value>` edits config.kdl in place.
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    BACKEND_ENV, CONFIG_DIR_ENV, ConfigOverrides, DATA_DIR_ENV, DEFAULT_LOG_FILTER, LOG_ENV,
    Resolved, ResolvedConfig, ValueSource, default_config_dir, default_data_dir, resolve_config,
    resolve_with,
};
pub use schema::{CONFIG_FILE_NAME, CONFIG_KEYS, FeedbackConfig, OutputFormat};
