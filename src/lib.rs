//! FeedbackLoop - a small feedback log with a score leaderboard.
//!
//! Users log in by name, submit structured insights (role, wish, goal) and
//! earn one point per insight. The [`state::StateStore`] owns the session,
//! score table and insight log; the [`storage::PersistenceAdapter`] mirrors
//! them into a key-value store on a best-effort basis.

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;
#[cfg(not(target_arch = "wasm32"))]
pub mod commands;
#[cfg(not(target_arch = "wasm32"))]
pub mod config;
pub mod logging;
pub mod models;
pub mod state;
pub mod storage;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm;


/// Library-level error type for FeedbackLoop operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Kdl(#[from] kdl::KdlError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for FeedbackLoop operations.
pub type Result<T> = std::result::Result<T, Error>;
