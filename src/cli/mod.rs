//! CLI argument definitions for FeedbackLoop.

use crate::storage::BackendType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FL_GIT_COMMIT"),
    ", built ",
    env!("FL_BUILD_TIMESTAMP"),
    ")"
);

/// FeedbackLoop - log insights, climb the leaderboard.
///
/// Start with `fl login <name>`, then `fl add` to submit an insight.
#[derive(Parser, Debug)]
#[command(name = "fl")]
#[command(author, version, long_version = LONG_VERSION, about = "Log structured feedback insights and track a score leaderboard", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Directory holding the storage file. Can also be set via FL_DATA_DIR.
    #[arg(long = "data-dir", global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Storage backend. Can also be set via FL_BACKEND.
    ///
    /// `memory` starts from the defaults on every run and keeps nothing
    /// once the command exits; it is meant for dry runs and tests.
    #[arg(long = "backend", global = true, value_name = "file|memory", value_parser = parse_backend)]
    pub backend: Option<BackendType>,

    /// Log filter directive (e.g. "debug"). Can also be set via FL_LOG.
    #[arg(long = "log", global = true, value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Directory containing config.kdl.
    #[arg(long = "config-dir", global = true, env = "FL_CONFIG_DIR", value_name = "PATH")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

fn parse_backend(s: &str) -> Result<BackendType, String> {
    BackendType::parse(s).ok_or_else(|| format!("unknown backend '{}', expected file or memory", s))
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in by name (unknown names start with 0 points)
    Login {
        /// Username; surrounding whitespace is ignored
        name: String,
    },

    /// Log out the current user
    Logout,

    /// Submit an insight as the logged-in user
    ///
    /// Reads as: "As a <role>, I wish <wish>, so that <goal>."
    Add {
        /// Who you are ("As a ...")
        #[arg(long)]
        role: String,

        /// What you want ("I wish ...")
        #[arg(long)]
        wish: String,

        /// Why you want it ("so that ...")
        #[arg(long)]
        goal: String,
    },

    /// Show the full state: session, scores and insights
    State,

    /// Show the logged-in user
    Whoami,

    /// Show users ranked by score
    Leaderboard,

    /// Show submitted insights, newest first
    Insights {
        /// Only show the newest N insights
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration and where each value came from
    Show,

    /// Set a value in config.kdl
    Set {
        /// Configuration key (output-format, data-dir, storage-backend, log-filter)
        key: String,
        /// Configuration value
        value: String,
    },
}
