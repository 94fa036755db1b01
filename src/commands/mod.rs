//! Command implementations for the `fl` CLI.
//!
//! Each command validates its input the way the UI layer is expected to
//! (trimmed, non-empty), calls into [`StateStore`] and returns a result
//! that renders as JSON or as human-readable text.

use crate::config::{FeedbackConfig, ResolvedConfig};
use crate::models::{AppState, Insight, LeaderboardEntry, insight_count_label};
use crate::state::StateStore;
use crate::storage::{BackendType, FileBackend, MemoryBackend, PersistenceAdapter, StorageBackend};
use crate::{Error, Result};
use chrono::{Local, TimeZone};
use serde::Serialize;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Open the store described by the resolved config.
pub fn open_store(config: &ResolvedConfig) -> StateStore {
    let backend: Box<dyn StorageBackend> = match config.storage_backend() {
        BackendType::File => Box::new(FileBackend::new(config.data_dir())),
        BackendType::Memory => Box::new(MemoryBackend::new()),
    };
    StateStore::open(PersistenceAdapter::new(backend))
}

fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => millis.to_string(),
    }
}

// === login ===

#[derive(Serialize)]
pub struct LoginResult {
    pub username: String,
    pub score: u64,
    pub new_user: bool,
}

impl Output for LoginResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.new_user {
            format!("Welcome, {}! You start with 0 points.", self.username)
        } else {
            format!("Welcome back, {}! You have {} points.", self.username, self.score)
        }
    }
}

/// Log in as `name` after trimming it.
pub fn login(store: &mut StateStore, name: &str) -> Result<LoginResult> {
    let username = require_non_empty("username", name)?;
    let new_user = store.state().score(username).is_none();
    let state = store.login(username);

    Ok(LoginResult {
        username: username.to_string(),
        score: state.score(username).unwrap_or(0),
        new_user,
    })
}

// === logout ===

#[derive(Serialize)]
pub struct LogoutResult {
    pub previous_user: Option<String>,
}

impl Output for LogoutResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match self.previous_user {
            Some(ref user) => format!("Logged out {}.", user),
            None => "Nobody was logged in.".to_string(),
        }
    }
}

/// Log out the current user, if any.
pub fn logout(store: &mut StateStore) -> LogoutResult {
    let previous_user = store.current_user().map(str::to_string);
    store.logout();
    LogoutResult { previous_user }
}

// === add ===

#[derive(Serialize)]
pub struct AddResult {
    pub insight: Insight,
    pub score: u64,
}

impl Output for AddResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Thanks! Your insight is recorded.\n  {}\n{} now has {} points.",
            self.insight, self.insight.author, self.score
        )
    }
}

/// Submit an insight as the logged-in user.
///
/// Unlike [`StateStore::add_insight`], invalid input is reported.
pub fn add(store: &mut StateStore, role: &str, wish: &str, goal: &str) -> Result<AddResult> {
    let role = require_non_empty("role", role)?;
    let wish = require_non_empty("wish", wish)?;
    let goal = require_non_empty("goal", goal)?;

    let state = store.try_add_insight(role, wish, goal)?;
    let insight = state
        .insights
        .first()
        .cloned()
        .ok_or_else(|| Error::Other("insight log is empty after submission".to_string()))?;
    let score = state.score(&insight.author).unwrap_or(0);

    Ok(AddResult { insight, score })
}

// === state ===

#[derive(Serialize)]
#[serde(transparent)]
pub struct StateResult {
    pub state: AppState,
}

impl Output for StateResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        match self.state.current_user {
            Some(ref user) => lines.push(format!("Logged in as: {}", user)),
            None => lines.push("Not logged in".to_string()),
        }
        lines.push(format!("Users: {}", self.state.user_scores.len()));
        lines.push(format!("Insights: {}", self.state.insights.len()));
        lines.join("\n")
    }
}

/// Full state view.
pub fn state(store: &StateStore) -> StateResult {
    StateResult {
        state: store.state().clone(),
    }
}

// === whoami ===

#[derive(Serialize)]
pub struct WhoamiResult {
    pub current_user: Option<String>,
    pub score: Option<u64>,
}

impl Output for WhoamiResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match (&self.current_user, self.score) {
            (Some(user), Some(score)) => format!("{} ({} points)", user, score),
            (Some(user), None) => user.clone(),
            (None, _) => "Not logged in".to_string(),
        }
    }
}

/// The logged-in user and their score.
pub fn whoami(store: &StateStore) -> WhoamiResult {
    let current_user = store.current_user().map(str::to_string);
    let score = current_user
        .as_deref()
        .and_then(|user| store.state().score(user));
    WhoamiResult {
        current_user,
        score,
    }
}

// === leaderboard ===

#[derive(Serialize)]
pub struct LeaderboardResult {
    pub entries: Vec<LeaderboardEntry>,
}

impl Output for LeaderboardResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No insights logged yet.".to_string();
        }

        self.entries
            .iter()
            .map(|entry| {
                let place = match entry.medal {
                    Some(medal) => medal.emoji().to_string(),
                    None => entry.rank.to_string(),
                };
                format!("{:>3}  {}  {} points", place, entry.username, entry.score)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Users ranked by score.
pub fn leaderboard(store: &StateStore) -> LeaderboardResult {
    LeaderboardResult {
        entries: store.leaderboard(),
    }
}

// === insights ===

#[derive(Serialize)]
pub struct InsightsResult {
    pub total: usize,
    pub label: String,
    pub insights: Vec<Insight>,
}

impl Output for InsightsResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.total == 0 {
            return "No insights logged yet. Be the first to contribute!".to_string();
        }

        let mut lines = vec![self.label.clone()];
        for insight in &self.insights {
            lines.push(String::new());
            lines.push(format!(
                "By {} - {}",
                insight.author,
                format_timestamp(insight.timestamp)
            ));
            lines.push(format!("  As a {},", insight.role));
            lines.push(format!("  I wish {},", insight.wish));
            lines.push(format!("  so that {}.", insight.goal));
        }
        lines.join("\n")
    }
}

/// Insight feed, newest first, optionally capped at `limit` entries.
pub fn insights(store: &StateStore, limit: Option<usize>) -> InsightsResult {
    let all = &store.state().insights;
    let shown = limit.unwrap_or(all.len()).min(all.len());
    InsightsResult {
        total: all.len(),
        label: insight_count_label(all.len()),
        insights: all[..shown].to_vec(),
    }
}

// === config show ===

#[derive(Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: String,
}

#[derive(Serialize)]
pub struct ConfigShowResult {
    pub config_path: String,
    pub output_format: ConfigEntry,
    pub data_dir: ConfigEntry,
    pub storage_backend: ConfigEntry,
    pub log_filter: ConfigEntry,
    pub storage_location: String,
}

impl Output for ConfigShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let row = |name: &str, entry: &ConfigEntry| {
            format!("{:<16} {} ({})", name, entry.value, entry.source)
        };
        [
            format!("{:<16} {}", "config-file", self.config_path),
            row("output-format", &self.output_format),
            row("data-dir", &self.data_dir),
            row("storage-backend", &self.storage_backend),
            row("log-filter", &self.log_filter),
            format!("{:<16} {}", "storage", self.storage_location),
        ]
        .join("\n")
    }
}

/// Resolved configuration with value sources.
pub fn config_show(config: &ResolvedConfig, store: &StateStore) -> ConfigShowResult {
    ConfigShowResult {
        config_path: config.config_path.display().to_string(),
        output_format: ConfigEntry {
            value: config.output_format().to_string(),
            source: config.output_format.source.to_string(),
        },
        data_dir: ConfigEntry {
            value: config.data_dir().display().to_string(),
            source: config.data_dir.source.to_string(),
        },
        storage_backend: ConfigEntry {
            value: config.storage_backend().to_string(),
            source: config.storage_backend.source.to_string(),
        },
        log_filter: ConfigEntry {
            value: config.log_filter().to_string(),
            source: config.log_filter.source.to_string(),
        },
        storage_location: store.storage().location(),
    }
}

// === config set ===

#[derive(Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
    pub config_path: String,
}

impl Output for ConfigSetResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.config_path)
    }
}

/// Store one setting in config.kdl, keeping the other settings.
pub fn config_set(
    config: &ResolvedConfig,
    key: &str,
    value: &str,
) -> Result<ConfigSetResult> {
    let setting = FeedbackConfig::from_setting(key, value)?;

    let mut file = FeedbackConfig::load(&config.config_path)?;
    file.merge(&setting);
    file.validate().map_err(Error::Config)?;
    file.save(&config.config_path)?;

    tracing::info!(key, value, path = %config.config_path.display(), "Updated config");

    Ok(ConfigSetResult {
        key: key.to_string(),
        value: value.to_string(),
        config_path: config.config_path.display().to_string(),
    })
}
