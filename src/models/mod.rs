//! Data models for FeedbackLoop.
//!
//! This module defines the core data structures:
//! - `Insight` - A submitted "as a <role>, I wish <wish>, so that <goal>" entry
//! - `ScoreTable` - Per-user insight counts
//! - `AppState` - Session, score table and insight log as one read view
//! - `LeaderboardEntry` - Ranked view over the score table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mapping from username to score. Usernames are case-sensitive.
pub type ScoreTable = BTreeMap<String, u64>;

/// Users every fresh install starts with.
pub const DEFAULT_USERS: [(&str, u64); 3] = [
    ("Ola Nordmann", 5),
    ("Kari Svendsen", 8),
    ("Arne Jacobsen", 2),
];

/// Build the seed score table from [`DEFAULT_USERS`].
pub fn default_scores() -> ScoreTable {
    DEFAULT_USERS
        .iter()
        .map(|(name, score)| (name.to_string(), *score))
        .collect()
}

/// A structured feedback entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    /// "As a ..." part
    pub role: String,

    /// "I wish ..." part
    pub wish: String,

    /// "So that ..." part
    pub goal: String,

    /// Username that was logged in when the insight was submitted
    pub author: String,

    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl Insight {
    /// Create a new insight.
    pub fn new(
        role: impl Into<String>,
        wish: impl Into<String>,
        goal: impl Into<String>,
        author: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            role: role.into(),
            wish: wish.into(),
            goal: goal.into(),
            author: author.into(),
            timestamp,
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "As a {}, I wish {}, so that {}.",
            self.role, self.wish, self.goal
        )
    }
}

/// Read view of the whole application state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Logged-in username, if any
    pub current_user: Option<String>,

    /// Score per username
    pub user_scores: ScoreTable,

    /// Insight log, newest first
    pub insights: Vec<Insight>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            current_user: None,
            user_scores: default_scores(),
            insights: Vec::new(),
        }
    }
}

impl AppState {
    /// Score for a user, if the user is known.
    pub fn score(&self, username: &str) -> Option<u64> {
        self.user_scores.get(username).copied()
    }

    /// Whether a user is logged in.
    pub fn is_logged_in(&self) -> bool {
        self.current_user.is_some()
    }
}

/// Medal awarded to the top three leaderboard places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Medal for a 1-based rank.
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }

    /// Emoji shown next to the rank.
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Gold => "🥇",
            Self::Silver => "🥈",
            Self::Bronze => "🥉",
        }
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub username: String,
    pub score: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medal: Option<Medal>,
}

/// Rank users by score, highest first. Equal scores are ordered by username.
pub fn leaderboard(scores: &ScoreTable) -> Vec<LeaderboardEntry> {
    let mut sorted: Vec<(&String, &u64)> = scores.iter().collect();
    // BTreeMap iteration is already name-ordered; a stable sort keeps that for ties.
    sorted.sort_by(|(_, a), (_, b)| b.cmp(a));

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, (username, score))| LeaderboardEntry {
            rank: index + 1,
            username: username.clone(),
            score: *score,
            medal: Medal::for_rank(index + 1),
        })
        .collect()
}

/// "1 insight" / "3 insights"; empty for an empty log.
pub fn insight_count_label(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => "1 insight".to_string(),
        n => format!("{} insights", n),
    }
}
