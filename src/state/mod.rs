//! Application state and the operations that mutate it.
//!
//! [`StateStore`] is the single owner of the session, score table and
//! insight log. Every successful mutation is mirrored to storage through
//! its [`PersistenceAdapter`] before the call returns.
//!
//! ## Caller contract
//!
//! `login` does not validate the username; callers trim it and reject empty
//! names first. `add_insight` silently ignores invalid input. Use
//! [`StateStore::try_add_insight`] to learn why a submission was ignored.
//!
//! ## Loading
//!
//! On [`StateStore::open`] the persisted score table is merged over the
//! default users, while a persisted insight log replaces the empty default
//! outright. The asymmetry is intentional: default scores are meaningful
//! seed data, default insights are not.

use crate::models::{AppState, Insight, LeaderboardEntry, leaderboard};
use crate::storage::PersistenceAdapter;
use crate::{Error, Result};
use tracing::{debug, info};

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Owner of the canonical application state.
#[derive(Debug)]
pub struct StateStore {
    state: AppState,
    storage: PersistenceAdapter,
    clock: fn() -> i64,
}

impl StateStore {
    /// Create a store seeded with the default users, without reading storage.
    pub fn new(storage: PersistenceAdapter) -> Self {
        Self {
            state: AppState::default(),
            storage,
            clock: now_millis,
        }
    }

    /// Create a store, overlay persisted data and restore the session.
    pub fn open(storage: PersistenceAdapter) -> Self {
        let mut store = Self::new(storage);
        store.load_from_storage();
        store
    }

    /// Replace the timestamp source.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Overlay persisted scores and insights and restore the session marker.
    ///
    /// Absent or malformed slots leave the current values untouched.
    pub fn load_from_storage(&mut self) {
        if let Some(scores) = self.storage.load_scores() {
            self.state.user_scores.extend(scores);
        }

        if let Some(insights) = self.storage.load_insights() {
            self.state.insights = insights;
        }

        if let Some(user) = self.storage.load_current_user() {
            debug!(user = %user, "Restored session");
            self.state.current_user = Some(user);
        }

        self.backfill_scores();
    }

    /// Give every referenced user a score entry.
    fn backfill_scores(&mut self) {
        let referenced = self
            .state
            .current_user
            .iter()
            .chain(self.state.insights.iter().map(|i| &i.author));

        for user in referenced {
            if !self.state.user_scores.contains_key(user) {
                self.state.user_scores.insert(user.clone(), 0);
            }
        }
    }

    /// Read view of the current state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Logged-in username, if any.
    pub fn current_user(&self) -> Option<&str> {
        self.state.current_user.as_deref()
    }

    /// Ranked score table.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        leaderboard(&self.state.user_scores)
    }

    /// The adapter this store persists through.
    pub fn storage(&self) -> &PersistenceAdapter {
        &self.storage
    }

    /// Log in as `username`, creating a zero score for unknown users.
    ///
    /// Existing scores are never reset.
    pub fn login(&mut self, username: &str) -> &AppState {
        self.state.current_user = Some(username.to_string());
        self.state
            .user_scores
            .entry(username.to_string())
            .or_insert(0);

        self.storage.save_current_user(username);
        self.storage.save_scores(&self.state.user_scores);

        &self.state
    }

    /// Log out. Calling this while logged out only clears the marker again.
    pub fn logout(&mut self) -> &AppState {
        self.state.current_user = None;

        self.storage.clear_current_user();
        self.storage.save_scores(&self.state.user_scores);
        self.storage.save_insights(&self.state.insights);

        &self.state
    }

    /// Submit an insight as the current user.
    ///
    /// Empty fields or a missing login make this a silent no-op.
    pub fn add_insight(&mut self, role: &str, wish: &str, goal: &str) -> &AppState {
        if let Err(e) = self.try_add_insight(role, wish, goal) {
            debug!(%e, "Ignored insight");
        }
        &self.state
    }

    /// Submit an insight as the current user, reporting why it was rejected.
    ///
    /// On error nothing is changed and nothing is written.
    pub fn try_add_insight(&mut self, role: &str, wish: &str, goal: &str) -> Result<&AppState> {
        for (field, value) in [("role", role), ("wish", wish), ("goal", goal)] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!("{} must not be empty", field)));
            }
        }

        let author = self
            .state
            .current_user
            .clone()
            .ok_or_else(|| Error::InvalidInput("no user is logged in".to_string()))?;

        let score = self.state.user_scores.entry(author.clone()).or_insert(0);
        *score = score.saturating_add(1);

        let insight = Insight::new(role, wish, goal, author.as_str(), (self.clock)());
        self.state.insights.insert(0, insight);

        self.storage.save_scores(&self.state.user_scores);
        self.storage.save_insights(&self.state.insights);

        info!(author = %author, role, wish, goal, "New insight");

        Ok(&self.state)
    }
}
