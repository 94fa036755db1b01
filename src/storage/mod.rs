//! Storage layer for FeedbackLoop data.
//!
//! The [`PersistenceAdapter`] maps the three logical slots of application
//! state onto string keys of a [`StorageBackend`]:
//!
//! | Key               | Value                                   |
//! |-------------------|-----------------------------------------|
//! | `fl_current_user` | raw username, absent when logged out    |
//! | `fl_user_scores`  | JSON object, username -> score          |
//! | `fl_insights`     | JSON array of insights, newest first    |
//!
//! ## Failure policy
//!
//! Storage is best-effort. The adapter catches every backend error, logs
//! it once as a warning and carries on; nothing here returns an error to
//! the caller. Unparseable slots load as `None`, exactly like absent ones.
//! There is no atomicity across slots.

pub mod backend;
#[cfg(not(target_arch = "wasm32"))]
pub mod file;
pub mod memory;

pub use backend::{BackendType, StorageBackend};
#[cfg(not(target_arch = "wasm32"))]
pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::models::{Insight, ScoreTable};
use tracing::{debug, warn};

/// The logical slots persisted by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    CurrentUser,
    UserScores,
    Insights,
}

impl StorageKey {
    /// Raw key used in the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentUser => "fl_current_user",
            Self::UserScores => "fl_user_scores",
            Self::Insights => "fl_insights",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Best-effort bridge between application state and a key-value backend.
pub struct PersistenceAdapter {
    backend: Box<dyn StorageBackend>,
}

impl PersistenceAdapter {
    /// Wrap a backend.
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Adapter over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// Where the backend keeps its data.
    pub fn location(&self) -> String {
        self.backend.location()
    }

    /// Backend type name.
    pub fn backend_type(&self) -> &'static str {
        self.backend.backend_type()
    }

    /// Read the raw value of a slot. Backend errors read as absent.
    pub fn read(&self, key: StorageKey) -> Option<String> {
        match self.backend.get(key.as_str()) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = key.as_str(), %e, "Could not read from storage");
                None
            }
        }
    }

    /// Write the raw value of a slot. Failures are logged and dropped.
    pub fn write(&mut self, key: StorageKey, value: &str) {
        if let Err(e) = self.backend.set(key.as_str(), value) {
            warn!(key = key.as_str(), %e, "Could not write to storage");
        }
    }

    /// Delete a slot. Failures are logged and dropped.
    pub fn remove(&mut self, key: StorageKey) {
        if let Err(e) = self.backend.remove(key.as_str()) {
            warn!(key = key.as_str(), %e, "Could not remove from storage");
        }
    }

    /// Persisted session marker. An empty marker counts as logged out.
    pub fn load_current_user(&self) -> Option<String> {
        self.read(StorageKey::CurrentUser)
            .filter(|user| !user.is_empty())
    }

    /// Persisted score table, or `None` if absent or malformed.
    pub fn load_scores(&self) -> Option<ScoreTable> {
        let raw = self.read(StorageKey::UserScores)?;
        match serde_json::from_str::<ScoreTable>(&raw) {
            Ok(scores) => {
                debug!(users = scores.len(), "Loaded score table");
                Some(scores)
            }
            Err(e) => {
                warn!(%e, "Discarding malformed score table");
                None
            }
        }
    }

    /// Persisted insight log, or `None` if absent or not an array.
    ///
    /// An array always replaces the log; entries that do not parse as an
    /// [`Insight`] are skipped.
    pub fn load_insights(&self) -> Option<Vec<Insight>> {
        let raw = self.read(StorageKey::Insights)?;
        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(%e, "Discarding unparseable insight log");
                return None;
            }
        };

        let serde_json::Value::Array(entries) = value else {
            warn!("Discarding insight log that is not an array");
            return None;
        };

        let total = entries.len();
        let insights: Vec<Insight> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();

        if insights.len() < total {
            warn!(
                dropped = total - insights.len(),
                kept = insights.len(),
                "Skipping malformed insight entries"
            );
        }
        debug!(insights = insights.len(), "Loaded insight log");
        Some(insights)
    }

    /// Persist the session marker.
    pub fn save_current_user(&mut self, username: &str) {
        self.write(StorageKey::CurrentUser, username);
    }

    /// Remove the session marker.
    pub fn clear_current_user(&mut self) {
        self.remove(StorageKey::CurrentUser);
    }

    /// Persist the score table.
    pub fn save_scores(&mut self, scores: &ScoreTable) {
        match serde_json::to_string(scores) {
            Ok(json) => self.write(StorageKey::UserScores, &json),
            Err(e) => warn!(%e, "Could not serialize score table"),
        }
    }

    /// Persist the insight log.
    pub fn save_insights(&mut self, insights: &[Insight]) {
        match serde_json::to_string(insights) {
            Ok(json) => self.write(StorageKey::Insights, &json),
            Err(e) => warn!(%e, "Could not serialize insight log"),
        }
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("backend", &self.backend.backend_type())
            .field("location", &self.backend.location())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter_with(entries: &[(&str, &str)]) -> (PersistenceAdapter, MemoryBackend) {
        let backend = MemoryBackend::with_entries(entries.iter().copied());
        (PersistenceAdapter::new(Box::new(backend.clone())), backend)
    }

    #[test]
    fn test_storage_key_names() {
        assert_eq!(StorageKey::CurrentUser.as_str(), "fl_current_user");
        assert_eq!(StorageKey::UserScores.as_str(), "fl_user_scores");
        assert_eq!(StorageKey::Insights.to_string(), "fl_insights");
    }

    #[test]
    fn test_absent_slots_load_as_none() {
        let (adapter, _) = adapter_with(&[]);
        assert_eq!(adapter.load_current_user(), None);
        assert_eq!(adapter.load_scores(), None);
        assert_eq!(adapter.load_insights(), None);
    }

    #[test]
    fn test_empty_current_user_is_logged_out() {
        let (adapter, _) = adapter_with(&[("fl_current_user", "")]);
        assert_eq!(adapter.load_current_user(), None);
    }

    #[test]
    fn test_scores_round_trip() {
        let (mut adapter, backend) = adapter_with(&[]);
        let mut scores = ScoreTable::new();
        scores.insert("Kari Svendsen".to_string(), 9);
        scores.insert("New Person".to_string(), 0);

        adapter.save_scores(&scores);
        assert_eq!(
            backend.raw("fl_user_scores").unwrap(),
            r#"{"Kari Svendsen":9,"New Person":0}"#
        );
        assert_eq!(adapter.load_scores(), Some(scores));
    }

    #[test]
    fn test_insights_round_trip_preserves_order() {
        let (mut adapter, _) = adapter_with(&[]);
        let insights = vec![
            Insight::new("r2", "w2", "g2", "Ola", 20),
            Insight::new("r1", "w1", "g1", "Kari", 20),
            Insight::new("r0", "w0", "g0", "Ola", 10),
        ];

        adapter.save_insights(&insights);
        assert_eq!(adapter.load_insights(), Some(insights));
    }

    #[test]
    fn test_malformed_scores_discarded() {
        for raw in ["{oops", "[1,2]", r#"{"Kari": -1}"#, r#"{"Kari": "eight"}"#] {
            let (adapter, _) = adapter_with(&[("fl_user_scores", raw)]);
            assert_eq!(adapter.load_scores(), None, "raw: {}", raw);
        }
    }

    #[test]
    fn test_insights_not_an_array_discarded() {
        let (adapter, _) = adapter_with(&[("fl_insights", r#"{"role":"x"}"#)]);
        assert_eq!(adapter.load_insights(), None);

        let (adapter, _) = adapter_with(&[("fl_insights", "not json")]);
        assert_eq!(adapter.load_insights(), None);
    }

    #[test]
    fn test_insights_skip_bad_entries() {
        let raw = r#"[
            {"role":"r1","wish":"w1","goal":"g1","author":"Kari Svendsen","timestamp":5},
            {"role":"r2","wish":"w2","goal":"g2","author":"Ola Nordmann"},
            "not an object",
            {"role":"r3","wish":"w3","goal":"g3","author":"Ola Nordmann","timestamp":3}
        ]"#;
        let (adapter, _) = adapter_with(&[("fl_insights", raw)]);

        let insights = adapter.load_insights().unwrap();
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].role, "r1");
        assert_eq!(insights[1].role, "r3");
    }

    #[test]
    fn test_insights_all_bad_entries_load_empty() {
        let (adapter, _) = adapter_with(&[("fl_insights", r#"[{"role":"only a role"}]"#)]);
        assert_eq!(adapter.load_insights(), Some(Vec::new()));
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let (mut adapter, backend) = adapter_with(&[("fl_current_user", "Ola")]);
        backend.set_failing(true);

        adapter.save_current_user("Kari");
        adapter.clear_current_user();
        adapter.save_scores(&ScoreTable::new());

        // Nothing changed, nothing panicked
        assert_eq!(backend.raw("fl_current_user"), Some("Ola".to_string()));
        assert_eq!(backend.raw("fl_user_scores"), None);
    }

    #[test]
    fn test_current_user_save_and_clear() {
        let (mut adapter, backend) = adapter_with(&[]);
        adapter.save_current_user("Kari Svendsen");
        assert_eq!(adapter.load_current_user(), Some("Kari Svendsen".to_string()));

        adapter.clear_current_user();
        assert_eq!(backend.raw("fl_current_user"), None);
        // Clearing twice is fine
        adapter.clear_current_user();
    }

    #[test]
    fn test_in_memory_adapter() {
        let adapter = PersistenceAdapter::in_memory();
        assert_eq!(adapter.backend_type(), "memory");
        assert_eq!(adapter.location(), "memory");
    }
}
