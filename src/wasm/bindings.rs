//! JavaScript bindings for the browser build.
//!
//! Every method returns the full state as a JSON string
//! (`{currentUser, userScores, insights}`) so the caller can re-render.

use super::LocalStorageBackend;
use crate::models::AppState;
use crate::state::StateStore;
use crate::storage::{MemoryBackend, PersistenceAdapter, StorageBackend};
use wasm_bindgen::prelude::*;

fn state_json(state: &AppState) -> String {
    serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string())
}

/// Browser-facing handle to the state store.
#[wasm_bindgen]
pub struct FeedbackApp {
    store: StateStore,
}

#[wasm_bindgen]
impl FeedbackApp {
    /// Load state from `localStorage`. Without usable storage the app keeps
    /// working in memory for this page load.
    #[wasm_bindgen(constructor)]
    pub fn new() -> FeedbackApp {
        super::init_panic_hook();
        super::init_logging();

        let backend: Box<dyn StorageBackend> = match LocalStorageBackend::open() {
            Ok(backend) => Box::new(backend),
            Err(e) => {
                tracing::warn!(%e, "Could not open localStorage, state will not persist");
                Box::new(MemoryBackend::new())
            }
        };

        FeedbackApp {
            store: StateStore::open(PersistenceAdapter::new(backend)),
        }
    }

    /// Log in. The caller trims and rejects empty names.
    pub fn login(&mut self, username: &str) -> String {
        state_json(self.store.login(username))
    }

    /// Log out.
    pub fn logout(&mut self) -> String {
        state_json(self.store.logout())
    }

    /// Submit an insight; invalid input or no login leaves state unchanged.
    #[wasm_bindgen(js_name = addInsight)]
    pub fn add_insight(&mut self, role: &str, wish: &str, goal: &str) -> String {
        state_json(self.store.add_insight(role, wish, goal))
    }

    /// Current state.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        state_json(self.store.state())
    }

    /// Ranked leaderboard as a JSON array.
    pub fn leaderboard(&self) -> String {
        serde_json::to_string(&self.store.leaderboard()).unwrap_or_else(|_| "[]".to_string())
    }
}

impl Default for FeedbackApp {
    fn default() -> Self {
        Self::new()
    }
}
