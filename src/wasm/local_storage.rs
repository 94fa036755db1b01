//! Browser `localStorage` backend.

use crate::storage::StorageBackend;
use crate::{Error, Result};
use wasm_bindgen::JsValue;

/// Key-value store backed by `window.localStorage`.
#[derive(Debug, Clone)]
pub struct LocalStorageBackend {
    storage: web_sys::Storage,
}

fn js_error(context: &str, e: JsValue) -> Error {
    Error::Storage(format!("{}: {:?}", context, e))
}

impl LocalStorageBackend {
    /// Attach to the window's local storage.
    ///
    /// Fails when there is no window or storage is disabled (e.g. some
    /// private browsing modes).
    pub fn open() -> Result<Self> {
        let window =
            web_sys::window().ok_or_else(|| Error::Storage("no window available".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| js_error("localStorage unavailable", e))?
            .ok_or_else(|| Error::Storage("localStorage disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl StorageBackend for LocalStorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| js_error("getItem failed", e))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| js_error("setItem failed", e))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| js_error("removeItem failed", e))
    }

    fn location(&self) -> String {
        "localStorage".to_string()
    }

    fn backend_type(&self) -> &'static str {
        "local-storage"
    }
}
