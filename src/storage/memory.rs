//! In-memory storage backend.

use super::StorageBackend;
use crate::{Error, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<String, String>,
    failing: bool,
}

/// Process-local key-value store.
///
/// Clones share the same map, so a test can keep a handle after moving
/// a clone into a [`super::PersistenceAdapter`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-filled with raw entries.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let backend = Self::new();
        backend.inner.borrow_mut().entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        backend
    }

    /// Make every subsequent `set`/`remove` fail, like a full or disabled
    /// browser store. Reads keep working.
    pub fn set_failing(&self, failing: bool) {
        self.inner.borrow_mut().failing = failing;
    }

    /// Snapshot of all stored entries.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.inner.borrow().entries.clone()
    }

    /// Raw value for a key.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().entries.get(key).cloned()
    }

    fn check_writable(&self) -> Result<()> {
        if self.inner.borrow().failing {
            return Err(Error::Storage("quota exceeded".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.borrow().entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.inner
            .borrow_mut()
            .entries
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.inner.borrow_mut().entries.remove(key);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut backend = MemoryBackend::new();
        assert_eq!(backend.get("k").unwrap(), None);

        backend.set("k", "v1").unwrap();
        backend.set("k", "v2").unwrap();
        assert_eq!(backend.get("k").unwrap(), Some("v2".to_string()));

        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
        // Removing again is fine
        backend.remove("k").unwrap();
    }

    #[test]
    fn test_clones_share_entries() {
        let handle = MemoryBackend::new();
        let mut moved = handle.clone();
        moved.set("shared", "yes").unwrap();
        assert_eq!(handle.raw("shared"), Some("yes".to_string()));
    }

    #[test]
    fn test_failing_mode_rejects_writes_only() {
        let mut backend = MemoryBackend::with_entries([("a", "1")]);
        backend.set_failing(true);

        assert!(matches!(backend.set("b", "2"), Err(Error::Storage(_))));
        assert!(matches!(backend.remove("a"), Err(Error::Storage(_))));
        assert_eq!(backend.get("a").unwrap(), Some("1".to_string()));

        backend.set_failing(false);
        backend.set("b", "2").unwrap();
        assert_eq!(backend.entries().len(), 2);
    }
}
