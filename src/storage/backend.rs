//! Storage backend trait and backend selection.
//!
//! A backend is a raw string key-value store:
//! - `FileBackend` - one JSON object file in the data directory (default)
//! - `MemoryBackend` - in-process map, nothing survives the process
//! - `LocalStorageBackend` - browser `localStorage` (wasm feature only)

use crate::Result;

/// Trait for storage backends that handle raw key-value persistence.
///
/// Backends report every failure. Swallowing errors is the job of
/// [`super::PersistenceAdapter`], not of the backend.
pub trait StorageBackend {
    /// Read the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;

    /// Get the backend type name.
    fn backend_type(&self) -> &'static str;
}

/// Backends selectable from the CLI and config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendType {
    /// JSON file under the data directory (default)
    #[default]
    File,
    /// Process-local map
    Memory,
}

impl BackendType {
    /// Parse a backend type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "file" | "default" => Some(Self::File),
            "memory" | "mem" => Some(Self::Memory),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
