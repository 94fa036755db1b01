//! File storage backend.
//!
//! All keys live in a single JSON object at `<data-dir>/storage.json`.
//! Every write rewrites the whole object through a temp file in the same
//! directory, then renames it over the target.

use super::StorageBackend;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the key-value document inside the data directory.
pub const STORAGE_FILE: &str = "storage.json";

/// Key-value store backed by one JSON file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `root`. The directory is created lazily
    /// on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the storage document.
    pub fn path(&self) -> PathBuf {
        self.root.join(STORAGE_FILE)
    }

    /// Read every entry. A missing or blank file is an empty store.
    ///
    /// A document that is not a JSON object is an error. Inside an object,
    /// slots whose value is not a string are skipped so the other slots
    /// survive the next rewrite.
    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let content = match fs::read_to_string(self.path()) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content)?;
        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            match value {
                serde_json::Value::String(text) => {
                    entries.insert(key, text);
                }
                _ => {
                    tracing::warn!(
                        path = %self.path().display(),
                        key = %key,
                        "Skipping non-string storage slot"
                    );
                }
            }
        }
        Ok(entries)
    }

    /// Entries to start a rewrite from. A corrupt document is dropped so
    /// the store can recover on the next write.
    fn read_for_update(&self) -> Result<BTreeMap<String, String>> {
        match self.read_all() {
            Ok(entries) => Ok(entries),
            Err(Error::Json(e)) => {
                tracing::warn!(path = %self.path().display(), %e, "Replacing corrupt storage file");
                Ok(BTreeMap::new())
            }
            Err(e) => Err(e),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        writeln!(tmp)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path()).map_err(|e| Error::Io(e.error))?;

        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_for_update()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_for_update()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&entries)
    }

    fn location(&self) -> String {
        self.path().display().to_string()
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}
