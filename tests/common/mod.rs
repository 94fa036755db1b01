//! Common test utilities for FeedbackLoop integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch the
//! user's real data or config directories.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with isolated data and config directories.
///
/// The `fl()` method returns a `Command` that sets `FL_DATA_DIR` and
/// `FL_CONFIG_DIR` per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with empty directories.
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the fl binary with isolated directories.
    pub fn fl(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_fl"));
        cmd.env("FL_DATA_DIR", self.data_dir.path());
        cmd.env("FL_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("FL_BACKEND");
        cmd.env_remove("FL_LOG");
        cmd
    }

    /// Run `fl <args>`, assert success and parse stdout as JSON.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.fl().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "fl {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &Path {
        self.data_dir.path()
    }

    /// Path of the storage document the file backend writes.
    pub fn storage_file(&self) -> PathBuf {
        self.data_path().join("storage.json")
    }

    /// Write raw slots into the storage document.
    pub fn write_storage(&self, entries: &[(&str, &str)]) {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        fs::write(self.storage_file(), serde_json::Value::Object(map).to_string()).unwrap();
    }

    /// Read one raw slot from the storage document.
    pub fn read_slot(&self, key: &str) -> Option<String> {
        let raw = fs::read_to_string(self.storage_file()).ok()?;
        let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
        value.get(key)?.as_str().map(str::to_string)
    }

    /// Write config.kdl into the isolated config directory.
    pub fn write_config(&self, content: &str) {
        fs::write(self.config_dir.path().join("config.kdl"), content).unwrap();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
