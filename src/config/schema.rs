//! KDL schema for config.kdl.
//!
//! This module provides:
//! - Rust structs representing the KDL schema
//! - Serialization/deserialization to/from KDL format
//! - Validation
//! - Loading from disk (a missing file is an empty config)

use crate::{Error, Result};
use crate::storage::BackendType;
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name of the config file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.kdl";

/// Keys accepted by `fl config set`, in config.kdl node order.
pub const CONFIG_KEYS: [&str; 4] = ["output-format", "data-dir", "storage-backend", "log-filter"];

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// output-format "human"  // or "json"
/// data-dir "/home/me/.local/share/feedbackloop"
/// storage-backend "file"  // or "memory"
/// log-filter "feedbackloop=debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackConfig {
    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Directory holding the storage file
    pub data_dir: Option<PathBuf>,

    /// Which storage backend to use
    pub storage_backend: Option<BackendType>,

    /// `tracing` filter directive (e.g. "warn", "feedbackloop=debug")
    pub log_filter: Option<String>,
}

/// First string argument of a top-level node.
fn string_arg<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?.entries().first()?.value().as_string()
}

fn string_node(name: &str, value: impl Into<String>) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value.into())));
    node
}

impl FeedbackConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(ref dir) = self.data_dir {
            if dir.as_os_str().is_empty() {
                return Err("data-dir must not be empty".to_string());
            }
        }
        if let Some(ref filter) = self.log_filter {
            if filter.trim().is_empty() {
                return Err("log-filter must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Config holding a single `key = value` setting.
    ///
    /// Unlike [`FeedbackConfig::from_kdl`], unknown keys and unrecognized
    /// values are errors.
    pub fn from_setting(key: &str, value: &str) -> Result<Self> {
        let invalid = |expected: &str| {
            Error::Config(format!(
                "invalid value '{}' for {}, expected {}",
                value, key, expected
            ))
        };

        let mut config = Self::new();
        match key {
            "output-format" => {
                let format = OutputFormat::parse(value).ok_or_else(|| invalid("json or human"))?;
                config.output_format = Some(format);
            }
            "data-dir" => config.data_dir = Some(PathBuf::from(value)),
            "storage-backend" => {
                let backend = BackendType::parse(value).ok_or_else(|| invalid("file or memory"))?;
                config.storage_backend = Some(backend);
            }
            "log-filter" => config.log_filter = Some(value.to_string()),
            _ => {
                return Err(Error::Config(format!(
                    "unknown config key '{}', expected one of: {}",
                    key,
                    CONFIG_KEYS.join(", ")
                )));
            }
        }

        config.validate().map_err(Error::Config)?;
        Ok(config)
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes and unrecognized values are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        Self {
            output_format: string_arg(doc, "output-format").and_then(OutputFormat::parse),
            data_dir: string_arg(doc, "data-dir").map(PathBuf::from),
            storage_backend: string_arg(doc, "storage-backend").and_then(BackendType::parse),
            log_filter: string_arg(doc, "log-filter").map(str::to_string),
        }
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref format) = self.output_format {
            doc.nodes_mut().push(string_node("output-format", format.as_str()));
        }

        if let Some(ref dir) = self.data_dir {
            doc.nodes_mut()
                .push(string_node("data-dir", dir.display().to_string()));
        }

        if let Some(ref backend) = self.storage_backend {
            doc.nodes_mut()
                .push(string_node("storage-backend", backend.as_str()));
        }

        if let Some(ref filter) = self.log_filter {
            doc.nodes_mut().push(string_node("log-filter", filter.as_str()));
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &FeedbackConfig) {
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir.clone();
        }
        if other.storage_backend.is_some() {
            self.storage_backend = other.storage_backend;
        }
        if other.log_filter.is_some() {
            self.log_filter = other.log_filter.clone();
        }
    }

    /// Load a config file. A missing file yields an empty config; a file
    /// that is not valid KDL is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };

        let doc: KdlDocument = content.parse()?;
        let config = Self::from_kdl(&doc);
        config.validate().map_err(Error::Config)?;
        Ok(config)
    }

    /// Write the config to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut doc = self.to_kdl();
        doc.autoformat();
        fs::write(path, doc.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ==================== OutputFormat Tests ====================

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("HUMAN"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(format!("{}", OutputFormat::Json), "json");
        assert_eq!(format!("{}", OutputFormat::Human), "human");
    }

    // ==================== FeedbackConfig Tests ====================

    #[test]
    fn test_config_from_kdl_empty() {
        let doc = KdlDocument::new();
        assert_eq!(FeedbackConfig::from_kdl(&doc), FeedbackConfig::default());
    }

    #[test]
    fn test_config_from_kdl_full() {
        let kdl = r#"
            output-format "human"
            data-dir "/tmp/fl-data"
            storage-backend "memory"
            log-filter "feedbackloop=debug"
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = FeedbackConfig::from_kdl(&doc);

        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/fl-data")));
        assert_eq!(config.storage_backend, Some(BackendType::Memory));
        assert_eq!(config.log_filter, Some("feedbackloop=debug".to_string()));
    }

    #[test]
    fn test_config_from_kdl_ignores_bad_values() {
        let kdl = r#"
            output-format "xml"
            storage-backend "redis"
            unknown-node 42
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = FeedbackConfig::from_kdl(&doc);
        assert_eq!(config.output_format, None);
        assert_eq!(config.storage_backend, None);
    }

    #[test]
    fn test_config_to_kdl_roundtrip() {
        let config = FeedbackConfig {
            output_format: Some(OutputFormat::Human),
            data_dir: Some(PathBuf::from("/srv/fl")),
            storage_backend: Some(BackendType::File),
            log_filter: Some("info".to_string()),
        };
        let parsed = FeedbackConfig::from_kdl(&config.to_kdl());
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_validate() {
        assert!(FeedbackConfig::default().validate().is_ok());

        let config = FeedbackConfig {
            log_filter: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_merge() {
        let mut base = FeedbackConfig {
            output_format: Some(OutputFormat::Json),
            log_filter: Some("warn".to_string()),
            ..Default::default()
        };
        let other = FeedbackConfig {
            output_format: Some(OutputFormat::Human),
            ..Default::default()
        };
        base.merge(&other);
        assert_eq!(base.output_format, Some(OutputFormat::Human)); // Overridden
        assert_eq!(base.log_filter, Some("warn".to_string())); // Not overridden
    }

    #[test]
    fn test_from_setting() {
        let config = FeedbackConfig::from_setting("output-format", "human").unwrap();
        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.data_dir, None);

        let config = FeedbackConfig::from_setting("storage-backend", "mem").unwrap();
        assert_eq!(config.storage_backend, Some(BackendType::Memory));

        let config = FeedbackConfig::from_setting("data-dir", "/srv/fl").unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/fl")));
    }

    #[test]
    fn test_from_setting_rejects_bad_input() {
        assert!(matches!(
            FeedbackConfig::from_setting("colour", "red"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            FeedbackConfig::from_setting("output-format", "xml"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            FeedbackConfig::from_setting("log-filter", " "),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            FeedbackConfig::from_setting("data-dir", ""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = FeedbackConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, FeedbackConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = FeedbackConfig {
            output_format: Some(OutputFormat::Human),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(FeedbackConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_invalid_kdl() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "output-format \"human").unwrap();
        assert!(matches!(
            FeedbackConfig::load(&path),
            Err(Error::Kdl(_))
        ));
    }
}
