//! Unified precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`FL_DATA_DIR`, `FL_BACKEND`, `FL_LOG`)
//! 3. config.kdl (`<config-dir>/feedbackloop/config.kdl`)
//! 4. Built-in defaults
//!
//! Output format has no environment variable.

use crate::config::schema::{CONFIG_FILE_NAME, FeedbackConfig, OutputFormat};
use crate::storage::BackendType;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "FL_DATA_DIR";

/// Environment variable overriding the storage backend.
pub const BACKEND_ENV: &str = "FL_BACKEND";

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "FL_LOG";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "FL_CONFIG_DIR";

/// Log filter used when nothing else is configured.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl at the given path
    ConfigFile(String),
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile(path) => write!(f, "config:{}", path),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Output format preference
    pub output_format: Resolved<OutputFormat>,
    /// Directory holding the storage file
    pub data_dir: Resolved<PathBuf>,
    /// Storage backend
    pub storage_backend: Resolved<BackendType>,
    /// `tracing` filter directive
    pub log_filter: Resolved<String>,
    /// Config file that was consulted (it may not exist)
    pub config_path: PathBuf,
}

impl ResolvedConfig {
    /// Get the output format value.
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    /// Get the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir.value
    }

    /// Get the storage backend.
    pub fn storage_backend(&self) -> BackendType {
        self.storage_backend.value
    }

    /// Get the log filter.
    pub fn log_filter(&self) -> &str {
        &self.log_filter.value
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Output format override from CLI flag
    pub output_format: Option<OutputFormat>,
    /// Data directory override from CLI flag
    pub data_dir: Option<PathBuf>,
    /// Backend override from CLI flag
    pub storage_backend: Option<BackendType>,
    /// Log filter override from CLI flag
    pub log_filter: Option<String>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set output format override.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Set data directory override.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set storage backend override.
    pub fn with_storage_backend(mut self, backend: BackendType) -> Self {
        self.storage_backend = Some(backend);
        self
    }

    /// Set log filter override.
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }
}

/// Directory holding config.kdl: `FL_CONFIG_DIR`, else `<config-dir>/feedbackloop`.
pub fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = non_empty_env(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join("feedbackloop"))
        .ok_or_else(|| Error::Other("Could not determine config directory".to_string()))
}

/// Built-in data directory: `<data-dir>/feedbackloop`.
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("feedbackloop"))
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Load config.kdl from `config_dir` (or the default location) and resolve
/// it against the process environment and CLI overrides.
pub fn resolve_config(
    config_dir: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let config_dir = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_config_dir()?,
    };
    let config_path = config_dir.join(CONFIG_FILE_NAME);
    let file = FeedbackConfig::load(&config_path)?;

    resolve_with(&file, &config_path, overrides, non_empty_env)
}

/// Resolve configuration from already-loaded parts.
///
/// `env` looks up environment variables; tests pass a closure instead of
/// touching the process environment.
pub fn resolve_with<F>(
    file: &FeedbackConfig,
    config_path: &Path,
    overrides: &ConfigOverrides,
    env: F,
) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let from_file = || ValueSource::ConfigFile(config_path.display().to_string());
    let from_env = |name: &str| ValueSource::EnvVar(name.to_string());

    // Resolve output_format
    let output_format = if let Some(format) = overrides.output_format {
        Resolved::new(format, ValueSource::CliFlag)
    } else if let Some(format) = file.output_format {
        Resolved::new(format, from_file())
    } else {
        Resolved::new(OutputFormat::default(), ValueSource::Default)
    };

    // Resolve data_dir
    let data_dir = if let Some(ref dir) = overrides.data_dir {
        Resolved::new(dir.clone(), ValueSource::CliFlag)
    } else if let Some(dir) = env(DATA_DIR_ENV) {
        Resolved::new(PathBuf::from(dir), from_env(DATA_DIR_ENV))
    } else if let Some(ref dir) = file.data_dir {
        Resolved::new(dir.clone(), from_file())
    } else {
        Resolved::new(default_data_dir()?, ValueSource::Default)
    };

    // Resolve storage_backend; a bad env value is an error, not a silent default
    let storage_backend = if let Some(backend) = overrides.storage_backend {
        Resolved::new(backend, ValueSource::CliFlag)
    } else if let Some(raw) = env(BACKEND_ENV) {
        let backend = BackendType::parse(&raw).ok_or_else(|| {
            Error::Config(format!("{} must be 'file' or 'memory', got '{}'", BACKEND_ENV, raw))
        })?;
        Resolved::new(backend, from_env(BACKEND_ENV))
    } else if let Some(backend) = file.storage_backend {
        Resolved::new(backend, from_file())
    } else {
        Resolved::new(BackendType::default(), ValueSource::Default)
    };

    // Resolve log_filter
    let log_filter = if let Some(ref filter) = overrides.log_filter {
        Resolved::new(filter.clone(), ValueSource::CliFlag)
    } else if let Some(filter) = env(LOG_ENV) {
        Resolved::new(filter, from_env(LOG_ENV))
    } else if let Some(ref filter) = file.log_filter {
        Resolved::new(filter.clone(), from_file())
    } else {
        Resolved::new(DEFAULT_LOG_FILTER.to_string(), ValueSource::Default)
    };

    Ok(ResolvedConfig {
        output_format,
        data_dir,
        storage_backend,
        log_filter,
        config_path: config_path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn path() -> PathBuf {
        PathBuf::from("/etc/fl/config.kdl")
    }

    // ==================== ValueSource Tests ====================

    #[test]
    fn test_value_source_display() {
        assert_eq!(ValueSource::CliFlag.to_string(), "cli");
        assert_eq!(ValueSource::EnvVar("FL_LOG".to_string()).to_string(), "env:FL_LOG");
        assert_eq!(
            ValueSource::ConfigFile("/x/config.kdl".to_string()).to_string(),
            "config:/x/config.kdl"
        );
        assert_eq!(ValueSource::Default.to_string(), "default");
    }

    // ==================== Resolution Tests ====================

    #[test]
    fn test_resolve_defaults() {
        let config =
            resolve_with(&FeedbackConfig::default(), &path(), &ConfigOverrides::new(), no_env)
                .unwrap();

        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.output_format.source, ValueSource::Default);
        assert_eq!(config.storage_backend(), BackendType::File);
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert!(config.data_dir().ends_with("feedbackloop"));
        assert_eq!(config.data_dir.source, ValueSource::Default);
    }

    #[test]
    fn test_resolve_from_file() {
        let file = FeedbackConfig {
            output_format: Some(OutputFormat::Human),
            data_dir: Some(PathBuf::from("/from/file")),
            storage_backend: Some(BackendType::Memory),
            log_filter: Some("debug".to_string()),
        };
        let config = resolve_with(&file, &path(), &ConfigOverrides::new(), no_env).unwrap();

        assert_eq!(config.output_format(), OutputFormat::Human);
        assert_eq!(config.data_dir(), Path::new("/from/file"));
        assert_eq!(config.storage_backend(), BackendType::Memory);
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(
            config.data_dir.source,
            ValueSource::ConfigFile("/etc/fl/config.kdl".to_string())
        );
    }

    #[test]
    fn test_env_beats_file() {
        let file = FeedbackConfig {
            data_dir: Some(PathBuf::from("/from/file")),
            log_filter: Some("debug".to_string()),
            ..Default::default()
        };
        let env = env_from(&[(DATA_DIR_ENV, "/from/env"), (LOG_ENV, "trace")]);
        let config = resolve_with(&file, &path(), &ConfigOverrides::new(), env).unwrap();

        assert_eq!(config.data_dir(), Path::new("/from/env"));
        assert_eq!(config.data_dir.source, ValueSource::EnvVar(DATA_DIR_ENV.to_string()));
        assert_eq!(config.log_filter(), "trace");
    }

    #[test]
    fn test_cli_beats_env_and_file() {
        let file = FeedbackConfig {
            output_format: Some(OutputFormat::Json),
            storage_backend: Some(BackendType::File),
            ..Default::default()
        };
        let env = env_from(&[(DATA_DIR_ENV, "/from/env"), (BACKEND_ENV, "file")]);
        let overrides = ConfigOverrides::new()
            .with_output_format(OutputFormat::Human)
            .with_data_dir("/from/cli")
            .with_storage_backend(BackendType::Memory)
            .with_log_filter("info");
        let config = resolve_with(&file, &path(), &overrides, env).unwrap();

        assert_eq!(config.output_format(), OutputFormat::Human);
        assert_eq!(config.data_dir(), Path::new("/from/cli"));
        assert_eq!(config.storage_backend(), BackendType::Memory);
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.storage_backend.source, ValueSource::CliFlag);
    }

    #[test]
    fn test_invalid_backend_env_is_error() {
        let env = env_from(&[(BACKEND_ENV, "redis")]);
        let result = resolve_with(&FeedbackConfig::default(), &path(), &ConfigOverrides::new(), env);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_resolve_config_reads_file_from_dir() {
        let dir = TempDir::new().unwrap();
        let file = FeedbackConfig {
            output_format: Some(OutputFormat::Human),
            ..Default::default()
        };
        file.save(&dir.path().join(CONFIG_FILE_NAME)).unwrap();

        let config = resolve_config(Some(dir.path()), &ConfigOverrides::new()).unwrap();
        assert_eq!(config.output_format(), OutputFormat::Human);
        assert_eq!(config.config_path, dir.path().join(CONFIG_FILE_NAME));
    }
}
