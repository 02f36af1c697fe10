#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for vsaudit
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (TOML)
//! - Environment variables
//! - CLI flags (applied by the binary)
//!
//! There is deliberately no process-wide mutable state: the loaded
//! `Config` value is threaded into each component at construction.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use vsaudit_errors::{ConfigError, Error};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub snapshots: SnapshotConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Emit per-object diagnostic events (disk registrations, excluded
    /// helper files) in addition to the summary events
    #[serde(default)]
    pub verbose_diagnostics: bool,
}

/// Remote-call configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-call timeout for every remote operation, in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

/// Datastore scanning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Upper bound on concurrently browsed datastores
    #[serde(default = "default_concurrent_browses")]
    pub concurrent_browses: usize,
    /// Glob matched against disk-image files during a browse
    #[serde(default = "default_disk_glob")]
    pub disk_glob: String,
    /// Path fragments that mark a system recovery folder
    #[serde(default = "default_recovery_markers")]
    pub recovery_folder_markers: Vec<String>,
}

/// Snapshot aging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Snapshots at least this old are highlighted in reports
    #[serde(default = "default_age_warning_days")]
    pub age_warning_days: i64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose_diagnostics: false,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrent_browses: default_concurrent_browses(),
            disk_glob: default_disk_glob(),
            recovery_folder_markers: default_recovery_markers(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            age_warning_days: default_age_warning_days(),
        }
    }
}

fn default_call_timeout_secs() -> u64 {
    30
}

fn default_concurrent_browses() -> usize {
    4
}

fn default_disk_glob() -> String {
    "*.vmdk".to_string()
}

fn default_recovery_markers() -> Vec<String> {
    vec!["/forgotten/".to_string(), "/lost+found/".to_string()]
}

fn default_age_warning_days() -> i64 {
    7
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or not
    /// valid TOML.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let content = fs::read_to_string(path).await.map_err(|e| ConfigError::IoError {
            message: e.to_string(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file when a path is given, otherwise use defaults
    ///
    /// # Errors
    ///
    /// Returns an error for an explicitly given but unusable file.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(p) => Self::load(p).await,
            None => Ok(Self::default()),
        }
    }

    /// Merge environment variables over the current values.
    ///
    /// `VSAUDIT_VERBOSE=1` enables verbose diagnostics,
    /// `VSAUDIT_CALL_TIMEOUT_SECS` overrides the per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns an error for unparseable override values.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(value) = std::env::var("VSAUDIT_VERBOSE") {
            self.general.verbose_diagnostics = value == "1" || value.eq_ignore_ascii_case("true");
        }
        if let Ok(value) = std::env::var("VSAUDIT_CALL_TIMEOUT_SECS") {
            let secs = value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                field: "network.call_timeout_secs".to_string(),
                message: format!("not an integer: {value}"),
            })?;
            self.network.call_timeout_secs = secs;
        }
        self.validate()?;
        Ok(())
    }

    /// Per-call timeout as a `Duration`
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.network.call_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.network.call_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.call_timeout_secs".to_string(),
                message: "timeout must be at least 1 second".to_string(),
            });
        }
        if self.scan.concurrent_browses == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.concurrent_browses".to_string(),
                message: "at least one concurrent browse is required".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.network.call_timeout_secs, 30);
        assert_eq!(config.scan.disk_glob, "*.vmdk");
        assert!(config
            .scan
            .recovery_folder_markers
            .contains(&"/lost+found/".to_string()));
        assert!(!config.general.verbose_diagnostics);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [general]
            verbose_diagnostics = true

            [scan]
            concurrent_browses = 2
            "#,
        )
        .expect("parse");
        assert!(config.general.verbose_diagnostics);
        assert_eq!(config.scan.concurrent_browses, 2);
        assert_eq!(config.network.call_timeout_secs, 30);
    }

    #[test]
    fn zero_timeout_rejected() {
        let config: Config = toml::from_str("[network]\ncall_timeout_secs = 0\n").expect("parse");
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = Config::load(Path::new("/nonexistent/vsaudit.toml")).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[snapshots]\nage_warning_days = 14\n")
            .await
            .expect("write");
        let config = Config::load(&path).await.expect("load");
        assert_eq!(config.snapshots.age_warning_days, 14);
    }
}
