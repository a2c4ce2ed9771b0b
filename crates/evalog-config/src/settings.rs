//! The on-disk configuration file.
//!
//! Every field is optional in the JSON; missing fields take their defaults.

use std::path::{Path, PathBuf};

use evalog_common::schema::is_compatible;
use evalog_common::{Error, HeaderCheck, Result, DEFAULT_RUN_ID_PREFIX};
use serde::{Deserialize, Serialize};

use crate::CONFIG_SCHEMA_VERSION;

/// Evalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalogConfig {
    /// Config format version.
    pub schema_version: String,

    /// Destination of the experiment log.
    pub log_path: Option<PathBuf>,

    /// Prefix for synthesized run IDs.
    pub run_id_prefix: String,

    /// Synthesize run IDs for records that carry none.
    pub auto_id: bool,

    /// Handling of an existing log header that differs from the schema.
    pub header_check: HeaderCheck,
}

impl Default for EvalogConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            log_path: None,
            run_id_prefix: DEFAULT_RUN_ID_PREFIX.to_string(),
            auto_id: true,
            header_check: HeaderCheck::default(),
        }
    }
}

impl EvalogConfig {
    /// Parse and validate a config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EvalogConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<()> {
        if !is_compatible(&self.schema_version) {
            return Err(Error::Config(format!(
                "unsupported config schema_version {}",
                self.schema_version
            )));
        }
        validate_prefix(&self.run_id_prefix)?;
        if let Some(path) = &self.log_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("log_path must not be empty".to_string()));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A run-ID prefix must be non-empty and fit in one CSV cell unquoted.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(Error::Config("run_id_prefix must not be empty".to_string()));
    }
    if prefix.contains([',', '\n', '\r', '"']) {
        return Err(Error::Config(format!(
            "run_id_prefix contains a reserved character: {:?}",
            prefix
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = EvalogConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.auto_id);
        assert_eq!(config.run_id_prefix, "run");
        assert_eq!(config.header_check, HeaderCheck::Ignore);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config = EvalogConfig::from_json(r#"{"header_check": "warn"}"#).unwrap();
        assert_eq!(config.header_check, HeaderCheck::Warn);
        assert_eq!(config.run_id_prefix, "run");
        assert!(config.log_path.is_none());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(EvalogConfig::from_json(r#"{"log_pth": "x.csv"}"#).is_err());
    }

    #[test]
    fn bad_prefix_rejected() {
        assert!(EvalogConfig::from_json(r#"{"run_id_prefix": ""}"#).is_err());
        assert!(EvalogConfig::from_json(r#"{"run_id_prefix": "a,b"}"#).is_err());
        assert!(validate_prefix("exp").is_ok());
    }

    #[test]
    fn incompatible_version_rejected() {
        let err = EvalogConfig::from_json(r#"{"schema_version": "2.0.0"}"#).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn roundtrip_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let config = EvalogConfig {
            log_path: Some(PathBuf::from("/var/lib/evalog/runs.csv")),
            run_id_prefix: "bench".to_string(),
            ..EvalogConfig::default()
        };
        std::fs::write(&path, config.to_json().unwrap()).unwrap();

        let loaded = EvalogConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EvalogConfig::load_from_file(Path::new("/nonexistent/evalog.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
