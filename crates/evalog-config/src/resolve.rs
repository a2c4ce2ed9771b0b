//! Config resolution: CLI → env → config file → defaults.

use std::path::{Path, PathBuf};

use evalog_common::{Error, HeaderCheck, Result, DEFAULT_LOG_FILE};
use tracing::debug;

use crate::settings::{validate_prefix, EvalogConfig};

/// Explicit log destination.
pub const ENV_LOG_PATH: &str = "EVALOG_LOG_PATH";
/// Explicit config file.
pub const ENV_CONFIG: &str = "EVALOG_CONFIG";
/// Explicit data directory.
pub const ENV_DATA_DIR: &str = "EVALOG_DATA";

const DIR_NAME: &str = "evalog";
const CONFIG_FILE: &str = "config.json";

/// Values given on the command line; `None` means "not specified".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub run_id_prefix: Option<String>,
    pub auto_id: Option<bool>,
    pub header_check: Option<HeaderCheck>,
}

/// Where configuration and data were looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Config file that was loaded, if any.
    pub config_file: Option<PathBuf>,
    /// Data directory holding the default log.
    pub data_dir: PathBuf,
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: EvalogConfig,
    pub paths: ConfigPaths,
    /// Final log destination.
    pub log_path: PathBuf,
}

/// Resolve configuration from the process environment.
pub fn resolve_config(overrides: &CliOverrides) -> Result<ResolvedConfig> {
    resolve_with_env(overrides, |key| std::env::var(key).ok())
}

/// Resolve configuration with an injectable environment lookup.
pub fn resolve_with_env<F>(overrides: &CliOverrides, env: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config_file = locate_config_file(overrides, &env)?;
    let mut config = match &config_file {
        Some(path) => {
            debug!(path = %path.display(), "loading config file");
            EvalogConfig::load_from_file(path)?
        }
        None => EvalogConfig::default(),
    };

    if let Some(prefix) = &overrides.run_id_prefix {
        validate_prefix(prefix)?;
        config.run_id_prefix = prefix.clone();
    }
    if let Some(auto_id) = overrides.auto_id {
        config.auto_id = auto_id;
    }
    if let Some(check) = overrides.header_check {
        config.header_check = check;
    }

    let data_dir = resolve_data_dir(&env);
    let log_path = overrides
        .log_path
        .clone()
        .or_else(|| non_empty(&env, ENV_LOG_PATH).map(PathBuf::from))
        .or_else(|| config.log_path.clone())
        .unwrap_or_else(|| data_dir.join(DEFAULT_LOG_FILE));

    debug!(log_path = %log_path.display(), data_dir = %data_dir.display(), "config resolved");

    Ok(ResolvedConfig {
        config,
        paths: ConfigPaths {
            config_file,
            data_dir,
        },
        log_path,
    })
}

/// Explicitly named config files must exist; the default location is optional.
fn locate_config_file<F>(overrides: &CliOverrides, env: &F) -> Result<Option<PathBuf>>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = overrides
        .config
        .clone()
        .or_else(|| non_empty(env, ENV_CONFIG).map(PathBuf::from));
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    let default = default_config_dir(env).map(|dir| dir.join(CONFIG_FILE));
    Ok(default.filter(|p| p.is_file()))
}

fn default_config_dir<F>(env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(xdg) = non_empty(env, "XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join(DIR_NAME));
    }
    dirs::config_dir().map(|base| base.join(DIR_NAME))
}

/// Resolve the data directory.
fn resolve_data_dir<F>(env: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    // 1) Explicit override
    if let Some(dir) = non_empty(env, ENV_DATA_DIR) {
        return PathBuf::from(dir);
    }

    // 2) XDG_DATA_HOME
    if let Some(xdg) = non_empty(env, "XDG_DATA_HOME") {
        return PathBuf::from(xdg).join(DIR_NAME);
    }

    // 3) Platform default, then the working directory
    dirs::data_dir()
        .map(|base| base.join(DIR_NAME))
        .unwrap_or_else(|| Path::new(".").to_path_buf())
}

fn non_empty<F>(env: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env(key).filter(|v| !v.is_empty())
}
