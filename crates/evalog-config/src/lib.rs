//! Evalog configuration loading and validation.
//!
//! This crate provides:
//! - The typed [`EvalogConfig`] file format
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation of config values

pub mod resolve;
pub mod settings;

pub use resolve::{resolve_config, resolve_with_env, CliOverrides, ConfigPaths, ResolvedConfig};
pub use settings::EvalogConfig;

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
