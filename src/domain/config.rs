//! Domain types and validators for autoiso configuration.
//!
//! Pure functions only, no I/O.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &["build.staging_dir", "build.checksum", "tool.path"];
pub const VALID_BOOLEANS: &[&str] = &["true", "false"];

/// Staging root used when `build.staging_dir` is unset, relative to the
/// current directory.
pub const DEFAULT_STAGING_DIR: &str = ".autoiso-staging";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.autoiso/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AutoisoConfig {
    /// Build settings.
    pub build: BuildConfig,
    /// External tool settings.
    pub tool: ToolConfig,
}

/// Build settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    /// Root under which per-build work areas are created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,
    /// Write a `.sha256` sidecar next to every built image.
    pub checksum: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            staging_dir: None,
            checksum: true,
        }
    }
}

/// External tool settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ToolConfig {
    /// Explicit mastering tool path; skips the search path lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl AutoisoConfig {
    /// Staging root for work areas.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.build
            .staging_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR))
    }

    /// Apply a validated `key = value` pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "build.staging_dir" => self.build.staging_dir = Some(PathBuf::from(value)),
            "build.checksum" => self.build.checksum = value == "true",
            "tool.path" => self.tool.path = Some(PathBuf::from(value)),
            _ => anyhow::bail!("Unknown setting: {key}"),
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |valid: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid: valid.to_string(),
    };
    match key {
        "build.checksum" if !VALID_BOOLEANS.contains(&value) => {
            Err(invalid(&VALID_BOOLEANS.join(", ")).into())
        }
        "build.staging_dir" | "tool.path" if value.trim().is_empty() => {
            Err(invalid("a non-empty path").into())
        }
        _ => Ok(()),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
