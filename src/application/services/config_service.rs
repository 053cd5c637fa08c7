//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::AutoisoConfig;

/// Load configuration.
///
/// # Errors
///
/// Returns an error if the stored file cannot be read or parsed.
pub fn load_config(store: &impl ConfigStore) -> Result<AutoisoConfig> {
    store.load()
}

/// Save configuration.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_config(store: &impl ConfigStore, config: &AutoisoConfig) -> Result<()> {
    store.save(config)
}

/// Validate and persist a single `key = value` setting.
///
/// Nothing is written when validation fails.
///
/// # Errors
///
/// Returns an error for unknown keys, invalid values, or storage failures.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<AutoisoConfig> {
    let mut config = load_config(store)?;
    config.set(key, value)?;
    save_config(store, &config)?;
    Ok(config)
}
