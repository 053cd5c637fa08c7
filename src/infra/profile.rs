//! Loading user profiles from YAML files.

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::profile::UserProfile;

/// Read a `UserProfile` from a YAML file. Missing fields take their defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid YAML.
pub fn load_profile(path: &Path) -> Result<UserProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read profile {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("cannot parse profile {}", path.display()))
}
