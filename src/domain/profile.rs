//! User profile consumed by the autoinstall document builder.
//!
//! Pure data, no I/O. Loading from disk lives in `crate::infra::profile`.

use serde::{Deserialize, Serialize};

use crate::domain::error::InputError;

/// Package name whose presence in `enabled_packages` turns on the container
/// runtime late-commands.
pub const DOCKER_PACKAGE: &str = "docker";

/// Who the installed machine is for and what it should carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub username: String,
    pub hostname: String,
    /// Human-readable machine name, e.g. "Dev Box".
    pub machine_name: String,
    /// Authorized SSH public keys, in the order they are written out.
    pub ssh_keys: Vec<String>,
    pub git_name: Option<String>,
    pub git_email: Option<String>,
    pub enabled_packages: Vec<String>,
    pub disabled_packages: Vec<String>,
}

impl UserProfile {
    /// Whether the container runtime should be installed.
    #[must_use]
    pub fn docker_enabled(&self) -> bool {
        self.enabled_packages.iter().any(|p| p == DOCKER_PACKAGE)
    }

    /// Git identity, present only when both name and email are non-empty.
    #[must_use]
    pub fn git_identity(&self) -> Option<(&str, &str)> {
        let name = self.git_name.as_deref().map(str::trim).unwrap_or_default();
        let email = self.git_email.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() || email.is_empty() {
            None
        } else {
            Some((name, email))
        }
    }

    /// Check the fields the first-boot document cannot do without.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::EmptyProfileField`] for the first empty field.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.username.trim().is_empty() {
            return Err(InputError::EmptyProfileField("username"));
        }
        if self.hostname.trim().is_empty() {
            return Err(InputError::EmptyProfileField("hostname"));
        }
        Ok(())
    }
}
