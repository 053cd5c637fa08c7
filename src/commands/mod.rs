//! Command implementations

pub mod build;
pub mod config;
pub mod doctor;
pub mod render;
pub mod version;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::domain::options::ImageOptions;
use crate::domain::profile::UserProfile;
use crate::infra::profile::load_profile;

/// Who the image installs for. Flags override values from `--profile`.
#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    /// YAML profile file (username, hostname, ssh_keys, ...)
    #[arg(short, long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Login name of the first user
    #[arg(long)]
    pub username: Option<String>,

    /// Hostname of the installed machine
    #[arg(long)]
    pub hostname: Option<String>,

    /// Human-readable machine name
    #[arg(long)]
    pub machine_name: Option<String>,

    /// Authorized SSH public key (repeatable, replaces the profile's keys)
    #[arg(long = "ssh-key", value_name = "KEY")]
    pub ssh_keys: Vec<String>,

    /// Git user.name for the first user
    #[arg(long)]
    pub git_name: Option<String>,

    /// Git user.email for the first user
    #[arg(long)]
    pub git_email: Option<String>,

    /// Optional package to enable, e.g. `docker` (repeatable)
    #[arg(long = "package", value_name = "NAME")]
    pub packages: Vec<String>,
}

impl ProfileArgs {
    /// Load the profile file, if any, and apply flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile file cannot be read or parsed.
    pub fn resolve(&self) -> Result<UserProfile> {
        let mut profile = match &self.profile {
            Some(path) => load_profile(path)?,
            None => UserProfile::default(),
        };
        if let Some(v) = &self.username {
            profile.username.clone_from(v);
        }
        if let Some(v) = &self.hostname {
            profile.hostname.clone_from(v);
        }
        if let Some(v) = &self.machine_name {
            profile.machine_name.clone_from(v);
        }
        if !self.ssh_keys.is_empty() {
            profile.ssh_keys.clone_from(&self.ssh_keys);
        }
        if self.git_name.is_some() {
            profile.git_name.clone_from(&self.git_name);
        }
        if self.git_email.is_some() {
            profile.git_email.clone_from(&self.git_email);
        }
        for pkg in &self.packages {
            if !profile.enabled_packages.contains(pkg) {
                profile.enabled_packages.push(pkg.clone());
            }
        }
        Ok(profile)
    }
}

/// Installer choices shared by `build` and `render`.
#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Ubuntu release of the source image [default: 24.04]
    #[arg(long, value_name = "VERSION")]
    pub os_version: Option<String>,

    /// Storage layout: lvm, direct or zfs [default: lvm]
    #[arg(long, value_name = "LAYOUT")]
    pub storage: Option<String>,

    /// Timezone of the installed system [default: UTC]
    #[arg(long)]
    pub timezone: Option<String>,

    /// Locale of the installed system [default: en_US.UTF-8]
    #[arg(long)]
    pub locale: Option<String>,
}

impl InstallArgs {
    /// Copy the given choices into `options`; unset ones stay empty so
    /// validation fills in defaults.
    pub fn apply(&self, options: &mut ImageOptions) {
        options.os_version = self.os_version.clone().unwrap_or_default();
        options.storage_layout = self.storage.clone().unwrap_or_default();
        options.timezone = self.timezone.clone().unwrap_or_default();
        options.locale = self.locale.clone().unwrap_or_default();
    }
}
