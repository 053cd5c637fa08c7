//! First-boot autoinstall document generation.
//!
//! Builds the cloud-config `user-data` consumed by the Ubuntu installer and
//! its empty `meta-data` companion. Pure functions only: the documents are
//! returned as values and written to disk by the image builder.

use serde::Serialize;

use crate::domain::error::InputError;
use crate::domain::options::{
    DEFAULT_LOCALE, DEFAULT_STORAGE_LAYOUT, DEFAULT_TIMEZONE, ImageOptions,
};
use crate::domain::profile::UserProfile;

// ── Constants ────────────────────────────────────────────────────────────────

pub const CLOUD_CONFIG_HEADER: &str = "#cloud-config";
pub const SCHEMA_VERSION: u32 = 1;
pub const KEYBOARD_LAYOUT: &str = "us";
pub const LOGIN_SHELL: &str = "/usr/bin/zsh";

/// Base packages installed by the installer itself. Independent of the
/// profile's package selection, which only drives post-boot installers.
pub const BASE_PACKAGES: &[&str] = &[
    "build-essential",
    "ca-certificates",
    "curl",
    "git",
    "gnupg",
    "htop",
    "jq",
    "tmux",
    "unzip",
    "vim",
    "wget",
    "zsh",
];

const IN_TARGET: &str = "curtin in-target --target=/target --";

const GH_KEYRING: &str = "/etc/apt/keyrings/githubcli-archive-keyring.gpg";
const GH_KEYRING_URL: &str = "https://cli.github.com/packages/githubcli-archive-keyring.gpg";
const GH_SOURCES_LIST: &str = "/etc/apt/sources.list.d/github-cli.list";
const TAILSCALE_INSTALL_URL: &str = "https://tailscale.com/install.sh";

// ── Document ─────────────────────────────────────────────────────────────────

/// Top-level cloud-config wrapper: the installer reads the `autoinstall` key.
#[derive(Serialize)]
struct CloudConfig<'a> {
    autoinstall: &'a AutoinstallDocument,
}

/// The `autoinstall:` section of the generated user-data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AutoinstallDocument {
    pub version: u32,
    pub locale: String,
    pub timezone: String,
    pub keyboard: Keyboard,
    pub identity: Identity,
    pub ssh: SshSection,
    pub storage: Storage,
    pub packages: Vec<String>,
    pub late_commands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    pub layout: String,
}

/// Identity without a password: access is SSH-key only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub hostname: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SshSection {
    pub install_server: bool,
    pub authorized_keys: Vec<String>,
    pub allow_pw: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Storage {
    pub layout: StorageLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageLayout {
    pub name: String,
}

impl AutoinstallDocument {
    /// Serialize as `user-data`: the `#cloud-config` header line followed by
    /// the YAML document.
    ///
    /// # Errors
    ///
    /// Returns an error if YAML serialization fails.
    pub fn to_user_data(&self) -> Result<Vec<u8>, serde_yaml::Error> {
        let yaml = serde_yaml::to_string(&CloudConfig { autoinstall: self })?;
        Ok(format!("{CLOUD_CONFIG_HEADER}\n{yaml}").into_bytes())
    }
}

// ── Builder ──────────────────────────────────────────────────────────────────

/// Converts a user profile and build options into first-boot documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoinstallDocumentBuilder;

impl AutoinstallDocumentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Generate the autoinstall document.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Unset`] when either argument is absent, or
    /// [`InputError::EmptyProfileField`] when the profile lacks a username or
    /// hostname.
    pub fn generate(
        &self,
        profile: Option<&UserProfile>,
        options: Option<&ImageOptions>,
    ) -> Result<AutoinstallDocument, InputError> {
        let profile = profile.ok_or(InputError::Unset("profile"))?;
        let options = options.ok_or(InputError::Unset("options"))?;
        profile.validate()?;

        let timezone = or_default(&options.timezone, DEFAULT_TIMEZONE);

        Ok(AutoinstallDocument {
            version: SCHEMA_VERSION,
            locale: or_default(&options.locale, DEFAULT_LOCALE).to_string(),
            timezone: timezone.to_string(),
            keyboard: Keyboard {
                layout: KEYBOARD_LAYOUT.to_string(),
            },
            identity: Identity {
                hostname: profile.hostname.clone(),
                username: profile.username.clone(),
            },
            ssh: SshSection {
                install_server: true,
                authorized_keys: profile.ssh_keys.clone(),
                allow_pw: false,
            },
            storage: Storage {
                layout: StorageLayout {
                    name: or_default(&options.storage_layout, DEFAULT_STORAGE_LAYOUT).to_string(),
                },
            },
            packages: BASE_PACKAGES.iter().map(ToString::to_string).collect(),
            late_commands: late_commands(profile, timezone),
        })
    }

    /// The `meta-data` companion. Always present, always empty.
    #[must_use]
    pub fn generate_meta_data(&self) -> Vec<u8> {
        Vec::new()
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

// ── Late commands ────────────────────────────────────────────────────────────

/// Post-install commands, in execution order. Conditional stages that do
/// not apply contribute nothing.
#[must_use]
pub fn late_commands(profile: &UserProfile, timezone: &str) -> Vec<String> {
    let user = profile.username.as_str();
    let mut cmds = Vec::new();

    cmds.push(in_target(&format!(
        "ln -sf {} /etc/localtime",
        shell_quote(&format!("/usr/share/zoneinfo/{timezone}"))
    )));

    if profile.docker_enabled() {
        cmds.push(in_target("apt-get install -y docker.io"));
        cmds.push(in_target("systemctl enable docker"));
        cmds.push(in_target(&format!("usermod -aG docker {}", shell_quote(user))));
    }

    cmds.push(in_target(&sh(&format!(
        "mkdir -p -m 755 /etc/apt/keyrings && curl -fsSL {GH_KEYRING_URL} -o {GH_KEYRING} && chmod go+r {GH_KEYRING}"
    ))));
    cmds.push(in_target(&sh(&format!(
        "echo \"deb [arch=$(dpkg --print-architecture) signed-by={GH_KEYRING}] https://cli.github.com/packages stable main\" > {GH_SOURCES_LIST}"
    ))));
    cmds.push(in_target(&sh("apt-get update && apt-get install -y gh")));

    cmds.push(in_target(&sh(&format!(
        "curl -fsSL {TAILSCALE_INSTALL_URL} | sh"
    ))));
    cmds.push(in_target("systemctl enable tailscaled"));

    cmds.push(in_target(&format!(
        "chsh -s {LOGIN_SHELL} {}",
        shell_quote(user)
    )));

    let config_dir = shell_quote(&format!("/home/{user}/.config"));
    let local_dir = shell_quote(&format!("/home/{user}/.local"));
    let bin_dir = shell_quote(&format!("/home/{user}/.local/bin"));
    cmds.push(in_target(&format!("mkdir -p {config_dir} {bin_dir}")));
    cmds.push(in_target(&format!(
        "chown -R {}:{} {config_dir} {local_dir}",
        shell_quote(user),
        shell_quote(user)
    )));

    if let Some((name, email)) = profile.git_identity() {
        for (key, value) in [("user.name", name), ("user.email", email)] {
            let git = format!("git config --global {key} {}", shell_quote(value));
            cmds.push(in_target(&format!(
                "su - {} -c {}",
                shell_quote(user),
                shell_quote(&git)
            )));
        }
    }

    cmds
}

fn in_target(cmd: &str) -> String {
    format!("{IN_TARGET} {cmd}")
}

fn sh(script: &str) -> String {
    format!("sh -c {}", shell_quote(script))
}

/// Quote a word for POSIX `sh`. Words made only of safe characters are
/// returned unchanged.
#[must_use]
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@+%,".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
