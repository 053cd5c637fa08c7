//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out;
//! `ImageOptions::validate` reads source image metadata and nothing else.

pub mod autoinstall;
pub mod bootloader;
pub mod config;
pub mod error;
pub mod health;
pub mod options;
pub mod profile;

pub use autoinstall::{AutoinstallDocument, AutoinstallDocumentBuilder};
pub use bootloader::{BootLayout, PatchOutcome, patch_boot_config};
pub use config::{AutoisoConfig, validate_config_key, validate_config_value};
pub use error::{BuildError, BuildStage, ConfigError, InputError};
pub use options::ImageOptions;
pub use profile::UserProfile;
