//! Build request options and their validation.
//!
//! `ImageOptions::validate` is the only place in the domain layer that
//! touches the filesystem, and only to read metadata of the source image.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::error::InputError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const SUPPORTED_OS_VERSIONS: &[&str] = &["24.04", "22.04"];
pub const DEFAULT_OS_VERSION: &str = "24.04";

pub const SUPPORTED_STORAGE_LAYOUTS: &[&str] = &["lvm", "direct", "zfs"];
pub const DEFAULT_STORAGE_LAYOUT: &str = "lvm";

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_LOCALE: &str = "en_US.UTF-8";

/// Extension every source and output image carries.
pub const IMAGE_EXTENSION: &str = "iso";

/// Suffix appended to the source stem when the output path is defaulted.
pub const OUTPUT_SUFFIX: &str = "-autoinstall";

/// ISO9660 volume identifiers are at most 32 characters.
pub const VOLUME_ID_MAX_LEN: usize = 32;
pub const VOLUME_ID_PREFIX: &str = "UBUNTU_AUTOINSTALL_";

// ── Options ──────────────────────────────────────────────────────────────────

/// A single build request.
///
/// Empty strings mean "not provided"; `validate` fills them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageOptions {
    pub source_image_path: PathBuf,
    pub output_image_path: PathBuf,
    pub os_version: String,
    pub storage_layout: String,
    pub timezone: String,
    pub locale: String,
}

impl ImageOptions {
    /// Options with only the source image set.
    #[must_use]
    pub fn for_source(source: impl Into<PathBuf>) -> Self {
        Self {
            source_image_path: source.into(),
            ..Self::default()
        }
    }

    /// Validate the request and fill in defaults for empty optional fields.
    ///
    /// Rules are checked in a fixed order so the first reported error is
    /// reproducible: source path, source file, extension, OS version,
    /// storage layout, then defaults for output path, timezone and locale.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule as an [`InputError`]. On error no
    /// field has been modified.
    pub fn validate(&mut self) -> Result<(), InputError> {
        if self.source_image_path.as_os_str().is_empty() {
            return Err(InputError::EmptySourcePath);
        }

        let meta = std::fs::metadata(&self.source_image_path)
            .map_err(|_| InputError::SourceNotFound(self.source_image_path.clone()))?;
        if !meta.is_file() {
            return Err(InputError::SourceNotFile(self.source_image_path.clone()));
        }

        if !has_image_extension(&self.source_image_path) {
            return Err(InputError::WrongExtension(self.source_image_path.clone()));
        }

        self.validate_choices()?;

        if self.output_image_path.as_os_str().is_empty() {
            self.output_image_path = default_output_path(&self.source_image_path);
        }
        Ok(())
    }

    /// Check OS version and storage layout, then default every empty
    /// choice field. Needs no source image, so previews can use it.
    ///
    /// # Errors
    ///
    /// Returns the first unsupported choice. On error no field has been
    /// modified.
    pub fn validate_choices(&mut self) -> Result<(), InputError> {
        let os_version = resolve_choice(&self.os_version, DEFAULT_OS_VERSION);
        if !SUPPORTED_OS_VERSIONS.contains(&os_version) {
            return Err(InputError::UnsupportedVersion {
                value: os_version.to_string(),
                supported: SUPPORTED_OS_VERSIONS.join(", "),
            });
        }

        let storage_layout = resolve_choice(&self.storage_layout, DEFAULT_STORAGE_LAYOUT);
        if !SUPPORTED_STORAGE_LAYOUTS.contains(&storage_layout) {
            return Err(InputError::UnsupportedStorageLayout {
                value: storage_layout.to_string(),
                supported: SUPPORTED_STORAGE_LAYOUTS.join(", "),
            });
        }

        self.os_version = os_version.to_string();
        self.storage_layout = storage_layout.to_string();
        if self.timezone.is_empty() {
            self.timezone = DEFAULT_TIMEZONE.to_string();
        }
        if self.locale.is_empty() {
            self.locale = DEFAULT_LOCALE.to_string();
        }
        Ok(())
    }

    /// Parent directory of the output image. Callers create it before writing.
    #[must_use]
    pub fn output_directory(&self) -> PathBuf {
        match self.output_image_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Volume identifier for the repacked image.
    #[must_use]
    pub fn volume_id(&self) -> String {
        volume_id(&self.os_version)
    }
}

fn resolve_choice<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(IMAGE_EXTENSION))
}

/// `<dir>/<stem>-autoinstall.iso` next to the source image.
#[must_use]
pub fn default_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{stem}{OUTPUT_SUFFIX}.{IMAGE_EXTENSION}");
    match source.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Derive the ISO9660 volume identifier from an OS version string.
///
/// Dots become underscores and the result is truncated to the 32-character
/// on-disk limit.
#[must_use]
pub fn volume_id(os_version: &str) -> String {
    let mut id = format!("{VOLUME_ID_PREFIX}{}", os_version.replace('.', "_"));
    if id.len() > VOLUME_ID_MAX_LEN {
        let mut end = VOLUME_ID_MAX_LEN;
        while !id.is_char_boundary(end) {
            end -= 1;
        }
        id.truncate(end);
    }
    id
}

// ── Unit tests ───────────────────────────────────────────────────────────────
