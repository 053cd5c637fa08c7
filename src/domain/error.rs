//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// ── Build stages ──────────────────────────────────────────────────────────────

/// Pipeline stages of a single image build, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    ToolCheck,
    OptionValidation,
    WorkArea,
    Extraction,
    DocumentGeneration,
    Injection,
    BootloaderPatch,
    OutputDirectory,
    Repack,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ToolCheck => "tool check",
            Self::OptionValidation => "option validation",
            Self::WorkArea => "work area creation",
            Self::Extraction => "extraction",
            Self::DocumentGeneration => "document generation",
            Self::Injection => "injection",
            Self::BootloaderPatch => "bootloader patch",
            Self::OutputDirectory => "output directory creation",
            Self::Repack => "repack",
        };
        f.write_str(name)
    }
}

// ── Input errors ──────────────────────────────────────────────────────────────

/// Malformed or missing build request / profile fields.
///
/// Always detected before any filesystem mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("{0} is unset")]
    Unset(&'static str),

    #[error("source image path is empty")]
    EmptySourcePath,

    #[error("source image not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("source image is not a regular file: {}", .0.display())]
    SourceNotFile(PathBuf),

    #[error("source image must have a .iso extension: {}", .0.display())]
    WrongExtension(PathBuf),

    #[error("unsupported version '{value}' (supported: {supported})")]
    UnsupportedVersion { value: String, supported: String },

    #[error("unsupported storage layout '{value}' (supported: {supported})")]
    UnsupportedStorageLayout { value: String, supported: String },

    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("profile field '{0}' must not be empty")]
    EmptyProfileField(&'static str),
}

// ── Build errors ──────────────────────────────────────────────────────────────

/// Every way an image build can fail.
///
/// All variants abort the pipeline. The work area is removed regardless of
/// which variant is returned.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{tool} is not available: {reason}\n\n{guidance}")]
    ToolingUnavailable {
        tool: String,
        reason: String,
        guidance: String,
    },

    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("{context}: {source}")]
    Filesystem {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("boot configuration not found: {0}")]
    BootloaderNotFound(String),

    #[error("{tool} {action} failed (exit code {code}):\n{output}")]
    SubprocessFailure {
        tool: String,
        action: String,
        code: String,
        output: String,
    },

    #[error("failed to run {tool}: {message}")]
    Spawn { tool: String, message: String },

    #[error("serializing autoinstall document: {0}")]
    Serialization(String),

    #[error("build cancelled before {0}")]
    Cancelled(BuildStage),
}

impl BuildError {
    /// Wrap an I/O error with stage context.
    pub fn fs(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Filesystem {
            context: context.into(),
            source,
        }
    }

    /// Stable machine-readable code used by `--json` error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ToolingUnavailable { .. } => "TOOLING_UNAVAILABLE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Filesystem { .. } => "FILESYSTEM_ERROR",
            Self::BootloaderNotFound(_) => "BOOTLOADER_NOT_FOUND",
            Self::SubprocessFailure { .. } | Self::Spawn { .. } => "SUBPROCESS_FAILURE",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Cancelled(_) => "CANCELLED",
        }
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
