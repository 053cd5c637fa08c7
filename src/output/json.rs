//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed object to
//! stdout. Failures use the error object from [`format_error`].

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::bootloader::{BiosBoot, BootLayout};
use crate::domain::config::AutoisoConfig;
use crate::domain::error::{BuildError, ConfigError, InputError};
use crate::domain::health::DoctorChecks;
use crate::image::BuildOutcome;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable machine-readable code for a command failure.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<BuildError>() {
        e.code()
    } else if err.downcast_ref::<InputError>().is_some() {
        "INVALID_INPUT"
    } else if err.downcast_ref::<ConfigError>().is_some() {
        "INVALID_CONFIG"
    } else {
        "ERROR"
    }
}

/// Renders results as JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        print_json(&serde_json::json!({ "version": version }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_build(&self, outcome: &BuildOutcome, checksum: Option<&str>) -> Result<()> {
        print_json(&build_json(outcome, checksum))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_doctor(&self, checks: &DoctorChecks, issues: &[String]) -> Result<()> {
        let checks = serde_json::to_value(checks).context("JSON serialization failed")?;
        print_json(&serde_json::json!({
            "status": if issues.is_empty() { "healthy" } else { "unhealthy" },
            "checks": checks,
            "issues": issues,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_documents(
        &self,
        user_data: &str,
        meta_data: &str,
        written_to: Option<&Path>,
    ) -> Result<()> {
        print_json(&serde_json::json!({
            "user_data": user_data,
            "meta_data": meta_data,
            "written_to": written_to.map(|p| p.display().to_string()),
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &AutoisoConfig, path: &Path) -> Result<()> {
        let config = serde_json::to_value(config).context("JSON serialization failed")?;
        print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "config": config,
        }))
    }
}

/// JSON document describing a finished build.
#[must_use]
pub fn build_json(outcome: &BuildOutcome, checksum: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "output": outcome.output.display().to_string(),
        "size": outcome.size,
        "volume_id": outcome.volume_id,
        "boot": boot_json(&outcome.boot),
        "sha256": checksum,
    })
}

fn boot_json(layout: &BootLayout) -> serde_json::Value {
    let (bios, hybrid) = match layout.bios {
        Some(BiosBoot::Grub { hybrid_mbr }) => (Some("grub"), hybrid_mbr),
        Some(BiosBoot::Isolinux { hybrid_mbr }) => (Some("isolinux"), hybrid_mbr),
        None => (None, false),
    };
    serde_json::json!({
        "bios": bios,
        "hybrid_mbr": hybrid,
        "uefi": layout.uefi_image.is_some(),
    })
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{out}");
    Ok(())
}
