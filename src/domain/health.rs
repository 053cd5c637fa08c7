//! Doctor check results and pure diagnostic functions.
//!
//! No I/O here; the doctor command gathers the facts and hands them in.

use std::path::PathBuf;

use serde::Serialize;

/// Everything `autoiso doctor` inspects.
#[derive(Debug, Serialize)]
pub struct DoctorChecks {
    /// Image-mastering tool.
    pub tool: ToolCheck,
    /// Staging root for work areas.
    pub staging: StagingCheck,
    /// Persistent configuration file.
    pub config: ConfigCheck,
}

/// Result of locating and probing `xorriso`.
#[derive(Debug, Default, Serialize)]
pub struct ToolCheck {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Why the tool is unusable, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Platform install instructions, when the tool is unusable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

/// Whether work areas can be created under the staging root.
#[derive(Debug, Serialize)]
pub struct StagingCheck {
    pub path: PathBuf,
    pub writable: bool,
}

/// Whether the configuration file parses.
#[derive(Debug, Serialize)]
pub struct ConfigCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collect actionable issues from check results.
#[must_use]
pub fn collect_issues(checks: &DoctorChecks) -> Vec<String> {
    let mut issues = Vec::new();
    if !checks.tool.found {
        let reason = checks.tool.reason.as_deref().unwrap_or("not found");
        issues.push(format!("xorriso is not usable: {reason}"));
    }
    if !checks.staging.writable {
        issues.push(format!(
            "Staging directory {} is not writable",
            checks.staging.path.display()
        ));
    }
    if !checks.config.valid {
        let err = checks.config.error.as_deref().unwrap_or("unreadable");
        issues.push(format!("Configuration file is invalid: {err}"));
    }
    issues
}
