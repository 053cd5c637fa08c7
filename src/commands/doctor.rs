//! `autoiso doctor`: check the host can build images.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::{CommandRunner, ConfigStore};
use crate::domain::config::AutoisoConfig;
use crate::domain::error::BuildError;
use crate::domain::health::{ConfigCheck, DoctorChecks, StagingCheck, ToolCheck, collect_issues};
use crate::image::ToolDetector;

/// Run the doctor command. Exits non-zero when any check fails.
///
/// # Errors
///
/// Returns an error only if rendering fails.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let (config, config_check) = check_config(&app.config_store);
    let mut detector = app.tool_detector(&config);
    let checks = DoctorChecks {
        tool: check_tool(&mut detector).await,
        staging: check_staging(&config.staging_dir()),
        config: config_check,
    };
    let issues = collect_issues(&checks);
    app.renderer().render_doctor(&checks, &issues)?;
    Ok(if issues.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Locate and probe the mastering tool.
pub async fn check_tool<R: CommandRunner>(detector: &mut ToolDetector<R>) -> ToolCheck {
    let detected = detector.detect().await.map(Path::to_path_buf);
    match detected {
        Ok(path) => ToolCheck {
            found: true,
            path: Some(path),
            version: detector.version().map(ToString::to_string),
            ..ToolCheck::default()
        },
        Err(BuildError::ToolingUnavailable {
            reason, guidance, ..
        }) => ToolCheck {
            reason: Some(reason),
            guidance: Some(guidance),
            ..ToolCheck::default()
        },
        Err(e) => ToolCheck {
            reason: Some(e.to_string()),
            guidance: Some(detector.install_instructions().to_string()),
            ..ToolCheck::default()
        },
    }
}

/// Whether a work area could be created under `root` right now.
///
/// Probes an existing ancestor when the root itself does not exist yet,
/// since builds create it on demand.
#[must_use]
pub fn check_staging(root: &Path) -> StagingCheck {
    let probe_dir = root
        .ancestors()
        .find(|p| p.is_dir())
        .unwrap_or(Path::new("."));
    let writable = tempfile::Builder::new()
        .prefix(".autoiso-probe-")
        .tempfile_in(probe_dir)
        .is_ok();
    StagingCheck {
        path: root.to_path_buf(),
        writable,
    }
}

fn check_config(store: &impl ConfigStore) -> (AutoisoConfig, ConfigCheck) {
    let path = store.path().ok();
    match store.load() {
        Ok(config) => (
            config,
            ConfigCheck {
                path,
                valid: true,
                error: None,
            },
        ),
        Err(e) => (
            AutoisoConfig::default(),
            ConfigCheck {
                path,
                valid: false,
                error: Some(format!("{e:#}")),
            },
        ),
    }
}
