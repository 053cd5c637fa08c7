//! `autoiso build`: re-master a source image for unattended install.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::config_service;
use crate::commands::{InstallArgs, ProfileArgs};
use crate::domain::options::{ImageOptions, default_output_path};
use crate::image::{ImageBuilder, checksum};
use crate::output::TerminalReporter;

/// Arguments for the build command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Source Ubuntu server image (.iso)
    #[arg(short, long, value_name = "ISO")]
    pub source: PathBuf,

    /// Output image [default: <source>-autoinstall.iso beside the source]
    #[arg(short, long, value_name = "ISO")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub install: InstallArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Root for per-build work areas (overrides build.staging_dir)
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Do not write a .sha256 file next to the output
    #[arg(long)]
    pub no_checksum: bool,
}

/// Run the build command.
///
/// # Errors
///
/// Returns the first failing pipeline stage as a `BuildError` inside the
/// `anyhow::Error`, or a configuration/profile loading error.
pub async fn run(app: &AppContext, args: BuildArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let profile = args.profile.resolve()?;

    let mut options = ImageOptions {
        source_image_path: args.source.clone(),
        output_image_path: args.output.clone().unwrap_or_default(),
        ..ImageOptions::default()
    };
    args.install.apply(&mut options);

    let planned = if options.output_image_path.as_os_str().is_empty() {
        default_output_path(&options.source_image_path)
    } else {
        options.output_image_path.clone()
    };
    if planned.exists()
        && !app.confirm(
            &format!("{} already exists. Overwrite?", planned.display()),
            true,
        )?
    {
        app.output.info("Build cancelled; existing image kept");
        return Ok(ExitCode::SUCCESS);
    }

    let staging = args
        .staging_dir
        .clone()
        .unwrap_or_else(|| config.staging_dir());
    let detector = app.tool_detector(&config);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling build");
                cancel.cancel();
            }
        })
    };

    let reporter = TerminalReporter::new(&app.output);
    let result = {
        let mut builder =
            ImageBuilder::new(detector, staging, &reporter).with_cancellation(cancel.clone());
        builder.build(&profile, &mut options).await
    };
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            interrupt.abort();
            return Err(e.into());
        }
    };

    // The interrupt handler stays armed while hashing a multi-GB image.
    let digest = if config.build.checksum && !args.no_checksum {
        reporter.step("Computing SHA-256...");
        let image = outcome.output.clone();
        let token = cancel.clone();
        let hashed =
            tokio::task::spawn_blocking(move || checksum::write_sidecar(&image, &token)).await;
        interrupt.abort();
        let (sidecar, hash) = hashed.context("checksum task failed")??;
        reporter.success(&format!("Checksum written to {}", sidecar.display()));
        Some(hash)
    } else {
        interrupt.abort();
        None
    };
    drop(reporter);

    app.renderer().render_build(&outcome, digest.as_deref())?;
    Ok(ExitCode::SUCCESS)
}
