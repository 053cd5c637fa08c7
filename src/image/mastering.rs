//! `xorriso` invocations: unpacking a source image and re-mastering a tree.
//!
//! Argument lists are built by pure functions so the exact command lines can
//! be asserted in tests; execution goes through the `CommandRunner` port.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::application::ports::CommandRunner;
use crate::domain::bootloader::BootLayout;
use crate::domain::error::{BuildError, BuildStage, InputError};
use crate::infra::command_runner::combined_output;

use super::tool::TOOL_NAME;

/// `xorriso` arguments to unpack the whole of `source` into `dest`.
#[must_use]
pub fn extract_args(source: &str, dest: &str) -> Vec<String> {
    Vec::from(["-osirrox", "on", "-indev", source, "-extract", "/", dest].map(String::from))
}

/// `xorriso -as mkisofs` arguments to build `output` from `tree`.
#[must_use]
pub fn repack_args(tree: &str, output: &str, volume_id: &str, layout: &BootLayout) -> Vec<String> {
    let mut args: Vec<String> = Vec::from(
        [
            "-as",
            "mkisofs",
            "-r",
            "-J",
            "-joliet-long",
            "-iso-level",
            "3",
            "-V",
            volume_id,
            "-o",
            output,
        ]
        .map(String::from),
    );
    args.extend(layout.mkisofs_args(tree));
    args.push(tree.to_string());
    args
}

/// Path as `&str`, rejecting non-UTF-8 paths instead of mangling them.
///
/// # Errors
///
/// Returns [`InputError::NonUtf8Path`].
pub fn path_str(path: &Path) -> Result<&str, BuildError> {
    path.to_str()
        .ok_or_else(|| InputError::NonUtf8Path(path.to_path_buf()).into())
}

/// A located `xorriso` bound to a runner and a cancellation token.
pub struct Xorriso<'a, R: CommandRunner> {
    runner: &'a R,
    program: &'a str,
    cancel: &'a CancellationToken,
}

impl<'a, R: CommandRunner> Xorriso<'a, R> {
    pub fn new(runner: &'a R, program: &'a str, cancel: &'a CancellationToken) -> Self {
        Self {
            runner,
            program,
            cancel,
        }
    }

    /// Unpack `source` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SubprocessFailure`] on a non-zero exit.
    pub async fn extract(&self, source: &Path, dest: &Path) -> Result<(), BuildError> {
        let args = extract_args(path_str(source)?, path_str(dest)?);
        self.invoke(BuildStage::Extraction, "extract", &args).await
    }

    /// Build `output` from `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SubprocessFailure`] on a non-zero exit.
    pub async fn repack(
        &self,
        tree: &Path,
        output: &Path,
        volume_id: &str,
        layout: &BootLayout,
    ) -> Result<(), BuildError> {
        let args = repack_args(path_str(tree)?, path_str(output)?, volume_id, layout);
        self.invoke(BuildStage::Repack, "repack", &args).await
    }

    async fn invoke(
        &self,
        stage: BuildStage,
        action: &str,
        args: &[String],
    ) -> Result<(), BuildError> {
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        tracing::info!(program = self.program, args = %argv.join(" "), "{action}");

        let output = match self.runner.run(self.program, &argv, self.cancel).await {
            Ok(output) => output,
            Err(_) if self.cancel.is_cancelled() => return Err(BuildError::Cancelled(stage)),
            Err(e) => {
                return Err(BuildError::Spawn {
                    tool: TOOL_NAME.to_string(),
                    message: format!("{e:#}"),
                });
            }
        };

        if output.status.success() {
            return Ok(());
        }
        Err(BuildError::SubprocessFailure {
            tool: TOOL_NAME.to_string(),
            action: action.to_string(),
            code: output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string()),
            output: combined_output(&output),
        })
    }
}
