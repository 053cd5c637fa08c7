//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution with guaranteed kill on cancellation and
//! timeout, on all platforms.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tokio_util::sync::CancellationToken;

use crate::application::ports::CommandRunner;

/// Default timeout for short probes such as `xorriso -version`.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Production `CommandRunner`.
///
/// On Windows, dropping a `.output()` future does NOT kill the child
/// process. Both entry points therefore use `tokio::select!` with an
/// explicit `child.kill()` so the process is always terminated.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn spawn(program: &str, args: &[&str]) -> Result<Child> {
    tracing::debug!(program, ?args, "spawning");
    tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))
}

/// Wait for the child while draining both pipes concurrently, so a chatty
/// child never blocks on a full pipe.
async fn collect(child: &mut Child, program: &str) -> Result<Output> {
    let mut stdout_handle = child.stdout.take();
    let mut stderr_handle = child.stderr.take();

    let (status, stdout, stderr) = tokio::join!(
        child.wait(),
        async {
            let mut buf = Vec::new();
            if let Some(ref mut h) = stdout_handle {
                let _ = h.read_to_end(&mut buf).await;
            }
            buf
        },
        async {
            let mut buf = Vec::new();
            if let Some(ref mut h) = stderr_handle {
                let _ = h.read_to_end(&mut buf).await;
            }
            buf
        },
    );
    let status = status.with_context(|| format!("waiting for {program}"))?;
    tracing::debug!(program, ?status, "exited");
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cancel: &CancellationToken,
    ) -> Result<Output> {
        let mut child = spawn(program, args)?;

        tokio::select! {
            result = collect(&mut child, program) => result,
            () = cancel.cancelled() => {
                let _ = child.kill().await;
                anyhow::bail!("{program} cancelled")
            }
        }
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        let mut child = spawn(program, args)?;

        tokio::select! {
            result = collect(&mut child, program) => result,
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }
}

/// Stdout followed by stderr, lossily decoded, for diagnostics.
#[must_use]
pub fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !text.is_empty() && !stderr.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&stderr);
    text.trim_end().to_string()
}
