//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::domain::config::AutoisoConfig;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so the mastering tool can be faked in tests.
///
/// The contract is `(program, args) -> (exit status, stdout, stderr)`; callers
/// never depend on anything but the argument list and the captured output.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program to completion and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned, or if `cancel`
    /// fires first. On cancellation the child must be killed, not orphaned.
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cancel: &CancellationToken,
    ) -> Result<Output>;

    /// Run a short-lived program with a timeout (version probes and the like).
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

impl<T: CommandRunner> CommandRunner for &T {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cancel: &CancellationToken,
    ) -> Result<Output> {
        (**self).run(program, args, cancel).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        (**self).run_with_timeout(program, args, timeout).await
    }
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

/// Reporter that discards everything.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts loading and saving the persistent configuration.
pub trait ConfigStore {
    /// Load the configuration, returning defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<AutoisoConfig>;
    /// Persist the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &AutoisoConfig) -> Result<()>;
    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}
