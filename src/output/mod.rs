//! Output formatting module

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;

pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::domain::config::AutoisoConfig;
use crate::domain::health::DoctorChecks;
use crate::image::BuildOutcome;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.key));
        }
    }
}

/// Selects human or JSON rendering for command results.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// Render the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_version(version);
                Ok(())
            }
            Self::Json(r) => r.render_version(version),
        }
    }

    /// Render a finished build.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_build(&self, outcome: &BuildOutcome, checksum: Option<&str>) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_build(outcome, checksum);
                Ok(())
            }
            Self::Json(r) => r.render_build(outcome, checksum),
        }
    }

    /// Render doctor results.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_doctor(&self, checks: &DoctorChecks, issues: &[String]) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_doctor(checks, issues);
                Ok(())
            }
            Self::Json(r) => r.render_doctor(checks, issues),
        }
    }

    /// Render generated documents, or where they were written.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_documents(
        &self,
        user_data: &str,
        meta_data: &str,
        written_to: Option<&Path>,
    ) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_documents(user_data, written_to);
                Ok(())
            }
            Self::Json(r) => r.render_documents(user_data, meta_data, written_to),
        }
    }

    /// Render the effective configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &AutoisoConfig, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_config(config, path);
                Ok(())
            }
            Self::Json(r) => r.render_config(config, path),
        }
    }
}
