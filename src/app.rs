//! Per-invocation state shared by every command: how to print, where the
//! config lives, and whether prompts may block.

use anyhow::Result;

use crate::domain::config::AutoisoConfig;
use crate::image::ToolDetector;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Environment variable that answers every prompt with its default.
pub const YES_ENV: &str = "AUTOISO_YES";

/// Global flags, as parsed by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppFlags {
    pub json: bool,
    pub quiet: bool,
    pub no_color: bool,
    pub yes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct AppContext {
    pub output: OutputContext,
    pub mode: OutputMode,
    pub config_store: YamlConfigStore,
    /// Prompts return their default without asking. Set by `--yes`, `CI`
    /// or `AUTOISO_YES`.
    pub non_interactive: bool,
}

impl AppContext {
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let from_env = std::env::var_os("CI").is_some() || std::env::var_os(YES_ENV).is_some();
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // JSON owns stdout; step and success lines would corrupt it.
        let quiet = flags.quiet || flags.json;

        Self {
            output: OutputContext::new(flags.no_color, quiet),
            mode,
            config_store: YamlConfigStore,
            non_interactive: flags.yes || from_env,
        }
    }

    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Detector for the mastering tool: pinned to `tool.path` when that is
    /// configured, a `PATH` lookup otherwise.
    #[must_use]
    pub fn tool_detector(&self, config: &AutoisoConfig) -> ToolDetector<TokioCommandRunner> {
        let runner = TokioCommandRunner::new();
        match &config.tool.path {
            Some(path) => ToolDetector::at(runner, path),
            None => ToolDetector::new(runner),
        }
    }

    /// Yes/no prompt. Returns `default` without prompting when
    /// non-interactive.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        Ok(dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }
}
