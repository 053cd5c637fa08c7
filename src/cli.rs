//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "AUTOISO_LOG";

/// Turn a stock Ubuntu server image into an unattended-install image
#[derive(Parser)]
#[command(
    name = "autoiso",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also `NO_COLOR`, unless set to 0/false/off)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Increase diagnostic logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build an autoinstall image from a source image
    Build(commands::build::BuildArgs),

    /// Print or write the generated user-data and meta-data
    Render(commands::render::RenderArgs),

    /// Check that the image tooling is installed and usable
    Doctor,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Install the stderr `tracing` subscriber.
    ///
    /// `AUTOISO_LOG` wins over `-v`; without either only warnings are shown.
    pub fn init_tracing(&self) {
        let default = match self.verbose {
            0 => "warn",
            1 => "autoiso=debug",
            _ => "autoiso=trace",
        };
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
        // A second init (tests driving `run` twice) is harmless.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            command,
            ..
        } = self;
        let app = AppContext::new(&AppFlags {
            json,
            quiet,
            no_color,
            yes,
        });

        match command {
            Command::Build(args) => commands::build::run(&app, args).await,
            Command::Render(args) => commands::render::run(&app, &args),
            Command::Doctor => commands::doctor::run(&app).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
        }
    }
}
