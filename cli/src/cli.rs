//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Install and keep current the service wrapper of Windows build agents
#[derive(Parser)]
#[command(
    name = "winsvc-agent",
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

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Answer yes to every prompt
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy the service wrapper into an agent root and register the service
    Install(commands::install::InstallArgs),

    /// Bring the deployed wrapper executable up to date with the bundled one
    Update(commands::update::UpdateArgs),

    /// Print the service descriptor for an agent root
    Render(commands::render::RenderArgs),

    /// Print the service identifier derived from an agent root
    ServiceId(commands::service_id::ServiceIdArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Default log filter for the requested verbosity.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Execute the CLI command inside `app`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self, app: &AppContext) -> Result<ExitCode> {
        match self.command {
            Command::Install(args) => commands::install::run(app, args).await,
            Command::Update(args) => commands::update::run(app, args).await,
            Command::Render(args) => commands::render::run(app, args),
            Command::ServiceId(args) => commands::service_id::run(app, &args),
            Command::Config(cmd) => commands::config::run(app, cmd),
            Command::Version => commands::version::run(app),
        }
    }

    /// Flags that shape the [`AppContext`].
    #[must_use]
    pub fn app_flags(&self) -> AppFlags {
        AppFlags {
            output: OutputFlags {
                no_color: self.no_color,
                quiet: self.quiet,
                json: self.json,
            },
            behaviour: BehaviourFlags { yes: self.yes },
        }
    }
}
