//! Application context — unified state passed to every command handler.
//!
//! Constructed once in `Cli::run()` and handed to each command as
//! `&AppContext`, so cross-cutting concerns are added here rather than to
//! every command signature.

use std::time::Duration;

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{AgentConfig, DISABLE_UPDATE_ENV};
use crate::infra::assets::AssetBundle;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::prerequisites::DotNetProbe;
use crate::infra::service_controller::WrapperController;
use crate::infra::shutdown::ShutdownSequence;
use crate::output::OutputContext;

/// Environment variable that skips confirmation prompts.
pub const ASSUME_YES_ENV: &str = "WINSVC_AGENT_YES";

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `WINSVC_AGENT_YES`).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode, JSON).
    pub output: OutputContext,
    /// Where configuration is read from and written to.
    pub config_store: YamlConfigStore,
    /// Configuration loaded at startup.
    pub config: AgentConfig,
    /// Process runner shared by all infrastructure adapters.
    pub runner: TokioCommandRunner,
    /// Actions to run after the command returns.
    pub shutdown: ShutdownSequence,
    /// When `true`, skip interactive prompts and use defaults.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let env_yes = std::env::var("CI").is_ok() || std::env::var(ASSUME_YES_ENV).is_ok();
        let config_store = YamlConfigStore;
        let config = config_store.load()?;
        let runner =
            TokioCommandRunner::new(Duration::from_secs(config.service.command_timeout_secs));

        Ok(Self {
            output: OutputContext::new(
                flags.output.no_color,
                flags.output.quiet,
                flags.output.json,
            ),
            config_store,
            config,
            runner,
            shutdown: ShutdownSequence::new(),
            non_interactive: flags.behaviour.yes || env_yes,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.output.json
    }

    /// Bundled resources, honouring `bundle.dir`.
    #[must_use]
    pub fn bundle(&self) -> AssetBundle {
        AssetBundle::new(self.config.bundle.dir.clone())
    }

    #[must_use]
    pub fn controller(&self) -> WrapperController<TokioCommandRunner> {
        WrapperController::new(self.runner)
    }

    #[must_use]
    pub fn prerequisites(&self) -> DotNetProbe<TokioCommandRunner> {
        DotNetProbe::new(self.runner)
    }

    /// Whether automatic updates are switched off by config or environment.
    #[must_use]
    pub fn update_disabled(&self) -> bool {
        let env = std::env::var(DISABLE_UPDATE_ENV).ok();
        self.config.update_disabled(env.as_deref())
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or
    /// `WINSVC_AGENT_YES`), returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
