//! `winsvc-agent config` — show and set configuration values.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::domain::AgentConfig;
use crate::domain::config::{DISABLE_UPDATE_ENV, validate_config_key, validate_config_value};
use crate::output::json;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be
/// read or written.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Set { key, value } => set_config(app, &key, &value),
    }
}

fn show_config(app: &AppContext) -> Result<ExitCode> {
    let config = app.config_store.load()?;
    let path = app.config_store.path()?;

    if app.is_json() {
        json::print(&serde_json::json!({
            "path": path,
            "config": config,
            "update_disabled": app.update_disabled(),
        }))?;
        return Ok(ExitCode::SUCCESS);
    }

    app.output.header(&format!("Configuration ({})", path.display()));
    for (key, value) in entries(&config) {
        app.output.kv(key, &value);
    }
    if !config.update.disabled && app.update_disabled() {
        app.output
            .warn(&format!("automatic update disabled by {DISABLE_UPDATE_ENV}"));
    }
    Ok(ExitCode::SUCCESS)
}

fn set_config(app: &AppContext, key: &str, value: &str) -> Result<ExitCode> {
    validate_config_key(key)?;
    validate_config_value(key, value)?;

    let mut config = app.config_store.load()?;
    config.apply(key, value)?;
    app.config_store.save(&config)?;
    tracing::debug!(key, value, "configuration updated");

    app.output.success(&format!("Set {key} = {value}"));
    Ok(ExitCode::SUCCESS)
}

/// Every key with its current value, in whitelist order.
fn entries(config: &AgentConfig) -> Vec<(&'static str, String)> {
    vec![
        ("update.disabled", config.update.disabled.to_string()),
        ("update.identity", config.update.identity.to_string()),
        ("service.id_prefix", config.service.id_prefix.clone()),
        ("service.vm_args", config.service.vm_args.clone()),
        (
            "service.command_timeout_secs",
            config.service.command_timeout_secs.to_string(),
        ),
        (
            "bundle.dir",
            config
                .bundle
                .dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        ),
    ]
}
