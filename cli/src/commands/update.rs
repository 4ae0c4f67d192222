//! `winsvc-agent update` — run the node-online update path against an agent
//! root on this machine.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use winsvc_common::IdentityStrategy;

use crate::app::AppContext;
use crate::application::ports::{AgentNode, OutcomeSink};
use crate::application::services::dispatch::UpdateDispatcher;
use crate::application::services::exe_update::ExeUpdater;
use crate::commands::absolute_root;
use crate::domain::Platform;
use crate::infra::fs::{LocalNode, local_node_name};
use crate::output::ConsoleSink;

/// Arguments for the update command.
#[derive(Args)]
pub struct UpdateArgs {
    /// Agent root directory holding the deployed wrapper
    pub root: PathBuf,

    /// Node name used in reports (default: this host's name)
    #[arg(long)]
    pub node: Option<String>,

    /// How deployed and bundled executables are compared
    #[arg(long, value_enum)]
    pub identity: Option<IdentityStrategy>,

    #[arg(long, hide = true)]
    pub assume_windows: bool,
}

/// Run the update command.
///
/// Exits non-zero when the outcome needs operator attention.
///
/// # Errors
///
/// Returns an error if the root cannot be resolved or the update task is
/// lost. Swap failures are reported as outcomes, not errors.
pub async fn run(app: &AppContext, args: UpdateArgs) -> Result<ExitCode> {
    let root = absolute_root(&args.root)?;
    let mut node = LocalNode::new(args.node.unwrap_or_else(local_node_name), root);
    if args.assume_windows {
        node = node.with_platform(Platform::Windows);
    }
    let node: Arc<dyn AgentNode> = Arc::new(node);

    let strategy = args.identity.unwrap_or(app.config.update.identity);
    let updater = Arc::new(ExeUpdater::new(strategy, Arc::new(app.bundle())));
    let sink = Arc::new(ConsoleSink::new(&app.output));
    let dispatcher = UpdateDispatcher::new(
        updater,
        Arc::clone(&sink) as Arc<dyn OutcomeSink>,
        app.update_disabled(),
    );

    if let Some(handle) = dispatcher.on_online(node) {
        handle.await.context("update task did not complete")?;
    }

    if sink.outcomes().iter().any(|o| o.needs_attention()) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
