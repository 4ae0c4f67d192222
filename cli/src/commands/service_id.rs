//! `winsvc-agent service-id` — print the service identifier for a root.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::absolute_root;
use crate::domain::config::validate_config_value;
use crate::domain::generate_service_id;

/// Arguments for the service-id command.
#[derive(Args)]
pub struct ServiceIdArgs {
    /// Agent root directory
    pub root: PathBuf,

    /// Identifier prefix (default: `service.id_prefix` from config)
    #[arg(long)]
    pub prefix: Option<String>,
}

/// Run the service-id command.
///
/// # Errors
///
/// Returns an error if the prefix is invalid or the root cannot be resolved.
pub fn run(app: &AppContext, args: &ServiceIdArgs) -> Result<ExitCode> {
    let prefix = args
        .prefix
        .as_deref()
        .unwrap_or(&app.config.service.id_prefix);
    validate_config_value("service.id_prefix", prefix)?;
    let root = absolute_root(&args.root)?;
    let id = generate_service_id(prefix, &root.to_string_lossy());

    if app.is_json() {
        println!("{}", serde_json::json!({ "service_id": id }));
    } else {
        println!("{id}");
    }
    Ok(ExitCode::SUCCESS)
}
