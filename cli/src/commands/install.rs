//! `winsvc-agent install` — deploy the wrapper and register the service.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::provision::{InstallPorts, InstallRequest, install_service};
use crate::commands::{DescriptorArgs, absolute_root};
use crate::domain::InstallError;
use crate::domain::layout::DeployLayout;
use crate::infra::fs::LocalFs;
use crate::output::{TerminalReporter, json};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Agent root directory (created if missing)
    pub root: PathBuf,

    /// Payload jar copied into the root when none is deployed yet
    #[arg(long, value_name = "PATH")]
    pub jar: Option<PathBuf>,

    #[command(flatten)]
    pub descriptor: DescriptorArgs,
}

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the user declines, a prerequisite is missing, or any
/// installation step fails.
pub async fn run(app: &AppContext, args: InstallArgs) -> Result<ExitCode> {
    let layout = DeployLayout::new(absolute_root(&args.root)?);
    let descriptor = args.descriptor.request(&app.config, &layout);

    let prompt = format!(
        "Install service {} in {}?",
        descriptor.service_id,
        layout.root.display()
    );
    if !app.confirm(&prompt, true)? {
        return Err(InstallError::Cancelled.into());
    }

    let bundle = app.bundle();
    let reporter = TerminalReporter::new(&app.output);
    let ports = InstallPorts {
        prerequisites: &app.prerequisites(),
        fs: &LocalFs,
        bundle: &bundle,
        controller: &app.controller(),
        deferred: &app.shutdown,
        reporter: &reporter,
    };
    let request = InstallRequest {
        root: layout.root.clone(),
        payload_url: args.descriptor.payload_url(),
        descriptor,
        payload_jar: args.jar,
    };

    let outcome = install_service(&ports, request).await?;
    tracing::info!(service_id = %outcome.service_id, "service installed");

    if app.is_json() {
        json::print(&serde_json::json!({
            "service_id": outcome.service_id,
            "root": layout.root,
            "descriptor": outcome.descriptor,
            "payload_copied": outcome.payload_copied,
            "output": outcome.install_output,
        }))?;
    } else {
        app.output.kv("service", &outcome.service_id);
        app.output.kv("descriptor", &outcome.descriptor.display().to_string());
        if outcome.payload_copied {
            app.output.kv("payload", &layout.payload_jar().display().to_string());
        }
        app.output.info("The service starts once this command exits.");
    }
    Ok(ExitCode::SUCCESS)
}
