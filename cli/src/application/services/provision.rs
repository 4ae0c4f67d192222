//! Application service — first-time installation of the agent service.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{
    DeferredActions, NodeFs, ProgressReporter, ResourceBundle, RuntimePrerequisites,
    ServiceController, deferred,
};
use crate::application::services::descriptor::render_descriptor;
use crate::domain::error::InstallError;
use crate::domain::layout::{DeployLayout, WRAPPER_CONFIG, WRAPPER_EXE};
use crate::domain::template::DescriptorRequest;

/// Ports used by [`install_service`].
pub struct InstallPorts<'a, P, C, D, R> {
    pub prerequisites: &'a P,
    pub fs: &'a dyn NodeFs,
    pub bundle: &'a dyn ResourceBundle,
    pub controller: &'a C,
    pub deferred: &'a D,
    pub reporter: &'a R,
}

/// What to install and where.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub root: PathBuf,
    pub descriptor: DescriptorRequest,
    /// Payload jar to copy when the root has none yet.
    pub payload_jar: Option<PathBuf>,
    /// Download URL lookup for the payload; `Err` holds why it failed.
    pub payload_url: Result<Option<String>, String>,
}

/// Result of a successful installation.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub service_id: String,
    pub descriptor: PathBuf,
    pub payload_copied: bool,
    /// Output captured from the wrapper's `install` subcommand.
    pub install_output: String,
}

/// Install the service wrapper under `request.root` and register it as a
/// Windows service. The service itself is started after the current command
/// finishes, through `ports.deferred`.
///
/// # Errors
///
/// Returns an [`InstallError`] for a missing prerequisite, an uncreatable
/// root or a failed `install`; template and I/O errors otherwise. Nothing is
/// written until the prerequisite check passes, the descriptor renders and
/// every bundled resource loads.
pub async fn install_service<P, C, D, R>(
    ports: &InstallPorts<'_, P, C, D, R>,
    request: InstallRequest,
) -> Result<InstallOutcome>
where
    P: RuntimePrerequisites,
    C: ServiceController + Clone + 'static,
    D: DeferredActions,
    R: ProgressReporter,
{
    let reporter = ports.reporter;
    let fs = ports.fs;
    let layout = DeployLayout::new(&request.root);

    reporter.step("checking prerequisites...");
    if let Some(requirement) = ports.prerequisites.missing().await? {
        return Err(InstallError::PrerequisiteMissing { requirement }.into());
    }

    // Everything that can fail on bad configuration runs before the first write.
    let xml = render_descriptor(ports.bundle, &request.descriptor, request.payload_url)?;
    let wrapper_files = [
        (layout.wrapper_exe(), ports.bundle.resource(WRAPPER_EXE)?),
        (layout.wrapper_config(), ports.bundle.resource(WRAPPER_CONFIG)?),
    ];

    reporter.step(&format!("preparing {}...", layout.root.display()));
    fs.create_dir_all(&layout.root).map_err(|e| {
        e.context(InstallError::RootCreation {
            path: layout.root.clone(),
        })
    })?;

    for (dest, bytes) in &wrapper_files {
        fs.write(dest, bytes)
            .with_context(|| format!("failed to write {}", dest.display()))?;
    }

    let descriptor = layout.descriptor();
    fs.write(&descriptor, xml.as_bytes())
        .with_context(|| format!("failed to write {}", descriptor.display()))?;

    let payload_copied = copy_payload(fs, &layout, request.payload_jar.as_deref(), reporter)?;

    reporter.step("registering service...");
    let run = ports.controller.run(&layout.root, "install").await?;
    if !run.success() {
        return Err(InstallError::ServiceInstall {
            code: run.code_display(),
            output: run.output,
        }
        .into());
    }
    reporter.success(&format!(
        "service {} installed",
        request.descriptor.service_id
    ));

    let controller = ports.controller.clone();
    let root = layout.root.clone();
    ports.deferred.defer(
        "start service",
        deferred(move || async move {
            match controller.run(&root, "start").await {
                Ok(run) if run.success() => tracing::info!("service started"),
                Ok(run) => tracing::warn!(
                    code = %run.code_display(),
                    output = %run.output,
                    "service start failed"
                ),
                Err(e) => tracing::warn!(error = ?e, "service start failed"),
            }
        }),
    );

    Ok(InstallOutcome {
        service_id: request.descriptor.service_id,
        descriptor,
        payload_copied,
        install_output: run.output,
    })
}

/// Copy the payload jar unless one is already deployed.
fn copy_payload(
    fs: &dyn NodeFs,
    layout: &DeployLayout,
    source: Option<&Path>,
    reporter: &impl ProgressReporter,
) -> Result<bool> {
    let dest = layout.payload_jar();
    if fs.exists(&dest)? {
        tracing::debug!(path = %dest.display(), "payload already present");
        return Ok(false);
    }
    let Some(source) = source else {
        reporter.warn(&format!(
            "no payload jar supplied; {} must be provided before the service starts",
            dest.display()
        ));
        return Ok(false);
    };
    let bytes = fs
        .read(source)
        .with_context(|| format!("failed to read {}", source.display()))?;
    fs.write(&dest, &bytes)
        .with_context(|| format!("failed to write {}", dest.display()))?;
    Ok(true)
}
