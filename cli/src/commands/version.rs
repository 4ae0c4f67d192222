//! `winsvc-agent version` — tool version and the resources built into it.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::domain::layout::WRAPPER_EXE;
use crate::infra::assets::embedded_names;
use crate::output::json;

/// Run the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let version = env!("CARGO_PKG_VERSION");
    let mut bundled: Vec<&str> = embedded_names().collect();
    bundled.sort_unstable();

    if app.is_json() {
        json::print(&serde_json::json!({
            "version": version,
            "bundled": bundled,
        }))?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("winsvc-agent {version}");
    if !app.output.quiet {
        app.output.kv("bundled", &bundled.join(", "));
        if !bundled.contains(&WRAPPER_EXE) {
            app.output
                .info(&format!("{WRAPPER_EXE} is not embedded; set bundle.dir to supply it"));
        }
    }
    Ok(ExitCode::SUCCESS)
}
