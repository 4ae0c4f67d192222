//! `winsvc-agent render` — print the service descriptor for an agent root.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::services::descriptor::render_descriptor;
use crate::commands::{DescriptorArgs, absolute_root};
use crate::domain::layout::DeployLayout;
use crate::output::json;

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Agent root the descriptor is generated for
    #[arg(long, value_name = "DIR")]
    pub root: PathBuf,

    /// Extra macro, repeatable; wins over built-in values
    #[arg(long = "macro", value_name = "NAME=VALUE", value_parser = parse_macro)]
    pub macros: Vec<(String, String)>,

    /// Write the descriptor here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub descriptor: DescriptorArgs,
}

/// Run the render command.
///
/// # Errors
///
/// Returns an error if the template is missing, a macro stays unresolved, or
/// the output file cannot be written.
pub fn run(app: &AppContext, args: RenderArgs) -> Result<ExitCode> {
    let layout = DeployLayout::new(absolute_root(&args.root)?);
    let mut request = args.descriptor.request(&app.config, &layout);
    request.explicit.extend(args.macros);

    let xml = render_descriptor(&app.bundle(), &request, args.descriptor.payload_url())?;

    if let Some(path) = &args.output {
        std::fs::write(path, xml.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        if app.is_json() {
            json::print(&serde_json::json!({
                "service_id": request.service_id,
                "path": path,
            }))?;
        } else {
            app.output.success(&format!("Wrote {}", path.display()));
        }
    } else if app.is_json() {
        json::print(&serde_json::json!({
            "service_id": request.service_id,
            "descriptor": xml,
        }))?;
    } else {
        print!("{xml}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Parses `NAME=VALUE`; names are upper-case letters, digits and `_`.
fn parse_macro(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(format!(
            "invalid macro name '{name}': use upper-case letters, digits and '_'"
        ));
    }
    Ok((name.to_string(), value.to_string()))
}
