//! Application service — service descriptor generation.

use anyhow::{Context, Result};

use crate::application::ports::ResourceBundle;
use crate::domain::layout::DESCRIPTOR;
use crate::domain::macros::PayloadDownloadProvider;
use crate::domain::template::{self, DescriptorRequest, MacroProvider};

/// Render the bundled descriptor template.
///
/// `payload_url` feeds the payload download directive; an `Err` is a failed
/// URL lookup and yields the disabled directive.
///
/// # Errors
///
/// Returns an error if the template is missing or not UTF-8, or if any
/// required macro stays unresolved.
pub fn render_descriptor(
    bundle: &dyn ResourceBundle,
    request: &DescriptorRequest,
    payload_url: Result<Option<String>, String>,
) -> Result<String> {
    let download = PayloadDownloadProvider::new(payload_url);
    if let Some(reason) = download.lookup_error() {
        tracing::warn!(reason, "payload URL unavailable; download directive disabled");
    }
    let providers: [&dyn MacroProvider; 1] = [&download];

    let bytes = bundle.resource(DESCRIPTOR)?;
    let text = std::str::from_utf8(&bytes)
        .with_context(|| format!("{DESCRIPTOR} is not valid UTF-8"))?;
    Ok(template::render(text, request, &providers)?)
}
