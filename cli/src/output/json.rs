//! JSON output helpers.
//!
//! Provides the error-object formatter used by all `--json` code paths when
//! a command fails, and the pretty printer used for successful results.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{ConfigError, InstallError, TemplateError};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Pretty-print any serializable value to stdout.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

/// Stable machine-readable code for an error chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = find::<TemplateError>(err) {
        return match e {
            TemplateError::MissingResource { .. } => "MISSING_RESOURCE",
            TemplateError::UnresolvedMacros { .. } => "UNRESOLVED_MACROS",
        };
    }
    if let Some(e) = find::<InstallError>(err) {
        return match e {
            InstallError::PrerequisiteMissing { .. } => "PREREQUISITE_MISSING",
            InstallError::RootCreation { .. } => "ROOT_CREATION_FAILED",
            InstallError::ServiceInstall { .. } => "SERVICE_INSTALL_FAILED",
            InstallError::Cancelled => "CANCELLED",
        };
    }
    if find::<ConfigError>(err).is_some() {
        return "INVALID_CONFIG";
    }
    "COMMAND_FAILED"
}

fn find<T: std::error::Error + Send + Sync + 'static>(err: &anyhow::Error) -> Option<&T> {
    err.downcast_ref::<T>()
        .or_else(|| err.chain().find_map(|cause| cause.downcast_ref::<T>()))
}
