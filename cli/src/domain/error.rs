//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── Template errors ───────────────────────────────────────────────────────────

/// Errors raised while rendering the service descriptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Bundled resource '{name}' not found. The installation package is incomplete.")]
    MissingResource { name: String },

    #[error("Unresolved macros in the XML file: {}", names.join(","))]
    UnresolvedMacros {
        /// Sorted, de-duplicated macro names still present in the output.
        names: Vec<String>,
    },
}

// ── Install errors ────────────────────────────────────────────────────────────

/// Errors that abort provisioning before the service is registered.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("{requirement} is required to run the agent as a Windows service. Install it and retry.")]
    PrerequisiteMissing { requirement: String },

    #[error("Failed to create the agent root directory {}. Check permissions or choose another directory.", path.display())]
    RootCreation { path: PathBuf },

    #[error("Service installation failed (exit code {code}):\n{output}")]
    ServiceInstall { code: String, output: String },

    #[error("Installation cancelled.")]
    Cancelled,
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
