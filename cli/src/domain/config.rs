//! Domain types and validators for agent configuration.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use winsvc_common::IdentityStrategy;

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "update.disabled",
    "update.identity",
    "service.id_prefix",
    "service.vm_args",
    "service.command_timeout_secs",
    "bundle.dir",
];
pub const VALID_BOOLEANS: &[&str] = &["true", "false"];
pub const VALID_IDENTITY_STRATEGIES: &[&str] = &["checksum", "version"];

/// Environment switch that disables the executable updater on this host.
pub const DISABLE_UPDATE_ENV: &str = "WINSVC_AGENT_DISABLE_AUTO_UPDATE";

pub const DEFAULT_ID_PREFIX: &str = "agentsvc";
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.winsvc-agent/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    pub update: UpdateConfig,
    pub service: ServiceConfig,
    pub bundle: BundleConfig,
}

/// Executable updater settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UpdateConfig {
    /// Kill switch; the environment variable has the same effect.
    pub disabled: bool,
    /// How deployed and bundled executables are compared.
    pub identity: IdentityStrategy,
}

/// Service registration settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Prefix of generated service identifiers.
    pub id_prefix: String,
    /// JVM options substituted into the descriptor.
    pub vm_args: String,
    /// Upper bound on a single wrapper invocation.
    pub command_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            vm_args: String::new(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }
}

/// Where bundled resources are read from.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BundleConfig {
    /// Directory whose files shadow the embedded bundle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Whether updates are disabled, given the value of [`DISABLE_UPDATE_ENV`].
    ///
    /// Any non-empty value other than `false`/`0` counts as set.
    #[must_use]
    pub fn update_disabled(&self, env_value: Option<&str>) -> bool {
        self.update.disabled
            || env_value.is_some_and(|v| {
                let v = v.trim();
                !v.is_empty() && !v.eq_ignore_ascii_case("false") && v != "0"
            })
    }

    /// Applies an already validated `key = value` pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "update.disabled" => self.update.disabled = value == "true",
            "update.identity" => {
                self.update.identity = if value == "checksum" {
                    IdentityStrategy::Checksum
                } else {
                    IdentityStrategy::Version
                };
            }
            "service.id_prefix" => self.service.id_prefix = value.to_string(),
            "service.vm_args" => self.service.vm_args = value.to_string(),
            "service.command_timeout_secs" => {
                self.service.command_timeout_secs = value.parse()?;
            }
            "bundle.dir" => {
                self.bundle.dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => {}
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |valid: String| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid,
    };
    match key {
        "update.disabled" if !VALID_BOOLEANS.contains(&value) => {
            Err(invalid(VALID_BOOLEANS.join(", ")).into())
        }
        "update.identity" if !VALID_IDENTITY_STRATEGIES.contains(&value) => {
            Err(invalid(VALID_IDENTITY_STRATEGIES.join(", ")).into())
        }
        "service.id_prefix" if !is_valid_prefix(value) => {
            Err(invalid("letters, digits, '-' and '_'".to_string()).into())
        }
        "service.command_timeout_secs" if !value.parse::<u64>().is_ok_and(|n| n > 0) => {
            Err(invalid("a positive number of seconds".to_string()).into())
        }
        _ => Ok(()),
    }
}

fn is_valid_prefix(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ── Unit tests ───────────────────────────────────────────────────────────────
