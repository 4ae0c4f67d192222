//! Deployed directory layout and naming rules.
//!
//! Pure functions only — paths are built, never touched.

use std::path::{Path, PathBuf};

// ── Constants ────────────────────────────────────────────────────────────────

/// Service wrapper executable.
pub const WRAPPER_EXE: &str = "agent-service.exe";
/// .NET runtime configuration read by the wrapper.
pub const WRAPPER_CONFIG: &str = "agent-service.exe.config";
/// Descriptor template name; the wrapper reads the XML sharing its basename.
pub const DESCRIPTOR: &str = "agent-service.xml";
/// Runtime payload the service launches.
pub const PAYLOAD_JAR: &str = "agent.jar";

pub const STAGED_SUFFIX: &str = ".new";
pub const BACKUP_SUFFIX: &str = ".bak";

// ── Naming ───────────────────────────────────────────────────────────────────

/// Builds a service identifier from a prefix and the agent root directory.
///
/// `:`, `\` and `/` in the root are replaced with `_` so the identifier is a
/// valid Windows service name.
#[must_use]
pub fn generate_service_id(prefix: &str, root: &str) -> String {
    let normalized: String = root
        .chars()
        .map(|c| if matches!(c, ':' | '\\' | '/') { '_' } else { c })
        .collect();
    format!("{prefix}-{normalized}")
}

/// `<target>.new`, the staging path for a fresh copy.
#[must_use]
pub fn staged_path(target: &Path) -> PathBuf {
    with_suffix(target, STAGED_SUFFIX)
}

/// `<target>.bak`, where the live executable is parked during a swap.
#[must_use]
pub fn backup_path(target: &Path) -> PathBuf {
    with_suffix(target, BACKUP_SUFFIX)
}

fn with_suffix(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Joins program arguments into a single command-line string, quoting any
/// argument that is empty or contains whitespace or quotes.
#[must_use]
pub fn quote_args<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|a| quote_arg(a.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.chars().any(|c| c.is_whitespace() || c == '"') {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('"', "\\\""))
}

// ── Layout ───────────────────────────────────────────────────────────────────

/// Absolute locations of everything deployed under one agent root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployLayout {
    pub root: PathBuf,
}

impl DeployLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn wrapper_exe(&self) -> PathBuf {
        self.root.join(WRAPPER_EXE)
    }

    #[must_use]
    pub fn wrapper_config(&self) -> PathBuf {
        self.root.join(WRAPPER_CONFIG)
    }

    #[must_use]
    pub fn descriptor(&self) -> PathBuf {
        self.root.join(DESCRIPTOR)
    }

    #[must_use]
    pub fn payload_jar(&self) -> PathBuf {
        self.root.join(PAYLOAD_JAR)
    }

    /// Service identifier for this root.
    #[must_use]
    pub fn service_id(&self, prefix: &str) -> String {
        generate_service_id(prefix, &self.root.to_string_lossy())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
