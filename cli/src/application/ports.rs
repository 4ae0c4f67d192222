//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `winsvc_common` — never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::borrow::Cow;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use winsvc_common::UpdateOutcome;

use crate::domain::{AgentConfig, Platform};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Result of one wrapper invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperRun {
    /// Exit code, or `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Interleaved stdout and stderr, plus any redirected log.
    pub output: String,
}

impl WrapperRun {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code as shown to users.
    #[must_use]
    pub fn code_display(&self) -> String {
        self.code
            .map_or_else(|| "signal".to_string(), |c| c.to_string())
    }
}

/// What happened to one node's executable during one online event.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub node: String,
    pub target: PathBuf,
    pub outcome: UpdateOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub finished_at: DateTime<Utc>,
}

/// A one-shot action run after the current command has finished.
pub type DeferredAction = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()>>>>;

/// Box an async closure as a [`DeferredAction`].
pub fn deferred<F, Fut>(f: F) -> DeferredAction
where
    F: FnOnce() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    Box::new(move || -> Pin<Box<dyn Future<Output = ()>>> { Box::pin(f()) })
}

// ── Node Ports ────────────────────────────────────────────────────────────────

/// Blocking filesystem operations on a node.
///
/// Sync on purpose: reconcile runs on a blocking worker thread, where the
/// calls are treated as ordinary (possibly slow) I/O.
pub trait NodeFs: Send + Sync {
    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> Result<bool>;
    /// Read a whole file.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    /// Create or truncate `path` and write `bytes`.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;
    /// Delete a file.
    fn remove_file(&self, path: &Path) -> Result<()>;
    /// Rename `from` to `to`, replacing nothing.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    /// Create a directory and its parents.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

/// A worker node that has just come online.
pub trait AgentNode: Send + Sync {
    /// Display name, used in logs and reports.
    fn name(&self) -> &str;
    /// OS family, or `None` when the node has no active channel.
    fn platform(&self) -> Option<Platform>;
    /// Agent root directory on the node.
    fn root(&self) -> &Path;
    /// Filesystem access on the node.
    fn fs(&self) -> &dyn NodeFs;
}

// ── Resource Ports ────────────────────────────────────────────────────────────

/// Static resources shipped with this tool, addressed by name.
pub trait ResourceBundle: Send + Sync {
    /// Bytes of the named resource.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::TemplateError::MissingResource`] when the
    /// resource is not bundled, or an I/O error from an override directory.
    fn resource(&self, name: &str) -> Result<Cow<'static, [u8]>>;
}

// ── Process Ports ─────────────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<std::process::Output>;
    /// Run a program in `cwd` and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds the
    /// configured timeout. Spawn errors keep their `std::io::Error` source so
    /// callers can inspect the OS error code.
    async fn run_in(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
    ) -> Result<std::process::Output>;
}

/// Lifecycle subcommands of the service wrapper deployed under a root.
#[allow(async_fn_in_trait)]
pub trait ServiceController {
    /// Run `<root>/<wrapper> <subcommand>` with `root` as working directory.
    ///
    /// # Errors
    ///
    /// Returns an error only when the wrapper could not be run at all; a
    /// non-zero exit is reported through [`WrapperRun::code`].
    async fn run(&self, root: &Path, subcommand: &str) -> Result<WrapperRun>;
}

/// Host prerequisites for running the wrapper.
#[allow(async_fn_in_trait)]
pub trait RuntimePrerequisites {
    /// Name of the first missing prerequisite, if any.
    async fn missing(&self) -> Result<Option<String>>;
}

// ── Lifecycle Ports ───────────────────────────────────────────────────────────

/// Registers actions to run once the current command is done.
pub trait DeferredActions {
    fn defer(&self, label: &str, action: DeferredAction);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Loads and persists [`AgentConfig`].
pub trait ConfigStore {
    /// Current configuration; defaults when nothing is stored yet.
    fn load(&self) -> Result<AgentConfig>;
    /// Persist `config`, replacing what was stored.
    fn save(&self, config: &AgentConfig) -> Result<()>;
    /// Where the configuration lives.
    fn path(&self) -> Result<PathBuf>;
}

// ── Reporting Ports ───────────────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

/// Receives the outcome of every reconcile attempt.
pub trait OutcomeSink: Send + Sync {
    fn report(&self, report: &UpdateReport);
}
