//! Application service — hot-swap of the deployed service wrapper.
//!
//! Imports only from `crate::domain`, `crate::application::ports` and
//! `winsvc_common`. All I/O is routed through the node's [`NodeFs`].
//!
//! A running executable can be renamed but not overwritten, so the swap
//! stages the bundled copy beside the target, parks the live file as
//! `<target>.bak` and renames the staged copy into place. The running
//! process keeps its handle on the parked file; the next service start picks
//! up the new one.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use winsvc_common::{ExecutableIdentity, IdentityStrategy, UpdateOutcome, decide};

use crate::application::ports::{AgentNode, NodeFs, ResourceBundle};
use crate::domain::layout::{WRAPPER_EXE, backup_path, staged_path};

// ── Public types ──────────────────────────────────────────────────────────────

/// Outcome of one reconcile call plus a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub outcome: UpdateOutcome,
    pub detail: Option<String>,
}

impl Reconciliation {
    fn new(outcome: UpdateOutcome, detail: impl Into<String>) -> Self {
        Self {
            outcome,
            detail: Some(detail.into()),
        }
    }

    const fn bare(outcome: UpdateOutcome) -> Self {
        Self {
            outcome,
            detail: None,
        }
    }
}

/// Where a reconcile attempt got to; recorded on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    CheckTarget,
    ReadIdentity,
    BundledIdentity,
    Compare,
    Stage,
    ClearBackup,
    ParkLive,
    Promote,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CheckTarget => "check_target",
            Self::ReadIdentity => "read_identity",
            Self::BundledIdentity => "bundled_identity",
            Self::Compare => "compare",
            Self::Stage => "stage",
            Self::ClearBackup => "clear_backup",
            Self::ParkLive => "park_live",
            Self::Promote => "promote",
        })
    }
}

// ── Service ───────────────────────────────────────────────────────────────────

/// Keeps the service wrapper on a node in step with the bundled copy.
pub struct ExeUpdater {
    strategy: IdentityStrategy,
    bundle: Arc<dyn ResourceBundle>,
    bundled_identity: OnceLock<ExecutableIdentity>,
}

impl ExeUpdater {
    #[must_use]
    pub fn new(strategy: IdentityStrategy, bundle: Arc<dyn ResourceBundle>) -> Self {
        Self {
            strategy,
            bundle,
            bundled_identity: OnceLock::new(),
        }
    }

    #[must_use]
    pub const fn strategy(&self) -> IdentityStrategy {
        self.strategy
    }

    /// Identity of the bundled wrapper, computed once per updater.
    ///
    /// A failed computation is not cached, so the next call tries again.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled wrapper is missing or unidentifiable.
    pub fn bundled_identity(&self) -> Result<ExecutableIdentity> {
        if let Some(identity) = self.bundled_identity.get() {
            return Ok(identity.clone());
        }
        let bytes = self.bundle.resource(WRAPPER_EXE)?;
        let identity = self
            .strategy
            .identify(&bytes)
            .context("cannot identify the bundled service wrapper")?;
        // A concurrent caller may have won the race; both values are equal.
        let _ = self.bundled_identity.set(identity.clone());
        Ok(identity)
    }

    /// Bring the node's wrapper up to date. Never fails: every error becomes
    /// [`UpdateOutcome::Failure`].
    pub fn reconcile(&self, node: &dyn AgentNode) -> Reconciliation {
        let Some(platform) = node.platform() else {
            return Reconciliation::new(UpdateOutcome::Skipped, "node has no active channel");
        };
        if !platform.hosts_wrapper() {
            return Reconciliation::new(
                UpdateOutcome::Skipped,
                format!("{platform} nodes do not run the service wrapper"),
            );
        }

        let target = node.root().join(WRAPPER_EXE);
        let mut step = Step::CheckTarget;
        match self.try_reconcile(node.fs(), &target, &mut step) {
            Ok(result) => {
                tracing::info!(
                    node = node.name(),
                    target = %target.display(),
                    outcome = %result.outcome,
                    "reconcile finished"
                );
                result
            }
            Err(e) => {
                tracing::error!(
                    node = node.name(),
                    target = %target.display(),
                    step = %step,
                    error = ?e,
                    "reconcile failed"
                );
                Reconciliation::new(UpdateOutcome::Failure, format!("{step}: {e:#}"))
            }
        }
    }

    fn try_reconcile(
        &self,
        fs: &dyn NodeFs,
        target: &Path,
        step: &mut Step,
    ) -> Result<Reconciliation> {
        if !fs.exists(target)? {
            return Ok(Reconciliation::bare(UpdateOutcome::NoTarget));
        }

        *step = Step::ReadIdentity;
        let deployed = match fs
            .read(target)
            .and_then(|bytes| Ok(self.strategy.identify(&bytes)?))
        {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(
                    target = %target.display(),
                    error = ?e,
                    "deployed wrapper unreadable"
                );
                return Ok(Reconciliation::new(
                    UpdateOutcome::Malformed,
                    format!("{e:#}"),
                ));
            }
        };

        *step = Step::BundledIdentity;
        let bundled = self.bundled_identity()?;

        *step = Step::Compare;
        let decision = decide(&deployed, &bundled)?;
        tracing::debug!(
            target = %target.display(),
            deployed = %deployed,
            bundled = %bundled,
            reason = ?decision.reason,
            "compared wrapper identities"
        );
        if let Some(outcome) = decision.reason.terminal_outcome() {
            return Ok(Reconciliation::new(
                outcome,
                format!("deployed {deployed}, bundled {bundled}"),
            ));
        }

        let bytes = self.bundle.resource(WRAPPER_EXE)?;
        Self::swap(fs, target, &bytes, step).map(|outcome| match outcome {
            UpdateOutcome::Success => Reconciliation::new(
                outcome,
                format!("{deployed} -> {bundled}; effective on next service start"),
            ),
            other => Reconciliation::bare(other),
        })
    }

    fn swap(
        fs: &dyn NodeFs,
        target: &Path,
        bytes: &[u8],
        step: &mut Step,
    ) -> Result<UpdateOutcome> {
        let staged = staged_path(target);
        let backup = backup_path(target);

        *step = Step::Stage;
        fs.write(&staged, bytes)
            .with_context(|| format!("writing {}", staged.display()))?;

        *step = Step::ClearBackup;
        if fs.exists(&backup)? {
            if let Err(e) = fs.remove_file(&backup) {
                tracing::warn!(
                    backup = %backup.display(),
                    staged = %staged.display(),
                    error = ?e,
                    "stale backup is in use; leaving staged copy for inspection"
                );
                return Ok(UpdateOutcome::Aborted);
            }
        }

        *step = Step::ParkLive;
        fs.rename(target, &backup)
            .with_context(|| format!("renaming {} to {}", target.display(), backup.display()))?;

        *step = Step::Promote;
        if let Err(e) = fs.rename(&staged, target) {
            if let Err(restore) = fs.rename(&backup, target) {
                tracing::error!(
                    target = %target.display(),
                    error = ?restore,
                    "could not restore the parked wrapper"
                );
            }
            return Err(e.context(format!("renaming {} to {}", staged.display(), target.display())));
        }

        tracing::info!(target = %target.display(), "service wrapper replaced");
        Ok(UpdateOutcome::Success)
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
