//! Application service — node-online event handling.
//!
//! Each online event is handed to tokio's blocking pool so the thread that
//! delivered the event never waits on node I/O. Results are delivered only
//! through the [`OutcomeSink`].

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::task::JoinHandle;
use winsvc_common::UpdateOutcome;

use crate::application::ports::{AgentNode, OutcomeSink, UpdateReport};
use crate::application::services::exe_update::{ExeUpdater, Reconciliation};
use crate::domain::layout::WRAPPER_EXE;

/// Routes online events to the [`ExeUpdater`], at most one per node at a time.
pub struct UpdateDispatcher {
    updater: Arc<ExeUpdater>,
    sink: Arc<dyn OutcomeSink>,
    disabled: bool,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl UpdateDispatcher {
    /// `disabled` is the operator kill switch; every event is then reported
    /// as [`UpdateOutcome::Skipped`] without touching the node.
    #[must_use]
    pub fn new(updater: Arc<ExeUpdater>, sink: Arc<dyn OutcomeSink>, disabled: bool) -> Self {
        Self {
            updater,
            sink,
            disabled,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Handle a node coming online. Returns as soon as the work is queued.
    ///
    /// The handle is only for callers that must keep the runtime alive until
    /// the attempt finishes; `None` means nothing was scheduled.
    pub fn on_online(&self, node: Arc<dyn AgentNode>) -> Option<JoinHandle<()>> {
        let target = node.root().join(WRAPPER_EXE);

        if self.disabled {
            tracing::debug!(node = node.name(), "automatic update disabled");
            self.sink.report(&report(
                node.name(),
                target,
                Reconciliation {
                    outcome: UpdateOutcome::Skipped,
                    detail: Some("automatic update is disabled".to_string()),
                },
            ));
            return None;
        }

        let guard = InFlight::acquire(&self.in_flight, node.name())?;

        let updater = Arc::clone(&self.updater);
        let sink = Arc::clone(&self.sink);
        Some(tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let result = panic::catch_unwind(AssertUnwindSafe(|| updater.reconcile(node.as_ref())))
                .unwrap_or_else(|_| {
                    tracing::error!(node = node.name(), "reconcile panicked");
                    Reconciliation {
                        outcome: UpdateOutcome::Failure,
                        detail: Some("reconcile panicked".to_string()),
                    }
                });
            sink.report(&report(node.name(), target, result));
        }))
    }

    /// Nodes with a reconcile currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn report(node: &str, target: PathBuf, result: Reconciliation) -> UpdateReport {
    UpdateReport {
        node: node.to_string(),
        target,
        outcome: result.outcome,
        detail: result.detail,
        finished_at: Utc::now(),
    }
}

/// Membership of one node in the in-flight set, released on drop.
struct InFlight {
    set: Arc<Mutex<HashSet<String>>>,
    node: String,
}

impl InFlight {
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, node: &str) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(node.to_string());
        if !inserted {
            tracing::debug!(node, "reconcile already in flight; dropping event");
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            node: node.to_string(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.node);
    }
}
