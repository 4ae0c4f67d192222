//! Deferred one-shot actions run after the current command returns.

use std::cell::RefCell;

use crate::application::ports::{DeferredAction, DeferredActions};

/// Actions queued during a command, drained in registration order.
#[derive(Default)]
pub struct ShutdownSequence {
    actions: RefCell<Vec<(String, DeferredAction)>>,
}

impl ShutdownSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.borrow().is_empty()
    }

    /// Run every queued action once, in order. Actions queued while draining
    /// run in the same call.
    pub async fn drain(&self) {
        loop {
            let next = {
                let mut actions = self.actions.borrow_mut();
                if actions.is_empty() {
                    None
                } else {
                    Some(actions.remove(0))
                }
            };
            let Some((label, action)) = next else { break };
            tracing::debug!(action = %label, "running deferred action");
            action().await;
        }
    }
}

impl DeferredActions for ShutdownSequence {
    fn defer(&self, label: &str, action: DeferredAction) {
        tracing::debug!(action = label, "deferred");
        self.actions.borrow_mut().push((label.to_string(), action));
    }
}
