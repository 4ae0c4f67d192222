use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::DecisionReason;

/// Terminal outcome of one reconcile attempt on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateOutcome {
    /// Not applicable: updates disabled, non-Windows node, or no channel.
    Skipped,
    Identical,
    NoTarget,
    Malformed,
    DeployedNewerOrEqual,
    /// New executable is in place; it takes effect on the next service start.
    Success,
    /// A stale backup could not be removed; the live executable is untouched.
    Aborted,
    Failure,
}

impl UpdateOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skipped => "SKIPPED",
            Self::Identical => "IDENTICAL",
            Self::NoTarget => "NO_TARGET",
            Self::Malformed => "MALFORMED",
            Self::DeployedNewerOrEqual => "DEPLOYED_NEWER_OR_EQUAL",
            Self::Success => "SUCCESS",
            Self::Aborted => "ABORTED",
            Self::Failure => "FAILURE",
        }
    }

    /// `true` for outcomes an operator should look at.
    #[must_use]
    pub const fn needs_attention(self) -> bool {
        matches!(self, Self::Malformed | Self::Aborted | Self::Failure)
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DecisionReason {
    /// The outcome reported when this reason stops the cycle, or `None` when
    /// the reason leads to a swap.
    #[must_use]
    pub const fn terminal_outcome(self) -> Option<UpdateOutcome> {
        match self {
            Self::Identical => Some(UpdateOutcome::Identical),
            Self::DeployedNewerOrEqual => Some(UpdateOutcome::DeployedNewerOrEqual),
            Self::NoTarget => Some(UpdateOutcome::NoTarget),
            Self::Malformed => Some(UpdateOutcome::Malformed),
            Self::ContentDiffers | Self::BundledNewer => None,
        }
    }
}
