//! Shared types for winsvc-agent: executable identity and update outcomes.

pub mod identity;
pub mod outcome;

pub use identity::{
    DecisionReason, ExecutableIdentity, IdentityError, IdentityStrategy, UpdateDecision, decide,
    file_version, sha256_hex,
};
pub use outcome::UpdateOutcome;
