//! Versioned policy documents and their review lifecycle.

pub mod approval;
pub mod domain;
pub mod router;
pub mod service;
pub mod versioning;

#[cfg(test)]
pub(crate) mod tests;

pub use approval::{PolicyApprovalEngine, PolicyReviewOutcome};
pub use domain::{
    Policy, PolicyApproval, PolicyDraft, PolicyId, PolicyRuleError, PolicyStatus, PolicyType,
    PolicyUpdate, RouteEntry,
};
pub use router::policy_router;
pub use service::{PolicyService, PolicyServiceError};
pub use versioning::{next_version, VersioningEngine};
