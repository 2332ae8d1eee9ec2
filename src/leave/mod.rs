//! Leave application intake, validation, approval workflow, and balances.

pub mod balance;
pub mod domain;
pub mod router;
pub mod service;
pub mod validation;
pub mod workflow;

#[cfg(test)]
pub(crate) mod tests;

pub use balance::BalanceLedger;
pub use domain::{
    ApplicationId, ApplicationStatus, ApprovalStatus, ApprovalStep, BalanceKey, CategoryDraft,
    CategoryId, EmployeeContext, EmployeeId, LeaveApplication, LeaveBalance, LeaveCategory,
    LeaveComment, LeaveSubmission, LeaveType, TenantId,
};
pub use router::leave_router;
pub use service::{LeaveService, LeaveServiceError, SubmissionError, SubmittedApplication};
pub use validation::{LeaveValidator, PolicySelector, RequiredAction, ValidationOutcome};
pub use workflow::{ApprovalAction, ProcessOutcome, WorkflowEngine};
