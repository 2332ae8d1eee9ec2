//! Tenant-scoped storage abstractions.
//!
//! The traits here are the seam between the engines and the backing store.
//! Implementations must uphold the uniqueness constraints documented per
//! method (they are the last line of defense against duplicate-creation
//! races) and must make each trait call atomic with respect to concurrent
//! callers. `decide_step` in particular commits the step decision, the
//! derived application transition, and the completing debit in one
//! critical section, so at most one caller ever observes zero pending
//! remaining and the balance is debited exactly once.

mod memory;

pub use memory::MemoryStore;

use chrono::{DateTime, NaiveDate, Utc};

use crate::leave::domain::{
    ApplicationId, ApprovalStatus, ApprovalStep, BalanceKey, CategoryId, EmployeeId,
    LeaveApplication, LeaveBalance, LeaveCategory, LeaveComment, LeaveType, TenantId,
};
use crate::policy::domain::{Policy, PolicyApproval, PolicyId, PolicyType};

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(&'static str),
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result of atomically deciding one approval step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: ApprovalStep,
    /// Pending rows left for the same application after this decision.
    pub pending_remaining: usize,
    /// The application after any derived status transition.
    pub application: LeaveApplication,
    /// The balance row debited when this decision completed the chain.
    pub balance: Option<LeaveBalance>,
}

/// Result of atomically deciding one policy approval row.
#[derive(Debug, Clone)]
pub struct PolicyDecisionOutcome {
    pub approval: PolicyApproval,
    pub pending_remaining: usize,
}

/// Storage for the leave domain: categories, applications, approval chains,
/// balances, and comments.
pub trait LeaveStore: Send + Sync {
    /// Unique per (tenant, name).
    fn insert_category(&self, category: LeaveCategory) -> Result<LeaveCategory, StoreError>;
    fn update_category(&self, category: LeaveCategory) -> Result<(), StoreError>;
    fn category(
        &self,
        tenant: TenantId,
        id: CategoryId,
    ) -> Result<Option<LeaveCategory>, StoreError>;
    fn category_by_type(
        &self,
        tenant: TenantId,
        name: LeaveType,
    ) -> Result<Option<LeaveCategory>, StoreError>;
    fn categories(&self, tenant: TenantId) -> Result<Vec<LeaveCategory>, StoreError>;

    fn insert_application(
        &self,
        application: LeaveApplication,
    ) -> Result<LeaveApplication, StoreError>;
    fn application(
        &self,
        tenant: TenantId,
        id: ApplicationId,
    ) -> Result<Option<LeaveApplication>, StoreError>;
    fn update_application(&self, application: LeaveApplication) -> Result<(), StoreError>;
    /// Newest first by `applied_at`.
    fn applications_for_employee(
        &self,
        tenant: TenantId,
        employee: EmployeeId,
    ) -> Result<Vec<LeaveApplication>, StoreError>;
    /// Any pending/approved application for the employee intersecting the
    /// inclusive `[start, end]` window.
    fn overlapping_exists(
        &self,
        tenant: TenantId,
        employee: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, StoreError>;
    /// Pending/approved applications in the category whose `start_date`
    /// falls within the inclusive window.
    fn monthly_count(
        &self,
        tenant: TenantId,
        employee: EmployeeId,
        category: CategoryId,
        month_start: NaiveDate,
        month_end: NaiveDate,
    ) -> Result<usize, StoreError>;

    /// Atomic batch insert; unique per (application, level). Partial
    /// creation must not be observable.
    fn insert_steps(&self, steps: Vec<ApprovalStep>) -> Result<Vec<ApprovalStep>, StoreError>;
    /// Ordered by level.
    fn steps_for_application(
        &self,
        tenant: TenantId,
        application: ApplicationId,
    ) -> Result<Vec<ApprovalStep>, StoreError>;
    /// Locate the pending step assigned to `approver` (or claimable by
    /// their role when the row's approver is unresolved) and apply the
    /// decision. In the same critical section, while the application is
    /// still pending: a rejection flips it to rejected, and the approval
    /// that leaves zero pending rows flips it to approved and debits
    /// `total_days` against the `debit` bucket (creating a zeroed row on
    /// first use). Returns `None` when no pending step matches — a
    /// recoverable outcome.
    #[allow(clippy::too_many_arguments)]
    fn decide_step(
        &self,
        tenant: TenantId,
        application: ApplicationId,
        approver: EmployeeId,
        approver_role: Option<&str>,
        status: ApprovalStatus,
        comments: &str,
        debit: BalanceKey,
        at: DateTime<Utc>,
    ) -> Result<Option<StepOutcome>, StoreError>;

    fn balance(&self, key: &BalanceKey) -> Result<Option<LeaveBalance>, StoreError>;
    /// Recomputes the derived balance before persisting.
    fn put_balance(&self, balance: LeaveBalance) -> Result<LeaveBalance, StoreError>;

    fn insert_comment(&self, comment: LeaveComment) -> Result<LeaveComment, StoreError>;
    /// Oldest first.
    fn comments_for_application(
        &self,
        tenant: TenantId,
        application: ApplicationId,
    ) -> Result<Vec<LeaveComment>, StoreError>;
}

/// Storage for versioned policies and their approval rows.
pub trait PolicyStore: Send + Sync {
    /// Unique per (tenant, policy_name, version).
    fn insert_policy(&self, policy: Policy) -> Result<Policy, StoreError>;
    fn update_policy(&self, policy: Policy) -> Result<(), StoreError>;
    fn policy(&self, tenant: TenantId, id: PolicyId) -> Result<Option<Policy>, StoreError>;
    /// Most recently created row sharing (tenant, policy_name).
    fn latest_policy_named(
        &self,
        tenant: TenantId,
        policy_name: &str,
    ) -> Result<Option<Policy>, StoreError>;
    /// All versions of a name, newest first.
    fn policies_named(
        &self,
        tenant: TenantId,
        policy_name: &str,
    ) -> Result<Vec<Policy>, StoreError>;
    /// Active, approved policies of one type, newest first.
    fn active_approved_policies(
        &self,
        tenant: TenantId,
        policy_type: PolicyType,
    ) -> Result<Vec<Policy>, StoreError>;
    /// Every policy row for the tenant, newest first.
    fn list_policies(&self, tenant: TenantId) -> Result<Vec<Policy>, StoreError>;

    /// Atomic batch insert; unique per (policy, level) and per
    /// (policy, approver) where the approver is resolved.
    fn insert_policy_approvals(
        &self,
        approvals: Vec<PolicyApproval>,
    ) -> Result<Vec<PolicyApproval>, StoreError>;
    /// Ordered by level.
    fn policy_approvals(
        &self,
        tenant: TenantId,
        policy: PolicyId,
    ) -> Result<Vec<PolicyApproval>, StoreError>;
    /// Locate the claimable pending approval row for `approver`, apply the
    /// decision, and report the remaining pending count atomically. Policy
    /// status transitions stay with the caller via `update_policy`.
    #[allow(clippy::too_many_arguments)]
    fn decide_policy_approval(
        &self,
        tenant: TenantId,
        policy: PolicyId,
        approver: EmployeeId,
        approver_role: Option<&str>,
        status: ApprovalStatus,
        comments: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<PolicyDecisionOutcome>, StoreError>;
}
