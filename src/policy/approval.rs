//! The fixed two-level review hierarchy every new policy version passes
//! through before it can govern leave decisions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::leave::domain::{ApprovalStatus, EmployeeId};
use crate::leave::workflow::ApprovalAction;
use crate::policy::domain::{Policy, PolicyApproval, PolicyStatus};
use crate::store::{PolicyStore, StoreError};

const REVIEW_HIERARCHY: [&str; 2] = ["HR Manager", "Chief Human Resource Officer"];

/// Result of processing one reviewer's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyReviewOutcome {
    Decided { status: PolicyStatus },
    NoPendingApproval,
}

pub struct PolicyApprovalEngine<S> {
    store: Arc<S>,
}

impl<S> PolicyApprovalEngine<S>
where
    S: PolicyStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create the review rows for a freshly created or forked version.
    /// Approvers are unresolved at creation and claimed by role when a
    /// matching reviewer acts.
    pub fn create_reviews(
        &self,
        policy: &Policy,
        now: DateTime<Utc>,
    ) -> Result<Vec<PolicyApproval>, StoreError> {
        let approvals = REVIEW_HIERARCHY
            .iter()
            .enumerate()
            .map(|(index, role)| PolicyApproval {
                id: Uuid::new_v4(),
                tenant_id: policy.tenant_id,
                policy_id: policy.id,
                level: index as u32 + 1,
                approver_id: None,
                approver_role: (*role).to_string(),
                status: ApprovalStatus::Pending,
                comments: String::new(),
                approved_at: None,
                created_at: now,
            })
            .collect();
        self.store.insert_policy_approvals(approvals)
    }

    /// Apply one reviewer's decision. The final approval activates the
    /// version; any rejection parks it as rejected with other reviews left
    /// pending.
    pub fn process(
        &self,
        policy: &Policy,
        approver_id: EmployeeId,
        approver_role: Option<&str>,
        action: ApprovalAction,
        comments: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PolicyReviewOutcome, StoreError> {
        let decided_status = match action {
            ApprovalAction::Approve => ApprovalStatus::Approved,
            ApprovalAction::Reject => ApprovalStatus::Rejected,
        };

        let Some(outcome) = self.store.decide_policy_approval(
            policy.tenant_id,
            policy.id,
            approver_id,
            approver_role,
            decided_status,
            comments.unwrap_or_default(),
            now,
        )?
        else {
            return Ok(PolicyReviewOutcome::NoPendingApproval);
        };

        let status = match action {
            ApprovalAction::Approve => {
                if outcome.pending_remaining == 0 {
                    let mut approved = policy.clone();
                    approved.is_approved = true;
                    approved.status = PolicyStatus::Active;
                    approved.approved_by = Some(approver_id);
                    approved.approved_at = Some(now);
                    self.store.update_policy(approved)?;
                    info!(
                        policy = %policy.policy_name,
                        version = %policy.version,
                        "policy fully approved and active"
                    );
                    PolicyStatus::Active
                } else {
                    policy.status
                }
            }
            ApprovalAction::Reject => {
                let mut rejected = policy.clone();
                rejected.is_approved = false;
                rejected.status = PolicyStatus::Rejected;
                self.store.update_policy(rejected)?;
                info!(
                    policy = %policy.policy_name,
                    version = %policy.version,
                    level = outcome.approval.level,
                    "policy version rejected"
                );
                PolicyStatus::Rejected
            }
        };

        Ok(PolicyReviewOutcome::Decided { status })
    }
}
