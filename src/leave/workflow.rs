//! Approval chain construction and the per-step state machine.
//!
//! Each step moves `pending -> approved | rejected` and is then terminal.
//! The application's own status derives from the aggregate: the last
//! approval flips it to approved (and debits the balance ledger), while a
//! single rejection anywhere in the chain is final regardless of other
//! pending steps. `escalated` exists in the schema but nothing transitions
//! into it.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::leave::domain::{
    ApplicationStatus, ApprovalStatus, ApprovalStep, BalanceKey, EmployeeId, LeaveApplication,
};
use crate::policy::domain::RouteEntry;
use crate::store::{LeaveStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Approve,
    Reject,
}

impl ApprovalAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" => Some(ApprovalAction::Approve),
            "reject" => Some(ApprovalAction::Reject),
            _ => None,
        }
    }
}

/// Caller-visible result of processing one approval. A missing pending
/// step is a recoverable outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Decided { status: ApplicationStatus },
    NoPendingStep,
}

pub struct WorkflowEngine<S> {
    store: Arc<S>,
}

impl<S> WorkflowEngine<S>
where
    S: LeaveStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create the ordered approval chain for an application as one atomic
    /// batch. Levels are the 1-based positions in the route; an empty route
    /// degrades to a single "Manager" step whose approver is resolved from
    /// the org chart later.
    pub fn create(
        &self,
        application: &LeaveApplication,
        approval_route: &[RouteEntry],
        now: DateTime<Utc>,
    ) -> Result<Vec<ApprovalStep>, StoreError> {
        let steps: Vec<ApprovalStep> = if approval_route.is_empty() {
            vec![step_for(
                application,
                1,
                None,
                "Manager".to_string(),
                "Manager".to_string(),
                now,
            )]
        } else {
            approval_route
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    step_for(
                        application,
                        index as u32 + 1,
                        entry.approver_id,
                        entry.approver_name.clone(),
                        entry.approver_role.clone(),
                        now,
                    )
                })
                .collect()
        };

        let created = self.store.insert_steps(steps)?;
        info!(
            application = %application.application_number,
            levels = created.len(),
            "approval workflow created"
        );
        Ok(created)
    }

    /// Apply one approver's decision. The store resolves the unique pending
    /// step for this approver and commits the decision, the derived
    /// application transition, and the completing debit in one critical
    /// section, so only the final approval flips the application and the
    /// balance is debited exactly once. A rejection anywhere in the chain
    /// is final regardless of other pending steps.
    pub fn process(
        &self,
        application: &LeaveApplication,
        approver_id: EmployeeId,
        approver_role: Option<&str>,
        action: ApprovalAction,
        comments: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ProcessOutcome, StoreError> {
        let decided_status = match action {
            ApprovalAction::Approve => ApprovalStatus::Approved,
            ApprovalAction::Reject => ApprovalStatus::Rejected,
        };
        let debit = BalanceKey {
            tenant_id: application.tenant_id,
            employee_id: application.employee_id,
            leave_category_id: application.leave_category_id,
            year: now.year(),
            month: None,
        };

        let Some(outcome) = self.store.decide_step(
            application.tenant_id,
            application.id,
            approver_id,
            approver_role,
            decided_status,
            comments.unwrap_or_default(),
            debit,
            now,
        )?
        else {
            return Ok(ProcessOutcome::NoPendingStep);
        };

        if let Some(balance) = &outcome.balance {
            info!(
                application = %application.application_number,
                days = %outcome.application.total_days,
                remaining = %balance.balance,
                "all approvals complete, application approved and balance debited"
            );
        } else if action == ApprovalAction::Reject {
            info!(
                application = %application.application_number,
                level = outcome.step.level,
                "application rejected"
            );
        }

        Ok(ProcessOutcome::Decided {
            status: outcome.application.status,
        })
    }
}

fn step_for(
    application: &LeaveApplication,
    level: u32,
    approver_id: Option<EmployeeId>,
    approver_name: String,
    approver_role: String,
    now: DateTime<Utc>,
) -> ApprovalStep {
    ApprovalStep {
        id: Uuid::new_v4(),
        tenant_id: application.tenant_id,
        application_id: application.id,
        level,
        approver_id,
        approver_name,
        approver_role,
        status: ApprovalStatus::Pending,
        comments: String::new(),
        approved_at: None,
        escalated_to: None,
        escalated_at: None,
        created_at: now,
    }
}
