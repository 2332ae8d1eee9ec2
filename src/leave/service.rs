//! Orchestration for leave application intake and workflow actions.
//!
//! The service is the input-shape boundary: date ordering, total-days
//! consistency, and the backdating grace window are enforced here before
//! the rule validator runs, mirroring where the admission contract places
//! them.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::leave::balance::BalanceLedger;
use crate::leave::domain::{
    next_application_number, ApplicationId, ApplicationStatus, BalanceKey, CategoryDraft,
    CategoryId, EmployeeContext, EmployeeId, LeaveApplication, LeaveBalance, LeaveCategory,
    LeaveComment, LeaveSubmission, TenantId,
};
use crate::leave::validation::{LeaveValidator, RequiredAction, ValidationOutcome};
use crate::leave::workflow::{ApprovalAction, ProcessOutcome, WorkflowEngine};
use crate::store::{LeaveStore, PolicyStore, StoreError};

/// Input-shape violations, rejected before any persistence is attempted.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("end date must be on or after start date")]
    DateOrder,
    #[error("total days ({given}) does not match date range calculation ({expected} days)")]
    TotalDaysMismatch { expected: Decimal, given: Decimal },
    #[error("total days must be greater than 0")]
    NonPositiveDays,
    #[error("start date cannot be more than 1 day in the past")]
    BackdatedStart,
}

/// Error raised by the leave service.
#[derive(Debug, thiserror::Error)]
pub enum LeaveServiceError {
    #[error(transparent)]
    Shape(#[from] SubmissionError),
    #[error("leave application failed validation")]
    Invalid(Box<ValidationOutcome>),
    #[error("leave application not found")]
    ApplicationNotFound,
    #[error("leave category not found")]
    CategoryNotFound,
    #[error("you can only cancel your own leave applications")]
    NotApplicationOwner,
    #[error("only draft or pending applications can be cancelled")]
    NotCancellable,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Accepted submission plus the advisory output of validation.
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedApplication {
    pub application: LeaveApplication,
    pub warnings: Vec<String>,
    pub actions_required: Vec<RequiredAction>,
}

/// HR payload for seeding or correcting a balance bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSeed {
    pub employee_id: EmployeeId,
    pub leave_category_id: CategoryId,
    pub year: i32,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub opening_balance: Decimal,
    #[serde(default)]
    pub accrued: Decimal,
    #[serde(default)]
    pub used: Decimal,
    #[serde(default)]
    pub carried_forward: Decimal,
    #[serde(default)]
    pub encashed: Decimal,
}

pub struct LeaveService<S> {
    store: Arc<S>,
    validator: LeaveValidator<S>,
    workflow: WorkflowEngine<S>,
    ledger: BalanceLedger<S>,
}

impl<S> LeaveService<S>
where
    S: LeaveStore + PolicyStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            validator: LeaveValidator::new(store.clone()),
            workflow: WorkflowEngine::new(store.clone()),
            ledger: BalanceLedger::new(store.clone()),
            store,
        }
    }

    pub fn validator(&self) -> &LeaveValidator<S> {
        &self.validator
    }

    /// Validate and persist a submission, then create its approval chain
    /// from the governing policy's route. A policy without a route gets
    /// the workflow engine's single unresolved Manager step.
    pub fn submit(
        &self,
        tenant_id: TenantId,
        employee: &EmployeeContext,
        submission: LeaveSubmission,
    ) -> Result<SubmittedApplication, LeaveServiceError> {
        let now = Utc::now();
        let today = now.date_naive();
        check_shape(&submission, today)?;

        let outcome = self.validator.validate(
            &submission,
            tenant_id,
            employee.employee_id,
            employee.role.as_deref(),
            employee.department.as_deref(),
            today,
        )?;
        if !outcome.is_valid() {
            return Err(LeaveServiceError::Invalid(Box::new(outcome)));
        }

        // Validation resolves the policy before declaring the payload valid.
        let Some(policy) = outcome.policy.clone() else {
            return Err(LeaveServiceError::Invalid(Box::new(outcome)));
        };

        let needs_document = outcome
            .actions_required
            .iter()
            .any(|action| {
                matches!(
                    action,
                    RequiredAction::RequireAttachment | RequiredAction::RequireMedicalCertificate
                )
            });

        let application = LeaveApplication {
            id: ApplicationId(Uuid::new_v4()),
            tenant_id,
            application_number: next_application_number(),
            employee_id: employee.employee_id,
            employee_name: employee.name.clone(),
            employee_email: employee.email.clone(),
            department: employee.department.clone().unwrap_or_default(),
            position: employee.position.clone().unwrap_or_default(),
            leave_category_id: submission.leave_category_id,
            leave_policy_id: policy.id,
            start_date: submission.start_date,
            end_date: submission.end_date,
            total_days: submission.total_days,
            is_half_day: submission.is_half_day,
            reason: submission.reason.clone(),
            status: ApplicationStatus::Pending,
            document_required: needs_document,
            document_provided: needs_document && submission.document_url.is_some(),
            document_url: submission.document_url.clone(),
            is_cancelled_by_employee: false,
            cancelled_at: None,
            applied_at: now,
        };

        let stored = self.store.insert_application(application)?;

        self.workflow.create(&stored, &policy.approval_route, now)?;

        info!(
            application = %stored.application_number,
            employee = %stored.employee_id.0,
            "leave application submitted"
        );

        Ok(SubmittedApplication {
            application: stored,
            warnings: outcome.warnings,
            actions_required: outcome.actions_required,
        })
    }

    /// Withdraw an application. Only the applicant may cancel, and only
    /// while the application is still draft or pending.
    pub fn cancel(
        &self,
        tenant_id: TenantId,
        application_id: ApplicationId,
        employee_id: EmployeeId,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        let mut application = self
            .store
            .application(tenant_id, application_id)?
            .ok_or(LeaveServiceError::ApplicationNotFound)?;

        if application.employee_id != employee_id {
            return Err(LeaveServiceError::NotApplicationOwner);
        }
        if !application.status.cancellable() {
            return Err(LeaveServiceError::NotCancellable);
        }

        application.status = ApplicationStatus::Cancelled;
        application.is_cancelled_by_employee = true;
        application.cancelled_at = Some(Utc::now());
        self.store.update_application(application.clone())?;

        info!(
            application = %application.application_number,
            "leave application cancelled by employee"
        );
        Ok(application)
    }

    /// Apply one approver's decision to an application's workflow.
    pub fn decide(
        &self,
        tenant_id: TenantId,
        application_id: ApplicationId,
        approver: &EmployeeContext,
        action: ApprovalAction,
        comments: Option<&str>,
    ) -> Result<ProcessOutcome, LeaveServiceError> {
        let application = self
            .store
            .application(tenant_id, application_id)?
            .ok_or(LeaveServiceError::ApplicationNotFound)?;

        let outcome = self.workflow.process(
            &application,
            approver.employee_id,
            approver.role.as_deref(),
            action,
            comments,
            Utc::now(),
        )?;
        Ok(outcome)
    }

    pub fn application(
        &self,
        tenant_id: TenantId,
        application_id: ApplicationId,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        self.store
            .application(tenant_id, application_id)?
            .ok_or(LeaveServiceError::ApplicationNotFound)
    }

    pub fn applications_for_employee(
        &self,
        tenant_id: TenantId,
        employee_id: EmployeeId,
    ) -> Result<Vec<LeaveApplication>, LeaveServiceError> {
        Ok(self.store.applications_for_employee(tenant_id, employee_id)?)
    }

    pub fn approval_steps(
        &self,
        tenant_id: TenantId,
        application_id: ApplicationId,
    ) -> Result<Vec<crate::leave::domain::ApprovalStep>, LeaveServiceError> {
        Ok(self.store.steps_for_application(tenant_id, application_id)?)
    }

    pub fn create_category(
        &self,
        tenant_id: TenantId,
        draft: CategoryDraft,
    ) -> Result<LeaveCategory, LeaveServiceError> {
        let category = draft.into_category(tenant_id, Utc::now());
        Ok(self.store.insert_category(category)?)
    }

    pub fn update_category(
        &self,
        tenant_id: TenantId,
        category_id: CategoryId,
        draft: CategoryDraft,
    ) -> Result<LeaveCategory, LeaveServiceError> {
        let existing = self
            .store
            .category(tenant_id, category_id)?
            .ok_or(LeaveServiceError::CategoryNotFound)?;

        let updated = LeaveCategory {
            id: existing.id,
            tenant_id: existing.tenant_id,
            name: existing.name,
            description: draft.description,
            is_active: draft.is_active,
            default_entitlement_days: draft.default_entitlement_days,
            max_carry_forward: draft.max_carry_forward,
            max_encashment_days: draft.max_encashment_days,
            requires_documentation: draft.requires_documentation,
            documentation_threshold_days: draft.documentation_threshold_days,
            notice_period_days: draft.notice_period_days,
            monthly_limit: draft.monthly_limit,
            created_at: existing.created_at,
        };
        self.store.update_category(updated.clone())?;
        Ok(updated)
    }

    pub fn categories(&self, tenant_id: TenantId) -> Result<Vec<LeaveCategory>, LeaveServiceError> {
        Ok(self.store.categories(tenant_id)?)
    }

    pub fn seed_balance(
        &self,
        tenant_id: TenantId,
        seed: BalanceSeed,
    ) -> Result<LeaveBalance, LeaveServiceError> {
        let key = BalanceKey {
            tenant_id,
            employee_id: seed.employee_id,
            leave_category_id: seed.leave_category_id,
            year: seed.year,
            month: seed.month,
        };
        let mut balance = LeaveBalance::zeroed(key, Utc::now());
        balance.opening_balance = seed.opening_balance;
        balance.accrued = seed.accrued;
        balance.used = seed.used;
        balance.carried_forward = seed.carried_forward;
        balance.encashed = seed.encashed;
        Ok(self.ledger.put(balance)?)
    }

    pub fn balance(
        &self,
        key: &BalanceKey,
    ) -> Result<Option<LeaveBalance>, LeaveServiceError> {
        Ok(self.ledger.get(key)?)
    }

    pub fn add_comment(
        &self,
        tenant_id: TenantId,
        application_id: ApplicationId,
        author: &EmployeeContext,
        comment: String,
        parent_comment_id: Option<Uuid>,
    ) -> Result<LeaveComment, LeaveServiceError> {
        // Comments attach only to applications that exist in this tenant.
        self.application(tenant_id, application_id)?;

        let row = LeaveComment {
            id: Uuid::new_v4(),
            tenant_id,
            application_id,
            comment,
            author_id: author.employee_id,
            author_name: author.name.clone(),
            author_role: author.role.clone().unwrap_or_default(),
            parent_comment_id,
            created_at: Utc::now(),
        };
        Ok(self.store.insert_comment(row)?)
    }

    pub fn comments(
        &self,
        tenant_id: TenantId,
        application_id: ApplicationId,
    ) -> Result<Vec<LeaveComment>, LeaveServiceError> {
        Ok(self.store.comments_for_application(tenant_id, application_id)?)
    }
}

/// Input-shape checks applied before validation: inclusive day count
/// (0.5 for half-days), positive totals, and at most one day of backdating.
fn check_shape(submission: &LeaveSubmission, today: NaiveDate) -> Result<(), SubmissionError> {
    if submission.start_date > submission.end_date {
        return Err(SubmissionError::DateOrder);
    }

    let span_days = (submission.end_date - submission.start_date).num_days() + 1;
    let expected = if submission.is_half_day {
        Decimal::new(5, 1)
    } else {
        Decimal::from(span_days)
    };
    if submission.total_days != expected {
        return Err(SubmissionError::TotalDaysMismatch {
            expected,
            given: submission.total_days,
        });
    }

    if submission.total_days <= Decimal::ZERO {
        return Err(SubmissionError::NonPositiveDays);
    }

    if submission.start_date < today - chrono::Duration::days(1) {
        return Err(SubmissionError::BackdatedStart);
    }

    Ok(())
}
