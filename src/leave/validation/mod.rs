//! Policy-driven admissibility checks for leave applications.

pub mod rules;
mod selector;

pub use selector::PolicySelector;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::leave::domain::{BalanceKey, EmployeeId, LeaveSubmission, LeaveType, TenantId};
use crate::policy::domain::Policy;
use crate::store::{LeaveStore, PolicyStore, StoreError};

/// Follow-up actions the caller must arrange for an admissible request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredAction {
    RequireAttachment,
    RequireMedicalCertificate,
    RequireBirthCertificate,
    RequireFitnessCertificate,
    RouteToApprovers,
}

impl RequiredAction {
    pub const fn label(self) -> &'static str {
        match self {
            RequiredAction::RequireAttachment => "require_attachment",
            RequiredAction::RequireMedicalCertificate => "require_medical_certificate",
            RequiredAction::RequireBirthCertificate => "require_birth_certificate",
            RequiredAction::RequireFitnessCertificate => "require_fitness_certificate",
            RequiredAction::RouteToApprovers => "route_to_approvers",
        }
    }
}

/// Accumulated verdict of one validation run. Business-rule violations are
/// values in `errors`, never raised; `warnings` are advisory only.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub errors: BTreeMap<&'static str, String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
    pub actions_required: Vec<RequiredAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave_type: Option<LeaveType>,
}

impl ValidationOutcome {
    fn empty() -> Self {
        Self {
            errors: BTreeMap::new(),
            warnings: Vec::new(),
            policy: None,
            actions_required: Vec::new(),
            leave_type: None,
        }
    }

    fn rejected(key: &'static str, message: impl Into<String>) -> Self {
        let mut outcome = Self::empty();
        outcome.errors.insert(key, message.into());
        outcome
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Evaluates a submission against the selected policy and category rules.
pub struct LeaveValidator<S> {
    store: Arc<S>,
    selector: PolicySelector<S>,
}

impl<S> LeaveValidator<S>
where
    S: LeaveStore + PolicyStore,
{
    pub fn new(store: Arc<S>) -> Self {
        let selector = PolicySelector::new(store.clone());
        Self { store, selector }
    }

    pub fn selector(&self) -> &PolicySelector<S> {
        &self.selector
    }

    /// Run every rule, accumulating errors and warnings. Category and
    /// policy resolution are preconditions that short-circuit; the rule
    /// checks after them all run regardless of earlier failures.
    ///
    /// Input-shape guarantees (dates present and ordered, `total_days`
    /// consistent with the range, bounded backdating) are the submitting
    /// boundary's job; see [`crate::leave::service`].
    pub fn validate(
        &self,
        submission: &LeaveSubmission,
        tenant_id: TenantId,
        employee_id: EmployeeId,
        employee_role: Option<&str>,
        _employee_department: Option<&str>,
        today: NaiveDate,
    ) -> Result<ValidationOutcome, StoreError> {
        let category = match self.store.category(tenant_id, submission.leave_category_id)? {
            Some(category) if category.is_active => category,
            _ => return Ok(ValidationOutcome::rejected(
                rules::ERR_CATEGORY,
                "Invalid leave category",
            )),
        };
        let leave_type = category.name;

        let Some(policy) = self.selector.select(
            submission.leave_category_id,
            tenant_id,
            employee_role,
        ) else {
            return Ok(ValidationOutcome::rejected(
                rules::ERR_POLICY,
                "No active and approved policy found for the selected leave category and employee role",
            ));
        };

        let mut outcome = ValidationOutcome::empty();
        outcome.leave_type = Some(leave_type);

        if let Some(message) = rules::documentation_requirement(
            leave_type,
            submission.total_days,
            &policy,
            &category,
        ) {
            if submission.document_url.is_none() {
                outcome.errors.insert(rules::ERR_DOCUMENTATION, message);
                outcome
                    .actions_required
                    .push(RequiredAction::RequireAttachment);
            }
        }

        if leave_type == LeaveType::Annual {
            let key = BalanceKey {
                tenant_id,
                employee_id,
                leave_category_id: submission.leave_category_id,
                year: today.year(),
                month: None,
            };
            let balance = self.store.balance(&key)?;
            if let Some((key, message)) =
                rules::balance_shortfall(balance.as_ref(), submission.total_days)
            {
                outcome.errors.insert(key, message);
            }
        }

        if self.store.overlapping_exists(
            tenant_id,
            employee_id,
            submission.start_date,
            submission.end_date,
        )? {
            outcome.errors.insert(
                rules::ERR_OVERLAP,
                "Leave dates overlap with existing applications".to_string(),
            );
        }

        let (month_start, month_end) = rules::month_window(submission.start_date);
        let monthly = self.store.monthly_count(
            tenant_id,
            employee_id,
            submission.leave_category_id,
            month_start,
            month_end,
        )?;
        if let Some(message) = rules::monthly_limit_exceeded(monthly, policy.limit_per_month) {
            outcome.errors.insert(rules::ERR_MONTHLY_LIMIT, message);
        }

        if let Some(message) =
            rules::insufficient_notice(submission.start_date, today, policy.notice_period)
        {
            outcome
                .errors
                .insert(rules::ERR_INSUFFICIENT_NOTICE, message);
        }

        outcome.warnings.extend(rules::blackout_warnings(
            submission.start_date,
            submission.end_date,
            leave_type,
        ));

        for (key, message) in rules::employment_restrictions(employee_role, leave_type) {
            outcome.errors.insert(key, message);
        }

        if let Some(action) = rules::certificate_action(leave_type, submission.total_days) {
            outcome.actions_required.push(action);
        }

        if !policy.approval_route.is_empty() {
            outcome
                .actions_required
                .push(RequiredAction::RouteToApprovers);
        }

        outcome.policy = Some(policy);
        Ok(outcome)
    }
}
