//! Orchestration for the policy lifecycle: create, review, edit, fork.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::leave::domain::{EmployeeContext, TenantId};
use crate::leave::workflow::ApprovalAction;
use crate::policy::approval::{PolicyApprovalEngine, PolicyReviewOutcome};
use crate::policy::domain::{
    Policy, PolicyApproval, PolicyDraft, PolicyId, PolicyRuleError, PolicyUpdate,
};
use crate::policy::versioning::VersioningEngine;
use crate::store::{PolicyStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum PolicyServiceError {
    #[error(transparent)]
    Rule(#[from] PolicyRuleError),
    #[error("policy not found")]
    PolicyNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct PolicyService<S> {
    store: Arc<S>,
    versioning: VersioningEngine<S>,
    reviews: PolicyApprovalEngine<S>,
}

impl<S> PolicyService<S>
where
    S: PolicyStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            versioning: VersioningEngine::new(store.clone()),
            reviews: PolicyApprovalEngine::new(store.clone()),
            store,
        }
    }

    /// Validate and persist a new policy version, then open its review
    /// hierarchy.
    pub fn create(
        &self,
        tenant_id: TenantId,
        author: &EmployeeContext,
        draft: PolicyDraft,
    ) -> Result<Policy, PolicyServiceError> {
        draft.validate()?;
        let now = Utc::now();
        let policy = self
            .versioning
            .create(tenant_id, draft, author.employee_id, now)?;
        self.reviews.create_reviews(&policy, now)?;
        Ok(policy)
    }

    /// Edit a policy. Approved rows are immutable, so the update forks a
    /// new version (with a fresh review hierarchy); unapproved rows are
    /// rewritten in place, keeping their version and review state.
    pub fn update(
        &self,
        tenant_id: TenantId,
        policy_id: PolicyId,
        editor: &EmployeeContext,
        update: PolicyUpdate,
    ) -> Result<Policy, PolicyServiceError> {
        let existing = self
            .store
            .policy(tenant_id, policy_id)?
            .ok_or(PolicyServiceError::PolicyNotFound)?;

        let draft = update.merged_with(&existing);
        draft.validate()?;
        let now = Utc::now();

        if existing.is_approved {
            let forked = self.versioning.fork(&existing, draft, editor.employee_id, now)?;
            self.reviews.create_reviews(&forked, now)?;
            return Ok(forked);
        }

        let mut revised = existing;
        revised.description = draft.description;
        revised.applies_to = draft.applies_to;
        revised.excludes = draft.excludes;
        revised.entitlement = draft.entitlement;
        revised.carry_forward = draft.carry_forward;
        revised.encashment = draft.encashment;
        revised.notice_period = draft.notice_period;
        revised.limit_per_month = draft.limit_per_month;
        revised.document_required = draft.document_required;
        revised.approval_route = draft.approval_route;
        self.store.update_policy(revised.clone())?;
        info!(
            policy = %revised.policy_name,
            version = %revised.version,
            "unapproved policy revised in place"
        );
        Ok(revised)
    }

    /// Apply one reviewer's decision to a policy version.
    pub fn decide(
        &self,
        tenant_id: TenantId,
        policy_id: PolicyId,
        reviewer: &EmployeeContext,
        action: ApprovalAction,
        comments: Option<&str>,
    ) -> Result<PolicyReviewOutcome, PolicyServiceError> {
        let policy = self
            .store
            .policy(tenant_id, policy_id)?
            .ok_or(PolicyServiceError::PolicyNotFound)?;

        let outcome = self.reviews.process(
            &policy,
            reviewer.employee_id,
            reviewer.role.as_deref(),
            action,
            comments,
            Utc::now(),
        )?;
        Ok(outcome)
    }

    pub fn policy(
        &self,
        tenant_id: TenantId,
        policy_id: PolicyId,
    ) -> Result<Policy, PolicyServiceError> {
        self.store
            .policy(tenant_id, policy_id)?
            .ok_or(PolicyServiceError::PolicyNotFound)
    }

    /// Full version history of a name, newest first.
    pub fn versions(
        &self,
        tenant_id: TenantId,
        policy_name: &str,
    ) -> Result<Vec<Policy>, PolicyServiceError> {
        Ok(self.store.policies_named(tenant_id, policy_name)?)
    }

    pub fn list(&self, tenant_id: TenantId) -> Result<Vec<Policy>, PolicyServiceError> {
        Ok(self.store.list_policies(tenant_id)?)
    }

    pub fn reviews_for(
        &self,
        tenant_id: TenantId,
        policy_id: PolicyId,
    ) -> Result<Vec<PolicyApproval>, PolicyServiceError> {
        Ok(self.store.policy_approvals(tenant_id, policy_id)?)
    }
}
