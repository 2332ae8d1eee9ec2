//! Version assignment and fork-on-edit for policies.
//!
//! Versions form a linear history per (tenant, policy_name). The first row
//! is `v1.0`; every later row bumps the minor component of whatever the
//! newest row carries and points back at its predecessor through
//! `parent_policy_id`. Approved rows are immutable, so an edit forks a
//! fresh version instead of touching the approved one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::leave::domain::{EmployeeId, TenantId};
use crate::policy::domain::{Policy, PolicyDraft, PolicyId, PolicyStatus};
use crate::store::{PolicyStore, StoreError};

/// Next version string after `latest`. `None` seeds the history at `v1.0`;
/// a parseable minor component is incremented; anything without one gets
/// `.1` appended.
pub fn next_version(latest: Option<&str>) -> String {
    let Some(version) = latest else {
        return "v1.0".to_string();
    };
    if let Some((major, minor)) = version.rsplit_once('.') {
        if let Ok(minor) = minor.parse::<u64>() {
            return format!("{major}.{}", minor + 1);
        }
    }
    format!("{version}.1")
}

pub struct VersioningEngine<S> {
    store: Arc<S>,
}

impl<S> VersioningEngine<S>
where
    S: PolicyStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist a new policy row for the draft. If rows already share the
    /// name, this becomes the next version in their history; otherwise it
    /// seeds the history at `v1.0`. New rows always start unapproved and
    /// under review.
    pub fn create(
        &self,
        tenant_id: TenantId,
        draft: PolicyDraft,
        created_by: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<Policy, StoreError> {
        let latest = self.store.latest_policy_named(tenant_id, &draft.policy_name)?;
        let version = next_version(latest.as_ref().map(|policy| policy.version.as_str()));
        let parent_policy_id = latest.map(|policy| policy.id);

        let policy = build_row(tenant_id, draft, version, parent_policy_id, created_by, now);
        let stored = self.store.insert_policy(policy)?;
        info!(
            policy = %stored.policy_name,
            version = %stored.version,
            "policy version created"
        );
        Ok(stored)
    }

    /// Fork an approved row into a new version carrying the merged draft.
    /// The approved row stays in place untouched; the fork points at it.
    pub fn fork(
        &self,
        existing: &Policy,
        draft: PolicyDraft,
        edited_by: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<Policy, StoreError> {
        let latest = self
            .store
            .latest_policy_named(existing.tenant_id, &existing.policy_name)?;
        let version = next_version(
            latest
                .as_ref()
                .map(|policy| policy.version.as_str())
                .or(Some(existing.version.as_str())),
        );

        let policy = build_row(
            existing.tenant_id,
            draft,
            version,
            Some(existing.id),
            edited_by,
            now,
        );
        let stored = self.store.insert_policy(policy)?;
        info!(
            policy = %stored.policy_name,
            version = %stored.version,
            parent = %existing.version,
            "approved policy forked for edit"
        );
        Ok(stored)
    }
}

fn build_row(
    tenant_id: TenantId,
    draft: PolicyDraft,
    version: String,
    parent_policy_id: Option<PolicyId>,
    created_by: EmployeeId,
    now: DateTime<Utc>,
) -> Policy {
    Policy {
        id: PolicyId(Uuid::new_v4()),
        tenant_id,
        policy_name: draft.policy_name,
        version,
        policy_type: draft.policy_type,
        description: draft.description,
        applies_to: draft.applies_to,
        excludes: draft.excludes,
        entitlement: draft.entitlement,
        carry_forward: draft.carry_forward,
        encashment: draft.encashment,
        notice_period: draft.notice_period,
        limit_per_month: draft.limit_per_month,
        document_required: draft.document_required,
        approval_route: draft.approval_route,
        status: PolicyStatus::UnderReview,
        is_active: true,
        is_approved: false,
        approved_by: None,
        approved_at: None,
        parent_policy_id,
        created_by,
        created_at: now,
    }
}

#[cfg(test)]
mod version_tests {
    use super::next_version;

    #[test]
    fn histories_start_at_v1_0() {
        assert_eq!(next_version(None), "v1.0");
    }

    #[test]
    fn minor_component_increments() {
        assert_eq!(next_version(Some("v1.0")), "v1.1");
        assert_eq!(next_version(Some("v1.9")), "v1.10");
        assert_eq!(next_version(Some("v2.3")), "v2.4");
    }

    #[test]
    fn bare_versions_gain_a_minor_component() {
        assert_eq!(next_version(Some("v2")), "v2.1");
        assert_eq!(next_version(Some("draft")), "draft.1");
    }
}
