use std::sync::Arc;

use tracing::{error, warn};

use crate::leave::domain::{CategoryId, TenantId};
use crate::policy::domain::{Policy, PolicyType};
use crate::store::{LeaveStore, PolicyStore};

/// Resolves the single applicable, active, approved policy version for an
/// employee and leave category.
pub struct PolicySelector<S> {
    store: Arc<S>,
}

impl<S> PolicySelector<S>
where
    S: LeaveStore + PolicyStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Newest-first scan over active+approved leave policies with
    /// exclusion-then-inclusion filtering:
    ///
    /// 1. a role named in `excludes` rejects the candidate;
    /// 2. an empty `applies_to` accepts (applies to everyone not excluded);
    /// 3. a role named in `applies_to` accepts;
    /// 4. otherwise reject — with a non-empty `applies_to`, applicability
    ///    cannot be determined without a role, and a non-matching role does
    ///    not qualify. The two cases are distinct branches on purpose.
    ///
    /// Fails soft: a missing or inactive category, and any store failure,
    /// yield `None` rather than an error. Leave must never be admitted
    /// against an unresolvable policy.
    pub fn select(
        &self,
        leave_category_id: CategoryId,
        tenant_id: TenantId,
        employee_role: Option<&str>,
    ) -> Option<Policy> {
        let category = match self.store.category(tenant_id, leave_category_id) {
            Ok(Some(category)) if category.is_active => category,
            Ok(_) => {
                warn!(
                    category = %leave_category_id.0,
                    tenant = %tenant_id.0,
                    "leave category not found or inactive for tenant"
                );
                return None;
            }
            Err(err) => {
                error!(error = %err, "category lookup failed during policy selection");
                return None;
            }
        };

        let candidates = match self
            .store
            .active_approved_policies(tenant_id, PolicyType::LeaveTimeOff)
        {
            Ok(candidates) => candidates,
            Err(err) => {
                error!(
                    error = %err,
                    category = category.name.label(),
                    "policy lookup failed during selection"
                );
                return None;
            }
        };

        candidates
            .into_iter()
            .find(|policy| applicable(policy, employee_role))
    }
}

fn applicable(policy: &Policy, employee_role: Option<&str>) -> bool {
    if let Some(role) = employee_role {
        if policy.excludes.iter().any(|excluded| excluded == role) {
            return false;
        }
    }

    if policy.applies_to.is_empty() {
        return true;
    }

    match employee_role {
        Some(role) => policy.applies_to.iter().any(|included| included == role),
        None => false,
    }
}

#[cfg(test)]
mod applicability_tests {
    use super::*;
    use crate::leave::tests::common::approved_policy;
    use crate::leave::domain::TenantId;
    use uuid::Uuid;

    fn policy(applies_to: &[&str], excludes: &[&str]) -> Policy {
        let mut policy = approved_policy(TenantId(Uuid::new_v4()), "Test Policy", "v1.0");
        policy.applies_to = applies_to.iter().map(|s| s.to_string()).collect();
        policy.excludes = excludes.iter().map(|s| s.to_string()).collect();
        policy
    }

    #[test]
    fn empty_applies_to_accepts_anyone_not_excluded() {
        let p = policy(&[], &["Intern"]);
        assert!(applicable(&p, Some("Engineer")));
        assert!(applicable(&p, None));
        assert!(!applicable(&p, Some("Intern")));
    }

    #[test]
    fn non_empty_applies_to_requires_a_matching_role() {
        let p = policy(&["Manager"], &[]);
        assert!(applicable(&p, Some("Manager")));
        assert!(!applicable(&p, Some("Engineer")));
        // No role provided: applicability cannot be determined.
        assert!(!applicable(&p, None));
    }

    #[test]
    fn excludes_takes_precedence_over_applies_to() {
        let p = policy(&["Manager"], &["Manager"]);
        assert!(!applicable(&p, Some("Manager")));
    }
}
