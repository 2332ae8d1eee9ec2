use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::leave::domain::{
    ApplicationId, ApplicationStatus, ApprovalStatus, ApprovalStep, BalanceKey, CategoryId,
    EmployeeId, LeaveApplication, LeaveBalance, LeaveCategory, LeaveComment, LeaveType, TenantId,
};
use crate::policy::domain::{Policy, PolicyApproval, PolicyId, PolicyType};

use super::{LeaveStore, PolicyDecisionOutcome, PolicyStore, StepOutcome, StoreError};

/// In-memory store backing the service and the test suites.
///
/// A single mutex over the whole state makes every trait call a serializable
/// transaction, which is what gives `decide_step` its exactly-once
/// "last pending row" guarantee.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    categories: Vec<LeaveCategory>,
    applications: Vec<LeaveApplication>,
    steps: Vec<ApprovalStep>,
    balances: HashMap<BalanceKey, LeaveBalance>,
    comments: Vec<LeaveComment>,
    policies: Vec<Policy>,
    policy_approvals: Vec<PolicyApproval>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
    }
}

/// Get-or-create plus read-modify-write on a balance bucket; callers hold
/// the state lock, so the recompute commits with the rest of the decision.
fn debit_balance(
    balances: &mut HashMap<BalanceKey, LeaveBalance>,
    key: BalanceKey,
    amount: Decimal,
    now: DateTime<Utc>,
) -> LeaveBalance {
    let balance = balances
        .entry(key)
        .or_insert_with(|| LeaveBalance::zeroed(key, now));
    balance.used += amount;
    balance.recompute();
    balance.updated_at = now;
    balance.clone()
}

fn claimable_by(
    row_approver: Option<EmployeeId>,
    row_role: &str,
    approver: EmployeeId,
    approver_role: Option<&str>,
) -> bool {
    match row_approver {
        Some(assigned) => assigned == approver,
        // Unresolved rows are claimed by role at decision time.
        None => approver_role
            .map(|role| role.eq_ignore_ascii_case(row_role))
            .unwrap_or(false),
    }
}

impl LeaveStore for MemoryStore {
    fn insert_category(&self, category: LeaveCategory) -> Result<LeaveCategory, StoreError> {
        let mut state = self.lock()?;
        let duplicate = state
            .categories
            .iter()
            .any(|c| c.tenant_id == category.tenant_id && c.name == category.name);
        if duplicate {
            return Err(StoreError::Conflict(
                "a leave category with this name already exists for the tenant",
            ));
        }
        state.categories.push(category.clone());
        Ok(category)
    }

    fn update_category(&self, category: LeaveCategory) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let slot = state
            .categories
            .iter_mut()
            .find(|c| c.tenant_id == category.tenant_id && c.id == category.id)
            .ok_or(StoreError::NotFound)?;
        if slot.name != category.name {
            return Err(StoreError::Conflict(
                "leave category names are fixed once created",
            ));
        }
        *slot = category;
        Ok(())
    }

    fn category(
        &self,
        tenant: TenantId,
        id: CategoryId,
    ) -> Result<Option<LeaveCategory>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .categories
            .iter()
            .find(|c| c.tenant_id == tenant && c.id == id)
            .cloned())
    }

    fn category_by_type(
        &self,
        tenant: TenantId,
        name: LeaveType,
    ) -> Result<Option<LeaveCategory>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .categories
            .iter()
            .find(|c| c.tenant_id == tenant && c.name == name)
            .cloned())
    }

    fn categories(&self, tenant: TenantId) -> Result<Vec<LeaveCategory>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .categories
            .iter()
            .filter(|c| c.tenant_id == tenant)
            .cloned()
            .collect())
    }

    fn insert_application(
        &self,
        application: LeaveApplication,
    ) -> Result<LeaveApplication, StoreError> {
        let mut state = self.lock()?;
        if state.applications.iter().any(|a| a.id == application.id) {
            return Err(StoreError::Conflict("application already exists"));
        }
        state.applications.push(application.clone());
        Ok(application)
    }

    fn application(
        &self,
        tenant: TenantId,
        id: ApplicationId,
    ) -> Result<Option<LeaveApplication>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .applications
            .iter()
            .find(|a| a.tenant_id == tenant && a.id == id)
            .cloned())
    }

    fn update_application(&self, application: LeaveApplication) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let slot = state
            .applications
            .iter_mut()
            .find(|a| a.tenant_id == application.tenant_id && a.id == application.id)
            .ok_or(StoreError::NotFound)?;
        *slot = application;
        Ok(())
    }

    fn applications_for_employee(
        &self,
        tenant: TenantId,
        employee: EmployeeId,
    ) -> Result<Vec<LeaveApplication>, StoreError> {
        let state = self.lock()?;
        let mut rows: Vec<LeaveApplication> = state
            .applications
            .iter()
            .filter(|a| a.tenant_id == tenant && a.employee_id == employee)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(rows)
    }

    fn overlapping_exists(
        &self,
        tenant: TenantId,
        employee: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, StoreError> {
        let state = self.lock()?;
        Ok(state.applications.iter().any(|a| {
            a.tenant_id == tenant
                && a.employee_id == employee
                && a.status.counts_against_quota()
                && a.overlaps(start, end)
        }))
    }

    fn monthly_count(
        &self,
        tenant: TenantId,
        employee: EmployeeId,
        category: CategoryId,
        month_start: NaiveDate,
        month_end: NaiveDate,
    ) -> Result<usize, StoreError> {
        let state = self.lock()?;
        Ok(state
            .applications
            .iter()
            .filter(|a| {
                a.tenant_id == tenant
                    && a.employee_id == employee
                    && a.leave_category_id == category
                    && a.status.counts_against_quota()
                    && a.start_date >= month_start
                    && a.start_date <= month_end
            })
            .count())
    }

    fn insert_steps(&self, steps: Vec<ApprovalStep>) -> Result<Vec<ApprovalStep>, StoreError> {
        let mut state = self.lock()?;
        for step in &steps {
            let duplicate = state
                .steps
                .iter()
                .chain(steps.iter().filter(|other| other.id != step.id))
                .any(|other| {
                    other.application_id == step.application_id
                        && other.level == step.level
                        && other.id != step.id
                });
            if duplicate {
                return Err(StoreError::Conflict(
                    "an approval step already exists at this level",
                ));
            }
        }
        state.steps.extend(steps.iter().cloned());
        Ok(steps)
    }

    fn steps_for_application(
        &self,
        tenant: TenantId,
        application: ApplicationId,
    ) -> Result<Vec<ApprovalStep>, StoreError> {
        let state = self.lock()?;
        let mut rows: Vec<ApprovalStep> = state
            .steps
            .iter()
            .filter(|s| s.tenant_id == tenant && s.application_id == application)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.level);
        Ok(rows)
    }

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
    ) -> Result<Option<StepOutcome>, StoreError> {
        let mut state = self.lock()?;

        let target = state
            .steps
            .iter()
            .filter(|s| {
                s.tenant_id == tenant
                    && s.application_id == application
                    && s.status == ApprovalStatus::Pending
                    && claimable_by(s.approver_id, &s.approver_role, approver, approver_role)
            })
            .map(|s| (s.level, s.id))
            .min();

        let Some((_, step_id)) = target else {
            return Ok(None);
        };

        let mut decided = None;
        for step in state.steps.iter_mut() {
            if step.id == step_id {
                step.status = status;
                step.comments = comments.to_string();
                step.approved_at = Some(at);
                step.approver_id.get_or_insert(approver);
                decided = Some(step.clone());
                break;
            }
        }

        let Some(step) = decided else {
            return Ok(None);
        };

        let pending_remaining = state
            .steps
            .iter()
            .filter(|s| {
                s.application_id == application
                    && s.status == ApprovalStatus::Pending
                    && s.id != step_id
            })
            .count();

        // Settle in the same critical section. Transitions only apply while
        // the application is still pending; a prior rejection stays final.
        let (application_row, completed) = {
            let slot = state
                .applications
                .iter_mut()
                .find(|a| a.tenant_id == tenant && a.id == application)
                .ok_or(StoreError::NotFound)?;
            let mut completed = false;
            if slot.status == ApplicationStatus::Pending {
                match status {
                    ApprovalStatus::Rejected => slot.status = ApplicationStatus::Rejected,
                    ApprovalStatus::Approved if pending_remaining == 0 => {
                        slot.status = ApplicationStatus::Approved;
                        completed = true;
                    }
                    _ => {}
                }
            }
            (slot.clone(), completed)
        };

        let balance = completed.then(|| {
            debit_balance(&mut state.balances, debit, application_row.total_days, at)
        });

        Ok(Some(StepOutcome {
            step,
            pending_remaining,
            application: application_row,
            balance,
        }))
    }

    fn balance(&self, key: &BalanceKey) -> Result<Option<LeaveBalance>, StoreError> {
        let state = self.lock()?;
        Ok(state.balances.get(key).cloned())
    }

    fn put_balance(&self, mut balance: LeaveBalance) -> Result<LeaveBalance, StoreError> {
        let mut state = self.lock()?;
        balance.recompute();
        state.balances.insert(balance.key, balance.clone());
        Ok(balance)
    }

    fn insert_comment(&self, comment: LeaveComment) -> Result<LeaveComment, StoreError> {
        let mut state = self.lock()?;
        if let Some(parent_id) = comment.parent_comment_id {
            let parent_ok = state.comments.iter().any(|c| {
                c.id == parent_id
                    && c.tenant_id == comment.tenant_id
                    && c.application_id == comment.application_id
            });
            if !parent_ok {
                return Err(StoreError::Conflict(
                    "parent comment does not belong to this application",
                ));
            }
        }
        state.comments.push(comment.clone());
        Ok(comment)
    }

    fn comments_for_application(
        &self,
        tenant: TenantId,
        application: ApplicationId,
    ) -> Result<Vec<LeaveComment>, StoreError> {
        let state = self.lock()?;
        let mut rows: Vec<LeaveComment> = state
            .comments
            .iter()
            .filter(|c| c.tenant_id == tenant && c.application_id == application)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.created_at);
        Ok(rows)
    }
}

impl PolicyStore for MemoryStore {
    fn insert_policy(&self, policy: Policy) -> Result<Policy, StoreError> {
        let mut state = self.lock()?;
        let duplicate = state.policies.iter().any(|p| {
            p.tenant_id == policy.tenant_id
                && p.policy_name == policy.policy_name
                && p.version == policy.version
        });
        if duplicate {
            return Err(StoreError::Conflict(
                "a policy with this name and version already exists",
            ));
        }
        state.policies.push(policy.clone());
        Ok(policy)
    }

    fn update_policy(&self, policy: Policy) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let collision = state.policies.iter().any(|p| {
            p.id != policy.id
                && p.tenant_id == policy.tenant_id
                && p.policy_name == policy.policy_name
                && p.version == policy.version
        });
        if collision {
            return Err(StoreError::Conflict(
                "a policy with this name and version already exists",
            ));
        }
        let slot = state
            .policies
            .iter_mut()
            .find(|p| p.tenant_id == policy.tenant_id && p.id == policy.id)
            .ok_or(StoreError::NotFound)?;
        *slot = policy;
        Ok(())
    }

    fn policy(&self, tenant: TenantId, id: PolicyId) -> Result<Option<Policy>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .policies
            .iter()
            .find(|p| p.tenant_id == tenant && p.id == id)
            .cloned())
    }

    fn latest_policy_named(
        &self,
        tenant: TenantId,
        policy_name: &str,
    ) -> Result<Option<Policy>, StoreError> {
        Ok(self.policies_named(tenant, policy_name)?.into_iter().next())
    }

    fn policies_named(
        &self,
        tenant: TenantId,
        policy_name: &str,
    ) -> Result<Vec<Policy>, StoreError> {
        let state = self.lock()?;
        let mut rows: Vec<(usize, Policy)> = state
            .policies
            .iter()
            .enumerate()
            .filter(|(_, p)| p.tenant_id == tenant && p.policy_name == policy_name)
            .map(|(i, p)| (i, p.clone()))
            .collect();
        // Insertion order breaks created_at ties, newest first.
        rows.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
        Ok(rows.into_iter().map(|(_, p)| p).collect())
    }

    fn active_approved_policies(
        &self,
        tenant: TenantId,
        policy_type: PolicyType,
    ) -> Result<Vec<Policy>, StoreError> {
        let state = self.lock()?;
        let mut rows: Vec<(usize, Policy)> = state
            .policies
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                p.tenant_id == tenant
                    && p.policy_type == policy_type
                    && p.is_active
                    && p.is_approved
            })
            .map(|(i, p)| (i, p.clone()))
            .collect();
        rows.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
        Ok(rows.into_iter().map(|(_, p)| p).collect())
    }

    fn list_policies(&self, tenant: TenantId) -> Result<Vec<Policy>, StoreError> {
        let state = self.lock()?;
        let mut rows: Vec<(usize, Policy)> = state
            .policies
            .iter()
            .enumerate()
            .filter(|(_, p)| p.tenant_id == tenant)
            .map(|(i, p)| (i, p.clone()))
            .collect();
        rows.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
        Ok(rows.into_iter().map(|(_, p)| p).collect())
    }

    fn insert_policy_approvals(
        &self,
        approvals: Vec<PolicyApproval>,
    ) -> Result<Vec<PolicyApproval>, StoreError> {
        let mut state = self.lock()?;
        for approval in &approvals {
            let duplicate = state.policy_approvals.iter().any(|other| {
                other.policy_id == approval.policy_id
                    && (other.level == approval.level
                        || (other.approver_id.is_some()
                            && other.approver_id == approval.approver_id))
            });
            if duplicate {
                return Err(StoreError::Conflict(
                    "a policy approval already exists for this level or approver",
                ));
            }
        }
        state.policy_approvals.extend(approvals.iter().cloned());
        Ok(approvals)
    }

    fn policy_approvals(
        &self,
        tenant: TenantId,
        policy: PolicyId,
    ) -> Result<Vec<PolicyApproval>, StoreError> {
        let state = self.lock()?;
        let mut rows: Vec<PolicyApproval> = state
            .policy_approvals
            .iter()
            .filter(|a| a.tenant_id == tenant && a.policy_id == policy)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.level);
        Ok(rows)
    }

    fn decide_policy_approval(
        &self,
        tenant: TenantId,
        policy: PolicyId,
        approver: EmployeeId,
        approver_role: Option<&str>,
        status: ApprovalStatus,
        comments: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<PolicyDecisionOutcome>, StoreError> {
        let mut state = self.lock()?;

        let target = state
            .policy_approvals
            .iter()
            .filter(|a| {
                a.tenant_id == tenant
                    && a.policy_id == policy
                    && a.status == ApprovalStatus::Pending
                    && claimable_by(a.approver_id, &a.approver_role, approver, approver_role)
            })
            .map(|a| (a.level, a.id))
            .min();

        let Some((_, approval_id)) = target else {
            return Ok(None);
        };

        let mut decided = None;
        for approval in state.policy_approvals.iter_mut() {
            if approval.id == approval_id {
                approval.status = status;
                approval.comments = comments.to_string();
                approval.approved_at = Some(at);
                approval.approver_id.get_or_insert(approver);
                decided = Some(approval.clone());
                break;
            }
        }

        let pending_remaining = state
            .policy_approvals
            .iter()
            .filter(|a| {
                a.policy_id == policy
                    && a.status == ApprovalStatus::Pending
                    && a.id != approval_id
            })
            .count();

        Ok(decided.map(|approval| PolicyDecisionOutcome {
            approval,
            pending_remaining,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::domain::CategoryDraft;
    use uuid::Uuid;

    fn tenant() -> TenantId {
        TenantId(Uuid::new_v4())
    }

    fn category(tenant: TenantId, name: LeaveType) -> LeaveCategory {
        CategoryDraft {
            name,
            description: String::new(),
            is_active: true,
            default_entitlement_days: 20,
            max_carry_forward: 5,
            max_encashment_days: 5,
            requires_documentation: false,
            documentation_threshold_days: 3,
            notice_period_days: 1,
            monthly_limit: 2,
        }
        .into_category(tenant, Utc::now())
    }

    #[test]
    fn duplicate_category_name_conflicts() {
        let store = MemoryStore::new();
        let tenant = tenant();
        store
            .insert_category(category(tenant, LeaveType::Annual))
            .expect("first insert");
        let err = store
            .insert_category(category(tenant, LeaveType::Annual))
            .expect_err("duplicate rejected");
        assert!(matches!(err, StoreError::Conflict(_)));

        // Same name under another tenant is fine.
        store
            .insert_category(category(TenantId(Uuid::new_v4()), LeaveType::Annual))
            .expect("cross-tenant insert");
    }

    #[test]
    fn debit_creates_and_recomputes() {
        let mut balances = HashMap::new();
        let key = BalanceKey {
            tenant_id: tenant(),
            employee_id: EmployeeId(Uuid::new_v4()),
            leave_category_id: CategoryId(Uuid::new_v4()),
            year: 2026,
            month: None,
        };

        let first = debit_balance(&mut balances, key, Decimal::from(2), Utc::now());
        assert_eq!(first.used, Decimal::from(2));
        assert_eq!(first.balance, Decimal::from(-2));

        let second = debit_balance(&mut balances, key, Decimal::new(5, 1), Utc::now());
        assert_eq!(second.used, Decimal::new(25, 1));
        assert_eq!(second.balance, Decimal::new(-25, 1));
    }

    #[test]
    fn put_balance_always_recomputes_derived_value() {
        let store = MemoryStore::new();
        let key = BalanceKey {
            tenant_id: tenant(),
            employee_id: EmployeeId(Uuid::new_v4()),
            leave_category_id: CategoryId(Uuid::new_v4()),
            year: 2026,
            month: None,
        };
        let mut row = LeaveBalance::zeroed(key, Utc::now());
        row.opening_balance = Decimal::from(20);
        row.balance = Decimal::from(999); // must not be trusted

        let stored = store.put_balance(row).expect("stored");
        assert_eq!(stored.balance, Decimal::from(20));
    }
}
