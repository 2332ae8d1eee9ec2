use std::sync::Arc;

pub(crate) use crate::leave::tests::common::{employee, tenant};

use crate::policy::domain::{PolicyDraft, PolicyType};
use crate::store::MemoryStore;

pub(crate) fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub(crate) fn draft(name: &str) -> PolicyDraft {
    PolicyDraft {
        policy_name: name.to_string(),
        policy_type: PolicyType::LeaveTimeOff,
        description: "Company-wide leave rules".to_string(),
        applies_to: Vec::new(),
        excludes: Vec::new(),
        entitlement: vec!["Permanent".to_string()],
        carry_forward: 10,
        encashment: 5,
        notice_period: 3,
        limit_per_month: 2,
        document_required: false,
        approval_route: Vec::new(),
    }
}
