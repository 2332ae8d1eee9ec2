use std::sync::Arc;

use leaveflow::leave::{
    ApprovalAction, CategoryDraft, EmployeeContext, EmployeeId, LeaveService, LeaveType,
    PolicySelector, TenantId,
};
use leaveflow::policy::{
    policy_router, PolicyDraft, PolicyService, PolicyStatus, PolicyUpdate,
};
use leaveflow::store::MemoryStore;
use tower::ServiceExt;
use uuid::Uuid;

fn actor(name: &str, role: &str) -> EmployeeContext {
    EmployeeContext {
        employee_id: EmployeeId(Uuid::new_v4()),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        role: Some(role.to_string()),
        department: Some("People".to_string()),
        position: Some(role.to_string()),
    }
}

fn leave_policy(name: &str) -> PolicyDraft {
    PolicyDraft {
        policy_name: name.to_string(),
        policy_type: Default::default(),
        description: "Company-wide leave rules".to_string(),
        applies_to: Vec::new(),
        excludes: Vec::new(),
        entitlement: Vec::new(),
        carry_forward: 10,
        encashment: 5,
        notice_period: 0,
        limit_per_month: 0,
        document_required: false,
        approval_route: Vec::new(),
    }
}

fn approve_fully(
    service: &PolicyService<MemoryStore>,
    tenant: TenantId,
    policy_id: leaveflow::policy::PolicyId,
) {
    let hr = actor("Asha Rao", "HR Manager");
    let chro = actor("Daniel Okafor", "Chief Human Resource Officer");
    for reviewer in [&hr, &chro] {
        service
            .decide(tenant, policy_id, reviewer, ApprovalAction::Approve, None)
            .expect("review applied");
    }
}

#[test]
fn unapproved_versions_never_govern_leave() {
    let store = Arc::new(MemoryStore::new());
    let leave = LeaveService::new(store.clone());
    let policy = PolicyService::new(store.clone());
    let selector = PolicySelector::new(store);
    let tenant = TenantId(Uuid::new_v4());
    let hr = actor("Asha Rao", "HR Manager");

    let category = leave
        .create_category(
            tenant,
            CategoryDraft {
                name: LeaveType::Annual,
                description: String::new(),
                is_active: true,
                default_entitlement_days: 20,
                max_carry_forward: 10,
                max_encashment_days: 5,
                requires_documentation: false,
                documentation_threshold_days: 3,
                notice_period_days: 1,
                monthly_limit: 2,
            },
        )
        .expect("category created");

    let created = policy
        .create(tenant, &hr, leave_policy("Standard Leave Policy"))
        .expect("policy created");

    assert!(
        selector
            .select(category.id, tenant, Some("Software Engineer"))
            .is_none(),
        "under-review versions are invisible to selection"
    );

    approve_fully(&policy, tenant, created.id);

    let selected = selector
        .select(category.id, tenant, Some("Software Engineer"))
        .expect("approved version selected");
    assert_eq!(selected.id, created.id);

    // Selection is idempotent over unchanged state.
    let again = selector
        .select(category.id, tenant, Some("Software Engineer"))
        .expect("still selected");
    assert_eq!(again.id, selected.id);
}

#[test]
fn forked_edits_take_over_only_once_approved() {
    let store = Arc::new(MemoryStore::new());
    let leave = LeaveService::new(store.clone());
    let policy = PolicyService::new(store.clone());
    let selector = PolicySelector::new(store);
    let tenant = TenantId(Uuid::new_v4());
    let hr = actor("Asha Rao", "HR Manager");

    let category = leave
        .create_category(
            tenant,
            CategoryDraft {
                name: LeaveType::Annual,
                description: String::new(),
                is_active: true,
                default_entitlement_days: 20,
                max_carry_forward: 10,
                max_encashment_days: 5,
                requires_documentation: false,
                documentation_threshold_days: 3,
                notice_period_days: 1,
                monthly_limit: 2,
            },
        )
        .expect("category created");

    let v1 = policy
        .create(tenant, &hr, leave_policy("Standard Leave Policy"))
        .expect("v1 created");
    approve_fully(&policy, tenant, v1.id);

    let fork = policy
        .update(
            tenant,
            v1.id,
            &hr,
            PolicyUpdate {
                notice_period: Some(7),
                ..PolicyUpdate::default()
            },
        )
        .expect("forked");
    assert_eq!(fork.version, "v1.1");

    let governing = selector
        .select(category.id, tenant, Some("Software Engineer"))
        .expect("selection still works");
    assert_eq!(governing.id, v1.id, "the approved v1.0 keeps governing");

    approve_fully(&policy, tenant, fork.id);
    let governing = selector
        .select(category.id, tenant, Some("Software Engineer"))
        .expect("selection still works");
    assert_eq!(governing.id, fork.id, "the newest approved version wins");

    // The history walks back to the v1.0 root.
    let versions = policy
        .versions(tenant, "Standard Leave Policy")
        .expect("versions listed");
    let labels: Vec<&str> = versions.iter().map(|p| p.version.as_str()).collect();
    assert_eq!(labels, ["v1.1", "v1.0"]);
    assert_eq!(versions[0].parent_policy_id, Some(v1.id));
}

#[tokio::test]
async fn policy_routes_drive_the_lifecycle_over_http() {
    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(PolicyService::new(store));
    let router = policy_router(service.clone());
    let tenant = TenantId(Uuid::new_v4());
    let hr = actor("Asha Rao", "HR Manager");

    let request = axum::http::Request::post("/api/v1/policies")
        .header("x-tenant-id", tenant.0.to_string())
        .header("x-employee-id", hr.employee_id.0.to_string())
        .header("x-employee-role", "HR Manager")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&leave_policy("Standard Leave Policy")).expect("serializes"),
        ))
        .expect("request builds");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
    assert_eq!(payload["version"], serde_json::json!("v1.0"));
    assert_eq!(payload["status"], serde_json::json!("under_review"));
    let policy_id = payload["id"].as_str().expect("policy id").to_string();

    let chro = actor("Daniel Okafor", "Chief Human Resource Officer");
    for (who, role) in [
        (&hr, "HR Manager"),
        (&chro, "Chief Human Resource Officer"),
    ] {
        let request = axum::http::Request::post(format!(
            "/api/v1/policies/{policy_id}/decision"
        ))
        .header("x-tenant-id", tenant.0.to_string())
        .header("x-employee-id", who.employee_id.0.to_string())
        .header("x-employee-role", role)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&serde_json::json!({ "action": "approve" })).expect("serializes"),
        ))
        .expect("request builds");

        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("route executes");
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    let policies = service.list(tenant).expect("list");
    assert_eq!(policies.len(), 1);
    assert_eq!(policies[0].status, PolicyStatus::Active);
    assert!(policies[0].is_approved);
}
