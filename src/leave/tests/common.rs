use std::sync::Arc;

use axum::response::Response;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::leave::domain::{
    next_application_number, ApplicationId, ApplicationStatus, BalanceKey, CategoryDraft,
    CategoryId, EmployeeContext, EmployeeId, LeaveApplication, LeaveBalance, LeaveCategory,
    LeaveSubmission, LeaveType, TenantId,
};
use crate::policy::domain::{Policy, PolicyId, PolicyStatus, PolicyType};
use crate::store::{LeaveStore, MemoryStore, PolicyStore};

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(crate) fn tenant() -> TenantId {
    TenantId(Uuid::new_v4())
}

pub(crate) fn employee(role: &str) -> EmployeeContext {
    EmployeeContext {
        employee_id: EmployeeId(Uuid::new_v4()),
        name: "Priya Shah".to_string(),
        email: "priya@example.com".to_string(),
        role: Some(role.to_string()),
        department: Some("Engineering".to_string()),
        position: Some(role.to_string()),
    }
}

/// An active, fully approved leave policy with every optional rule disabled.
/// Tests flip the rule fields they exercise.
pub(crate) fn approved_policy(tenant_id: TenantId, name: &str, version: &str) -> Policy {
    Policy {
        id: PolicyId(Uuid::new_v4()),
        tenant_id,
        policy_name: name.to_string(),
        version: version.to_string(),
        policy_type: PolicyType::LeaveTimeOff,
        description: String::new(),
        applies_to: Vec::new(),
        excludes: Vec::new(),
        entitlement: Vec::new(),
        carry_forward: 10,
        encashment: 5,
        notice_period: 0,
        limit_per_month: 0,
        document_required: false,
        approval_route: Vec::new(),
        status: PolicyStatus::Active,
        is_active: true,
        is_approved: true,
        approved_by: Some(EmployeeId(Uuid::new_v4())),
        approved_at: Some(Utc::now()),
        parent_policy_id: None,
        created_by: EmployeeId(Uuid::new_v4()),
        created_at: Utc::now(),
    }
}

pub(crate) fn category(tenant_id: TenantId, name: LeaveType) -> LeaveCategory {
    CategoryDraft {
        name,
        description: String::new(),
        is_active: true,
        default_entitlement_days: 20,
        max_carry_forward: 10,
        max_encashment_days: 5,
        requires_documentation: false,
        documentation_threshold_days: 3,
        notice_period_days: 1,
        monthly_limit: 2,
    }
    .into_category(tenant_id, Utc::now())
}

pub(crate) fn submission(
    leave_category_id: CategoryId,
    start: NaiveDate,
    end: NaiveDate,
    total_days: Decimal,
) -> LeaveSubmission {
    LeaveSubmission {
        leave_category_id,
        start_date: start,
        end_date: end,
        total_days,
        is_half_day: false,
        reason: "personal".to_string(),
        document_url: None,
    }
}

pub(crate) fn application(
    fixture: &Fixture,
    employee_id: EmployeeId,
    start: NaiveDate,
    end: NaiveDate,
    status: ApplicationStatus,
) -> LeaveApplication {
    LeaveApplication {
        id: ApplicationId(Uuid::new_v4()),
        tenant_id: fixture.tenant,
        application_number: next_application_number(),
        employee_id,
        employee_name: "Priya Shah".to_string(),
        employee_email: "priya@example.com".to_string(),
        department: "Engineering".to_string(),
        position: "Software Engineer".to_string(),
        leave_category_id: fixture.category.id,
        leave_policy_id: fixture.policy.id,
        start_date: start,
        end_date: end,
        total_days: Decimal::from((end - start).num_days() + 1),
        is_half_day: false,
        reason: "personal".to_string(),
        status,
        document_required: false,
        document_provided: false,
        document_url: None,
        is_cancelled_by_employee: false,
        cancelled_at: None,
        applied_at: Utc::now(),
    }
}

/// A tenant with one active annual category and one approved leave policy.
pub(crate) struct Fixture {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) tenant: TenantId,
    pub(crate) category: LeaveCategory,
    pub(crate) policy: Policy,
}

pub(crate) fn fixture() -> Fixture {
    fixture_with(LeaveType::Annual)
}

pub(crate) fn fixture_with(name: LeaveType) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let tenant = tenant();
    let category = store
        .insert_category(category(tenant, name))
        .expect("category inserted");
    let policy = store
        .insert_policy(approved_policy(tenant, "Standard Leave Policy", "v1.0"))
        .expect("policy inserted");
    Fixture {
        store,
        tenant,
        category,
        policy,
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Request builder with the identity headers the gateway would attach.
pub(crate) fn authed_request(
    method: &str,
    uri: &str,
    tenant_id: TenantId,
    who: &EmployeeContext,
    body: Option<Value>,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("x-tenant-id", who_header(tenant_id.0))
        .header("x-employee-id", who_header(who.employee_id.0))
        .header("x-employee-name", who.name.clone())
        .header("x-employee-email", who.email.clone());
    if let Some(role) = &who.role {
        builder = builder.header("x-employee-role", role.clone());
    }
    if let Some(department) = &who.department {
        builder = builder.header("x-employee-department", department.clone());
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(axum::http::header::CONTENT_TYPE, "application/json");
            axum::body::Body::from(serde_json::to_vec(&value).expect("serialize body"))
        }
        None => axum::body::Body::empty(),
    };
    builder.body(body).expect("request builds")
}

fn who_header(id: Uuid) -> String {
    id.to_string()
}

pub(crate) fn seed_balance(
    store: &MemoryStore,
    tenant_id: TenantId,
    employee_id: EmployeeId,
    leave_category_id: CategoryId,
    year: i32,
    opening_days: i64,
) -> LeaveBalance {
    let key = BalanceKey {
        tenant_id,
        employee_id,
        leave_category_id,
        year,
        month: None,
    };
    let mut balance = LeaveBalance::zeroed(key, Utc::now());
    balance.opening_balance = Decimal::from(opening_days);
    store.put_balance(balance).expect("balance seeded")
}
