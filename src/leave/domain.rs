use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::policy::domain::PolicyId;

/// Identifier of an isolated organization. Every store query is keyed by it;
/// rows from one tenant must never be visible to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub Uuid);

/// The named leave buckets a tenant can configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Annual,
    Sick,
    Casual,
    Maternity,
    Paternity,
    Sabbatical,
    Unpaid,
}

impl LeaveType {
    pub const fn label(self) -> &'static str {
        match self {
            LeaveType::Annual => "annual",
            LeaveType::Sick => "sick",
            LeaveType::Casual => "casual",
            LeaveType::Maternity => "maternity",
            LeaveType::Paternity => "paternity",
            LeaveType::Sabbatical => "sabbatical",
            LeaveType::Unpaid => "unpaid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "annual" => Some(LeaveType::Annual),
            "sick" => Some(LeaveType::Sick),
            "casual" => Some(LeaveType::Casual),
            "maternity" => Some(LeaveType::Maternity),
            "paternity" => Some(LeaveType::Paternity),
            "sabbatical" => Some(LeaveType::Sabbatical),
            "unpaid" => Some(LeaveType::Unpaid),
            _ => None,
        }
    }
}

/// Tenant-configurable leave bucket with its policy defaults.
/// Unique per (tenant, name); created and edited by HR, never auto-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveCategory {
    pub id: CategoryId,
    pub tenant_id: TenantId,
    pub name: LeaveType,
    pub description: String,
    pub is_active: bool,
    pub default_entitlement_days: u32,
    pub max_carry_forward: u32,
    pub max_encashment_days: u32,
    pub requires_documentation: bool,
    pub documentation_threshold_days: u32,
    pub notice_period_days: u32,
    pub monthly_limit: u32,
    pub created_at: DateTime<Utc>,
}

/// Parameters HR supplies when creating or editing a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: LeaveType,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub default_entitlement_days: u32,
    #[serde(default)]
    pub max_carry_forward: u32,
    #[serde(default)]
    pub max_encashment_days: u32,
    #[serde(default)]
    pub requires_documentation: bool,
    #[serde(default = "default_doc_threshold")]
    pub documentation_threshold_days: u32,
    #[serde(default = "default_notice_days")]
    pub notice_period_days: u32,
    #[serde(default = "default_monthly_limit")]
    pub monthly_limit: u32,
}

fn default_true() -> bool {
    true
}

fn default_doc_threshold() -> u32 {
    3
}

fn default_notice_days() -> u32 {
    1
}

fn default_monthly_limit() -> u32 {
    2
}

impl CategoryDraft {
    pub fn into_category(self, tenant_id: TenantId, now: DateTime<Utc>) -> LeaveCategory {
        LeaveCategory {
            id: CategoryId(Uuid::new_v4()),
            tenant_id,
            name: self.name,
            description: self.description,
            is_active: self.is_active,
            default_entitlement_days: self.default_entitlement_days,
            max_carry_forward: self.max_carry_forward,
            max_encashment_days: self.max_encashment_days,
            requires_documentation: self.requires_documentation,
            documentation_threshold_days: self.documentation_threshold_days,
            notice_period_days: self.notice_period_days,
            monthly_limit: self.monthly_limit,
            created_at: now,
        }
    }
}

/// Lifecycle of one leave application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Pending,
    Approved,
    ApprovedUnpaid,
    Rejected,
    Cancelled,
    PartiallyApproved,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::ApprovedUnpaid => "approved_unpaid",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Cancelled => "cancelled",
            ApplicationStatus::PartiallyApproved => "partially_approved",
        }
    }

    /// Whether the application still occupies its date range for overlap
    /// and monthly-limit counting.
    pub const fn counts_against_quota(self) -> bool {
        matches!(self, ApplicationStatus::Pending | ApplicationStatus::Approved)
    }

    /// Only draft and pending applications can be withdrawn by the employee.
    pub const fn cancellable(self) -> bool {
        matches!(self, ApplicationStatus::Draft | ApplicationStatus::Pending)
    }
}

/// One employee's request for a date range within one category, under the
/// policy resolved at creation time (immutable afterwards).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveApplication {
    pub id: ApplicationId,
    pub tenant_id: TenantId,
    /// Human-facing code (`LA-XXXXXXXX`), unique across tenants.
    pub application_number: String,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub employee_email: String,
    pub department: String,
    pub position: String,
    pub leave_category_id: CategoryId,
    pub leave_policy_id: PolicyId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: Decimal,
    pub is_half_day: bool,
    pub reason: String,
    pub status: ApplicationStatus,
    pub document_required: bool,
    pub document_provided: bool,
    pub document_url: Option<String>,
    pub is_cancelled_by_employee: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub applied_at: DateTime<Utc>,
}

impl LeaveApplication {
    /// Inclusive-range intersection against another date window.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

/// Generate the human-facing application code, e.g. `LA-9F2C41AB`.
pub fn next_application_number() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("LA-{}", raw[..8].to_ascii_uppercase())
}

/// Status of one approval row (leave step or policy approval).
/// `Escalated` is reserved: the schema carries it but no transition
/// currently produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Escalated,
}

impl ApprovalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
            ApprovalStatus::Escalated => "escalated",
        }
    }
}

/// One level of the ordered approval chain for an application.
/// Unique per (application, level); created as an atomic batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub application_id: ApplicationId,
    pub level: u32,
    /// Unset for fallback rows whose approver is resolved later from the
    /// org chart; such rows are claimed by role at decision time.
    pub approver_id: Option<EmployeeId>,
    pub approver_name: String,
    pub approver_role: String,
    pub status: ApprovalStatus,
    pub comments: String,
    pub approved_at: Option<DateTime<Utc>>,
    pub escalated_to: Option<EmployeeId>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Key of one balance bucket. `month: None` is the annual bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BalanceKey {
    pub tenant_id: TenantId,
    pub employee_id: EmployeeId,
    pub leave_category_id: CategoryId,
    pub year: i32,
    pub month: Option<u32>,
}

/// Per-employee, per-category running total. `balance` is derived and must
/// be recomputed on every write, never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub key: BalanceKey,
    pub opening_balance: Decimal,
    pub accrued: Decimal,
    pub used: Decimal,
    pub carried_forward: Decimal,
    pub encashed: Decimal,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl LeaveBalance {
    pub fn zeroed(key: BalanceKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            opening_balance: Decimal::ZERO,
            accrued: Decimal::ZERO,
            used: Decimal::ZERO,
            carried_forward: Decimal::ZERO,
            encashed: Decimal::ZERO,
            balance: Decimal::ZERO,
            updated_at: now,
        }
    }

    /// balance = opening + accrued + carried_forward - used - encashed
    pub fn recompute(&mut self) {
        self.balance = self.opening_balance + self.accrued + self.carried_forward
            - self.used
            - self.encashed;
    }
}

/// Threaded comment on an application. Replies point at their parent;
/// ownership is exclusively by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveComment {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub application_id: ApplicationId,
    pub comment: String,
    pub author_id: EmployeeId,
    pub author_name: String,
    pub author_role: String,
    pub parent_comment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Per-request identity snapshot supplied by the external identity layer.
/// Threaded explicitly through every core call; never ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeContext {
    pub employee_id: EmployeeId,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

/// Inbound payload for a leave application submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveSubmission {
    pub leave_category_id: CategoryId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: Decimal,
    #[serde(default)]
    pub is_half_day: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub document_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_inclusive_on_both_ends() {
        let app = sample_application(
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
        );
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();

        assert!(app.overlaps(d(12), d(14)), "shared end day overlaps");
        assert!(app.overlaps(d(8), d(10)), "shared start day overlaps");
        assert!(app.overlaps(d(11), d(11)));
        assert!(!app.overlaps(d(13), d(20)));
        assert!(!app.overlaps(d(1), d(9)));
    }

    #[test]
    fn balance_recompute_derives_from_components() {
        let key = BalanceKey {
            tenant_id: TenantId(Uuid::new_v4()),
            employee_id: EmployeeId(Uuid::new_v4()),
            leave_category_id: CategoryId(Uuid::new_v4()),
            year: 2026,
            month: None,
        };
        let mut balance = LeaveBalance::zeroed(key, Utc::now());
        balance.opening_balance = Decimal::from(20);
        balance.accrued = Decimal::from(2);
        balance.carried_forward = Decimal::from(5);
        balance.used = Decimal::new(35, 1); // 3.5
        balance.encashed = Decimal::from(1);
        balance.recompute();

        assert_eq!(balance.balance, Decimal::new(225, 1)); // 22.5
    }

    #[test]
    fn application_number_shape() {
        let number = next_application_number();
        assert!(number.starts_with("LA-"));
        assert_eq!(number.len(), 11);
        assert!(number[3..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    fn sample_application(start: NaiveDate, end: NaiveDate) -> LeaveApplication {
        LeaveApplication {
            id: ApplicationId(Uuid::new_v4()),
            tenant_id: TenantId(Uuid::new_v4()),
            application_number: next_application_number(),
            employee_id: EmployeeId(Uuid::new_v4()),
            employee_name: "Sam Carter".to_string(),
            employee_email: "sam@example.com".to_string(),
            department: "Engineering".to_string(),
            position: "Engineer".to_string(),
            leave_category_id: CategoryId(Uuid::new_v4()),
            leave_policy_id: PolicyId(Uuid::new_v4()),
            start_date: start,
            end_date: end,
            total_days: Decimal::from(3),
            is_half_day: false,
            reason: "trip".to_string(),
            status: ApplicationStatus::Pending,
            document_required: false,
            document_provided: false,
            document_url: None,
            is_cancelled_by_employee: false,
            cancelled_at: None,
            applied_at: Utc::now(),
        }
    }
}
