use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::leave::domain::{ApprovalStatus, EmployeeId, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyId(pub Uuid);

/// HR process areas a policy can govern. The leave engine only consults
/// `LeaveTimeOff` policies, but tenants file documents under all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    LeaveTimeOff,
    AttendanceTimesheet,
    CompensationPayroll,
    PerformanceManagement,
    RecruitmentOnboarding,
    TrainingDevelopment,
    HealthSafety,
    ComplianceLegal,
    BenefitsWellness,
    Other,
}

impl Default for PolicyType {
    fn default() -> Self {
        PolicyType::LeaveTimeOff
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Draft,
    UnderReview,
    Active,
    Rejected,
}

impl PolicyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PolicyStatus::Draft => "draft",
            PolicyStatus::UnderReview => "under_review",
            PolicyStatus::Active => "active",
            PolicyStatus::Rejected => "rejected",
        }
    }
}

/// One level of an ordered approval route. Levels are 1-based positions in
/// the route, not fixed numeric tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub level: u32,
    #[serde(default)]
    pub approver_id: Option<EmployeeId>,
    #[serde(default)]
    pub approver_role: String,
    #[serde(default)]
    pub approver_name: String,
}

/// A versioned, approvable ruleset scoped to one tenant and process area.
/// Unique per (tenant, policy_name, version). Once approved a row is
/// immutable; edits fork a new version instead (see the versioning engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub tenant_id: TenantId,
    pub policy_name: String,
    pub version: String,
    pub policy_type: PolicyType,
    pub description: String,
    /// Eligible roles; empty means the policy applies to everyone.
    pub applies_to: Vec<String>,
    /// Ineligible roles; takes precedence over `applies_to`.
    pub excludes: Vec<String>,
    /// Eligible employment types (Permanent, Probation, ...).
    pub entitlement: Vec<String>,
    pub carry_forward: u32,
    pub encashment: u32,
    pub notice_period: u32,
    pub limit_per_month: u32,
    pub document_required: bool,
    pub approval_route: Vec<RouteEntry>,
    pub status: PolicyStatus,
    pub is_active: bool,
    pub is_approved: bool,
    pub approved_by: Option<EmployeeId>,
    pub approved_at: Option<DateTime<Utc>>,
    /// Weak back-reference for version-history lookup, not ownership.
    pub parent_policy_id: Option<PolicyId>,
    pub created_by: EmployeeId,
    pub created_at: DateTime<Utc>,
}

/// Field-level rule violations on a policy payload.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyRuleError {
    #[error("carry forward cannot exceed 365 days")]
    CarryForwardTooLarge,
    #[error("encashment cannot exceed carry forward limit")]
    EncashmentExceedsCarryForward,
    #[error("policy name must not be empty")]
    EmptyName,
}

/// Payload for creating a policy. Versioning fields are engine-owned and
/// deliberately absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDraft {
    pub policy_name: String,
    #[serde(default)]
    pub policy_type: PolicyType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub applies_to: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub entitlement: Vec<String>,
    #[serde(default)]
    pub carry_forward: u32,
    #[serde(default)]
    pub encashment: u32,
    #[serde(default = "default_notice_period")]
    pub notice_period: u32,
    #[serde(default = "default_limit_per_month")]
    pub limit_per_month: u32,
    #[serde(default)]
    pub document_required: bool,
    #[serde(default)]
    pub approval_route: Vec<RouteEntry>,
}

fn default_notice_period() -> u32 {
    3
}

fn default_limit_per_month() -> u32 {
    2
}

impl PolicyDraft {
    pub fn validate(&self) -> Result<(), PolicyRuleError> {
        if self.policy_name.trim().is_empty() {
            return Err(PolicyRuleError::EmptyName);
        }
        if self.carry_forward > 365 {
            return Err(PolicyRuleError::CarryForwardTooLarge);
        }
        if self.encashment > self.carry_forward {
            return Err(PolicyRuleError::EncashmentExceedsCarryForward);
        }
        Ok(())
    }
}

/// Partial update applied to a policy. Fields left `None` keep the value of
/// the row being edited; on approved policies the merge feeds the fork.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyUpdate {
    pub description: Option<String>,
    pub applies_to: Option<Vec<String>>,
    pub excludes: Option<Vec<String>>,
    pub entitlement: Option<Vec<String>>,
    pub carry_forward: Option<u32>,
    pub encashment: Option<u32>,
    pub notice_period: Option<u32>,
    pub limit_per_month: Option<u32>,
    pub document_required: Option<bool>,
    pub approval_route: Option<Vec<RouteEntry>>,
}

impl PolicyUpdate {
    /// Merge the existing row's business fields with the override set,
    /// producing the draft for a forked version.
    pub fn merged_with(&self, existing: &Policy) -> PolicyDraft {
        PolicyDraft {
            policy_name: existing.policy_name.clone(),
            policy_type: existing.policy_type,
            description: self
                .description
                .clone()
                .unwrap_or_else(|| existing.description.clone()),
            applies_to: self
                .applies_to
                .clone()
                .unwrap_or_else(|| existing.applies_to.clone()),
            excludes: self
                .excludes
                .clone()
                .unwrap_or_else(|| existing.excludes.clone()),
            entitlement: self
                .entitlement
                .clone()
                .unwrap_or_else(|| existing.entitlement.clone()),
            carry_forward: self.carry_forward.unwrap_or(existing.carry_forward),
            encashment: self.encashment.unwrap_or(existing.encashment),
            notice_period: self.notice_period.unwrap_or(existing.notice_period),
            limit_per_month: self.limit_per_month.unwrap_or(existing.limit_per_month),
            document_required: self.document_required.unwrap_or(existing.document_required),
            approval_route: self
                .approval_route
                .clone()
                .unwrap_or_else(|| existing.approval_route.clone()),
        }
    }
}

/// One row of the fixed two-level policy approval hierarchy.
/// Unique per (policy, approver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyApproval {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub policy_id: PolicyId,
    pub level: u32,
    /// Unset until resolved from the org structure; claimed by role when a
    /// matching approver acts.
    pub approver_id: Option<EmployeeId>,
    pub approver_role: String,
    pub status: ApprovalStatus,
    pub comments: String,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
