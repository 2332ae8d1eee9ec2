//! Named policy-rule predicates.
//!
//! Each rule is a standalone pure function over already-fetched data so it
//! can be unit tested and swapped out independently; the validator in the
//! parent module owns the store lookups and accumulation. The role checks
//! are substring predicates over free-form designation strings, pending a
//! role-capability model.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::leave::domain::{LeaveBalance, LeaveCategory, LeaveType};
use crate::policy::domain::{Policy, RouteEntry};

use super::RequiredAction;

pub const ERR_REQUIRED_FIELDS: &str = "required_fields";
pub const ERR_CATEGORY: &str = "category";
pub const ERR_POLICY: &str = "policy";
pub const ERR_DOCUMENTATION: &str = "documentation";
pub const ERR_BALANCE_NOT_FOUND: &str = "balance_not_found";
pub const ERR_INSUFFICIENT_BALANCE: &str = "insufficient_balance";
pub const ERR_OVERLAP: &str = "overlap";
pub const ERR_MONTHLY_LIMIT: &str = "monthly_limit_exceeded";
pub const ERR_INSUFFICIENT_NOTICE: &str = "insufficient_notice";
pub const ERR_PROBATION_RESTRICTION: &str = "probation_restriction";
pub const ERR_ROLE_RESTRICTION: &str = "role_restriction";

const SICK_CERTIFICATE_THRESHOLD_DAYS: u32 = 3;
const FITNESS_CERTIFICATE_THRESHOLD_DAYS: u32 = 14;

fn role_contains(role: &str, needle: &str) -> bool {
    role.to_ascii_lowercase().contains(needle)
}

pub fn is_intern(role: &str) -> bool {
    role_contains(role, "intern")
}

/// Roles eligible for sabbatical leave.
pub fn is_senior_role(role: &str) -> bool {
    ["manager", "senior", "lead"]
        .iter()
        .any(|needle| role_contains(role, needle))
}

/// Roles whose requests also pass through the department head.
pub fn needs_department_head(role: &str) -> bool {
    ["senior", "lead", "manager", "director"]
        .iter()
        .any(|needle| role_contains(role, needle))
}

/// Documentation requirement from policy flag, sick-leave duration, or the
/// category's own threshold. Returns the reason when documentation is
/// required; later reasons override earlier ones in the message, matching
/// the order the checks are applied.
pub fn documentation_requirement(
    leave_type: LeaveType,
    total_days: Decimal,
    policy: &Policy,
    category: &LeaveCategory,
) -> Option<String> {
    let mut message = None;

    if policy.document_required {
        message = Some("Documentation required by policy".to_string());
    }

    if leave_type == LeaveType::Sick && total_days > Decimal::from(SICK_CERTIFICATE_THRESHOLD_DAYS)
    {
        message = Some(format!(
            "Sick leave exceeding {SICK_CERTIFICATE_THRESHOLD_DAYS} days requires medical certificate"
        ));
    }

    if category.requires_documentation
        && total_days >= Decimal::from(category.documentation_threshold_days)
    {
        message = Some(format!(
            "{} leave exceeding {} days requires documentation",
            leave_type.label(),
            category.documentation_threshold_days
        ));
    }

    message
}

/// Balance validation for annual leave. A missing row and an insufficient
/// row are distinct error keys.
pub fn balance_shortfall(
    balance: Option<&LeaveBalance>,
    requested_days: Decimal,
) -> Option<(&'static str, String)> {
    match balance {
        None => Some((
            ERR_BALANCE_NOT_FOUND,
            "Leave balance not found for current year".to_string(),
        )),
        Some(balance) if requested_days > balance.balance => Some((
            ERR_INSUFFICIENT_BALANCE,
            format!(
                "Insufficient leave balance. Requested: {} days, Available: {} days",
                requested_days, balance.balance
            ),
        )),
        Some(_) => None,
    }
}

/// A zero limit disables the check; otherwise a count already at the limit
/// blocks further applications this month.
pub fn monthly_limit_exceeded(existing_count: usize, limit_per_month: u32) -> Option<String> {
    if limit_per_month == 0 {
        return None;
    }
    if existing_count >= limit_per_month as usize {
        return Some(format!(
            "Monthly limit of {limit_per_month} applications exceeded for this leave type"
        ));
    }
    None
}

/// A zero notice period disables the check.
pub fn insufficient_notice(
    start_date: NaiveDate,
    today: NaiveDate,
    notice_period: u32,
) -> Option<String> {
    if notice_period == 0 {
        return None;
    }
    let days_notice = (start_date - today).num_days();
    if days_notice < notice_period as i64 {
        return Some(format!(
            "Leave must be applied at least {notice_period} days in advance. Current notice: {days_notice} days"
        ));
    }
    None
}

/// Advisory blackout warnings for annual leave; never blocks.
pub fn blackout_warnings(
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_type: LeaveType,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if leave_type != LeaveType::Annual {
        return warnings;
    }

    if start_date.year() != end_date.year() {
        warnings
            .push("Leave spans year-end - may be subject to blackout restrictions".to_string());
    }

    if start_date.month() == 12 || end_date.month() == 12 {
        warnings.push("December is typically a blackout period for annual leave".to_string());
    }

    warnings
}

/// Employment-based restrictions derived from the role designation.
pub fn employment_restrictions(
    employee_role: Option<&str>,
    leave_type: LeaveType,
) -> Vec<(&'static str, String)> {
    let mut errors = Vec::new();
    let Some(role) = employee_role else {
        return errors;
    };

    if is_intern(role) && matches!(leave_type, LeaveType::Annual | LeaveType::Casual) {
        errors.push((
            ERR_PROBATION_RESTRICTION,
            format!(
                "Employees on probation cannot apply for {} leave",
                leave_type.label()
            ),
        ));
    }

    if leave_type == LeaveType::Sabbatical && !is_senior_role(role) {
        errors.push((
            ERR_ROLE_RESTRICTION,
            "Sabbatical leave is typically reserved for senior roles".to_string(),
        ));
    }

    errors
}

/// Certificate follow-up for the request, if any. The arms are mutually
/// exclusive, checked in priority order.
pub fn certificate_action(leave_type: LeaveType, total_days: Decimal) -> Option<RequiredAction> {
    if leave_type == LeaveType::Sick && total_days > Decimal::from(SICK_CERTIFICATE_THRESHOLD_DAYS)
    {
        Some(RequiredAction::RequireMedicalCertificate)
    } else if matches!(leave_type, LeaveType::Maternity | LeaveType::Paternity) {
        Some(RequiredAction::RequireBirthCertificate)
    } else if total_days > Decimal::from(FITNESS_CERTIFICATE_THRESHOLD_DAYS) {
        Some(RequiredAction::RequireFitnessCertificate)
    } else {
        None
    }
}

/// Default approval chain when the policy carries no route of its own.
/// Levels are assigned by position, so optional levels shift the ones
/// appended after them.
pub fn default_approval_route(
    employee_role: Option<&str>,
    leave_type: LeaveType,
) -> Vec<RouteEntry> {
    let mut route = vec![RouteEntry {
        level: 1,
        approver_id: None,
        approver_role: "Manager".to_string(),
        approver_name: "Direct Manager".to_string(),
    }];

    if employee_role.map(needs_department_head).unwrap_or(false) {
        route.push(RouteEntry {
            level: 2,
            approver_id: None,
            approver_role: "Department Head".to_string(),
            approver_name: "Department Head".to_string(),
        });
    }

    if matches!(
        leave_type,
        LeaveType::Maternity | LeaveType::Paternity | LeaveType::Sabbatical
    ) {
        route.push(RouteEntry {
            level: route.len() as u32 + 1,
            approver_id: None,
            approver_role: "HR Manager".to_string(),
            approver_name: "HR Manager".to_string(),
        });
    }

    // Annual leave can carry an encashment cost, so finance signs off last.
    if leave_type == LeaveType::Annual {
        route.push(RouteEntry {
            level: route.len() as u32 + 1,
            approver_id: None,
            approver_role: "CFO".to_string(),
            approver_name: "Chief Financial Officer".to_string(),
        });
    }

    route
}

/// Inclusive month window containing `date`.
pub fn month_window(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let month_start = date.with_day(1).unwrap_or(date);
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    let month_end = next_month
        .map(|d| d - chrono::Duration::days(1))
        .unwrap_or(date);
    (month_start, month_end)
}
