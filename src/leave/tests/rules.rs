use super::common::*;
use crate::leave::domain::LeaveType;
use crate::leave::validation::rules;
use crate::leave::validation::RequiredAction;
use rust_decimal::Decimal;

#[test]
fn documentation_comes_from_policy_flag() {
    let tenant = tenant();
    let mut policy = approved_policy(tenant, "P", "v1.0");
    policy.document_required = true;
    let category = category(tenant, LeaveType::Casual);

    let message =
        rules::documentation_requirement(LeaveType::Casual, Decimal::from(1), &policy, &category);
    assert_eq!(message.as_deref(), Some("Documentation required by policy"));
}

#[test]
fn long_sick_leave_requires_medical_certificate() {
    let tenant = tenant();
    let policy = approved_policy(tenant, "P", "v1.0");
    let category = category(tenant, LeaveType::Sick);

    assert!(
        rules::documentation_requirement(LeaveType::Sick, Decimal::from(3), &policy, &category)
            .is_none(),
        "three days is within the certificate-free window"
    );
    let message =
        rules::documentation_requirement(LeaveType::Sick, Decimal::from(4), &policy, &category);
    assert_eq!(
        message.as_deref(),
        Some("Sick leave exceeding 3 days requires medical certificate")
    );
}

#[test]
fn category_threshold_overrides_earlier_messages() {
    let tenant = tenant();
    let mut policy = approved_policy(tenant, "P", "v1.0");
    policy.document_required = true;
    let mut category = category(tenant, LeaveType::Annual);
    category.requires_documentation = true;
    category.documentation_threshold_days = 5;

    let message =
        rules::documentation_requirement(LeaveType::Annual, Decimal::from(5), &policy, &category);
    assert_eq!(
        message.as_deref(),
        Some("annual leave exceeding 5 days requires documentation")
    );
}

#[test]
fn monthly_limit_zero_disables_the_check() {
    assert!(rules::monthly_limit_exceeded(10, 0).is_none());
    assert!(rules::monthly_limit_exceeded(1, 2).is_none());
    assert!(rules::monthly_limit_exceeded(2, 2).is_some());
}

#[test]
fn notice_window_counts_calendar_days() {
    let today = date(2026, 6, 1);
    assert!(rules::insufficient_notice(date(2026, 6, 4), today, 3).is_none());
    let message = rules::insufficient_notice(date(2026, 6, 3), today, 3);
    assert_eq!(
        message.as_deref(),
        Some("Leave must be applied at least 3 days in advance. Current notice: 2 days")
    );
    assert!(rules::insufficient_notice(date(2026, 6, 1), today, 0).is_none());
}

#[test]
fn blackout_warnings_only_apply_to_annual_leave() {
    let december = rules::blackout_warnings(date(2026, 12, 20), date(2026, 12, 24), LeaveType::Annual);
    assert_eq!(december.len(), 1);

    let year_end = rules::blackout_warnings(date(2026, 12, 28), date(2027, 1, 3), LeaveType::Annual);
    assert_eq!(year_end.len(), 2, "year boundary and December both warn");

    assert!(rules::blackout_warnings(date(2026, 12, 20), date(2026, 12, 24), LeaveType::Sick)
        .is_empty());
}

#[test]
fn interns_cannot_take_annual_or_casual_leave() {
    let errors = rules::employment_restrictions(Some("Engineering Intern"), LeaveType::Annual);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, rules::ERR_PROBATION_RESTRICTION);

    assert!(rules::employment_restrictions(Some("Engineering Intern"), LeaveType::Sick).is_empty());
    assert!(rules::employment_restrictions(None, LeaveType::Annual).is_empty());
}

#[test]
fn sabbatical_is_reserved_for_senior_roles() {
    let errors = rules::employment_restrictions(Some("Junior Engineer"), LeaveType::Sabbatical);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, rules::ERR_ROLE_RESTRICTION);

    assert!(rules::employment_restrictions(Some("Senior Engineer"), LeaveType::Sabbatical)
        .is_empty());
    assert!(rules::employment_restrictions(Some("Tech Lead"), LeaveType::Sabbatical).is_empty());
}

#[test]
fn certificate_arms_are_mutually_exclusive() {
    assert_eq!(
        rules::certificate_action(LeaveType::Sick, Decimal::from(5)),
        Some(RequiredAction::RequireMedicalCertificate)
    );
    assert_eq!(
        rules::certificate_action(LeaveType::Maternity, Decimal::from(90)),
        Some(RequiredAction::RequireBirthCertificate)
    );
    assert_eq!(
        rules::certificate_action(LeaveType::Annual, Decimal::from(15)),
        Some(RequiredAction::RequireFitnessCertificate)
    );
    assert_eq!(rules::certificate_action(LeaveType::Annual, Decimal::from(14)), None);
    assert_eq!(rules::certificate_action(LeaveType::Sick, Decimal::from(2)), None);
}

#[test]
fn default_route_levels_are_positional() {
    let route = rules::default_approval_route(Some("Software Engineer"), LeaveType::Casual);
    assert_eq!(route.len(), 1);
    assert_eq!(route[0].approver_role, "Manager");

    let route = rules::default_approval_route(Some("Senior Engineer"), LeaveType::Annual);
    let roles: Vec<&str> = route.iter().map(|e| e.approver_role.as_str()).collect();
    assert_eq!(roles, ["Manager", "Department Head", "CFO"]);
    let levels: Vec<u32> = route.iter().map(|e| e.level).collect();
    assert_eq!(levels, [1, 2, 3]);

    let route = rules::default_approval_route(Some("Engineering Manager"), LeaveType::Paternity);
    let roles: Vec<&str> = route.iter().map(|e| e.approver_role.as_str()).collect();
    assert_eq!(roles, ["Manager", "Department Head", "HR Manager"]);
}

#[test]
fn month_window_is_inclusive() {
    assert_eq!(
        rules::month_window(date(2026, 2, 14)),
        (date(2026, 2, 1), date(2026, 2, 28))
    );
    assert_eq!(
        rules::month_window(date(2026, 12, 5)),
        (date(2026, 12, 1), date(2026, 12, 31))
    );
}
