use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use leaveflow::error::AppError;
use leaveflow::leave::{
    ApprovalAction, CategoryDraft, EmployeeContext, EmployeeId, LeaveService, LeaveSubmission,
    LeaveType, ProcessOutcome, TenantId,
};
use leaveflow::leave::domain::BalanceKey;
use leaveflow::leave::service::BalanceSeed;
use leaveflow::policy::{PolicyDraft, PolicyReviewOutcome, PolicyService, RouteEntry};
use leaveflow::store::MemoryStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Leave start date (YYYY-MM-DD). Defaults to ten days from today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Number of leave days to request
    #[arg(long, default_value_t = 3)]
    pub(crate) days: u32,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn actor(name: &str, email: &str, role: &str) -> EmployeeContext {
    EmployeeContext {
        employee_id: EmployeeId(Uuid::new_v4()),
        name: name.to_string(),
        email: email.to_string(),
        role: Some(role.to_string()),
        department: Some("Engineering".to_string()),
        position: Some(role.to_string()),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = Local::now().date_naive();
    let start_date = args
        .start_date
        .unwrap_or_else(|| today + chrono::Duration::days(10));
    let days = args.days.max(1);
    let end_date = start_date + chrono::Duration::days(i64::from(days) - 1);

    println!("Leave management demo");

    let store = Arc::new(MemoryStore::default());
    let leave_service = LeaveService::new(store.clone());
    let policy_service = PolicyService::new(store);

    let tenant = TenantId(Uuid::new_v4());
    let hr_admin = actor("Asha Rao", "asha@example.com", "HR Manager");
    let chro = actor("Daniel Okafor", "daniel@example.com", "Chief Human Resource Officer");
    let manager = actor("Mei Lin", "mei@example.com", "Manager");
    let cfo = actor("Tomas Vega", "tomas@example.com", "CFO");
    let employee = actor("Priya Shah", "priya@example.com", "Software Engineer");

    println!("\n1. HR configures the annual leave category");
    let category = leave_service.create_category(
        tenant,
        CategoryDraft {
            name: LeaveType::Annual,
            description: "Paid annual leave".to_string(),
            is_active: true,
            default_entitlement_days: 20,
            max_carry_forward: 10,
            max_encashment_days: 5,
            requires_documentation: false,
            documentation_threshold_days: 3,
            notice_period_days: 1,
            monthly_limit: 2,
        },
    );
    let category = match category {
        Ok(category) => category,
        Err(err) => {
            println!("   category setup failed: {err}");
            return Ok(());
        }
    };
    println!("   created category '{}'", category.name.label());

    println!("\n2. HR seeds the employee's balance for {}", today.format("%Y"));
    let seeded = leave_service.seed_balance(
        tenant,
        BalanceSeed {
            employee_id: employee.employee_id,
            leave_category_id: category.id,
            year: today.year(),
            month: None,
            opening_balance: Decimal::from(20),
            accrued: Decimal::ZERO,
            used: Decimal::ZERO,
            carried_forward: Decimal::ZERO,
            encashed: Decimal::ZERO,
        },
    );
    match &seeded {
        Ok(balance) => println!("   available balance: {} days", balance.balance),
        Err(err) => {
            println!("   balance seeding failed: {err}");
            return Ok(());
        }
    }

    println!("\n3. HR drafts the leave policy and routes it for review");
    let policy = policy_service.create(
        tenant,
        &hr_admin,
        PolicyDraft {
            policy_name: "Standard Leave Policy".to_string(),
            policy_type: Default::default(),
            description: "Company-wide leave rules".to_string(),
            applies_to: Vec::new(),
            excludes: Vec::new(),
            entitlement: Vec::new(),
            carry_forward: 10,
            encashment: 5,
            notice_period: 3,
            limit_per_month: 2,
            document_required: false,
            approval_route: vec![
                RouteEntry {
                    level: 1,
                    approver_id: None,
                    approver_role: "Manager".to_string(),
                    approver_name: "Manager".to_string(),
                },
                RouteEntry {
                    level: 2,
                    approver_id: None,
                    approver_role: "CFO".to_string(),
                    approver_name: "CFO".to_string(),
                },
            ],
        },
    );
    let policy = match policy {
        Ok(policy) => policy,
        Err(err) => {
            println!("   policy creation failed: {err}");
            return Ok(());
        }
    };
    println!(
        "   created policy '{}' {} ({})",
        policy.policy_name,
        policy.version,
        policy.status.label()
    );

    for reviewer in [&hr_admin, &chro] {
        match policy_service.decide(tenant, policy.id, reviewer, ApprovalAction::Approve, None) {
            Ok(PolicyReviewOutcome::Decided { status }) => {
                println!("   {} approved -> {}", reviewer.name, status.label())
            }
            Ok(PolicyReviewOutcome::NoPendingApproval) => {
                println!("   {} had no pending review", reviewer.name)
            }
            Err(err) => {
                println!("   policy review failed: {err}");
                return Ok(());
            }
        }
    }

    println!("\n4. {} applies for {} days of annual leave", employee.name, days);
    let submitted = leave_service.submit(
        tenant,
        &employee,
        LeaveSubmission {
            leave_category_id: category.id,
            start_date,
            end_date,
            total_days: Decimal::from(days),
            is_half_day: false,
            reason: "Family trip".to_string(),
            document_url: None,
        },
    );
    let submitted = match submitted {
        Ok(submitted) => submitted,
        Err(err) => {
            println!("   submission rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "   application {} is {}",
        submitted.application.application_number,
        submitted.application.status.label()
    );
    for warning in &submitted.warnings {
        println!("   warning: {warning}");
    }

    println!("\n5. The approval chain signs off");
    for approver in [&manager, &cfo] {
        match leave_service.decide(
            tenant,
            submitted.application.id,
            approver,
            ApprovalAction::Approve,
            Some("Approved in demo"),
        ) {
            Ok(ProcessOutcome::Decided { status }) => {
                println!("   {} approved -> {}", approver.name, status.label())
            }
            Ok(ProcessOutcome::NoPendingStep) => {
                println!("   {} had no pending step", approver.name)
            }
            Err(err) => {
                println!("   approval failed: {err}");
                return Ok(());
            }
        }
    }

    let key = BalanceKey {
        tenant_id: tenant,
        employee_id: employee.employee_id,
        leave_category_id: category.id,
        year: today.year(),
        month: None,
    };
    match leave_service.balance(&key) {
        Ok(Some(balance)) => println!(
            "\nFinal balance: {} days remaining ({} used)",
            balance.balance, balance.used
        ),
        Ok(None) => println!("\nFinal balance unavailable"),
        Err(err) => println!("\nbalance lookup failed: {err}"),
    }

    Ok(())
}
