use super::common::*;
use crate::leave::workflow::ApprovalAction;
use crate::policy::approval::PolicyReviewOutcome;
use crate::policy::domain::{PolicyRuleError, PolicyStatus, PolicyUpdate};
use crate::policy::service::{PolicyService, PolicyServiceError};
use crate::store::PolicyStore;

#[test]
fn create_validates_the_draft_first() {
    let service = PolicyService::new(store());
    let tenant = tenant();
    let author = employee("HR Manager");

    let mut bad = draft("Standard Leave Policy");
    bad.carry_forward = 366;
    let err = service.create(tenant, &author, bad).expect_err("rejected");
    assert!(matches!(
        err,
        PolicyServiceError::Rule(PolicyRuleError::CarryForwardTooLarge)
    ));

    let mut bad = draft("Standard Leave Policy");
    bad.encashment = 20;
    bad.carry_forward = 10;
    let err = service.create(tenant, &author, bad).expect_err("rejected");
    assert!(matches!(
        err,
        PolicyServiceError::Rule(PolicyRuleError::EncashmentExceedsCarryForward)
    ));
}

#[test]
fn create_opens_the_review_hierarchy() {
    let store = store();
    let service = PolicyService::new(store.clone());
    let tenant = tenant();
    let author = employee("HR Manager");

    let policy = service
        .create(tenant, &author, draft("Standard Leave Policy"))
        .expect("created");

    assert_eq!(policy.status, PolicyStatus::UnderReview);
    let reviews = service.reviews_for(tenant, policy.id).expect("reviews");
    assert_eq!(reviews.len(), 2);
}

fn approve_fully(
    service: &PolicyService<crate::store::MemoryStore>,
    tenant: crate::leave::domain::TenantId,
    policy_id: crate::policy::domain::PolicyId,
) {
    let hr = employee("HR Manager");
    let chro = employee("Chief Human Resource Officer");
    for reviewer in [&hr, &chro] {
        let outcome = service
            .decide(tenant, policy_id, reviewer, ApprovalAction::Approve, None)
            .expect("review applied");
        assert!(matches!(outcome, PolicyReviewOutcome::Decided { .. }));
    }
}

#[test]
fn updating_an_approved_policy_forks_a_new_version() {
    let store = store();
    let service = PolicyService::new(store.clone());
    let tenant = tenant();
    let author = employee("HR Manager");

    let v1 = service
        .create(tenant, &author, draft("Standard Leave Policy"))
        .expect("created");
    approve_fully(&service, tenant, v1.id);

    let forked = service
        .update(
            tenant,
            v1.id,
            &author,
            PolicyUpdate {
                carry_forward: Some(15),
                ..PolicyUpdate::default()
            },
        )
        .expect("updated");

    assert_eq!(forked.version, "v1.1");
    assert_eq!(forked.parent_policy_id, Some(v1.id));
    assert_eq!(forked.carry_forward, 15);
    assert_eq!(forked.status, PolicyStatus::UnderReview);

    // The fork gets its own review hierarchy; the original keeps governing.
    let reviews = service.reviews_for(tenant, forked.id).expect("reviews");
    assert_eq!(reviews.len(), 2);
    let original = service.policy(tenant, v1.id).expect("lookup");
    assert!(original.is_approved);
    assert_eq!(original.carry_forward, 10);
}

#[test]
fn updating_an_unapproved_policy_rewrites_in_place() {
    let store = store();
    let service = PolicyService::new(store.clone());
    let tenant = tenant();
    let author = employee("HR Manager");

    let v1 = service
        .create(tenant, &author, draft("Standard Leave Policy"))
        .expect("created");

    let revised = service
        .update(
            tenant,
            v1.id,
            &author,
            PolicyUpdate {
                notice_period: Some(7),
                ..PolicyUpdate::default()
            },
        )
        .expect("updated");

    assert_eq!(revised.id, v1.id);
    assert_eq!(revised.version, "v1.0");
    assert_eq!(revised.notice_period, 7);
    assert_eq!(
        service.versions(tenant, "Standard Leave Policy").expect("versions").len(),
        1
    );
}

#[test]
fn update_rejects_rule_violations_against_the_merged_draft() {
    let service = PolicyService::new(store());
    let tenant = tenant();
    let author = employee("HR Manager");

    let v1 = service
        .create(tenant, &author, draft("Standard Leave Policy"))
        .expect("created");

    // carry_forward stays 10; raising encashment above it must fail.
    let err = service
        .update(
            tenant,
            v1.id,
            &author,
            PolicyUpdate {
                encashment: Some(12),
                ..PolicyUpdate::default()
            },
        )
        .expect_err("rejected");
    assert!(matches!(
        err,
        PolicyServiceError::Rule(PolicyRuleError::EncashmentExceedsCarryForward)
    ));
}

#[test]
fn only_approved_versions_are_visible_to_selection() {
    let store = store();
    let service = PolicyService::new(store.clone());
    let tenant = tenant();
    let author = employee("HR Manager");

    let v1 = service
        .create(tenant, &author, draft("Standard Leave Policy"))
        .expect("created");
    assert!(store
        .active_approved_policies(tenant, Default::default())
        .expect("query")
        .is_empty());

    approve_fully(&service, tenant, v1.id);
    let visible = store
        .active_approved_policies(tenant, Default::default())
        .expect("query");
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, v1.id);
}

#[test]
fn version_history_lists_newest_first() {
    let store = store();
    let service = PolicyService::new(store.clone());
    let tenant = tenant();
    let author = employee("HR Manager");

    let v1 = service
        .create(tenant, &author, draft("Standard Leave Policy"))
        .expect("v1");
    approve_fully(&service, tenant, v1.id);
    let v2 = service
        .update(tenant, v1.id, &author, PolicyUpdate::default())
        .expect("v2");

    let versions = service
        .versions(tenant, "Standard Leave Policy")
        .expect("versions");
    let labels: Vec<&str> = versions.iter().map(|p| p.version.as_str()).collect();
    assert_eq!(labels, ["v1.1", "v1.0"]);
    assert_eq!(versions[0].id, v2.id);
}
