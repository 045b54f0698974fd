use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::billing::{EntitlementKind, SubscribeRequest, SubscriptionStatus};
use crate::error::ServiceError;
use crate::test_support::*;
use crate::users::Role;

fn subscribe(code: &str) -> SubscribeRequest {
    SubscribeRequest {
        plan_code: code.to_string(),
    }
}

#[test]
fn subscribe_sets_balances_from_plan_quotas() {
    let harness = Harness::new();
    let agency = harness.verified("hq@agency.test", Role::Agency);

    let view = harness
        .services
        .billing
        .subscribe(&agency, subscribe("agency_free"))
        .expect("subscription activated");

    assert_eq!(view.plan.code, "AGENCY_FREE");
    assert_eq!(view.subscription.status, SubscriptionStatus::Active);
    assert_eq!(
        harness
            .services
            .billing
            .balance(agency.id, EntitlementKind::JobPost)
            .expect("balance"),
        1
    );
    assert_eq!(
        harness
            .services
            .billing
            .balance(agency.id, EntitlementKind::ContactRequest)
            .expect("balance"),
        3
    );
}

#[test]
fn subscribe_checks_plan_and_audience() {
    let harness = Harness::new();
    let talent = harness.verified("ti@talent.test", Role::Talent);

    assert!(matches!(
        harness.services.billing.subscribe(&talent, subscribe("GOLD")),
        Err(ServiceError::NotFound("plan"))
    ));
    assert!(matches!(
        harness
            .services
            .billing
            .subscribe(&talent, subscribe("AGENCY_PRO")),
        Err(ServiceError::Forbidden(_))
    ));
}

#[test]
fn resubscribing_to_the_same_plan_conflicts() {
    let harness = Harness::new();
    let agency = harness.agency("dup@agency.test", "AGENCY_PRO");

    assert!(matches!(
        harness
            .services
            .billing
            .subscribe(&agency, subscribe("AGENCY_PRO")),
        Err(ServiceError::Conflict(_))
    ));
}

#[test]
fn switching_plans_cancels_previous_and_resets_balances() {
    let harness = Harness::new();
    let agency = harness.agency("switch@agency.test", "AGENCY_FREE");
    harness.post_job(&agency, "Background extras");
    assert_eq!(
        harness
            .services
            .billing
            .balance(agency.id, EntitlementKind::JobPost)
            .expect("balance"),
        0
    );

    let view = harness
        .services
        .billing
        .subscribe(&agency, subscribe("AGENCY_PRO"))
        .expect("plan switched");
    assert_eq!(view.plan.code, "AGENCY_PRO");

    let current = harness.services.billing.current(&agency).expect("current plan");
    assert_eq!(current.subscription.id, view.subscription.id);
    assert_eq!(
        harness
            .services
            .billing
            .balance(agency.id, EntitlementKind::JobPost)
            .expect("balance"),
        20
    );
}

#[test]
fn consume_refuses_when_balance_is_short() {
    let harness = Harness::new();
    let agency = harness.agency("short@agency.test", "AGENCY_FREE");
    let billing = &harness.services.billing;

    assert_eq!(
        billing
            .consume(agency.id, EntitlementKind::ContactRequest, 2)
            .expect("two of three"),
        1
    );
    match billing.consume(agency.id, EntitlementKind::ContactRequest, 2) {
        Err(ServiceError::InsufficientEntitlement {
            kind,
            required,
            available,
        }) => {
            assert_eq!(kind, EntitlementKind::ContactRequest);
            assert_eq!(required, 2);
            assert_eq!(available, 1);
        }
        other => panic!("expected insufficient entitlement, got {other:?}"),
    }
    assert_eq!(
        billing
            .balance(agency.id, EntitlementKind::ContactRequest)
            .expect("balance"),
        1
    );

    assert!(matches!(
        billing.consume(agency.id, EntitlementKind::ContactRequest, 0),
        Err(ServiceError::Validation(_))
    ));
}

#[test]
fn consume_without_subscription_is_insufficient() {
    let harness = Harness::new();
    let agency = harness.verified("none@agency.test", Role::Agency);
    assert!(matches!(
        harness
            .services
            .billing
            .consume(agency.id, EntitlementKind::JobPost, 1),
        Err(ServiceError::InsufficientEntitlement { available: 0, .. })
    ));
}

#[test]
fn cancel_zeroes_balances() {
    let harness = Harness::new();
    let agency = harness.agency("cancel@agency.test", "AGENCY_PRO");

    let canceled = harness.services.billing.cancel(&agency).expect("canceled");
    assert_eq!(canceled.status, SubscriptionStatus::Canceled);
    assert!(canceled.canceled_at.is_some());

    let entitlements = harness
        .services
        .billing
        .entitlements(&agency)
        .expect("entitlements");
    assert!(!entitlements.is_empty());
    assert!(entitlements.iter().all(|e| e.balance == 0));

    assert!(matches!(
        harness.services.billing.cancel(&agency),
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn billing_routes_round_trip() {
    let harness = Harness::new();
    harness.verified("http@agency.test", Role::Agency);
    let bearer = harness.bearer("http@agency.test");
    let app = harness.router();

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/billing/plans", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let plans = read_json_body(response).await;
    assert_eq!(plans.as_array().map(Vec::len), Some(5));

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/billing/subscription",
            Some(&bearer),
            json!({ "plan_code": "AGENCY_PRO" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(get_request("/api/v1/billing/entitlements", Some(&bearer)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let job_posts = body
        .as_array()
        .expect("array")
        .iter()
        .find(|e| e["kind"] == "JOB_POST")
        .expect("job post entitlement");
    assert_eq!(job_posts["balance"], 20);
}
