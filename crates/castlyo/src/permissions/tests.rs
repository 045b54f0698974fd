use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::audit::ConsentKind;
use crate::billing::EntitlementKind;
use crate::error::ServiceError;
use crate::permissions::{ContactRequest, Decision, PermissionStatus, RespondRequest};
use crate::test_support::*;
use crate::users::Role;

fn ask(talent_id: crate::ids::UserId) -> ContactRequest {
    ContactRequest {
        talent_id,
        message: Some("We have a role for you".to_string()),
    }
}

fn decide(decision: Decision) -> RespondRequest {
    RespondRequest { decision }
}

#[test]
fn request_creates_pending_and_consumes_quota() {
    let harness = Harness::new();
    let agency = harness.agency("req@agency.test", "AGENCY_FREE");
    let talent = harness.talent("req@talent.test");

    let permission = harness
        .services
        .permissions
        .request(&agency, ask(talent.id))
        .expect("requested");

    assert_eq!(permission.status, PermissionStatus::Pending);
    assert_eq!(permission.agency_id, agency.id);
    assert_eq!(permission.talent_id, talent.id);
    assert_eq!(
        harness
            .services
            .billing
            .balance(agency.id, EntitlementKind::ContactRequest)
            .expect("balance"),
        2
    );

    let history = crate::audit::AuditRepository::audits_for_subject(
        harness.store.as_ref(),
        "contact_permission",
        &permission.id.to_string(),
    )
    .expect("history loads");
    assert!(history
        .iter()
        .any(|entry| entry.action == "contact_permission.requested"));
}

#[test]
fn duplicate_pending_request_conflicts_without_charging() {
    let harness = Harness::new();
    let agency = harness.agency("dup@agency.test", "AGENCY_FREE");
    let talent = harness.talent("dup@talent.test");
    harness
        .services
        .permissions
        .request(&agency, ask(talent.id))
        .expect("requested");

    assert!(matches!(
        harness.services.permissions.request(&agency, ask(talent.id)),
        Err(ServiceError::Conflict(_))
    ));
    assert_eq!(
        harness
            .services
            .billing
            .balance(agency.id, EntitlementKind::ContactRequest)
            .expect("balance"),
        2
    );
}

#[test]
fn request_needs_quota_and_a_visible_talent() {
    let harness = Harness::new();
    let agency = harness.verified("free@agency.test", Role::Agency);
    let talent = harness.talent("visible@talent.test");
    let ghost = harness.verified("ghost@talent.test", Role::Talent);

    assert!(matches!(
        harness.services.permissions.request(&agency, ask(talent.id)),
        Err(ServiceError::InsufficientEntitlement { .. })
    ));
    assert!(matches!(
        harness.services.permissions.request(&agency, ask(ghost.id)),
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        harness.services.permissions.request(&talent, ask(talent.id)),
        Err(ServiceError::Forbidden(_))
    ));
}

#[test]
fn decisions_write_consent_rows() {
    let harness = Harness::new();
    let agency = harness.agency("grant@agency.test", "AGENCY_FREE");
    let talent = harness.talent("grant@talent.test");
    let permission = harness
        .services
        .permissions
        .request(&agency, ask(talent.id))
        .expect("requested");

    let granted = harness
        .services
        .permissions
        .respond(&talent, permission.id, decide(Decision::Grant))
        .expect("granted");
    assert_eq!(granted.status, PermissionStatus::Granted);
    assert!(granted.responded_at.is_some());
    assert!(harness
        .services
        .permissions
        .is_granted(agency.id, talent.id)
        .expect("lookup"));

    let revoked = harness
        .services
        .permissions
        .revoke(&talent, permission.id)
        .expect("revoked");
    assert_eq!(revoked.status, PermissionStatus::Revoked);
    assert!(!harness
        .services
        .permissions
        .is_granted(agency.id, talent.id)
        .expect("lookup"));

    let sharing: Vec<_> = harness
        .services
        .users
        .consents(&talent)
        .expect("consents")
        .into_iter()
        .filter(|record| record.kind == ConsentKind::ContactSharing)
        .map(|record| (record.granted, record.subject))
        .collect();
    assert_eq!(sharing, vec![(true, Some(agency.id)), (false, Some(agency.id))]);
}

#[test]
fn invalid_transitions_conflict() {
    let harness = Harness::new();
    let agency = harness.agency("bad@agency.test", "AGENCY_FREE");
    let talent = harness.talent("bad@talent.test");
    let permission = harness
        .services
        .permissions
        .request(&agency, ask(talent.id))
        .expect("requested");

    match harness.services.permissions.revoke(&talent, permission.id) {
        Err(ServiceError::Conflict(message)) => {
            assert_eq!(message, "cannot revoke a contact permission that is PENDING")
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    harness
        .services
        .permissions
        .respond(&talent, permission.id, decide(Decision::Deny))
        .expect("denied");
    assert!(matches!(
        harness
            .services
            .permissions
            .respond(&talent, permission.id, decide(Decision::Grant)),
        Err(ServiceError::Conflict(_))
    ));
}

#[test]
fn denied_request_can_be_renewed() {
    let harness = Harness::new();
    let agency = harness.agency("again@agency.test", "AGENCY_FREE");
    let talent = harness.talent("again@talent.test");
    let first = harness
        .services
        .permissions
        .request(&agency, ask(talent.id))
        .expect("requested");
    harness
        .services
        .permissions
        .respond(&talent, first.id, decide(Decision::Deny))
        .expect("denied");

    let renewed = harness
        .services
        .permissions
        .request(&agency, ask(talent.id))
        .expect("renewed");
    assert_eq!(renewed.id, first.id);
    assert_eq!(renewed.status, PermissionStatus::Pending);
    assert!(renewed.responded_at.is_none());
    assert_eq!(
        harness
            .services
            .billing
            .balance(agency.id, EntitlementKind::ContactRequest)
            .expect("balance"),
        1
    );
}

#[test]
fn only_the_target_talent_decides() {
    let harness = Harness::new();
    let agency = harness.agency("own@agency.test", "AGENCY_FREE");
    let talent = harness.talent("own@talent.test");
    let other = harness.talent("other@talent.test");
    let permission = harness
        .services
        .permissions
        .request(&agency, ask(talent.id))
        .expect("requested");

    assert!(matches!(
        harness
            .services
            .permissions
            .respond(&other, permission.id, decide(Decision::Grant)),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        harness
            .services
            .permissions
            .respond(&agency, permission.id, decide(Decision::Grant)),
        Err(ServiceError::Forbidden(_))
    ));
}

#[test]
fn incoming_and_outgoing_filter_by_status() {
    let harness = Harness::new();
    let agency = harness.agency("list@agency.test", "AGENCY_FREE");
    let first = harness.talent("one@talent.test");
    let second = harness.talent("two@talent.test");
    let granted = harness
        .services
        .permissions
        .request(&agency, ask(first.id))
        .expect("requested");
    harness
        .services
        .permissions
        .request(&agency, ask(second.id))
        .expect("requested");
    harness
        .services
        .permissions
        .respond(&first, granted.id, decide(Decision::Grant))
        .expect("granted");

    let outgoing = harness
        .services
        .permissions
        .outgoing(&agency, None)
        .expect("outgoing");
    assert_eq!(outgoing.len(), 2);

    let pending = harness
        .services
        .permissions
        .outgoing(&agency, Some(PermissionStatus::Pending))
        .expect("outgoing");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].talent_id, second.id);

    let incoming = harness
        .services
        .permissions
        .incoming(&first, Some(PermissionStatus::Granted))
        .expect("incoming");
    assert_eq!(incoming.len(), 1);
}

#[tokio::test]
async fn permission_routes_drive_the_state_machine() {
    let harness = Harness::new();
    harness.agency("http@agency.test", "AGENCY_FREE");
    let talent = harness.talent("http@talent.test");
    let agency_bearer = harness.bearer("http@agency.test");
    let talent_bearer = harness.bearer("http@talent.test");
    let app = harness.router();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/permissions",
            Some(&agency_bearer),
            json!({ "talent_id": talent.id }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let permission = read_json_body(response).await;
    assert_eq!(permission["status"], "PENDING");
    let id = permission["id"].as_str().expect("id").to_string();

    let response = app
        .clone()
        .oneshot(get_request(
            "/api/v1/permissions/incoming?status=PENDING",
            Some(&talent_bearer),
        ))
        .await
        .expect("response");
    let incoming = read_json_body(response).await;
    assert_eq!(incoming.as_array().map(Vec::len), Some(1));

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/permissions/{id}/respond"),
            Some(&talent_bearer),
            json!({ "decision": "GRANT" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "GRANTED");

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/permissions/{id}/respond"),
            Some(&talent_bearer),
            json!({ "decision": "DENY" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[test]
fn failed_save_hands_the_contact_request_back() {
    let harness = Harness::with_repositories(|store, repositories| {
        repositories.permissions = std::sync::Arc::new(RejectingPermissions(store.clone()));
    });
    let agency = harness.agency("offline@agency.test", "AGENCY_FREE");
    let talent = harness.talent("offline@talent.test");

    let outcome = harness.services.permissions.request(&agency, ask(talent.id));

    assert!(matches!(outcome, Err(ServiceError::Repository(_))));
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
fn decision_without_consent_row_is_rolled_back() {
    let harness = Harness::with_repositories(|store, repositories| {
        repositories.audit = std::sync::Arc::new(RejectingConsents(store.clone()));
    });
    let agency = harness.agency("rollback@agency.test", "AGENCY_FREE");
    let talent = harness.talent("rollback@talent.test");
    let permission = harness
        .services
        .permissions
        .request(&agency, ask(talent.id))
        .expect("requested");

    let outcome = harness
        .services
        .permissions
        .respond(&talent, permission.id, decide(Decision::Grant));

    assert!(matches!(outcome, Err(ServiceError::Repository(_))));
    assert!(!harness
        .services
        .permissions
        .is_granted(agency.id, talent.id)
        .expect("lookup"));
    let incoming = harness
        .services
        .permissions
        .incoming(&talent, Some(PermissionStatus::Pending))
        .expect("incoming");
    assert_eq!(incoming.len(), 1);
    assert!(incoming[0].responded_at.is_none());
}

#[test]
fn history_is_shared_by_both_parties_only() {
    let harness = Harness::new();
    let agency = harness.agency("hist@agency.test", "AGENCY_FREE");
    let talent = harness.talent("hist@talent.test");
    let outsider = harness.agency("other@agency.test", "AGENCY_FREE");
    let permission = harness
        .services
        .permissions
        .request(&agency, ask(talent.id))
        .expect("requested");
    harness
        .services
        .permissions
        .respond(&talent, permission.id, decide(Decision::Deny))
        .expect("denied");

    let actions: Vec<String> = harness
        .services
        .permissions
        .history(&agency, permission.id)
        .expect("history")
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(
        actions,
        vec!["contact_permission.requested", "contact_permission.denied"]
    );
    assert_eq!(
        harness
            .services
            .permissions
            .history(&talent, permission.id)
            .expect("history")
            .len(),
        2
    );
    assert!(matches!(
        harness.services.permissions.history(&outsider, permission.id),
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn history_route_lists_the_audit_trail() {
    let harness = Harness::new();
    let agency = harness.agency("route@agency.test", "AGENCY_FREE");
    let talent = harness.talent("route@talent.test");
    let permission = harness
        .services
        .permissions
        .request(&agency, ask(talent.id))
        .expect("requested");
    let bearer = harness.bearer("route@agency.test");

    let response = harness
        .router()
        .oneshot(get_request(
            &format!("/api/v1/permissions/{}/history", permission.id),
            Some(&bearer),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body[0]["action"], "contact_permission.requested");
    assert_eq!(body[0]["subject_id"], permission.id.to_string());
}
