use axum::http::{header, Method, StatusCode};
use chrono::Duration;
use serde_json::json;
use tower::ServiceExt;

use crate::billing::EntitlementKind;
use crate::error::ServiceError;
use crate::jobs::{
    ApplicationStatus, ApplyRequest, JobCategory, JobFilter, JobPatch, JobStatus, StatusUpdate,
};
use crate::search::SearchKind;
use crate::test_support::*;
use crate::users::Role;

fn apply(cover: &str) -> ApplyRequest {
    ApplyRequest {
        cover_letter: Some(cover.to_string()),
    }
}

#[test]
fn create_consumes_a_job_post_and_indexes() {
    let harness = Harness::new();
    let agency = harness.agency("post@agency.test", "AGENCY_PRO");

    let job = harness.post_job(&agency, "Lead role in short film");

    assert_eq!(job.status, JobStatus::Open);
    assert_eq!(job.agency_id, agency.id);
    assert!(harness.index.contains(SearchKind::Job, &job.id.to_string()));
    assert_eq!(
        harness
            .services
            .billing
            .balance(agency.id, EntitlementKind::JobPost)
            .expect("balance"),
        19
    );
}

#[test]
fn create_without_quota_is_refused() {
    let harness = Harness::new();
    let agency = harness.agency("quota@agency.test", "AGENCY_FREE");
    harness.post_job(&agency, "First");

    match harness
        .services
        .jobs
        .create(&agency, job_request("Second"))
    {
        Err(err @ ServiceError::InsufficientEntitlement { .. }) => {
            assert_eq!(err.status(), StatusCode::FORBIDDEN);
        }
        other => panic!("expected insufficient entitlement, got {other:?}"),
    }
    let page = harness
        .services
        .jobs
        .list(JobFilter::default())
        .expect("jobs list");
    assert_eq!(page.total, 1);
}

#[test]
fn create_requires_agency_profile_and_valid_input() {
    let harness = Harness::new();
    let bare = harness.verified("bare@agency.test", Role::Agency);
    assert!(matches!(
        harness.services.jobs.create(&bare, job_request("No profile")),
        Err(ServiceError::Forbidden(_))
    ));

    let agency = harness.agency("valid@agency.test", "AGENCY_PRO");
    let mut request = job_request("Past deadline");
    request.deadline = harness.today().pred_opt();
    assert!(matches!(
        harness.services.jobs.create(&agency, request),
        Err(ServiceError::Validation(_))
    ));
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
fn list_filters_open_jobs_newest_first() {
    let harness = Harness::new();
    let agency = harness.agency("list@agency.test", "AGENCY_PRO");

    let older = harness.post_job(&agency, "Older");
    harness.clock.advance(Duration::minutes(5));
    let mut voice = job_request("Voice over");
    voice.category = JobCategory::Voice;
    voice.location = "Porto".to_string();
    let newer = harness
        .services
        .jobs
        .create(&agency, voice)
        .expect("job created");
    harness.clock.advance(Duration::minutes(5));
    let closed = harness.post_job(&agency, "Closed soon");
    harness
        .services
        .jobs
        .close(&agency, closed.id)
        .expect("job closed");

    let page = harness
        .services
        .jobs
        .list(JobFilter::default())
        .expect("jobs list");
    let ids: Vec<_> = page.items.iter().map(|job| job.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    let page = harness
        .services
        .jobs
        .list(JobFilter {
            category: Some(JobCategory::Voice),
            ..JobFilter::default()
        })
        .expect("jobs list");
    assert_eq!(page.total, 1);

    let page = harness
        .services
        .jobs
        .list(JobFilter {
            location: Some("lisbon".to_string()),
            limit: Some(1),
            ..JobFilter::default()
        })
        .expect("jobs list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, older.id);
}

#[test]
fn only_owner_can_update_and_closed_jobs_are_frozen() {
    let harness = Harness::new();
    let owner = harness.agency("own@agency.test", "AGENCY_PRO");
    let other = harness.agency("rival@agency.test", "AGENCY_PRO");
    let job = harness.post_job(&owner, "Original");

    let patch = JobPatch {
        title: Some("Renamed".to_string()),
        ..JobPatch::default()
    };
    assert!(matches!(
        harness.services.jobs.update(&other, job.id, patch.clone()),
        Err(ServiceError::Forbidden(_))
    ));
    let updated = harness
        .services
        .jobs
        .update(&owner, job.id, patch.clone())
        .expect("owner updates");
    assert_eq!(updated.title, "Renamed");

    let closed = harness.services.jobs.close(&owner, job.id).expect("closed");
    assert!(closed.closed_at.is_some());
    assert!(!harness.index.contains(SearchKind::Job, &job.id.to_string()));
    assert!(matches!(
        harness.services.jobs.update(&owner, job.id, patch),
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        harness.services.jobs.get(None, job.id),
        Err(ServiceError::NotFound(_))
    ));
    assert!(harness.services.jobs.get(Some(&owner), job.id).is_ok());
}

#[test]
fn apply_once_per_job() {
    let harness = Harness::new();
    let agency = harness.agency("apply@agency.test", "AGENCY_PRO");
    let talent = harness.talent("apply@talent.test");
    let job = harness.post_job(&agency, "Commercial");

    let application = harness
        .services
        .jobs
        .apply(&talent, job.id, apply("I would love to"))
        .expect("applied");
    assert_eq!(application.status, ApplicationStatus::Submitted);

    assert!(matches!(
        harness.services.jobs.apply(&talent, job.id, apply("again")),
        Err(ServiceError::Conflict(_))
    ));

    let mine = harness
        .services
        .jobs
        .my_applications(&talent)
        .expect("mine");
    assert_eq!(mine.len(), 1);
}

#[test]
fn apply_requires_talent_profile_and_open_job() {
    let harness = Harness::new();
    let agency = harness.agency("gate@agency.test", "AGENCY_PRO");
    let bare = harness.verified("bare@talent.test", Role::Talent);
    let talent = harness.talent("ready@talent.test");
    let job = harness.post_job(&agency, "Gatekept");

    assert!(matches!(
        harness.services.jobs.apply(&bare, job.id, ApplyRequest::default()),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        harness.services.jobs.apply(&agency, job.id, ApplyRequest::default()),
        Err(ServiceError::Forbidden(_))
    ));

    harness.clock.advance(Duration::days(31));
    assert!(matches!(
        harness.services.jobs.apply(&talent, job.id, ApplyRequest::default()),
        Err(ServiceError::Conflict(_))
    ));
}

#[test]
fn application_status_follows_agency_transitions() {
    let harness = Harness::new();
    let agency = harness.agency("flow@agency.test", "AGENCY_PRO");
    let talent = harness.talent("flow@talent.test");
    let job = harness.post_job(&agency, "Flow");
    let application = harness
        .services
        .jobs
        .apply(&talent, job.id, ApplyRequest::default())
        .expect("applied");

    let shortlisted = harness
        .services
        .jobs
        .set_application_status(
            &agency,
            application.id,
            StatusUpdate {
                status: ApplicationStatus::Shortlisted,
            },
        )
        .expect("shortlisted");
    assert_eq!(shortlisted.status, ApplicationStatus::Shortlisted);

    let accepted = harness
        .services
        .jobs
        .set_application_status(
            &agency,
            application.id,
            StatusUpdate {
                status: ApplicationStatus::Accepted,
            },
        )
        .expect("accepted");
    assert_eq!(accepted.status, ApplicationStatus::Accepted);

    assert!(matches!(
        harness.services.jobs.set_application_status(
            &agency,
            application.id,
            StatusUpdate {
                status: ApplicationStatus::Rejected,
            },
        ),
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        harness.services.jobs.withdraw(&talent, application.id),
        Err(ServiceError::Conflict(_))
    ));
}

#[test]
fn withdraw_is_limited_to_the_applicant() {
    let harness = Harness::new();
    let agency = harness.agency("wd@agency.test", "AGENCY_PRO");
    let talent = harness.talent("wd@talent.test");
    let other = harness.talent("wd2@talent.test");
    let job = harness.post_job(&agency, "Withdrawable");
    let application = harness
        .services
        .jobs
        .apply(&talent, job.id, ApplyRequest::default())
        .expect("applied");

    assert!(matches!(
        harness.services.jobs.withdraw(&other, application.id),
        Err(ServiceError::Forbidden(_))
    ));
    let withdrawn = harness
        .services
        .jobs
        .withdraw(&talent, application.id)
        .expect("withdrawn");
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
}

#[test]
fn applications_are_private_to_the_owning_agency() {
    let harness = Harness::new();
    let agency = harness.agency("priv@agency.test", "AGENCY_PRO");
    let rival = harness.agency("peek@agency.test", "AGENCY_PRO");
    let talent = harness.talent("priv@talent.test");
    let job = harness.post_job(&agency, "Private");
    harness
        .services
        .jobs
        .apply(&talent, job.id, ApplyRequest::default())
        .expect("applied");

    assert_eq!(
        harness
            .services
            .jobs
            .applications_for_job(&agency, job.id)
            .expect("owner lists")
            .len(),
        1
    );
    assert!(matches!(
        harness.services.jobs.applications_for_job(&rival, job.id),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        harness.services.jobs.export_applications_csv(&rival, job.id),
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn export_route_returns_csv() {
    let harness = Harness::new();
    let agency = harness.agency("csv@agency.test", "AGENCY_PRO");
    let talent = harness.talent("csv@talent.test");
    let job = harness.post_job(&agency, "Exported");
    harness
        .services
        .jobs
        .apply(&talent, job.id, apply("Available all March"))
        .expect("applied");
    let bearer = harness.bearer("csv@agency.test");

    let response = harness
        .router()
        .oneshot(get_request(
            &format!("/api/v1/jobs/{}/applications/export", job.id),
            Some(&bearer),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/csv; charset=utf-8")
    );
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let text = String::from_utf8(body.to_vec()).expect("utf-8");
    assert!(text.contains("Ana Silva"));
    assert!(text.contains("Available all March"));
}

#[tokio::test]
async fn job_routes_create_and_apply() {
    let harness = Harness::new();
    harness.agency("route@agency.test", "AGENCY_PRO");
    harness.talent("route@talent.test");
    let agency_bearer = harness.bearer("route@agency.test");
    let talent_bearer = harness.bearer("route@talent.test");
    let app = harness.router();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/jobs",
            Some(&agency_bearer),
            json!({
                "title": "Theatre ensemble",
                "description": "Summer season in Porto",
                "category": "THEATRE",
                "location": "Porto"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let job = read_json_body(response).await;
    let job_id = job["id"].as_str().expect("job id").to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/jobs/{job_id}/applications"),
            Some(&talent_bearer),
            json!({ "cover_letter": "Count me in" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/jobs?category=THEATRE&limit=5", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let page = read_json_body(response).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["limit"], 5);

    let response = app
        .oneshot(get_request("/api/v1/applications/mine", Some(&talent_bearer)))
        .await
        .expect("response");
    let mine = read_json_body(response).await;
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
}

#[test]
fn posted_lists_closed_jobs_for_their_agency_only() {
    let harness = Harness::new();
    let agency = harness.agency("mine@agency.test", "AGENCY_PRO");
    let rival = harness.agency("rival@agency.test", "AGENCY_PRO");
    let talent = harness.talent("mine@talent.test");
    let open = harness.post_job(&agency, "Still casting");
    let closed = harness.post_job(&agency, "Wrapped");
    harness.post_job(&rival, "Not ours");
    harness.services.jobs.close(&agency, closed.id).expect("closed");

    let posted = harness.services.jobs.posted(&agency).expect("posted");

    let mut ids: Vec<_> = posted.iter().map(|job| job.id).collect();
    ids.sort();
    let mut expected = vec![open.id, closed.id];
    expected.sort();
    assert_eq!(ids, expected);
    assert!(matches!(
        harness.services.jobs.posted(&talent),
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn mine_route_returns_the_agency_jobs() {
    let harness = Harness::new();
    let agency = harness.agency("route-mine@agency.test", "AGENCY_PRO");
    let job = harness.post_job(&agency, "Route listed");
    let bearer = harness.bearer("route-mine@agency.test");

    let response = harness
        .router()
        .oneshot(get_request("/api/v1/jobs/mine", Some(&bearer)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["id"], job.id.to_string());
}

#[test]
fn failed_insert_hands_the_job_post_back() {
    let harness = Harness::with_repositories(|store, repositories| {
        repositories.jobs = std::sync::Arc::new(RejectingJobs(store.clone()));
    });
    let agency = harness.agency("offline@agency.test", "AGENCY_PRO");

    let outcome = harness
        .services
        .jobs
        .create(&agency, job_request("Never stored"));

    assert!(matches!(outcome, Err(ServiceError::Repository(_))));
    assert_eq!(
        harness
            .services
            .billing
            .balance(agency.id, EntitlementKind::JobPost)
            .expect("balance"),
        20
    );
}
