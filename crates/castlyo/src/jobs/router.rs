use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::ids::{ApplicationId, JobId};
use crate::page::Page;

use super::domain::{JobApplication, JobFilter, JobPatch, JobPost, NewJobPost};
use super::service::{ApplyRequest, JobService, StatusUpdate};

pub fn jobs_router(service: Arc<JobService>) -> Router {
    Router::new()
        .route("/api/v1/jobs", get(list_handler).post(create_handler))
        .route("/api/v1/jobs/mine", get(posted_handler))
        .route(
            "/api/v1/jobs/:job_id",
            get(get_handler).patch(update_handler),
        )
        .route("/api/v1/jobs/:job_id/close", post(close_handler))
        .route(
            "/api/v1/jobs/:job_id/applications",
            get(applications_handler).post(apply_handler),
        )
        .route(
            "/api/v1/jobs/:job_id/applications/export",
            get(export_handler),
        )
        .route("/api/v1/applications/mine", get(my_applications_handler))
        .route(
            "/api/v1/applications/:application_id/status",
            put(status_handler),
        )
        .route(
            "/api/v1/applications/:application_id/withdraw",
            post(withdraw_handler),
        )
        .with_state(service)
}

async fn list_handler(
    State(service): State<Arc<JobService>>,
    ApiQuery(filter): ApiQuery<JobFilter>,
) -> Result<Json<Page<JobPost>>, ServiceError> {
    service.list(filter).map(Json)
}

async fn posted_handler(
    State(service): State<Arc<JobService>>,
    auth: AuthUser,
) -> Result<Json<Vec<JobPost>>, ServiceError> {
    service.posted(&auth).map(Json)
}

async fn create_handler(
    State(service): State<Arc<JobService>>,
    auth: AuthUser,
    ApiJson(request): ApiJson<NewJobPost>,
) -> Result<(StatusCode, Json<JobPost>), ServiceError> {
    let job = service.create(&auth, request)?;
    Ok((StatusCode::CREATED, Json(job)))
}

async fn get_handler(
    State(service): State<Arc<JobService>>,
    viewer: Option<AuthUser>,
    ApiPath(job_id): ApiPath<JobId>,
) -> Result<Json<JobPost>, ServiceError> {
    service.get(viewer.as_ref(), job_id).map(Json)
}

async fn update_handler(
    State(service): State<Arc<JobService>>,
    auth: AuthUser,
    ApiPath(job_id): ApiPath<JobId>,
    ApiJson(patch): ApiJson<JobPatch>,
) -> Result<Json<JobPost>, ServiceError> {
    service.update(&auth, job_id, patch).map(Json)
}

async fn close_handler(
    State(service): State<Arc<JobService>>,
    auth: AuthUser,
    ApiPath(job_id): ApiPath<JobId>,
) -> Result<Json<JobPost>, ServiceError> {
    service.close(&auth, job_id).map(Json)
}

async fn applications_handler(
    State(service): State<Arc<JobService>>,
    auth: AuthUser,
    ApiPath(job_id): ApiPath<JobId>,
) -> Result<Json<Vec<JobApplication>>, ServiceError> {
    service.applications_for_job(&auth, job_id).map(Json)
}

async fn apply_handler(
    State(service): State<Arc<JobService>>,
    auth: AuthUser,
    ApiPath(job_id): ApiPath<JobId>,
    ApiJson(request): ApiJson<ApplyRequest>,
) -> Result<(StatusCode, Json<JobApplication>), ServiceError> {
    let application = service.apply(&auth, job_id, request)?;
    Ok((StatusCode::CREATED, Json(application)))
}

async fn export_handler(
    State(service): State<Arc<JobService>>,
    auth: AuthUser,
    ApiPath(job_id): ApiPath<JobId>,
) -> Result<impl IntoResponse, ServiceError> {
    let csv = service.export_applications_csv(&auth, job_id)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"applications-{job_id}.csv\""),
            ),
        ],
        csv,
    ))
}

async fn my_applications_handler(
    State(service): State<Arc<JobService>>,
    auth: AuthUser,
) -> Result<Json<Vec<JobApplication>>, ServiceError> {
    service.my_applications(&auth).map(Json)
}

async fn status_handler(
    State(service): State<Arc<JobService>>,
    auth: AuthUser,
    ApiPath(application_id): ApiPath<ApplicationId>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<JobApplication>, ServiceError> {
    service
        .set_application_status(&auth, application_id, update)
        .map(Json)
}

async fn withdraw_handler(
    State(service): State<Arc<JobService>>,
    auth: AuthUser,
    ApiPath(application_id): ApiPath<ApplicationId>,
) -> Result<Json<JobApplication>, ServiceError> {
    service.withdraw(&auth, application_id).map(Json)
}
