use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::audit::AuditEntry;
use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::ids::PermissionId;

use super::domain::{ContactPermission, PermissionStatus};
use super::service::{ContactRequest, PermissionService, RespondRequest};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusFilter {
    #[serde(default)]
    status: Option<PermissionStatus>,
}

pub fn permissions_router(service: Arc<PermissionService>) -> Router {
    Router::new()
        .route("/api/v1/permissions", post(request_handler))
        .route("/api/v1/permissions/incoming", get(incoming_handler))
        .route("/api/v1/permissions/outgoing", get(outgoing_handler))
        .route(
            "/api/v1/permissions/:permission_id/respond",
            post(respond_handler),
        )
        .route(
            "/api/v1/permissions/:permission_id/revoke",
            post(revoke_handler),
        )
        .route(
            "/api/v1/permissions/:permission_id/history",
            get(history_handler),
        )
        .with_state(service)
}

async fn request_handler(
    State(service): State<Arc<PermissionService>>,
    auth: AuthUser,
    ApiJson(request): ApiJson<ContactRequest>,
) -> Result<(StatusCode, Json<ContactPermission>), ServiceError> {
    let permission = service.request(&auth, request)?;
    Ok((StatusCode::CREATED, Json(permission)))
}

async fn incoming_handler(
    State(service): State<Arc<PermissionService>>,
    auth: AuthUser,
    ApiQuery(filter): ApiQuery<StatusFilter>,
) -> Result<Json<Vec<ContactPermission>>, ServiceError> {
    service.incoming(&auth, filter.status).map(Json)
}

async fn outgoing_handler(
    State(service): State<Arc<PermissionService>>,
    auth: AuthUser,
    ApiQuery(filter): ApiQuery<StatusFilter>,
) -> Result<Json<Vec<ContactPermission>>, ServiceError> {
    service.outgoing(&auth, filter.status).map(Json)
}

async fn respond_handler(
    State(service): State<Arc<PermissionService>>,
    auth: AuthUser,
    ApiPath(permission_id): ApiPath<PermissionId>,
    ApiJson(request): ApiJson<RespondRequest>,
) -> Result<Json<ContactPermission>, ServiceError> {
    service.respond(&auth, permission_id, request).map(Json)
}

async fn revoke_handler(
    State(service): State<Arc<PermissionService>>,
    auth: AuthUser,
    ApiPath(permission_id): ApiPath<PermissionId>,
) -> Result<Json<ContactPermission>, ServiceError> {
    service.revoke(&auth, permission_id).map(Json)
}

async fn history_handler(
    State(service): State<Arc<PermissionService>>,
    auth: AuthUser,
    ApiPath(permission_id): ApiPath<PermissionId>,
) -> Result<Json<Vec<AuditEntry>>, ServiceError> {
    service.history(&auth, permission_id).map(Json)
}
