use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use crate::audit::ConsentRecord;
use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::extract::ApiJson;

use super::domain::UserView;
use super::service::{ChangePassword, MarketingConsent, UpdateAccount, UserService};

pub fn users_router(service: Arc<UserService>) -> Router {
    Router::new()
        .route(
            "/api/v1/users/me",
            get(me_handler).patch(update_handler).delete(deactivate_handler),
        )
        .route("/api/v1/users/me/password", put(change_password_handler))
        .route("/api/v1/users/me/consents", get(consents_handler))
        .route(
            "/api/v1/users/me/consents/marketing",
            put(marketing_consent_handler),
        )
        .with_state(service)
}

async fn me_handler(
    State(service): State<Arc<UserService>>,
    auth: AuthUser,
) -> Result<Json<UserView>, ServiceError> {
    service.me(&auth).map(Json)
}

async fn update_handler(
    State(service): State<Arc<UserService>>,
    auth: AuthUser,
    ApiJson(update): ApiJson<UpdateAccount>,
) -> Result<Json<UserView>, ServiceError> {
    service.update_me(&auth, update).map(Json)
}

async fn deactivate_handler(
    State(service): State<Arc<UserService>>,
    auth: AuthUser,
) -> Result<Json<UserView>, ServiceError> {
    service.deactivate(&auth).map(Json)
}

async fn change_password_handler(
    State(service): State<Arc<UserService>>,
    auth: AuthUser,
    ApiJson(request): ApiJson<ChangePassword>,
) -> Result<StatusCode, ServiceError> {
    service.change_password(&auth, request)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn consents_handler(
    State(service): State<Arc<UserService>>,
    auth: AuthUser,
) -> Result<Json<Vec<ConsentRecord>>, ServiceError> {
    service.consents(&auth).map(Json)
}

async fn marketing_consent_handler(
    State(service): State<Arc<UserService>>,
    auth: AuthUser,
    ApiJson(consent): ApiJson<MarketingConsent>,
) -> Result<Json<ConsentRecord>, ServiceError> {
    service.update_marketing_consent(&auth, consent).map(Json)
}
