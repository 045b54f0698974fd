use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

use crate::error::ServiceError;
use crate::extract::ApiJson;
use crate::users::UserView;

use super::service::{
    AuthService, LoginRequest, RegisterRequest, RegistrationView, ResendVerificationRequest,
    TokenResponse, VerifyEmailRequest,
};

/// Public endpoints; none of them require a bearer token.
pub fn auth_router(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(register_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .route("/api/v1/auth/verify-email", post(verify_email_handler))
        .route(
            "/api/v1/auth/resend-verification",
            post(resend_verification_handler),
        )
        .with_state(service)
}

pub(crate) async fn register_handler(
    State(service): State<Arc<AuthService>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegistrationView>), ServiceError> {
    let view = service.register(request)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn login_handler(
    State(service): State<Arc<AuthService>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    service.login(request).map(Json)
}

pub(crate) async fn verify_email_handler(
    State(service): State<Arc<AuthService>>,
    ApiJson(request): ApiJson<VerifyEmailRequest>,
) -> Result<Json<UserView>, ServiceError> {
    service.verify_email(request).map(Json)
}

pub(crate) async fn resend_verification_handler(
    State(service): State<Arc<AuthService>>,
    ApiJson(request): ApiJson<ResendVerificationRequest>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    service.resend_verification(request)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "verification email queued if the account exists" })),
    ))
}
