use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::extract::ApiJson;

use super::domain::{Entitlement, Subscription, SubscriptionPlan};
use super::service::{BillingService, SubscribeRequest, SubscriptionView};

pub fn billing_router(service: Arc<BillingService>) -> Router {
    Router::new()
        .route("/api/v1/billing/plans", get(plans_handler))
        .route(
            "/api/v1/billing/subscription",
            get(current_handler)
                .post(subscribe_handler)
                .delete(cancel_handler),
        )
        .route("/api/v1/billing/entitlements", get(entitlements_handler))
        .with_state(service)
}

async fn plans_handler(State(service): State<Arc<BillingService>>) -> Json<Vec<SubscriptionPlan>> {
    Json(service.plans())
}

async fn current_handler(
    State(service): State<Arc<BillingService>>,
    auth: AuthUser,
) -> Result<Json<SubscriptionView>, ServiceError> {
    service.current(&auth).map(Json)
}

async fn subscribe_handler(
    State(service): State<Arc<BillingService>>,
    auth: AuthUser,
    ApiJson(request): ApiJson<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscriptionView>), ServiceError> {
    let view = service.subscribe(&auth, request)?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn cancel_handler(
    State(service): State<Arc<BillingService>>,
    auth: AuthUser,
) -> Result<Json<Subscription>, ServiceError> {
    service.cancel(&auth).map(Json)
}

async fn entitlements_handler(
    State(service): State<Arc<BillingService>>,
    auth: AuthUser,
) -> Result<Json<Vec<Entitlement>>, ServiceError> {
    service.entitlements(&auth).map(Json)
}
