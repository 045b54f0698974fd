use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::extract::{ApiJson, ApiPath};
use crate::ids::UserId;

use super::domain::{AgencyProfile, AgencyProfileInput, TalentProfileInput, TalentProfileView};
use super::service::ProfileService;

pub fn profiles_router(service: Arc<ProfileService>) -> Router {
    Router::new()
        .route(
            "/api/v1/profiles/talent/me",
            get(my_talent_handler).put(upsert_talent_handler),
        )
        .route("/api/v1/profiles/talent/:user_id", get(talent_handler))
        .route(
            "/api/v1/profiles/agency/me",
            get(my_agency_handler).put(upsert_agency_handler),
        )
        .route("/api/v1/profiles/agency/:user_id", get(agency_handler))
        .with_state(service)
}

async fn my_talent_handler(
    State(service): State<Arc<ProfileService>>,
    auth: AuthUser,
) -> Result<Json<TalentProfileView>, ServiceError> {
    service.my_talent(&auth).map(Json)
}

async fn upsert_talent_handler(
    State(service): State<Arc<ProfileService>>,
    auth: AuthUser,
    ApiJson(input): ApiJson<TalentProfileInput>,
) -> Result<Json<TalentProfileView>, ServiceError> {
    service.upsert_talent(&auth, input).map(Json)
}

async fn talent_handler(
    State(service): State<Arc<ProfileService>>,
    viewer: Option<AuthUser>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<TalentProfileView>, ServiceError> {
    service.talent(viewer.as_ref(), user_id).map(Json)
}

async fn my_agency_handler(
    State(service): State<Arc<ProfileService>>,
    auth: AuthUser,
) -> Result<Json<AgencyProfile>, ServiceError> {
    service.my_agency(&auth).map(Json)
}

async fn upsert_agency_handler(
    State(service): State<Arc<ProfileService>>,
    auth: AuthUser,
    ApiJson(input): ApiJson<AgencyProfileInput>,
) -> Result<Json<AgencyProfile>, ServiceError> {
    service.upsert_agency(&auth, input).map(Json)
}

async fn agency_handler(
    State(service): State<Arc<ProfileService>>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<AgencyProfile>, ServiceError> {
    service.agency(user_id).map(Json)
}
