use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use crate::error::ServiceError;
use crate::extract::ApiQuery;

use super::document::{SearchKind, SearchResults};
use super::service::{SearchParams, SearchService};

pub fn search_router(service: SearchService) -> Router {
    Router::new()
        .route("/api/v1/search/talents", get(talents_handler))
        .route("/api/v1/search/jobs", get(jobs_handler))
        .with_state(service)
}

async fn talents_handler(
    State(service): State<SearchService>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<SearchResults>, ServiceError> {
    service.search(SearchKind::Talent, params).map(Json)
}

async fn jobs_handler(
    State(service): State<SearchService>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<SearchResults>, ServiceError> {
    service.search(SearchKind::Job, params).map(Json)
}
