use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::extract::{ApiJson, ApiPath};
use crate::ids::ThreadId;

use super::domain::{Message, ThreadSummary};
use super::service::{MessageService, NewMessage, ReplyRequest, ThreadView};

pub fn messages_router(service: Arc<MessageService>) -> Router {
    Router::new()
        .route(
            "/api/v1/messages/threads",
            get(threads_handler).post(send_handler),
        )
        .route(
            "/api/v1/messages/threads/:thread_id",
            get(thread_handler).post(reply_handler),
        )
        .route(
            "/api/v1/messages/threads/:thread_id/read",
            post(read_handler),
        )
        .with_state(service)
}

async fn threads_handler(
    State(service): State<Arc<MessageService>>,
    auth: AuthUser,
) -> Result<Json<Vec<ThreadSummary>>, ServiceError> {
    service.threads(&auth).map(Json)
}

async fn send_handler(
    State(service): State<Arc<MessageService>>,
    auth: AuthUser,
    ApiJson(request): ApiJson<NewMessage>,
) -> Result<(StatusCode, Json<Message>), ServiceError> {
    let message = service.send(&auth, request)?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn thread_handler(
    State(service): State<Arc<MessageService>>,
    auth: AuthUser,
    ApiPath(thread_id): ApiPath<ThreadId>,
) -> Result<Json<ThreadView>, ServiceError> {
    service.messages(&auth, thread_id).map(Json)
}

async fn reply_handler(
    State(service): State<Arc<MessageService>>,
    auth: AuthUser,
    ApiPath(thread_id): ApiPath<ThreadId>,
    ApiJson(request): ApiJson<ReplyRequest>,
) -> Result<(StatusCode, Json<Message>), ServiceError> {
    let message = service.reply(&auth, thread_id, request)?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn read_handler(
    State(service): State<Arc<MessageService>>,
    auth: AuthUser,
    ApiPath(thread_id): ApiPath<ThreadId>,
) -> Result<Json<Value>, ServiceError> {
    let marked = service.mark_read(&auth, thread_id)?;
    Ok(Json(json!({ "marked_read": marked })))
}
