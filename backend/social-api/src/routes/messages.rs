//! Message endpoints. All of them require a bearer token.

use crate::{
    error::AppError,
    middleware::guards::AuthenticatedCaller,
    models::{ChatRef, MessageView},
    services::CreateMessageInput,
    state::AppState,
};
use actix_middleware::JwtAuthMiddleware;
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    pub user_id: Uuid,
    pub text: String,
    pub private_chat_id: Option<i64>,
    pub group_chat_id: Option<i64>,
    #[serde(default)]
    pub is_read: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageIdResponse {
    pub id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MessageIdRequest {
    pub message_id: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ChatQuery {
    pub chat_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkChatReadRequest {
    pub user_id: Uuid,
    pub private_chat_id: Option<i64>,
    pub group_chat_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkChatReadResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub message: String,
}

impl StatusResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

// ============================================
// Endpoints
// ============================================

#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "Messages",
    request_body = CreateMessageRequest,
    responses(
        (status = 200, description = "Message created", body = MessageIdResponse),
        (status = 400, description = "Empty text or invalid chat reference"),
        (status = 403, description = "user_id is not the caller"),
        (status = 404, description = "Chat not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("/messages", wrap = "JwtAuthMiddleware")]
pub async fn create_message(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    body: web::Json<CreateMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let message = state
        .messages
        .create_message(
            &caller,
            CreateMessageInput {
                user_id: body.user_id,
                text: body.text,
                private_chat_id: body.private_chat_id,
                group_chat_id: body.group_chat_id,
                is_read: body.is_read,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(MessageIdResponse { id: message.id }))
}

#[utoipa::path(
    post,
    path = "/api/v1/messages/delete",
    tag = "Messages",
    request_body = MessageIdRequest,
    responses(
        (status = 200, description = "Message deleted", body = StatusResponse),
        (status = 403, description = "Delete policy forbids it"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("/messages/delete", wrap = "JwtAuthMiddleware")]
pub async fn delete_message(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    body: web::Json<MessageIdRequest>,
) -> Result<HttpResponse, AppError> {
    state.messages.delete_message(&caller, body.message_id).await?;
    Ok(HttpResponse::Ok().json(StatusResponse::new("Message deleted")))
}

#[utoipa::path(
    get,
    path = "/api/v1/messages/private",
    tag = "Messages",
    params(ChatQuery),
    responses(
        (status = 200, description = "Messages oldest first", body = [MessageView]),
        (status = 404, description = "Chat not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/messages/private", wrap = "JwtAuthMiddleware")]
pub async fn private_chat_messages(
    state: web::Data<AppState>,
    _caller: AuthenticatedCaller,
    query: web::Query<ChatQuery>,
) -> Result<HttpResponse, AppError> {
    let messages = state
        .messages
        .get_messages(query.chat_id.map(ChatRef::Private))
        .await?;
    Ok(HttpResponse::Ok().json(messages))
}

#[utoipa::path(
    get,
    path = "/api/v1/messages/group",
    tag = "Messages",
    params(ChatQuery),
    responses(
        (status = 200, description = "Messages oldest first", body = [MessageView]),
        (status = 404, description = "Chat not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/messages/group", wrap = "JwtAuthMiddleware")]
pub async fn group_chat_messages(
    state: web::Data<AppState>,
    _caller: AuthenticatedCaller,
    query: web::Query<ChatQuery>,
) -> Result<HttpResponse, AppError> {
    let messages = state
        .messages
        .get_messages(query.chat_id.map(ChatRef::Group))
        .await?;
    Ok(HttpResponse::Ok().json(messages))
}

#[utoipa::path(
    post,
    path = "/api/v1/messages/read",
    tag = "Messages",
    request_body = MessageIdRequest,
    responses(
        (status = 200, description = "Message is read", body = StatusResponse),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("/messages/read", wrap = "JwtAuthMiddleware")]
pub async fn mark_read(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    body: web::Json<MessageIdRequest>,
) -> Result<HttpResponse, AppError> {
    state.messages.mark_read(&caller, body.message_id).await?;
    Ok(HttpResponse::Ok().json(StatusResponse::new("Message is read")))
}

#[utoipa::path(
    post,
    path = "/api/v1/messages/read-all",
    tag = "Messages",
    request_body = MarkChatReadRequest,
    responses(
        (status = 200, description = "Messages from other authors marked read", body = MarkChatReadResponse),
        (status = 400, description = "Neither or both chat ids given"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("/messages/read-all", wrap = "JwtAuthMiddleware")]
pub async fn mark_chat_read(
    state: web::Data<AppState>,
    _caller: AuthenticatedCaller,
    body: web::Json<MarkChatReadRequest>,
) -> Result<HttpResponse, AppError> {
    let updated = state
        .messages
        .mark_chat_read(body.user_id, body.private_chat_id, body.group_chat_id)
        .await?;
    Ok(HttpResponse::Ok().json(MarkChatReadResponse { updated }))
}
