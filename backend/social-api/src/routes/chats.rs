use crate::{error::AppError, middleware::guards::AuthenticatedCaller, state::AppState};
use actix_middleware::JwtAuthMiddleware;
use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePrivateChatRequest {
    pub other_user_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGroupChatRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatIdResponse {
    pub id: i64,
}

#[utoipa::path(
    post,
    path = "/api/v1/chats/private",
    tag = "Chats",
    request_body = CreatePrivateChatRequest,
    responses(
        (status = 201, description = "Private chat id", body = ChatIdResponse),
        (status = 400, description = "Chat with yourself"),
        (status = 404, description = "Other user not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("/chats/private", wrap = "JwtAuthMiddleware")]
pub async fn create_private_chat(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    body: web::Json<CreatePrivateChatRequest>,
) -> Result<HttpResponse, AppError> {
    let id = state.chats.create_private(&caller, body.other_user_id).await?;
    Ok(HttpResponse::Created().json(ChatIdResponse { id }))
}

#[utoipa::path(
    post,
    path = "/api/v1/chats/group",
    tag = "Chats",
    request_body = CreateGroupChatRequest,
    responses(
        (status = 201, description = "Group chat id", body = ChatIdResponse),
        (status = 400, description = "Empty name"),
        (status = 404, description = "A member does not exist")
    ),
    security(("bearer_auth" = []))
)]
#[post("/chats/group", wrap = "JwtAuthMiddleware")]
pub async fn create_group_chat(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    body: web::Json<CreateGroupChatRequest>,
) -> Result<HttpResponse, AppError> {
    let id = state
        .chats
        .create_group(&caller, &body.name, &body.member_ids)
        .await?;
    Ok(HttpResponse::Created().json(ChatIdResponse { id }))
}
