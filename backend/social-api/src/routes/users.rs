//! Registration, login and profile endpoints

use super::validate_body;
use crate::{
    error::AppError,
    middleware::guards::AuthenticatedCaller,
    models::{ImageSlot, ProfileUpdate, SocialLink, UserProfile, UserSummary},
    services::{ImageUpload, RegisterInput, MAX_IMAGE_BYTES},
    state::AppState,
};
use actix_middleware::JwtAuthMiddleware;
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use chrono::NaiveDate;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 32))]
    pub user_name: String,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    pub password: String,
    pub birth_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Login response with tokens
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    pub skip: Option<i64>,
    pub take: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListUsersResponse {
    pub count: i64,
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub relationship_status: Option<String>,
    pub occupation: Option<String>,
    pub education: Option<String>,
    pub status: Option<String>,
    pub country: Option<String>,
    pub phone_number: Option<String>,
    /// Replaces every existing link when present
    pub social_links: Option<Vec<SocialLink>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleActiveResponse {
    pub user_id: Uuid,
    pub is_active: bool,
}

/// Multipart form carrying one picture in the `image` field
#[derive(Debug, ToSchema)]
pub struct ImageUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageResponse {
    pub image_url: String,
}

/// Collects the `image` field, draining any other field
async fn read_image(mut payload: Multipart) -> Result<ImageUpload, AppError> {
    let mut upload: Option<ImageUpload> = None;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::BadRequest(format!("multipart error: {e}")))?;
        let is_image = field.name() == Some("image") && upload.is_none();
        let mut current = ImageUpload {
            file_name: field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string),
            content_type: field.content_type().map(|m| m.to_string()),
            bytes: Vec::new(),
        };

        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| AppError::BadRequest(format!("upload read error: {e}")))?;
            if !is_image {
                continue;
            }
            if current.bytes.len() + data.len() > MAX_IMAGE_BYTES {
                return Err(AppError::BadRequest(format!(
                    "image must be at most {MAX_IMAGE_BYTES} bytes"
                )));
            }
            current.bytes.extend_from_slice(&data);
        }

        if is_image {
            upload = Some(current);
        }
    }

    upload.ok_or_else(|| AppError::BadRequest("image field is required".into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or user name taken")
    )
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    validate_body(&*body)?;
    let body = body.into_inner();

    let user = state
        .users
        .register(RegisterInput {
            email: body.email,
            user_name: body.user_name,
            full_name: body.full_name,
            password: body.password,
            birth_date: body.birth_date,
        })
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse { user_id: user.id }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "User logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials or disabled account")
    )
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    validate_body(&*body)?;

    let tokens = state.users.login(&body.email, &body.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/change-password",
    tag = "Users",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password too weak"),
        (status = 401, description = "Current password is wrong")
    ),
    security(("bearer_auth" = []))
)]
#[post("/users/change-password", wrap = "JwtAuthMiddleware")]
pub async fn change_password(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    state
        .users
        .change_password(&caller, &body.current_password, &body.new_password)
        .await?;
    Ok(HttpResponse::Ok().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    responses((status = 200, description = "Caller profile", body = UserProfile)),
    security(("bearer_auth" = []))
)]
#[get("/users/me", wrap = "JwtAuthMiddleware")]
pub async fn current_user(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
) -> Result<HttpResponse, AppError> {
    let profile = state.users.current_user(&caller).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    tag = "Users",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching users", body = [UserSummary]),
        (status = 400, description = "Missing query"),
        (status = 404, description = "No user matches")
    ),
    security(("bearer_auth" = []))
)]
#[get("/users/search", wrap = "JwtAuthMiddleware")]
pub async fn search_users(
    state: web::Data<AppState>,
    _caller: AuthenticatedCaller,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    let users = state.users.search_users(query.query.as_deref()).await?;
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(ListUsersQuery),
    responses((status = 200, description = "One page of users", body = ListUsersResponse)),
    security(("bearer_auth" = []))
)]
#[get("/users", wrap = "JwtAuthMiddleware")]
pub async fn list_users(
    state: web::Data<AppState>,
    _caller: AuthenticatedCaller,
    query: web::Query<ListUsersQuery>,
) -> Result<HttpResponse, AppError> {
    let (count, users) = state.users.list_users(query.skip, query.take).await?;
    Ok(HttpResponse::Ok().json(ListUsersResponse { count, users }))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/update",
    tag = "Users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 403, description = "Not the user and not an admin"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("/users/update", wrap = "JwtAuthMiddleware")]
pub async fn update_profile(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    validate_body(&*body)?;
    let body = body.into_inner();

    let update = ProfileUpdate {
        full_name: body.full_name,
        birth_date: body.birth_date,
        relationship_status: body.relationship_status,
        occupation: body.occupation,
        education: body.education,
        status: body.status,
        country: body.country,
        phone_number: body.phone_number,
    };

    let profile = state
        .users
        .update_profile(&caller, body.user_id, update, body.social_links)
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/users/{id}", wrap = "JwtAuthMiddleware")]
pub async fn user_by_id(
    state: web::Data<AppState>,
    _caller: AuthenticatedCaller,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let profile = state.users.user_by_id(user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/toggle-active",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "New active state", body = ToggleActiveResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("/users/{id}/toggle-active", wrap = "JwtAuthMiddleware")]
pub async fn toggle_active(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = user_id.into_inner();
    let is_active = state.users.toggle_active(&caller, user_id).await?;
    Ok(HttpResponse::Ok().json(ToggleActiveResponse { user_id, is_active }))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/profile-pic",
    tag = "Users",
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Picture stored", body = ImageResponse),
        (status = 400, description = "Missing, oversized or non-image upload")
    ),
    security(("bearer_auth" = []))
)]
#[post("/users/profile-pic", wrap = "JwtAuthMiddleware")]
pub async fn upload_profile_pic(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let upload = read_image(payload).await?;
    let image_url = state
        .users
        .update_image(&caller, ImageSlot::Profile, upload)
        .await?;
    Ok(HttpResponse::Ok().json(ImageResponse { image_url }))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/cover-pic",
    tag = "Users",
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Picture stored", body = ImageResponse),
        (status = 400, description = "Missing, oversized or non-image upload")
    ),
    security(("bearer_auth" = []))
)]
#[post("/users/cover-pic", wrap = "JwtAuthMiddleware")]
pub async fn upload_cover_pic(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let upload = read_image(payload).await?;
    let image_url = state
        .users
        .update_image(&caller, ImageSlot::Cover, upload)
        .await?;
    Ok(HttpResponse::Ok().json(ImageResponse { image_url }))
}
