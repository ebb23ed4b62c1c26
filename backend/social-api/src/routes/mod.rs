pub mod chats;
pub mod messages;
pub mod users;

use crate::error::AppError;
use actix_middleware::render_metrics;
use actix_web::{error, web, HttpRequest, HttpResponse};
use error_types::{error_codes, error_types as kinds, ErrorResponse};
use serde_json::json;
use validator::Validate;

/// Run `validator` rules on a request body
pub(crate) fn validate_body<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Prometheus text format
async fn metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(render_metrics())
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    let mut body = ErrorResponse::new(
        "Not Found",
        &format!("no route for {} {}", req.method(), req.path()),
        404,
        kinds::NOT_FOUND_ERROR,
        error_codes::NOT_FOUND,
    );
    if let Some(id) = actix_middleware::get_correlation_id(&req) {
        body = body.with_trace_id(id);
    }
    HttpResponse::NotFound().json(body)
}

async fn openapi_json() -> HttpResponse {
    use utoipa::OpenApi;
    HttpResponse::Ok().json(crate::openapi::ApiDoc::openapi())
}

/// Mount every endpoint. Handlers outside `/auth/*` carry their own
/// `JwtAuthMiddleware`, so unknown paths fall through to a 404.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics))
        .route("/api/v1/openapi.json", web::get().to(openapi_json))
        .service(
            web::scope("/api/v1")
                .service(users::register)
                .service(users::login)
                // Messages
                .service(messages::create_message)
                .service(messages::delete_message)
                .service(messages::private_chat_messages)
                .service(messages::group_chat_messages)
                .service(messages::mark_read)
                .service(messages::mark_chat_read)
                // Chats
                .service(chats::create_private_chat)
                .service(chats::create_group_chat)
                // Users, fixed paths before /users/{id}
                .service(users::change_password)
                .service(users::current_user)
                .service(users::search_users)
                .service(users::update_profile)
                .service(users::upload_profile_pic)
                .service(users::upload_cover_pic)
                .service(users::list_users)
                .service(users::user_by_id)
                .service(users::toggle_active)
                .default_service(web::to(not_found)),
        );
}
