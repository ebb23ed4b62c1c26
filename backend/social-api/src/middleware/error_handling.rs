use crate::error::AppError;
use actix_middleware::current_correlation_id;
use actix_web::{http::StatusCode, HttpResponse};
use error_types::{error_codes, error_types as kinds, ErrorResponse};

/// Map a domain error onto its HTTP status and JSON body
pub fn map_error(err: &AppError) -> (StatusCode, ErrorResponse) {
    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let (error_type, code) = match err {
        AppError::BadRequest(_) => (kinds::VALIDATION_ERROR, error_codes::INVALID_REQUEST),
        AppError::Unauthorized(_) => (kinds::AUTHENTICATION_ERROR, error_codes::INVALID_CREDENTIALS),
        AppError::AccountDisabled => (kinds::AUTHENTICATION_ERROR, error_codes::USER_INACTIVE),
        AppError::Forbidden(_) => (kinds::AUTHORIZATION_ERROR, error_codes::FORBIDDEN),
        AppError::UserNotFound => (kinds::NOT_FOUND_ERROR, error_codes::USER_NOT_FOUND),
        AppError::ChatNotFound => (kinds::NOT_FOUND_ERROR, error_codes::CHAT_NOT_FOUND),
        AppError::MessageNotFound => (kinds::NOT_FOUND_ERROR, error_codes::MESSAGE_NOT_FOUND),
        AppError::Conflict(_) => (kinds::CONFLICT_ERROR, error_codes::USER_ALREADY_EXISTS),
        AppError::Database(_) => (kinds::SERVER_ERROR, error_codes::DATABASE_ERROR),
        AppError::Config(_) | AppError::StartServer(_) | AppError::Internal => {
            (kinds::SERVER_ERROR, error_codes::INTERNAL_SERVER_ERROR)
        }
    };

    // Driver errors stay in the logs
    let message = match err {
        AppError::Database(e) => {
            tracing::error!(error = %e, "database error");
            "database error".to_string()
        }
        other => other.to_string(),
    };

    let mut response = ErrorResponse::new(
        match status {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::CONFLICT => "Conflict",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        },
        &message,
        status.as_u16(),
        error_type,
        code,
    );
    if let Some(id) = current_correlation_id() {
        response = response.with_trace_id(id);
    }

    (status, response)
}

pub fn into_response(err: &AppError) -> HttpResponse {
    let (status, response) = map_error(err);
    HttpResponse::build(status).json(response)
}
