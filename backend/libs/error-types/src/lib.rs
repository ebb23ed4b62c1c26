//! Shared error response format for social-api services.

use serde::{Deserialize, Serialize};

/// Unified API error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP reason phrase, e.g. "Not Found"
    pub error: String,

    /// Human readable message
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Error category, one of the constants in [`error_types`]
    pub error_type: String,

    /// Stable machine code, one of the constants in [`error_codes`]
    pub code: String,

    /// Correlation id of the failing request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            trace_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

pub mod error_codes {
    // Users
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const USER_ALREADY_EXISTS: &str = "USER_ALREADY_EXISTS";
    pub const USER_INACTIVE: &str = "USER_INACTIVE";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";

    // Authentication
    pub const TOKEN_INVALID: &str = "TOKEN_INVALID";

    // Messaging
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const CHAT_NOT_FOUND: &str = "CHAT_NOT_FOUND";
    pub const MESSAGE_NOT_FOUND: &str = "MESSAGE_NOT_FOUND";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const FORBIDDEN: &str = "FORBIDDEN";

    // System
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
}

pub mod error_types {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const AUTHENTICATION_ERROR: &str = "authentication_error";
    pub const AUTHORIZATION_ERROR: &str = "authorization_error";
    pub const NOT_FOUND_ERROR: &str = "not_found_error";
    pub const CONFLICT_ERROR: &str = "conflict_error";
    pub const SERVER_ERROR: &str = "server_error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_creation() {
        let error = ErrorResponse::new(
            "Not Found",
            "message not found",
            404,
            error_types::NOT_FOUND_ERROR,
            error_codes::MESSAGE_NOT_FOUND,
        );

        assert_eq!(error.status, 404);
        assert_eq!(error.error_type, error_types::NOT_FOUND_ERROR);
        assert_eq!(error.code, error_codes::MESSAGE_NOT_FOUND);
        assert!(error.trace_id.is_none());
    }

    #[test]
    fn test_optional_fields_are_skipped() {
        let error = ErrorResponse::new(
            "Bad Request",
            "text must not be empty",
            400,
            error_types::VALIDATION_ERROR,
            error_codes::INVALID_REQUEST,
        );

        let json = serde_json::to_value(&error).unwrap();
        assert!(json.get("trace_id").is_none());

        let json = serde_json::to_value(error.with_trace_id("abc".into())).unwrap();
        assert_eq!(json["trace_id"], "abc");
    }
}
