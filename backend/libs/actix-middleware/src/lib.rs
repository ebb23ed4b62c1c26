//! # Actix Middleware Library
//!
//! Shared middleware components for social-api Actix services
//!
//! ## Modules
//! - `jwt_auth`: bearer token authentication
//! - `correlation_id`: `x-correlation-id` propagation
//! - `logging`: request/response access log
//! - `metrics`: Prometheus request metrics

pub mod correlation_id;
pub mod jwt_auth;
pub mod logging;
pub mod metrics;

pub use correlation_id::{
    current_correlation_id, get_correlation_id, CorrelationId, CorrelationIdMiddleware,
};
pub use jwt_auth::{AuthClaims, JwtAuthMiddleware};
pub use logging::Logging;
pub use metrics::{render_metrics, MetricsMiddleware};
