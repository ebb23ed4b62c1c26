use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    Error, HttpMessage, HttpResponse,
};
use crate::correlation_id::current_correlation_id;
use error_types::{error_codes, error_types as kinds, ErrorResponse};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use uuid::Uuid;

/// Identity claims taken from a validated bearer token
#[derive(Debug, Clone)]
pub struct AuthClaims {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
}

/// JWT Authentication Middleware
///
/// Rejects requests without a valid `Authorization: Bearer <token>` header and
/// inserts [`AuthClaims`] into request extensions otherwise.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

fn unauthorized(message: &str) -> Error {
    let mut body = ErrorResponse::new(
        "Unauthorized",
        message,
        401,
        kinds::AUTHENTICATION_ERROR,
        error_codes::TOKEN_INVALID,
    );
    if let Some(id) = current_correlation_id() {
        body = body.with_trace_id(id);
    }
    InternalError::from_response(message.to_string(), HttpResponse::Unauthorized().json(body))
        .into()
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| unauthorized("Missing Authorization header"))?;

            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or_else(|| unauthorized("Invalid Authorization header format"))?;

            let token_data = crypto_core::jwt::validate_token(token).map_err(|e| {
                tracing::warn!(error = %e, "JWT validation failed");
                unauthorized("Invalid token")
            })?;

            if token_data.claims.token_type != "access" {
                return Err(unauthorized("Access token required"));
            }

            let user_id = Uuid::parse_str(&token_data.claims.sub).map_err(|e| {
                tracing::error!(error = %e, "Invalid user_id UUID in token");
                unauthorized("Invalid token: malformed user_id")
            })?;

            req.extensions_mut().insert(AuthClaims {
                user_id,
                email: token_data.claims.email,
                username: token_data.claims.username,
            });

            service.call(req).await
        })
    }
}
