//! Caller identity extraction.
//!
//! `JwtAuthMiddleware` validates the bearer token and leaves `AuthClaims` in
//! the request extensions. `AuthenticatedCaller` resolves those claims to a
//! stored, active user.

use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;
use actix_middleware::AuthClaims;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// The user behind the current request
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
}

impl AuthenticatedCaller {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

impl AuthenticatedCaller {
    async fn resolve(
        claims: Option<AuthClaims>,
        state: Option<web::Data<AppState>>,
    ) -> Result<Self, AppError> {
        let claims = claims.ok_or_else(|| AppError::Unauthorized("missing credentials".into()))?;
        let state = state.ok_or_else(|| {
            tracing::error!("AppState is not registered");
            AppError::Internal
        })?;

        let user = state
            .user_directory
            .find_by_email(&claims.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("unknown user".into()))?;

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "inactive user rejected");
            return Err(AppError::AccountDisabled);
        }

        Ok(AuthenticatedCaller {
            user_id: user.id,
            email: user.email,
            roles: vec![user.role],
        })
    }
}

impl FromRequest for AuthenticatedCaller {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let claims = req.extensions().get::<AuthClaims>().cloned();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move { Self::resolve(claims, state).await.map_err(Error::from) })
    }
}
