//! Caller identity extraction.
//!
//! Authentication itself happens upstream (the auth proxy verifies the
//! session and strips any client-supplied identity headers before
//! forwarding). This service only reads the resulting `x-user-id` /
//! `x-user-role` headers; a request without them is unauthenticated.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// The authenticated caller, as established by the upstream auth layer.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".into()))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .ok_or(AppError::Unauthorized)?
            .to_string();

        let is_admin = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .map(|role| role == "admin")
            .unwrap_or(false);

        Ok(AuthUser { id, is_admin })
    }
}
