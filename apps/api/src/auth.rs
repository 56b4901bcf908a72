//! Authenticator — resolves the calling user from request headers.
//!
//! Sessions are opaque tokens sent as `Authorization: Bearer <token>` or in the
//! `session_token` cookie, looked up in the `user_sessions` table.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::AuthenticatedUser;

pub const SESSION_COOKIE: &str = "session_token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No session token supplied")]
    MissingToken,

    #[error("Session is invalid or expired")]
    InvalidSession,

    #[error("Session lookup failed: {0}")]
    Lookup(#[from] sqlx::Error),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn current_user(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError>;
}

/// Extracts the session token, preferring the bearer header over the cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|t| !t.is_empty())
}

pub struct PgSessionAuthenticator {
    pool: PgPool,
}

impl PgSessionAuthenticator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Authenticator for PgSessionAuthenticator {
    async fn current_user(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
        let token = session_token(headers).ok_or(AuthError::MissingToken)?;

        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM user_sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        user_id
            .map(|id| AuthenticatedUser { id })
            .ok_or(AuthError::InvalidSession)
    }
}
