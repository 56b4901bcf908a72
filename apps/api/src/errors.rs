use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

pub const UNAUTHORIZED_MESSAGE: &str = "Necesitas iniciar sesión para consultar tu diario.";
pub const CONFIGURATION_MESSAGE: &str =
    "El asistente no está configurado en este momento. Inténtalo más tarde.";
pub const STORE_ERROR_MESSAGE: &str =
    "Lo siento, no pude leer tus entradas del diario. Inténtalo de nuevo en unos momentos.";
pub const LLM_ERROR_MESSAGE: &str =
    "Lo siento, no pude generar una respuesta. Inténtalo de nuevo en unos momentos.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Only the fixed messages above ever reach the caller; underlying causes are logged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Synthesis credentials are not configured")]
    Configuration,

    #[error("Entry store error: {0}")]
    StoreQuery(String),

    #[error("LLM error: {0}")]
    Llm(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        if let AuthError::Lookup(e) = &err {
            tracing::error!("Session lookup failed: {e}");
        } else {
            tracing::debug!("Rejected request: {err}");
        }
        AppError::Unauthorized
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                UNAUTHORIZED_MESSAGE.to_string(),
            ),
            AppError::Configuration => {
                tracing::error!("Ask request rejected: ANTHROPIC_API_KEY is not set");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    CONFIGURATION_MESSAGE.to_string(),
                )
            }
            AppError::StoreQuery(msg) => {
                tracing::error!("Entry store error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    STORE_ERROR_MESSAGE.to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    LLM_ERROR_MESSAGE.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
