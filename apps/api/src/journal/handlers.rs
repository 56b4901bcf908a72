use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::HeaderMap,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::error;

use crate::errors::AppError;
use crate::journal::blocks::flatten;
use crate::journal::chat::{answer_question, AskRequest, AskResponse};
use crate::state::AppState;

/// One day of the calendar view, flattened.
#[derive(Debug, Serialize)]
pub struct EntryView {
    pub entry_date: NaiveDate,
    pub plain_text: String,
    pub image_urls: Vec<String>,
}

/// POST /api/v1/ask
///
/// The body is only inspected after authentication and the credentials check.
pub async fn handle_ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let user = state.authenticator.current_user(&headers).await?;
    if state.synthesizer.is_none() {
        return Err(AppError::Configuration);
    }
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let response = answer_question(
        state.entry_store.as_ref(),
        state.synthesizer.as_deref(),
        state.config.entry_fetch_limit,
        &user,
        &req,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(response))
}

/// GET /api/v1/entries/:date
pub async fn handle_get_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    date: Result<Path<NaiveDate>, PathRejection>,
) -> Result<Json<EntryView>, AppError> {
    let user = state.authenticator.current_user(&headers).await?;
    let Path(date) = date.map_err(|e| {
        AppError::Validation(format!(
            "La fecha debe tener el formato AAAA-MM-DD ({})",
            e.body_text()
        ))
    })?;
    let entry = state
        .entry_store
        .fetch_entry_by_date(user.id, date)
        .await
        .map_err(|e| {
            error!("Failed to fetch entry {date} for user {}: {e}", user.id);
            AppError::StoreQuery(e.to_string())
        })?
        .ok_or_else(|| AppError::NotFound(format!("No hay ninguna entrada el {date}")))?;

    let flat = flatten(&entry.content);
    Ok(Json(EntryView {
        entry_date: entry.entry_date,
        plain_text: flat.plain_text,
        image_urls: flat.image_urls,
    }))
}
