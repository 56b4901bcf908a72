//! Conversation Orchestrator — one ask request, start to finish.
//!
//! Order: credentials → non-empty question → fetch → assemble → media answer or synthesis.
//! Authentication happens before this, in the handler.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::errors::AppError;
use crate::journal::assembler::{assemble, AssemblyOutcome};
use crate::journal::intent::QuestionIntent;
use crate::journal::store::EntryStore;
use crate::llm_client::AnswerSynthesizer;
use crate::models::user::AuthenticatedUser;

pub const NO_ENTRIES_MESSAGE: &str =
    "Todavía no tienes entradas en tu diario. Escribe la primera y podré ayudarte a recordarla.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    /// Absent when the request short-circuited before classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<QuestionIntent>,
}

/// Answers one question for an already authenticated user.
pub async fn answer_question(
    store: &dyn EntryStore,
    synthesizer: Option<&dyn AnswerSynthesizer>,
    fetch_limit: i64,
    user: &AuthenticatedUser,
    request: &AskRequest,
    today: NaiveDate,
) -> Result<AskResponse, AppError> {
    let synthesizer = synthesizer.ok_or(AppError::Configuration)?;

    if request.question.trim().is_empty() {
        return Err(AppError::Validation("question must not be empty".to_string()));
    }

    let entries = store
        .fetch_entries(user.id, fetch_limit)
        .await
        .map_err(|e| {
            error!("Failed to fetch entries for user {}: {e}", user.id);
            AppError::StoreQuery(e.to_string())
        })?;

    if entries.is_empty() {
        info!("User {} has no entries", user.id);
        return Ok(AskResponse {
            answer: NO_ENTRIES_MESSAGE.to_string(),
            intent: None,
        });
    }

    let assembly = assemble(user, request, &entries, today);
    info!(
        "Ask: user={}, entries={}, date={:?}, intent={:?}",
        user.id,
        entries.len(),
        assembly.target_date,
        assembly.intent
    );

    let answer = match assembly.outcome {
        AssemblyOutcome::Media(media) => media.render(),
        AssemblyOutcome::Synthesis(req) => {
            debug!("Synthesizing from {} context entries", req.context_entries);
            synthesizer
                .generate(&req.system, &req.prompt)
                .await
                .map_err(|e| AppError::Llm(e.to_string()))?
        }
    };

    Ok(AskResponse {
        answer,
        intent: Some(assembly.intent),
    })
}
