//! Test builders and in-memory fakes for the journal seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{session_token, AuthError, Authenticator};
use crate::journal::chat::AskRequest;
use crate::journal::store::{EntryStore, StoreError};
use crate::llm_client::{AnswerSynthesizer, LlmError};
use crate::models::entry::JournalEntryRow;
use crate::models::user::AuthenticatedUser;

// ────────────────────────────────────────────────────────────────────────────
// Builders
// ────────────────────────────────────────────────────────────────────────────

pub fn user() -> AuthenticatedUser {
    AuthenticatedUser { id: Uuid::new_v4() }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ask(question: &str) -> AskRequest {
    AskRequest {
        question: question.to_string(),
        attachments: Vec::new(),
        history: Vec::new(),
    }
}

/// A paragraph with `text` (omitted when empty) followed by one image block per URL.
pub fn entry_with(
    owner: &AuthenticatedUser,
    entry_date: &str,
    text: &str,
    image_urls: &[&str],
) -> JournalEntryRow {
    let mut blocks: Vec<Value> = Vec::new();
    if !text.is_empty() {
        blocks.push(json!({
            "type": "paragraph",
            "content": [{ "type": "text", "text": text }],
            "children": []
        }));
    }
    for url in image_urls {
        blocks.push(json!({
            "type": "image",
            "props": { "url": url, "name": "foto.jpg" },
            "children": []
        }));
    }

    JournalEntryRow {
        id: Uuid::new_v4(),
        user_id: owner.id,
        entry_date: entry_date.parse().unwrap(),
        content: Value::Array(blocks),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fakes
// ────────────────────────────────────────────────────────────────────────────

/// Entries held in memory, scoped and ordered the way the Postgres store scopes them.
#[derive(Default)]
pub struct InMemoryEntryStore {
    entries: Vec<JournalEntryRow>,
    fail: bool,
    fetches: AtomicUsize,
}

impl InMemoryEntryStore {
    pub fn with_entries(entries: Vec<JournalEntryRow>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn fetch_entries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<JournalEntryRow>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Query(sqlx::Error::PoolTimedOut));
        }
        let mut owned: Vec<JournalEntryRow> = self
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
        owned.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(owned)
    }

    async fn fetch_entry_by_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<JournalEntryRow>, StoreError> {
        if self.fail {
            return Err(StoreError::Query(sqlx::Error::PoolTimedOut));
        }
        Ok(self
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && e.entry_date == date)
            .max_by_key(|e| e.created_at)
            .cloned())
    }
}

/// Maps fixed session tokens to users.
#[derive(Default)]
pub struct StaticAuthenticator {
    sessions: HashMap<String, AuthenticatedUser>,
}

impl StaticAuthenticator {
    pub fn with_session(mut self, token: &str, user: &AuthenticatedUser) -> Self {
        self.sessions.insert(token.to_string(), user.clone());
        self
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn current_user(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
        let token = session_token(headers).ok_or(AuthError::MissingToken)?;
        self.sessions
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidSession)
    }
}

/// Records every prompt it receives and answers with a canned reply, or fails.
pub struct FakeSynthesizer {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeSynthesizer {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerSynthesizer for FakeSynthesizer {
    async fn generate(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().ok_or(LlmError::Api {
            status: 503,
            message: "unavailable".to_string(),
        })
    }
}
