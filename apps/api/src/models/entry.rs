use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One journal record, at most one per user per calendar day.
/// `content` is the editor's block tree, stored as JSONB and never written by this service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub content: Value,
    pub created_at: DateTime<Utc>,
}
