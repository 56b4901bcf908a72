//! Entry Store — read-only access to a user's journal entries.
//!
//! `AppState` carries an `Arc<dyn EntryStore>`; `PgEntryStore` is the production backend.
//! Every query is scoped by `user_id`.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::entry::JournalEntryRow;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Entry query failed: {0}")]
    Query(#[from] sqlx::Error),
}

#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Up to `limit` entries of `user_id`, newest `entry_date` first.
    async fn fetch_entries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<JournalEntryRow>, StoreError>;

    /// The entry of `user_id` on `date`, if any.
    async fn fetch_entry_by_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<JournalEntryRow>, StoreError>;
}

pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn fetch_entries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<JournalEntryRow>, StoreError> {
        Ok(sqlx::query_as::<_, JournalEntryRow>(
            r#"
            SELECT id, user_id, entry_date, content, created_at
            FROM journal_entries
            WHERE user_id = $1
            ORDER BY entry_date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn fetch_entry_by_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<JournalEntryRow>, StoreError> {
        // (user_id, entry_date) is unique upstream; prefer the newest row if it ever is not.
        Ok(sqlx::query_as::<_, JournalEntryRow>(
            r#"
            SELECT id, user_id, entry_date, content, created_at
            FROM journal_entries
            WHERE user_id = $1 AND entry_date = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?)
    }
}
