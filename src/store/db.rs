//! Smiley store trait and SQLite implementation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use tokio::sync::broadcast;

use super::error::StoreError;
use super::events::{CommitEvent, StoreEvents};
use super::schema;
use super::types::SmileyRecord;

/// Trait for smiley store operations.
///
/// This is the narrow contract the sync engine consumes: a backlog query,
/// lookup by key, atomic commits, and commit notifications. It is
/// object-safe and can be used with `Arc<dyn SmileyStore>` for shared
/// access across async tasks.
#[async_trait]
pub trait SmileyStore: Send + Sync {
    /// All records whose payload is absent and whose source URL is present
    /// — the backlog for a sync pass. Reflects a consistent snapshot as of
    /// one serialized query.
    async fn missing_image_data(&self) -> Result<Vec<SmileyRecord>, StoreError>;

    /// Look up a record by its text key. `None` means the record was
    /// deleted or never existed; that is an answer, not an error.
    async fn get(&self, text: &str) -> Result<Option<SmileyRecord>, StoreError>;

    /// Insert a new record in one atomic commit.
    ///
    /// Fails with [`StoreError::EmptyKey`] if the record has no text, and
    /// with a query error if the key already exists. A successful commit
    /// publishes a [`CommitEvent`] carrying the record.
    async fn insert(&self, record: &SmileyRecord) -> Result<(), StoreError>;

    /// Insert several new records in one transaction.
    ///
    /// All-or-nothing; a successful commit publishes a single
    /// [`CommitEvent`] carrying the whole set.
    async fn insert_batch(&self, records: &[SmileyRecord]) -> Result<(), StoreError>;

    /// Re-resolve a record by key and write its payload in one serialized
    /// commit, stamping `fetched_at`.
    ///
    /// Returns `false` if no record with that key exists any more — the
    /// expected record-deleted race, not a defect.
    async fn set_image_data(&self, text: &str, data: &[u8]) -> Result<bool, StoreError>;

    /// Delete a record by key. Returns whether a record was removed.
    async fn delete(&self, text: &str) -> Result<bool, StoreError>;

    /// Subscribe to commit notifications. Only commits after this call are
    /// delivered; dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<CommitEvent>;
}

/// SQLite implementation of the smiley store.
pub struct SqliteSmileyStore {
    /// Wrapped in Mutex because rusqlite::Connection is not Sync, and so
    /// that every commit is serialized through one execution context.
    conn: Mutex<Connection>,
    /// Path to the database file (for error messages).
    path: PathBuf,
    /// Per-instance commit notification channel.
    events: StoreEvents,
}

impl std::fmt::Debug for SqliteSmileyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSmileyStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteSmileyStore {
    /// Open or create a database at the given path.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let path = path.to_path_buf();
        let path_clone = path.clone();

        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path_clone).map_err(|e| StoreError::Open {
                path: path_clone.clone(),
                source: e,
            })?;

            // Enable WAL mode for better concurrent read/write performance
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(StoreError::Migration)?;

            // NORMAL synchronous mode is still safe with WAL
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(StoreError::Migration)?;

            schema::migrate(&conn)?;

            Ok::<_, StoreError>(conn)
        })
        .await??;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
            events: StoreEvents::new(),
        })
    }

    /// Open an in-memory database, mainly for tests and offline fixtures.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source: e,
        })?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
            events: StoreEvents::new(),
        })
    }

    fn insert_one(conn: &Connection, record: &SmileyRecord) -> Result<(), StoreError> {
        conn.execute(
            r#"
            INSERT INTO smileys (text, image_url, image_data, section, summary, fetched_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            rusqlite::params![
                &record.text,
                &record.image_url,
                &record.image_data,
                &record.section,
                &record.summary,
                record.fetched_at.map(|dt| dt.timestamp()),
            ],
        )
        .map_err(StoreError::query)?;
        Ok(())
    }
}

/// Map a row from the smileys table to a record.
///
/// Column order must match `SELECT_COLUMNS`.
fn row_to_smiley(row: &Row<'_>) -> rusqlite::Result<SmileyRecord> {
    let fetched_at: Option<i64> = row.get(5)?;
    Ok(SmileyRecord {
        text: row.get(0)?,
        image_url: row.get(1)?,
        image_data: row.get(2)?,
        section: row.get(3)?,
        summary: row.get(4)?,
        fetched_at: fetched_at.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
    })
}

const SELECT_COLUMNS: &str = "text, image_url, image_data, section, summary, fetched_at";

#[async_trait]
impl SmileyStore for SqliteSmileyStore {
    async fn missing_image_data(&self) -> Result<Vec<SmileyRecord>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM smileys WHERE image_data IS NULL AND image_url IS NOT NULL",
            ))
            .map_err(StoreError::query)?;

        let records = stmt
            .query_map([], row_to_smiley)
            .map_err(StoreError::query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query)?;

        Ok(records)
    }

    async fn get(&self, text: &str) -> Result<Option<SmileyRecord>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM smileys WHERE text = ?1"),
            [text],
            row_to_smiley,
        )
        .optional()
        .map_err(StoreError::query)
    }

    async fn insert(&self, record: &SmileyRecord) -> Result<(), StoreError> {
        if record.text.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        {
            let conn = self
                .conn
                .lock()
                .map_err(|e| StoreError::Query(e.to_string()))?;
            Self::insert_one(&conn, record)?;
        }

        self.events.publish(vec![record.clone()]);
        Ok(())
    }

    async fn insert_batch(&self, records: &[SmileyRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        if records.iter().any(|r| r.text.is_empty()) {
            return Err(StoreError::EmptyKey);
        }

        {
            let mut conn = self
                .conn
                .lock()
                .map_err(|e| StoreError::Query(e.to_string()))?;

            let tx = conn.transaction().map_err(StoreError::query)?;
            for record in records {
                Self::insert_one(&tx, record)?;
            }
            tx.commit().map_err(StoreError::query)?;
        }

        self.events.publish(records.to_vec());
        Ok(())
    }

    async fn set_image_data(&self, text: &str, data: &[u8]) -> Result<bool, StoreError> {
        let fetched_at = Utc::now().timestamp();

        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let changed = conn
            .execute(
                "UPDATE smileys SET image_data = ?1, fetched_at = ?2 WHERE text = ?3",
                rusqlite::params![data, fetched_at, text],
            )
            .map_err(StoreError::query)?;

        Ok(changed > 0)
    }

    async fn delete(&self, text: &str) -> Result<bool, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let changed = conn
            .execute("DELETE FROM smileys WHERE text = ?1", [text])
            .map_err(StoreError::query)?;

        Ok(changed > 0)
    }

    fn subscribe(&self) -> broadcast::Receiver<CommitEvent> {
        self.events.subscribe()
    }
}
