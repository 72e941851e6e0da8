//! Persistent thumbnail store.
//!
//! The pipeline talks to storage through the [`ImageStore`] trait: point
//! lookups by path for the cache index, and one all-or-nothing
//! [`commit`](ImageStore::commit) for the batch committer. The store handle
//! is passed explicitly and only ever used from the coordinating thread.
//!
//! [`SqliteStore`] is the production implementation:
//!
//! ```text
//! image(path TEXT UNIQUE, image_type TEXT, base64 TEXT, date_modified TEXT)
//! ```
//!
//! ## Commit semantics
//!
//! A commit opens one transaction, re-runs the idempotent schema creation,
//! inserts every record through a prepared statement and commits. Any
//! failure, including a `UNIQUE` violation on a path that appeared since the
//! lookup, drops the transaction, which rolls it back. Either every record of
//! the run lands or none does.

use crate::types::{CachedImage, MimeType};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const CREATE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS image (
    path          TEXT UNIQUE,
    image_type    TEXT,
    base64        TEXT,
    date_modified TEXT
)";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Unknown image type {image_type:?} stored for {path}")]
    UnknownImageType { path: String, image_type: String },
}

/// Storage capability used by the ingestion pipeline.
pub trait ImageStore {
    /// Whether a record exists for `path`. A point lookup; never scans.
    fn contains(&self, path: &str) -> Result<bool, StoreError>;

    /// Persist `records` atomically. Returns the number of rows written.
    fn commit(&mut self, records: &[CachedImage]) -> Result<usize, StoreError>;
}

/// SQLite-backed [`ImageStore`].
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened cache database");
        Self::from_connection(conn)
    }

    /// A private in-memory database, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(CREATE_SCHEMA, [])?;
        Ok(Self { conn })
    }

    /// Fetch the cached record for `path`, if any.
    pub fn get(&self, path: &str) -> Result<Option<CachedImage>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT path, image_type, base64, date_modified FROM image WHERE path = ?1",
                [path],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((path, image_type, thumbnail_data, modified_at)) = row else {
            return Ok(None);
        };
        let mime_type = MimeType::from_mime(&image_type)
            .ok_or_else(|| StoreError::UnknownImageType {
                path: path.clone(),
                image_type,
            })?;
        Ok(Some(CachedImage {
            path,
            mime_type,
            thumbnail_data,
            modified_at,
        }))
    }

    /// Number of cached rows.
    pub fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM image", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Delete every cached row. Returns the number removed.
    pub fn clear(&mut self) -> Result<usize, StoreError> {
        let removed = self.conn.execute("DELETE FROM image", [])?;
        info!(removed, "cleared thumbnail cache");
        Ok(removed)
    }
}

impl ImageStore for SqliteStore {
    fn contains(&self, path: &str) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM image WHERE path = ?1", [path], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn commit(&mut self, records: &[CachedImage]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        tx.execute(CREATE_SCHEMA, [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO image (path, image_type, base64, date_modified) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.path,
                    record.mime_type.as_str(),
                    record.thumbnail_data,
                    record.modified_at,
                ])?;
            }
        }
        tx.commit()?;

        debug!(rows = records.len(), "committed thumbnails");
        Ok(records.len())
    }
}
