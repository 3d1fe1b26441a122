//! Relational sink for parsed discs.
//!
//! The pipeline only needs two operations; everything SQLite-specific lives
//! here. All statements run against one open transaction so a failed insert
//! can throw away the whole batch.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Transaction};

use crate::identity::CompositeId;
use crate::models::DiscRecord;

pub trait DiscSink {
    /// Insert a disc row and return its row id.
    fn insert_disc(&mut self, id: &CompositeId, disc: &DiscRecord) -> Result<i64>;

    fn insert_track(&mut self, disc_row: i64, position: usize, title: &str) -> Result<()>;
}

const INSERT_DISC: &str = "INSERT INTO discs (freedb_id, shard, title, genre, year, duration_sec)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const INSERT_TRACK: &str = "INSERT INTO tracks (disc_id, position, title) VALUES (?1, ?2, ?3)";

/// Tune the connection for a bulk load.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -64000;
         PRAGMA temp_store = MEMORY;
         PRAGMA foreign_keys = ON;",
    )?;
    Ok(())
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS discs (
            id INTEGER PRIMARY KEY,
            freedb_id BLOB NOT NULL UNIQUE,
            shard INTEGER NOT NULL,
            title TEXT NOT NULL,
            genre TEXT,
            year INTEGER,
            duration_sec INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tracks (
            id INTEGER PRIMARY KEY,
            disc_id INTEGER NOT NULL REFERENCES discs(id),
            position INTEGER NOT NULL,
            title TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tracks_disc ON tracks(disc_id);",
    )
    .context("Failed to create schema")?;
    Ok(())
}

/// Sink writing into an open SQLite transaction. Committing or rolling back
/// is up to whoever owns the transaction.
pub struct SqliteSink<'a> {
    tx: &'a Transaction<'a>,
}

impl<'a> SqliteSink<'a> {
    pub fn new(tx: &'a Transaction<'a>) -> Self {
        Self { tx }
    }
}

impl DiscSink for SqliteSink<'_> {
    fn insert_disc(&mut self, id: &CompositeId, disc: &DiscRecord) -> Result<i64> {
        let mut stmt = self.tx.prepare_cached(INSERT_DISC)?;
        stmt.execute(params![
            id.as_bytes(),
            id.shard_index(),
            disc.title,
            disc.genre,
            disc.year,
            disc.duration,
        ])
        .with_context(|| format!("Failed to insert disc {} {:?}", id, disc.title))?;
        Ok(self.tx.last_insert_rowid())
    }

    fn insert_track(&mut self, disc_row: i64, position: usize, title: &str) -> Result<()> {
        let mut stmt = self.tx.prepare_cached(INSERT_TRACK)?;
        stmt.execute(params![disc_row, position as i64, title])
            .with_context(|| format!("Failed to insert track {:?} of disc row {}", title, disc_row))?;
        Ok(())
    }
}
