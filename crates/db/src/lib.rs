mod checkpoints;
mod error;
mod flags;
mod helpers;
mod migrations;
mod streams;

use std::path::Path;
use std::time::Duration;

use monitor_core::{EntryFields, EntryId, StreamEntry};
use rusqlite::Connection;

pub use error::{DbError, Result};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed stream store: per-key append-only streams, flags and
/// consumer checkpoints.
pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        Ok(Self { conn })
    }

    /// Opens the store and applies pending migrations.
    pub fn open_migrated(path: impl AsRef<Path>) -> Result<Self> {
        let mut db = Self::open(path)?;
        db.migrate()?;
        Ok(db)
    }
}

/// The shared event log the ingestion endpoint writes to and the watcher
/// consumes from.
pub trait EventLog {
    /// Appends `fields` to `stream_key` and returns the assigned id.
    fn append(&mut self, stream_key: &str, fields: &EntryFields) -> Result<EntryId>;

    /// Up to `limit` entries strictly after `after`, in id order.
    fn read_after(&self, stream_key: &str, after: EntryId, limit: usize)
    -> Result<Vec<StreamEntry>>;

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    fn set_flag(&mut self, key: &str, value: &str) -> Result<()>;

    fn get_flag(&self, key: &str) -> Result<Option<String>>;

    fn load_checkpoints(&self, consumer: &str) -> Result<Vec<(String, EntryId)>>;

    fn save_checkpoint(&mut self, consumer: &str, stream_key: &str, id: EntryId) -> Result<()>;
}

impl EventLog for Db {
    fn append(&mut self, stream_key: &str, fields: &EntryFields) -> Result<EntryId> {
        self.append_entry(stream_key, fields)
    }

    fn read_after(
        &self,
        stream_key: &str,
        after: EntryId,
        limit: usize,
    ) -> Result<Vec<StreamEntry>> {
        self.read_entries_after(stream_key, after, limit)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.stream_keys_with_prefix(prefix)
    }

    fn set_flag(&mut self, key: &str, value: &str) -> Result<()> {
        Db::set_flag(self, key, value)
    }

    fn get_flag(&self, key: &str) -> Result<Option<String>> {
        Db::get_flag(self, key)
    }

    fn load_checkpoints(&self, consumer: &str) -> Result<Vec<(String, EntryId)>> {
        Db::load_checkpoints(self, consumer)
    }

    fn save_checkpoint(&mut self, consumer: &str, stream_key: &str, id: EntryId) -> Result<()> {
        Db::save_checkpoint(self, consumer, stream_key, id)
    }
}
