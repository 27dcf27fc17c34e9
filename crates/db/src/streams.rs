use chrono::Utc;
use monitor_core::{EntryFields, EntryId, StreamEntry};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::Db;
use crate::error::Result;
use crate::helpers::{RawEntry, entry_id_from_columns, entry_id_to_columns, row_to_raw_entry};

impl Db {
    /// Appends an entry stamped with the current wall clock.
    pub fn append_entry(&mut self, stream_key: &str, fields: &EntryFields) -> Result<EntryId> {
        let now_millis = Utc::now().timestamp_millis().max(0) as u64;
        self.append_entry_at(stream_key, fields, now_millis)
    }

    /// Appends an entry as if observed at `now_millis`. The id is assigned inside an
    /// immediate transaction, so concurrent writers never receive the same id.
    pub fn append_entry_at(
        &mut self,
        stream_key: &str,
        fields: &EntryFields,
        now_millis: u64,
    ) -> Result<EntryId> {
        let fields_json = serde_json::to_string(fields)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let last = tx
            .query_row(
                r#"
                SELECT id_millis, id_seq
                FROM stream_entry
                WHERE stream_key = ?1
                ORDER BY id_millis DESC, id_seq DESC
                LIMIT 1
                "#,
                params![stream_key],
                |row| Ok(entry_id_from_columns(row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let id = EntryId::next_after(last, now_millis);
        let (millis, seq) = entry_id_to_columns(id);
        tx.execute(
            r#"
            INSERT INTO stream_entry (stream_key, id_millis, id_seq, fields_json, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![stream_key, millis, seq, fields_json, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(id)
    }

    /// Entries with an id strictly greater than `after`, oldest first.
    pub fn read_entries_after(
        &self,
        stream_key: &str,
        after: EntryId,
        limit: usize,
    ) -> Result<Vec<StreamEntry>> {
        let (millis, seq) = entry_id_to_columns(after);
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id_millis, id_seq, fields_json
            FROM stream_entry
            WHERE stream_key = ?1
              AND (id_millis > ?2 OR (id_millis = ?2 AND id_seq > ?3))
            ORDER BY id_millis ASC, id_seq ASC
            LIMIT ?4
            "#,
        )?;
        let raw = stmt
            .query_map(
                params![stream_key, millis, seq, limit as i64],
                row_to_raw_entry,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(raw.into_iter().map(RawEntry::into_entry).collect())
    }

    pub fn stream_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT DISTINCT stream_key
            FROM stream_entry
            WHERE substr(stream_key, 1, ?2) = ?1
            ORDER BY stream_key ASC
            "#,
        )?;
        let keys = stmt
            .query_map(params![prefix, prefix.chars().count() as i64], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    pub fn count_entries(&self, stream_key: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM stream_entry WHERE stream_key = ?1",
            params![stream_key],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}
