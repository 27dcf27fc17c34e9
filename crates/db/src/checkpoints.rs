use chrono::Utc;
use monitor_core::EntryId;
use rusqlite::params;

use crate::Db;
use crate::error::Result;
use crate::helpers::{entry_id_from_columns, entry_id_to_columns};

impl Db {
    pub fn load_checkpoints(&self, consumer: &str) -> Result<Vec<(String, EntryId)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT stream_key, id_millis, id_seq
            FROM consumer_checkpoint
            WHERE consumer = ?1
            ORDER BY stream_key ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![consumer], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    entry_id_from_columns(row.get(1)?, row.get(2)?),
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Stores the checkpoint unless a later one is already recorded.
    pub fn save_checkpoint(&self, consumer: &str, stream_key: &str, id: EntryId) -> Result<()> {
        let (millis, seq) = entry_id_to_columns(id);
        self.conn.execute(
            r#"
            INSERT INTO consumer_checkpoint (consumer, stream_key, id_millis, id_seq, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(consumer, stream_key) DO UPDATE SET
              id_millis = excluded.id_millis,
              id_seq = excluded.id_seq,
              updated_at = excluded.updated_at
            WHERE excluded.id_millis > consumer_checkpoint.id_millis
               OR (excluded.id_millis = consumer_checkpoint.id_millis
                   AND excluded.id_seq > consumer_checkpoint.id_seq)
            "#,
            params![consumer, stream_key, millis, seq, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn clear_checkpoints(&self, consumer: &str) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM consumer_checkpoint WHERE consumer = ?1",
            params![consumer],
        )?;
        Ok(removed)
    }
}
