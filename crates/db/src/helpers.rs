use monitor_core::{EntryFields, EntryId, StreamEntry};
use rusqlite::Row;

pub(crate) fn entry_id_from_columns(millis: i64, seq: i64) -> EntryId {
    EntryId::new(millis.max(0) as u64, seq.max(0) as u64)
}

pub(crate) fn entry_id_to_columns(id: EntryId) -> (i64, i64) {
    (id.millis as i64, id.seq as i64)
}

pub(crate) struct RawEntry {
    pub id: EntryId,
    pub fields_json: String,
}

pub(crate) fn row_to_raw_entry(row: &Row<'_>) -> std::result::Result<RawEntry, rusqlite::Error> {
    Ok(RawEntry {
        id: entry_id_from_columns(row.get(0)?, row.get(1)?),
        fields_json: row.get(2)?,
    })
}

impl RawEntry {
    /// Decodes the stored fields. A row that cannot be decoded is returned
    /// as a malformed entry so readers can skip past its id.
    pub fn into_entry(self) -> StreamEntry {
        match serde_json::from_str::<EntryFields>(&self.fields_json) {
            Ok(fields) => StreamEntry::new(self.id, fields),
            Err(err) => StreamEntry::malformed(self.id, format!("undecodable fields: {}", err)),
        }
    }
}
