#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("entry fields error: {0}")]
    Fields(#[from] serde_json::Error),
    #[error("{0}")]
    EntryId(#[from] monitor_core::InvalidEntryId),
}

pub type Result<T> = std::result::Result<T, DbError>;
