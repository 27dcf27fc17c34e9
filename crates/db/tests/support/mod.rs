#![allow(dead_code)]

use std::path::PathBuf;

use monitor_core::EntryFields;
use monitor_db::Db;
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("migrate db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn fields(pairs: &[(&str, &str)]) -> EntryFields {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn usage_fields(task_id: &str, token_count: &str, max_tokens: &str) -> EntryFields {
    fields(&[
        ("task_id", task_id),
        ("token_count", token_count),
        ("max_tokens", max_tokens),
    ])
}
