use monitor_db::Db;

#[test]
fn migrate_is_repeatable() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("migrate.sqlite");

    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("first migrate");
    db.migrate().expect("second migrate");

    assert_eq!(
        db.applied_migrations().expect("applied"),
        vec!["0001_init", "0002_add_consumer_checkpoint"]
    );
}

#[test]
fn migrated_store_survives_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("reopen.sqlite");
    {
        let db = Db::open_migrated(&path).expect("open migrated");
        db.set_flag("handover_required:a", "true").expect("set flag");
    }

    let db = Db::open_migrated(&path).expect("reopen");
    assert_eq!(
        db.get_flag("handover_required:a").expect("get"),
        Some("true".to_string())
    );
}
