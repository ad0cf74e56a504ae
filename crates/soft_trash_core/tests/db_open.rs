use rusqlite::Connection;
use soft_trash_core::db::{open_db, open_db_in_memory, DbError, SoftTrashSchema};
use soft_trash_core::TrashConfig;

#[test]
fn open_db_in_memory_enables_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn provisioned_column_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");
    let schema = SoftTrashSchema::new("people", &TrashConfig::default()).unwrap();

    let mut conn_first = open_db(&path).unwrap();
    conn_first
        .execute_batch("CREATE TABLE people (id TEXT PRIMARY KEY, name TEXT NOT NULL);")
        .unwrap();
    assert!(schema.apply(&mut conn_first).unwrap().column_added);
    drop(conn_first);

    let mut conn_second = open_db(&path).unwrap();
    assert!(schema.has_column(&conn_second).unwrap());
    assert!(!schema.apply(&mut conn_second).unwrap().column_added);
    assert_index_exists(&conn_second, &schema.index_name());
}

#[test]
fn schema_column_definition_fits_create_table() {
    let config = TrashConfig {
        column: "removed_at".to_string(),
        create_index: true,
    };
    let schema = SoftTrashSchema::new("posts", &config).unwrap();
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, {});",
        schema.column_definition()
    ))
    .unwrap();
    conn.execute_batch(&schema.index_sql().unwrap()).unwrap();

    assert!(schema.has_column(&conn).unwrap());
    assert_index_exists(&conn, "idx_posts_removed_at");
}

#[test]
fn provisioning_missing_table_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db(dir.path().join("empty.db")).unwrap();
    let schema = SoftTrashSchema::new("people", &TrashConfig::default()).unwrap();

    let err = schema.apply(&mut conn).unwrap_err();
    match err {
        DbError::MissingTable(table) => assert_eq!(table, "people"),
        other => panic!("unexpected error: {other}"),
    }
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'index' AND name = ?1
            );",
            [index_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "index {index_name} does not exist");
}
