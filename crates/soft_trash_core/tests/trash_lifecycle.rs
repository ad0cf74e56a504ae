use rusqlite::{params, Connection, Row};
use soft_trash_core::db::open_db_in_memory;
use soft_trash_core::repo::trash_store::read_trashed_at;
use soft_trash_core::{
    is_active, is_trashed, HasTrashState, HookOutcome, HookRegistry, RecordKey, SoftTrashSchema,
    SqliteTrashRecord, SqliteTrashStore, StoreError, StoreResult, TransitionFailure, TrashConfig,
    TrashService, TrashTable, TrashedAt,
};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

const TRASHED_AT: TrashedAt = 1_760_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Person {
    id: Uuid,
    name: String,
    deleted_at: Option<TrashedAt>,
}

impl Person {
    fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            deleted_at: None,
        }
    }
}

impl HasTrashState for Person {
    fn record_key(&self) -> RecordKey {
        self.id.into()
    }

    fn trashed_at(&self) -> Option<TrashedAt> {
        self.deleted_at
    }

    fn set_trashed_at(&mut self, value: Option<TrashedAt>) {
        self.deleted_at = value;
    }
}

impl SqliteTrashRecord for Person {
    fn from_row(row: &Row<'_>, table: &TrashTable) -> StoreResult<Self> {
        let id_text: String = row.get("id")?;
        let id = Uuid::parse_str(&id_text)
            .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{id_text}`")))?;
        Ok(Self {
            id,
            name: row.get("name")?,
            deleted_at: read_trashed_at(row, table)?,
        })
    }
}

fn people_db() -> Connection {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE people (id TEXT PRIMARY KEY, name TEXT NOT NULL);")
        .unwrap();
    SoftTrashSchema::new("people", &TrashConfig::default())
        .unwrap()
        .apply(&mut conn)
        .unwrap();
    conn
}

fn insert(conn: &Connection, person: &Person) {
    conn.execute(
        "INSERT INTO people (id, name, deleted_at) VALUES (?1, ?2, ?3);",
        params![person.id.to_string(), person.name, person.deleted_at],
    )
    .unwrap();
}

fn people_table() -> TrashTable {
    TrashTable::with_config("people", &TrashConfig::default()).unwrap()
}

fn fixed_clock() -> TrashedAt {
    TRASHED_AT
}

#[test]
fn trash_active_record_sets_and_persists_timestamp() {
    let conn = people_db();
    let mut ada = Person::new("Ada");
    insert(&conn, &ada);
    let store = SqliteTrashStore::<Person>::try_new(&conn, people_table()).unwrap();
    let service = TrashService::new(&store).with_clock(fixed_clock);

    assert!(service.trash(&mut ada));
    assert!(is_trashed(&ada));
    assert_eq!(ada.deleted_at, Some(TRASHED_AT));

    let loaded = store.get(&ada.record_key()).unwrap().unwrap();
    assert_eq!(loaded.deleted_at, Some(TRASHED_AT));
}

#[test]
fn trash_on_trashed_record_returns_false_and_keeps_timestamp() {
    let conn = people_db();
    let mut ada = Person::new("Ada");
    ada.deleted_at = Some(42);
    insert(&conn, &ada);
    let store = SqliteTrashStore::<Person>::try_new(&conn, people_table()).unwrap();
    let service = TrashService::new(&store).with_clock(fixed_clock);

    assert!(!service.trash(&mut ada));
    assert_eq!(ada.deleted_at, Some(42));
    let loaded = store.get(&ada.record_key()).unwrap().unwrap();
    assert_eq!(loaded.deleted_at, Some(42));
}

#[test]
fn restore_round_trip_matches_original_record() {
    let conn = people_db();
    let original = Person::new("Grace");
    insert(&conn, &original);
    let store = SqliteTrashStore::<Person>::try_new(&conn, people_table()).unwrap();
    let service = TrashService::new(&store);

    let mut person = original.clone();
    assert!(service.trash(&mut person));
    assert!(service.restore(&mut person));
    assert!(is_active(&person));
    assert_eq!(person, original);
    assert_eq!(store.get(&original.record_key()).unwrap().unwrap(), original);

    assert!(!service.restore(&mut person));
}

#[test]
fn trash_strict_on_trashed_record_references_that_record() {
    let conn = people_db();
    let mut ada = Person::new("Ada");
    ada.deleted_at = Some(7);
    insert(&conn, &ada);
    let store = SqliteTrashStore::<Person>::try_new(&conn, people_table()).unwrap();
    let service = TrashService::new(&store);

    let err = service.trash_strict(&mut ada).unwrap_err();
    assert_eq!(err.record, ada);
    assert_eq!(err.record_key(), RecordKey::from(ada.id));
    assert_eq!(err.reason, TransitionFailure::AlreadyInState);
    assert_eq!(err.message(), "a trashed record cannot be trashed");
}

#[test]
fn restore_strict_on_active_record_fails() {
    let conn = people_db();
    let mut ada = Person::new("Ada");
    insert(&conn, &ada);
    let store = SqliteTrashStore::<Person>::try_new(&conn, people_table()).unwrap();
    let service = TrashService::new(&store);

    let err = service.restore_strict(&mut ada).unwrap_err();
    assert_eq!(err.reason, TransitionFailure::AlreadyInState);
    assert_eq!(err.message(), "an active record cannot be restored");
}

#[test]
fn aborting_before_trash_hook_cancels_transition() {
    let conn = people_db();
    let mut ada = Person::new("Ada");
    insert(&conn, &ada);
    let store = SqliteTrashStore::<Person>::try_new(&conn, people_table()).unwrap();
    let mut hooks = HookRegistry::new();
    hooks.add_before_trash("protect_admins", |_: &Person| HookOutcome::Abort);
    let service = TrashService::new(&store).with_hooks(hooks);

    assert!(!service.trash(&mut ada));
    assert_eq!(ada.deleted_at, None);
    assert_eq!(store.get(&ada.record_key()).unwrap().unwrap().deleted_at, None);

    let err = service.trash_strict(&mut ada).unwrap_err();
    assert_eq!(err.reason, TransitionFailure::HookAborted);
    assert_eq!(err.message(), "failed to trash the record");
}

#[test]
fn hooks_fire_around_successful_transitions() {
    let conn = people_db();
    let mut ada = Person::new("Ada");
    insert(&conn, &ada);
    let store = SqliteTrashStore::<Person>::try_new(&conn, people_table()).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    let mut hooks = HookRegistry::new();
    let seen = Rc::clone(&events);
    hooks.add_before_trash("log_before", move |person: &Person| {
        seen.borrow_mut().push(format!("before_trash:{}", person.is_trashed()));
        HookOutcome::Continue
    });
    let seen = Rc::clone(&events);
    hooks.add_after_trash("log_after", move |person: &Person| {
        seen.borrow_mut().push(format!("after_trash:{}", person.is_trashed()));
    });
    let seen = Rc::clone(&events);
    hooks.add_after_restore("log_restore", move |person: &Person| {
        seen.borrow_mut().push(format!("after_restore:{}", person.is_trashed()));
    });
    let service = TrashService::new(&store).with_hooks(hooks);

    assert!(service.trash(&mut ada));
    assert!(!service.trash(&mut ada));
    assert!(service.restore(&mut ada));

    assert_eq!(
        *events.borrow(),
        vec![
            "before_trash:false".to_string(),
            "after_trash:true".to_string(),
            "after_restore:false".to_string(),
        ]
    );
}

#[test]
fn vanished_row_reports_persistence_failure() {
    let conn = people_db();
    let mut ada = Person::new("Ada");
    insert(&conn, &ada);
    let store = SqliteTrashStore::<Person>::try_new(&conn, people_table()).unwrap();
    let service = TrashService::new(&store);
    conn.execute("DELETE FROM people;", []).unwrap();

    assert!(!service.trash(&mut ada));
    assert!(ada.is_active());

    let err = service.trash_strict(&mut ada).unwrap_err();
    match &err.reason {
        TransitionFailure::Persistence(cause) => assert!(cause.contains("record not found")),
        other => panic!("unexpected reason: {other:?}"),
    }
    assert_eq!(err.message(), "failed to trash the record");
}
