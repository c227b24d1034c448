#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use turn_scheduler::{
    PersistenceError, RosterSource, SqliteTurnStore, TurnAssignment, TurnKind, TurnStore, User,
    UserId,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn private(date: NaiveDate, user: &str) -> TurnAssignment {
    TurnAssignment::private(date, UserId::new(user))
}

#[test]
fn replace_year_round_trips_through_a_file() {
    let file = NamedTempFile::new().unwrap();
    let turns = vec![
        TurnAssignment::shared(d(2026, 1, 1)).with_notes(Some("Año Nuevo".into())),
        private(d(2026, 1, 3), "alice"),
        TurnAssignment::shared(d(2026, 1, 4)),
    ];
    {
        let store = SqliteTurnStore::new(file.path()).unwrap();
        store.replace_year_assignments(2026, &turns).unwrap();
    }

    let reopened = SqliteTurnStore::new(file.path()).unwrap();
    assert_eq!(reopened.load_year(2026).unwrap(), turns);
}

#[test]
fn replacing_a_year_leaves_other_years_alone() {
    let store = SqliteTurnStore::in_memory().unwrap();
    store
        .replace_year_assignments(2025, &[private(d(2025, 12, 27), "bob")])
        .unwrap();
    store
        .replace_year_assignments(2026, &[private(d(2026, 1, 3), "alice")])
        .unwrap();
    store
        .replace_year_assignments(2026, &[TurnAssignment::shared(d(2026, 1, 10))])
        .unwrap();

    let year_2026 = store.load_year(2026).unwrap();
    assert_eq!(year_2026, vec![TurnAssignment::shared(d(2026, 1, 10))]);
    assert_eq!(store.load_year(2025).unwrap().len(), 1);
}

#[test]
fn invalid_batch_writes_nothing() {
    let store = SqliteTurnStore::in_memory().unwrap();
    store
        .replace_year_assignments(2026, &[private(d(2026, 1, 3), "alice")])
        .unwrap();

    let outside = vec![
        TurnAssignment::shared(d(2026, 1, 10)),
        TurnAssignment::shared(d(2027, 1, 2)),
    ];
    let err = store.replace_year_assignments(2026, &outside).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidTurn(_)));

    let duplicate = vec![
        TurnAssignment::shared(d(2026, 1, 10)),
        private(d(2026, 1, 10), "bob"),
    ];
    assert!(store.replace_year_assignments(2026, &duplicate).is_err());

    assert_eq!(
        store.load_year(2026).unwrap(),
        vec![private(d(2026, 1, 3), "alice")]
    );
}

#[test]
fn upsert_overwrites_the_same_date() {
    let store = SqliteTurnStore::in_memory().unwrap();
    store.upsert_turn(&private(d(2026, 3, 7), "alice")).unwrap();
    store
        .upsert_turn(&TurnAssignment::shared(d(2026, 3, 7)).with_notes(Some("asado".into())))
        .unwrap();

    let turns = store.load_year(2026).unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].kind, TurnKind::Shared);
    assert_eq!(turns[0].assignee, None);
    assert_eq!(turns[0].notes.as_deref(), Some("asado"));
}

#[test]
fn upsert_rejects_inconsistent_turn() {
    let store = SqliteTurnStore::in_memory().unwrap();
    let bad = TurnAssignment {
        date: d(2026, 3, 7),
        kind: TurnKind::Shared,
        assignee: Some(UserId::new("alice")),
        notes: None,
    };
    assert!(store.upsert_turn(&bad).is_err());
    assert!(store.load_year(2026).unwrap().is_empty());
}

#[test]
fn delete_reports_whether_a_turn_existed() {
    let store = SqliteTurnStore::in_memory().unwrap();
    store.upsert_turn(&TurnAssignment::shared(d(2026, 5, 1))).unwrap();
    assert!(store.delete_turn(d(2026, 5, 1)).unwrap());
    assert!(!store.delete_turn(d(2026, 5, 1)).unwrap());
}

#[test]
fn upcoming_turns_are_ordered_and_limited() {
    let store = SqliteTurnStore::in_memory().unwrap();
    let turns: Vec<_> = [3, 4, 10, 11, 17, 18]
        .into_iter()
        .map(|day| TurnAssignment::shared(d(2026, 1, day)))
        .collect();
    store.replace_year_assignments(2026, &turns).unwrap();

    let upcoming = store.upcoming_turns(d(2026, 1, 5), 3).unwrap();
    let dates: Vec<_> = upcoming.iter().map(|t| t.date).collect();
    assert_eq!(dates, vec![d(2026, 1, 10), d(2026, 1, 11), d(2026, 1, 17)]);
    assert!(store.upcoming_turns(d(2026, 2, 1), 4).unwrap().is_empty());
}

#[test]
fn roster_keeps_insertion_order_and_renames_in_place() {
    let store = SqliteTurnStore::in_memory().unwrap();
    store.upsert_user(&User::new("carol", "Carol")).unwrap();
    store.upsert_user(&User::new("alice", "Alice")).unwrap();
    store.upsert_user(&User::new("carol", "Caro")).unwrap();

    let roster = store.roster().unwrap();
    let names: Vec<_> = roster.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["Caro", "Alice"]);
    assert!(store.upsert_user(&User::new("  ", "Nobody")).is_err());
}
