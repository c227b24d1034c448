use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use turn_scheduler::{
    HolidayCalendar, LotteryError, MemoryTurnStore, Roster, SchedulerError, TurnAssignment,
    TurnScheduler, TurnStore, User,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn roster() -> Roster {
    Roster::new(vec![
        User::new("alice", "Alice"),
        User::new("bob", "Bob"),
        User::new("carol", "Carol"),
    ])
    .unwrap()
}

#[test]
fn run_and_persist_replaces_the_stored_year() {
    let store = MemoryTurnStore::with_roster(&roster());
    store
        .upsert_turn(&TurnAssignment::shared(d(2026, 6, 3)))
        .unwrap();
    store
        .upsert_turn(&TurnAssignment::shared(d(2025, 12, 27)))
        .unwrap();

    let scheduler = TurnScheduler::default();
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let outcome = scheduler
        .run_and_persist(2026, &store, &store, &mut rng)
        .unwrap();

    let stored = store.load_year(2026).unwrap();
    assert_eq!(stored.len(), outcome.turns.len());
    assert_eq!(stored, outcome.into_turns());
    // The stray Wednesday is gone, the previous year is untouched.
    assert!(stored.iter().all(|t| t.date != d(2026, 6, 3)));
    assert_eq!(store.load_year(2025).unwrap().len(), 1);
}

#[test]
fn rerunning_a_year_never_duplicates() {
    let store = MemoryTurnStore::with_roster(&roster());
    let scheduler = TurnScheduler::new(HolidayCalendar::argentina_2026());
    for seed in [1, 2] {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        scheduler
            .run_and_persist(2026, &store, &store, &mut rng)
            .unwrap();
    }
    assert_eq!(store.load_year(2026).unwrap().len(), 120);
}

#[test]
fn failed_draw_leaves_the_store_untouched() {
    let store = MemoryTurnStore::new();
    store
        .upsert_turn(&TurnAssignment::shared(d(2026, 1, 3)))
        .unwrap();

    let scheduler = TurnScheduler::default();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let err = scheduler
        .run_and_persist(2026, &store, &store, &mut rng)
        .unwrap_err();
    assert!(matches!(
        err,
        SchedulerError::Lottery(LotteryError::EmptyRoster { year: 2026 })
    ));
    assert_eq!(store.load_year(2026).unwrap().len(), 1);
}

#[test]
fn roster_value_can_drive_the_draw() {
    let store = MemoryTurnStore::new();
    let scheduler = TurnScheduler::default();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let roster = roster();
    scheduler
        .run_and_persist(2026, &roster, &store, &mut rng)
        .unwrap();
    assert!(!store.load_year(2026).unwrap().is_empty());
}
