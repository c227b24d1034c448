use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeSet, HashMap};
use turn_scheduler::lottery::PRIVATE_DAYS_PER_LONG_WEEKEND;
use turn_scheduler::{HolidayCalendar, LotteryEngine, Roster, TurnKind, User, weekends_of};

fn roster_of(size: usize) -> Roster {
    Roster::new(
        (0..size)
            .map(|idx| User::new(format!("u{idx}"), format!("Owner {idx}")))
            .collect(),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn draws_are_well_formed(seed in any::<u64>(), size in 1usize..6) {
        let cal = HolidayCalendar::argentina_2026();
        let roster = roster_of(size);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let outcome = LotteryEngine::new(&cal).run(2026, &roster, &mut rng).unwrap();
        let turns = outcome.into_turns();

        let dates: BTreeSet<_> = turns.iter().map(|t| t.date).collect();
        prop_assert_eq!(dates.len(), turns.len());
        prop_assert_eq!(turns.len(), 120);

        for turn in &turns {
            prop_assert_eq!(turn.date.year(), 2026);
            prop_assert!(turn.validate().is_ok());
            if let Some(id) = &turn.assignee {
                prop_assert!(roster.contains(id));
            }
        }
    }

    #[test]
    fn long_weekend_private_days_follow_the_min_load_bound(seed in any::<u64>(), size in 1usize..6) {
        let cal = HolidayCalendar::argentina_2026();
        let roster = roster_of(size);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let outcome = LotteryEngine::new(&cal).run(2026, &roster, &mut rng).unwrap();

        let long_days: BTreeSet<NaiveDate> = weekends_of(2026, &cal)
            .into_iter()
            .filter(|u| u.is_long)
            .flat_map(|u| u.span())
            .collect();
        let days: Vec<usize> = roster
            .iter()
            .map(|user| {
                outcome
                    .turns
                    .iter()
                    .filter(|t| long_days.contains(&t.date) && t.assignee.as_ref() == Some(&user.id))
                    .count()
            })
            .collect();
        prop_assert_eq!(days.iter().sum::<usize>(), 19);

        let max = days.iter().copied().max().unwrap_or(0);
        let min = days.iter().copied().min().unwrap_or(0);
        // Grants come in chunks of one or two days, so the greedy pick keeps
        // the spread within one chunk. Four owners cannot do better: 19 days
        // with a single odd chunk leave only one owner on an odd count.
        prop_assert!(max - min <= PRIVATE_DAYS_PER_LONG_WEEKEND, "days {:?}", days);
        if size != 4 {
            prop_assert!(max - min <= 1, "days {:?}", days);
        }
    }

    #[test]
    fn every_regular_weekend_is_split(seed in any::<u64>(), size in 1usize..6) {
        let cal = HolidayCalendar::argentina_2026();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let outcome = LotteryEngine::new(&cal).run(2026, &roster_of(size), &mut rng).unwrap();
        let kinds: HashMap<_, _> = outcome.turns.iter().map(|t| (t.date, t.kind)).collect();

        for unit in weekends_of(2026, &cal).into_iter().filter(|u| !u.is_long) {
            let pair = [kinds[&unit.saturday], kinds[&unit.sunday]];
            prop_assert!(pair.contains(&TurnKind::Private));
            prop_assert!(pair.contains(&TurnKind::Shared));
        }
    }
}
