use crate::calendar::HolidayCalendar;
use crate::lottery::{LotteryEngine, LotteryError, LotteryOutcome};
use crate::persistence::{PersistenceError, RosterSource, TurnStore};
use crate::roster::Roster;
use rand::Rng;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Lottery(#[from] LotteryError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Owns the holiday calendar and ties the lottery to its collaborators.
#[derive(Debug, Clone, Default)]
pub struct TurnScheduler {
    calendar: HolidayCalendar,
}

impl TurnScheduler {
    pub fn new(calendar: HolidayCalendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }

    pub fn run<R>(&self, year: i32, roster: &Roster, rng: &mut R) -> Result<LotteryOutcome, LotteryError>
    where
        R: Rng + ?Sized,
    {
        LotteryEngine::new(&self.calendar).run(year, roster, rng)
    }

    /// Draws `year` for the current roster and replaces whatever the store
    /// held for that year. Nothing is written when the draw fails.
    ///
    /// Callers must not run this concurrently for the same store.
    pub fn run_and_persist<R>(
        &self,
        year: i32,
        roster_source: &dyn RosterSource,
        store: &dyn TurnStore,
        rng: &mut R,
    ) -> Result<LotteryOutcome, SchedulerError>
    where
        R: Rng + ?Sized,
    {
        let roster = roster_source.roster()?;
        let outcome = self.run(year, &roster, rng)?;
        let turns: Vec<_> = outcome.turns.iter().cloned().collect();
        store.replace_year_assignments(year, &turns)?;
        info!(year, turns = turns.len(), "lottery persisted");
        Ok(outcome)
    }
}
