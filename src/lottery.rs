//! Year lottery: long weekends first, then regular weekends, then the
//! days neither pass reaches.
//!
//! Every stage writes into one [`TurnSet`] owned by the run. A date that is
//! already in the set is "claimed" and skipped by later stages, so the
//! output never carries two turns for the same day.

use crate::calendar::HolidayCalendar;
use crate::injector;
use crate::roster::{Roster, User, UserId};
use crate::turn::{DuplicateDate, TurnAssignment, TurnSet};
use crate::weekend::{self, WeekendUnit};
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Private days handed to the winner of a long weekend, after the one
/// mandatory Shared day has been taken.
pub const PRIVATE_DAYS_PER_LONG_WEEKEND: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LotteryError {
    #[error("cannot run the {year} lottery with an empty roster")]
    EmptyRoster { year: i32 },
    #[error("lottery assigned {date} twice; refusing to overwrite")]
    InvariantViolation { date: NaiveDate },
}

impl From<DuplicateDate> for LotteryError {
    fn from(value: DuplicateDate) -> Self {
        LotteryError::InvariantViolation { date: value.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTally {
    pub user: UserId,
    pub name: String,
    pub private_turns: usize,
    /// Private days won on long weekends; the quantity the draw balances.
    pub long_weekend_days: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotterySummary {
    pub year: i32,
    pub long_weekends: usize,
    pub regular_weekends: usize,
    pub private_turns: usize,
    pub shared_turns: usize,
    pub weekday_holidays: usize,
    pub boundary_days: usize,
    /// Roster order.
    pub per_user: Vec<UserTally>,
}

impl LotterySummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = vec![
            format!("year={}", self.year),
            format!("long={}", self.long_weekends),
            format!("regular={}", self.regular_weekends),
            format!("private={}", self.private_turns),
            format!("shared={}", self.shared_turns),
        ];
        if self.weekday_holidays > 0 {
            parts.push(format!("holidays={}", self.weekday_holidays));
        }
        if self.boundary_days > 0 {
            parts.push(format!("boundary={}", self.boundary_days));
        }
        let users = self
            .per_user
            .iter()
            .map(|tally| format!("{}:{}/{}", tally.name, tally.private_turns, tally.long_weekend_days))
            .collect::<Vec<_>>()
            .join(" ");
        if !users.is_empty() {
            parts.push(format!("users={users}"));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LotteryOutcome {
    pub year: i32,
    pub turns: TurnSet,
    pub summary: LotterySummary,
}

impl LotteryOutcome {
    /// Turns in date order.
    pub fn into_turns(self) -> Vec<TurnAssignment> {
        self.turns.into_vec()
    }
}

pub struct LotteryEngine<'a> {
    calendar: &'a HolidayCalendar,
}

impl<'a> LotteryEngine<'a> {
    pub fn new(calendar: &'a HolidayCalendar) -> Self {
        Self { calendar }
    }

    pub fn run<R>(&self, year: i32, roster: &Roster, rng: &mut R) -> Result<LotteryOutcome, LotteryError>
    where
        R: Rng + ?Sized,
    {
        if roster.is_empty() {
            return Err(LotteryError::EmptyRoster { year });
        }
        if !self.calendar.covers_year(year) {
            warn!(
                year,
                jurisdiction = self.calendar.jurisdiction(),
                "no holiday table for this year; only plain weekends will be drawn"
            );
        }

        let (long, regular): (Vec<WeekendUnit>, Vec<WeekendUnit>) =
            weekend::weekends_of(year, self.calendar)
                .into_iter()
                .partition(|unit| unit.is_long);

        let mut claimed = TurnSet::new();
        let long_weekend_days = self.distribute_long_weekends(year, &long, roster, rng, &mut claimed)?;
        let regular_count = self.assign_regular_weekends(year, &regular, roster, rng, &mut claimed)?;
        let weekday_holidays = injector::inject_weekday_holidays(year, self.calendar, &mut claimed)?;
        let boundary_days = injector::inject_boundary_weekend_days(year, self.calendar, &mut claimed)?;

        let summary = summarize(
            year,
            roster,
            &claimed,
            long.len(),
            regular_count,
            weekday_holidays,
            boundary_days,
            &long_weekend_days,
        );
        info!(
            year,
            turns = claimed.len(),
            long_weekends = summary.long_weekends,
            regular_weekends = summary.regular_weekends,
            "lottery complete"
        );
        Ok(LotteryOutcome {
            year,
            turns: claimed,
            summary,
        })
    }

    /// Stage 1. Returns the Private days each roster position received.
    fn distribute_long_weekends<R>(
        &self,
        year: i32,
        long: &[WeekendUnit],
        roster: &Roster,
        rng: &mut R,
        claimed: &mut TurnSet,
    ) -> Result<Vec<usize>, LotteryError>
    where
        R: Rng + ?Sized,
    {
        let mut tally = vec![0usize; roster.len()];
        let mut order = long.to_vec();
        order.shuffle(rng);

        for unit in order {
            let mut candidates: Vec<NaiveDate> = unit
                .span()
                .into_iter()
                .filter(|date| {
                    date.year() == year
                        && !claimed.is_claimed(*date)
                        && self.calendar.is_weekend_or_holiday(*date)
                })
                .collect();
            if candidates.is_empty() {
                debug!(saturday = %unit.saturday, "long weekend has no free days");
                continue;
            }
            candidates.shuffle(rng);

            let Some(winner) = least_loaded(&tally) else {
                return Err(LotteryError::EmptyRoster { year });
            };
            let user = &roster.users()[winner];

            if let Some(shared_day) = candidates.pop() {
                claimed.insert(self.annotate(TurnAssignment::shared(shared_day)))?;
            }
            let mut granted = 0;
            while granted < PRIVATE_DAYS_PER_LONG_WEEKEND {
                let Some(day) = candidates.pop() else { break };
                claimed.insert(self.annotate(TurnAssignment::private(day, user.id.clone())))?;
                granted += 1;
            }
            // Only a Friday-to-Monday bridge leaves a fourth day over.
            for day in candidates {
                claimed.insert(self.annotate(TurnAssignment::shared(day)))?;
            }

            tally[winner] += granted;
            debug!(
                saturday = %unit.saturday,
                user = %user.id,
                private_days = granted,
                "long weekend drawn"
            );
        }
        Ok(tally)
    }

    /// Stage 2. Returns how many weekends were split.
    fn assign_regular_weekends<R>(
        &self,
        year: i32,
        regular: &[WeekendUnit],
        roster: &Roster,
        rng: &mut R,
        claimed: &mut TurnSet,
    ) -> Result<usize, LotteryError>
    where
        R: Rng + ?Sized,
    {
        let mut rotation: Vec<&User> = roster.iter().collect();
        rotation.shuffle(rng);
        if rotation.is_empty() {
            return Err(LotteryError::EmptyRoster { year });
        }

        let mut processed = 0;
        for unit in regular {
            // Units crossing into the next year are handled by the injector.
            if !unit.within_year(year) {
                continue;
            }
            if claimed.is_claimed(unit.saturday) || claimed.is_claimed(unit.sunday) {
                continue;
            }
            let user = rotation[processed % rotation.len()];
            processed += 1;

            let (private_day, shared_day) = if rng.gen_bool(0.5) {
                (unit.saturday, unit.sunday)
            } else {
                (unit.sunday, unit.saturday)
            };
            claimed.insert(self.annotate(TurnAssignment::private(private_day, user.id.clone())))?;
            claimed.insert(self.annotate(TurnAssignment::shared(shared_day)))?;
        }
        debug!(year, weekends = processed, "regular weekends drawn");
        Ok(processed)
    }

    fn annotate(&self, turn: TurnAssignment) -> TurnAssignment {
        let notes = self.calendar.holiday_name(turn.date).map(str::to_string);
        turn.with_notes(notes)
    }
}

/// Index of the smallest count; the earliest index wins ties.
fn least_loaded(tally: &[usize]) -> Option<usize> {
    tally
        .iter()
        .enumerate()
        .min_by_key(|(_, count)| **count)
        .map(|(idx, _)| idx)
}

#[allow(clippy::too_many_arguments)]
fn summarize(
    year: i32,
    roster: &Roster,
    turns: &TurnSet,
    long_weekends: usize,
    regular_weekends: usize,
    weekday_holidays: usize,
    boundary_days: usize,
    long_weekend_days: &[usize],
) -> LotterySummary {
    let per_user = roster
        .iter()
        .zip(long_weekend_days.iter().copied())
        .map(|(user, long_weekend_days)| UserTally {
            user: user.id.clone(),
            name: user.name.clone(),
            private_turns: turns
                .iter()
                .filter(|turn| turn.assignee.as_ref() == Some(&user.id))
                .count(),
            long_weekend_days,
        })
        .collect();
    let private_turns = turns.iter().filter(|turn| turn.is_private()).count();
    LotterySummary {
        year,
        long_weekends,
        regular_weekends,
        private_turns,
        shared_turns: turns.len() - private_turns,
        weekday_holidays,
        boundary_days,
        per_user,
    }
}

/// Runs the lottery and returns the turns in date order.
pub fn run_lottery<R>(
    year: i32,
    roster: &Roster,
    calendar: &HolidayCalendar,
    rng: &mut R,
) -> Result<Vec<TurnAssignment>, LotteryError>
where
    R: Rng + ?Sized,
{
    LotteryEngine::new(calendar)
        .run(year, roster, rng)
        .map(LotteryOutcome::into_turns)
}
