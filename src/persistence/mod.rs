use crate::calendar::CalendarError;
use crate::roster::{Roster, RosterError, User};
use crate::turn::{self, TurnAssignment, TurnValidationError};
use chrono::{Datelike, NaiveDate};
use serde_json::Error as SerdeJsonError;
use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid turn: {0}")]
    InvalidTurn(#[from] TurnValidationError),
    #[error("invalid roster: {0}")]
    InvalidRoster(#[from] RosterError),
    #[error("invalid calendar: {0}")]
    InvalidCalendar(#[from] CalendarError),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("store lock poisoned")]
    LockPoisoned,
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Database(Box::new(value))
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Where turn assignments live between runs.
pub trait TurnStore {
    /// Deletes every turn of `year` and inserts `turns`, all or nothing.
    fn replace_year_assignments(&self, year: i32, turns: &[TurnAssignment]) -> PersistenceResult<()>;
    /// Turns of `year` in date order.
    fn load_year(&self, year: i32) -> PersistenceResult<Vec<TurnAssignment>>;
    /// Manual edit: replaces the turn on the same date or inserts a new one.
    fn upsert_turn(&self, turn: &TurnAssignment) -> PersistenceResult<()>;
    fn delete_turn(&self, date: NaiveDate) -> PersistenceResult<bool>;
    /// At most `limit` turns on or after `from`, in date order.
    fn upcoming_turns(&self, from: NaiveDate, limit: usize) -> PersistenceResult<Vec<TurnAssignment>>;
}

/// The user directory the lottery draws its roster from.
pub trait RosterSource {
    fn roster(&self) -> PersistenceResult<Roster>;
}

/// Keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryTurnStore {
    turns: Mutex<BTreeMap<NaiveDate, TurnAssignment>>,
    users: Mutex<Vec<User>>,
}

impl MemoryTurnStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(roster: &Roster) -> Self {
        Self {
            turns: Mutex::default(),
            users: Mutex::new(roster.users().to_vec()),
        }
    }

    /// Appends a user, or renames the one with the same id.
    pub fn upsert_user(&self, user: User) -> PersistenceResult<()> {
        let mut users = self.users.lock().map_err(|_| PersistenceError::LockPoisoned)?;
        let mut updated = users.clone();
        match updated.iter_mut().find(|existing| existing.id == user.id) {
            Some(existing) => existing.name = user.name,
            None => updated.push(user),
        }
        Roster::new(updated.clone())?;
        *users = updated;
        Ok(())
    }
}

impl TurnStore for MemoryTurnStore {
    fn replace_year_assignments(&self, year: i32, turns: &[TurnAssignment]) -> PersistenceResult<()> {
        turn::validate_year_turns(year, turns)?;
        let mut stored = self.turns.lock().map_err(|_| PersistenceError::LockPoisoned)?;
        stored.retain(|date, _| date.year() != year);
        for turn in turns {
            stored.insert(turn.date, turn.clone());
        }
        debug!(year, count = turns.len(), "replaced year in memory store");
        Ok(())
    }

    fn load_year(&self, year: i32) -> PersistenceResult<Vec<TurnAssignment>> {
        let stored = self.turns.lock().map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(stored
            .values()
            .filter(|turn| turn.date.year() == year)
            .cloned()
            .collect())
    }

    fn upsert_turn(&self, turn: &TurnAssignment) -> PersistenceResult<()> {
        turn.validate()?;
        let mut stored = self.turns.lock().map_err(|_| PersistenceError::LockPoisoned)?;
        stored.insert(turn.date, turn.clone());
        Ok(())
    }

    fn delete_turn(&self, date: NaiveDate) -> PersistenceResult<bool> {
        let mut stored = self.turns.lock().map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(stored.remove(&date).is_some())
    }

    fn upcoming_turns(&self, from: NaiveDate, limit: usize) -> PersistenceResult<Vec<TurnAssignment>> {
        let stored = self.turns.lock().map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(stored.range(from..).take(limit).map(|(_, turn)| turn.clone()).collect())
    }
}

impl RosterSource for MemoryTurnStore {
    fn roster(&self) -> PersistenceResult<Roster> {
        let users = self.users.lock().map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(Roster::new(users.clone())?)
    }
}

impl RosterSource for Roster {
    fn roster(&self) -> PersistenceResult<Roster> {
        Ok(self.clone())
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_calendar_from_json, load_roster_from_json, load_turns_from_csv, load_turns_from_json,
    save_calendar_to_json, save_roster_to_json, save_turns_to_csv, save_turns_to_json,
};
