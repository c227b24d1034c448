use super::{PersistenceError, PersistenceResult};
use crate::calendar::{HolidayCalendar, HolidayCalendarConfig};
use crate::roster::{Roster, UserId};
use crate::turn::{self, TurnAssignment, TurnKind};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct YearSnapshot {
    year: i32,
    turns: Vec<TurnAssignment>,
}

pub fn save_turns_to_json<P: AsRef<Path>>(
    year: i32,
    turns: &[TurnAssignment],
    path: P,
) -> PersistenceResult<()> {
    turn::validate_year_turns(year, turns)?;
    let snapshot = YearSnapshot {
        year,
        turns: turns.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

/// Returns the snapshot's year and its turns.
pub fn load_turns_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<(i32, Vec<TurnAssignment>)> {
    let file = File::open(path)?;
    let snapshot: YearSnapshot = serde_json::from_reader(file)?;
    turn::validate_year_turns(snapshot.year, &snapshot.turns)?;
    Ok((snapshot.year, snapshot.turns))
}

#[derive(Default, Serialize, Deserialize)]
struct TurnCsvRecord {
    date: String,
    kind: String,
    #[serde(default)]
    assignee: String,
    #[serde(default)]
    notes: String,
}

impl From<&TurnAssignment> for TurnCsvRecord {
    fn from(turn: &TurnAssignment) -> Self {
        Self {
            date: turn.date.format("%Y-%m-%d").to_string(),
            kind: turn.kind.as_str().to_string(),
            assignee: turn
                .assignee
                .as_ref()
                .map(|id| id.as_str().to_string())
                .unwrap_or_default(),
            notes: turn.notes.clone().unwrap_or_default(),
        }
    }
}

impl TurnCsvRecord {
    fn into_turn(self) -> PersistenceResult<TurnAssignment> {
        let date = parse_date(&self.date)?;
        let kind = self
            .kind
            .parse::<TurnKind>()
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        let assignee = parse_string_option(self.assignee).map(UserId::new);
        let turn = TurnAssignment {
            date,
            kind,
            assignee,
            notes: parse_string_option(self.notes),
        };
        turn.validate()?;
        Ok(turn)
    }
}

pub fn save_turns_to_csv<P: AsRef<Path>>(
    year: i32,
    turns: &[TurnAssignment],
    path: P,
) -> PersistenceResult<()> {
    turn::validate_year_turns(year, turns)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for turn in turns {
        writer.serialize(TurnCsvRecord::from(turn))?;
    }
    writer.flush()?;
    Ok(())
}

/// The year is taken from the first row; every row must share it.
pub fn load_turns_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<(i32, Vec<TurnAssignment>)> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut turns = Vec::new();
    for record in reader.deserialize::<TurnCsvRecord>() {
        turns.push(record?.into_turn()?);
    }
    let Some(year) = turns.first().map(|turn| turn.date.year()) else {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no turns".into(),
        ));
    };
    turn::validate_year_turns(year, &turns)?;
    Ok((year, turns))
}

/// Reads a JSON array of `{ "id", "name" }` objects.
pub fn load_roster_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Roster> {
    let file = File::open(path)?;
    let roster: Roster = serde_json::from_reader(file)?;
    Ok(roster)
}

pub fn save_roster_to_json<P: AsRef<Path>>(roster: &Roster, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, roster)?;
    Ok(())
}

pub fn load_calendar_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<HolidayCalendar> {
    let file = File::open(path)?;
    let config: HolidayCalendarConfig = serde_json::from_reader(file)?;
    Ok(HolidayCalendar::from_config(&config)?)
}

pub fn save_calendar_to_json<P: AsRef<Path>>(
    calendar: &HolidayCalendar,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &calendar.to_config())?;
    Ok(())
}

fn parse_date(input: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
