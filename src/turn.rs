use crate::roster::UserId;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    /// Reserved for a single co-owner.
    Private,
    /// Open to every co-owner.
    Shared,
}

impl TurnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnKind::Private => "private",
            TurnKind::Shared => "shared",
        }
    }
}

impl fmt::Display for TurnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown turn kind '{0}' (expected private or shared)")]
pub struct UnknownTurnKind(pub String);

impl FromStr for TurnKind {
    type Err = UnknownTurnKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(TurnKind::Private),
            "shared" => Ok(TurnKind::Shared),
            other => Err(UnknownTurnKind(other.to_string())),
        }
    }
}

/// One day of usage, keyed by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAssignment {
    pub date: NaiveDate,
    pub kind: TurnKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TurnAssignment {
    pub fn private(date: NaiveDate, assignee: UserId) -> Self {
        Self {
            date,
            kind: TurnKind::Private,
            assignee: Some(assignee),
            notes: None,
        }
    }

    pub fn shared(date: NaiveDate) -> Self {
        Self {
            date,
            kind: TurnKind::Shared,
            assignee: None,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|text| !text.trim().is_empty());
        self
    }

    pub fn is_private(&self) -> bool {
        self.kind == TurnKind::Private
    }

    pub fn is_shared(&self) -> bool {
        self.kind == TurnKind::Shared
    }

    pub fn validate(&self) -> Result<(), TurnValidationError> {
        match (self.kind, &self.assignee) {
            (TurnKind::Private, None) => Err(TurnValidationError::PrivateWithoutAssignee(self.date)),
            (TurnKind::Private, Some(id)) if id.as_str().trim().is_empty() => {
                Err(TurnValidationError::PrivateWithoutAssignee(self.date))
            }
            (TurnKind::Shared, Some(id)) => Err(TurnValidationError::SharedWithAssignee {
                date: self.date,
                assignee: id.clone(),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnValidationError {
    #[error("private turn on {0} requires an assignee")]
    PrivateWithoutAssignee(NaiveDate),
    #[error("shared turn on {date} cannot be assigned to {assignee}")]
    SharedWithAssignee { date: NaiveDate, assignee: UserId },
    #[error("turn on {date} is outside year {year}")]
    OutsideYear { date: NaiveDate, year: i32 },
    #[error("duplicate turn on {0}")]
    DuplicateDate(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a turn is already assigned on {0}")]
pub struct DuplicateDate(pub NaiveDate);

/// Turns keyed by date. Inserting a date twice is an error, never an
/// overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnSet {
    turns: BTreeMap<NaiveDate, TurnAssignment>,
}

impl TurnSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, turn: TurnAssignment) -> Result<(), DuplicateDate> {
        if self.turns.contains_key(&turn.date) {
            return Err(DuplicateDate(turn.date));
        }
        self.turns.insert(turn.date, turn);
        Ok(())
    }

    pub fn is_claimed(&self, date: NaiveDate) -> bool {
        self.turns.contains_key(&date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&TurnAssignment> {
        self.turns.get(&date)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Date order.
    pub fn iter(&self) -> impl Iterator<Item = &TurnAssignment> {
        self.turns.values()
    }

    pub fn into_vec(self) -> Vec<TurnAssignment> {
        self.turns.into_values().collect()
    }
}

impl Serialize for TurnSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.turns.values())
    }
}

/// Checks a batch destined for replace-by-year: every turn well formed,
/// inside `year`, and on a distinct date.
pub fn validate_year_turns(year: i32, turns: &[TurnAssignment]) -> Result<(), TurnValidationError> {
    let mut seen = TurnSet::new();
    for turn in turns {
        turn.validate()?;
        if turn.date.year() != year {
            return Err(TurnValidationError::OutsideYear {
                date: turn.date,
                year,
            });
        }
        seen.insert(turn.clone())
            .map_err(|DuplicateDate(date)| TurnValidationError::DuplicateDate(date))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn turn_set_rejects_second_insert_for_same_date() {
        let mut set = TurnSet::new();
        set.insert(TurnAssignment::shared(d(2026, 1, 1))).unwrap();
        let err = set
            .insert(TurnAssignment::private(d(2026, 1, 1), UserId::new("a")))
            .unwrap_err();
        assert_eq!(err, DuplicateDate(d(2026, 1, 1)));
        assert!(set.get(d(2026, 1, 1)).unwrap().is_shared());
    }

    #[test]
    fn kind_and_assignee_must_agree() {
        let mut shared = TurnAssignment::shared(d(2026, 3, 7));
        shared.assignee = Some(UserId::new("a"));
        assert!(shared.validate().is_err());

        let mut private = TurnAssignment::private(d(2026, 3, 8), UserId::new("a"));
        private.assignee = None;
        assert_eq!(
            private.validate(),
            Err(TurnValidationError::PrivateWithoutAssignee(d(2026, 3, 8)))
        );
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Private".parse::<TurnKind>().unwrap(), TurnKind::Private);
        assert_eq!(" shared ".parse::<TurnKind>().unwrap(), TurnKind::Shared);
        assert!("communal".parse::<TurnKind>().is_err());
    }

    #[test]
    fn blank_notes_are_dropped() {
        let turn = TurnAssignment::shared(d(2026, 1, 1)).with_notes(Some("  ".into()));
        assert_eq!(turn.notes, None);
    }

    #[test]
    fn year_batch_rejects_dates_from_other_years() {
        let turns = vec![TurnAssignment::shared(d(2027, 1, 2))];
        assert_eq!(
            validate_year_turns(2026, &turns),
            Err(TurnValidationError::OutsideYear {
                date: d(2027, 1, 2),
                year: 2026
            })
        );
    }
}
