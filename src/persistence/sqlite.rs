use super::{PersistenceError, PersistenceResult, RosterSource, TurnStore};
use crate::roster::{Roster, User, UserId};
use crate::turn::{self, TurnAssignment, TurnKind};
use chrono::NaiveDate;
use rusqlite::{Connection, Row, Transaction, params};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteTurnStore {
    connection: Mutex<Connection>,
}

impl SqliteTurnStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                position INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS turns (
                turn_date TEXT PRIMARY KEY,
                kind TEXT NOT NULL CHECK (kind IN ('private', 'shared')),
                assigned_to TEXT,
                notes TEXT
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)
    }

    /// Appends a user at the end of the roster, or renames an existing one
    /// in place.
    pub fn upsert_user(&self, user: &User) -> PersistenceResult<()> {
        if user.id.as_str().trim().is_empty() {
            return Err(PersistenceError::InvalidData("user id cannot be empty".into()));
        }
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (id, name, position)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1 FROM users))
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![user.id.as_str(), user.name],
        )?;
        Ok(())
    }

    fn insert_turns(tx: &Transaction, turns: &[TurnAssignment]) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO turns (turn_date, kind, assigned_to, notes) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for turn in turns {
            stmt.execute(params![
                format_date(turn.date),
                turn.kind.as_str(),
                turn.assignee.as_ref().map(UserId::as_str),
                turn.notes,
            ])?;
        }
        Ok(())
    }

    fn query_turns(
        conn: &Connection,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> PersistenceResult<Vec<TurnAssignment>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, TurnRow::from_row)?;
        let mut turns = Vec::new();
        for row in rows {
            turns.push(row?.into_turn()?);
        }
        Ok(turns)
    }
}

struct TurnRow {
    date: String,
    kind: String,
    assigned_to: Option<String>,
    notes: Option<String>,
}

impl TurnRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            date: row.get(0)?,
            kind: row.get(1)?,
            assigned_to: row.get(2)?,
            notes: row.get(3)?,
        })
    }

    fn into_turn(self) -> PersistenceResult<TurnAssignment> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(|err| {
            PersistenceError::InvalidData(format!("invalid stored date '{}': {err}", self.date))
        })?;
        let kind = self
            .kind
            .parse::<TurnKind>()
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        Ok(TurnAssignment {
            date,
            kind,
            assignee: self.assigned_to.map(UserId::new),
            notes: self.notes,
        })
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn year_bounds(year: i32) -> PersistenceResult<(String, String)> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1);
    let last = NaiveDate::from_ymd_opt(year, 12, 31);
    match (first, last) {
        (Some(first), Some(last)) => Ok((format_date(first), format_date(last))),
        _ => Err(PersistenceError::InvalidData(format!("year {year} is out of range"))),
    }
}

impl TurnStore for SqliteTurnStore {
    fn replace_year_assignments(&self, year: i32, turns: &[TurnAssignment]) -> PersistenceResult<()> {
        turn::validate_year_turns(year, turns)?;
        let (first, last) = year_bounds(year)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM turns WHERE turn_date BETWEEN ?1 AND ?2",
            params![first, last],
        )?;
        Self::insert_turns(&tx, turns)?;
        tx.commit()?;
        info!(year, removed, inserted = turns.len(), "replaced year assignments");
        Ok(())
    }

    fn load_year(&self, year: i32) -> PersistenceResult<Vec<TurnAssignment>> {
        let (first, last) = year_bounds(year)?;
        let conn = self.lock()?;
        Self::query_turns(
            &conn,
            "SELECT turn_date, kind, assigned_to, notes FROM turns
             WHERE turn_date BETWEEN ?1 AND ?2 ORDER BY turn_date ASC",
            params![first, last],
        )
    }

    fn upsert_turn(&self, turn: &TurnAssignment) -> PersistenceResult<()> {
        turn.validate()?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO turns (turn_date, kind, assigned_to, notes) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(turn_date) DO UPDATE SET
                kind = excluded.kind,
                assigned_to = excluded.assigned_to,
                notes = excluded.notes",
            params![
                format_date(turn.date),
                turn.kind.as_str(),
                turn.assignee.as_ref().map(UserId::as_str),
                turn.notes,
            ],
        )?;
        debug!(date = %turn.date, kind = %turn.kind, "upserted turn");
        Ok(())
    }

    fn delete_turn(&self, date: NaiveDate) -> PersistenceResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM turns WHERE turn_date = ?1",
            params![format_date(date)],
        )?;
        Ok(removed > 0)
    }

    fn upcoming_turns(&self, from: NaiveDate, limit: usize) -> PersistenceResult<Vec<TurnAssignment>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.lock()?;
        Self::query_turns(
            &conn,
            "SELECT turn_date, kind, assigned_to, notes FROM turns
             WHERE turn_date >= ?1 ORDER BY turn_date ASC LIMIT ?2",
            params![format_date(from), limit],
        )
    }
}

impl RosterSource for SqliteTurnStore {
    fn roster(&self) -> PersistenceResult<Roster> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, name FROM users ORDER BY position ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(User::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut users = Vec::new();
        for user in rows {
            users.push(user?);
        }
        Ok(Roster::new(users)?)
    }
}
