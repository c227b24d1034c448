use chrono::{Local, NaiveDate};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, Write};
use std::path::PathBuf;
use turn_scheduler::{
    AppConfig, HolidayCalendar, LotteryOutcome, MemoryTurnStore, PersistenceResult, Roster,
    RosterSource, SchedulerError, TurnAssignment, TurnKind, TurnScheduler, TurnStore, User, UserId,
    load_calendar_from_json, load_roster_from_json, load_turns_from_csv, load_turns_from_json,
    save_turns_to_csv, save_turns_to_json, telemetry, weekends_of,
};

const DEFAULT_UPCOMING_LIMIT: usize = 4;

/// Interactive shell for the weekend turn lottery.
#[derive(Debug, Parser)]
#[command(name = "turn-scheduler", version)]
struct Args {
    /// SQLite database file; turns stay in memory when omitted.
    #[arg(long)]
    db: Option<PathBuf>,
    /// JSON roster loaded at startup.
    #[arg(long)]
    roster: Option<PathBuf>,
    /// JSON holiday table replacing the built-in Argentina 2026 one.
    #[arg(long)]
    holidays: Option<PathBuf>,
    /// Seed for every `run` that does not name its own.
    #[arg(long)]
    seed: Option<u64>,
}

enum Backend {
    Memory(MemoryTurnStore),
    #[cfg(feature = "sqlite")]
    Sqlite(turn_scheduler::SqliteTurnStore),
}

impl Backend {
    fn open(db: Option<&PathBuf>) -> PersistenceResult<Self> {
        match db {
            #[cfg(feature = "sqlite")]
            Some(path) => Ok(Backend::Sqlite(turn_scheduler::SqliteTurnStore::new(path)?)),
            #[cfg(not(feature = "sqlite"))]
            Some(path) => Err(turn_scheduler::PersistenceError::InvalidData(format!(
                "cannot open {}: built without the `sqlite` feature",
                path.display()
            ))),
            None => Ok(Backend::Memory(MemoryTurnStore::new())),
        }
    }

    fn store(&self) -> &dyn TurnStore {
        match self {
            Backend::Memory(store) => store,
            #[cfg(feature = "sqlite")]
            Backend::Sqlite(store) => store,
        }
    }

    fn roster_source(&self) -> &dyn RosterSource {
        match self {
            Backend::Memory(store) => store,
            #[cfg(feature = "sqlite")]
            Backend::Sqlite(store) => store,
        }
    }

    fn upsert_user(&self, user: User) -> PersistenceResult<()> {
        match self {
            Backend::Memory(store) => store.upsert_user(user),
            #[cfg(feature = "sqlite")]
            Backend::Sqlite(store) => store.upsert_user(&user),
        }
    }
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(ci) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(headers.iter().copied(), &widths));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out.push_str(&sep);
    out
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.zip(widths) {
        let pad = width.saturating_sub(cell.chars().count());
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad));
        line.push_str(" |");
    }
    line
}

fn turns_table(turns: &[TurnAssignment], roster: &Roster) -> String {
    let rows: Vec<Vec<String>> = turns
        .iter()
        .map(|turn| {
            let assignee = turn
                .assignee
                .as_ref()
                .map(|id| match roster.find(id) {
                    Some(user) => user.name.clone(),
                    None => id.to_string(),
                })
                .unwrap_or_default();
            vec![
                turn.date.to_string(),
                turn.date.format("%a").to_string(),
                turn.kind.to_string(),
                assignee,
                turn.notes.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render_text_table(&["date", "day", "kind", "assignee", "notes"], &rows)
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  users                              List the roster\n  user add <id> <name...>            Add a user or rename an existing one\n  holidays [year]                    List holidays (default: all)\n  weekends <year>                    List weekend units and which are long\n  run <year> [seed]                  Draw the year and replace its stored turns\n  show <year>                        Show stored turns for a year\n  set <date> private <user> [notes...]\n                                     Assign a day to a user\n  set <date> shared [notes...]       Mark a day as shared\n  delete <date>                      Remove the turn on a day\n  upcoming [YYYY-MM-DD] [limit]      Next turns from a date (default: today, 4)\n  save <json|csv> <year> <path>      Export a year's turns\n  load <json|csv> <path>             Import turns, replacing that year\n  quit|exit                          Exit"
    );
}

fn print_summary(outcome: &LotteryOutcome, seed: u64) {
    println!("Lottery complete (seed={seed}): {}", outcome.summary.to_cli_summary());
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

fn current_roster(backend: &Backend) -> Roster {
    match backend.roster_source().roster() {
        Ok(roster) => roster,
        Err(e) => {
            println!("Error reading roster: {}", e);
            Roster::default()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = AppConfig::load()?;
    if let Err(e) = telemetry::init(&config.log_level) {
        eprintln!("logging disabled: {e}");
    }

    let db = args.db.or(config.database_path);
    let roster_path = args.roster.or(config.roster_path);
    let holidays_path = args.holidays.or(config.holidays_path);

    let calendar = match holidays_path {
        Some(path) => load_calendar_from_json(path)?,
        None => HolidayCalendar::argentina_2026(),
    };
    let scheduler = TurnScheduler::new(calendar);
    let backend = Backend::open(db.as_ref())?;
    if let Some(path) = roster_path {
        let roster = load_roster_from_json(path)?;
        for user in roster.iter() {
            backend.upsert_user(user.clone())?;
        }
    }

    println!("Turn Scheduler (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "users" => {
                let roster = current_roster(&backend);
                if roster.is_empty() {
                    println!("No users. Add one with 'user add <id> <name>'.");
                    continue;
                }
                let rows: Vec<Vec<String>> = roster
                    .iter()
                    .enumerate()
                    .map(|(idx, user)| {
                        vec![(idx + 1).to_string(), user.id.to_string(), user.name.clone()]
                    })
                    .collect();
                println!("{}", render_text_table(&["#", "id", "name"], &rows));
            }
            "user" => match (parts.next(), parts.next()) {
                (Some("add"), Some(id)) => {
                    let name = parts.collect::<Vec<_>>().join(" ");
                    let name = if name.is_empty() { id.to_string() } else { name };
                    match backend.upsert_user(User::new(id, name)) {
                        Ok(_) => println!("User {id} saved."),
                        Err(e) => println!("Error saving user: {}", e),
                    }
                }
                _ => println!("Usage: user add <id> <name...>"),
            },
            "holidays" => {
                let calendar = scheduler.calendar();
                let year = match parts.next().map(str::parse::<i32>) {
                    Some(Ok(year)) => Some(year),
                    Some(Err(_)) => {
                        println!("Invalid year");
                        continue;
                    }
                    None => None,
                };
                let (first, last) = calendar.year_range();
                let years = match year {
                    Some(year) => year..=year,
                    None => first..=last,
                };
                let rows: Vec<Vec<String>> = years
                    .flat_map(|y| calendar.holidays_in_year(y).collect::<Vec<_>>())
                    .map(|date| {
                        vec![
                            date.to_string(),
                            date.format("%a").to_string(),
                            calendar.holiday_name(date).unwrap_or_default().to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "Jurisdiction {} ({}-{}), {} holidays shown.",
                    calendar.jurisdiction(),
                    first,
                    last,
                    rows.len()
                );
                println!("{}", render_text_table(&["date", "day", "name"], &rows));
            }
            "weekends" => match parts.next().map(str::parse::<i32>) {
                Some(Ok(year)) => {
                    let units = weekends_of(year, scheduler.calendar());
                    let long = units.iter().filter(|unit| unit.is_long).count();
                    let rows: Vec<Vec<String>> = units
                        .iter()
                        .map(|unit| {
                            vec![
                                unit.saturday.to_string(),
                                unit.sunday.to_string(),
                                if unit.is_long { "yes".into() } else { String::new() },
                            ]
                        })
                        .collect();
                    println!("{}", render_text_table(&["saturday", "sunday", "long"], &rows));
                    println!("{} weekends, {} long.", units.len(), long);
                }
                _ => println!("Usage: weekends <year>"),
            },
            "run" => {
                let year = match parts.next().map(str::parse::<i32>) {
                    Some(Ok(year)) => year,
                    _ => {
                        println!("Usage: run <year> [seed]");
                        continue;
                    }
                };
                let seed = match parts.next().map(str::parse::<u64>) {
                    Some(Ok(seed)) => seed,
                    Some(Err(_)) => {
                        println!("Invalid seed");
                        continue;
                    }
                    None => args.seed.unwrap_or_else(rand::random),
                };
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                match scheduler.run_and_persist(
                    year,
                    backend.roster_source(),
                    backend.store(),
                    &mut rng,
                ) {
                    Ok(outcome) => print_summary(&outcome, seed),
                    Err(SchedulerError::Lottery(e)) => println!("Lottery error: {}", e),
                    Err(SchedulerError::Persistence(e)) => println!("Error saving turns: {}", e),
                }
            }
            "show" => match parts.next().map(str::parse::<i32>) {
                Some(Ok(year)) => match backend.store().load_year(year) {
                    Ok(turns) if turns.is_empty() => println!("No turns stored for {year}."),
                    Ok(turns) => {
                        let roster = current_roster(&backend);
                        println!("{}", turns_table(&turns, &roster));
                        println!("{} turns.", turns.len());
                    }
                    Err(e) => println!("Error loading turns: {}", e),
                },
                _ => println!("Usage: show <year>"),
            },
            "set" => {
                let date = match parts.next().map(parse_date) {
                    Some(Some(date)) => date,
                    _ => {
                        println!("Usage: set <YYYY-MM-DD> <private <user>|shared> [notes...]");
                        continue;
                    }
                };
                let turn = match parts.next().map(str::parse::<TurnKind>) {
                    Some(Ok(TurnKind::Private)) => {
                        let Some(user) = parts.next() else {
                            println!("Usage: set <date> private <user> [notes...]");
                            continue;
                        };
                        let id = UserId::new(user);
                        if !current_roster(&backend).contains(&id) {
                            println!("Unknown user '{user}'.");
                            continue;
                        }
                        TurnAssignment::private(date, id)
                    }
                    Some(Ok(TurnKind::Shared)) => TurnAssignment::shared(date),
                    Some(Err(e)) => {
                        println!("{}", e);
                        continue;
                    }
                    None => {
                        println!("Usage: set <YYYY-MM-DD> <private <user>|shared> [notes...]");
                        continue;
                    }
                };
                let notes = parts.collect::<Vec<_>>().join(" ");
                let turn = turn.with_notes(Some(notes));
                match backend.store().upsert_turn(&turn) {
                    Ok(_) => println!("Turn on {date} set to {}.", turn.kind),
                    Err(e) => println!("Error saving turn: {}", e),
                }
            }
            "delete" => match parts.next().map(parse_date) {
                Some(Some(date)) => match backend.store().delete_turn(date) {
                    Ok(true) => println!("Deleted turn on {date}."),
                    Ok(false) => println!("No turn on {date}."),
                    Err(e) => println!("Error deleting turn: {}", e),
                },
                _ => println!("Usage: delete <YYYY-MM-DD>"),
            },
            "upcoming" => {
                let from = match parts.next() {
                    Some(raw) => match parse_date(raw) {
                        Some(date) => date,
                        None => {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        }
                    },
                    None => Local::now().date_naive(),
                };
                let limit = match parts.next().map(str::parse::<usize>) {
                    Some(Ok(limit)) => limit,
                    Some(Err(_)) => {
                        println!("Invalid limit");
                        continue;
                    }
                    None => DEFAULT_UPCOMING_LIMIT,
                };
                match backend.store().upcoming_turns(from, limit) {
                    Ok(turns) if turns.is_empty() => println!("No turns on or after {from}."),
                    Ok(turns) => {
                        let roster = current_roster(&backend);
                        println!("{}", turns_table(&turns, &roster));
                    }
                    Err(e) => println!("Error loading turns: {}", e),
                }
            }
            "save" => {
                let fmt = parts.next();
                let year = parts.next().map(str::parse::<i32>);
                let path = parts.next();
                let (fmt, year, path) = match (fmt, year, path) {
                    (Some(fmt @ ("json" | "csv")), Some(Ok(year)), Some(path)) => (fmt, year, path),
                    _ => {
                        println!("Usage: save <json|csv> <year> <path>");
                        continue;
                    }
                };
                let turns = match backend.store().load_year(year) {
                    Ok(turns) => turns,
                    Err(e) => {
                        println!("Error loading turns: {}", e);
                        continue;
                    }
                };
                let result = if fmt == "json" {
                    save_turns_to_json(year, &turns, path)
                } else {
                    save_turns_to_csv(year, &turns, path)
                };
                match result {
                    Ok(_) => println!("Saved {} turns of {year} to {}.", turns.len(), path),
                    Err(e) => println!("Error saving turns: {}", e),
                }
            }
            "load" => {
                let fmt = parts.next();
                let path = parts.next();
                let loaded = match (fmt, path) {
                    (Some("json"), Some(path)) => load_turns_from_json(path),
                    (Some("csv"), Some(path)) => load_turns_from_csv(path),
                    _ => {
                        println!("Usage: load <json|csv> <path>");
                        continue;
                    }
                };
                match loaded {
                    Ok((year, turns)) => match backend.store().replace_year_assignments(year, &turns) {
                        Ok(_) => println!("Loaded {} turns for {year}.", turns.len()),
                        Err(e) => println!("Error storing turns: {}", e),
                    },
                    Err(e) => println!("Error loading turns: {}", e),
                }
            }
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }

    tracing::debug!("cli session ended");
    Ok(())
}
