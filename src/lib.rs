pub mod calendar;
pub mod config;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod injector;
pub mod lottery;
pub mod persistence;
pub mod roster;
pub mod scheduler;
pub mod telemetry;
pub mod turn;
pub mod weekend;

pub use calendar::{CalendarError, HolidayCalendar, HolidayCalendarConfig, HolidayEntry};
pub use config::{AppConfig, ConfigError};
pub use lottery::{LotteryEngine, LotteryError, LotteryOutcome, LotterySummary, UserTally, run_lottery};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteTurnStore;
pub use persistence::{
    MemoryTurnStore, PersistenceError, PersistenceResult, RosterSource, TurnStore,
    load_calendar_from_json, load_roster_from_json, load_turns_from_csv, load_turns_from_json,
    save_calendar_to_json, save_roster_to_json, save_turns_to_csv, save_turns_to_json,
};
pub use roster::{Roster, RosterError, User, UserId};
pub use scheduler::{SchedulerError, TurnScheduler};
pub use turn::{DuplicateDate, TurnAssignment, TurnKind, TurnSet, TurnValidationError};
pub use weekend::{WeekendUnit, is_long_weekend, weekends_of};
