#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use tracing::info;
    use turn_scheduler::http_api::{self, AppState};
    use turn_scheduler::{
        AppConfig, HolidayCalendar, MemoryTurnStore, Roster, TurnScheduler, load_calendar_from_json,
        load_roster_from_json, telemetry,
    };

    let config = AppConfig::load()?;
    telemetry::init(&config.log_level)?;

    let calendar = match &config.holidays_path {
        Some(path) => load_calendar_from_json(path)?,
        None => HolidayCalendar::argentina_2026(),
    };
    let roster = match &config.roster_path {
        Some(path) => load_roster_from_json(path)?,
        None => Roster::default(),
    };
    info!(
        jurisdiction = calendar.jurisdiction(),
        users = roster.len(),
        "configuration loaded"
    );
    let scheduler = TurnScheduler::new(calendar);

    let state = match &config.database_path {
        #[cfg(feature = "sqlite")]
        Some(path) => {
            let store = turn_scheduler::SqliteTurnStore::new(path)?;
            for user in roster.iter() {
                store.upsert_user(user)?;
            }
            info!(path = %path.display(), "using SQLite store");
            AppState::new(Arc::new(store), scheduler)
        }
        _ => {
            info!("using in-memory store");
            AppState::new(Arc::new(MemoryTurnStore::with_roster(&roster)), scheduler)
        }
    };

    println!("turn-scheduler HTTP API listening on http://{}", config.http_addr);
    http_api::serve(config.http_addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
