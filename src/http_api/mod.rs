use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    HolidayCalendar, LotteryError, LotterySummary, PersistenceError, RosterSource, SchedulerError,
    TurnAssignment, TurnKind, TurnScheduler, TurnStore, User, UserId, WeekendUnit, weekends_of,
};

const DEFAULT_UPCOMING_LIMIT: usize = 4;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn TurnStore + Send + Sync>,
    roster: Arc<dyn RosterSource + Send + Sync>,
    scheduler: Arc<TurnScheduler>,
    /// Serialises run-and-persist so two draws never interleave their writes.
    lottery_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// `backend` serves both as the turn store and the roster source.
    pub fn new<B>(backend: Arc<B>, scheduler: TurnScheduler) -> Self
    where
        B: TurnStore + RosterSource + Send + Sync + 'static,
    {
        Self {
            store: backend.clone(),
            roster: backend,
            scheduler: Arc::new(scheduler),
            lottery_lock: Arc::new(Mutex::new(())),
        }
    }

    fn calendar(&self) -> HolidayCalendar {
        self.scheduler.calendar().clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::InvalidTurn(_)
            | PersistenceError::InvalidRoster(_)
            | PersistenceError::InvalidData(_) => ApiError::invalid(value.to_string()),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(value: SchedulerError) -> Self {
        match value {
            SchedulerError::Lottery(err @ LotteryError::EmptyRoster { .. }) => {
                ApiError::invalid(err.to_string())
            }
            SchedulerError::Lottery(err) => ApiError::internal(err.to_string()),
            SchedulerError::Persistence(err) => err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users))
        .route("/calendar/:year", get(get_calendar))
        .route("/lottery/:year", post(run_lottery))
        .route("/turns", get(list_turns))
        .route("/turns/upcoming", get(upcoming_turns))
        .route("/turns/:date", put(put_turn).delete(delete_turn))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let roster = state.roster.roster()?;
    Ok(Json(roster.users().to_vec()))
}

#[derive(Debug, Serialize)]
struct HolidayView {
    date: NaiveDate,
    name: String,
}

#[derive(Debug, Serialize)]
struct CalendarView {
    year: i32,
    jurisdiction: String,
    covered: bool,
    holidays: Vec<HolidayView>,
    weekends: Vec<WeekendUnit>,
}

async fn get_calendar(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<CalendarView>, ApiError> {
    let calendar = state.calendar();
    let holidays = calendar
        .holidays_in_year(year)
        .map(|date| HolidayView {
            date,
            name: calendar.holiday_name(date).unwrap_or_default().to_string(),
        })
        .collect();
    Ok(Json(CalendarView {
        year,
        jurisdiction: calendar.jurisdiction().to_string(),
        covered: calendar.covers_year(year),
        holidays,
        weekends: weekends_of(year, &calendar),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct LotteryRequest {
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct LotteryResponse {
    year: i32,
    seed: u64,
    summary: LotterySummary,
    turns: Vec<TurnAssignment>,
}

async fn run_lottery(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    payload: Option<Json<LotteryRequest>>,
) -> Result<Json<LotteryResponse>, ApiError> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let seed = request.seed.unwrap_or_else(rand::random);

    // SQLite writes block, so the draw runs off the async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        let Some(_guard) = state.lottery_lock.try_lock() else {
            return Err(ApiError::Conflict("a lottery run is already in progress".into()));
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        state
            .scheduler
            .run_and_persist(year, state.roster.as_ref(), state.store.as_ref(), &mut rng)
            .inspect_err(|err| warn!(year, error = %err, "lottery request failed"))
            .map_err(ApiError::from)
    })
    .await
    .map_err(|err| ApiError::internal(format!("lottery task failed: {err}")))??;

    info!(year, seed, turns = outcome.turns.len(), "lottery run over HTTP");
    let summary = outcome.summary.clone();
    Ok(Json(LotteryResponse {
        year,
        seed,
        summary,
        turns: outcome.into_turns(),
    }))
}

#[derive(Debug, Deserialize)]
struct YearQuery {
    year: Option<i32>,
}

async fn list_turns(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<TurnAssignment>>, ApiError> {
    let year = query
        .year
        .ok_or_else(|| ApiError::invalid("query parameter 'year' is required"))?;
    Ok(Json(state.store.load_year(year)?))
}

#[derive(Debug, Deserialize)]
struct UpcomingQuery {
    from: Option<NaiveDate>,
    limit: Option<usize>,
}

async fn upcoming_turns(
    State(state): State<AppState>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<TurnAssignment>>, ApiError> {
    let from = query.from.unwrap_or_else(|| Local::now().date_naive());
    let limit = query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);
    Ok(Json(state.store.upcoming_turns(from, limit)?))
}

#[derive(Debug, Deserialize)]
struct TurnPayload {
    kind: TurnKind,
    #[serde(default)]
    assignee: Option<UserId>,
    #[serde(default)]
    notes: Option<String>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::invalid(format!("'{raw}' is not a YYYY-MM-DD date")))
}

async fn put_turn(
    State(state): State<AppState>,
    Path(raw_date): Path<String>,
    Json(payload): Json<TurnPayload>,
) -> Result<Json<TurnAssignment>, ApiError> {
    let date = parse_date(&raw_date)?;
    if let Some(assignee) = &payload.assignee {
        if !state.roster.roster()?.contains(assignee) {
            return Err(ApiError::invalid(format!("unknown user '{assignee}'")));
        }
    }
    let turn = TurnAssignment {
        date,
        kind: payload.kind,
        assignee: payload.assignee,
        notes: None,
    }
    .with_notes(payload.notes);
    turn.validate()
        .map_err(|err| ApiError::invalid(err.to_string()))?;
    state.store.upsert_turn(&turn)?;
    info!(%date, kind = %turn.kind, "turn edited over HTTP");
    Ok(Json(turn))
}

async fn delete_turn(
    State(state): State<AppState>,
    Path(raw_date): Path<String>,
) -> Result<StatusCode, ApiError> {
    let date = parse_date(&raw_date)?;
    if !state.store.delete_turn(date)? {
        return Err(ApiError::not_found(format!("no turn on {date}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
