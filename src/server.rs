//! JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/api/notes` | Scan, chunk, and store a note |
//! | `GET`  | `/api/notes` | List stored notes |
//! | `GET`  | `/api/notes/{doc_id}` | One note with its chunks |
//! | `POST` | `/api/ask` | Grounded answer with cited chunks |
//! | `POST` | `/api/plan-week` | Weekly study plan as a `.ics` download |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must be 3..=500 characters" } }
//! ```
//!
//! | Code | Status | Meaning |
//! |------|--------|---------|
//! | `bad_request` | 400 | Malformed JSON or out-of-range field |
//! | `blocked` | 400 | Detector rejected the request text |
//! | `not_found` | 404 | Unknown document id |
//! | `internal` | 500 | Generated output failed validation |
//!
//! `internal` responses carry a fixed message; the detail goes to the log.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ask::{answer_question, Answer};
use crate::chunk::ChunkOptions;
use crate::config::Config;
use crate::detect::detect;
use crate::ics::{export_calendar, CONTENT_TYPE, FILENAME};
use crate::ids::{IdGenerator, RandomIds};
use crate::ingest::{submit_note, NoteReceipt};
use crate::models::{Document, DocumentSummary};
use crate::planner::{build_weekly_plan, validate_plan_request, PlanRequest};
use crate::store::{InMemoryRepository, Repository};

const NOTE_TITLE_CHARS: (usize, usize) = (1, 80);
const NOTE_TEXT_CHARS: (usize, usize) = (20, 200_000);
const QUESTION_CHARS: (usize, usize) = (3, 500);

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    repo: Arc<dyn Repository>,
    ids: Arc<dyn IdGenerator>,
}

impl AppState {
    pub fn new(config: Config, repo: Arc<dyn Repository>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            config: Arc::new(config),
            repo,
            ids,
        }
    }
}

/// Starts the HTTP server with a fresh in-memory repository.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> Result<()> {
    run_server_with_repository(config, Arc::new(InMemoryRepository::new())).await
}

/// Starts the HTTP server on top of an existing repository.
pub async fn run_server_with_repository(
    config: &Config,
    repo: Arc<dyn Repository>,
) -> Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState::new(config.clone(), repo, Arc::new(RandomIds));
    let app = router(state)?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("study server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with CORS, body limit, and request tracing.
pub fn router(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.config.server.cors_origin)?;
    let body_limit = state.config.server.max_body_bytes;

    Ok(Router::new()
        .route("/health", get(handle_health))
        .route("/api/notes", post(handle_add_note).get(handle_list_notes))
        .route("/api/notes/{doc_id}", get(handle_get_note))
        .route("/api/ask", post(handle_ask))
        .route("/api/plan-week", post(handle_plan_week))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    if origin == "*" {
        Ok(layer.allow_origin(Any))
    } else {
        let value = HeaderValue::from_str(origin)
            .with_context(|| format!("Invalid server.cors_origin: {}", origin))?;
        Ok(layer.allow_origin(value))
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn blocked() -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "blocked",
        message: "Request blocked for safety.".to_string(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal(message: &str) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.to_string(),
    }
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected request body");
            Err(bad_request("Invalid input."))
        }
    }
}

fn check_len(field: &str, value: &str, (min, max): (usize, usize)) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(bad_request(format!(
            "{} must be {}..={} characters",
            field, min, max
        )));
    }
    Ok(())
}

/// Reject text the detector classifies as blocked.
fn screen(field: &str, text: &str) -> Result<(), AppError> {
    let risk = detect(text);
    if risk.blocked {
        tracing::warn!(field, matched = ?risk.matched, "request blocked by injection detector");
        return Err(blocked());
    }
    Ok(())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /api/notes ============

#[derive(Deserialize)]
struct AddNoteRequest {
    title: String,
    text: String,
}

/// Notes are stored even when flagged; the receipt reports the detection.
async fn handle_add_note(
    State(state): State<AppState>,
    payload: Result<Json<AddNoteRequest>, JsonRejection>,
) -> Result<Json<NoteReceipt>, AppError> {
    let req = parse_body(payload)?;
    check_len("title", &req.title, NOTE_TITLE_CHARS)?;
    check_len("text", &req.text, NOTE_TEXT_CHARS)?;

    let opts = ChunkOptions::from(&state.config.chunking);
    let receipt = submit_note(state.repo.as_ref(), &req.title, &req.text, &opts);
    Ok(Json(receipt))
}

#[derive(Serialize)]
struct ListNotesResponse {
    documents: Vec<DocumentSummary>,
}

async fn handle_list_notes(State(state): State<AppState>) -> Json<ListNotesResponse> {
    Json(ListNotesResponse {
        documents: state.repo.list_documents(),
    })
}

async fn handle_get_note(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<Document>, AppError> {
    state
        .repo
        .get_document(&doc_id)
        .map(Json)
        .ok_or_else(|| not_found(format!("document not found: {}", doc_id)))
}

// ============ POST /api/ask ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AskRequest {
    question: String,
    top_k: Option<usize>,
}

async fn handle_ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<Answer>, AppError> {
    let req = parse_body(payload)?;
    check_len("question", &req.question, QUESTION_CHARS)?;

    let retrieval = &state.config.retrieval;
    let top_k = req.top_k.unwrap_or(retrieval.default_top_k);
    if !(1..=retrieval.max_top_k).contains(&top_k) {
        return Err(bad_request(format!(
            "topK must be in [1, {}]",
            retrieval.max_top_k
        )));
    }

    screen("question", &req.question)?;

    let answer = answer_question(state.repo.as_ref(), &req.question, top_k).map_err(|e| {
        tracing::error!(error = %e, "answer failed output validation");
        internal("Server output invalid.")
    })?;
    Ok(Json(answer))
}

// ============ POST /api/plan-week ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanWeekRequest {
    goals: String,
    #[serde(rename = "startDateISO")]
    start_date_iso: String,
    timezone: Option<String>,
    session_minutes: Option<u32>,
    sessions_per_week: Option<u32>,
}

async fn handle_plan_week(
    State(state): State<AppState>,
    payload: Result<Json<PlanWeekRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let body = parse_body(payload)?;
    let defaults = &state.config.planner;
    let req = PlanRequest {
        goals: body.goals,
        start_date_iso: body.start_date_iso,
        timezone: body
            .timezone
            .unwrap_or_else(|| defaults.default_timezone.clone()),
        session_minutes: body
            .session_minutes
            .unwrap_or(defaults.default_session_minutes),
        sessions_per_week: body
            .sessions_per_week
            .unwrap_or(defaults.default_sessions_per_week),
    };
    validate_plan_request(&req).map_err(|e| bad_request(e.to_string()))?;

    screen("goals", &req.goals)?;

    let plan = build_weekly_plan(&req, state.ids.as_ref()).map_err(|e| bad_request(e.to_string()))?;
    let ics = export_calendar(&state.config, &plan, state.ids.as_ref())
        .map_err(|_| internal("Generated calendar rejected by validator."))?;

    tracing::info!(sessions = plan.events.len(), bytes = ics.len(), "study plan exported");

    let disposition = format!("attachment; filename=\"{}\"", FILENAME);
    Ok((
        [
            (header::CONTENT_TYPE, CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        ics,
    )
        .into_response())
}
