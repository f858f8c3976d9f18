//! HTTP route definitions

use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::versus::{self, DuelOutcome, ExchangeReport, VersusDuel, STARTING_HP};
use crate::roster::{self, CharacterSheet};
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;
use crate::ws::protocol::Side;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route("/roster/:token_id", get(roster_handler))
        .route("/progression/:token_id", get(progression_handler))
        .route("/duel", post(duel_start_handler))
        .route("/duel/quick", post(duel_quick_handler))
        .route("/duel/:duel_id/attack", post(duel_attack_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// A character sheet with the live progression tally folded in
fn sheet_with_progress(state: &AppState, token_id: u64) -> CharacterSheet {
    let record = state.progression.get(token_id);
    let mut sheet = roster::sheet_for_token(token_id);
    sheet.wins = record.wins;
    sheet.level = record.level();
    sheet
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_sessions: usize,
    active_duels: usize,
    tracked_tokens: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_sessions: state.sessions.active_sessions(),
        active_duels: state.duels.len(),
        tracked_tokens: state.progression.tracked_tokens(),
    })
}

// ============================================================================
// Roster and progression endpoints
// ============================================================================

async fn roster_handler(
    State(state): State<AppState>,
    Path(token_id): Path<u64>,
) -> Json<CharacterSheet> {
    Json(sheet_with_progress(&state, token_id))
}

#[derive(Serialize)]
struct ProgressionResponse {
    token_id: u64,
    wins: u32,
    losses: u32,
    level: u32,
}

async fn progression_handler(
    State(state): State<AppState>,
    Path(token_id): Path<u64>,
) -> Json<ProgressionResponse> {
    let record = state.progression.get(token_id);
    Json(ProgressionResponse {
        token_id,
        wins: record.wins,
        losses: record.losses,
        level: record.level(),
    })
}

// ============================================================================
// Turn-based duel endpoints
// ============================================================================

#[derive(Deserialize)]
struct DuelStartRequest {
    token_id: u64,
}

#[derive(Serialize)]
struct DuelStartResponse {
    duel_id: Uuid,
    player: CharacterSheet,
    opponent: CharacterSheet,
    player_hp: i32,
    opponent_hp: i32,
}

async fn duel_start_handler(
    State(state): State<AppState>,
    Json(req): Json<DuelStartRequest>,
) -> Json<DuelStartResponse> {
    let player = sheet_with_progress(&state, req.token_id);
    let opponent = roster::generate_opponent(&mut rand::thread_rng());

    let duel_id = Uuid::new_v4();
    let duel = VersusDuel::new(player.clone(), opponent.clone(), rand::random());
    state.duels.insert(duel_id, duel);

    Json(DuelStartResponse {
        duel_id,
        player,
        opponent,
        player_hp: STARTING_HP,
        opponent_hp: STARTING_HP,
    })
}

#[derive(Deserialize)]
struct DuelAttackRequest {
    #[serde(default)]
    use_super: bool,
}

async fn duel_attack_handler(
    State(state): State<AppState>,
    Path(duel_id): Path<Uuid>,
    Json(req): Json<DuelAttackRequest>,
) -> Result<Json<ExchangeReport>, AppError> {
    let report = {
        let mut duel = state
            .duels
            .get_mut(&duel_id)
            .ok_or_else(|| AppError::NotFound("Duel not found".to_string()))?;
        duel.player_attack(req.use_super)
            .map_err(|e| AppError::BadRequest(e.to_string()))?
    };

    // A concluded duel reports to progression exactly once, on removal
    if report.outcome != DuelOutcome::InProgress {
        if let Some((_, duel)) = state.duels.remove(&duel_id) {
            if let Some(won) = duel.concluded() {
                state.progression.record_result(duel.player.token_id, won);
            }
        }
    }

    Ok(Json(report))
}

#[derive(Deserialize)]
struct QuickBattleRequest {
    token_id: u64,
}

#[derive(Serialize)]
struct QuickBattleResponse {
    won: bool,
    player: CharacterSheet,
    opponent: CharacterSheet,
    wins: u32,
    level: u32,
}

async fn duel_quick_handler(
    State(state): State<AppState>,
    Json(req): Json<QuickBattleRequest>,
) -> Json<QuickBattleResponse> {
    let player = sheet_with_progress(&state, req.token_id);
    let opponent = roster::generate_opponent(&mut rand::thread_rng());

    let winner = versus::quick_battle(&player, &opponent);
    let won = winner == Side::Player;
    let record = state.progression.record_result(req.token_id, won);

    Json(QuickBattleResponse {
        won,
        player,
        opponent,
        wins: record.wins,
        level: record.level(),
    })
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
