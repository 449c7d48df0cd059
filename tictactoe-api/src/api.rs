//! HTTP routes over one live game.
//!
//! The session sits behind a `std::sync::Mutex` that is never held across an
//! `.await`. When the computer owns the next move a task is spawned that
//! waits out the presentation delay and then moves; it carries the session
//! generation it was scheduled for and gives up if the round was restarted
//! in the meantime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use tictactoe_core::round::ParseModeError;
use tictactoe_core::{
    Cell, Game, Mode, ParseSideError, RoundError, RoundStatus, Scoreboard, SearchMode, Searcher,
    Side,
};

// =============================================================================
// Session State
// =============================================================================

/// The single game served by this process
struct GameSession {
    game: Game,
    /// Bumped whenever the round restarts; pending computer moves compare it
    generation: u64,
    /// A deferred computer move is waiting to run
    computer_pending: bool,
}

/// Shared application state
pub struct AppStateInner {
    session: Mutex<GameSession>,
    computer_delay: Duration,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    pub fn new(game: Game, computer_delay: Duration) -> AppState {
        Arc::new(AppStateInner {
            session: Mutex::new(GameSession {
                game,
                generation: 0,
                computer_pending: false,
            }),
            computer_delay,
        })
    }

    fn lock(&self) -> MutexGuard<'_, GameSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Restart bookkeeping after the round was reset, then hand the opening
/// move to the computer if it plays X.
fn restarted(state: &AppState, session: &mut GameSession) {
    session.generation += 1;
    session.computer_pending = false;
    schedule_computer(state, session);
}

/// Let the computer move if it owns the turn: at once with no delay,
/// otherwise from a spawned task after the delay.
fn schedule_computer(state: &AppState, session: &mut GameSession) {
    if !session.game.round().computer_to_move() {
        return;
    }

    if state.computer_delay.is_zero() {
        match session.game.play_computer() {
            Ok((index, outcome)) => debug!(index, ?outcome, "computer moved"),
            Err(err) => warn!(%err, "computer move failed"),
        }
        return;
    }

    session.computer_pending = true;
    let generation = session.generation;
    let state = Arc::clone(state);

    tokio::spawn(async move {
        tokio::time::sleep(state.computer_delay).await;

        let mut session = state.lock();
        if session.generation != generation {
            debug!(generation, current = session.generation, "dropping stale computer move");
            return;
        }
        session.computer_pending = false;
        match session.game.play_computer() {
            Ok((index, outcome)) => debug!(index, ?outcome, "computer moved"),
            Err(err) => warn!(%err, "computer move failed"),
        }
    });
}

// =============================================================================
// JSON Models
// =============================================================================

#[derive(Serialize, Deserialize, Debug)]
pub struct GameStateModel {
    /// Row-major cells, `null` when empty
    pub cells: Vec<Option<Side>>,
    pub to_move: Side,
    /// One of `not_started`, `in_progress`, `x_wins`, `o_wins`, `draw`
    pub status: String,
    pub status_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_line: Option<[usize; 3]>,
    pub scores: Scoreboard,
    pub mode: Mode,
    pub human_side: Side,
    pub computer_pending: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LegalMoveModel {
    pub index: usize,
    /// Minimax score for the side to move: positive wins, 0 draws
    pub score: i32,
}

#[derive(Deserialize)]
struct MoveRequest {
    index: usize,
}

#[derive(Deserialize)]
struct ModeRequest {
    mode: String,
}

#[derive(Deserialize)]
struct SideRequest {
    side: String,
}

#[derive(Serialize)]
struct HealthModel {
    status: String,
}

#[derive(Serialize)]
struct ErrorModel {
    detail: String,
}

fn status_name(status: RoundStatus) -> &'static str {
    match status {
        RoundStatus::NotStarted => "not_started",
        RoundStatus::InProgress => "in_progress",
        RoundStatus::Won(Side::X) => "x_wins",
        RoundStatus::Won(Side::O) => "o_wins",
        RoundStatus::Drawn => "draw",
    }
}

fn session_to_model(session: &GameSession) -> GameStateModel {
    let game = &session.game;
    let round = game.round();

    GameStateModel {
        cells: round
            .board()
            .cells()
            .iter()
            .map(|cell| match cell {
                Cell::Empty => None,
                Cell::Marked(side) => Some(*side),
            })
            .collect(),
        to_move: round.to_move(),
        status: status_name(round.status()).to_string(),
        status_text: game.status_text(),
        winning_line: round.winning_line(),
        scores: *game.scores(),
        mode: round.mode(),
        human_side: round.human_side(),
        computer_pending: session.computer_pending,
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Any request the game refuses. Always answered with 400 and `{detail}`.
#[derive(Debug, Display, Error, From)]
pub enum ApiError {
    Round(RoundError),
    Side(ParseSideError),
    Mode(ParseModeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorModel {
            detail: self.to_string(),
        });
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

// =============================================================================
// API Endpoints
// =============================================================================

async fn get_game(State(state): State<AppState>) -> Json<GameStateModel> {
    let session = state.lock();
    Json(session_to_model(&session))
}

async fn get_moves(State(state): State<AppState>) -> Json<Vec<LegalMoveModel>> {
    let session = state.lock();
    let round = session.game.round();
    let board = *round.board();
    let side = round.to_move();
    let over = round.status().is_over();
    drop(session); // Release lock before searching

    if over {
        return Json(vec![]);
    }

    let mut searcher = Searcher::new(SearchMode::AlphaBeta);
    let moves = searcher
        .move_scores(&board, side)
        .map(|scores| {
            scores
                .into_iter()
                .map(|(index, score)| LegalMoveModel { index, score })
                .collect()
        })
        .unwrap_or_default();
    debug!(nodes = searcher.nodes(), "scored legal moves");

    Json(moves)
}

async fn make_move(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<GameStateModel>, ApiError> {
    let mut session = state.lock();
    session.game.play(req.index)?;
    schedule_computer(&state, &mut session);
    Ok(Json(session_to_model(&session)))
}

async fn reset_round(State(state): State<AppState>) -> Json<GameStateModel> {
    let mut session = state.lock();
    session.game.reset_round();
    restarted(&state, &mut session);
    Json(session_to_model(&session))
}

async fn new_game(State(state): State<AppState>) -> Json<GameStateModel> {
    let mut session = state.lock();
    session.game.new_game();
    restarted(&state, &mut session);
    Json(session_to_model(&session))
}

async fn set_mode(
    State(state): State<AppState>,
    Json(req): Json<ModeRequest>,
) -> Result<Json<GameStateModel>, ApiError> {
    let mode: Mode = req.mode.parse()?;
    let mut session = state.lock();
    session.game.set_mode(mode);
    info!(%mode, "mode changed");
    restarted(&state, &mut session);
    Ok(Json(session_to_model(&session)))
}

async fn choose_side(
    State(state): State<AppState>,
    Json(req): Json<SideRequest>,
) -> Result<Json<GameStateModel>, ApiError> {
    let side: Side = req.side.parse()?;
    let mut session = state.lock();
    session.game.choose_side(side);
    info!(%side, "human side changed");
    restarted(&state, &mut session);
    Ok(Json(session_to_model(&session)))
}

async fn health() -> Json<HealthModel> {
    Json(HealthModel {
        status: "ok".to_string(),
    })
}

/// Build the router. Schedules the computer's opening move right away when
/// the starting configuration gives it X.
pub fn router(state: AppState) -> Router {
    {
        let mut session = state.lock();
        schedule_computer(&state, &mut session);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/game", get(get_game))
        .route("/moves", get(get_moves))
        .route("/move", post(make_move))
        .route("/reset", post(reset_round))
        .route("/new-game", post(new_game))
        .route("/mode", post(set_mode))
        .route("/side", post(choose_side))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    fn app(mode: Mode, human: Side, delay_ms: u64) -> Router {
        let state = AppStateInner::new(Game::new(mode, human), Duration::from_millis(delay_ms));
        router(state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(app: &Router, method: &str, uri: &str, body: Option<&str>) -> T {
        let (status, bytes) = send(app, method, uri, body).await;
        assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&bytes));
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn game(app: &Router) -> GameStateModel {
        send_json(app, "GET", "/game", None).await
    }

    async fn play(app: &Router, index: usize) -> GameStateModel {
        let body = format!(r#"{{"index": {}}}"#, index);
        send_json(app, "POST", "/move", Some(&body)).await
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Mode::HumanVsHuman, Side::X, 0);
        let body: serde_json::Value = send_json(&app, "GET", "/health", None).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_initial_game() {
        let app = app(Mode::HumanVsHuman, Side::X, 0);
        let state = game(&app).await;
        assert_eq!(state.cells, vec![None; 9]);
        assert_eq!(state.to_move, Side::X);
        assert_eq!(state.status, "not_started");
        assert_eq!(state.status_text, "Player X's Turn");
        assert_eq!(state.winning_line, None);
        assert_eq!(state.mode, Mode::HumanVsHuman);
        assert!(!state.computer_pending);
    }

    #[tokio::test]
    async fn test_pvp_moves_and_win() {
        let app = app(Mode::HumanVsHuman, Side::X, 0);
        for index in [0, 3, 1, 4] {
            play(&app, index).await;
        }
        let state = play(&app, 2).await;
        assert_eq!(state.status, "x_wins");
        assert_eq!(state.status_text, "Player X wins!");
        assert_eq!(state.winning_line, Some([0, 1, 2]));
        assert_eq!(state.scores.x_wins, 1);

        let (status, body) = send(&app, "POST", "/move", Some(r#"{"index": 5}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["detail"], "the round is over");
    }

    #[tokio::test]
    async fn test_invalid_moves_rejected() {
        let app = app(Mode::HumanVsHuman, Side::X, 0);
        play(&app, 4).await;

        let (status, _) = send(&app, "POST", "/move", Some(r#"{"index": 4}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, "POST", "/move", Some(r#"{"index": 9}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let state = game(&app).await;
        assert_eq!(state.cells.iter().flatten().count(), 1);
        assert_eq!(state.to_move, Side::O);
    }

    #[tokio::test]
    async fn test_computer_replies_in_request_without_delay() {
        let app = app(Mode::HumanVsComputer, Side::X, 0);
        let state = play(&app, 0).await;
        assert_eq!(state.cells[4], Some(Side::O));
        assert_eq!(state.to_move, Side::X);
        assert_eq!(state.status_text, "Your Turn (X)");
        assert!(!state.computer_pending);
    }

    #[tokio::test]
    async fn test_choose_o_computer_opens_center() {
        let app = app(Mode::HumanVsComputer, Side::X, 0);
        let state: GameStateModel = send_json(&app, "POST", "/side", Some(r#"{"side": "O"}"#)).await;
        assert_eq!(state.human_side, Side::O);
        assert_eq!(state.cells[4], Some(Side::X));
        assert_eq!(state.to_move, Side::O);
    }

    #[tokio::test]
    async fn test_side_zero_rejected() {
        let app = app(Mode::HumanVsComputer, Side::X, 0);
        let (status, _) = send(&app, "POST", "/side", Some(r#"{"side": "0"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(game(&app).await.human_side, Side::X);
    }

    #[tokio::test]
    async fn test_mode_switch() {
        let app = app(Mode::HumanVsHuman, Side::X, 0);
        play(&app, 0).await;
        let state: GameStateModel = send_json(&app, "POST", "/mode", Some(r#"{"mode": "pvc"}"#)).await;
        assert_eq!(state.mode, Mode::HumanVsComputer);
        assert_eq!(state.cells, vec![None; 9]);

        let (status, _) = send(&app, "POST", "/mode", Some(r#"{"mode": "cvc"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reset_keeps_scores_new_game_clears() {
        let app = app(Mode::HumanVsHuman, Side::X, 0);
        for index in [0, 3, 1, 4, 2] {
            play(&app, index).await;
        }
        let state: GameStateModel = send_json(&app, "POST", "/reset", None).await;
        assert_eq!(state.status, "not_started");
        assert_eq!(state.scores.x_wins, 1);

        let state: GameStateModel = send_json(&app, "POST", "/new-game", None).await;
        assert_eq!(state.scores, Scoreboard::default());
    }

    #[tokio::test]
    async fn test_moves_scored_for_side_to_move() {
        let app = app(Mode::HumanVsHuman, Side::X, 0);
        // X: 0, 1  O: 4, 6
        for index in [0, 4, 1, 6] {
            play(&app, index).await;
        }
        let moves: Vec<LegalMoveModel> = send_json(&app, "GET", "/moves", None).await;
        assert_eq!(moves.len(), 5);
        let best = moves.iter().max_by_key(|m| m.score).unwrap();
        assert_eq!(best.index, 2);
        assert_eq!(best.score, 10);
    }

    #[tokio::test]
    async fn test_no_moves_after_round_ends() {
        let app = app(Mode::HumanVsHuman, Side::X, 0);
        for index in [0, 3, 1, 4, 2] {
            play(&app, index).await;
        }
        let moves: Vec<LegalMoveModel> = send_json(&app, "GET", "/moves", None).await;
        assert!(moves.is_empty());
    }

    #[tokio::test]
    async fn test_deferred_computer_move() {
        let app = app(Mode::HumanVsComputer, Side::X, 20);
        let state = play(&app, 0).await;
        assert!(state.computer_pending);
        assert_eq!(state.status_text, "Computer's Turn (O)");

        // The human may not move while the computer is pending
        let (status, _) = send(&app, "POST", "/move", Some(r#"{"index": 1}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let state = game(&app).await;
        assert!(!state.computer_pending);
        assert_eq!(state.cells[4], Some(Side::O));
    }

    #[tokio::test]
    async fn test_stale_computer_move_dropped() {
        let app = app(Mode::HumanVsComputer, Side::X, 50);
        let state: GameStateModel = send_json(&app, "POST", "/side", Some(r#"{"side": "O"}"#)).await;
        assert!(state.computer_pending);

        // Switching to pvp before the delay ends must cancel the move
        let state: GameStateModel = send_json(&app, "POST", "/mode", Some(r#"{"mode": "pvp"}"#)).await;
        assert!(!state.computer_pending);

        tokio::time::sleep(Duration::from_millis(250)).await;
        let state = game(&app).await;
        assert_eq!(state.cells, vec![None; 9]);
        assert!(!state.computer_pending);
    }

    #[tokio::test]
    async fn test_computer_opens_when_configured_as_x() {
        let app = app(Mode::HumanVsComputer, Side::O, 0);
        let state = game(&app).await;
        assert_eq!(state.cells[4], Some(Side::X));
        assert_eq!(state.status_text, "Your Turn (O)");
    }
}
