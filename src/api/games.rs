use crate::error::{AppError, Result};
use crate::models::{
    CreateGameRequest, GameSnapshot, GameSummary, GuessRequest, RoundResult, RoundStart,
    ScanProgress,
};
use crate::services::GameManager;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::{stream::Stream, StreamExt};
use serde_json::json;
use std::{convert::Infallible, sync::Arc};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;
use validator::Validate;

pub struct AppState {
    pub game_manager: Arc<GameManager>,
}

pub fn game_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/games", post(create_game))
        .route("/games/:id", get(get_game).delete(end_game))
        .route("/games/:id/rounds", post(start_round))
        .route("/games/:id/rounds/stream", get(start_round_sse))
        .route("/games/:id/guess", post(submit_guess))
        .route("/games/:id/reveal", post(reveal))
        .route("/games/:id/restart", post(restart))
        .route("/games/:id/summary", get(summary))
}

async fn create_game(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateGameRequest>>,
) -> Result<Json<GameSnapshot>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let game = state
        .game_manager
        .create_game(req.player, req.max_rounds)
        .await;
    Ok(Json(game))
}

async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSnapshot>> {
    Ok(Json(state.game_manager.snapshot(id).await?))
}

async fn end_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.game_manager.end_game(id).await?;
    Ok(Json(json!({ "ended": id })))
}

async fn start_round(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundStart>> {
    Ok(Json(state.game_manager.start_round(id, None).await?))
}

/// SSE variant of `start_round`: `progress` events while scanning, then one
/// `round` event (or `error`) with the outcome.
async fn start_round_sse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    // Fail fast with a 404 before opening the stream
    state.game_manager.snapshot(id).await?;

    let (progress_tx, progress_rx) = mpsc::channel::<ScanProgress>(32);
    let (mut result_tx, result_rx) = oneshot::channel::<Result<RoundStart>>();

    // A client that hangs up cancels the scan instead of leaving it running
    let manager = state.game_manager.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = manager.start_round(id, Some(progress_tx)) => {
                let _ = result_tx.send(result);
            }
            _ = result_tx.closed() => {
                tracing::debug!("Round stream for game {} closed, scan cancelled", id);
            }
        }
    });

    let progress = ReceiverStream::new(progress_rx).map(|progress| {
        let data = serde_json::to_string(&progress).unwrap_or_else(|_| "{}".to_string());
        Ok::<_, Infallible>(Event::default().event("progress").data(data))
    });

    let outcome = futures::stream::once(async move {
        let event = match result_rx.await {
            Ok(Ok(start)) => {
                let data = serde_json::to_string(&start).unwrap_or_else(|_| "{}".to_string());
                Event::default().event("round").data(data)
            }
            Ok(Err(e)) => Event::default()
                .event("error")
                .data(json!({ "error": e.to_string() }).to_string()),
            Err(_) => Event::default()
                .event("error")
                .data(json!({ "error": "scan aborted" }).to_string()),
        };
        Ok::<_, Infallible>(event)
    });

    Ok(Sse::new(progress.chain(outcome)).keep_alive(KeepAlive::default()))
}

async fn submit_guess(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<GuessRequest>,
) -> Result<Json<RoundResult>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(Json(state.game_manager.submit_guess(id, req.value).await?))
}

async fn reveal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundResult>> {
    Ok(Json(state.game_manager.reveal(id).await?))
}

async fn restart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSnapshot>> {
    Ok(Json(state.game_manager.restart(id).await?))
}

async fn summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>> {
    Ok(Json(state.game_manager.summary(id).await?))
}
