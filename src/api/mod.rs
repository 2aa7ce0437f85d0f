pub mod games;

pub use games::{game_routes, AppState};

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

/// Every route the service exposes, without transport middleware.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", game_routes())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
