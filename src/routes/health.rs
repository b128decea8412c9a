// src/routes/health.rs
//! API health check endpoint.
//!
//! `/health` lets orchestrators and CI verify the service responds. It also
//! reports catalog size and the simulator's last tick so a stalled feed is
//! visible without calling `/live`.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    facilities: usize,
    simulator_tick: u64,
}

/// Handle `GET /health`.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    // ---
    Json(HealthResponse {
        status: "ok",
        facilities: state.source.facilities().len(),
        simulator_tick: state.live.borrow().tick,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
