//! Latest live simulator snapshot.

use axum::{extract::State, routing::get, Json, Router};

use super::AppState;
use crate::SimulatorSnapshot;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/live", get(latest))
}

async fn latest(State(state): State<AppState>) -> Json<SimulatorSnapshot> {
    // ---
    let snapshot = state.live.borrow().clone();
    Json(snapshot)
}
