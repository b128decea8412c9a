//! Selection Store endpoints: toggle, bulk set, clear, and the active
//! facility tab.
//!
//! The store itself accepts any id; these handlers check that the facility
//! exists and that pinned sensors belong to it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{not_found, AppState};
use crate::selection::ToggleOutcome;
use crate::{SelectionState, MAX_PINNED};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/selection", get(get_state))
        .route(
            "/facilities/{facility_id}/selection",
            get(get_selection).put(set_selection).delete(clear_selection),
        )
        .route(
            "/facilities/{facility_id}/selection/toggle",
            post(toggle_selection),
        )
        .route("/active-facility", put(set_active_facility))
}

#[derive(Debug, Serialize)]
struct SelectionResponse {
    facility_id: String,
    sensor_ids: Vec<String>,
    at_capacity: bool,
    max: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<ToggleOutcome>,
}

impl SelectionResponse {
    fn new(facility_id: String, state: &SelectionState, outcome: Option<ToggleOutcome>) -> Self {
        // ---
        let sensor_ids = state.selections_for(&facility_id).to_vec();
        Self {
            at_capacity: sensor_ids.len() >= MAX_PINNED,
            facility_id,
            sensor_ids,
            max: MAX_PINNED,
            outcome,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToggleRequest {
    sensor_id: String,
}

#[derive(Debug, Deserialize)]
struct SetSelectionRequest {
    sensor_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ActiveFacilityRequest {
    facility_id: String,
}

fn unknown_facility(facility_id: &str) -> Response {
    not_found(format!("Unknown facility '{}'", facility_id))
}

async fn get_state(State(state): State<AppState>) -> Json<SelectionState> {
    Json(state.store.snapshot())
}

async fn get_selection(
    Path(facility_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    // ---
    if state.source.facility(&facility_id).is_none() {
        return unknown_facility(&facility_id);
    }
    let snapshot = state.store.snapshot();
    Json(SelectionResponse::new(facility_id, &snapshot, None)).into_response()
}

async fn toggle_selection(
    Path(facility_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<ToggleRequest>,
) -> Response {
    // ---
    if state.source.facility(&facility_id).is_none() {
        return unknown_facility(&facility_id);
    }
    let belongs = state
        .source
        .sensor(&req.sensor_id)
        .is_some_and(|s| s.facility_id == facility_id);
    if !belongs {
        return not_found(format!(
            "Sensor '{}' is not part of facility '{}'",
            req.sensor_id, facility_id
        ));
    }

    let (outcome, snapshot) = state.store.toggle(&facility_id, &req.sensor_id);
    info!(
        "POST /facilities/{}/selection/toggle {} -> {:?}",
        facility_id, req.sensor_id, outcome
    );
    Json(SelectionResponse::new(facility_id, &snapshot, Some(outcome))).into_response()
}

async fn set_selection(
    Path(facility_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<SetSelectionRequest>,
) -> Response {
    // ---
    if state.source.facility(&facility_id).is_none() {
        return unknown_facility(&facility_id);
    }

    let requested = req.sensor_ids.len();
    let known: Vec<String> = req
        .sensor_ids
        .into_iter()
        .filter(|id| {
            state
                .source
                .sensor(id)
                .is_some_and(|s| s.facility_id == facility_id)
        })
        .collect();
    if known.len() != requested {
        debug!(
            "PUT /facilities/{}/selection - dropped {} unknown ids",
            facility_id,
            requested - known.len()
        );
    }

    let snapshot = state.store.set_selection(&facility_id, known);
    Json(SelectionResponse::new(facility_id, &snapshot, None)).into_response()
}

async fn clear_selection(
    Path(facility_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    // ---
    if state.source.facility(&facility_id).is_none() {
        return unknown_facility(&facility_id);
    }
    let snapshot = state.store.clear(&facility_id);
    Json(SelectionResponse::new(facility_id, &snapshot, None)).into_response()
}

async fn set_active_facility(
    State(state): State<AppState>,
    Json(req): Json<ActiveFacilityRequest>,
) -> Response {
    // ---
    if state.source.facility(&req.facility_id).is_none() {
        return unknown_facility(&req.facility_id);
    }
    let snapshot = state.store.set_active_facility(&req.facility_id);
    (StatusCode::OK, Json(snapshot)).into_response()
}
