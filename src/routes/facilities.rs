//! Facility listing and facility views (the sensor cards plus header
//! counters a dashboard renders).

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::debug;

use super::{not_found, AppState};
use crate::presentation::{active_view, facility_view};
use crate::{FacilityStatus, MAX_PINNED};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/facilities", get(list_facilities))
        .route("/facilities/{facility_id}/view", get(view_facility))
        .route("/view", get(view_active))
}

#[derive(Serialize)]
struct FacilitySummary {
    id: String,
    name: String,
    location: String,
    status: FacilityStatus,
    sensor_count: usize,
    pinned: usize,
    at_capacity: bool,
    active: bool,
}

async fn list_facilities(State(state): State<AppState>) -> Json<Vec<FacilitySummary>> {
    // ---
    let selection = state.store.snapshot();
    let summaries = state
        .source
        .facilities()
        .iter()
        .map(|f| {
            let pinned = selection.selections_for(&f.id).len();
            FacilitySummary {
                id: f.id.clone(),
                name: f.name.clone(),
                location: f.location.clone(),
                status: f.status,
                sensor_count: state.source.sensors_for(&f.id).len(),
                pinned,
                at_capacity: pinned >= MAX_PINNED,
                active: selection.active_facility.as_deref() == Some(f.id.as_str()),
            }
        })
        .collect();
    Json(summaries)
}

async fn view_facility(
    Path(facility_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    // ---
    if state.source.facility(&facility_id).is_none() {
        return not_found(format!("Unknown facility '{}'", facility_id));
    }

    let view = facility_view(state.source.as_ref(), &state.store.snapshot(), &facility_id);
    debug!(
        "GET /facilities/{}/view - {} cards ({:?})",
        facility_id,
        view.sensors.len(),
        view.origin
    );
    Json(view).into_response()
}

async fn view_active(State(state): State<AppState>) -> Response {
    // ---
    match active_view(state.source.as_ref(), &state.store.snapshot()) {
        Some(view) => Json(view).into_response(),
        None => not_found("No facilities available"),
    }
}
