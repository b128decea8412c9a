//! HTTP gateway. Each sibling module exports a subrouter over [`AppState`];
//! this module merges them so `main.rs` does not need to know about
//! individual endpoints.

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde::Serialize;
use tokio::sync::watch;

use crate::{SelectionStore, SensorSource, SimulatorSnapshot};

mod facilities;
mod health;
mod live;
mod selections;

// ---

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn SensorSource>,
    pub store: Arc<SelectionStore>,
    pub live: watch::Receiver<SimulatorSnapshot>,
}

impl AppState {
    pub fn new(
        source: Arc<dyn SensorSource>,
        store: Arc<SelectionStore>,
        live: watch::Receiver<SimulatorSnapshot>,
    ) -> Self {
        Self {
            source,
            store,
            live,
        }
    }
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(facilities::router())
        .merge(selections::router())
        .merge(live::router())
        .merge(health::router())
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// `404` with a JSON message.
fn not_found(message: impl Into<String>) -> Response {
    // ---
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}
