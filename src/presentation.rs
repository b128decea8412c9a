//! Sensor presentation adapter.
//!
//! Decides which sensors a facility view shows and derives what each card
//! renders:
//! - pinned ids from the selection, in pin order, dropping ids the source no
//!   longer knows for that facility,
//! - otherwise the first [`DEFAULT_CARD_COUNT`] sensors of the facility,
//!   most severe first.
//!
//! Header counters are computed over the displayed cards only.

use serde::Serialize;

use crate::classifier::classify_warning;
use crate::models::{CommStatus, SensorReading, SensorType, Severity};
use crate::selection::SelectionState;
use crate::source::SensorSource;
use crate::trend::{trend, Trend};

// ---

/// Cards shown when a facility has no pinned sensors.
pub const DEFAULT_CARD_COUNT: usize = 4;

/// Render contract for one sensor card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorCard {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub type_label: &'static str,
    pub unit: String,
    /// Value rounded for display (0 decimals for flow, 1 otherwise).
    pub value: f64,
    pub display_value: String,
    pub min: f64,
    pub max: f64,
    pub severity: Severity,
    pub comm_status: CommStatus,
    /// Progress bar fill in `[0, 1]`.
    pub fill: f64,
    /// Setpoint marker position in `[0, 1]`, when a setpoint exists.
    pub setpoint_marker: Option<f64>,
    pub trend: Trend,
}

/// Facility header counters over the displayed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FacilityCounters {
    pub online: usize,
    pub warning: usize,
    pub critical: usize,
    pub total: usize,
}

/// Where the displayed set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewOrigin {
    Selection,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityView {
    pub facility_id: String,
    pub origin: ViewOrigin,
    pub sensors: Vec<SensorCard>,
    pub counters: FacilityCounters,
}

/// Position of `value` within `[min, max]`, clamped to `[0, 1]`.
///
/// Degenerate ranges and non-finite inputs map to 0.
pub fn fill_fraction(value: f64, min: f64, max: f64) -> f64 {
    // ---
    let span = max - min;
    if !value.is_finite() || !span.is_finite() || span <= 0.0 {
        return 0.0;
    }
    ((value - min) / span).clamp(0.0, 1.0)
}

/// Severity shown on a card: the source's report or the threshold
/// classification, whichever is worse.
pub fn effective_severity(sensor: &SensorReading) -> Severity {
    sensor.status.max(classify_warning(sensor.value, sensor.min, sensor.max))
}

fn round_to(value: f64, decimals: usize) -> f64 {
    // ---
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

pub fn build_card(sensor: &SensorReading) -> SensorCard {
    // ---
    let decimals = sensor.sensor_type.display_decimals();
    let value = round_to(sensor.value, decimals);

    SensorCard {
        id: sensor.id.clone(),
        name: sensor.name.clone(),
        sensor_type: sensor.sensor_type,
        type_label: sensor.sensor_type.label(),
        unit: sensor.unit.clone(),
        value,
        display_value: format!("{:.*}", decimals, value),
        min: sensor.min,
        max: sensor.max,
        severity: effective_severity(sensor),
        comm_status: sensor.comm_status,
        fill: fill_fraction(sensor.value, sensor.min, sensor.max),
        setpoint_marker: sensor
            .setpoint
            .map(|sp| fill_fraction(sp, sensor.min, sensor.max)),
        trend: trend(&sensor.history_with_current()),
    }
}

/// Resolve the sensors to display for `facility_id`.
pub fn resolve_sensors<'a>(
    source: &'a dyn SensorSource,
    facility_id: &str,
    selected: &[String],
) -> (ViewOrigin, Vec<&'a SensorReading>) {
    // ---
    if !selected.is_empty() {
        let sensors = selected
            .iter()
            .filter_map(|id| source.sensor(id))
            .filter(|s| s.facility_id == facility_id)
            .collect();
        return (ViewOrigin::Selection, sensors);
    }

    let mut sensors = source.sensors_for(facility_id);
    // Stable: equal severities keep source order.
    sensors.sort_by_key(|s| effective_severity(s).display_rank());
    sensors.truncate(DEFAULT_CARD_COUNT);
    (ViewOrigin::Default, sensors)
}

pub fn counters(cards: &[SensorCard]) -> FacilityCounters {
    // ---
    FacilityCounters {
        online: cards
            .iter()
            .filter(|c| c.comm_status == CommStatus::Online)
            .count(),
        warning: cards
            .iter()
            .filter(|c| c.severity == Severity::Warning)
            .count(),
        critical: cards
            .iter()
            .filter(|c| c.severity == Severity::Critical)
            .count(),
        total: cards.len(),
    }
}

/// Full view of one facility for the current selection state.
pub fn facility_view(
    source: &dyn SensorSource,
    selection: &SelectionState,
    facility_id: &str,
) -> FacilityView {
    // ---
    let (origin, sensors) =
        resolve_sensors(source, facility_id, selection.selections_for(facility_id));
    let cards: Vec<SensorCard> = sensors.into_iter().map(build_card).collect();

    FacilityView {
        facility_id: facility_id.to_string(),
        origin,
        counters: counters(&cards),
        sensors: cards,
    }
}

/// View of the active facility, or of the first facility when none is
/// active or the active one is gone. `None` when the source is empty.
pub fn active_view(source: &dyn SensorSource, selection: &SelectionState) -> Option<FacilityView> {
    // ---
    let facility_id = selection
        .active_facility
        .as_deref()
        .filter(|id| source.facility(id).is_some())
        .or_else(|| source.facilities().first().map(|f| f.id.as_str()))?;

    Some(facility_view(source, selection, facility_id))
}
