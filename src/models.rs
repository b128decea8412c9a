//! Data models for plant sensors and facilities.
//!
//! These are the records supplied by the external sensor data source. The
//! monitoring core treats them as read-only snapshots.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Measured quantity of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Ph,
    Flow,
    Pressure,
    Temperature,
    Turbidity,
    Chlorine,
    DissolvedOxygen,
    Level,
    Conductivity,
    Orp,
}

impl SensorType {
    // ---
    /// Decimal places used when the current value is displayed.
    pub fn display_decimals(self) -> usize {
        match self {
            SensorType::Flow => 0,
            _ => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SensorType::Ph => "pH",
            SensorType::Flow => "Flow",
            SensorType::Pressure => "Pressure",
            SensorType::Temperature => "Temperature",
            SensorType::Turbidity => "Turbidity",
            SensorType::Chlorine => "Chlorine",
            SensorType::DissolvedOxygen => "Dissolved O2",
            SensorType::Level => "Level",
            SensorType::Conductivity => "Conductivity",
            SensorType::Orp => "ORP",
        }
    }
}

/// Whether a sensor's data feed is reaching us. Independent of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommStatus {
    #[default]
    Online,
    Stale,
    Offline,
}

/// Severity tier of a reading.
///
/// Ordered by urgency so that `Critical` compares greatest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl Severity {
    // ---
    /// Sort key for display: critical first, then warning, then normal.
    pub fn display_rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Normal => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate status of a facility as reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityStatus {
    #[default]
    Online,
    Warning,
    Offline,
}

/// A treatment plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    // ---
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: FacilityStatus,
}

/// Snapshot of one sensor as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    // ---
    pub id: String,
    pub name: String,
    pub facility_id: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub value: f64,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub setpoint: Option<f64>,

    /// Past values, most recent last.
    #[serde(default)]
    pub history: Vec<f64>,

    #[serde(default)]
    pub comm_status: CommStatus,

    /// Severity as reported by the source. The presentation layer
    /// re-derives it from the thresholds as well.
    #[serde(default)]
    pub status: Severity,

    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl SensorReading {
    // ---
    /// History with the current value appended when it is not already the
    /// latest sample.
    pub fn history_with_current(&self) -> Vec<f64> {
        // ---
        let mut samples = self.history.clone();
        if samples.last().copied() != Some(self.value) {
            samples.push(self.value);
        }
        samples
    }
}
