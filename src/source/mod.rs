//! Sensor data source.
//!
//! The monitoring core reads facilities and sensors through [`SensorSource`]
//! and never mutates them. [`Catalog`] is the in-memory implementation,
//! filled from a JSON snapshot on disk, from an HTTP endpoint, or from the
//! built-in demo plants.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{Facility, SensorReading};

mod demo;

// ---

/// Longest history kept per sensor.
pub const MAX_HISTORY: usize = 24;

/// Read-only access to facility and sensor records.
pub trait SensorSource: Send + Sync {
    fn facilities(&self) -> &[Facility];

    fn facility(&self, facility_id: &str) -> Option<&Facility> {
        self.facilities().iter().find(|f| f.id == facility_id)
    }

    /// Sensors of one facility in source order.
    fn sensors_for(&self, facility_id: &str) -> Vec<&SensorReading>;

    fn sensor(&self, sensor_id: &str) -> Option<&SensorReading>;
}

/// Wire form of a catalog snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub facilities: Vec<Facility>,
    #[serde(default)]
    pub sensors: Vec<SensorReading>,
}

/// In-memory sensor catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    facilities: Vec<Facility>,
    sensors: Vec<SensorReading>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    // ---
    pub fn new(facilities: Vec<Facility>, sensors: Vec<SensorReading>) -> Self {
        // ---
        let mut kept: Vec<SensorReading> = Vec::with_capacity(sensors.len());
        let mut by_id = HashMap::with_capacity(sensors.len());

        for mut sensor in sensors {
            if by_id.contains_key(&sensor.id) {
                warn!("Duplicate sensor id {}, keeping the first", sensor.id);
                continue;
            }
            if sensor.min >= sensor.max {
                warn!(
                    "Sensor {} has min {} >= max {}",
                    sensor.id, sensor.min, sensor.max
                );
            }
            if !facilities.iter().any(|f| f.id == sensor.facility_id) {
                debug!(
                    "Sensor {} references unknown facility {}",
                    sensor.id, sensor.facility_id
                );
            }
            if sensor.history.len() > MAX_HISTORY {
                let excess = sensor.history.len() - MAX_HISTORY;
                sensor.history.drain(..excess);
            }
            by_id.insert(sensor.id.clone(), kept.len());
            kept.push(sensor);
        }

        Self {
            facilities,
            sensors: kept,
            by_id,
        }
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self::new(snapshot.facilities, snapshot.sensors)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        // ---
        let snapshot: CatalogSnapshot =
            serde_json::from_str(json).context("Invalid catalog snapshot")?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        // ---
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read catalog '{}': {}", path.display(), e))?;
        Self::from_json_str(&content)
    }

    /// GET `url` and parse the body as a catalog snapshot.
    pub async fn fetch(url: &str) -> Result<Self> {
        // ---
        debug!("Fetching catalog from: {}", url);
        let snapshot: CatalogSnapshot = reqwest::Client::new()
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| anyhow!("Failed to decode catalog from '{}': {}", url, e))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Small fixed set of plants for running without an upstream source.
    pub fn demo() -> Self {
        Self::from_snapshot(demo::snapshot())
    }

    /// Pick the source named by the configuration: file, then HTTP, then demo.
    pub async fn from_config(cfg: &Config) -> Result<Self> {
        // ---
        let (catalog, origin) = if let Some(path) = &cfg.sensor_data_path {
            (Self::load_file(path)?, path.display().to_string())
        } else if let Some(url) = &cfg.sensor_api_url {
            (Self::fetch(url).await?, url.clone())
        } else {
            (Self::demo(), "built-in demo plants".to_string())
        };

        info!(
            "Catalog loaded from {}: {} facilities, {} sensors",
            origin,
            catalog.facilities.len(),
            catalog.sensors.len()
        );
        Ok(catalog)
    }

    pub fn sensors(&self) -> &[SensorReading] {
        &self.sensors
    }
}

impl SensorSource for Catalog {
    fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    fn sensors_for(&self, facility_id: &str) -> Vec<&SensorReading> {
        self.sensors
            .iter()
            .filter(|s| s.facility_id == facility_id)
            .collect()
    }

    fn sensor(&self, sensor_id: &str) -> Option<&SensorReading> {
        self.by_id.get(sensor_id).map(|&i| &self.sensors[i])
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    const SNAPSHOT: &str = r#"{
        "facilities": [
            {"id": "plant-a", "name": "Plant A", "location": "North", "status": "online"}
        ],
        "sensors": [
            {"id": "p1", "name": "pH", "facility_id": "plant-a", "type": "ph",
             "value": 8.9, "unit": "pH", "min": 6.5, "max": 8.5},
            {"id": "p2", "name": "Flow", "facility_id": "plant-a", "type": "flow",
             "value": 500, "unit": "m3/h", "min": 100, "max": 900},
            {"id": "p1", "name": "dup", "facility_id": "plant-a", "type": "ph",
             "value": 1.0, "unit": "pH", "min": 6.5, "max": 8.5},
            {"id": "x9", "name": "Orphan", "facility_id": "plant-z", "type": "level",
             "value": 1.0, "unit": "m", "min": 0, "max": 5}
        ]
    }"#;

    #[test]
    fn test_from_json_and_lookup() {
        // ---
        let catalog = Catalog::from_json_str(SNAPSHOT).unwrap();
        assert_eq!(catalog.facilities().len(), 1);
        assert_eq!(catalog.facility("plant-a").unwrap().name, "Plant A");
        assert!(catalog.facility("plant-b").is_none());

        let ids: Vec<&str> = catalog
            .sensors_for("plant-a")
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, ["p1", "p2"]);

        // First occurrence of a duplicate id wins.
        assert_eq!(catalog.sensor("p1").unwrap().value, 8.9);
        assert_eq!(catalog.sensor("x9").unwrap().facility_id, "plant-z");
        assert!(catalog.sensor("nope").is_none());
    }

    #[test]
    fn test_history_trimmed_to_most_recent() {
        // ---
        let history: Vec<f64> = (0..40).map(f64::from).collect();
        let snapshot = serde_json::json!({
            "facilities": [],
            "sensors": [{
                "id": "t1", "name": "Temp", "facility_id": "f", "type": "temperature",
                "value": 39.0, "unit": "C", "min": 0.0, "max": 50.0, "history": history
            }]
        });
        let catalog = Catalog::from_json_str(&snapshot.to_string()).unwrap();
        let kept = &catalog.sensor("t1").unwrap().history;

        assert_eq!(kept.len(), MAX_HISTORY);
        assert_eq!(kept.first(), Some(&16.0));
        assert_eq!(kept.last(), Some(&39.0));
    }

    #[test]
    fn test_invalid_json_is_error() {
        // ---
        assert!(Catalog::from_json_str("{\"sensors\": 3}").is_err());
        assert!(Catalog::load_file("/definitely/not/here.json").is_err());
    }

    #[test]
    fn test_load_file() {
        // ---
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, SNAPSHOT).unwrap();

        let catalog = Catalog::load_file(&path).unwrap();
        assert_eq!(catalog.sensors().len(), 3);
    }

    #[test]
    fn test_demo_catalog_is_consistent() {
        // ---
        let catalog = Catalog::demo();
        assert!(catalog.facilities().len() >= 2);
        for facility in catalog.facilities() {
            let sensors = catalog.sensors_for(&facility.id);
            assert!(sensors.len() > 4, "{} has too few sensors", facility.id);
            for sensor in sensors {
                assert!(sensor.min < sensor.max);
                assert!(sensor.history.len() <= MAX_HISTORY);
                if let Some(sp) = sensor.setpoint {
                    assert!((sensor.min..=sensor.max).contains(&sp));
                }
            }
        }
    }
}
