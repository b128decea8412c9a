//! Built-in demo plants.

use crate::classifier::classify_warning;
use crate::models::{CommStatus, Facility, FacilityStatus, SensorReading, SensorType};

use super::CatalogSnapshot;

// ---

struct Entry {
    id: &'static str,
    name: &'static str,
    sensor_type: SensorType,
    unit: &'static str,
    range: (f64, f64),
    setpoint: Option<f64>,
    comm: CommStatus,
    /// Recent samples, oldest first. The last one is the current value.
    trail: &'static [f64],
}

#[rustfmt::skip]
const NORTH_RIDGE: &[Entry] = &[
    Entry { id: "nr-ph-01", name: "Raw Water pH", sensor_type: SensorType::Ph, unit: "pH", range: (6.5, 8.5), setpoint: Some(7.2), comm: CommStatus::Online, trail: &[7.1, 7.2, 7.2, 7.3] },
    Entry { id: "nr-flow-01", name: "Influent Flow", sensor_type: SensorType::Flow, unit: "m³/h", range: (400.0, 1800.0), setpoint: Some(1200.0), comm: CommStatus::Online, trail: &[1180.0, 1215.0, 1242.0, 1236.0] },
    Entry { id: "nr-turb-01", name: "Filter 1 Turbidity", sensor_type: SensorType::Turbidity, unit: "NTU", range: (0.0, 1.0), setpoint: Some(0.3), comm: CommStatus::Online, trail: &[0.62, 0.81, 0.97, 1.14] },
    Entry { id: "nr-cl-01", name: "Clearwell Chlorine", sensor_type: SensorType::Chlorine, unit: "mg/L", range: (0.5, 2.5), setpoint: Some(1.5), comm: CommStatus::Online, trail: &[1.4, 1.5, 1.5, 1.5] },
    Entry { id: "nr-press-01", name: "High Service Pressure", sensor_type: SensorType::Pressure, unit: "bar", range: (3.0, 6.5), setpoint: Some(5.0), comm: CommStatus::Stale, trail: &[5.1, 5.0, 4.9, 4.8] },
    Entry { id: "nr-temp-01", name: "Raw Water Temperature", sensor_type: SensorType::Temperature, unit: "°C", range: (2.0, 28.0), setpoint: None, comm: CommStatus::Online, trail: &[14.2, 14.3, 14.3, 14.4] },
    Entry { id: "nr-lvl-01", name: "Clearwell Level", sensor_type: SensorType::Level, unit: "m", range: (1.5, 6.0), setpoint: Some(4.0), comm: CommStatus::Online, trail: &[3.6, 3.4, 3.1, 2.9] },
    Entry { id: "nr-cond-01", name: "Finished Conductivity", sensor_type: SensorType::Conductivity, unit: "µS/cm", range: (100.0, 800.0), setpoint: None, comm: CommStatus::Offline, trail: &[412.0, 415.0, 409.0, 411.0] },
    Entry { id: "nr-orp-01", name: "Contact Tank ORP", sensor_type: SensorType::Orp, unit: "mV", range: (650.0, 850.0), setpoint: Some(750.0), comm: CommStatus::Online, trail: &[702.0, 690.0, 671.0, 644.0] },
    Entry { id: "nr-do-01", name: "Aeration DO", sensor_type: SensorType::DissolvedOxygen, unit: "mg/L", range: (4.0, 10.0), setpoint: Some(7.0), comm: CommStatus::Online, trail: &[6.8, 6.9, 7.1, 7.0] },
];

#[rustfmt::skip]
const RIVERSIDE: &[Entry] = &[
    Entry { id: "rs-do-01", name: "Basin 1 DO", sensor_type: SensorType::DissolvedOxygen, unit: "mg/L", range: (1.5, 4.0), setpoint: Some(2.0), comm: CommStatus::Online, trail: &[1.9, 1.7, 1.4, 1.2] },
    Entry { id: "rs-do-02", name: "Basin 2 DO", sensor_type: SensorType::DissolvedOxygen, unit: "mg/L", range: (1.5, 4.0), setpoint: Some(2.0), comm: CommStatus::Online, trail: &[2.1, 2.0, 2.0, 2.1] },
    Entry { id: "rs-flow-01", name: "Effluent Flow", sensor_type: SensorType::Flow, unit: "m³/h", range: (200.0, 1500.0), setpoint: None, comm: CommStatus::Online, trail: &[860.0, 884.0, 903.0, 911.0] },
    Entry { id: "rs-ph-01", name: "Effluent pH", sensor_type: SensorType::Ph, unit: "pH", range: (6.0, 9.0), setpoint: Some(7.0), comm: CommStatus::Online, trail: &[7.0, 7.1, 7.0, 6.9] },
    Entry { id: "rs-temp-01", name: "Digester Temperature", sensor_type: SensorType::Temperature, unit: "°C", range: (33.0, 39.0), setpoint: Some(36.0), comm: CommStatus::Online, trail: &[36.2, 36.8, 37.9, 39.4] },
    Entry { id: "rs-lvl-01", name: "Wet Well Level", sensor_type: SensorType::Level, unit: "m", range: (0.8, 4.5), setpoint: Some(2.5), comm: CommStatus::Stale, trail: &[2.4, 2.6, 2.7, 2.7] },
    Entry { id: "rs-turb-01", name: "Effluent Turbidity", sensor_type: SensorType::Turbidity, unit: "NTU", range: (0.0, 5.0), setpoint: None, comm: CommStatus::Online, trail: &[1.8, 1.9, 1.7, 1.8] },
    Entry { id: "rs-press-01", name: "Blower Header Pressure", sensor_type: SensorType::Pressure, unit: "bar", range: (0.4, 0.9), setpoint: Some(0.6), comm: CommStatus::Offline, trail: &[0.61, 0.62, 0.6, 0.61] },
];

fn readings(facility_id: &str, entries: &[Entry]) -> Vec<SensorReading> {
    // ---
    entries
        .iter()
        .map(|entry| {
            let (min, max) = entry.range;
            let value = entry.trail.last().copied().unwrap_or(min);
            SensorReading {
                id: entry.id.to_string(),
                name: entry.name.to_string(),
                facility_id: facility_id.to_string(),
                sensor_type: entry.sensor_type,
                value,
                unit: entry.unit.to_string(),
                min,
                max,
                setpoint: entry.setpoint,
                history: entry.trail.to_vec(),
                comm_status: entry.comm,
                status: classify_warning(value, min, max),
                last_updated: None,
            }
        })
        .collect()
}

pub(super) fn snapshot() -> CatalogSnapshot {
    // ---
    let facilities = vec![
        Facility {
            id: "north-ridge".to_string(),
            name: "North Ridge WTP".to_string(),
            location: "Ridgefield, North District".to_string(),
            status: FacilityStatus::Warning,
        },
        Facility {
            id: "riverside".to_string(),
            name: "Riverside WWTP".to_string(),
            location: "Riverside, East Bank".to_string(),
            status: FacilityStatus::Online,
        },
    ];

    let mut sensors = readings("north-ridge", NORTH_RIDGE);
    sensors.extend(readings("riverside", RIVERSIDE));

    CatalogSnapshot {
        facilities,
        sensors,
    }
}
