//! Sensor status and personalized monitoring for water-treatment plants.
//!
//! The crate is organized leaf to root:
//! - `classifier` – maps a value and its bands to a severity tier
//! - `trend` – direction and delta from the last two samples
//! - `simulator` – seeded live feed for a small panel of variables
//! - `selection` – per-facility pinned sensors, bounded and persisted
//! - `presentation` – resolves what a facility view shows
//! - `source` – read-only facility/sensor catalog
//! - `routes` – JSON API over all of the above
//!
//! Following the Explicit Module Boundary Pattern (EMBP), sibling modules
//! reach each other through the re-exports below rather than deep paths
//! where practical.

pub mod classifier;
pub mod config;
pub mod models;
pub mod presentation;
pub mod routes;
pub mod selection;
pub mod simulator;
pub mod source;
pub mod trend;

pub use config::Config;
pub use models::{CommStatus, Facility, FacilityStatus, SensorReading, SensorType, Severity};
pub use presentation::{FacilityCounters, FacilityView, SensorCard};
pub use selection::{JsonFileStorage, MemoryStorage, SelectionState, SelectionStore, MAX_PINNED};
pub use simulator::{LiveSimulator, SimulatorHandle, SimulatorSnapshot};
pub use source::{Catalog, SensorSource};
pub use trend::{Direction, Trend};
