//! Live value simulator for the monitored variable panel.
//!
//! A fixed set of variables is perturbed once per tick. The perturbation is
//! derived from an injectable seed function of `(tick, index)`, so a run is
//! reproducible from its starting state. Each tick re-derives the trend and
//! the two-band severity of every variable and publishes a snapshot.
//!
//! [`LiveSimulator::tick`] is synchronous and owns all the math.
//! [`LiveSimulator::spawn`] moves the simulator onto a tokio interval and
//! returns a [`SimulatorHandle`] whose lifetime bounds the timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::classifier::{classify_two_band, AlarmBands, Band};
use crate::models::Severity;
use crate::trend::Trend;

// ---

/// Maximum step per tick as a fraction of the declared range.
const MAX_STEP_FRACTION: f64 = 0.10;

/// Values are kept this fraction away from either end of the range.
const RAIL_MARGIN_FRACTION: f64 = 0.05;

/// Seed function: `(tick, variable index) -> [0, 1)`.
pub type SeedFn = Arc<dyn Fn(u64, usize) -> f64 + Send + Sync>;

/// Default seed. Not cryptographic; only reproducible.
pub fn sine_seed(tick: u64, index: usize) -> f64 {
    // ---
    let x = ((tick as f64) * 12.9898 + (index as f64 + 1.0) * 78.233).sin() * 43_758.545_3;
    x - x.floor()
}

/// Static description of one simulated variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSpec {
    pub id: String,
    pub name: String,
    pub unit: String,
    /// Declared display range.
    pub min: f64,
    pub max: f64,
    pub bands: AlarmBands,
    pub initial: f64,
}

impl VariableSpec {
    // ---
    fn new(
        id: &str,
        name: &str,
        unit: &str,
        range: (f64, f64),
        warning: (f64, f64),
        critical: (f64, f64),
        initial: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
            min: range.0,
            max: range.1,
            bands: AlarmBands {
                warning: Band::new(warning.0, warning.1),
                critical: Band::new(critical.0, critical.1),
            },
            initial,
        }
    }
}

/// The default treatment-process panel.
pub fn default_panel() -> Vec<VariableSpec> {
    // ---
    vec![
        VariableSpec::new("ph", "pH", "pH", (5.0, 10.0), (6.5, 8.5), (6.0, 9.0), 7.2),
        VariableSpec::new(
            "temperature",
            "Water Temperature",
            "°C",
            (0.0, 40.0),
            (5.0, 30.0),
            (2.0, 35.0),
            18.5,
        ),
        VariableSpec::new("pressure", "Line Pressure", "bar", (0.0, 10.0), (2.0, 7.0), (1.0, 8.5), 4.5),
        VariableSpec::new("turbidity", "Turbidity", "NTU", (0.0, 5.0), (0.0, 1.0), (0.0, 4.0), 0.6),
        VariableSpec::new(
            "chlorine",
            "Chlorine Residual",
            "mg/L",
            (0.0, 4.0),
            (0.5, 2.5),
            (0.2, 3.5),
            1.2,
        ),
        VariableSpec::new(
            "dissolved_oxygen",
            "Dissolved Oxygen",
            "mg/L",
            (0.0, 12.0),
            (4.0, 10.0),
            (2.0, 11.0),
            7.5,
        ),
    ]
}

/// Published state of one simulated variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedSensor {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub bands: AlarmBands,
    pub trend: Trend,
    pub severity: Severity,
}

/// Everything the panel renders after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatorSnapshot {
    pub tick: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub sensors: Vec<SimulatedSensor>,
}

/// Owns the simulated state and the seed function.
pub struct LiveSimulator {
    snapshot: SimulatorSnapshot,
    seed: SeedFn,
}

impl LiveSimulator {
    // ---
    pub fn new(specs: Vec<VariableSpec>) -> Self {
        Self::with_seed(specs, Arc::new(sine_seed))
    }

    pub fn with_seed(specs: Vec<VariableSpec>, seed: SeedFn) -> Self {
        // ---
        let sensors = specs
            .into_iter()
            .map(|spec| {
                let value = round2(spec.initial);
                SimulatedSensor {
                    severity: classify_two_band(value, &spec.bands),
                    id: spec.id,
                    name: spec.name,
                    unit: spec.unit,
                    value,
                    min: spec.min,
                    max: spec.max,
                    bands: spec.bands,
                    trend: Trend::default(),
                }
            })
            .collect();

        Self {
            snapshot: SimulatorSnapshot {
                tick: 0,
                published_at: None,
                sensors,
            },
            seed,
        }
    }

    pub fn snapshot(&self) -> &SimulatorSnapshot {
        &self.snapshot
    }

    /// Advance one tick and return the new state.
    pub fn tick(&mut self) -> &SimulatorSnapshot {
        // ---
        self.snapshot.tick += 1;
        let tick = self.snapshot.tick;

        for (index, sensor) in self.snapshot.sensors.iter_mut().enumerate() {
            let draw = (self.seed)(tick, index);
            let next = perturb(sensor.value, sensor.min, sensor.max, draw);

            sensor.trend = Trend::between(sensor.value, next);
            sensor.severity = classify_two_band(next, &sensor.bands);
            sensor.value = next;
        }

        debug!(
            "Simulator tick {}: {} variables, {} not normal",
            tick,
            self.snapshot.sensors.len(),
            self.snapshot
                .sensors
                .iter()
                .filter(|s| s.severity != Severity::Normal)
                .count()
        );

        &self.snapshot
    }

    /// Run the simulator on a tokio interval of `period`.
    ///
    /// The first perturbation happens one full period after spawning. Must be
    /// called from within a tokio runtime.
    pub fn spawn(self, period: Duration) -> SimulatorHandle {
        // ---
        let (tx, rx) = watch::channel(self.snapshot.clone());
        let period = period.max(Duration::from_millis(1));
        info!("Starting live simulator with {:?} period", period);

        let mut sim = self;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick of a tokio interval completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let mut snapshot = sim.tick().clone();
                snapshot.published_at = Some(Utc::now());
                tx.send_replace(snapshot);
            }
        });

        SimulatorHandle { task, rx }
    }
}

/// Apply one seeded step to `value`, keep it inside the rails, round to 2dp.
fn perturb(value: f64, min: f64, max: f64, draw: f64) -> f64 {
    // ---
    let draw = if draw.is_finite() { draw.clamp(0.0, 1.0) } else { 0.5 };
    let range = max - min;
    let step = (draw - 0.5) * 2.0 * MAX_STEP_FRACTION * range;

    let a = min + RAIL_MARGIN_FRACTION * range;
    let b = max - RAIL_MARGIN_FRACTION * range;
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

    // Rails rounded inward so the 2dp result never leaves them.
    let (lo_2dp, hi_2dp) = (ceil2(lo), floor2(hi));
    if lo_2dp > hi_2dp {
        return round2((value + step).clamp(lo, hi));
    }
    round2(value + step).clamp(lo_2dp, hi_2dp)
}

/// Tolerance for products like `9.75 * 100.0` that land a hair off an integer.
const ROUNDING_EPSILON: f64 = 1e-9;

fn ceil2(value: f64) -> f64 {
    (value * 100.0 - ROUNDING_EPSILON).ceil() / 100.0
}

fn floor2(value: f64) -> f64 {
    (value * 100.0 + ROUNDING_EPSILON).floor() / 100.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Running simulator. Dropping the handle stops the timer.
pub struct SimulatorHandle {
    task: JoinHandle<()>,
    rx: watch::Receiver<SimulatorSnapshot>,
}

impl SimulatorHandle {
    // ---
    pub fn subscribe(&self) -> watch::Receiver<SimulatorSnapshot> {
        self.rx.clone()
    }

    /// Last published snapshot. Still readable after [`stop`](Self::stop).
    pub fn latest(&self) -> SimulatorSnapshot {
        self.rx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel the timer. No further ticks are produced.
    pub fn stop(&self) {
        // ---
        if !self.task.is_finished() {
            info!("Stopping live simulator at tick {}", self.rx.borrow().tick);
        }
        self.task.abort();
    }
}

impl Drop for SimulatorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::trend::Direction;

    fn constant_seed(value: f64) -> SeedFn {
        Arc::new(move |_: u64, _: usize| value)
    }

    #[test]
    fn test_sine_seed_range_and_reproducible() {
        // ---
        for tick in 0..500u64 {
            for index in 0..6 {
                let a = sine_seed(tick, index);
                assert!((0.0..1.0).contains(&a), "seed {a} out of range");
                assert_eq!(a, sine_seed(tick, index));
            }
        }
        assert_ne!(sine_seed(1, 0), sine_seed(1, 1));
    }

    #[test]
    fn test_runs_are_deterministic() {
        // ---
        let mut a = LiveSimulator::new(default_panel());
        let mut b = LiveSimulator::new(default_panel());
        for _ in 0..25 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.snapshot().tick, 25);
        assert_eq!(a.snapshot().sensors, b.snapshot().sensors);
    }

    #[test]
    fn test_midpoint_seed_is_stable() {
        // ---
        let mut sim = LiveSimulator::with_seed(default_panel(), constant_seed(0.5));
        let before: Vec<f64> = sim.snapshot().sensors.iter().map(|s| s.value).collect();
        sim.tick();
        for (sensor, old) in sim.snapshot().sensors.iter().zip(before) {
            assert_eq!(sensor.value, old);
            assert_eq!(sensor.trend.direction, Direction::Stable);
        }
    }

    #[test]
    fn test_step_bounded_and_clamped_to_rails() {
        // ---
        let mut sim = LiveSimulator::with_seed(default_panel(), constant_seed(1.0));
        for _ in 0..50 {
            let before: Vec<f64> = sim.snapshot().sensors.iter().map(|s| s.value).collect();
            sim.tick();
            for (sensor, old) in sim.snapshot().sensors.iter().zip(before) {
                let range = sensor.max - sensor.min;
                assert!(sensor.value - old <= 0.1 * range + 1e-9);
                assert!(sensor.value <= sensor.max - 0.05 * range + 1e-9);
                assert!(sensor.value >= sensor.min + 0.05 * range - 1e-9);
            }
        }

        // pH range [5, 10] saturates at 9.75, past the critical limit.
        let ph = &sim.snapshot().sensors[0];
        assert_eq!(ph.value, 9.75);
        assert_eq!(ph.severity, Severity::Critical);
        assert_eq!(ph.trend.direction, Direction::Stable);
    }

    #[test]
    fn test_narrow_range_stays_inside_rails_after_rounding() {
        // ---
        // Rails are [0.0015, 0.0285]; the 2dp values allowed are 0.01 and 0.02.
        let narrow = VariableSpec::new(
            "trace",
            "Trace",
            "mg/L",
            (0.0, 0.03),
            (0.0, 0.03),
            (0.0, 0.03),
            0.01,
        );
        for draw in [0.0, 1.0] {
            let mut sim = LiveSimulator::with_seed(vec![narrow.clone()], constant_seed(draw));
            for _ in 0..10 {
                let value = sim.tick().sensors[0].value;
                assert!((0.0015..=0.0285).contains(&value), "{value} outside rails");
                assert!((value * 100.0 - (value * 100.0).round()).abs() < 1e-9);
            }
        }

        assert_eq!(perturb(0.02, 0.0, 0.03, 1.0), 0.02);
        assert_eq!(perturb(0.01, 0.0, 0.03, 0.0), 0.01);
    }

    #[test]
    fn test_tick_rederives_trend_and_severity() {
        // ---
        let spec = VariableSpec::new("ph", "pH", "pH", (5.0, 10.0), (6.5, 8.5), (6.0, 9.0), 8.2);
        let mut sim = LiveSimulator::with_seed(vec![spec], constant_seed(1.0));
        assert_eq!(sim.snapshot().sensors[0].severity, Severity::Normal);

        // +0.5 per tick
        let sensor = &sim.tick().sensors[0];
        assert_eq!(sensor.value, 8.7);
        assert_eq!(sensor.trend.direction, Direction::Up);
        assert!((sensor.trend.delta - 0.5).abs() < 1e-9);
        assert_eq!(sensor.severity, Severity::Warning);

        let sensor = &sim.tick().sensors[0];
        assert_eq!(sensor.value, 9.2);
        assert_eq!(sensor.severity, Severity::Critical);
    }

    #[test]
    fn test_values_rounded_to_two_places() {
        // ---
        let mut sim = LiveSimulator::new(default_panel());
        for _ in 0..10 {
            for sensor in &sim.tick().sensors {
                let scaled = sensor.value * 100.0;
                assert!((scaled - scaled.round()).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_out_of_range_seed_is_tamed() {
        // ---
        let mut sim = LiveSimulator::with_seed(default_panel(), constant_seed(f64::NAN));
        let before: Vec<f64> = sim.snapshot().sensors.iter().map(|s| s.value).collect();
        sim.tick();
        let after: Vec<f64> = sim.snapshot().sensors.iter().map(|s| s.value).collect();
        assert_eq!(before, after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_publishes_each_period() {
        // ---
        let handle = LiveSimulator::new(default_panel()).spawn(Duration::from_secs(3));
        let mut rx = handle.subscribe();
        assert_eq!(handle.latest().tick, 0);

        tokio_test::assert_ok!(rx.changed().await);
        assert_eq!(rx.borrow_and_update().tick, 1);

        tokio_test::assert_ok!(rx.changed().await);
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.tick, 2);
        assert!(snapshot.published_at.is_some());

        let mut reference = LiveSimulator::new(default_panel());
        reference.tick();
        reference.tick();
        assert_eq!(snapshot.sensors, reference.snapshot().sensors);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks_and_keeps_last_state() {
        // ---
        let handle = LiveSimulator::new(default_panel()).spawn(Duration::from_secs(3));
        let mut rx = handle.subscribe();
        tokio_test::assert_ok!(rx.changed().await);

        handle.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(!handle.is_running());
        assert_eq!(handle.latest().tick, 1);
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        // ---
        let handle = LiveSimulator::new(default_panel()).spawn(Duration::from_secs(3));
        let mut rx = handle.subscribe();
        drop(handle);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(rx.borrow().tick, 0);
        assert!(rx.changed().await.is_err());
    }
}
