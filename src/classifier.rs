//! Threshold classification of sensor values into severity tiers.
//!
//! Two paths exist:
//! - a single warning band (`min`/`max`), used for the general sensor cards,
//! - a warning band plus a critical band, used by the live simulated panel.
//!
//! Both are total. Non-finite values classify as `Critical`.

use serde::{Deserialize, Serialize};

use crate::models::Severity;

// ---

/// Inclusive-normal band `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

/// Warning and critical bands for a variable with two alarm tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlarmBands {
    pub warning: Band,
    pub critical: Band,
}

/// Classify `value` against the optional bands.
///
/// With only a warning band, values strictly outside `[min, max]` are
/// `Warning`. When a critical band is also given, the limits are treated as
/// reached on equality and critical is checked first.
pub fn classify(value: f64, warning: Band, critical: Option<Band>) -> Severity {
    // ---
    match critical {
        None => classify_warning(value, warning.low, warning.high),
        Some(critical) => classify_two_band(value, &AlarmBands { warning, critical }),
    }
}

/// General sensor-card path.
pub fn classify_warning(value: f64, min: f64, max: f64) -> Severity {
    // ---
    if !value.is_finite() {
        return Severity::Critical;
    }
    if value < min || value > max {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

/// Live panel path with distinct warning and critical limits.
pub fn classify_two_band(value: f64, bands: &AlarmBands) -> Severity {
    // ---
    if !value.is_finite() {
        return Severity::Critical;
    }
    if value <= bands.critical.low || value >= bands.critical.high {
        return Severity::Critical;
    }
    if value <= bands.warning.low || value >= bands.warning.high {
        return Severity::Warning;
    }
    Severity::Normal
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    const PH_BANDS: AlarmBands = AlarmBands {
        warning: Band::new(6.5, 8.5),
        critical: Band::new(6.0, 9.0),
    };

    #[test]
    fn test_warning_band_inclusive() {
        // ---
        assert_eq!(classify_warning(6.5, 6.5, 8.5), Severity::Normal);
        assert_eq!(classify_warning(8.5, 6.5, 8.5), Severity::Normal);
        assert_eq!(classify_warning(7.2, 6.5, 8.5), Severity::Normal);
        assert_eq!(classify_warning(6.49, 6.5, 8.5), Severity::Warning);
        assert_eq!(classify_warning(8.9, 6.5, 8.5), Severity::Warning);
    }

    #[test]
    fn test_warning_band_matches_range_check() {
        // ---
        let (min, max) = (100.0, 900.0);
        for step in 0..=120 {
            let value = step as f64 * 10.0;
            let expected = if (min..=max).contains(&value) {
                Severity::Normal
            } else {
                Severity::Warning
            };
            assert_eq!(classify_warning(value, min, max), expected, "value {value}");
        }
    }

    #[test]
    fn test_two_band_critical_checked_first() {
        // ---
        assert_eq!(classify_two_band(9.0, &PH_BANDS), Severity::Critical);
        assert_eq!(classify_two_band(6.0, &PH_BANDS), Severity::Critical);
        assert_eq!(classify_two_band(9.5, &PH_BANDS), Severity::Critical);
        assert_eq!(classify_two_band(5.1, &PH_BANDS), Severity::Critical);
    }

    #[test]
    fn test_two_band_warning_on_edges() {
        // ---
        assert_eq!(classify_two_band(8.5, &PH_BANDS), Severity::Warning);
        assert_eq!(classify_two_band(6.5, &PH_BANDS), Severity::Warning);
        assert_eq!(classify_two_band(8.99, &PH_BANDS), Severity::Warning);
        assert_eq!(classify_two_band(7.0, &PH_BANDS), Severity::Normal);
    }

    #[test]
    fn test_non_finite_is_critical() {
        // ---
        assert_eq!(classify_warning(f64::NAN, 0.0, 1.0), Severity::Critical);
        assert_eq!(classify_warning(f64::INFINITY, 0.0, 1.0), Severity::Critical);
        assert_eq!(classify_two_band(f64::NEG_INFINITY, &PH_BANDS), Severity::Critical);
        assert_eq!(classify_two_band(f64::NAN, &PH_BANDS), Severity::Critical);
    }

    #[test]
    fn test_classify_dispatch() {
        // ---
        let warning = Band::new(6.5, 8.5);
        assert_eq!(classify(9.0, warning, None), Severity::Warning);
        assert_eq!(classify(9.0, warning, Some(PH_BANDS.critical)), Severity::Critical);
        assert_eq!(classify(7.0, warning, Some(PH_BANDS.critical)), Severity::Normal);
    }
}
