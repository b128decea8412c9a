//! Short-term trend from the last two samples of a value history.

use serde::{Deserialize, Serialize};

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    #[default]
    Stable,
}

/// Direction and signed change between the two most recent samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Trend {
    pub direction: Direction,
    pub delta: f64,
}

impl Trend {
    // ---
    /// Trend from `previous` to `latest`.
    pub fn between(previous: f64, latest: f64) -> Self {
        // ---
        let delta = latest - previous;
        let direction = if delta > 0.0 {
            Direction::Up
        } else if delta < 0.0 {
            Direction::Down
        } else {
            Direction::Stable
        };
        Self { direction, delta }
    }
}

/// Trend of a history ordered oldest to newest. Fewer than two samples is
/// `Stable` with zero delta.
pub fn trend(history: &[f64]) -> Trend {
    // ---
    match history {
        [.., previous, latest] => Trend::between(*previous, *latest),
        _ => Trend::default(),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_short_history_is_stable() {
        // ---
        assert_eq!(trend(&[]), Trend { direction: Direction::Stable, delta: 0.0 });
        assert_eq!(trend(&[4.2]), Trend { direction: Direction::Stable, delta: 0.0 });
    }

    #[test]
    fn test_uses_last_two_samples_only() {
        // ---
        let t = trend(&[100.0, 1.0, 3.0, 2.5]);
        assert_eq!(t.direction, Direction::Down);
        assert_eq!(t.delta, 2.5 - 3.0);

        let t = trend(&[9.0, 1.0, 3.0]);
        assert_eq!(t.direction, Direction::Up);
        assert_eq!(t.delta, 2.0);
    }

    #[test]
    fn test_direction_sign_matches_delta() {
        // ---
        let histories: [&[f64]; 5] = [
            &[1.0, 1.0],
            &[0.0, -0.001],
            &[-5.0, 5.0],
            &[7.25, 7.25, 7.3],
            &[500.0, 480.0],
        ];
        for history in histories {
            let t = trend(history);
            let n = history.len();
            assert_eq!(t.delta, history[n - 1] - history[n - 2]);
            match t.direction {
                Direction::Up => assert!(t.delta > 0.0),
                Direction::Down => assert!(t.delta < 0.0),
                Direction::Stable => assert_eq!(t.delta, 0.0),
            }
        }
    }
}
