/*!
Speed-adaptive sweep scheduling.

Each active socket group estimates its swing speed every tick from the distance its
reference point (the first point of the chain) moved since the previous tick. The speed
selects an entry of the adaptive table, which gives the group's sweep cadence and the
number of sub-frame interpolation steps used by the geometry engine.

Selection walks the table from the lowest threshold upwards and keeps the last entry
whose threshold is `<= speed`. The first entry is the fallback and is expected to have
a zero threshold (`HitDetectionSettings::validate` enforces this).
*/

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ADAPTIVE_TABLE, MIN_DELTA_TIME};
use crate::types::Vec3;

/// One row of the adaptive table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveTraceEntry {
    /// Time between two sweeps of a group (seconds).
    pub cadence_seconds: f32,
    /// Sub-frame interpolation steps per sweep.
    pub interpolation_steps: u32,
    /// Minimum swing speed selecting this row.
    pub speed_threshold: f32,
}

impl AdaptiveTraceEntry {
    pub const fn new(cadence_seconds: f32, interpolation_steps: u32, speed_threshold: f32) -> Self {
        Self {
            cadence_seconds,
            interpolation_steps,
            speed_threshold,
        }
    }
}

/// The shipped adaptive table.
pub fn default_adaptive_table() -> Vec<AdaptiveTraceEntry> {
    DEFAULT_ADAPTIVE_TABLE
        .iter()
        .map(|&(cadence, steps, threshold)| AdaptiveTraceEntry::new(cadence, steps, threshold))
        .collect()
}

/// Swing speed of a reference point between two ticks.
///
/// Returns 0 when `dt` is too small to divide by.
#[inline]
pub fn swing_speed(previous: &Vec3, current: &Vec3, dt: f32) -> f32 {
    if dt <= MIN_DELTA_TIME {
        return 0.0;
    }
    (current - previous).norm() / dt
}

/// Selects the adaptive entry for `speed`.
///
/// An empty table yields `None`; callers keep their previous parameters in that case.
pub fn select_entry(table: &[AdaptiveTraceEntry], speed: f32) -> Option<AdaptiveTraceEntry> {
    let mut selected = *table.first()?;
    for entry in table {
        if speed >= entry.speed_threshold {
            selected = *entry;
        } else {
            break;
        }
    }
    Some(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_speed_selects_the_first_entry() {
        let table = default_adaptive_table();
        let e = select_entry(&table, 0.0).unwrap();
        assert_eq!(e.cadence_seconds, 0.05);
        assert_eq!(e.interpolation_steps, 1);
    }

    #[test]
    fn speed_above_every_threshold_selects_the_last_entry() {
        let table = vec![
            AdaptiveTraceEntry::new(0.05, 1, 0.0),
            AdaptiveTraceEntry::new(0.033, 2, 1500.0),
            AdaptiveTraceEntry::new(0.016, 5, 5000.0),
        ];
        let e = select_entry(&table, 6000.0).unwrap();
        assert_eq!(e.cadence_seconds, 0.016);
        assert_eq!(e.interpolation_steps, 5);
    }

    #[test]
    fn selection_stops_at_first_threshold_above_speed() {
        let table = default_adaptive_table();
        let e = select_entry(&table, 2999.0).unwrap();
        assert_eq!(e.speed_threshold, 2500.0);
        // Exactly on a threshold selects that row.
        let e = select_entry(&table, 3000.0).unwrap();
        assert_eq!(e.speed_threshold, 3000.0);
    }

    #[test]
    fn empty_table_selects_nothing() {
        assert_eq!(select_entry(&[], 100.0), None);
    }

    #[test]
    fn tiny_delta_time_gives_zero_speed() {
        let a = Vec3::zeros();
        let b = Vec3::new(100.0, 0.0, 0.0);
        assert_eq!(swing_speed(&a, &b, 0.0), 0.0);
        assert_eq!(swing_speed(&a, &b, 1.0e-9), 0.0);
        assert_eq!(swing_speed(&a, &b, 0.5), 200.0);
    }

    #[test]
    fn microsecond_tick_stays_on_the_first_row() {
        let a = Vec3::zeros();
        let b = Vec3::new(1.0, 0.0, 0.0);
        let speed = swing_speed(&a, &b, 1.0e-6);
        assert_eq!(speed, 0.0);
        let entry = select_entry(&default_adaptive_table(), speed).unwrap();
        assert_eq!(entry.interpolation_steps, 1);
    }

    proptest! {
        #[test]
        fn faster_swings_never_sample_coarser(a in 0.0f32..20000.0, b in 0.0f32..20000.0) {
            let (slow, fast) = if a <= b { (a, b) } else { (b, a) };
            let table = default_adaptive_table();
            let s = select_entry(&table, slow).unwrap();
            let f = select_entry(&table, fast).unwrap();
            prop_assert!(f.cadence_seconds <= s.cadence_seconds);
            prop_assert!(f.interpolation_steps >= s.interpolation_steps);
        }
    }
}
