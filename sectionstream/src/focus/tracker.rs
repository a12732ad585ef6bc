//! Per-tick focus refresh and velocity derivation.

use std::collections::HashMap;

use crate::geom::{WorldPoint, WorldVec};

use super::{Focus, FocusId, FocusSample, MIN_RADIUS_SCALE};

/// Derives focus velocity from position deltas between ticks.
///
/// The tracker's only state is a previous-position cache keyed by focus id.
/// A focus seen for the first time (or after disappearing) gets zero
/// velocity, as does every focus when `dt <= 0`. Cache entries for foci that
/// stopped appearing are pruned on the next refresh, so a focus that vanishes
/// and returns starts over rather than inheriting a stale delta.
#[derive(Debug, Default)]
pub struct FocusTracker {
    previous: HashMap<FocusId, WorldPoint>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn this tick's raw samples into derived foci.
    pub fn refresh(&mut self, samples: &[FocusSample], dt: f32) -> Vec<Focus> {
        let mut next = HashMap::with_capacity(samples.len());
        let mut foci = Vec::with_capacity(samples.len());

        for sample in samples {
            let velocity = match self.previous.get(&sample.id) {
                Some(prev) if dt > 0.0 => prev.vector_to(sample.position).scale(1.0 / dt),
                _ => WorldVec::ZERO,
            };
            next.insert(sample.id, sample.position);
            foci.push(Focus {
                position: sample.position,
                velocity,
                radius_scale: sample.radius_scale.max(MIN_RADIUS_SCALE),
                load_radius_offset: sample.load_radius_offset,
                unload_radius_offset: sample.unload_radius_offset,
            });
        }

        self.previous = next;
        foci
    }

    /// Number of foci currently cached from the last refresh.
    pub fn cached_foci(&self) -> usize {
        self.previous.len()
    }

    /// Drop all cached positions; the next refresh derives zero velocities.
    pub fn reset(&mut self) {
        self.previous.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.5;

    fn sample_at(id: u32, x: f32) -> FocusSample {
        FocusSample::at(FocusId(id), WorldPoint::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_first_sighting_has_zero_velocity() {
        let mut tracker = FocusTracker::new();
        let foci = tracker.refresh(&[sample_at(0, 3.0)], DT);
        assert_eq!(foci.len(), 1);
        assert_eq!(foci[0].velocity, WorldVec::ZERO);
    }

    #[test]
    fn test_velocity_from_position_delta() {
        let mut tracker = FocusTracker::new();
        tracker.refresh(&[sample_at(0, 0.0)], DT);
        let foci = tracker.refresh(&[sample_at(0, 1.0)], DT);
        // Moved 1 unit in 0.5 s.
        assert_eq!(foci[0].velocity, WorldVec::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_zero_dt_yields_zero_velocity() {
        let mut tracker = FocusTracker::new();
        tracker.refresh(&[sample_at(0, 0.0)], DT);
        let foci = tracker.refresh(&[sample_at(0, 1.0)], 0.0);
        assert_eq!(foci[0].velocity, WorldVec::ZERO);
    }

    #[test]
    fn test_vanished_focus_is_pruned() {
        let mut tracker = FocusTracker::new();
        tracker.refresh(&[sample_at(0, 0.0), sample_at(1, 5.0)], DT);
        assert_eq!(tracker.cached_foci(), 2);

        tracker.refresh(&[sample_at(0, 1.0)], DT);
        assert_eq!(tracker.cached_foci(), 1);

        // Returning focus starts over with zero velocity.
        let foci = tracker.refresh(&[sample_at(0, 2.0), sample_at(1, 9.0)], DT);
        assert_eq!(foci[1].velocity, WorldVec::ZERO);
    }

    #[test]
    fn test_radius_scale_clamped() {
        let mut tracker = FocusTracker::new();
        let sample = sample_at(0, 0.0).with_radius_scale(0.0);
        let foci = tracker.refresh(&[sample], DT);
        assert_eq!(foci[0].radius_scale, MIN_RADIUS_SCALE);
    }

    #[test]
    fn test_reset_clears_cache() {
        let mut tracker = FocusTracker::new();
        tracker.refresh(&[sample_at(0, 0.0)], DT);
        tracker.reset();
        assert_eq!(tracker.cached_foci(), 0);
        let foci = tracker.refresh(&[sample_at(0, 4.0)], DT);
        assert_eq!(foci[0].velocity, WorldVec::ZERO);
    }
}
