//! Focus supply.

use crate::geom::WorldPoint;

use super::{FocusId, FocusSample};

/// Supplies the current focus samples each tick.
///
/// Implemented by game-specific code (camera rigs, player avatars, AI
/// observers). Returning an empty list is valid and makes the scanner desire
/// nothing this tick.
pub trait FocusSource {
    fn current_foci(&mut self) -> Vec<FocusSample>;
}

/// A source backed by an explicit sample list, repositioned by the caller
/// between ticks. Used by tests and the simulation CLI.
#[derive(Debug, Clone, Default)]
pub struct StaticFocusSource {
    samples: Vec<FocusSample>,
}

impl StaticFocusSource {
    pub fn new(samples: Vec<FocusSample>) -> Self {
        Self { samples }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the whole sample list.
    pub fn set(&mut self, samples: Vec<FocusSample>) {
        self.samples = samples;
    }

    /// Reposition the sample with the given id, if present.
    pub fn move_to(&mut self, id: FocusId, position: WorldPoint) {
        if let Some(sample) = self.samples.iter_mut().find(|s| s.id == id) {
            sample.position = position;
        }
    }
}

impl FocusSource for StaticFocusSource {
    fn current_foci(&mut self) -> Vec<FocusSample> {
        self.samples.clone()
    }
}
