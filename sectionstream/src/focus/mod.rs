//! Focus points: the moving observers that drive section residency.
//!
//! A focus is a player, camera, or AI point of interest. The host supplies
//! raw [`FocusSample`]s through a [`FocusSource`] every tick; the
//! [`FocusTracker`] derives velocity from position deltas and hands the
//! scanner a list of [`Focus`] values. Foci are ephemeral: nothing about them
//! persists beyond the tracker's previous-position cache.

mod source;
mod tracker;

pub use source::{FocusSource, StaticFocusSource};
pub use tracker::FocusTracker;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::{WorldPoint, WorldVec};

/// Smallest radius scale a focus may apply; lower values are clamped so a
/// misconfigured focus can never collapse every radius to zero.
pub const MIN_RADIUS_SCALE: f32 = 1e-3;

/// Identifier of a focus point, stable across ticks.
///
/// Only used to correlate samples between ticks for velocity derivation; the
/// scanner itself treats foci as anonymous.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FocusId(pub u32);

impl fmt::Display for FocusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Raw per-tick focus data supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusSample {
    pub id: FocusId,
    pub position: WorldPoint,
    /// Multiplies every descriptor radius this focus evaluates.
    pub radius_scale: f32,
    /// Added to enter radii after scaling.
    pub load_radius_offset: f32,
    /// Added to exit radii after scaling.
    pub unload_radius_offset: f32,
}

impl FocusSample {
    /// A sample with neutral radius modifiers.
    pub fn at(id: FocusId, position: WorldPoint) -> Self {
        Self {
            id,
            position,
            radius_scale: 1.0,
            load_radius_offset: 0.0,
            unload_radius_offset: 0.0,
        }
    }

    pub fn with_radius_scale(mut self, scale: f32) -> Self {
        self.radius_scale = scale;
        self
    }

    pub fn with_load_radius_offset(mut self, offset: f32) -> Self {
        self.load_radius_offset = offset;
        self
    }

    pub fn with_unload_radius_offset(mut self, offset: f32) -> Self {
        self.unload_radius_offset = offset;
        self
    }
}

/// A fully derived focus for one tick: position, velocity, radius modifiers.
///
/// `radius_scale` is guaranteed clamped to at least [`MIN_RADIUS_SCALE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Focus {
    pub position: WorldPoint,
    pub velocity: WorldVec,
    pub radius_scale: f32,
    pub load_radius_offset: f32,
    pub unload_radius_offset: f32,
}

impl Focus {
    /// A motionless focus with neutral radius modifiers.
    pub fn stationary(position: WorldPoint) -> Self {
        Self {
            position,
            velocity: WorldVec::ZERO,
            radius_scale: 1.0,
            load_radius_offset: 0.0,
            unload_radius_offset: 0.0,
        }
    }

    /// Unit heading, or `None` while the focus is (near-)stationary.
    pub fn heading(&self) -> Option<WorldVec> {
        self.velocity.normalized()
    }
}
