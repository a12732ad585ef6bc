//! Simulation time.
//!
//! The pipeline never reads wall-clock time. Hosts drive it with a
//! monotonically increasing [`Tick`] counter plus a delta-time used only for
//! focus velocity derivation, supplied through the [`SimClock`] trait.
//! [`StepClock`] is the fixed-step implementation used by the CLI and tests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default fixed step for [`StepClock`] (60 Hz).
pub const DEFAULT_TICK_SECONDS: f32 = 1.0 / 60.0;

/// A monotonically increasing simulation tick.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Tick(pub u64);

impl Tick {
    /// Tick zero, the instant before the first pipeline run.
    pub const ZERO: Tick = Tick(0);

    pub fn value(&self) -> u64 {
        self.0
    }

    /// This tick advanced by `ticks`, saturating at the numeric limit.
    pub fn advanced_by(&self, ticks: u64) -> Tick {
        Tick(self.0.saturating_add(ticks))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of simulation time for the streaming pipeline.
pub trait SimClock {
    /// Current tick. Must never decrease between calls.
    fn now(&self) -> Tick;

    /// Seconds elapsed since the previous tick. May be zero on the first
    /// tick; never negative.
    fn delta_seconds(&self) -> f32;
}

/// Fixed-step clock advanced explicitly by the host loop.
#[derive(Debug, Clone)]
pub struct StepClock {
    tick: Tick,
    step_seconds: f32,
}

impl StepClock {
    /// Create a clock at tick zero with the given step length.
    pub fn new(step_seconds: f32) -> Self {
        Self {
            tick: Tick::ZERO,
            step_seconds,
        }
    }

    /// Advance one step and return the new current tick.
    pub fn advance(&mut self) -> Tick {
        self.tick = self.tick.advanced_by(1);
        self.tick
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_SECONDS)
    }
}

impl SimClock for StepClock {
    fn now(&self) -> Tick {
        self.tick
    }

    fn delta_seconds(&self) -> f32 {
        self.step_seconds
    }
}
