//! World-space geometry primitives.
//!
//! Positions and velocities are plain `f32` triples in world units. The
//! streaming pipeline only needs distances, unit directions, and dot
//! products, so the surface here stays deliberately small.

use serde::{Deserialize, Serialize};

/// Vectors shorter than this are treated as zero when normalizing.
pub const MIN_VECTOR_LENGTH: f32 = 1e-6;

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A displacement or velocity in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldVec {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPoint {
    /// The world origin.
    pub const ORIGIN: WorldPoint = WorldPoint {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance_to(&self, other: WorldPoint) -> f32 {
        self.distance_squared_to(other).sqrt()
    }

    /// Squared distance, for comparisons that do not need the root.
    #[inline]
    pub fn distance_squared_to(&self, other: WorldPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Displacement from `self` to `other`.
    #[inline]
    pub fn vector_to(&self, other: WorldPoint) -> WorldVec {
        WorldVec {
            x: other.x - self.x,
            y: other.y - self.y,
            z: other.z - self.z,
        }
    }

    /// The point displaced by `v`.
    #[inline]
    pub fn offset(&self, v: WorldVec) -> WorldPoint {
        WorldPoint {
            x: self.x + v.x,
            y: self.y + v.y,
            z: self.z + v.z,
        }
    }
}

impl WorldVec {
    /// The zero vector.
    pub const ZERO: WorldVec = WorldVec {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn dot(&self, other: WorldVec) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn scale(&self, factor: f32) -> WorldVec {
        WorldVec {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    /// Unit vector in the same direction, or `None` for a (near-)zero vector.
    pub fn normalized(&self) -> Option<WorldVec> {
        let len = self.length();
        if len < MIN_VECTOR_LENGTH {
            return None;
        }
        Some(self.scale(1.0 / len))
    }
}
