//! Immutable per-section placement and scheduling data.

use std::fmt;

use tracing::debug;

use crate::geom::WorldPoint;

/// Minimum width of the hysteresis band between enter and exit radius.
///
/// A descriptor whose exit radius is closer than this to its enter radius is
/// widened at construction, so the two thresholds can never coincide.
pub const MIN_HYSTERESIS_BAND: f32 = 1e-3;

/// Scoring priority assigned when a descriptor does not set one.
pub const DEFAULT_PRIORITY: i32 = 0;

/// Opaque reference to loadable content.
///
/// The streaming core never interprets this value; it is passed through to
/// the content loader verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentRef(String);

impl ContentRef {
    pub fn new(reference: impl Into<String>) -> Self {
        ContentRef(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable placement, sizing, and scheduling data for one section.
///
/// Created once at registration and owned by the registry afterwards. The
/// `exit_radius >= enter_radius` invariant is enforced here by widening the
/// exit radius when violated, so hysteresis always has a real band to work
/// with.
#[derive(Debug, Clone)]
pub struct SectionDescriptor {
    name: String,
    center: WorldPoint,
    enter_radius: f32,
    exit_radius: f32,
    priority: i32,
    estimated_cost: f32,
    manual: bool,
    content: Option<ContentRef>,
}

impl SectionDescriptor {
    /// Create a descriptor with default priority, zero cost, automatic
    /// scanning, and no content reference.
    pub fn new(
        name: impl Into<String>,
        center: WorldPoint,
        enter_radius: f32,
        exit_radius: f32,
    ) -> Self {
        let name = name.into();
        let min_exit = enter_radius + MIN_HYSTERESIS_BAND;
        let exit_radius = if exit_radius < min_exit {
            debug!(
                section = %name,
                requested = exit_radius,
                widened = min_exit,
                "Exit radius narrower than enter radius, widening"
            );
            min_exit
        } else {
            exit_radius
        };

        Self {
            name,
            center,
            enter_radius,
            exit_radius,
            priority: DEFAULT_PRIORITY,
            estimated_cost: 0.0,
            manual: false,
            content: None,
        }
    }

    /// Set the scoring priority (higher = preferred).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the estimated load cost (scoring penalty).
    pub fn with_estimated_cost(mut self, cost: f32) -> Self {
        self.estimated_cost = cost;
        self
    }

    /// Set the content reference handed to the loader.
    pub fn with_content(mut self, content: ContentRef) -> Self {
        self.content = Some(content);
        self
    }

    /// Opt the section out of automatic scanning; only explicit manual
    /// commands will move it.
    pub fn manual(mut self) -> Self {
        self.manual = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn center(&self) -> WorldPoint {
        self.center
    }

    pub fn enter_radius(&self) -> f32 {
        self.enter_radius
    }

    pub fn exit_radius(&self) -> f32 {
        self.exit_radius
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn estimated_cost(&self) -> f32 {
        self.estimated_cost
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn content(&self) -> Option<&ContentRef> {
        self.content.as_ref()
    }
}
