//! SectionStream - proximity-driven world section streaming for simulations
//!
//! This library decides, every simulation tick, which discrete world sections
//! should be resident in memory, issues load/unload work to an external
//! asynchronous content loader, and reconciles the loader's eventual status
//! back into authoritative per-section state. Sections near one or more focus
//! points (player, camera, AI points of interest) are loaded; sections no
//! longer near any focus are unloaded; thrashing is suppressed with
//! hysteresis bands and cooldowns; loader throughput is budgeted.
//!
//! # Architecture
//!
//! ```text
//!                ┌────────────── once per simulation tick ──────────────┐
//! FocusSource ──► FocusTracker ─► DesireScanner ─► CommandGuardrail ─►  │
//!                  (velocity)      (hysteresis,      (dedupe, cooldown, │
//!                                   scoring)          pins)             │
//!                 BudgetedExecutor ─► StateSynchronizer ─► StatsTracker │
//!                  (budgets) │            ▲ (poll)          (snapshot)  │
//!                └───────────┼────────────┼─────────────────────────────┘
//!                            ▼            │
//!                         ContentLoader (async, external)
//! ```
//!
//! The stages run single-threaded in fixed order against a registry the
//! [`pipeline::SectionCoordinator`] owns exclusively; the only concurrency is
//! in the external loader, observed by polling. Given identical inputs the
//! pipeline issues the identical loader call sequence, so simulation replay
//! reproduces loads and unloads exactly.
//!
//! # Example
//!
//! ```ignore
//! use sectionstream::{
//!     ContentRef, SectionCoordinator, SectionDescriptor, StreamingConfig, WorldPoint,
//! };
//!
//! let mut coordinator = SectionCoordinator::new(StreamingConfig::default(), loader)?;
//! let town = coordinator.register_section(
//!     SectionDescriptor::new("town", WorldPoint::new(120.0, 0.0, -80.0), 200.0, 260.0)
//!         .with_priority(2)
//!         .with_content(ContentRef::new("world/town")),
//! );
//!
//! // Host's per-tick update:
//! let report = coordinator.run_tick(&clock, &mut focus_source);
//! tracing::debug!(loaded = report.stats.counts.loaded, "streamed");
//! ```

pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod focus;
pub mod geom;
pub mod loader;
pub mod logging;
pub mod pipeline;
pub mod section;

pub use clock::{SimClock, StepClock, Tick};
pub use command::{Command, CommandAction, CommandReason};
pub use config::{ConfigFile, StreamingConfig};
pub use error::StreamError;
pub use focus::{Focus, FocusId, FocusSample, FocusSource, StaticFocusSource};
pub use geom::{WorldPoint, WorldVec};
pub use loader::{
    ContentBackend, ContentLoader, LoadHandle, LoadPhase, LoaderError, ScriptedLoader,
    TaskPoolLoader,
};
pub use pipeline::{SectionCoordinator, StreamingStats, TickReport};
pub use section::{ContentRef, InstanceId, SectionDescriptor, SectionId, SectionStatus};

/// Library version, taken from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
