//! The per-tick streaming pipeline.
//!
//! Five stages run in fixed order once per simulation tick, each owning the
//! section registry exclusively during its turn:
//!
//! ```text
//! FocusTracker → DesireScanner → CommandGuardrail → BudgetedExecutor → StateSynchronizer → StatsTracker
//! ```
//!
//! [`coordinator::SectionCoordinator`] wires the stages together and is the
//! type hosts embed; the individual stages are exported for direct use in
//! tests and tooling that needs to drive them piecemeal.

pub mod coordinator;
pub mod executor;
pub mod guardrail;
pub mod scanner;
pub mod stats;
pub mod sync;

pub use coordinator::{SectionCoordinator, TickReport};
pub use executor::{BudgetedExecutor, ExecReport};
pub use guardrail::{CommandGuardrail, GuardrailReport};
pub use scanner::{DesireScanner, ScanReport};
pub use stats::{StatsTracker, StatusCounts, StreamingStats};
pub use sync::{StateSynchronizer, SyncReport};
