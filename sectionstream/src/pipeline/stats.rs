//! Tick-level statistics for telemetry and user feedback.
//!
//! ```text
//! Pipeline Stages ─────► StatsTracker ─────► StreamingStats ─────► Views
//!                        (carried counters)  (point-in-time copy)  (CLI, host UI)
//! ```
//!
//! Almost everything in a snapshot is recomputed from scratch each tick by a
//! read-only pass over the registry. The tracker itself carries only the few
//! values that must survive across ticks: the peak pending-command count, the
//! sticky first-load/first-unload ticks, and the cumulative issue and failure
//! totals.

use serde::{Deserialize, Serialize};

use crate::clock::Tick;
use crate::pipeline::executor::ExecReport;
use crate::section::{SectionRegistry, SectionStatus};

/// Section counts by status at one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub unloaded: usize,
    pub queued_load: usize,
    pub loading: usize,
    pub loaded: usize,
    pub queued_unload: usize,
    pub unloading: usize,
    pub error: usize,
}

impl StatusCounts {
    fn tally(registry: &SectionRegistry) -> Self {
        let mut counts = Self::default();
        for slot in registry.slots() {
            match slot.state.status() {
                SectionStatus::Unloaded => counts.unloaded += 1,
                SectionStatus::QueuedLoad => counts.queued_load += 1,
                SectionStatus::Loading => counts.loading += 1,
                SectionStatus::Loaded => counts.loaded += 1,
                SectionStatus::QueuedUnload => counts.queued_unload += 1,
                SectionStatus::Unloading => counts.unloading += 1,
                SectionStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    /// Total sections counted.
    pub fn total(&self) -> usize {
        self.unloaded
            + self.queued_load
            + self.loading
            + self.loaded
            + self.queued_unload
            + self.unloading
            + self.error
    }
}

/// Point-in-time statistics snapshot, one per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingStats {
    /// Tick this snapshot describes.
    pub tick: Tick,
    /// Sections by status.
    pub counts: StatusCounts,
    /// Commands still queued after the executor drained (deferred work).
    pub pending_commands: usize,
    /// Highest pending-command count ever observed. Monotonic.
    pub peak_pending_commands: usize,
    /// Sections whose cooldown has not yet elapsed.
    pub active_cooldowns: usize,
    /// Sections with a nonzero pin count.
    pub pinned_sections: usize,
    /// Tick of the first load ever issued. `None` until it happens, then
    /// fixed forever.
    pub first_load_tick: Option<Tick>,
    /// Tick of the first unload ever issued. Sticky like `first_load_tick`.
    pub first_unload_tick: Option<Tick>,
    /// Loads handed to the loader since the coordinator started.
    pub total_loads_issued: u64,
    /// Unloads handed to the loader since the coordinator started.
    pub total_unloads_issued: u64,
    /// Synchronous and asynchronous load failures since start.
    pub total_load_failures: u64,
}

impl StreamingStats {
    /// Serialize the snapshot as a JSON object for telemetry consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Recomputes statistics each tick, carrying the few persistent counters.
#[derive(Debug, Default)]
pub struct StatsTracker {
    peak_pending_commands: usize,
    first_load_tick: Option<Tick>,
    first_unload_tick: Option<Tick>,
    total_loads_issued: u64,
    total_unloads_issued: u64,
    total_load_failures: u64,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold this tick's executor results in and produce the snapshot.
    ///
    /// `pending_commands` is the queue length after the executor drained,
    /// which is exactly the deferred backlog carried into the next tick.
    pub fn collect(
        &mut self,
        registry: &SectionRegistry,
        pending_commands: usize,
        now: Tick,
        exec: &ExecReport,
    ) -> StreamingStats {
        self.total_loads_issued += exec.loads_issued as u64;
        self.total_unloads_issued += exec.unloads_issued as u64;
        self.total_load_failures += exec.load_failures as u64;

        if self.first_load_tick.is_none() && exec.loads_issued > 0 {
            self.first_load_tick = Some(now);
        }
        if self.first_unload_tick.is_none() && exec.unloads_issued > 0 {
            self.first_unload_tick = Some(now);
        }
        if pending_commands > self.peak_pending_commands {
            self.peak_pending_commands = pending_commands;
        }

        let mut active_cooldowns = 0;
        let mut pinned_sections = 0;
        for slot in registry.slots() {
            if slot.state.in_cooldown(now) {
                active_cooldowns += 1;
            }
            if slot.state.is_pinned() {
                pinned_sections += 1;
            }
        }

        StreamingStats {
            tick: now,
            counts: StatusCounts::tally(registry),
            pending_commands,
            peak_pending_commands: self.peak_pending_commands,
            active_cooldowns,
            pinned_sections,
            first_load_tick: self.first_load_tick,
            first_unload_tick: self.first_unload_tick,
            total_loads_issued: self.total_loads_issued,
            total_unloads_issued: self.total_unloads_issued,
            total_load_failures: self.total_load_failures,
        }
    }
}
