//! Budgeted executor: drains the filtered command queue against the loader.
//!
//! Commands run in deterministic score order (ascending, ties broken by
//! section id). Three budgets bound the work: `max_concurrent_loads` caps
//! sections in Loading status at once, `max_loads_per_tick` and
//! `max_unloads_per_tick` cap issues within one tick. A command that hits a
//! budget is deferred: left in the queue untouched, re-filtered and re-sorted
//! next tick. Commands whose section status no longer matches the queued
//! action are stale and consumed without effect.
//!
//! An unload for a section whose load is still in flight at the loader is
//! also deferred; the unload is only handed to the loader once the recorded
//! loader phase reaches loaded. If that phase is already failed or unloaded
//! there is nothing left to release and the section drops straight back to
//! Unloaded.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Tick;
use crate::command::{Command, CommandAction, CommandQueue};
use crate::config::StreamingConfig;
use crate::loader::{ContentLoader, LoadPhase};
use crate::section::{SectionRegistry, SectionStatus};

/// Counters for one executor drain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecReport {
    /// Load operations handed to the loader this tick.
    pub loads_issued: usize,
    /// Unload operations handed to the loader this tick.
    pub unloads_issued: usize,
    /// Loads that failed synchronously (missing content or loader refusal).
    pub load_failures: usize,
    /// Load commands left queued for the next tick.
    pub deferred_loads: usize,
    /// Unload commands left queued for the next tick.
    pub deferred_unloads: usize,
    /// Commands consumed because their section status had moved on.
    pub dropped_stale: usize,
    /// Unloads completed without a loader call (no handle, or nothing held).
    pub resolved_without_loader: usize,
}

/// Drains commands under the configured budgets.
#[derive(Debug, Default)]
pub struct BudgetedExecutor;

impl BudgetedExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Sort and drain `queue`, issuing work to `loader` under the budgets in
    /// `config`. Deferred commands stay in the queue.
    pub fn execute(
        &self,
        registry: &mut SectionRegistry,
        queue: &mut CommandQueue,
        loader: &mut dyn ContentLoader,
        config: &StreamingConfig,
        now: Tick,
    ) -> ExecReport {
        queue.sort_for_execution();

        let mut report = ExecReport::default();
        // Loads still in flight from earlier ticks count against the
        // concurrency budget from the start.
        let mut active_loads = registry.count_status(SectionStatus::Loading);

        queue.commands_mut().retain(|cmd| {
            let Ok(index) = registry.index_of(cmd.section) else {
                warn!(section = %cmd.section, "Dropping command for unknown section");
                return false;
            };
            match cmd.action {
                CommandAction::Load => execute_load(
                    registry,
                    loader,
                    config,
                    now,
                    cmd,
                    index,
                    &mut active_loads,
                    &mut report,
                ),
                CommandAction::Unload => {
                    execute_unload(registry, loader, config, now, cmd, index, &mut report)
                }
            }
        });

        report
    }
}

/// Returns true when the command must stay queued for the next tick.
#[allow(clippy::too_many_arguments)]
fn execute_load(
    registry: &mut SectionRegistry,
    loader: &mut dyn ContentLoader,
    config: &StreamingConfig,
    now: Tick,
    cmd: &Command,
    index: usize,
    active_loads: &mut usize,
    report: &mut ExecReport,
) -> bool {
    let status = registry.slot(index).state.status();
    if status != SectionStatus::QueuedLoad {
        debug!(
            section = %cmd.section,
            status = status.as_str(),
            "Stale load command dropped"
        );
        report.dropped_stale += 1;
        return false;
    }

    if *active_loads >= config.max_concurrent_loads
        || report.loads_issued >= config.max_loads_per_tick
    {
        report.deferred_loads += 1;
        return true;
    }

    let Some(content) = registry.slot(index).descriptor.content().cloned() else {
        warn!(
            section = %cmd.section,
            name = registry.slot(index).descriptor.name(),
            "Load failed: section has no content reference"
        );
        registry.set_status(index, SectionStatus::Error);
        registry
            .slot_mut(index)
            .state
            .start_cooldown(now, config.cooldown_ticks);
        report.load_failures += 1;
        return false;
    };

    match loader.begin_load(&content) {
        Ok(handle) => {
            debug!(
                section = %cmd.section,
                content = content.as_str(),
                handle = %handle,
                reason = cmd.reason.as_str(),
                "Load issued"
            );
            registry.slot_mut(index).state.set_handle(handle);
            registry.set_status(index, SectionStatus::Loading);
            *active_loads += 1;
            report.loads_issued += 1;
        }
        Err(e) => {
            warn!(section = %cmd.section, error = %e, "Load refused by loader");
            registry.set_status(index, SectionStatus::Error);
            registry
                .slot_mut(index)
                .state
                .start_cooldown(now, config.cooldown_ticks);
            report.load_failures += 1;
        }
    }
    false
}

/// Returns true when the command must stay queued for the next tick.
fn execute_unload(
    registry: &mut SectionRegistry,
    loader: &mut dyn ContentLoader,
    config: &StreamingConfig,
    now: Tick,
    cmd: &Command,
    index: usize,
    report: &mut ExecReport,
) -> bool {
    let status = registry.slot(index).state.status();
    if status != SectionStatus::QueuedUnload {
        debug!(
            section = %cmd.section,
            status = status.as_str(),
            "Stale unload command dropped"
        );
        report.dropped_stale += 1;
        return false;
    }

    if report.unloads_issued >= config.max_unloads_per_tick {
        report.deferred_unloads += 1;
        return true;
    }

    let Some(handle) = registry.slot(index).state.handle() else {
        // The load was queued but never handed to the loader.
        debug!(section = %cmd.section, "Unload with no outstanding handle");
        registry.set_status(index, SectionStatus::Unloaded);
        report.resolved_without_loader += 1;
        return false;
    };

    match registry.slot(index).state.loader_phase() {
        Some(LoadPhase::Loading) => {
            // The loader is still working on the load. Wait for it to reach
            // loaded before asking for the release.
            report.deferred_unloads += 1;
            true
        }
        Some(LoadPhase::Failed) | Some(LoadPhase::Unloaded) => {
            debug!(
                section = %cmd.section,
                handle = %handle,
                "Nothing held by loader, unloading locally"
            );
            registry.slot_mut(index).state.clear_handle();
            registry.set_status(index, SectionStatus::Unloaded);
            registry
                .slot_mut(index)
                .state
                .start_cooldown(now, config.cooldown_ticks);
            report.resolved_without_loader += 1;
            false
        }
        Some(LoadPhase::Loaded) | Some(LoadPhase::Unloading) | None => {
            debug!(
                section = %cmd.section,
                handle = %handle,
                reason = cmd.reason.as_str(),
                "Unload issued"
            );
            loader.begin_unload(handle);
            registry.set_status(index, SectionStatus::Unloading);
            report.unloads_issued += 1;
            false
        }
    }
}
