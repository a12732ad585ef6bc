//! State synchronizer: reconciles registry status against loader truth.
//!
//! The executor advances status optimistically the moment it hands work to
//! the loader. This stage is the only one allowed to override that optimism:
//! each tick it polls every outstanding handle and maps the loader's reported
//! phase back onto the section. Completions land here (Loading becomes
//! Loaded, Unloading becomes Unloaded), failures land here (Error plus
//! cooldown), and a handle the loader no longer recognizes force-resets the
//! section to Unloaded.
//!
//! One status is exempt from overriding: a section in QueuedUnload carries a
//! committed unload intent, so the poll only refreshes the cached loader
//! phase and leaves the status for the executor to act on next drain.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Tick;
use crate::config::StreamingConfig;
use crate::loader::{ContentLoader, LoadPhase};
use crate::section::{SectionRegistry, SectionStatus};

/// Counters for one reconcile pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Handles polled this tick.
    pub polled: usize,
    /// Loads observed complete (section reached Loaded).
    pub load_completions: usize,
    /// Unloads observed complete (section reached Unloaded).
    pub unload_completions: usize,
    /// Loader-reported failures (section moved to Error).
    pub failures: usize,
    /// Statuses rewritten because they disagreed with the loader phase.
    pub corrections: usize,
    /// Sections force-reset to Unloaded over a missing or unknown handle.
    pub stale_resets: usize,
}

/// Polls the loader and corrects optimistic statuses.
#[derive(Debug, Default)]
pub struct StateSynchronizer;

impl StateSynchronizer {
    pub fn new() -> Self {
        Self
    }

    /// Poll every outstanding handle and fold the results into the registry.
    pub fn reconcile(
        &self,
        registry: &mut SectionRegistry,
        loader: &mut dyn ContentLoader,
        config: &StreamingConfig,
        now: Tick,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        for index in 0..registry.len() {
            let status = registry.slot(index).state.status();

            let Some(handle) = registry.slot(index).state.handle() else {
                if status.is_in_flight() || status.is_resident() {
                    let id = registry.id_at(index);
                    warn!(
                        section = %id,
                        status = status.as_str(),
                        "Section has no loader handle, resetting to unloaded"
                    );
                    registry.set_status(index, SectionStatus::Unloaded);
                    report.stale_resets += 1;
                }
                continue;
            };

            let Some(phase) = loader.poll_status(handle) else {
                let id = registry.id_at(index);
                warn!(
                    section = %id,
                    handle = %handle,
                    status = status.as_str(),
                    "Loader no longer recognizes handle, resetting to unloaded"
                );
                registry.slot_mut(index).state.clear_handle();
                registry.set_status(index, SectionStatus::Unloaded);
                report.stale_resets += 1;
                continue;
            };
            report.polled += 1;
            registry.slot_mut(index).state.set_loader_phase(phase);

            if status == SectionStatus::QueuedUnload {
                // Committed intent stands; the executor reads the phase.
                continue;
            }

            match phase {
                LoadPhase::Loading => {
                    if status != SectionStatus::Loading {
                        registry.set_status(index, SectionStatus::Loading);
                        report.corrections += 1;
                    }
                }
                LoadPhase::Loaded => {
                    if status == SectionStatus::Loading {
                        debug!(section = %registry.id_at(index), "Load complete");
                        registry.set_status(index, SectionStatus::Loaded);
                        report.load_completions += 1;
                    } else if status != SectionStatus::Loaded {
                        registry.set_status(index, SectionStatus::Loaded);
                        report.corrections += 1;
                    }
                }
                LoadPhase::Unloading => {
                    if status != SectionStatus::Unloading {
                        registry.set_status(index, SectionStatus::Unloading);
                        report.corrections += 1;
                    }
                }
                LoadPhase::Unloaded => {
                    debug!(section = %registry.id_at(index), "Unload complete");
                    registry.slot_mut(index).state.clear_handle();
                    registry.set_status(index, SectionStatus::Unloaded);
                    registry
                        .slot_mut(index)
                        .state
                        .start_cooldown(now, config.cooldown_ticks);
                    report.unload_completions += 1;
                }
                LoadPhase::Failed => {
                    warn!(
                        section = %registry.id_at(index),
                        handle = %handle,
                        status = status.as_str(),
                        "Loader reported failure"
                    );
                    registry.slot_mut(index).state.clear_handle();
                    registry.set_status(index, SectionStatus::Error);
                    registry
                        .slot_mut(index)
                        .state
                        .start_cooldown(now, config.cooldown_ticks);
                    report.failures += 1;
                }
            }
        }

        report
    }
}
