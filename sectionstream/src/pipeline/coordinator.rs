//! The coordinator that owns the registry and runs the per-tick pipeline.
//!
//! `SectionCoordinator` is the single entry point hosts embed: register
//! sections once at world load, then call [`SectionCoordinator::run_tick`]
//! every simulation tick. Each tick runs the five stages in fixed order
//! against the registry the coordinator owns exclusively:
//!
//! ```text
//! FocusTracker ─► DesireScanner ─► CommandGuardrail ─► BudgetedExecutor ─► StateSynchronizer ─► StatsTracker
//!  (velocity)      (hysteresis,      (dedupe, cooldown,   (budgets, loader     (poll loader,        (snapshot)
//!                   scoring)          pins)                calls)               correct status)
//! ```
//!
//! No stage re-enters an earlier one within a tick, and nothing here blocks:
//! loader calls are fire-and-forget, observed later by polling. Outside the
//! tick the coordinator exposes status reads, reference-counted pinning,
//! manual load/unload requests, a debug cooldown clear, and the statistics
//! snapshot.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::clock::{SimClock, Tick};
use crate::command::{Command, CommandQueue, CommandReason, MANUAL_SCORE};
use crate::config::{ConfigError, StreamingConfig};
use crate::error::StreamError;
use crate::focus::{FocusSample, FocusSource, FocusTracker};
use crate::loader::ContentLoader;
use crate::pipeline::executor::{BudgetedExecutor, ExecReport};
use crate::pipeline::guardrail::{CommandGuardrail, GuardrailReport};
use crate::pipeline::scanner::{DesireScanner, ScanReport};
use crate::pipeline::stats::{StatsTracker, StreamingStats};
use crate::pipeline::sync::{StateSynchronizer, SyncReport};
use crate::section::{
    InstanceId, SectionDescriptor, SectionId, SectionRegistry, SectionStatus,
};

/// Everything one tick did, stage by stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: Tick,
    /// Foci supplied this tick.
    pub foci: usize,
    pub scan: ScanReport,
    pub guardrail: GuardrailReport,
    pub exec: ExecReport,
    pub sync: SyncReport,
    pub stats: StreamingStats,
}

/// Owns section state and drives the streaming pipeline once per tick.
pub struct SectionCoordinator<L: ContentLoader> {
    config: StreamingConfig,
    registry: SectionRegistry,
    tracker: FocusTracker,
    scanner: DesireScanner,
    guardrail: CommandGuardrail,
    executor: BudgetedExecutor,
    synchronizer: StateSynchronizer,
    stats: StatsTracker,
    queue: CommandQueue,
    loader: L,
    /// Tick of the most recent `advance`, for out-of-band operations.
    current_tick: Tick,
    last_stats: Option<StreamingStats>,
}

impl<L: ContentLoader> SectionCoordinator<L> {
    /// Create a coordinator with its own fresh instance id.
    ///
    /// Rejects configs with zero budgets; those would leave the scanner
    /// queuing intents the executor may never drain.
    pub fn new(config: StreamingConfig, loader: L) -> Result<Self, ConfigError> {
        config.validate()?;
        let instance = InstanceId::next();
        info!(
            instance = %instance,
            max_concurrent_loads = config.max_concurrent_loads,
            max_loads_per_tick = config.max_loads_per_tick,
            max_unloads_per_tick = config.max_unloads_per_tick,
            cooldown_ticks = config.cooldown_ticks,
            "Section coordinator created"
        );
        Ok(Self {
            config,
            registry: SectionRegistry::new(instance),
            tracker: FocusTracker::new(),
            scanner: DesireScanner::new(),
            guardrail: CommandGuardrail::new(),
            executor: BudgetedExecutor::new(),
            synchronizer: StateSynchronizer::new(),
            stats: StatsTracker::new(),
            queue: CommandQueue::new(),
            loader,
            current_tick: Tick::ZERO,
            last_stats: None,
        })
    }

    /// Register a section. Ids are only valid on this coordinator instance.
    pub fn register_section(&mut self, descriptor: SectionDescriptor) -> SectionId {
        self.registry.register(descriptor)
    }

    /// Run one full tick: sample foci from `source`, then run the five
    /// stages in order.
    pub fn run_tick(
        &mut self,
        clock: &dyn SimClock,
        source: &mut dyn FocusSource,
    ) -> TickReport {
        let now = clock.now();
        let dt = clock.delta_seconds();
        let samples = source.current_foci();
        self.advance(now, dt, &samples)
    }

    /// Run one tick from explicit inputs.
    ///
    /// This is the deterministic entry point: identical `now`, `dt`, and
    /// samples produce the identical loader call sequence, which is what
    /// simulation replay relies on.
    pub fn advance(&mut self, now: Tick, dt: f32, samples: &[FocusSample]) -> TickReport {
        self.current_tick = now;

        let foci = self.tracker.refresh(samples, dt);
        let scan = self
            .scanner
            .scan(&mut self.registry, &foci, now, &mut self.queue);
        let guardrail = self
            .guardrail
            .filter(&mut self.registry, &mut self.queue, now);
        let exec = self.executor.execute(
            &mut self.registry,
            &mut self.queue,
            &mut self.loader,
            &self.config,
            now,
        );
        let sync = self.synchronizer.reconcile(
            &mut self.registry,
            &mut self.loader,
            &self.config,
            now,
        );
        let stats = self
            .stats
            .collect(&self.registry, self.queue.len(), now, &exec);

        trace!(
            tick = %now,
            foci = foci.len(),
            loads = exec.loads_issued,
            unloads = exec.unloads_issued,
            pending = stats.pending_commands,
            loaded = stats.counts.loaded,
            "Tick complete"
        );

        self.last_stats = Some(stats.clone());
        TickReport {
            tick: now,
            foci: foci.len(),
            scan,
            guardrail,
            exec,
            sync,
            stats,
        }
    }

    /// Current status of a section.
    pub fn status(&self, id: SectionId) -> Result<SectionStatus, StreamError> {
        self.registry.status(id)
    }

    /// Pin a section, forbidding unloads while the count stays above zero.
    /// Returns the new pin count.
    pub fn pin(&mut self, id: SectionId) -> Result<u32, StreamError> {
        let index = self.registry.index_of(id)?;
        let count = self.registry.slot_mut(index).state.pin();
        debug!(section = %id, pins = count, "Section pinned");
        Ok(count)
    }

    /// Release one pin. Returns the new pin count, or
    /// [`StreamError::PinUnderflow`] when the section was not pinned.
    pub fn unpin(&mut self, id: SectionId) -> Result<u32, StreamError> {
        let index = self.registry.index_of(id)?;
        let Some(count) = self.registry.slot_mut(index).state.unpin() else {
            return Err(StreamError::PinUnderflow(id));
        };
        debug!(section = %id, pins = count, "Section unpinned");
        Ok(count)
    }

    /// Queue a manual load. Works on any section, and is the only way to
    /// load one flagged manual. Returns whether a command was queued; a
    /// section already loaded or already in flight yields `Ok(false)`.
    ///
    /// The request is scored far ahead of scanner work but still passes the
    /// guardrail, so cooldowns apply to it like to any other load.
    pub fn request_manual_load(&mut self, id: SectionId) -> Result<bool, StreamError> {
        let index = self.registry.index_of(id)?;

        if self.registry.slot(index).state.status() == SectionStatus::Error {
            debug!(section = %id, "Manual load clearing error status");
            self.registry.set_status(index, SectionStatus::Unloaded);
        }
        if self.registry.slot(index).state.status() != SectionStatus::Unloaded {
            return Ok(false);
        }

        debug!(section = %id, "Manual load requested");
        self.queue
            .push(Command::load(id, CommandReason::Manual, MANUAL_SCORE));
        self.registry.set_status(index, SectionStatus::QueuedLoad);
        Ok(true)
    }

    /// Queue a manual unload. Works on any section, and is the only way to
    /// unload one flagged manual. Returns whether a command was queued.
    pub fn request_manual_unload(&mut self, id: SectionId) -> Result<bool, StreamError> {
        let index = self.registry.index_of(id)?;

        if !self.registry.slot(index).state.status().unload_eligible() {
            return Ok(false);
        }

        debug!(section = %id, "Manual unload requested");
        self.queue
            .push(Command::unload(id, CommandReason::Manual, MANUAL_SCORE));
        self.registry.set_status(index, SectionStatus::QueuedUnload);
        Ok(true)
    }

    /// Debug escape hatch: clear every cooldown and un-error stuck sections.
    /// Returns `(cooldowns_cleared, errors_cleared)`.
    pub fn clear_cooldowns(&mut self) -> (usize, usize) {
        self.guardrail
            .clear_cooldowns(&mut self.registry, self.current_tick)
    }

    /// Statistics from the most recent tick, if one has run.
    pub fn statistics(&self) -> Option<&StreamingStats> {
        self.last_stats.as_ref()
    }

    /// Commands deferred into the next tick.
    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// The registry, for read access to descriptors, states, and ids.
    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    /// Instance id embedded in every section id this coordinator issues.
    pub fn instance(&self) -> InstanceId {
        self.registry.instance()
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Mutable loader access, mainly for scripted loaders in tests and the
    /// simulation CLI.
    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }
}
