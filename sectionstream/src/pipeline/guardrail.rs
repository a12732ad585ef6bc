//! Command guardrail: per-tick dedupe plus cooldown and pin enforcement.
//!
//! Runs between the scanner and the executor and filters the queue in place.
//! The first command to claim a section wins the tick; later commands for the
//! same section are dropped, with a warning when the actions disagree. Loads
//! are vetoed while the section's cooldown runs; unloads are vetoed while the
//! section is pinned. Every veto also restores the section's status to the
//! safe value its dropped command had moved it away from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Tick;
use crate::command::{CommandAction, CommandQueue};
use crate::section::{SectionId, SectionRegistry, SectionStatus};

/// What one filter pass kept and dropped, by cause.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailReport {
    pub kept: usize,
    pub dropped_duplicates: usize,
    pub dropped_conflicts: usize,
    pub dropped_cooldown: usize,
    pub dropped_pinned: usize,
    pub noop_unloads: usize,
}

impl GuardrailReport {
    pub fn dropped_total(&self) -> usize {
        self.dropped_duplicates
            + self.dropped_conflicts
            + self.dropped_cooldown
            + self.dropped_pinned
            + self.noop_unloads
    }
}

/// Filters the command queue before execution.
#[derive(Debug, Default)]
pub struct CommandGuardrail;

impl CommandGuardrail {
    pub fn new() -> Self {
        Self
    }

    /// Filter `queue` in place against the registry at tick `now`.
    pub fn filter(
        &self,
        registry: &mut SectionRegistry,
        queue: &mut CommandQueue,
        now: Tick,
    ) -> GuardrailReport {
        let mut report = GuardrailReport::default();
        let mut claims: HashMap<SectionId, CommandAction> = HashMap::new();

        queue.commands_mut().retain(|cmd| {
            let Ok(index) = registry.index_of(cmd.section) else {
                warn!(section = %cmd.section, "Dropping command for unknown section");
                return false;
            };

            if let Some(&winner) = claims.get(&cmd.section) {
                if winner != cmd.action {
                    warn!(
                        section = %cmd.section,
                        kept = winner.as_str(),
                        dropped = cmd.action.as_str(),
                        "Conflicting commands for section, first wins"
                    );
                    // Put the status back in line with the surviving command.
                    let restored = match winner {
                        CommandAction::Load => SectionStatus::QueuedLoad,
                        CommandAction::Unload => SectionStatus::QueuedUnload,
                    };
                    registry.set_status(index, restored);
                    report.dropped_conflicts += 1;
                } else {
                    debug!(
                        section = %cmd.section,
                        action = cmd.action.as_str(),
                        "Duplicate command dropped"
                    );
                    report.dropped_duplicates += 1;
                }
                return false;
            }

            match cmd.action {
                CommandAction::Load => {
                    if registry.slot(index).state.in_cooldown(now) {
                        debug!(
                            section = %cmd.section,
                            until = %registry.slot(index).state.cooldown_until(),
                            "Load suppressed by cooldown"
                        );
                        registry.set_status(index, SectionStatus::Unloaded);
                        report.dropped_cooldown += 1;
                        return false;
                    }
                }
                CommandAction::Unload => {
                    let state = &registry.slot(index).state;
                    if state.status() == SectionStatus::Unloaded {
                        debug!(section = %cmd.section, "Unload of unloaded section, no-op");
                        report.noop_unloads += 1;
                        return false;
                    }
                    if state.is_pinned() {
                        debug!(
                            section = %cmd.section,
                            pins = state.pin_count(),
                            "Unload suppressed by pin"
                        );
                        registry.set_status(index, SectionStatus::Loaded);
                        report.dropped_pinned += 1;
                        return false;
                    }
                }
            }

            claims.insert(cmd.section, cmd.action);
            report.kept += 1;
            true
        });

        report
    }

    /// Debug escape hatch: clear every cooldown and un-error stuck sections.
    ///
    /// Intended for tooling and tests; applied between ticks, never from
    /// inside the pipeline.
    pub fn clear_cooldowns(&self, registry: &mut SectionRegistry, now: Tick) -> (usize, usize) {
        let (cooldowns, errors) = registry.clear_cooldowns(now);
        info!(cooldowns, errors, "Cleared cooldowns");
        (cooldowns, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, CommandReason};
    use crate::geom::WorldPoint;
    use crate::section::{InstanceId, SectionDescriptor};

    fn make_registry_with_section() -> (SectionRegistry, SectionId) {
        let mut registry = SectionRegistry::new(InstanceId::next());
        let id = registry.register(SectionDescriptor::new(
            "s",
            WorldPoint::ORIGIN,
            10.0,
            15.0,
        ));
        (registry, id)
    }

    fn filter(registry: &mut SectionRegistry, queue: &mut CommandQueue) -> GuardrailReport {
        CommandGuardrail::new().filter(registry, queue, Tick(10))
    }

    #[test]
    fn test_first_command_wins_conflict() {
        let (mut registry, id) = make_registry_with_section();
        registry.set_status(0, SectionStatus::QueuedUnload);
        let mut queue = CommandQueue::new();
        queue.push(Command::load(id, CommandReason::Manual, 0.0));
        queue.push(Command::unload(id, CommandReason::ExitRange, 1.0));

        let report = filter(&mut registry, &mut queue);

        assert_eq!(report.kept, 1);
        assert_eq!(report.dropped_conflicts, 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().next().unwrap().action, CommandAction::Load);
        // Status realigned with the surviving load.
        assert_eq!(registry.status(id).unwrap(), SectionStatus::QueuedLoad);
    }

    #[test]
    fn test_conflict_with_unload_first_restores_queued_unload() {
        let (mut registry, id) = make_registry_with_section();
        registry.set_status(0, SectionStatus::QueuedUnload);
        let mut queue = CommandQueue::new();
        queue.push(Command::unload(id, CommandReason::ExitRange, 0.0));
        queue.push(Command::load(id, CommandReason::Manual, 1.0));

        let report = filter(&mut registry, &mut queue);

        assert_eq!(report.dropped_conflicts, 1);
        assert_eq!(queue.iter().next().unwrap().action, CommandAction::Unload);
        assert_eq!(registry.status(id).unwrap(), SectionStatus::QueuedUnload);
    }

    #[test]
    fn test_duplicate_same_action_dropped_quietly() {
        let (mut registry, id) = make_registry_with_section();
        registry.set_status(0, SectionStatus::QueuedLoad);
        let mut queue = CommandQueue::new();
        queue.push(Command::load(id, CommandReason::EnterRange, 0.0));
        queue.push(Command::load(id, CommandReason::Manual, 1.0));

        let report = filter(&mut registry, &mut queue);

        assert_eq!(report.dropped_duplicates, 1);
        assert_eq!(report.dropped_conflicts, 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cooldown_drops_load_and_resets_status() {
        let (mut registry, id) = make_registry_with_section();
        registry.slot_mut(0).state.start_cooldown(Tick(5), 100);
        registry.set_status(0, SectionStatus::QueuedLoad);
        let mut queue = CommandQueue::new();
        queue.push(Command::load(id, CommandReason::EnterRange, 0.0));

        let report = filter(&mut registry, &mut queue);

        assert_eq!(report.dropped_cooldown, 1);
        assert!(queue.is_empty());
        assert_eq!(registry.status(id).unwrap(), SectionStatus::Unloaded);
    }

    #[test]
    fn test_expired_cooldown_lets_load_through() {
        let (mut registry, id) = make_registry_with_section();
        // Cooldown ends exactly at tick 10, the filter tick.
        registry.slot_mut(0).state.start_cooldown(Tick(5), 5);
        registry.set_status(0, SectionStatus::QueuedLoad);
        let mut queue = CommandQueue::new();
        queue.push(Command::load(id, CommandReason::EnterRange, 0.0));

        let report = filter(&mut registry, &mut queue);

        assert_eq!(report.kept, 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_pin_drops_unload_and_restores_loaded() {
        let (mut registry, id) = make_registry_with_section();
        registry.slot_mut(0).state.pin();
        registry.set_status(0, SectionStatus::QueuedUnload);
        let mut queue = CommandQueue::new();
        queue.push(Command::unload(id, CommandReason::ExitRange, 0.0));

        let report = filter(&mut registry, &mut queue);

        assert_eq!(report.dropped_pinned, 1);
        assert!(queue.is_empty());
        assert_eq!(registry.status(id).unwrap(), SectionStatus::Loaded);
    }

    #[test]
    fn test_unload_of_unloaded_section_is_noop() {
        let (mut registry, id) = make_registry_with_section();
        let mut queue = CommandQueue::new();
        queue.push(Command::unload(id, CommandReason::Manual, 0.0));

        let report = filter(&mut registry, &mut queue);

        assert_eq!(report.noop_unloads, 1);
        assert!(queue.is_empty());
        assert_eq!(registry.status(id).unwrap(), SectionStatus::Unloaded);
    }

    #[test]
    fn test_pinned_but_unloaded_section_takes_noop_path() {
        let (mut registry, id) = make_registry_with_section();
        registry.slot_mut(0).state.pin();
        let mut queue = CommandQueue::new();
        queue.push(Command::unload(id, CommandReason::Manual, 0.0));

        let report = filter(&mut registry, &mut queue);

        // No-op beats the pin check; the section must not jump to Loaded.
        assert_eq!(report.noop_unloads, 1);
        assert_eq!(report.dropped_pinned, 0);
        assert_eq!(registry.status(id).unwrap(), SectionStatus::Unloaded);
    }

    #[test]
    fn test_independent_sections_all_kept() {
        let mut registry = SectionRegistry::new(InstanceId::next());
        let a = registry.register(SectionDescriptor::new("a", WorldPoint::ORIGIN, 10.0, 15.0));
        let b = registry.register(SectionDescriptor::new("b", WorldPoint::ORIGIN, 10.0, 15.0));
        registry.set_status(0, SectionStatus::QueuedLoad);
        registry.set_status(1, SectionStatus::QueuedLoad);
        let mut queue = CommandQueue::new();
        queue.push(Command::load(a, CommandReason::EnterRange, 0.0));
        queue.push(Command::load(b, CommandReason::EnterRange, 1.0));

        let report = filter(&mut registry, &mut queue);

        assert_eq!(report.kept, 2);
        assert_eq!(report.dropped_total(), 0);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_clear_cooldowns_unsticks_errors() {
        let (mut registry, id) = make_registry_with_section();
        registry.slot_mut(0).state.start_cooldown(Tick(0), 1000);
        registry.set_status(0, SectionStatus::Error);

        let (cooldowns, errors) =
            CommandGuardrail::new().clear_cooldowns(&mut registry, Tick(10));

        assert_eq!((cooldowns, errors), (1, 1));
        assert_eq!(registry.status(id).unwrap(), SectionStatus::Unloaded);
        assert!(!registry.state(id).unwrap().in_cooldown(Tick(10)));
    }
}
