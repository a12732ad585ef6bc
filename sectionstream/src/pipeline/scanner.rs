//! Desire scanning: hysteresis evaluation and intent scoring.
//!
//! For every automatic section the scanner evaluates all foci under the
//! two-threshold hysteresis rule and emits scored load/unload intents into
//! the command queue, optimistically advancing the section to the matching
//! queued status. The guardrail downstream is the authority that may still
//! veto an intent (cooldown, pins); the scanner deliberately stays naive
//! about those.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::clock::Tick;
use crate::command::{Command, CommandQueue, CommandReason};
use crate::focus::{Focus, MIN_RADIUS_SCALE};
use crate::section::{SectionDescriptor, SectionRegistry, SectionStatus, MIN_HYSTERESIS_BAND};

/// Weight of descriptor priority when scoring loads.
pub const LOAD_PRIORITY_WEIGHT: f32 = 10.0;

/// Weight of the focus-heading alignment bonus when scoring loads. Rewards
/// sections a fast-moving focus is heading toward.
pub const VELOCITY_BIAS_WEIGHT: f32 = 25.0;

/// Weight of descriptor priority when scoring unloads. Priority here delays
/// eviction of important sections instead of accelerating their load.
pub const UNLOAD_PRIORITY_WEIGHT: f32 = 5.0;

/// What one scan pass did, for logging and telemetry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub sections_scanned: usize,
    pub load_intents: usize,
    pub unload_intents: usize,
    pub error_resets: usize,
}

/// Outcome of evaluating one section against every focus.
#[derive(Debug, Clone, Copy)]
struct Evaluation {
    desired: bool,
    within_exit: bool,
    best_distance: f32,
    velocity_bias: f32,
}

/// Per-tick proximity scan over the registry.
#[derive(Debug, Default)]
pub struct DesireScanner;

impl DesireScanner {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every automatic section and queue scored intents.
    pub fn scan(
        &self,
        registry: &mut SectionRegistry,
        foci: &[Focus],
        now: Tick,
        queue: &mut CommandQueue,
    ) -> ScanReport {
        let mut report = ScanReport::default();

        for index in 0..registry.len() {
            let (eval, load_score, unload_score) = {
                let slot = registry.slot(index);
                if slot.descriptor.is_manual() {
                    continue;
                }
                let eval = evaluate(&slot.descriptor, foci);
                let priority = slot.descriptor.priority() as f32;
                let cost = slot.descriptor.estimated_cost();
                let load_score = eval.best_distance
                    - priority * LOAD_PRIORITY_WEIGHT
                    - eval.velocity_bias * VELOCITY_BIAS_WEIGHT
                    + cost;
                let unload_score = eval.best_distance + priority * UNLOAD_PRIORITY_WEIGHT + cost;
                (eval, load_score, unload_score)
            };
            report.sections_scanned += 1;

            let id = registry.id_at(index);
            if eval.within_exit {
                registry.slot_mut(index).state.mark_seen(now);
            }

            let mut status = registry.slot(index).state.status();
            if eval.desired && status == SectionStatus::Error {
                // Desire re-trigger gives an errored section another chance.
                debug!(section = %id, "Section desired again, clearing error");
                registry.set_status(index, SectionStatus::Unloaded);
                status = SectionStatus::Unloaded;
                report.error_resets += 1;
            }

            if eval.desired && status == SectionStatus::Unloaded {
                queue.push(Command::load(id, CommandReason::EnterRange, load_score));
                registry.set_status(index, SectionStatus::QueuedLoad);
                report.load_intents += 1;
                trace!(
                    section = %id,
                    distance = eval.best_distance,
                    score = load_score,
                    "Queued load intent"
                );
            } else if !eval.desired && !eval.within_exit && status.unload_eligible() {
                queue.push(Command::unload(id, CommandReason::ExitRange, unload_score));
                registry.set_status(index, SectionStatus::QueuedUnload);
                report.unload_intents += 1;
                trace!(
                    section = %id,
                    distance = eval.best_distance,
                    score = unload_score,
                    "Queued unload intent"
                );
            }
        }

        report
    }
}

/// Evaluate `descriptor` against every focus, OR-ing desire across foci.
fn evaluate(descriptor: &SectionDescriptor, foci: &[Focus]) -> Evaluation {
    let center = descriptor.center();
    let mut desired = false;
    let mut within_exit = false;
    let mut best_distance = f32::INFINITY;
    let mut velocity_bias: Option<f32> = None;

    for focus in foci {
        let scale = focus.radius_scale.max(MIN_RADIUS_SCALE);
        let enter = descriptor.enter_radius() * scale + focus.load_radius_offset;
        let exit = (descriptor.exit_radius() * scale + focus.unload_radius_offset)
            .max(enter + MIN_HYSTERESIS_BAND);
        let distance = focus.position.distance_to(center);

        best_distance = best_distance.min(distance);
        desired |= distance <= enter;
        within_exit |= distance <= exit;

        // Alignment between focus heading and direction to the section.
        // Undefined for stationary foci and for a focus sitting on the
        // section center.
        if let Some(heading) = focus.heading() {
            if let Some(direction) = focus.position.vector_to(center).normalized() {
                let alignment = heading.dot(direction);
                velocity_bias = Some(velocity_bias.map_or(alignment, |b| b.max(alignment)));
            }
        }
    }

    Evaluation {
        desired,
        within_exit,
        best_distance,
        velocity_bias: velocity_bias.unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{WorldPoint, WorldVec};
    use crate::section::InstanceId;

    fn make_registry() -> SectionRegistry {
        SectionRegistry::new(InstanceId::next())
    }

    fn make_section(x: f32) -> SectionDescriptor {
        SectionDescriptor::new("s", WorldPoint::new(x, 0.0, 0.0), 10.0, 15.0)
    }

    fn focus_at(x: f32) -> Focus {
        Focus::stationary(WorldPoint::new(x, 0.0, 0.0))
    }

    fn scan(registry: &mut SectionRegistry, foci: &[Focus], queue: &mut CommandQueue) -> ScanReport {
        DesireScanner::new().scan(registry, foci, Tick(1), queue)
    }

    #[test]
    fn test_load_queued_inside_enter_radius() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        let mut queue = CommandQueue::new();

        let report = scan(&mut registry, &[focus_at(9.0)], &mut queue);

        assert_eq!(report.load_intents, 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(registry.status(id).unwrap(), SectionStatus::QueuedLoad);
        let cmd = queue.iter().next().unwrap();
        assert_eq!(cmd.section, id);
        assert_eq!(cmd.reason, CommandReason::EnterRange);
    }

    #[test]
    fn test_no_action_inside_hysteresis_band() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        registry.set_status(0, SectionStatus::Loaded);
        let mut queue = CommandQueue::new();

        // Distance 12 sits between enter (10) and exit (15).
        let report = scan(&mut registry, &[focus_at(12.0)], &mut queue);

        assert_eq!(report.load_intents + report.unload_intents, 0);
        assert!(queue.is_empty());
        assert_eq!(registry.status(id).unwrap(), SectionStatus::Loaded);
    }

    #[test]
    fn test_unload_queued_outside_exit_radius() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        registry.set_status(0, SectionStatus::Loaded);
        let mut queue = CommandQueue::new();

        let report = scan(&mut registry, &[focus_at(20.0)], &mut queue);

        assert_eq!(report.unload_intents, 1);
        assert_eq!(registry.status(id).unwrap(), SectionStatus::QueuedUnload);
        assert_eq!(
            queue.iter().next().unwrap().reason,
            CommandReason::ExitRange
        );
    }

    #[test]
    fn test_desire_is_or_across_foci() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        let mut queue = CommandQueue::new();

        scan(&mut registry, &[focus_at(50.0), focus_at(5.0)], &mut queue);
        assert_eq!(registry.status(id).unwrap(), SectionStatus::QueuedLoad);
    }

    #[test]
    fn test_section_kept_while_any_focus_within_exit() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        registry.set_status(0, SectionStatus::Loaded);
        let mut queue = CommandQueue::new();

        // One focus far away, one still inside the exit radius.
        scan(&mut registry, &[focus_at(100.0), focus_at(14.0)], &mut queue);
        assert!(queue.is_empty());
        assert_eq!(registry.status(id).unwrap(), SectionStatus::Loaded);
    }

    #[test]
    fn test_empty_focus_list_unloads_loaded_sections() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        registry.set_status(0, SectionStatus::Loaded);
        let mut queue = CommandQueue::new();

        let report = scan(&mut registry, &[], &mut queue);
        assert_eq!(report.unload_intents, 1);
        assert_eq!(registry.status(id).unwrap(), SectionStatus::QueuedUnload);
    }

    #[test]
    fn test_manual_sections_are_skipped() {
        let mut registry = make_registry();
        let id = registry.register(
            SectionDescriptor::new("m", WorldPoint::ORIGIN, 10.0, 15.0).manual(),
        );
        let mut queue = CommandQueue::new();

        let report = scan(&mut registry, &[focus_at(1.0)], &mut queue);
        assert_eq!(report.sections_scanned, 0);
        assert!(queue.is_empty());
        assert_eq!(registry.status(id).unwrap(), SectionStatus::Unloaded);
    }

    #[test]
    fn test_error_cleared_on_desire_retrigger() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        registry.set_status(0, SectionStatus::Error);
        let mut queue = CommandQueue::new();

        let report = scan(&mut registry, &[focus_at(5.0)], &mut queue);
        assert_eq!(report.error_resets, 1);
        assert_eq!(report.load_intents, 1);
        assert_eq!(registry.status(id).unwrap(), SectionStatus::QueuedLoad);
    }

    #[test]
    fn test_error_kept_when_not_desired() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        registry.set_status(0, SectionStatus::Error);
        let mut queue = CommandQueue::new();

        scan(&mut registry, &[focus_at(50.0)], &mut queue);
        assert_eq!(registry.status(id).unwrap(), SectionStatus::Error);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_no_duplicate_intent_while_queued() {
        let mut registry = make_registry();
        registry.register(make_section(0.0));
        let mut queue = CommandQueue::new();

        scan(&mut registry, &[focus_at(5.0)], &mut queue);
        let report = scan(&mut registry, &[focus_at(5.0)], &mut queue);

        assert_eq!(report.load_intents, 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_no_duplicate_unload_while_queued() {
        let mut registry = make_registry();
        registry.register(make_section(0.0));
        registry.set_status(0, SectionStatus::Loaded);
        let mut queue = CommandQueue::new();

        scan(&mut registry, &[focus_at(20.0)], &mut queue);
        let report = scan(&mut registry, &[focus_at(20.0)], &mut queue);

        assert_eq!(report.unload_intents, 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cooldown_section_still_scanned_optimistically() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        registry.slot_mut(0).state.start_cooldown(Tick(0), 100);
        let mut queue = CommandQueue::new();

        scan(&mut registry, &[focus_at(5.0)], &mut queue);
        // The scanner queues; the guardrail is what drops it later.
        assert_eq!(registry.status(id).unwrap(), SectionStatus::QueuedLoad);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_closer_section_scores_lower() {
        let mut registry = make_registry();
        let near = registry.register(make_section(5.0));
        let far = registry.register(make_section(9.0));
        let mut queue = CommandQueue::new();

        scan(&mut registry, &[focus_at(0.0)], &mut queue);
        queue.sort_for_execution();
        let order: Vec<_> = queue.iter().map(|c| c.section).collect();
        assert_eq!(order, vec![near, far]);
    }

    #[test]
    fn test_priority_outranks_distance_on_loads() {
        let mut registry = make_registry();
        let far_important = registry.register(make_section(9.0).with_priority(2));
        let near_plain = registry.register(make_section(5.0));
        let mut queue = CommandQueue::new();

        scan(&mut registry, &[focus_at(0.0)], &mut queue);
        queue.sort_for_execution();
        // Priority 2 is worth 20 score units, more than the 4-unit distance gap.
        assert_eq!(queue.iter().next().unwrap().section, far_important);
        let _ = near_plain;
    }

    #[test]
    fn test_velocity_bias_prefers_sections_ahead() {
        let mut registry = make_registry();
        let ahead = registry.register(make_section(8.0));
        let behind = registry.register(make_section(-8.0));
        let mut queue = CommandQueue::new();

        let mut focus = focus_at(0.0);
        focus.velocity = WorldVec::new(30.0, 0.0, 0.0);
        scan(&mut registry, &[focus], &mut queue);

        queue.sort_for_execution();
        let order: Vec<_> = queue.iter().map(|c| c.section).collect();
        assert_eq!(order, vec![ahead, behind]);
    }

    #[test]
    fn test_estimated_cost_penalizes_loads() {
        let mut registry = make_registry();
        let cheap = registry.register(make_section(6.0));
        let pricey = registry.register(make_section(6.0).with_estimated_cost(50.0));
        let mut queue = CommandQueue::new();

        scan(&mut registry, &[focus_at(0.0)], &mut queue);
        queue.sort_for_execution();
        let order: Vec<_> = queue.iter().map(|c| c.section).collect();
        assert_eq!(order, vec![cheap, pricey]);
    }

    #[test]
    fn test_priority_delays_unload() {
        let mut registry = make_registry();
        let plain = registry.register(make_section(0.0));
        let important = registry.register(make_section(0.0).with_priority(4));
        registry.set_status(0, SectionStatus::Loaded);
        registry.set_status(1, SectionStatus::Loaded);
        let mut queue = CommandQueue::new();

        scan(&mut registry, &[focus_at(30.0)], &mut queue);
        queue.sort_for_execution();
        // The plain section evicts first; priority pushes eviction back.
        let order: Vec<_> = queue.iter().map(|c| c.section).collect();
        assert_eq!(order, vec![plain, important]);
    }

    #[test]
    fn test_focus_radius_modifiers_shift_thresholds() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        let mut queue = CommandQueue::new();

        // Distance 11 is outside the base enter radius of 10, but a +2 load
        // offset pulls it inside.
        let mut focus = focus_at(11.0);
        focus.load_radius_offset = 2.0;
        scan(&mut registry, &[focus], &mut queue);
        assert_eq!(registry.status(id).unwrap(), SectionStatus::QueuedLoad);
    }

    #[test]
    fn test_hostile_offsets_never_unload_a_desired_section() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        registry.set_status(0, SectionStatus::Loaded);
        let mut queue = CommandQueue::new();

        // An unload offset of -10 would pull exit (15) below enter (10);
        // the clamp keeps exit above enter, so a section inside its enter
        // radius can never fall outside its exit radius.
        let mut focus = focus_at(9.5);
        focus.unload_radius_offset = -10.0;
        scan(&mut registry, &[focus], &mut queue);

        assert!(queue.is_empty());
        assert_eq!(registry.status(id).unwrap(), SectionStatus::Loaded);
    }

    #[test]
    fn test_last_seen_refreshed_inside_exit() {
        let mut registry = make_registry();
        let id = registry.register(make_section(0.0));
        let mut queue = CommandQueue::new();

        DesireScanner::new().scan(&mut registry, &[focus_at(14.0)], Tick(7), &mut queue);
        assert_eq!(registry.state(id).unwrap().last_seen(), Some(Tick(7)));

        DesireScanner::new().scan(&mut registry, &[focus_at(40.0)], Tick(8), &mut queue);
        assert_eq!(registry.state(id).unwrap().last_seen(), Some(Tick(7)));
    }
}
