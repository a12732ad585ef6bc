//! Mutable per-section streaming state.

use crate::clock::Tick;
use crate::loader::{LoadHandle, LoadPhase};

use super::status::SectionStatus;

/// Mutable state owned by the registry, one instance per section.
///
/// Status is only mutable inside the crate; external code observes it through
/// read accessors so every transition flows through the pipeline stages.
#[derive(Debug, Clone)]
pub struct SectionState {
    status: SectionStatus,
    cooldown_until: Tick,
    pin_count: u32,
    last_seen: Option<Tick>,
    handle: Option<LoadHandle>,
    loader_phase: Option<LoadPhase>,
}

impl SectionState {
    pub(crate) fn new() -> Self {
        Self {
            status: SectionStatus::Unloaded,
            cooldown_until: Tick::ZERO,
            pin_count: 0,
            last_seen: None,
            handle: None,
            loader_phase: None,
        }
    }

    pub fn status(&self) -> SectionStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: SectionStatus) {
        self.status = status;
    }

    /// True while loads for this section are suppressed.
    pub fn in_cooldown(&self, now: Tick) -> bool {
        self.cooldown_until > now
    }

    pub fn cooldown_until(&self) -> Tick {
        self.cooldown_until
    }

    pub(crate) fn start_cooldown(&mut self, now: Tick, cooldown_ticks: u64) {
        self.cooldown_until = now.advanced_by(cooldown_ticks);
    }

    pub(crate) fn clear_cooldown(&mut self) {
        self.cooldown_until = Tick::ZERO;
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    /// Increment the pin count, returning the new count.
    pub(crate) fn pin(&mut self) -> u32 {
        self.pin_count += 1;
        self.pin_count
    }

    /// Decrement the pin count, returning the new count, or `None` when the
    /// section was not pinned.
    pub(crate) fn unpin(&mut self) -> Option<u32> {
        if self.pin_count == 0 {
            return None;
        }
        self.pin_count -= 1;
        Some(self.pin_count)
    }

    /// Last tick at which any focus held this section inside an exit radius.
    pub fn last_seen(&self) -> Option<Tick> {
        self.last_seen
    }

    pub(crate) fn mark_seen(&mut self, now: Tick) {
        self.last_seen = Some(now);
    }

    /// Outstanding loader handle, if a load was handed off.
    pub fn handle(&self) -> Option<LoadHandle> {
        self.handle
    }

    pub(crate) fn set_handle(&mut self, handle: LoadHandle) {
        self.handle = Some(handle);
        self.loader_phase = Some(LoadPhase::Loading);
    }

    pub(crate) fn clear_handle(&mut self) {
        self.handle = None;
        self.loader_phase = None;
    }

    /// Loader phase observed at the most recent poll of the held handle.
    pub fn loader_phase(&self) -> Option<LoadPhase> {
        self.loader_phase
    }

    pub(crate) fn set_loader_phase(&mut self, phase: LoadPhase) {
        self.loader_phase = Some(phase);
    }
}

impl Default for SectionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_unloaded_and_unpinned() {
        let state = SectionState::new();
        assert_eq!(state.status(), SectionStatus::Unloaded);
        assert_eq!(state.pin_count(), 0);
        assert!(state.last_seen().is_none());
        assert!(state.handle().is_none());
        assert!(!state.in_cooldown(Tick::ZERO));
    }

    #[test]
    fn test_cooldown_boundary() {
        let mut state = SectionState::new();
        state.start_cooldown(Tick(10), 5);
        assert_eq!(state.cooldown_until(), Tick(15));
        assert!(state.in_cooldown(Tick(14)));
        // Eligible again the tick the cooldown expires.
        assert!(!state.in_cooldown(Tick(15)));
        assert!(!state.in_cooldown(Tick(16)));
    }

    #[test]
    fn test_clear_cooldown() {
        let mut state = SectionState::new();
        state.start_cooldown(Tick(10), 100);
        state.clear_cooldown();
        assert!(!state.in_cooldown(Tick(11)));
    }

    #[test]
    fn test_pin_and_unpin_counts() {
        let mut state = SectionState::new();
        assert_eq!(state.pin(), 1);
        assert_eq!(state.pin(), 2);
        assert!(state.is_pinned());
        assert_eq!(state.unpin(), Some(1));
        assert_eq!(state.unpin(), Some(0));
        assert!(!state.is_pinned());
    }

    #[test]
    fn test_unpin_without_pin_is_rejected() {
        let mut state = SectionState::new();
        assert_eq!(state.unpin(), None);
        assert_eq!(state.pin_count(), 0);
    }

    #[test]
    fn test_handle_tracks_loader_phase() {
        let mut state = SectionState::new();
        state.set_handle(LoadHandle::from_raw(7));
        assert_eq!(state.handle(), Some(LoadHandle::from_raw(7)));
        assert_eq!(state.loader_phase(), Some(LoadPhase::Loading));

        state.set_loader_phase(LoadPhase::Loaded);
        assert_eq!(state.loader_phase(), Some(LoadPhase::Loaded));

        state.clear_handle();
        assert!(state.handle().is_none());
        assert!(state.loader_phase().is_none());
    }

    #[test]
    fn test_mark_seen() {
        let mut state = SectionState::new();
        state.mark_seen(Tick(42));
        assert_eq!(state.last_seen(), Some(Tick(42)));
    }
}
