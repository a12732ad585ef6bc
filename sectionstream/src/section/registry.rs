//! Arena of registered sections.
//!
//! The registry is the only shared mutable resource in the pipeline. Each
//! stage owns it exclusively during its turn in the fixed per-tick order, so
//! it needs no interior locking. Sections are stored in a flat arena indexed
//! by the slot packed inside [`SectionId`]; ids from other coordinator
//! instances are rejected at lookup.

use tracing::{debug, trace};

use crate::error::StreamError;

use super::descriptor::SectionDescriptor;
use super::id::{InstanceId, SectionId};
use super::state::SectionState;
use super::status::SectionStatus;

/// One registered section: immutable descriptor plus mutable state.
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) descriptor: SectionDescriptor,
    pub(crate) state: SectionState,
}

/// Owns every registered section of one coordinator instance.
#[derive(Debug)]
pub struct SectionRegistry {
    instance: InstanceId,
    slots: Vec<Slot>,
}

impl SectionRegistry {
    pub(crate) fn new(instance: InstanceId) -> Self {
        Self {
            instance,
            slots: Vec::new(),
        }
    }

    /// Tag of the owning coordinator instance.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Register a section, returning its id. Sections start Unloaded.
    pub(crate) fn register(&mut self, descriptor: SectionDescriptor) -> SectionId {
        let id = SectionId::new(self.instance, self.slots.len() as u32);
        debug!(
            section = %id,
            name = descriptor.name(),
            enter_radius = descriptor.enter_radius(),
            exit_radius = descriptor.exit_radius(),
            manual = descriptor.is_manual(),
            "Registered section"
        );
        self.slots.push(Slot {
            descriptor,
            state: SectionState::new(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Ids of all registered sections, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = SectionId> + '_ {
        (0..self.slots.len()).map(|slot| SectionId::new(self.instance, slot as u32))
    }

    pub(crate) fn id_at(&self, index: usize) -> SectionId {
        SectionId::new(self.instance, index as u32)
    }

    /// Resolve an id to its arena index, rejecting foreign and unknown ids.
    pub(crate) fn index_of(&self, id: SectionId) -> Result<usize, StreamError> {
        if id.instance() != self.instance {
            return Err(StreamError::ForeignSection(id));
        }
        let slot = id.slot();
        if slot >= self.slots.len() {
            return Err(StreamError::UnknownSection(id));
        }
        Ok(slot)
    }

    pub fn descriptor(&self, id: SectionId) -> Result<&SectionDescriptor, StreamError> {
        Ok(&self.slots[self.index_of(id)?].descriptor)
    }

    pub fn state(&self, id: SectionId) -> Result<&SectionState, StreamError> {
        Ok(&self.slots[self.index_of(id)?].state)
    }

    pub fn status(&self, id: SectionId) -> Result<SectionStatus, StreamError> {
        Ok(self.slots[self.index_of(id)?].state.status())
    }

    pub(crate) fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Slot {
        &mut self.slots[index]
    }

    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Transition a slot's status, tracing the edge. No-op when unchanged.
    pub(crate) fn set_status(&mut self, index: usize, next: SectionStatus) {
        let prev = self.slots[index].state.status();
        if prev == next {
            return;
        }
        self.slots[index].state.set_status(next);
        trace!(
            section = %self.id_at(index),
            from = prev.as_str(),
            to = next.as_str(),
            "Status transition"
        );
    }

    /// Number of sections currently in `status`.
    pub(crate) fn count_status(&self, status: SectionStatus) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state.status() == status)
            .count()
    }

    /// Clear every active cooldown and reset Error sections to Unloaded.
    ///
    /// Returns `(cooldowns_cleared, errors_reset)`.
    pub(crate) fn clear_cooldowns(&mut self, now: crate::clock::Tick) -> (usize, usize) {
        let mut cooldowns = 0;
        let mut errors = 0;
        for index in 0..self.slots.len() {
            if self.slots[index].state.in_cooldown(now) {
                self.slots[index].state.clear_cooldown();
                cooldowns += 1;
            }
            if self.slots[index].state.status() == SectionStatus::Error {
                self.set_status(index, SectionStatus::Unloaded);
                errors += 1;
            }
        }
        (cooldowns, errors)
    }
}
