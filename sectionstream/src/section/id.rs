//! Section and coordinator identity.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Process-wide source of coordinator instance tags.
static INSTANCE_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Tag identifying one coordinator instance within the process.
///
/// Every [`SectionId`] carries the tag of the instance that issued it, so an
/// id handed to a different coordinator is rejected instead of silently
/// indexing a foreign arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(u32);

impl InstanceId {
    /// Allocate the next unused instance tag.
    pub(crate) fn next() -> Self {
        InstanceId(INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a registered section.
///
/// Packs the owning instance tag in the high 32 bits and the arena slot in
/// the low 32 bits. Within one coordinator the numeric order follows
/// registration order, which makes `SectionId` the stable tie-break key for
/// deterministic command scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectionId(u64);

impl SectionId {
    pub(crate) fn new(instance: InstanceId, slot: u32) -> Self {
        SectionId((u64::from(instance.0) << 32) | u64::from(slot))
    }

    /// Tag of the coordinator instance that issued this id.
    pub fn instance(&self) -> InstanceId {
        InstanceId((self.0 >> 32) as u32)
    }

    pub(crate) fn slot(&self) -> usize {
        (self.0 & u64::from(u32::MAX)) as usize
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.instance(), self.slot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_packs_instance_and_slot() {
        let instance = InstanceId::next();
        let id = SectionId::new(instance, 42);
        assert_eq!(id.instance(), instance);
        assert_eq!(id.slot(), 42);
    }

    #[test]
    fn test_instance_tags_are_unique() {
        let a = InstanceId::next();
        let b = InstanceId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_ids_order_by_registration_within_instance() {
        let instance = InstanceId::next();
        let first = SectionId::new(instance, 0);
        let later = SectionId::new(instance, 7);
        assert!(first < later);
    }

    #[test]
    fn test_display_shows_instance_and_slot() {
        let id = SectionId::new(InstanceId(3), 15);
        assert_eq!(id.to_string(), "3.15");
    }
}
