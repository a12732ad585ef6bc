//! Section residency status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Residency status of a section.
///
/// Statuses move through a fixed machine:
///
/// ```text
/// Unloaded → QueuedLoad → Loading → Loaded → QueuedUnload → Unloading → Unloaded
///                            │                                  │
///                            └──────────→ Error ←───────────────┘
/// ```
///
/// `Error` returns to `Unloaded` on a desire re-trigger or a debug cooldown
/// clear. The queued statuses record committed intent that the executor has
/// not yet handed to the loader; `Loading`/`Unloading` mean the loader is
/// working and the synchronizer is polling for the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionStatus {
    /// Not resident, no work queued or in flight.
    Unloaded,
    /// Load intent committed, not yet handed to the loader.
    QueuedLoad,
    /// Load handed to the loader, awaiting completion.
    Loading,
    /// Content resident.
    Loaded,
    /// Unload intent committed, not yet handed to the loader.
    QueuedUnload,
    /// Unload handed to the loader, awaiting completion.
    Unloading,
    /// Last loader operation failed; eligible again after cooldown.
    Error,
}

impl SectionStatus {
    /// True when content is resident.
    pub fn is_resident(&self) -> bool {
        matches!(self, SectionStatus::Loaded)
    }

    /// True while the loader is working on this section.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SectionStatus::Loading | SectionStatus::Unloading)
    }

    /// True for committed intent the executor has not yet acted on.
    pub fn is_queued(&self) -> bool {
        matches!(self, SectionStatus::QueuedLoad | SectionStatus::QueuedUnload)
    }

    /// True when the scanner may queue an unload for this status.
    pub(crate) fn unload_eligible(&self) -> bool {
        matches!(
            self,
            SectionStatus::Loaded | SectionStatus::Loading | SectionStatus::QueuedLoad
        )
    }

    /// Short stable name for logs and telemetry.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionStatus::Unloaded => "unloaded",
            SectionStatus::QueuedLoad => "queued_load",
            SectionStatus::Loading => "loading",
            SectionStatus::Loaded => "loaded",
            SectionStatus::QueuedUnload => "queued_unload",
            SectionStatus::Unloading => "unloading",
            SectionStatus::Error => "error",
        }
    }
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resident_only_when_loaded() {
        assert!(SectionStatus::Loaded.is_resident());
        assert!(!SectionStatus::Loading.is_resident());
        assert!(!SectionStatus::QueuedLoad.is_resident());
    }

    #[test]
    fn test_in_flight_statuses() {
        assert!(SectionStatus::Loading.is_in_flight());
        assert!(SectionStatus::Unloading.is_in_flight());
        assert!(!SectionStatus::Loaded.is_in_flight());
        assert!(!SectionStatus::Error.is_in_flight());
    }

    #[test]
    fn test_queued_statuses() {
        assert!(SectionStatus::QueuedLoad.is_queued());
        assert!(SectionStatus::QueuedUnload.is_queued());
        assert!(!SectionStatus::Unloaded.is_queued());
    }

    #[test]
    fn test_unload_eligibility() {
        assert!(SectionStatus::Loaded.unload_eligible());
        assert!(SectionStatus::Loading.unload_eligible());
        assert!(SectionStatus::QueuedLoad.unload_eligible());
        assert!(!SectionStatus::QueuedUnload.unload_eligible());
        assert!(!SectionStatus::Unloaded.unload_eligible());
        assert!(!SectionStatus::Error.unload_eligible());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(SectionStatus::QueuedLoad.to_string(), "queued_load");
        assert_eq!(SectionStatus::Error.to_string(), "error");
    }
}
