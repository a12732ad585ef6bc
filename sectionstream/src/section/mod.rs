//! Sections: the discrete, independently loadable units of world content.
//!
//! A section pairs an immutable [`SectionDescriptor`] (placement, hysteresis
//! radii, scheduling hints, content reference) with a mutable
//! [`SectionState`] (status, cooldown, pins, loader handle). Both live in the
//! [`SectionRegistry`] arena, addressed by [`SectionId`].
//!
//! Status mutation is crate-internal: every transition happens inside the
//! pipeline stages, so external observers can rely on the state machine
//! documented on [`SectionStatus`].

mod descriptor;
mod id;
mod registry;
mod state;
mod status;

pub use descriptor::{ContentRef, SectionDescriptor, DEFAULT_PRIORITY, MIN_HYSTERESIS_BAND};
pub use id::{InstanceId, SectionId};
pub use registry::SectionRegistry;
pub use state::SectionState;
pub use status::SectionStatus;

pub(crate) use registry::Slot;
