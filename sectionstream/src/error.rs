//! Library error types.
//!
//! Pipeline-internal failures (loader refusals, conflicts, illegal
//! transitions) are recovered locally and never surface here; these types
//! cover misuse of the public API surface.

use thiserror::Error;

use crate::section::SectionId;

/// Error returned by coordinator and registry API calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The id does not name a registered section of this coordinator.
    #[error("unknown section {0}")]
    UnknownSection(SectionId),

    /// The id was issued by a different coordinator instance.
    #[error("section {0} belongs to a different coordinator instance")]
    ForeignSection(SectionId),

    /// `unpin` was called on a section whose pin count is zero.
    #[error("section {0} is not pinned")]
    PinUnderflow(SectionId),
}
