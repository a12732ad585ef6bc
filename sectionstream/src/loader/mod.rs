//! Content loader interface.
//!
//! The streaming core never performs I/O itself. All load and unload work is
//! handed to a [`ContentLoader`] collaborator: `begin_load` starts async work
//! and returns a handle, `begin_unload` releases it, and `poll_status`
//! reports the loader's current view of a handle. Calls are fire-and-forget;
//! the pipeline observes completion by polling on later ticks and never
//! blocks.
//!
//! Two implementations ship with the crate:
//!
//! - [`ScriptedLoader`]: deterministic in-memory loader for tests and the
//!   simulation CLI.
//! - [`TaskPoolLoader`]: tokio-backed adapter bridging to an async content
//!   backend in a real host.

mod scripted;
mod task_pool;

pub use scripted::{LoaderOp, ScriptedLoader};
pub use task_pool::{BackendError, BoxFuture, ContentBackend, TaskPoolLoader};

use std::fmt;

use thiserror::Error;

use crate::section::ContentRef;

/// Handle to one in-flight or resident piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadHandle(u64);

impl LoadHandle {
    pub fn from_raw(raw: u64) -> Self {
        LoadHandle(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// Loader-side phase of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Load work in progress.
    Loading,
    /// Content resident behind this handle.
    Loaded,
    /// Unload work in progress.
    Unloading,
    /// Content released; the handle is spent.
    Unloaded,
    /// The loader gave up on this handle.
    Failed,
}

impl LoadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadPhase::Loading => "loading",
            LoadPhase::Loaded => "loaded",
            LoadPhase::Unloading => "unloading",
            LoadPhase::Unloaded => "unloaded",
            LoadPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synchronous refusal to even begin an operation.
#[derive(Debug, Clone, Error)]
#[error("loader refused '{content}': {reason}")]
pub struct LoaderError {
    /// Content reference the refusal applies to.
    pub content: String,
    /// Loader-supplied reason, for logs only.
    pub reason: String,
}

impl LoaderError {
    pub fn refused(content: &ContentRef, reason: impl Into<String>) -> Self {
        Self {
            content: content.as_str().to_string(),
            reason: reason.into(),
        }
    }
}

/// External asynchronous content loader.
///
/// Implementations must not block in any of these calls; long-running work
/// belongs on the loader's own threads or runtime. The pipeline calls this
/// from exactly one thread, in deterministic order within a tick.
pub trait ContentLoader {
    /// Start loading `content`. Returns a handle to poll, or a refusal when
    /// the loader cannot even begin (unknown content, over capacity).
    fn begin_load(&mut self, content: &ContentRef) -> Result<LoadHandle, LoaderError>;

    /// Start releasing the content behind `handle`. Fire-and-forget; progress
    /// is observed through [`poll_status`](Self::poll_status).
    fn begin_unload(&mut self, handle: LoadHandle);

    /// The loader's current view of `handle`, or `None` when the loader no
    /// longer recognizes it.
    fn poll_status(&mut self, handle: LoadHandle) -> Option<LoadPhase>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(LoadPhase::Loading.as_str(), "loading");
        assert_eq!(LoadPhase::Failed.to_string(), "failed");
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(LoadHandle::from_raw(12).to_string(), "h12");
    }

    #[test]
    fn test_refusal_message() {
        let err = LoaderError::refused(&ContentRef::new("region/swamp_09"), "unknown content");
        assert_eq!(
            err.to_string(),
            "loader refused 'region/swamp_09': unknown content"
        );
    }
}
