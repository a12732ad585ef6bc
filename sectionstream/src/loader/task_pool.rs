//! Tokio-backed loader adapter.
//!
//! Bridges the synchronous tick pipeline to an async [`ContentBackend`]. Each
//! `begin_load`/`begin_unload` spawns the backend future onto the supplied
//! runtime handle and returns immediately; the spawned task records its
//! outcome in a shared slot map that `poll_status` reads. The pipeline thread
//! never awaits anything.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::warn;

use crate::section::ContentRef;

use super::{ContentLoader, LoadHandle, LoadPhase, LoaderError};

/// Boxed future returned by [`ContentBackend`] operations.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Failure reported by a backend operation.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// Async backend that actually fetches and releases content.
///
/// Implementations own the I/O: disk reads, network fetches, decompression.
/// Both operations report failure through their future; they must not panic.
pub trait ContentBackend: Send + Sync + 'static {
    /// Bring the content into residency.
    fn fetch(&self, content: ContentRef) -> BoxFuture<Result<(), BackendError>>;

    /// Release previously fetched content.
    fn release(&self, content: ContentRef) -> BoxFuture<Result<(), BackendError>>;
}

#[derive(Debug)]
struct Slot {
    content: String,
    phase: LoadPhase,
}

/// [`ContentLoader`] implementation for tokio hosts.
pub struct TaskPoolLoader {
    runtime: Handle,
    backend: Arc<dyn ContentBackend>,
    slots: Arc<Mutex<HashMap<LoadHandle, Slot>>>,
    next_handle: AtomicU64,
}

impl TaskPoolLoader {
    /// Create an adapter spawning backend work onto `runtime`.
    pub fn new(runtime: Handle, backend: Arc<dyn ContentBackend>) -> Self {
        Self {
            runtime,
            backend,
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Number of handles the adapter currently tracks.
    pub fn tracked_handles(&self) -> usize {
        self.slots.lock().len()
    }
}

impl ContentLoader for TaskPoolLoader {
    fn begin_load(&mut self, content: &ContentRef) -> Result<LoadHandle, LoaderError> {
        let handle = LoadHandle::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.slots.lock().insert(
            handle,
            Slot {
                content: content.as_str().to_string(),
                phase: LoadPhase::Loading,
            },
        );

        let future = self.backend.fetch(content.clone());
        let slots = Arc::clone(&self.slots);
        let content_name = content.as_str().to_string();
        self.runtime.spawn(async move {
            let outcome = future.await;
            let mut slots = slots.lock();
            let Some(slot) = slots.get_mut(&handle) else {
                return;
            };
            slot.phase = match outcome {
                Ok(()) => LoadPhase::Loaded,
                Err(err) => {
                    warn!(content = %content_name, error = %err, "Backend fetch failed");
                    LoadPhase::Failed
                }
            };
        });

        Ok(handle)
    }

    fn begin_unload(&mut self, handle: LoadHandle) {
        let content = {
            let mut slots = self.slots.lock();
            let Some(slot) = slots.get_mut(&handle) else {
                warn!(handle = %handle, "Unload requested for unknown handle");
                return;
            };
            slot.phase = LoadPhase::Unloading;
            slot.content.clone()
        };

        let future = self.backend.release(ContentRef::new(content.clone()));
        let slots = Arc::clone(&self.slots);
        self.runtime.spawn(async move {
            let outcome = future.await;
            let mut slots = slots.lock();
            let Some(slot) = slots.get_mut(&handle) else {
                return;
            };
            slot.phase = match outcome {
                Ok(()) => LoadPhase::Unloaded,
                Err(err) => {
                    warn!(content = %content, error = %err, "Backend release failed");
                    LoadPhase::Failed
                }
            };
        });
    }

    fn poll_status(&mut self, handle: LoadHandle) -> Option<LoadPhase> {
        self.slots.lock().get(&handle).map(|slot| slot.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    /// Backend that resolves immediately, with scriptable fetch failures.
    struct TestBackend {
        fail_fetch: HashSet<String>,
        fail_release: HashSet<String>,
        released: Mutex<Vec<String>>,
    }

    impl TestBackend {
        fn new() -> Self {
            Self {
                fail_fetch: HashSet::new(),
                fail_release: HashSet::new(),
                released: Mutex::new(Vec::new()),
            }
        }
    }

    impl ContentBackend for TestBackend {
        fn fetch(&self, content: ContentRef) -> BoxFuture<Result<(), BackendError>> {
            let fail = self.fail_fetch.contains(content.as_str());
            Box::pin(async move {
                if fail {
                    Err(BackendError("scripted fetch failure".to_string()))
                } else {
                    Ok(())
                }
            })
        }

        fn release(&self, content: ContentRef) -> BoxFuture<Result<(), BackendError>> {
            let fail = self.fail_release.contains(content.as_str());
            self.released.lock().push(content.as_str().to_string());
            Box::pin(async move {
                if fail {
                    Err(BackendError("scripted release failure".to_string()))
                } else {
                    Ok(())
                }
            })
        }
    }

    async fn wait_for_phase(loader: &mut TaskPoolLoader, handle: LoadHandle, want: LoadPhase) {
        for _ in 0..200 {
            if loader.poll_status(handle) == Some(want) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!(
            "handle {} never reached phase {}, last seen {:?}",
            handle,
            want,
            loader.poll_status(handle)
        );
    }

    #[tokio::test]
    async fn test_load_reaches_loaded() {
        let backend = Arc::new(TestBackend::new());
        let mut loader = TaskPoolLoader::new(Handle::current(), backend);

        let handle = loader.begin_load(&ContentRef::new("region/a")).unwrap();
        wait_for_phase(&mut loader, handle, LoadPhase::Loaded).await;
        assert_eq!(loader.tracked_handles(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_reaches_failed() {
        let mut backend = TestBackend::new();
        backend.fail_fetch.insert("region/bad".to_string());
        let mut loader = TaskPoolLoader::new(Handle::current(), Arc::new(backend));

        let handle = loader.begin_load(&ContentRef::new("region/bad")).unwrap();
        wait_for_phase(&mut loader, handle, LoadPhase::Failed).await;
    }

    #[tokio::test]
    async fn test_unload_reaches_unloaded_and_releases_backend() {
        let backend = Arc::new(TestBackend::new());
        let mut loader = TaskPoolLoader::new(Handle::current(), backend.clone());

        let handle = loader.begin_load(&ContentRef::new("region/a")).unwrap();
        wait_for_phase(&mut loader, handle, LoadPhase::Loaded).await;

        loader.begin_unload(handle);
        wait_for_phase(&mut loader, handle, LoadPhase::Unloaded).await;
        assert_eq!(backend.released.lock().as_slice(), &["region/a".to_string()]);
    }

    #[tokio::test]
    async fn test_release_failure_reaches_failed() {
        let mut backend = TestBackend::new();
        backend.fail_release.insert("region/sticky".to_string());
        let mut loader = TaskPoolLoader::new(Handle::current(), Arc::new(backend));

        let handle = loader.begin_load(&ContentRef::new("region/sticky")).unwrap();
        wait_for_phase(&mut loader, handle, LoadPhase::Loaded).await;
        loader.begin_unload(handle);
        wait_for_phase(&mut loader, handle, LoadPhase::Failed).await;
    }

    #[tokio::test]
    async fn test_unknown_handle_polls_none() {
        let mut loader = TaskPoolLoader::new(Handle::current(), Arc::new(TestBackend::new()));
        assert_eq!(loader.poll_status(LoadHandle::from_raw(99)), None);
        // Unload of an unknown handle is ignored, not a panic.
        loader.begin_unload(LoadHandle::from_raw(99));
    }
}
