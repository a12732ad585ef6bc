//! Deterministic scripted loader.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::section::ContentRef;

use super::{ContentLoader, LoadHandle, LoadPhase, LoaderError};

/// Default number of [`advance`](ScriptedLoader::advance) steps a load takes.
pub const DEFAULT_LOAD_STEPS: u64 = 1;

/// Default number of [`advance`](ScriptedLoader::advance) steps an unload takes.
pub const DEFAULT_UNLOAD_STEPS: u64 = 1;

/// One operation issued to the loader, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderOp {
    Load(String),
    Unload(String),
}

#[derive(Debug)]
struct Job {
    content: String,
    phase: LoadPhase,
    /// Remaining `advance` steps until the current phase resolves.
    remaining: u64,
    fail_load: bool,
    fail_unload: bool,
}

/// In-memory [`ContentLoader`] with scripted latency and failures.
///
/// Time is explicit: the loader only makes progress when the host calls
/// [`advance`](Self::advance), typically once per simulation step after the
/// pipeline ran. Everything else is plain bookkeeping, so identical call
/// sequences always produce identical phases. Every issued operation is
/// recorded, which lets tests assert the exact load/unload sequence.
///
/// This is the loader behind the integration tests, the property tests, and
/// the simulation CLI.
#[derive(Debug)]
pub struct ScriptedLoader {
    next_handle: u64,
    jobs: BTreeMap<LoadHandle, Job>,
    load_steps: u64,
    unload_steps: u64,
    load_steps_overrides: HashMap<String, u64>,
    refuse_contents: HashSet<String>,
    fail_load_contents: HashSet<String>,
    fail_unload_contents: HashSet<String>,
    ops: Vec<LoaderOp>,
    loads_begun: u64,
    unloads_begun: u64,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            jobs: BTreeMap::new(),
            load_steps: DEFAULT_LOAD_STEPS,
            unload_steps: DEFAULT_UNLOAD_STEPS,
            load_steps_overrides: HashMap::new(),
            refuse_contents: HashSet::new(),
            fail_load_contents: HashSet::new(),
            fail_unload_contents: HashSet::new(),
            ops: Vec::new(),
            loads_begun: 0,
            unloads_begun: 0,
        }
    }

    /// Set how many `advance` steps every load takes (0 = instant).
    pub fn with_load_steps(mut self, steps: u64) -> Self {
        self.load_steps = steps;
        self
    }

    /// Set how many `advance` steps every unload takes (0 = instant).
    pub fn with_unload_steps(mut self, steps: u64) -> Self {
        self.unload_steps = steps;
        self
    }

    /// Override the load latency for one content reference.
    pub fn set_load_steps_for(&mut self, content: &str, steps: u64) {
        self.load_steps_overrides.insert(content.to_string(), steps);
    }

    /// Make `begin_load` refuse this content synchronously.
    pub fn refuse(&mut self, content: &str) {
        self.refuse_contents.insert(content.to_string());
    }

    /// Make loads of this content complete as failed.
    pub fn fail_load(&mut self, content: &str) {
        self.fail_load_contents.insert(content.to_string());
    }

    /// Make unloads of this content complete as failed.
    pub fn fail_unload(&mut self, content: &str) {
        self.fail_unload_contents.insert(content.to_string());
    }

    /// Stop scripting failures for future operations.
    pub fn clear_failures(&mut self) {
        self.refuse_contents.clear();
        self.fail_load_contents.clear();
        self.fail_unload_contents.clear();
    }

    /// Drop all knowledge of `handle`, simulating a loader that silently
    /// discarded it. Subsequent polls return `None`.
    pub fn forget(&mut self, handle: LoadHandle) {
        if self.jobs.remove(&handle).is_some() {
            debug!(handle = %handle, "Scripted loader forgot handle");
        }
    }

    /// Advance scripted time by one step, resolving due phases.
    pub fn advance(&mut self) {
        for job in self.jobs.values_mut() {
            match job.phase {
                LoadPhase::Loading => {
                    job.remaining = job.remaining.saturating_sub(1);
                    if job.remaining == 0 {
                        job.phase = if job.fail_load {
                            LoadPhase::Failed
                        } else {
                            LoadPhase::Loaded
                        };
                    }
                }
                LoadPhase::Unloading => {
                    job.remaining = job.remaining.saturating_sub(1);
                    if job.remaining == 0 {
                        job.phase = if job.fail_unload {
                            LoadPhase::Failed
                        } else {
                            LoadPhase::Unloaded
                        };
                    }
                }
                _ => {}
            }
        }
    }

    /// Every operation issued so far, in order.
    pub fn ops(&self) -> &[LoaderOp] {
        &self.ops
    }

    pub fn loads_begun(&self) -> u64 {
        self.loads_begun
    }

    pub fn unloads_begun(&self) -> u64 {
        self.unloads_begun
    }

    /// Handles currently in the loaded phase.
    pub fn resident_count(&self) -> usize {
        self.count_phase(LoadPhase::Loaded)
    }

    /// Handles currently loading or unloading.
    pub fn in_flight_count(&self) -> usize {
        self.count_phase(LoadPhase::Loading) + self.count_phase(LoadPhase::Unloading)
    }

    fn count_phase(&self, phase: LoadPhase) -> usize {
        self.jobs.values().filter(|job| job.phase == phase).count()
    }

    fn resolve_load_phase(&self, content: &str, steps: u64) -> LoadPhase {
        if steps > 0 {
            LoadPhase::Loading
        } else if self.fail_load_contents.contains(content) {
            LoadPhase::Failed
        } else {
            LoadPhase::Loaded
        }
    }
}

impl Default for ScriptedLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentLoader for ScriptedLoader {
    fn begin_load(&mut self, content: &ContentRef) -> Result<LoadHandle, LoaderError> {
        if self.refuse_contents.contains(content.as_str()) {
            return Err(LoaderError::refused(content, "scripted refusal"));
        }

        let handle = LoadHandle::from_raw(self.next_handle);
        self.next_handle += 1;

        let steps = self
            .load_steps_overrides
            .get(content.as_str())
            .copied()
            .unwrap_or(self.load_steps);
        let phase = self.resolve_load_phase(content.as_str(), steps);

        self.jobs.insert(
            handle,
            Job {
                content: content.as_str().to_string(),
                phase,
                remaining: steps,
                fail_load: self.fail_load_contents.contains(content.as_str()),
                fail_unload: self.fail_unload_contents.contains(content.as_str()),
            },
        );
        self.ops.push(LoaderOp::Load(content.as_str().to_string()));
        self.loads_begun += 1;
        Ok(handle)
    }

    fn begin_unload(&mut self, handle: LoadHandle) {
        let Some(job) = self.jobs.get_mut(&handle) else {
            debug!(handle = %handle, "Unload requested for unknown handle, ignoring");
            return;
        };
        job.phase = if self.unload_steps > 0 {
            LoadPhase::Unloading
        } else if job.fail_unload {
            LoadPhase::Failed
        } else {
            LoadPhase::Unloaded
        };
        job.remaining = self.unload_steps;
        self.ops.push(LoaderOp::Unload(job.content.clone()));
        self.unloads_begun += 1;
    }

    fn poll_status(&mut self, handle: LoadHandle) -> Option<LoadPhase> {
        self.jobs.get(&handle).map(|job| job.phase)
    }
}
