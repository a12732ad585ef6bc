//! Streaming commands and the queue that carries them between stages.
//!
//! Commands are transient intents: born in the scanner (or the manual request
//! API), filtered by the guardrail, consumed by the executor. A command the
//! executor defers under budget pressure stays queued and is re-filtered and
//! re-sorted next tick together with the fresh intents; nothing is ever
//! silently dropped by the queue itself.

use crate::section::SectionId;

/// Score attached to manual requests.
///
/// Far below anything the scanner can produce, so operator-requested work
/// always drains ahead of proximity-driven work when budgets are tight.
pub const MANUAL_SCORE: f32 = -1_000_000.0;

/// What a command asks the executor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Load,
    Unload,
}

impl CommandAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::Load => "load",
            CommandAction::Unload => "unload",
        }
    }
}

/// Why a command was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandReason {
    /// A focus entered the section's enter radius.
    EnterRange,
    /// The section left the exit radius of every focus.
    ExitRange,
    /// Explicit request through the manual API.
    Manual,
}

impl CommandReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandReason::EnterRange => "enter_range",
            CommandReason::ExitRange => "exit_range",
            CommandReason::Manual => "manual",
        }
    }
}

/// One load/unload intent against a single section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub section: SectionId,
    pub action: CommandAction,
    pub reason: CommandReason,
    /// Lower scores execute first (see the scanner for the scoring model).
    pub score: f32,
}

impl Command {
    pub fn load(section: SectionId, reason: CommandReason, score: f32) -> Self {
        Self {
            section,
            action: CommandAction::Load,
            reason,
            score,
        }
    }

    pub fn unload(section: SectionId, reason: CommandReason, score: f32) -> Self {
        Self {
            section,
            action: CommandAction::Unload,
            reason,
            score,
        }
    }
}

/// Accumulates commands in emission order and drains them deterministically.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Sort into execution order: score ascending, ties broken by section id.
    ///
    /// `total_cmp` gives a total order over floats, so two runs over the same
    /// commands always drain in the same sequence. This is what makes the
    /// issued loader operations reproducible for simulation replay.
    pub fn sort_for_execution(&mut self) {
        self.commands.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.section.cmp(&b.section))
        });
    }

    pub(crate) fn commands_mut(&mut self) -> &mut Vec<Command> {
        &mut self.commands
    }
}
