use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::{Booking, Resource};

/// Immutable copy of an entity as it stood at journal time. Snapshots are
/// fully owned values sharing no state with the live catalog entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Snapshot {
    Resource(Resource),
    Booking(Booking),
}

impl Snapshot {
    pub fn entity_id(&self) -> &str {
        match self {
            Snapshot::Resource(r) => &r.id,
            Snapshot::Booking(b) => &b.id,
        }
    }
}

/// One journaled mutation. Undo applies the inverse (drop what `Create`
/// made, restore `before` for the rest); redo re-applies the forward effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Create {
        after: Snapshot,
        description: String,
    },
    Update {
        before: Snapshot,
        after: Snapshot,
        description: String,
    },
    Delete {
        before: Snapshot,
        description: String,
    },
    /// Grouped mutations that undo/redo as a single step.
    Batch {
        commands: Vec<Command>,
        description: String,
    },
}

impl Command {
    pub fn description(&self) -> &str {
        match self {
            Command::Create { description, .. }
            | Command::Update { description, .. }
            | Command::Delete { description, .. }
            | Command::Batch { description, .. } => description,
        }
    }
}

/// Bounded undo/redo journal.
///
/// Recording a fresh command clears the redo stack, so redo history only
/// ever exists immediately after an undo. The undo side is capped; the
/// oldest entry drops silently once the cap is hit.
#[derive(Debug)]
pub struct ChangeLog {
    undo: VecDeque<Command>,
    redo: Vec<Command>,
    batch: Option<Vec<Command>>,
    max_history: usize,
}

impl ChangeLog {
    pub fn new(max_history: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            batch: None,
            max_history,
        }
    }

    /// Journal a command. Inside an open batch the command buffers there
    /// instead of touching the stacks.
    pub fn record(&mut self, command: Command) {
        if let Some(batch) = self.batch.as_mut() {
            batch.push(command);
            return;
        }
        self.push_undo(command);
        self.redo.clear();
    }

    fn push_undo(&mut self, command: Command) {
        self.undo.push_back(command);
        while self.undo.len() > self.max_history {
            self.undo.pop_front();
        }
    }

    /// Start buffering commands into one atomic unit. A no-op if a batch is
    /// already open.
    pub fn begin_batch(&mut self) {
        if self.batch.is_none() {
            self.batch = Some(Vec::new());
        }
    }

    /// Close the batch and journal it as a single undo step. An empty batch
    /// journals nothing.
    pub fn end_batch(&mut self, description: impl Into<String>) {
        let Some(commands) = self.batch.take() else { return };
        if commands.is_empty() {
            return;
        }
        self.push_undo(Command::Batch {
            commands,
            description: description.into(),
        });
        self.redo.clear();
    }

    /// Drop an open batch without journaling anything.
    pub fn cancel_batch(&mut self) {
        self.batch = None;
    }

    pub fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Pop the newest command onto the redo stack and hand it back; the
    /// caller applies the inverse effect.
    pub fn undo(&mut self) -> Option<Command> {
        let command = self.undo.pop_back()?;
        self.redo.push(command.clone());
        Some(command)
    }

    /// Pop the newest undone command back onto the undo stack and hand it
    /// back; the caller re-applies the forward effect.
    pub fn redo(&mut self) -> Option<Command> {
        let command = self.redo.pop()?;
        self.push_undo(command.clone());
        Some(command)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo.back().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo.last().map(|c| c.description())
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}
