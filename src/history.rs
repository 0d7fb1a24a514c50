//! Bounded undo/redo history.
//!
//! Two stacks of [`Command`] values.  Executing through the history pushes
//! onto the undo stack and clears the redo stack; undo/redo shuttle commands
//! between the stacks.  When the undo stack exceeds its cap the oldest
//! entries are evicted and become permanently unreachable.

use crate::commands::Command;
use crate::error::EditorError;
use crate::manager::LayerManager;

pub const DEFAULT_MAX_HISTORY: usize = 50;

pub struct HistoryManager {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    max_history: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history: max_history.max(1),
        }
    }

    /// Run a command and record it.  Any pending redo branch is discarded
    /// first; a failed command is not recorded at all.
    pub fn execute_command(
        &mut self,
        mut command: Command,
        mgr: &mut LayerManager,
    ) -> Result<(), EditorError> {
        command.execute(mgr)?;
        self.redo_stack.clear();
        self.undo_stack.push(command);
        self.prune();
        Ok(())
    }

    /// Record a command whose effect already happened outside the history
    /// (e.g. a finished drawing stroke).  Clears the redo branch like any
    /// other new edit.
    pub fn push_executed(&mut self, command: Command) {
        self.redo_stack.clear();
        self.undo_stack.push(command);
        self.prune();
    }

    /// Reverse the most recent command.  Returns its description.  If the
    /// command fails to reverse, it is pushed back so the history does not
    /// silently lose an entry.
    pub fn undo(&mut self, mgr: &mut LayerManager) -> Result<String, EditorError> {
        let mut command = self.undo_stack.pop().ok_or(EditorError::NothingToUndo)?;
        match command.undo(mgr) {
            Ok(()) => {
                let description = command.description();
                self.redo_stack.push(command);
                Ok(description)
            }
            Err(e) => {
                self.undo_stack.push(command);
                Err(e)
            }
        }
    }

    /// Re-apply the most recently undone command.  Returns its description.
    pub fn redo(&mut self, mgr: &mut LayerManager) -> Result<String, EditorError> {
        let mut command = self.redo_stack.pop().ok_or(EditorError::NothingToRedo)?;
        match command.execute(mgr) {
            Ok(()) => {
                let description = command.description();
                self.undo_stack.push(command);
                Ok(description)
            }
            Err(e) => {
                self.redo_stack.push(command);
                Err(e)
            }
        }
    }

    /// Evict the oldest entries once past the cap.
    fn prune(&mut self) {
        if self.undo_stack.len() > self.max_history {
            let excess = self.undo_stack.len() - self.max_history;
            self.undo_stack.drain(..excess);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn next_undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(Command::description)
    }

    pub fn next_redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(Command::description)
    }

    /// Descriptions of the undoable commands, oldest first.
    pub fn undo_history(&self) -> Vec<String> {
        self.undo_stack.iter().map(Command::description).collect()
    }

    /// Total bytes retained by recorded snapshots, for diagnostics.
    pub fn memory_usage(&self) -> usize {
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .map(Command::memory_size)
            .sum()
    }

    /// Drop both stacks (e.g. after loading a new image).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
