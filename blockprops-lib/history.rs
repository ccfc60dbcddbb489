//! Whole-document undo/redo history.
//!
//! The history is two stacks of full document snapshots. Every mutating
//! operation records a deep copy of the pre-action state *before* touching
//! the document, so a failed or abandoned mutation always has a clean state
//! to fall back to. Recording a new action clears the redo stack (linear
//! history: redo is only valid straight after an undo).
//!
//! Each stack entry carries the human-readable description of the action it
//! belongs to, so descriptions stay 1:1 with undo-stack depth through undo
//! *and* redo.
//!
//! Documents are bounded (thousands of lines) and mutations are user-paced,
//! so O(document) copies per action are acceptable.

use serde::{
  Deserialize,
  Serialize,
};

use crate::document::Document;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
  snapshot:    Document,
  description: String,
}

/// Two-stack snapshot history with per-action descriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
  undo_stack: Vec<Entry>,
  redo_stack: Vec<Entry>,
}

impl History {
  /// Records the pre-action state. Call before mutating; a new action
  /// invalidates everything on the redo side.
  pub fn push(&mut self, description: impl Into<String>, snapshot: Document) {
    self.redo_stack.clear();
    self.undo_stack.push(Entry {
      snapshot,
      description: description.into(),
    });
  }

  /// Drops the most recent entry. Used when an operation that recorded a
  /// snapshot up front turned out to change nothing.
  pub fn discard_last(&mut self) {
    self.undo_stack.pop();
  }

  /// Swaps `current` for the latest undo snapshot, moving the replaced
  /// state (and its description) to the redo side. False when there is
  /// nothing to undo.
  pub fn undo(&mut self, current: &mut Document) -> bool {
    let Some(entry) = self.undo_stack.pop() else {
      return false;
    };
    let undone = std::mem::replace(current, entry.snapshot);
    self.redo_stack.push(Entry {
      snapshot:    undone,
      description: entry.description,
    });
    true
  }

  /// Inverse of [`History::undo`]. False when there is nothing to redo.
  pub fn redo(&mut self, current: &mut Document) -> bool {
    let Some(entry) = self.redo_stack.pop() else {
      return false;
    };
    let redone = std::mem::replace(current, entry.snapshot);
    self.undo_stack.push(Entry {
      snapshot:    redone,
      description: entry.description,
    });
    true
  }

  pub fn clear(&mut self) {
    self.undo_stack.clear();
    self.redo_stack.clear();
  }

  pub fn undo_depth(&self) -> usize {
    self.undo_stack.len()
  }

  pub fn redo_depth(&self) -> usize {
    self.redo_stack.len()
  }

  /// Descriptions of the recorded actions, oldest first.
  pub fn descriptions(&self) -> impl Iterator<Item = &str> {
    self.undo_stack.iter().map(|entry| entry.description.as_str())
  }
}
