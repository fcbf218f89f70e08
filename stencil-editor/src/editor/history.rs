// Undo/redo history module for the editor.
//
// Linear history of whole-canvas snapshots. `cursor` points at the entry that
// matches what is on screen; undo/redo only move the cursor, and the next
// snapshot drops everything after it.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::Canvas;
use tracing::{debug, trace};

pub const DEFAULT_MAX_STATES: usize = 20;

/// Immutable copy of the canvas at one point in time.
pub type HistoryEntry = Arc<Canvas>;

#[derive(Debug, Clone)]
pub struct History {
    states: VecDeque<HistoryEntry>,
    cursor: Option<usize>,
    max_states: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STATES)
    }
}

impl History {
    pub fn new(max_states: usize) -> Self {
        let max_states = max_states.max(1);
        Self {
            states: VecDeque::with_capacity(max_states),
            cursor: None,
            max_states,
        }
    }

    /// Record `canvas` as the newest state, discarding any redo entries.
    pub fn snapshot(&mut self, canvas: &Canvas) {
        if let Some(cursor) = self.cursor {
            let dropped = self.states.len() - (cursor + 1);
            if dropped > 0 {
                trace!(dropped, "discarding redo entries");
            }
            self.states.truncate(cursor + 1);
        }

        self.states.push_back(Arc::new(canvas.clone()));

        while self.states.len() > self.max_states {
            self.states.pop_front();
            trace!("evicted oldest history entry");
        }

        self.cursor = Some(self.states.len() - 1);
        debug!(
            len = self.states.len(),
            cursor = self.states.len() - 1,
            "history snapshot"
        );
    }

    /// Step back. `None` at the oldest entry (or when empty).
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let cursor = self.cursor?;
        if cursor == 0 {
            trace!("undo at oldest entry ignored");
            return None;
        }

        self.cursor = Some(cursor - 1);
        debug!(cursor = cursor - 1, len = self.states.len(), "undo");
        self.states.get(cursor - 1).cloned()
    }

    /// Step forward. `None` at the newest entry (or when empty).
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let cursor = self.cursor?;
        if cursor + 1 >= self.states.len() {
            trace!("redo at newest entry ignored");
            return None;
        }

        self.cursor = Some(cursor + 1);
        debug!(cursor = cursor + 1, len = self.states.len(), "redo");
        self.states.get(cursor + 1).cloned()
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|c| self.states.get(c))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn max_states(&self) -> usize {
        self.max_states
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.states.len())
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.states.iter()
    }

    pub fn clear(&mut self) {
        debug!(dropped = self.states.len(), "clearing history");
        self.states.clear();
        self.cursor = None;
    }
}
