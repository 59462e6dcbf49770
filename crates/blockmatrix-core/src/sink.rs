#![forbid(unsafe_code)]

//! Render sink: the only path from cell state to whatever draws it.
//!
//! The grid owns one sink and calls it once per cell write. Sinks are pure
//! consumers; nothing they do can feed state back into the grid.

use std::sync::{Arc, Mutex, PoisonError};

use crate::cell::CellChange;

/// Receiver of cell state notifications.
pub trait RenderSink: Send {
    /// A cell was written. Called once per write, in write order.
    fn on_cell_state_changed(&mut self, change: CellChange);

    /// The grid was (re)built with the given dimensions.
    ///
    /// Called before the per-cell notifications for the fresh cells.
    fn on_grid_built(&mut self, _columns: usize, _rows: usize) {}
}

impl<F> RenderSink for F
where
    F: FnMut(CellChange) + Send,
{
    fn on_cell_state_changed(&mut self, change: CellChange) {
        self(change);
    }
}

/// Sink that drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn on_cell_state_changed(&mut self, _change: CellChange) {}
}

#[derive(Debug, Default)]
struct RecordingInner {
    changes: Vec<CellChange>,
    builds: Vec<(usize, usize)>,
}

/// Sink that records notifications for later inspection.
///
/// Clones share the same log, so a test can keep one handle while the grid
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<RecordingInner>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All cell writes seen so far.
    #[must_use]
    pub fn changes(&self) -> Vec<CellChange> {
        self.lock().changes.clone()
    }

    /// Number of cell writes seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().changes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensions of every build seen so far.
    #[must_use]
    pub fn builds(&self) -> Vec<(usize, usize)> {
        self.lock().builds.clone()
    }

    /// Forget everything recorded so far.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.changes.clear();
        inner.builds.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordingInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RenderSink for RecordingSink {
    fn on_cell_state_changed(&mut self, change: CellChange) {
        self.lock().changes.push(change);
    }

    fn on_grid_built(&mut self, columns: usize, rows: usize) {
        self.lock().builds.push((columns, rows));
    }
}
