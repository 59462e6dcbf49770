#![forbid(unsafe_code)]

//! The atomic on/off unit of a matrix.

use crate::color::Rgb;

/// One block of the matrix.
///
/// Coordinates come from build order and only drive ordering and
/// tie-breaking; pixel geometry belongs to the render sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub id: usize,
    pub column: usize,
    pub row: usize,
    pub active: bool,
    pub color: Rgb,
}

impl Cell {
    /// Inactive cell at the position implied by `id` in a grid `columns` wide.
    #[must_use]
    pub fn at(id: usize, columns: usize, color: Rgb) -> Self {
        Self {
            id,
            column: id % columns,
            row: id / columns,
            active: false,
            color,
        }
    }

    /// Snapshot of this cell's externally visible state.
    #[must_use]
    pub fn change(&self) -> CellChange {
        CellChange {
            id: self.id,
            column: self.column,
            row: self.row,
            active: self.active,
            color: self.color,
        }
    }
}

/// A single cell write, as delivered to a [`RenderSink`](crate::sink::RenderSink).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellChange {
    pub id: usize,
    pub column: usize,
    pub row: usize,
    pub active: bool,
    pub color: Rgb,
}
