#![forbid(unsafe_code)]

//! Ordered cell collection with positional indexing.
//!
//! # Invariants
//!
//! 1. `cells.len() == columns * rows` at all times.
//! 2. Cell ids are `0..len` in row-major build order (column varies fastest).
//! 3. Every write to a cell is forwarded to the sink exactly once, in order.
//! 4. Cells are never removed individually; `build` replaces the sequence.

use std::fmt;

use tracing::debug;

use crate::cell::{Cell, CellChange};
use crate::color::{Palette, Rgb};
use crate::error::{BlockMatrixError, Result};
use crate::sink::{NullSink, RenderSink};
use crate::usage::Usage;

/// Default column count of a freshly configured matrix.
pub const DEFAULT_COLUMNS: usize = 19;
/// Default row count of a freshly configured matrix.
pub const DEFAULT_ROWS: usize = 4;

/// The fixed-size matrix of cells.
pub struct Grid {
    columns: usize,
    rows: usize,
    cells: Vec<Cell>,
    palette: Palette,
    built: bool,
    sink: Box<dyn RenderSink>,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .field("built", &self.built)
            .field("active", &self.active_count())
            .field("palette", &self.palette)
            .finish()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(NullSink)
    }
}

impl Grid {
    /// Create an unbuilt grid that reports writes to `sink`.
    #[must_use]
    pub fn new(sink: impl RenderSink + 'static) -> Self {
        Self {
            columns: 0,
            rows: 0,
            cells: Vec::new(),
            palette: Palette::default(),
            built: false,
            sink: Box::new(sink),
        }
    }

    /// Set the palette used for subsequent writes.
    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Replace the cell sequence with `columns * rows` inactive cells.
    ///
    /// A zero-sized grid is valid and counts as built.
    pub fn build(&mut self, columns: usize, rows: usize) -> Result<()> {
        let len = columns.checked_mul(rows).ok_or_else(|| {
            BlockMatrixError::invalid(
                "columns*rows",
                format!("{columns}x{rows}"),
                "grid size overflows usize",
            )
        })?;
        let _span = tracing::debug_span!("grid_build", columns, rows).entered();

        let mut cells = Vec::new();
        cells.try_reserve_exact(len).map_err(|err| {
            BlockMatrixError::invalid(
                "columns*rows",
                format!("{columns}x{rows}"),
                err.to_string(),
            )
        })?;
        let off = self.palette.off;
        cells.extend((0..len).map(|id| Cell::at(id, columns, off)));

        self.columns = columns;
        self.rows = rows;
        self.cells = cells;
        self.built = true;

        self.sink.on_grid_built(columns, rows);
        for cell in &self.cells {
            self.sink.on_cell_state_changed(cell.change());
        }
        debug!(cells = len, "grid built");
        Ok(())
    }

    /// Whether `build` has completed at least once.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.built
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Change the palette. Existing cells keep their color until next written.
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Cells in build order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn cell(&self, id: usize) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// Visit every cell in build order.
    pub fn for_each(&self, visitor: impl FnMut(&Cell)) {
        self.cells.iter().for_each(visitor);
    }

    /// Count cells matching `predicate`.
    #[must_use]
    pub fn count(&self, mut predicate: impl FnMut(&Cell) -> bool) -> usize {
        self.cells.iter().filter(|c| predicate(c)).count()
    }

    /// Cells matching `predicate`, in build order.
    pub fn cells_where<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = &'a Cell> + 'a
    where
        P: FnMut(&Cell) -> bool + 'a,
    {
        self.cells.iter().filter(move |c| predicate(c))
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.count(|c| c.active)
    }

    /// Active flags in build order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<bool> {
        self.cells.iter().map(|c| c.active).collect()
    }

    /// Write one cell and notify the sink.
    pub fn set_cell(&mut self, id: usize, active: bool, color: Rgb) -> Result<()> {
        if id >= self.cells.len() {
            return Err(BlockMatrixError::invalid(
                "id",
                id,
                format!("cell id out of range (len {})", self.cells.len()),
            ));
        }
        self.write(id, active, color);
        Ok(())
    }

    /// Write one cell using the palette color for its new state.
    pub fn set_active(&mut self, id: usize, active: bool) -> Result<()> {
        self.set_cell(id, active, self.palette.color_for(active))
    }

    /// Rewrite every cell in build order with the state `f` returns for it.
    pub fn update_each(&mut self, mut f: impl FnMut(&Cell) -> (bool, Rgb)) {
        for index in 0..self.cells.len() {
            let (active, color) = f(&self.cells[index]);
            self.write(index, active, color);
        }
    }

    /// Turn every cell off.
    pub fn clear(&mut self) {
        let off = self.palette.off;
        self.update_each(|_| (false, off));
    }

    /// Current usage metric.
    pub fn usage(&self) -> Result<Usage> {
        Usage::from_counts(self.active_count(), self.len())
    }

    fn write(&mut self, index: usize, active: bool, color: Rgb) {
        let cell = &mut self.cells[index];
        cell.active = active;
        cell.color = color;
        let change: CellChange = cell.change();
        self.sink.on_cell_state_changed(change);
    }
}
