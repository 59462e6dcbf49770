#![forbid(unsafe_code)]

//! Terminal adapter: draws cell notifications as colored blocks.
//!
//! Each cell occupies [`CELL_WIDTH`] columns and one line, with a one-column
//! gap between cells and a blank line between rows. Line 0 is left for the
//! status text.

use std::io::{self, Write};

use blockmatrix_core::{CellChange, RenderSink};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use tracing::warn;

/// Width of one block in terminal columns.
pub const CELL_WIDTH: u16 = 3;
const CELL_PITCH_X: u16 = CELL_WIDTH + 1;
const CELL_PITCH_Y: u16 = 2;
const TOP: u16 = 2;

/// Screen position of a cell's top-left corner.
#[must_use]
pub fn cell_origin(column: usize, row: usize) -> (u16, u16) {
    let x = (column as u16).saturating_mul(CELL_PITCH_X);
    let y = TOP.saturating_add((row as u16).saturating_mul(CELL_PITCH_Y));
    (x, y)
}

/// Line just below the matrix.
#[must_use]
pub fn footer_line(rows: usize) -> u16 {
    cell_origin(0, rows).1
}

/// [`RenderSink`] that paints cells onto a terminal.
pub struct TerminalSink<W: Write + Send> {
    out: W,
    failed: bool,
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, failed: false }
    }

    fn draw(&mut self, change: CellChange) -> io::Result<()> {
        let (x, y) = cell_origin(change.column, change.row);
        let color = Color::Rgb {
            r: change.color.r,
            g: change.color.g,
            b: change.color.b,
        };
        queue!(
            self.out,
            MoveTo(x, y),
            SetBackgroundColor(color),
            Print(" ".repeat(CELL_WIDTH as usize)),
            ResetColor
        )?;
        self.out.flush()
    }

    fn report(&mut self, result: io::Result<()>) {
        // Log the first failure only; a broken terminal would otherwise
        // produce one warning per cell write.
        if let Err(err) = result
            && !self.failed
        {
            self.failed = true;
            warn!(%err, "terminal write failed");
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> RenderSink for TerminalSink<W> {
    fn on_cell_state_changed(&mut self, change: CellChange) {
        let result = self.draw(change);
        self.report(result);
    }

    fn on_grid_built(&mut self, _columns: usize, _rows: usize) {
        let result = execute!(self.out, Clear(ClearType::All));
        self.report(result);
    }
}

/// Write a status line at `line`, replacing whatever was there.
pub fn write_status<W: Write>(out: &mut W, line: u16, text: &str) -> io::Result<()> {
    queue!(
        out,
        MoveTo(0, line),
        Clear(ClearType::CurrentLine),
        Print(text)
    )?;
    out.flush()
}

/// RAII guard for the alternate screen with a hidden cursor.
///
/// Only [`enter`](Self::enter) constructs it, so a live guard always has a
/// screen to restore.
#[must_use = "dropping the session leaves the alternate screen"]
pub struct TerminalSession {
    _private: (),
}

impl TerminalSession {
    pub fn enter() -> io::Result<Self> {
        execute!(io::stdout(), EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), ResetColor, Show, LeaveAlternateScreen);
    }
}
