#![forbid(unsafe_code)]

//! One step of the randomized activity animation.
//!
//! Each tick draws a fresh integer in `1..=255` for every cell; a draw at or
//! below the off bias switches the cell off, anything above switches it on.
//! The bias therefore counts *against* activity: 0 lights every cell, 255
//! darkens every cell, and the default `0xC0` leaves roughly a quarter on.

use rand::Rng;

use crate::error::Result;
use crate::grid::Grid;
use crate::usage::Usage;

/// Default off bias (`0xC0`).
pub const DEFAULT_OFF_BIAS: u8 = 0xC0;

/// Probability that a single cell ends a tick switched on.
#[must_use]
pub fn on_probability(off_bias: u8) -> f64 {
    f64::from(255 - off_bias) / 255.0
}

/// Randomize every cell of `grid` and return the resulting usage.
///
/// An empty grid is left untouched and reports
/// [`BlockMatrixError::EmptyGridMetric`](crate::error::BlockMatrixError::EmptyGridMetric).
pub fn randomize_tick<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R, off_bias: u8) -> Result<Usage> {
    let palette = grid.palette();
    grid.update_each(|_| {
        let draw: u8 = rng.random_range(1..=255);
        let active = draw > off_bias;
        (active, palette.color_for(active))
    });
    grid.usage()
}
