#![forbid(unsafe_code)]

//! Core: cell grid, fill strategies, activity tick, and usage metric.
//!
//! # Role in BlockMatrix
//! `blockmatrix-core` holds all the state and policy of a block matrix and
//! none of the timing. A [`Grid`] of [`Cell`]s is mutated either by the
//! [`FillEngine`] (progress display) or by [`randomize_tick`] (activity
//! animation), and every write is forwarded to a [`RenderSink`].
//!
//! # How it fits in the system
//! `blockmatrix-runtime` wraps a grid and engine behind a single mutation
//! gate, defers fills until the grid is built, and drives the activity tick
//! from a background thread. This crate is synchronous and thread-agnostic.
//!
//! # Example
//!
//! ```
//! use blockmatrix_core::{FillEngine, FillStrategy, Grid};
//!
//! let mut grid = Grid::default();
//! grid.build(19, 4).unwrap();
//! let mut engine = FillEngine::with_seed(FillStrategy::Straight, 0);
//! engine.fill(&mut grid, 50).unwrap();
//! assert_eq!(grid.active_count(), 38);
//! assert_eq!(grid.usage().unwrap().label(), "50 %");
//! ```

pub mod activity;
pub mod cell;
pub mod color;
pub mod config;
pub mod error;
pub mod fill;
pub mod grid;
pub mod sink;
pub mod usage;

pub use activity::{DEFAULT_OFF_BIAS, randomize_tick};
pub use cell::{Cell, CellChange};
pub use color::{Palette, Rgb};
pub use config::{ConfigError, ConfigParse, MatrixConfig};
pub use error::{BlockMatrixError, Result};
pub use fill::{FillEngine, FillOutcome, FillRequest, FillStrategy, target_count, validate_percent};
pub use grid::{DEFAULT_COLUMNS, DEFAULT_ROWS, Grid};
pub use sink::{NullSink, RecordingSink, RenderSink};
pub use usage::Usage;
