#![forbid(unsafe_code)]

//! Runtime: shared matrix handle, deferred fills, and the activity animator.
//!
//! # Role in BlockMatrix
//! `blockmatrix-runtime` puts a [`blockmatrix_core::Grid`] behind a single
//! mutation gate ([`BlockMatrix`]) and drives it from two directions:
//!
//! - **Progress**: [`BlockMatrix::set_value`] applies a fill strategy, or
//!   queues it until the grid is built.
//! - **Activity**: [`ActivityAnimator`] randomizes the grid on a fixed
//!   interval from a dedicated thread.
//!
//! Both paths take the same lock, so they are safe to run concurrently even
//! though a real display normally uses one or the other.
//!
//! # Example
//!
//! ```
//! use blockmatrix_core::{FillStrategy, NullSink};
//! use blockmatrix_runtime::{BlockMatrix, FillStatus};
//!
//! let matrix = BlockMatrix::new(NullSink);
//! matrix.set_strategy(FillStrategy::Bars);
//! // Issued before the grid exists: queued, not dropped.
//! assert!(matches!(matrix.set_value(25).unwrap(), FillStatus::Queued { .. }));
//! matrix.build(19, 4).unwrap();
//! assert_eq!(matrix.usage().unwrap().label(), "25 %");
//! ```

pub mod animator;
pub mod matrix;

pub use animator::{ActivityAnimator, AnimatorState, DEFAULT_INTERVAL};
pub use matrix::{BlockMatrix, FillStatus};
