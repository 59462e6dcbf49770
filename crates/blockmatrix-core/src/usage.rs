#![forbid(unsafe_code)]

//! Usage metric: share of active cells as a rounded percentage.

use std::fmt;

use crate::error::{BlockMatrixError, Result};

/// Derived usage of a grid.
///
/// `percent` is `round(active * 100 / total)` with halves rounded up,
/// computed in integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    active: usize,
    total: usize,
    percent: u8,
}

impl Usage {
    /// Compute usage from raw counts.
    ///
    /// Fails with [`BlockMatrixError::EmptyGridMetric`] when `total == 0`.
    pub fn from_counts(active: usize, total: usize) -> Result<Self> {
        if total == 0 {
            return Err(BlockMatrixError::EmptyGridMetric);
        }
        if active > total {
            return Err(BlockMatrixError::invalid(
                "active",
                active,
                format!("exceeds total {total}"),
            ));
        }
        let scaled = active as u128 * 200 + total as u128;
        let percent = (scaled / (total as u128 * 2)) as u8;
        Ok(Self {
            active,
            total,
            percent,
        })
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Rounded percentage in `0..=100`.
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// The `"<percent> %"` label shown next to the matrix.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} %", self.percent)
    }
}
