#![forbid(unsafe_code)]

//! Error type shared by the grid, fill engine, and usage metric.

use std::fmt;

/// Errors surfaced by BlockMatrix operations.
///
/// Every variant is raised before any cell is touched, so a rejected call
/// never leaves a partial mutation behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockMatrixError {
    /// A caller-supplied value lies outside its domain.
    InvalidConfiguration {
        field: &'static str,
        value: String,
        message: String,
    },
    /// Usage was requested for a grid with no cells.
    EmptyGridMetric,
    /// A fill reached a grid that has not been built yet.
    NotReady,
}

impl BlockMatrixError {
    pub(crate) fn invalid(
        field: &'static str,
        value: impl fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidConfiguration {
            field,
            value: value.to_string(),
            message: message.into(),
        }
    }

    /// Whether this is an [`InvalidConfiguration`](Self::InvalidConfiguration) error.
    #[must_use]
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }
}

impl fmt::Display for BlockMatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration {
                field,
                value,
                message,
            } => write!(f, "invalid configuration: {field}={value} ({message})"),
            Self::EmptyGridMetric => write!(f, "usage is undefined for a grid with no cells"),
            Self::NotReady => write!(f, "grid has not been built"),
        }
    }
}

impl std::error::Error for BlockMatrixError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BlockMatrixError>;
