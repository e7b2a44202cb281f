//! Error types for the union functions.

use arrow_schema::ArrowError;
use thiserror::Error;

/// Union errors.
#[derive(Error, Debug)]
pub enum UnionError {
    /// Input shape does not match the nested polygon/ring/coordinate-pair
    /// structure.  Raised before any geometric work.
    #[error("format error: {0}")]
    Format(String),

    /// A ring that cannot be repaired, a strict-mode self-intersection, or a
    /// spherical case the engine does not support (poles, bad latitudes).
    #[error("invalid geometry: {0}")]
    GeometryValidity(String),

    /// NaN or infinite coordinate.
    #[error("numeric error: {0}")]
    Numeric(String),

    /// Topology could not be reconstructed after the overlay (should not
    /// happen for validated input).
    #[error("internal union error: {0}")]
    AlgorithmInternal(String),

    /// An error raised while processing a specific row.
    #[error("row {row}: {source}")]
    Row { row: usize, source: Box<UnionError> },

    /// Output column construction failed.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Configuration could not be read or is out of range.
    #[error("configuration error: {0}")]
    Config(String),
}

impl UnionError {
    /// Attach a row index, unless one is already attached.
    pub fn at_row(self, row: usize) -> Self {
        match self {
            UnionError::Row { .. } => self,
            other => UnionError::Row { row, source: Box::new(other) },
        }
    }

    /// The error without any row wrapper.
    pub fn root(&self) -> &UnionError {
        match self {
            UnionError::Row { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether a row-level policy may substitute an empty result for this
    /// error instead of failing the batch.  Only bad data qualifies; format
    /// problems and internal faults always abort.
    pub fn is_row_recoverable(&self) -> bool {
        matches!(self.root(), UnionError::GeometryValidity(_) | UnionError::Numeric(_))
    }
}

/// Result type for union operations.
pub type Result<T> = std::result::Result<T, UnionError>;
