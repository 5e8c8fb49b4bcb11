//! Error types for term-to-term runs.
//!
//! Configuration errors abort a run before anything is written. The remaining
//! kinds abort the pass (one tag's workbook) they occur in.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for t2t operations.
pub type Result<T> = std::result::Result<T, T2tError>;

#[derive(Error, Debug)]
pub enum T2tError {
    /// Missing `tfd.home`, unknown frequency type, bad option combination.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed frequency-distribution line or bin-count mismatch.
    #[error("format error in {path}:{line}: {reason}")]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A file or term required by the current pass is absent.
    #[error("missing data: {0}")]
    MissingData(String),

    /// Zero document frequency or an empty index where a value is required.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Two vectors of a single pass were built with different bin counts.
    #[error("dimension mismatch: {left} bins vs {right} bins")]
    DimensionMismatch { left: usize, right: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl T2tError {
    /// Format error for a line that is not tied to a file (e.g. parsed from memory).
    pub fn format(reason: impl Into<String>) -> Self {
        T2tError::Format {
            path: PathBuf::from("<input>"),
            line: 0,
            reason: reason.into(),
        }
    }

    /// Attach a file location to a format error raised by a line parser.
    pub fn at(self, path: &std::path::Path, line: usize) -> Self {
        match self {
            T2tError::Format { reason, .. } => T2tError::Format {
                path: path.to_path_buf(),
                line,
                reason,
            },
            other => other,
        }
    }

    /// True if this error must stop the whole run rather than a single pass.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, T2tError::Configuration(_))
    }
}
