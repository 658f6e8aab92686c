//! Error types for pdfcarve.

use std::collections::TryReserveError;

use thiserror::Error;

/// Primary error type for scanning and decoding operations.
#[derive(Error, Debug)]
pub enum CarveError {
    /// A buffer could not grow to the requested size.
    #[error("allocation of {requested} bytes failed")]
    AllocationFailure { requested: usize },

    /// Malformed input for one object or one decode stage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Normal end of iteration or of a byte range.
    #[error("end of data")]
    EndOfData,

    /// The whole file was rejected at open time.
    #[error("not a recognizable PDF: {0}")]
    FormatMismatch(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CarveError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    pub(crate) fn alloc(requested: usize, _source: TryReserveError) -> Self {
        Self::AllocationFailure { requested }
    }

    /// Whether the scanner may drop the current object and keep going.
    ///
    /// Structural and decode errors are local to one object; allocation,
    /// I/O and format errors are reported to the caller.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidData(_) | Self::EndOfData)
    }
}

/// Convenience Result type alias for CarveError.
pub type Result<T> = std::result::Result<T, CarveError>;
