//! Error types for pmbp.

use thiserror::Error;

/// Result alias for pmbp operations.
pub type PmbpResult<T> = std::result::Result<T, PmbpError>;

/// Errors that can occur when building or running a particle graph.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PmbpError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Width or height is zero or overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is too small for the requested layout.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A particle-field file starts with a tag no model recognises.
    #[error("unknown application tag {tag:#04x}")]
    UnknownApplication { tag: u8 },
    /// A particle-field file was written by a different model.
    #[error("model mismatch: expected '{expected}', found '{found}'")]
    ModelMismatch { expected: char, found: char },
    /// A particle-field file does not fit the engine it is imported into.
    #[error("field mismatch in {context}: expected {expected}, found {found}")]
    FieldMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },
    /// Reading or writing a stream failed.
    #[error("i/o error: {reason}")]
    Io { reason: String },
    /// Image decoding or encoding failed.
    #[error("image i/o error: {reason}")]
    ImageIo { reason: String },
}

impl From<std::io::Error> for PmbpError {
    fn from(err: std::io::Error) -> Self {
        PmbpError::Io {
            reason: err.to_string(),
        }
    }
}
