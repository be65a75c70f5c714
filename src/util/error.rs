//! Error types for surfcorr.

use thiserror::Error;

/// Result alias for surfcorr operations.
pub type CorrResult<T> = std::result::Result<T, CorrError>;

/// Errors that can occur when setting up or running a correlation.
///
/// Scoring primitives never return these; they report invalid geometry and
/// degenerate windows through sentinel scores instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorrError {
    /// A field was requested with a zero dimension.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// A buffer length does not match `width * height`.
    #[error("buffer size mismatch: needed {needed}, got {got}")]
    BufferSizeMismatch { needed: usize, got: usize },
    /// Physical extents must be finite and positive.
    #[error("invalid physical extent: {xreal} x {yreal}")]
    InvalidExtent { xreal: f64, yreal: f64 },
    /// The kernel or comparison window does not fit into the data field.
    #[error(
        "kernel {kernel_width}x{kernel_height} does not fit into field {width}x{height}"
    )]
    KernelTooLarge {
        kernel_width: usize,
        kernel_height: usize,
        width: usize,
        height: usize,
    },
    /// Two fields that must share dimensions do not.
    #[error("{context}: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        got: (usize, usize),
        context: &'static str,
    },
    /// Weights were changed after the job left its initial state.
    #[error("weights can only be set before the first iteration")]
    WeightsLocked,
    /// A scratch or output buffer could not be allocated.
    #[error("allocation of {len} samples failed")]
    AllocationFailed { len: usize },
    /// The input parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image decoding failed.
    #[cfg(feature = "image-io")]
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
