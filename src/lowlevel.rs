//! Low-level building blocks for custom correlation pipelines.
//!
//! These expose the point-wise scorers, the windowed statistics and the
//! Fourier helpers the engines are built from. Most users should prefer the
//! top-level `correlate` and `crosscorrelate` entry points.

pub use crate::score::{
    correlation_score, raw_correlation_score, weighted_correlation_score, Placement,
    INVALID_SCORE, INVALID_WEIGHTS_SCORE,
};
pub use crate::stats::{area_gather, AreaStatistics};
pub use crate::transform::window::{window_field, Orientation};
pub use crate::transform::{fft2d, humanize, Fft2d, TransformDirection};
