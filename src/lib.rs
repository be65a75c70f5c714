//! Surfcorr correlates 2D scalar fields such as height maps.
//!
//! The crate locates a kernel inside a data field (spatial, FFT or
//! phase-only correlation) and registers two fields of the same surface by
//! cross-correlation, reporting a per-point displacement field with sub-pixel
//! refinement. Every computation is available as a one-shot function and as a
//! resumable job driven by repeated `iterate()` calls.

pub mod correlate;
pub mod crosscorr;
pub mod field;
pub mod job;
pub mod lowlevel;
mod refine;
pub mod score;
pub mod stats;
mod trace;
pub mod transform;
pub mod util;

pub use correlate::{
    correlate, correlate_frequency, correlate_spatial, preferred_method, CorrelationJob,
    CorrelationMethod,
};
pub use crosscorr::{
    crosscorrelate, CrossCorrelationJob, CrossCorrelationOutputs, CrossCorrelationParams,
    CrossCorrelationResult,
};
pub use field::ScalarField2D;
pub use job::{run_to_completion, Computation, ComputationState, Progress};
pub use transform::window::Windowing;
pub use util::{CorrError, CorrResult};
