//! Full-field correlation of a data field with a kernel.
//!
//! Three methods produce a score map the size of the data field:
//!
//! - [`CorrelationMethod::Spatial`] evaluates the normalized score at every
//!   position where the kernel fits. Sample `((kxres-1)/2, (kyres-1)/2)` of
//!   the map corresponds to the kernel's top-left corner sitting on the data's
//!   top-left corner; positions where the kernel does not fit hold `-1`.
//! - [`CorrelationMethod::Fft`] computes the unnormalized circular
//!   cross-correlation through the frequency domain.
//! - [`CorrelationMethod::PhaseOnlyCorrelation`] does the same with the
//!   cross-power spectrum reduced to unit magnitude, which sharpens the peak.
//!
//! The spatial cost grows with the kernel area, the frequency cost does not,
//! so the frequency methods win once the kernel approaches the data size.

mod frequency;
mod spatial;

pub use frequency::correlate_frequency;
pub use spatial::{correlate_spatial, CorrelationJob};

use crate::field::ScalarField2D;
use crate::util::{CorrError, CorrResult};

/// Correlation algorithm selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CorrelationMethod {
    #[default]
    Spatial,
    Fft,
    PhaseOnlyCorrelation,
}

/// Computes the correlation map of `data` with `kernel` into `score`.
///
/// `score` must have the data's dimensions.
pub fn correlate(
    data: &ScalarField2D,
    kernel: &ScalarField2D,
    score: &mut ScalarField2D,
    method: CorrelationMethod,
) -> CorrResult<()> {
    match method {
        CorrelationMethod::Spatial => correlate_spatial(data, kernel, score),
        CorrelationMethod::Fft => correlate_frequency(data, kernel, score, false),
        CorrelationMethod::PhaseOnlyCorrelation => correlate_frequency(data, kernel, score, true),
    }
}

/// Picks the cheaper method for a data/kernel pair.
///
/// Kernels covering at least a quarter of the data area go through the
/// frequency domain.
pub fn preferred_method(data: &ScalarField2D, kernel: &ScalarField2D) -> CorrelationMethod {
    let data_area = data.xres() * data.yres();
    let kernel_area = kernel.xres() * kernel.yres();
    if 4 * kernel_area >= data_area {
        CorrelationMethod::Fft
    } else {
        CorrelationMethod::Spatial
    }
}

/// Checks that the kernel fits and, if given, that the output matches the data.
pub(crate) fn check_geometry(
    data: &ScalarField2D,
    kernel: &ScalarField2D,
    score: Option<&ScalarField2D>,
) -> CorrResult<()> {
    let (xres, yres) = data.get_dims();
    let (kxres, kyres) = kernel.get_dims();
    if kxres > xres || kyres > yres {
        return Err(CorrError::KernelTooLarge {
            kernel_width: kxres,
            kernel_height: kyres,
            width: xres,
            height: yres,
        });
    }
    if let Some(score) = score {
        if score.get_dims() != (xres, yres) {
            return Err(CorrError::DimensionMismatch {
                expected: (xres, yres),
                got: score.get_dims(),
                context: "score field",
            });
        }
    }
    Ok(())
}
