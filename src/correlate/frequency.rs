//! Frequency-domain correlation, plain and phase-only.
//!
//! The kernel is zero-padded to the data size with its top-left corner at
//! `(xres/2 - kxres/2, yres/2 - kyres/2)`. After the inverse transform and
//! humanization, the kernel placed with its top-left corner at data pixel
//! `(x, y)` scores at map pixel `(x + kxres/2, y + kyres/2)`. The output is
//! neither normalized nor clipped to `[-1, 1]`.

use crate::correlate::check_geometry;
use crate::field::ScalarField2D;
use crate::trace::{trace_event, trace_span};
use crate::transform::{humanize, to_complex, Fft2d, TransformDirection};
use crate::util::CorrResult;

/// Cross-power bins below this fraction of the largest magnitude are left
/// unscaled by phase-only correlation.
const POC_MAGNITUDE_EPS: f64 = 1e-12;

/// Computes the circular cross-correlation of `data` and `kernel` into `score`.
///
/// With `phase_only` set, every cross-power bin is divided by its magnitude
/// before the inverse transform.
pub fn correlate_frequency(
    data: &ScalarField2D,
    kernel: &ScalarField2D,
    score: &mut ScalarField2D,
    phase_only: bool,
) -> CorrResult<()> {
    check_geometry(data, kernel, Some(score))?;
    let (xres, yres) = data.get_dims();
    let (kxres, kyres) = kernel.get_dims();
    let _span = trace_span!(
        "correlate_frequency",
        xres = xres,
        yres = yres,
        phase_only = phase_only
    )
    .entered();

    let mut padded = data.new_alike()?;
    kernel.area_copy(
        &mut padded,
        0,
        0,
        kxres,
        kyres,
        xres / 2 - kxres / 2,
        yres / 2 - kyres / 2,
    )?;

    let mut spectrum = to_complex(data, None)?;
    let mut kernel_spectrum = to_complex(&padded, None)?;
    drop(padded);

    let forward = Fft2d::new(xres, yres, TransformDirection::Forward);
    forward.process(&mut spectrum)?;
    forward.process(&mut kernel_spectrum)?;

    // data * conj(kernel)
    for (d, k) in spectrum.iter_mut().zip(&kernel_spectrum) {
        *d *= k.conj();
    }
    drop(kernel_spectrum);

    if phase_only {
        let peak = spectrum.iter().map(|v| v.norm()).fold(0.0, f64::max);
        let floor = peak * POC_MAGNITUDE_EPS;
        for value in spectrum.iter_mut() {
            let magnitude = value.norm();
            if magnitude > floor {
                *value /= magnitude;
            }
        }
    }

    Fft2d::new(xres, yres, TransformDirection::Backward).process(&mut spectrum)?;
    for (out, value) in score.get_data_mut().iter_mut().zip(&spectrum) {
        *out = value.re;
    }
    humanize(score)?;

    trace_event!("frequency_correlation_done", pixels = xres * yres);
    Ok(())
}
