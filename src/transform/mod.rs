//! 2D Fourier transform and windowing utilities over fields.
//!
//! The transform is a row-column decomposition on top of `rustfft`. The
//! forward direction is unnormalized; the backward direction divides by the
//! number of samples so that a forward/backward pair is the identity.

pub mod window;

use crate::field::ScalarField2D;
use crate::util::math::shifted_index;
use crate::util::{CorrError, CorrResult};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Direction of a 2D transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformDirection {
    Forward,
    Backward,
}

/// Planned transforms for one field size.
pub struct Fft2d {
    xres: usize,
    yres: usize,
    rows: Arc<dyn Fft<f64>>,
    cols: Arc<dyn Fft<f64>>,
    direction: TransformDirection,
}

impl Fft2d {
    pub fn new(xres: usize, yres: usize, direction: TransformDirection) -> Self {
        let mut planner = FftPlanner::new();
        let (rows, cols) = match direction {
            TransformDirection::Forward => {
                (planner.plan_fft_forward(xres), planner.plan_fft_forward(yres))
            }
            TransformDirection::Backward => {
                (planner.plan_fft_inverse(xres), planner.plan_fft_inverse(yres))
            }
        };
        Self {
            xres,
            yres,
            rows,
            cols,
            direction,
        }
    }

    /// Transforms a row-major `xres * yres` buffer in place.
    pub fn process(&self, buffer: &mut [Complex<f64>]) -> CorrResult<()> {
        let len = self.xres * self.yres;
        if buffer.len() != len {
            return Err(CorrError::BufferSizeMismatch {
                needed: len,
                got: buffer.len(),
            });
        }

        for row in buffer.chunks_exact_mut(self.xres) {
            self.rows.process(row);
        }

        let mut column = try_complex_buffer(self.yres)?;
        for col in 0..self.xres {
            for (row, slot) in column.iter_mut().enumerate() {
                *slot = buffer[row * self.xres + col];
            }
            self.cols.process(&mut column);
            for (row, value) in column.iter().enumerate() {
                buffer[row * self.xres + col] = *value;
            }
        }

        if self.direction == TransformDirection::Backward {
            let norm = 1.0 / len as f64;
            buffer.iter_mut().for_each(|v| *v *= norm);
        }
        Ok(())
    }
}

/// Allocates a zeroed complex buffer, reporting allocation failure.
pub(crate) fn try_complex_buffer(len: usize) -> CorrResult<Vec<Complex<f64>>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| CorrError::AllocationFailed { len })?;
    buffer.resize(len, Complex::new(0.0, 0.0));
    Ok(buffer)
}

/// Packs real and optional imaginary parts into a complex buffer.
pub(crate) fn to_complex(
    re: &ScalarField2D,
    im: Option<&ScalarField2D>,
) -> CorrResult<Vec<Complex<f64>>> {
    let mut buffer = try_complex_buffer(re.get_data().len())?;
    match im {
        Some(im) => {
            for ((slot, &r), &i) in buffer.iter_mut().zip(re.get_data()).zip(im.get_data()) {
                *slot = Complex::new(r, i);
            }
        }
        None => {
            for (slot, &r) in buffer.iter_mut().zip(re.get_data()) {
                slot.re = r;
            }
        }
    }
    Ok(buffer)
}

/// Transforms a field given as real and optional imaginary parts.
///
/// All fields must share dimensions.
pub fn fft2d(
    re_in: &ScalarField2D,
    im_in: Option<&ScalarField2D>,
    re_out: &mut ScalarField2D,
    im_out: &mut ScalarField2D,
    direction: TransformDirection,
) -> CorrResult<()> {
    let dims = re_in.get_dims();
    for (field, context) in [
        (im_in, "imaginary input"),
        (Some(&*re_out), "real output"),
        (Some(&*im_out), "imaginary output"),
    ] {
        if let Some(field) = field {
            if field.get_dims() != dims {
                return Err(CorrError::DimensionMismatch {
                    expected: dims,
                    got: field.get_dims(),
                    context,
                });
            }
        }
    }

    let mut buffer = to_complex(re_in, im_in)?;
    Fft2d::new(dims.0, dims.1, direction).process(&mut buffer)?;
    for ((re, im), value) in re_out
        .get_data_mut()
        .iter_mut()
        .zip(im_out.get_data_mut().iter_mut())
        .zip(&buffer)
    {
        *re = value.re;
        *im = value.im;
    }
    Ok(())
}

/// Circularly shifts a transform result so zero lag lands at
/// `(xres / 2, yres / 2)`.
pub fn humanize(field: &mut ScalarField2D) -> CorrResult<()> {
    let (xres, yres) = field.get_dims();
    let source = field.duplicate()?;
    let src = source.get_data();
    let dst = field.get_data_mut();
    for row in 0..yres {
        let drow = shifted_index(row, yres / 2, yres);
        for col in 0..xres {
            let dcol = shifted_index(col, xres / 2, xres);
            dst[drow * xres + dcol] = src[row * xres + col];
        }
    }
    Ok(())
}
