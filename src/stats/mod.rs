//! Windowed mean/RMS maps computed with summed-area tables.
//!
//! Every output pixel describes the `width x height` window that extends
//! `(width - 1) / 2` pixels to the left and `(height - 1) / 2` pixels up from
//! it, so odd windows are centered and even windows reach one pixel further
//! right and down. Near the border the window is clipped and only in-bound
//! samples are averaged.
//!
//! The tables are built over samples with a pivot value (the first sample)
//! subtracted. This keeps the `<z^2> - <z>^2` cancellation small and makes
//! constant fields produce an RMS of exactly zero.

use crate::field::{try_zeroed, ScalarField2D};
use crate::trace::trace_span;
use crate::util::{CorrError, CorrResult};

/// Inclusive prefix sums with a zero guard row and column.
struct SummedAreaTable {
    stride: usize,
    sums: Vec<f64>,
}

impl SummedAreaTable {
    fn build(field: &ScalarField2D, value: impl Fn(f64) -> f64) -> CorrResult<Self> {
        let (xres, yres) = field.get_dims();
        let stride = xres + 1;
        let mut sums = try_zeroed(stride * (yres + 1))?;
        let data = field.get_data();
        for row in 0..yres {
            let mut row_sum = 0.0;
            for col in 0..xres {
                row_sum += value(data[row * xres + col]);
                sums[(row + 1) * stride + col + 1] = sums[row * stride + col + 1] + row_sum;
            }
        }
        Ok(Self { stride, sums })
    }

    /// Sum over the half-open rectangle `[c0, c1) x [r0, r1)`.
    fn rect_sum(&self, c0: usize, r0: usize, c1: usize, r1: usize) -> f64 {
        let s = self.stride;
        self.sums[r1 * s + c1] - self.sums[r0 * s + c1] - self.sums[r1 * s + c0]
            + self.sums[r0 * s + c0]
    }
}

/// Clipped window bounds along one axis for output index `pos`.
fn window_span(pos: usize, size: usize, res: usize) -> (usize, usize) {
    let back = (size - 1) / 2;
    let start = pos.saturating_sub(back);
    let end = (pos + size - back).min(res);
    (start, end)
}

fn check_window(field: &ScalarField2D, width: usize, height: usize) -> CorrResult<()> {
    if width == 0 || height == 0 {
        return Err(CorrError::InvalidDimensions { width, height });
    }
    let (xres, yres) = field.get_dims();
    if width > xres || height > yres {
        return Err(CorrError::KernelTooLarge {
            kernel_width: width,
            kernel_height: height,
            width: xres,
            height: yres,
        });
    }
    Ok(())
}

/// Sums (or averages, when `average` is set) each pixel's window.
pub fn area_gather(
    field: &ScalarField2D,
    width: usize,
    height: usize,
    average: bool,
) -> CorrResult<ScalarField2D> {
    check_window(field, width, height)?;
    let (xres, yres) = field.get_dims();
    let table = SummedAreaTable::build(field, |v| v)?;
    let mut out = field.new_alike()?;
    let out_data = out.get_data_mut();
    for row in 0..yres {
        let (r0, r1) = window_span(row, height, yres);
        for col in 0..xres {
            let (c0, c1) = window_span(col, width, xres);
            let sum = table.rect_sum(c0, r0, c1, r1);
            out_data[row * xres + col] = if average {
                sum / ((c1 - c0) * (r1 - r0)) as f64
            } else {
                sum
            };
        }
    }
    Ok(out)
}

/// Per-pixel window mean and RMS of a field.
pub struct AreaStatistics {
    avg: ScalarField2D,
    rms: ScalarField2D,
}

impl AreaStatistics {
    /// Computes the mean and RMS maps for `width x height` windows.
    pub fn compute(field: &ScalarField2D, width: usize, height: usize) -> CorrResult<Self> {
        check_window(field, width, height)?;
        let (xres, yres) = field.get_dims();
        let _span = trace_span!("area_statistics", xres = xres, yres = yres).entered();

        let pivot = field.get_data()[0];
        let first = SummedAreaTable::build(field, |v| v - pivot)?;
        let second = SummedAreaTable::build(field, |v| (v - pivot) * (v - pivot))?;

        let mut avg = field.new_alike()?;
        let mut rms = field.new_alike()?;
        let avg_data = avg.get_data_mut();
        let rms_data = rms.get_data_mut();
        for row in 0..yres {
            let (r0, r1) = window_span(row, height, yres);
            for col in 0..xres {
                let (c0, c1) = window_span(col, width, xres);
                let count = ((c1 - c0) * (r1 - r0)) as f64;
                let mean = first.rect_sum(c0, r0, c1, r1) / count;
                let mean_sq = second.rect_sum(c0, r0, c1, r1) / count;
                let k = row * xres + col;
                avg_data[k] = pivot + mean;
                rms_data[k] = (mean_sq - mean * mean).max(0.0).sqrt();
            }
        }

        Ok(Self { avg, rms })
    }

    /// Window mean map.
    pub fn avg(&self) -> &ScalarField2D {
        &self.avg
    }

    /// Window RMS map.
    pub fn rms(&self) -> &ScalarField2D {
        &self.rms
    }

    /// Mean and RMS at a linear pixel index.
    pub(crate) fn at(&self, index: usize) -> (f64, f64) {
        (self.avg.get_data()[index], self.rms.get_data()[index])
    }

    pub fn into_fields(self) -> (ScalarField2D, ScalarField2D) {
        (self.avg, self.rms)
    }
}
