//! Point-wise correlation scores between two equally sized windows.
//!
//! Scores are Pearson-style coefficients in `[-1, 1]`. The scoring functions
//! never fail: geometry that does not fit either field yields
//! [`INVALID_SCORE`], a window without variance yields `0.0`, and a weighted
//! score with unusable weights yields [`INVALID_WEIGHTS_SCORE`].

use crate::field::ScalarField2D;
use crate::util::math::clamp_unit;

/// Sentinel returned when a window does not fit into its field.
pub const INVALID_SCORE: f64 = -1.0;

/// Sentinel returned by the weighted score when the weights do not match the
/// window size or do not sum to a positive value. It lies outside `[-1, 1]`.
pub const INVALID_WEIGHTS_SCORE: f64 = -10.0;

/// Returns `true` when every sample equals the first one.
///
/// A mean that is not exactly representable leaves a residual RMS of a few
/// ulps on constant data, so flatness is decided on the samples themselves.
pub(crate) fn is_constant<'a>(rows: impl IntoIterator<Item = &'a [f64]>) -> bool {
    let mut first = None;
    rows.into_iter()
        .flatten()
        .all(|&v| *first.get_or_insert(v) == v)
}

/// Mean and RMS of a rectangle computed in two passes.
///
/// Constant rectangles report an RMS of exactly zero. Returns `None` when the
/// rectangle leaves the field.
pub(crate) fn exact_window_statistics(
    field: &ScalarField2D,
    col: usize,
    row: usize,
    width: usize,
    height: usize,
) -> Option<(f64, f64)> {
    let avg = field.area_avg(col, row, width, height)?;
    let data = field.get_data();
    let xres = field.xres();
    let rows = (row..row + height).map(|r| &data[r * xres + col..r * xres + col + width]);
    if is_constant(rows) {
        return Some((avg, 0.0));
    }
    Some((avg, field.area_rms(col, row, width, height)?))
}

/// Location of a comparison window in the data field and in the kernel field.
///
/// Positions are upper-left corners. They are signed so that candidates
/// hanging over the top or left border can be expressed and rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub col: isize,
    pub row: isize,
    pub kernel_col: isize,
    pub kernel_row: isize,
    pub width: usize,
    pub height: usize,
}

/// Placement resolved against concrete fields.
#[derive(Clone, Copy)]
struct Window {
    col: usize,
    row: usize,
    kcol: usize,
    krow: usize,
    width: usize,
    height: usize,
}

impl Placement {
    pub fn new(
        col: isize,
        row: isize,
        kernel_col: isize,
        kernel_row: isize,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            col,
            row,
            kernel_col,
            kernel_row,
            width,
            height,
        }
    }

    /// Compares the whole kernel with the data window at `(col, row)`.
    pub fn full_kernel(col: isize, row: isize, kernel: &ScalarField2D) -> Self {
        Self::new(col, row, 0, 0, kernel.xres(), kernel.yres())
    }

    fn resolve(&self, data: &ScalarField2D, kernel: &ScalarField2D) -> Option<Window> {
        let col = usize::try_from(self.col).ok()?;
        let row = usize::try_from(self.row).ok()?;
        let kcol = usize::try_from(self.kernel_col).ok()?;
        let krow = usize::try_from(self.kernel_row).ok()?;
        if !data.contains_area(col, row, self.width, self.height)
            || !kernel.contains_area(kcol, krow, self.width, self.height)
        {
            return None;
        }
        Some(Window {
            col,
            row,
            kcol,
            krow,
            width: self.width,
            height: self.height,
        })
    }
}

impl Window {
    fn data_row<'a>(&self, field: &'a ScalarField2D, j: usize) -> &'a [f64] {
        let start = (self.row + j) * field.xres() + self.col;
        &field.get_data()[start..start + self.width]
    }

    fn kernel_row<'a>(&self, field: &'a ScalarField2D, j: usize) -> &'a [f64] {
        let start = (self.krow + j) * field.xres() + self.kcol;
        &field.get_data()[start..start + self.width]
    }

    fn data_is_constant(&self, field: &ScalarField2D) -> bool {
        is_constant((0..self.height).map(|j| self.data_row(field, j)))
    }

    fn kernel_is_constant(&self, field: &ScalarField2D) -> bool {
        is_constant((0..self.height).map(|j| self.kernel_row(field, j)))
    }

    fn count(&self) -> f64 {
        (self.width * self.height) as f64
    }
}

/// Normalized correlation score of one placement.
///
/// Returns [`INVALID_SCORE`] if the window leaves either field and `0.0` if
/// either window is flat.
pub fn correlation_score(data: &ScalarField2D, kernel: &ScalarField2D, at: Placement) -> f64 {
    let Some(win) = at.resolve(data, kernel) else {
        return INVALID_SCORE;
    };
    if win.data_is_constant(data) || win.kernel_is_constant(kernel) {
        return 0.0;
    }

    let mut sum1 = 0.0;
    let mut sum2 = 0.0;
    for j in 0..win.height {
        sum1 += win.data_row(data, j).iter().sum::<f64>();
        sum2 += win.kernel_row(kernel, j).iter().sum::<f64>();
    }
    let n = win.count();
    let avg1 = sum1 / n;
    let avg2 = sum2 / n;

    let mut var1 = 0.0;
    let mut var2 = 0.0;
    let mut cov = 0.0;
    for j in 0..win.height {
        let drow = win.data_row(data, j);
        let krow = win.kernel_row(kernel, j);
        for (&d, &k) in drow.iter().zip(krow) {
            let a = d - avg1;
            let b = k - avg2;
            var1 += a * a;
            var2 += b * b;
            cov += a * b;
        }
    }

    let rms1 = (var1 / n).sqrt();
    let rms2 = (var2 / n).sqrt();
    if rms1 == 0.0 || rms2 == 0.0 {
        return 0.0;
    }

    clamp_unit(cov / (rms1 * rms2 * n))
}

/// Weighted normalized correlation score of one placement.
///
/// `weights` must have the window's size. Means, variances and the
/// covariance are all weighted, which lets an apodization window concentrate
/// the comparison on the window center.
pub fn weighted_correlation_score(
    data: &ScalarField2D,
    kernel: &ScalarField2D,
    weights: &ScalarField2D,
    at: Placement,
) -> f64 {
    if weights.get_dims() != (at.width, at.height) {
        return INVALID_WEIGHTS_SCORE;
    }
    let weight_sum = weights.sum();
    if weight_sum.is_nan() || weight_sum <= 0.0 {
        return INVALID_WEIGHTS_SCORE;
    }
    let Some(win) = at.resolve(data, kernel) else {
        return INVALID_SCORE;
    };
    if win.data_is_constant(data) || win.kernel_is_constant(kernel) {
        return 0.0;
    }

    let wdata = weights.get_data();
    let mut sum1 = 0.0;
    let mut sum2 = 0.0;
    for j in 0..win.height {
        let wrow = &wdata[j * win.width..(j + 1) * win.width];
        let drow = win.data_row(data, j);
        let krow = win.kernel_row(kernel, j);
        for ((&w, &d), &k) in wrow.iter().zip(drow).zip(krow) {
            sum1 += w * d;
            sum2 += w * k;
        }
    }
    let avg1 = sum1 / weight_sum;
    let avg2 = sum2 / weight_sum;

    let mut var1 = 0.0;
    let mut var2 = 0.0;
    let mut cov = 0.0;
    for j in 0..win.height {
        let wrow = &wdata[j * win.width..(j + 1) * win.width];
        let drow = win.data_row(data, j);
        let krow = win.kernel_row(kernel, j);
        for ((&w, &d), &k) in wrow.iter().zip(drow).zip(krow) {
            let a = d - avg1;
            let b = k - avg2;
            var1 += w * a * a;
            var2 += w * b * b;
            cov += w * a * b;
        }
    }

    let rms1 = (var1 / weight_sum).sqrt();
    let rms2 = (var2 / weight_sum).sqrt();
    if rms1 == 0.0 || rms2 == 0.0 {
        return 0.0;
    }

    clamp_unit(cov / (rms1 * rms2 * weight_sum))
}

/// Unnormalized score `sum((d - data_avg) * (k - kernel_avg)) / N`.
///
/// Dividing the result by both window RMS values gives the normalized score.
/// Used when the window statistics are already cached.
pub fn raw_correlation_score(
    data: &ScalarField2D,
    kernel: &ScalarField2D,
    at: Placement,
    data_avg: f64,
    kernel_avg: f64,
) -> f64 {
    let Some(win) = at.resolve(data, kernel) else {
        return INVALID_SCORE;
    };

    let mut score = 0.0;
    for j in 0..win.height {
        let drow = win.data_row(data, j);
        let krow = win.kernel_row(kernel, j);
        for (&d, &k) in drow.iter().zip(krow) {
            score += (d - data_avg) * (k - kernel_avg);
        }
    }
    score / win.count()
}
