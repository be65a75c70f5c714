//! Owned scalar sample fields.
//!
//! `ScalarField2D` is a contiguous row-major grid of `f64` samples with a
//! physical size attached. The physical extents only matter when converting
//! pixel offsets to lateral distances; every algorithm in this crate works in
//! pixel coordinates.

use crate::util::{CorrError, CorrResult};

#[cfg(feature = "image-io")]
pub mod io;

/// Row-major 2D grid of samples with physical extents.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField2D {
    xres: usize,
    yres: usize,
    xreal: f64,
    yreal: f64,
    data: Vec<f64>,
}

impl ScalarField2D {
    /// Creates a zero-filled field.
    pub fn new(xres: usize, yres: usize, xreal: f64, yreal: f64) -> CorrResult<Self> {
        let len = checked_len(xres, yres)?;
        check_extent(xreal, yreal)?;
        let data = try_zeroed(len)?;
        Ok(Self {
            xres,
            yres,
            xreal,
            yreal,
            data,
        })
    }

    /// Wraps an existing buffer.
    pub fn from_vec(
        data: Vec<f64>,
        xres: usize,
        yres: usize,
        xreal: f64,
        yreal: f64,
    ) -> CorrResult<Self> {
        let needed = checked_len(xres, yres)?;
        if data.len() != needed {
            return Err(CorrError::BufferSizeMismatch {
                needed,
                got: data.len(),
            });
        }
        check_extent(xreal, yreal)?;
        Ok(Self {
            xres,
            yres,
            xreal,
            yreal,
            data,
        })
    }

    /// Wraps a buffer whose physical size equals its pixel size.
    pub fn from_pixels(data: Vec<f64>, xres: usize, yres: usize) -> CorrResult<Self> {
        Self::from_vec(data, xres, yres, xres as f64, yres as f64)
    }

    /// Returns `(xres, yres)`.
    pub fn get_dims(&self) -> (usize, usize) {
        (self.xres, self.yres)
    }

    pub fn xres(&self) -> usize {
        self.xres
    }

    pub fn yres(&self) -> usize {
        self.yres
    }

    /// Returns `(xreal, yreal)`.
    pub fn get_physical_extent(&self) -> (f64, f64) {
        (self.xreal, self.yreal)
    }

    /// Physical width of one pixel.
    pub fn dx(&self) -> f64 {
        self.xreal / self.xres as f64
    }

    /// Physical height of one pixel.
    pub fn dy(&self) -> f64 {
        self.yreal / self.yres as f64
    }

    pub fn get_data(&self) -> &[f64] {
        &self.data
    }

    pub fn get_data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Returns the sample at `(col, row)` if it is within bounds.
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.xres || row >= self.yres {
            return None;
        }
        self.data.get(row * self.xres + col).copied()
    }

    /// Sets the sample at `(col, row)`; returns `false` when out of bounds.
    pub fn set(&mut self, col: usize, row: usize, value: f64) -> bool {
        if col >= self.xres || row >= self.yres {
            return false;
        }
        self.data[row * self.xres + col] = value;
        true
    }

    /// Replaces the physical extent, keeping the samples.
    pub fn with_extent(mut self, xreal: f64, yreal: f64) -> CorrResult<Self> {
        check_extent(xreal, yreal)?;
        self.xreal = xreal;
        self.yreal = yreal;
        Ok(self)
    }

    /// Returns a deep copy, reporting allocation failure instead of aborting.
    pub fn duplicate(&self) -> CorrResult<Self> {
        let mut data = try_with_capacity(self.data.len())?;
        data.extend_from_slice(&self.data);
        Ok(Self {
            xres: self.xres,
            yres: self.yres,
            xreal: self.xreal,
            yreal: self.yreal,
            data,
        })
    }

    /// Returns a zero-filled field with the same dimensions and extents.
    pub fn new_alike(&self) -> CorrResult<Self> {
        Self::new(self.xres, self.yres, self.xreal, self.yreal)
    }

    /// Returns `true` when `other` has the same pixel dimensions.
    pub fn same_dims(&self, other: &ScalarField2D) -> bool {
        self.get_dims() == other.get_dims()
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    pub fn clear(&mut self) {
        self.fill(0.0);
    }

    /// Sum of all samples.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Mean of all samples.
    pub fn avg(&self) -> f64 {
        self.sum() / self.data.len() as f64
    }

    /// Root mean square deviation from the mean.
    pub fn rms(&self) -> f64 {
        let avg = self.avg();
        let sum_sq: f64 = self.data.iter().map(|&v| (v - avg) * (v - avg)).sum();
        (sum_sq / self.data.len() as f64).sqrt()
    }

    /// Sum over a rectangle, `None` if it is empty or leaves the field.
    pub fn area_sum(&self, col: usize, row: usize, width: usize, height: usize) -> Option<f64> {
        if !self.contains_area(col, row, width, height) {
            return None;
        }
        let mut sum = 0.0;
        for r in row..row + height {
            let start = r * self.xres + col;
            sum += self.data[start..start + width].iter().sum::<f64>();
        }
        Some(sum)
    }

    /// Mean over a rectangle.
    pub fn area_avg(&self, col: usize, row: usize, width: usize, height: usize) -> Option<f64> {
        self.area_sum(col, row, width, height)
            .map(|sum| sum / (width * height) as f64)
    }

    /// Root mean square deviation over a rectangle.
    pub fn area_rms(&self, col: usize, row: usize, width: usize, height: usize) -> Option<f64> {
        let avg = self.area_avg(col, row, width, height)?;
        let mut sum_sq = 0.0;
        for r in row..row + height {
            let start = r * self.xres + col;
            for &v in &self.data[start..start + width] {
                sum_sq += (v - avg) * (v - avg);
            }
        }
        Some((sum_sq / (width * height) as f64).sqrt())
    }

    /// Copies a rectangle of `self` into `dest` at `(dest_col, dest_row)`.
    #[allow(clippy::too_many_arguments)]
    pub fn area_copy(
        &self,
        dest: &mut ScalarField2D,
        col: usize,
        row: usize,
        width: usize,
        height: usize,
        dest_col: usize,
        dest_row: usize,
    ) -> CorrResult<()> {
        if !self.contains_area(col, row, width, height)
            || !dest.contains_area(dest_col, dest_row, width, height)
        {
            return Err(CorrError::KernelTooLarge {
                kernel_width: width,
                kernel_height: height,
                width: dest.xres,
                height: dest.yres,
            });
        }
        for r in 0..height {
            let src_start = (row + r) * self.xres + col;
            let dst_start = (dest_row + r) * dest.xres + dest_col;
            dest.data[dst_start..dst_start + width]
                .copy_from_slice(&self.data[src_start..src_start + width]);
        }
        Ok(())
    }

    /// Returns `true` if a non-empty rectangle lies completely inside.
    pub(crate) fn contains_area(&self, col: usize, row: usize, width: usize, height: usize) -> bool {
        width > 0
            && height > 0
            && col
                .checked_add(width)
                .is_some_and(|end| end <= self.xres)
            && row
                .checked_add(height)
                .is_some_and(|end| end <= self.yres)
    }
}

fn checked_len(xres: usize, yres: usize) -> CorrResult<usize> {
    if xres == 0 || yres == 0 {
        return Err(CorrError::InvalidDimensions {
            width: xres,
            height: yres,
        });
    }
    xres.checked_mul(yres).ok_or(CorrError::InvalidDimensions {
        width: xres,
        height: yres,
    })
}

fn check_extent(xreal: f64, yreal: f64) -> CorrResult<()> {
    if !(xreal.is_finite() && yreal.is_finite() && xreal > 0.0 && yreal > 0.0) {
        return Err(CorrError::InvalidExtent { xreal, yreal });
    }
    Ok(())
}

/// Allocates an empty buffer with room for `len` samples.
pub(crate) fn try_with_capacity(len: usize) -> CorrResult<Vec<f64>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| CorrError::AllocationFailed { len })?;
    Ok(data)
}

/// Allocates a zero-filled buffer of `len` samples.
pub(crate) fn try_zeroed(len: usize) -> CorrResult<Vec<f64>> {
    let mut data = try_with_capacity(len)?;
    data.resize(len, 0.0);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::ScalarField2D;
    use crate::util::CorrError;

    fn ramp(xres: usize, yres: usize) -> ScalarField2D {
        let data = (0..xres * yres).map(|i| i as f64).collect();
        ScalarField2D::from_pixels(data, xres, yres).unwrap()
    }

    #[test]
    fn area_statistics_match_direct_computation() {
        let field = ramp(4, 3);
        assert_eq!(field.area_sum(1, 1, 2, 2), Some(5.0 + 6.0 + 9.0 + 10.0));
        assert_eq!(field.area_avg(1, 1, 2, 2), Some(7.5));
        let rms = field.area_rms(0, 0, 2, 1).unwrap();
        assert!((rms - 0.5).abs() < 1e-12);
        assert!(field.area_sum(3, 0, 2, 1).is_none());
        assert!(field.area_sum(0, 0, 0, 1).is_none());
    }

    #[test]
    fn rms_of_constant_field_is_zero() {
        let mut field = ScalarField2D::new(5, 5, 1.0, 1.0).unwrap();
        field.fill(3.25);
        assert_eq!(field.rms(), 0.0);
        assert_eq!(field.avg(), 3.25);
    }

    #[test]
    fn area_copy_places_block() {
        let src = ramp(3, 3);
        let mut dest = ScalarField2D::new(5, 5, 1.0, 1.0).unwrap();
        src.area_copy(&mut dest, 1, 1, 2, 2, 3, 0).unwrap();
        assert_eq!(dest.get(3, 0), Some(4.0));
        assert_eq!(dest.get(4, 1), Some(8.0));
        assert_eq!(dest.sum(), 4.0 + 5.0 + 7.0 + 8.0);

        let err = src.area_copy(&mut dest, 0, 0, 3, 3, 3, 3).unwrap_err();
        assert!(matches!(err, CorrError::KernelTooLarge { .. }));
    }

    #[test]
    fn pixel_size_follows_extents() {
        let field = ScalarField2D::new(10, 4, 5.0, 2.0).unwrap();
        assert!((field.dx() - 0.5).abs() < 1e-15);
        assert!((field.dy() - 0.5).abs() < 1e-15);
        let copy = field.duplicate().unwrap();
        assert_eq!(copy, field);
        assert!(copy.same_dims(&field.new_alike().unwrap()));
    }
}
