//! Loading grayscale images into fields via the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Samples keep their raw
//! 8-bit values and the physical extent equals the pixel size.

use crate::field::ScalarField2D;
use crate::util::{CorrError, CorrResult};
use std::path::Path;

/// Converts a grayscale image buffer into a field.
pub fn field_from_gray_image(img: &image::GrayImage) -> CorrResult<ScalarField2D> {
    let xres = img.width() as usize;
    let yres = img.height() as usize;
    let data = img.as_raw().iter().map(|&v| f64::from(v)).collect();
    ScalarField2D::from_pixels(data, xres, yres)
}

/// Converts any decoded image into a field through its luma channel.
pub fn field_from_dynamic_image(img: &image::DynamicImage) -> CorrResult<ScalarField2D> {
    let gray = img.to_luma8();
    field_from_gray_image(&gray)
}

/// Loads an image from disk as a grayscale field.
pub fn load_gray_field<P: AsRef<Path>>(path: P) -> CorrResult<ScalarField2D> {
    let img = image::open(path).map_err(|err| CorrError::ImageIo {
        reason: err.to_string(),
    })?;
    field_from_dynamic_image(&img)
}
