//! Sub-pixel displacement from the 3x3 score neighborhood of a match.

use crate::refine::quad1d::quad_peak_offset_1d;

/// Score of a neighboring displacement whose window leaves the second field.
pub(crate) const INVALID_NEIGHBOR: f64 = f64::NAN;

/// Refines the integer displacement `(center_x, center_y)` of a match.
///
/// `s[row][col]` holds the scores of displacements `center + (col - 1, row - 1)`.
/// The x correction is fitted along the middle row and the y correction along
/// the middle column. Each axis keeps its integer value when its fit fails, so
/// a window touching the field edge in x still refines in y.
pub(crate) fn refine_subpixel_2d(center_x: f64, center_y: f64, s: [[f64; 3]; 3]) -> (f64, f64) {
    let x = quad_peak_offset_1d(s[1][0], s[1][1], s[1][2]).map_or(center_x, |d| center_x + d);
    let y = quad_peak_offset_1d(s[0][1], s[1][1], s[2][1]).map_or(center_y, |d| center_y + d);
    (x, y)
}
