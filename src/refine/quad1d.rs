//! Parabola through the scores of three neighboring displacements.

/// Second differences smaller than this mean the score does not bend.
const CURVATURE_EPS: f64 = 1e-12;

/// Fractional displacement of the score maximum along one axis.
///
/// `fm`, `f0` and `fp` are the scores one pixel back, at, and one pixel ahead
/// of the best integer displacement. The vertex `(fm - fp) / (2 (fm + fp - 2 f0))`
/// is accepted only for a downward-opening parabola whose vertex stays
/// within one pixel. A missing neighbor (NaN) or a flat or upward score
/// profile yields `None` and the caller keeps the integer displacement.
pub(crate) fn quad_peak_offset_1d(fm: f64, f0: f64, fp: f64) -> Option<f64> {
    if ![fm, f0, fp].iter().all(|v| v.is_finite()) {
        return None;
    }
    let curvature = fm - 2.0 * f0 + fp;
    if curvature > -CURVATURE_EPS {
        return None;
    }
    let offset = 0.5 * (fm - fp) / curvature;
    (offset.abs() <= 1.0).then_some(offset)
}
