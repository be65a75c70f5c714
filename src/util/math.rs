//! Numeric helpers shared by scoring, windowing and refinement.

/// Clamps a normalized score into `[-1, 1]`.
///
/// Prefix-sum statistics and accumulated products carry rounding noise that
/// can push a perfect match slightly past 1.
pub(crate) fn clamp_unit(score: f64) -> f64 {
    score.clamp(-1.0, 1.0)
}

/// Modified Bessel function of the first kind, order zero.
///
/// Power series `sum((x/2)^(2k) / (k!)^2)`, summed until terms stop
/// contributing.
pub(crate) fn bessel_i0(x: f64) -> f64 {
    let half = 0.5 * x;
    let mut term = 1.0f64;
    let mut sum = 1.0f64;
    for k in 1..200 {
        let kf = k as f64;
        term *= (half / kf) * (half / kf);
        sum += term;
        if term < sum * 1e-17 {
            break;
        }
    }
    sum
}

/// Circular index shift used by FFT humanization.
pub(crate) fn shifted_index(index: usize, shift: usize, len: usize) -> usize {
    (index + shift) % len
}

#[cfg(test)]
mod tests {
    use super::{bessel_i0, clamp_unit, shifted_index};

    #[test]
    fn clamp_unit_bounds_scores() {
        assert_eq!(clamp_unit(1.000_000_1), 1.0);
        assert_eq!(clamp_unit(-3.0), -1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
    }

    #[test]
    fn bessel_i0_matches_reference_values() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-15);
        assert!((bessel_i0(1.0) - 1.266_065_877_752_008_4).abs() < 1e-12);
        assert!((bessel_i0(2.0) - 2.279_585_302_336_067_3).abs() < 1e-12);
    }

    #[test]
    fn shifted_index_wraps() {
        assert_eq!(shifted_index(3, 4, 8), 7);
        assert_eq!(shifted_index(5, 4, 8), 1);
    }
}
