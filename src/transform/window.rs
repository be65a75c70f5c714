//! Apodization window family.
//!
//! Windows are sampled at pixel centers, `t = (i + 0.5) / n`, which keeps
//! every window symmetric and leaves a one-sample window at full weight. The
//! negative side lobes of the flat-top window are clipped so weights never
//! go below zero.

use crate::field::ScalarField2D;
use crate::util::math::bessel_i0;
use std::f64::consts::PI;

/// Window function applied to weights or data before comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Windowing {
    /// Unit weights.
    #[default]
    None,
    Hann,
    Hamming,
    Blackman,
    Lanczos,
    Welch,
    /// Unit weights with half-weight end samples.
    Rect,
    Nuttall,
    FlatTop,
    /// Kaiser window with `alpha = 2.5`.
    Kaiser25,
}

/// Axis along which a window is applied to a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

const KAISER_ALPHA: f64 = 2.5;

fn cosine_sum(t: f64, coeffs: &[f64]) -> f64 {
    coeffs
        .iter()
        .enumerate()
        .map(|(k, &a)| {
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            sign * a * (2.0 * PI * k as f64 * t).cos()
        })
        .sum()
}

impl Windowing {
    /// Window value for sample `i` of `n`.
    pub fn sample(self, i: usize, n: usize) -> f64 {
        let t = (i as f64 + 0.5) / n as f64;
        let u = 2.0 * t - 1.0;
        match self {
            Windowing::None => 1.0,
            Windowing::Hann => cosine_sum(t, &[0.5, 0.5]),
            Windowing::Hamming => cosine_sum(t, &[0.54, 0.46]),
            Windowing::Blackman => cosine_sum(t, &[0.42, 0.5, 0.08]),
            Windowing::Nuttall => cosine_sum(t, &[0.355768, 0.487396, 0.144232, 0.012604]),
            Windowing::FlatTop => cosine_sum(
                t,
                &[0.215_578_95, 0.416_631_58, 0.277_263_158, 0.083_578_947, 0.006_947_368],
            )
            .max(0.0),
            Windowing::Lanczos => {
                let x = PI * u;
                if x.abs() < 1e-12 {
                    1.0
                } else {
                    x.sin() / x
                }
            }
            Windowing::Welch => 1.0 - u * u,
            Windowing::Rect => {
                if i == 0 || i + 1 == n {
                    0.5
                } else {
                    1.0
                }
            }
            Windowing::Kaiser25 => {
                let arg = PI * KAISER_ALPHA * (1.0 - u * u).max(0.0).sqrt();
                bessel_i0(arg) / bessel_i0(PI * KAISER_ALPHA)
            }
        }
    }

    /// Multiplies `data` sample-wise by the window.
    pub fn apply(self, data: &mut [f64]) {
        let n = data.len();
        for (i, v) in data.iter_mut().enumerate() {
            *v *= self.sample(i, n);
        }
    }
}

/// Multiplies every row (horizontal) or column (vertical) by the window.
pub fn window_field(field: &mut ScalarField2D, orientation: Orientation, windowing: Windowing) {
    let (xres, yres) = field.get_dims();
    let data = field.get_data_mut();
    match orientation {
        Orientation::Horizontal => {
            for row in data.chunks_exact_mut(xres) {
                windowing.apply(row);
            }
        }
        Orientation::Vertical => {
            for row in 0..yres {
                let w = windowing.sample(row, yres);
                data[row * xres..(row + 1) * xres]
                    .iter_mut()
                    .for_each(|v| *v *= w);
            }
        }
    }
}
