//! Cross-correlation registration of two fields of the same surface.
//!
//! For every point where a `window_width x window_height` window fits into
//! the first field, the window is compared with every displaced window of the
//! second field inside a `search_width x search_height` neighborhood. The
//! best candidate is refined to sub-pixel precision with separable parabolas
//! and reported as a physical displacement.
//!
//! The zero-displacement candidate is compared first and gets a small
//! relative bonus, so on ties (flat or periodic data) points stay where they
//! are.

use crate::field::ScalarField2D;
use crate::job::{run_to_completion, Computation, ComputationState, Progress, RasterCursor};
use crate::refine::{refine_subpixel_2d, INVALID_NEIGHBOR};
use crate::score::{weighted_correlation_score, Placement, INVALID_SCORE};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::transform::window::{window_field, Orientation, Windowing};
use crate::util::{CorrError, CorrResult};

/// Relative comparison bonus of the zero-displacement candidate.
const ZERO_SHIFT_BIAS: f64 = 1e-4;

/// Search and window geometry, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrossCorrelationParams {
    /// Number of candidate displacements along x.
    pub search_width: usize,
    /// Number of candidate displacements along y.
    pub search_height: usize,
    pub window_width: usize,
    pub window_height: usize,
}

impl Default for CrossCorrelationParams {
    fn default() -> Self {
        Self {
            search_width: 10,
            search_height: 10,
            window_width: 10,
            window_height: 10,
        }
    }
}

impl CrossCorrelationParams {
    fn validate(&self) -> CorrResult<()> {
        if self.search_width == 0 || self.search_height == 0 {
            return Err(CorrError::InvalidInput("search area must not be empty"));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(CorrError::InvalidInput("comparison window must not be empty"));
        }
        Ok(())
    }

    /// Inclusive candidate displacement range along one axis.
    fn displacements(size: usize) -> (isize, isize) {
        let back = (size / 2) as isize;
        (-back, size as isize - 1 - back)
    }
}

/// Selects which output fields a job produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrossCorrelationOutputs {
    pub dx: bool,
    pub dy: bool,
    pub score: bool,
}

impl Default for CrossCorrelationOutputs {
    fn default() -> Self {
        Self {
            dx: true,
            dy: true,
            score: true,
        }
    }
}

/// Output fields of a finished cross-correlation.
///
/// `dx` and `dy` are physical displacements from the first field to the
/// second; `score` is the correlation of the best candidate. Points where the
/// window does not fit are zero.
#[derive(Clone, Debug, PartialEq)]
pub struct CrossCorrelationResult {
    pub dx: Option<ScalarField2D>,
    pub dy: Option<ScalarField2D>,
    pub score: Option<ScalarField2D>,
}

/// Best candidate found for one point.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    dx: isize,
    dy: isize,
    score: f64,
}

/// Resumable cross-correlation processing one point per iteration.
pub struct CrossCorrelationJob<'a> {
    data1: &'a ScalarField2D,
    data2: &'a ScalarField2D,
    params: CrossCorrelationParams,
    weights: ScalarField2D,
    dx: Option<ScalarField2D>,
    dy: Option<ScalarField2D>,
    score: Option<ScalarField2D>,
    cursor: RasterCursor,
    progress: Progress,
}

impl<'a> CrossCorrelationJob<'a> {
    /// Creates a job with rectangular (all ones) weights.
    pub fn init(
        data1: &'a ScalarField2D,
        data2: &'a ScalarField2D,
        params: CrossCorrelationParams,
        outputs: CrossCorrelationOutputs,
    ) -> CorrResult<Self> {
        params.validate()?;
        let (xres, yres) = data1.get_dims();
        if data2.get_dims() != (xres, yres) {
            return Err(CorrError::DimensionMismatch {
                expected: (xres, yres),
                got: data2.get_dims(),
                context: "second field",
            });
        }
        let (ww, wh) = (params.window_width, params.window_height);
        if ww > xres || wh > yres {
            return Err(CorrError::KernelTooLarge {
                kernel_width: ww,
                kernel_height: wh,
                width: xres,
                height: yres,
            });
        }

        let mut weights =
            ScalarField2D::new(ww, wh, ww as f64 * data1.dx(), wh as f64 * data1.dy())?;
        weights.fill(1.0);
        let alloc = |wanted: bool| wanted.then(|| data1.new_alike()).transpose();

        Ok(Self {
            data1,
            data2,
            params,
            weights,
            dx: alloc(outputs.dx)?,
            dy: alloc(outputs.dy)?,
            score: alloc(outputs.score)?,
            cursor: valid_points(data1, &params),
            progress: Progress::new(),
        })
    }

    /// Replaces the weights with a separable window.
    ///
    /// Only allowed before the first `iterate()`.
    pub fn set_weights(&mut self, windowing: Windowing) -> CorrResult<()> {
        if self.progress.state != ComputationState::Init {
            return Err(CorrError::WeightsLocked);
        }
        self.weights.fill(1.0);
        window_field(&mut self.weights, Orientation::Horizontal, windowing);
        window_field(&mut self.weights, Orientation::Vertical, windowing);
        Ok(())
    }

    pub fn weights(&self) -> &ScalarField2D {
        &self.weights
    }

    pub fn params(&self) -> CrossCorrelationParams {
        self.params
    }

    fn setup(&mut self) {
        let _span = trace_span!(
            "crosscorrelation_init",
            search_width = self.params.search_width,
            search_height = self.params.search_height,
            window_width = self.params.window_width,
            window_height = self.params.window_height
        )
        .entered();
        for field in [&mut self.dx, &mut self.dy, &mut self.score]
            .into_iter()
            .flatten()
        {
            field.clear();
        }
        self.cursor = valid_points(self.data1, &self.params);
        self.progress.start();
        trace_event!("crosscorrelation_ready", points = self.cursor.total());
    }

    /// Score of the second-field window displaced by `(dx, dy)`, or
    /// [`INVALID_NEIGHBOR`] when it leaves the field.
    fn candidate_score(&self, left: isize, top: isize, dx: isize, dy: isize) -> f64 {
        let (ww, wh) = (self.params.window_width, self.params.window_height);
        let (col2, row2) = (left + dx, top + dy);
        if col2 < 0
            || row2 < 0
            || col2 as usize + ww > self.data2.xres()
            || row2 as usize + wh > self.data2.yres()
        {
            return INVALID_NEIGHBOR;
        }
        let at = Placement::new(left, top, col2, row2, ww, wh);
        weighted_correlation_score(self.data1, self.data2, &self.weights, at)
    }

    fn best_candidate(&self, left: isize, top: isize) -> Option<Candidate> {
        let (x0, x1) = CrossCorrelationParams::displacements(self.params.search_width);
        let (y0, y1) = CrossCorrelationParams::displacements(self.params.search_height);

        let mut best: Option<(Candidate, f64)> = None;
        let stay = self.candidate_score(left, top, 0, 0);
        if !stay.is_nan() {
            let candidate = Candidate {
                dx: 0,
                dy: 0,
                score: stay,
            };
            best = Some((candidate, stay + ZERO_SHIFT_BIAS * stay.abs()));
        }

        for dy in y0..=y1 {
            for dx in x0..=x1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let score = self.candidate_score(left, top, dx, dy);
                if score.is_nan() {
                    continue;
                }
                if best.is_none_or(|(_, rank)| score > rank) {
                    best = Some((Candidate { dx, dy, score }, score));
                }
            }
        }
        best.map(|(candidate, _)| candidate)
    }

    fn step(&mut self) {
        let (col, row) = self.cursor.position();
        let left = col as isize - (self.params.window_width / 2) as isize;
        let top = row as isize - (self.params.window_height / 2) as isize;

        let (shift_x, shift_y, score) = match self.best_candidate(left, top) {
            Some(best) => {
                let mut s = [[0.0; 3]; 3];
                for (j, line) in s.iter_mut().enumerate() {
                    for (i, value) in line.iter_mut().enumerate() {
                        *value = if i == 1 && j == 1 {
                            best.score
                        } else {
                            self.candidate_score(
                                left,
                                top,
                                best.dx + i as isize - 1,
                                best.dy + j as isize - 1,
                            )
                        };
                    }
                }
                let (x, y) = refine_subpixel_2d(best.dx as f64, best.dy as f64, s);
                (x, y, best.score)
            }
            None => (0.0, 0.0, INVALID_SCORE),
        };

        let index = row * self.data1.xres() + col;
        if let Some(dx) = self.dx.as_mut() {
            dx.get_data_mut()[index] = shift_x * self.data1.dx();
        }
        if let Some(dy) = self.dy.as_mut() {
            dy.get_data_mut()[index] = shift_y * self.data1.dy();
        }
        if let Some(out) = self.score.as_mut() {
            out.get_data_mut()[index] = score;
        }

        let more = self.cursor.advance();
        self.progress.advance(self.cursor.fraction());
        if !more {
            self.progress.finish();
        }
    }
}

impl Computation for CrossCorrelationJob<'_> {
    type Output = CrossCorrelationResult;

    fn iterate(&mut self) -> CorrResult<Progress> {
        match self.progress.state {
            ComputationState::Init => self.setup(),
            ComputationState::Iterate => self.step(),
            ComputationState::Finished => {
                trace_debug!("iterate_after_finish", fraction = self.progress.fraction);
            }
        }
        Ok(self.progress)
    }

    fn progress(&self) -> Progress {
        self.progress
    }

    fn finalize(self) -> CrossCorrelationResult {
        CrossCorrelationResult {
            dx: self.dx,
            dy: self.dy,
            score: self.score,
        }
    }
}

/// Points where the comparison window fits into the first field.
fn valid_points(data: &ScalarField2D, params: &CrossCorrelationParams) -> RasterCursor {
    let (ww, wh) = (params.window_width, params.window_height);
    RasterCursor::new(
        ww / 2..=data.xres() - ww + ww / 2,
        wh / 2..=data.yres() - wh + wh / 2,
    )
}

/// Runs a complete cross-correlation with rectangular weights.
pub fn crosscorrelate(
    data1: &ScalarField2D,
    data2: &ScalarField2D,
    params: CrossCorrelationParams,
    outputs: CrossCorrelationOutputs,
) -> CorrResult<CrossCorrelationResult> {
    let job = CrossCorrelationJob::init(data1, data2, params, outputs)?;
    run_to_completion(job)
}
