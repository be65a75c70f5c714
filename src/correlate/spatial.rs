//! Spatial-domain correlation, one-shot and resumable.

use crate::correlate::check_geometry;
use crate::field::ScalarField2D;
use crate::job::{Computation, ComputationState, Progress, RasterCursor};
use crate::score::{
    exact_window_statistics, is_constant, raw_correlation_score, Placement, INVALID_SCORE,
};
use crate::stats::AreaStatistics;
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::math::clamp_unit;
use crate::util::{CorrError, CorrResult};

/// Summed-area variances below this multiple of the table's rounding scale are
/// recomputed directly from the window.
const TABLE_RESOLUTION: f64 = 1e3 * f64::EPSILON;

/// Kernel statistics plus the per-pixel window statistics of the data.
struct Normalization {
    kavg: f64,
    krms: f64,
    windows: AreaStatistics,
    /// First sample, the reference value of the summed-area tables.
    pivot: f64,
    /// Mean squared deviation from `pivot` over the whole field.
    field_scale: f64,
}

impl Normalization {
    fn new(data: &ScalarField2D, kernel: &ScalarField2D) -> CorrResult<Self> {
        let windows = AreaStatistics::compute(data, kernel.xres(), kernel.yres())?;
        let samples = data.get_data();
        let pivot = samples[0];
        let field_sq: f64 = samples.iter().map(|&v| (v - pivot) * (v - pivot)).sum();
        let krms = if is_constant([kernel.get_data()]) {
            0.0
        } else {
            kernel.rms()
        };
        Ok(Self {
            kavg: kernel.avg(),
            krms,
            windows,
            pivot,
            field_scale: field_sq / (kernel.xres() * kernel.yres()) as f64,
        })
    }

    /// Mean and RMS of the data window with top-left corner `(left, top)`.
    ///
    /// Table values whose variance is lost in cancellation are replaced by a
    /// direct two-pass computation.
    fn data_statistics(
        &self,
        data: &ScalarField2D,
        kernel: &ScalarField2D,
        index: usize,
        left: usize,
        top: usize,
    ) -> (f64, f64) {
        let (avg, rms) = self.windows.at(index);
        let shift = avg - self.pivot;
        let var = rms * rms;
        if var > TABLE_RESOLUTION * (var + shift * shift + self.field_scale) {
            return (avg, rms);
        }
        exact_window_statistics(data, left, top, kernel.xres(), kernel.yres())
            .unwrap_or((avg, rms))
    }

    /// Score of the kernel centered at `(col, row)`.
    fn score_at(
        &self,
        data: &ScalarField2D,
        kernel: &ScalarField2D,
        col: usize,
        row: usize,
    ) -> f64 {
        if self.krms == 0.0 {
            return 0.0;
        }
        let (xoff, yoff) = kernel_offsets(kernel);
        let (left, top) = (col - xoff, row - yoff);
        let (davg, drms) = self.data_statistics(data, kernel, row * data.xres() + col, left, top);
        if drms == 0.0 {
            return 0.0;
        }
        let at = Placement::full_kernel(left as isize, top as isize, kernel);
        let raw = raw_correlation_score(data, kernel, at, davg, self.kavg);
        clamp_unit(raw / (drms * self.krms))
    }
}

/// Pixels the kernel extends left of and above its reference point.
fn kernel_offsets(kernel: &ScalarField2D) -> (usize, usize) {
    ((kernel.xres() - 1) / 2, (kernel.yres() - 1) / 2)
}

/// Output pixels where the kernel fits completely.
fn valid_region(data: &ScalarField2D, kernel: &ScalarField2D) -> RasterCursor {
    let (xoff, yoff) = kernel_offsets(kernel);
    let last_col = data.xres() - kernel.xres() + xoff;
    let last_row = data.yres() - kernel.yres() + yoff;
    RasterCursor::new(xoff..=last_col, yoff..=last_row)
}

/// Computes the spatial correlation map in one call.
///
/// Positions where the kernel does not fit are set to `-1`.
pub fn correlate_spatial(
    data: &ScalarField2D,
    kernel: &ScalarField2D,
    score: &mut ScalarField2D,
) -> CorrResult<()> {
    check_geometry(data, kernel, Some(score))?;
    let _span = trace_span!(
        "correlate_spatial",
        kxres = kernel.xres(),
        kyres = kernel.yres()
    )
    .entered();

    score.fill(INVALID_SCORE);
    let norm = Normalization::new(data, kernel)?;
    let region = valid_region(data, kernel);
    let xres = data.xres();
    let out = score.get_data_mut();
    for (col, row) in region.positions() {
        out[row * xres + col] = norm.score_at(data, kernel, col, row);
    }

    trace_event!("correlation_scored", pixels = region.total());
    Ok(())
}

/// Resumable spatial correlation producing one output pixel per iteration.
///
/// Running the job to completion yields exactly the map of
/// [`correlate_spatial`].
pub struct CorrelationJob<'a> {
    data: &'a ScalarField2D,
    kernel: &'a ScalarField2D,
    score: ScalarField2D,
    cache: Option<Normalization>,
    cursor: RasterCursor,
    progress: Progress,
}

impl<'a> CorrelationJob<'a> {
    /// Creates a job; no work happens until the first `iterate()`.
    pub fn init(data: &'a ScalarField2D, kernel: &'a ScalarField2D) -> CorrResult<Self> {
        check_geometry(data, kernel, None)?;
        let score = data.new_alike()?;
        Ok(Self {
            data,
            kernel,
            score,
            cache: None,
            cursor: valid_region(data, kernel),
            progress: Progress::new(),
        })
    }

    /// The score map as computed so far.
    pub fn score(&self) -> &ScalarField2D {
        &self.score
    }

    /// Number of scratch fields currently held.
    pub fn scratch_fields(&self) -> usize {
        if self.cache.is_some() {
            2
        } else {
            0
        }
    }

    fn setup(&mut self) -> CorrResult<()> {
        let _span = trace_span!(
            "correlation_job_init",
            kxres = self.kernel.xres(),
            kyres = self.kernel.yres()
        )
        .entered();
        self.score.fill(INVALID_SCORE);
        self.cache = Some(Normalization::new(self.data, self.kernel)?);
        self.cursor = valid_region(self.data, self.kernel);
        self.progress.start();
        trace_event!("correlation_job_ready", pixels = self.cursor.total());
        Ok(())
    }

    fn step(&mut self) -> CorrResult<()> {
        let cache = self
            .cache
            .as_ref()
            .ok_or(CorrError::InvalidInput("normalization cache missing"))?;
        let (col, row) = self.cursor.position();
        let value = cache.score_at(self.data, self.kernel, col, row);
        let xres = self.data.xres();
        self.score.get_data_mut()[row * xres + col] = value;

        let more = self.cursor.advance();
        self.progress.advance(self.cursor.fraction());
        if !more {
            self.progress.finish();
        }
        Ok(())
    }
}

impl Computation for CorrelationJob<'_> {
    type Output = ScalarField2D;

    fn iterate(&mut self) -> CorrResult<Progress> {
        match self.progress.state {
            ComputationState::Init => self.setup()?,
            ComputationState::Iterate => self.step()?,
            ComputationState::Finished => {
                trace_debug!("iterate_after_finish", fraction = self.progress.fraction);
            }
        }
        Ok(self.progress)
    }

    fn progress(&self) -> Progress {
        self.progress
    }

    fn finalize(self) -> ScalarField2D {
        self.score
    }
}
