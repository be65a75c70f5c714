//! Resumable computation protocol shared by the correlation jobs.
//!
//! A job is created in [`ComputationState::Init`]. The first `iterate()` call
//! performs its setup and moves it to [`ComputationState::Iterate`]; every
//! further call does one bounded unit of work until the job reaches
//! [`ComputationState::Finished`]. Iterating a finished job changes nothing.
//! `finalize` consumes the job, so a job cannot be finalized twice and
//! its scratch buffers are dropped exactly once.

use crate::util::CorrResult;
use std::ops::RangeInclusive;

/// Phase of a resumable computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComputationState {
    Init,
    Iterate,
    Finished,
}

/// Read-only progress snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub state: ComputationState,
    /// Advisory completion fraction in `[0, 1]`, never decreasing.
    pub fraction: f64,
}

impl Progress {
    pub(crate) fn new() -> Self {
        Self {
            state: ComputationState::Init,
            fraction: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == ComputationState::Finished
    }

    pub(crate) fn start(&mut self) {
        debug_assert_eq!(self.state, ComputationState::Init);
        self.state = ComputationState::Iterate;
        self.fraction = 0.0;
    }

    pub(crate) fn advance(&mut self, fraction: f64) {
        self.fraction = fraction.clamp(self.fraction, 1.0);
    }

    pub(crate) fn finish(&mut self) {
        self.state = ComputationState::Finished;
        self.fraction = 1.0;
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// A computation driven by repeated bounded `iterate()` calls.
pub trait Computation {
    /// Fields handed back by `finalize`.
    type Output;

    /// Performs one unit of work and reports the new progress.
    fn iterate(&mut self) -> CorrResult<Progress>;

    /// Returns the progress after the last `iterate()`.
    fn progress(&self) -> Progress;

    /// Releases all scratch buffers and returns the outputs.
    fn finalize(self) -> Self::Output;
}

/// Drives a computation until it finishes, then finalizes it.
pub fn run_to_completion<C: Computation>(mut job: C) -> CorrResult<C::Output> {
    while !job.progress().is_finished() {
        job.iterate()?;
    }
    Ok(job.finalize())
}

/// Row-major cursor over an inclusive rectangle of output pixels.
#[derive(Clone, Debug)]
pub(crate) struct RasterCursor {
    cols: RangeInclusive<usize>,
    rows: RangeInclusive<usize>,
    col: usize,
    row: usize,
    done: usize,
    total: usize,
}

impl RasterCursor {
    /// Both ranges must be non-empty.
    pub(crate) fn new(cols: RangeInclusive<usize>, rows: RangeInclusive<usize>) -> Self {
        debug_assert!(!cols.is_empty() && !rows.is_empty());
        let total = (cols.end() - cols.start() + 1) * (rows.end() - rows.start() + 1);
        Self {
            col: *cols.start(),
            row: *rows.start(),
            cols,
            rows,
            done: 0,
            total,
        }
    }

    /// Current `(col, row)`.
    pub(crate) fn position(&self) -> (usize, usize) {
        (self.col, self.row)
    }

    /// Moves past the current pixel; returns `false` once every pixel is done.
    pub(crate) fn advance(&mut self) -> bool {
        self.done += 1;
        if self.col < *self.cols.end() {
            self.col += 1;
        } else {
            self.col = *self.cols.start();
            self.row += 1;
        }
        self.done < self.total
    }

    pub(crate) fn fraction(&self) -> f64 {
        self.done as f64 / self.total as f64
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }

    /// Iterates all positions in raster order without touching the cursor.
    pub(crate) fn positions(&self) -> impl Iterator<Item = (usize, usize)> {
        let cols = self.cols.clone();
        self.rows
            .clone()
            .flat_map(move |row| cols.clone().map(move |col| (col, row)))
    }
}
