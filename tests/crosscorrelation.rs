use serde::Deserialize;
use surfcorr::{
    crosscorrelate, run_to_completion, Computation, ComputationState, CorrError,
    CrossCorrelationJob, CrossCorrelationOutputs, CrossCorrelationParams, ScalarField2D,
    Windowing,
};

const XRES: usize = 32;
const YRES: usize = 28;
const PIXEL: f64 = 0.25;

/// Registration cases: the second field is the first one moved by `shift`
/// pixels.
const CASES_JSON: &str = r#"[
    { "case_id": "no_shift", "shift": [0.0, 0.0], "tolerance_px": 0.1 },
    { "case_id": "integer_shift", "shift": [2.0, -1.0], "tolerance_px": 0.1 },
    { "case_id": "subpixel_shift", "shift": [1.5, 0.5], "tolerance_px": 0.3, "min_score": 0.85 },
    { "case_id": "hann_weighted", "shift": [-2.0, 1.0], "windowing": "hann", "tolerance_px": 0.15 }
]"#;

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
enum WindowingCase {
    #[default]
    None,
    Hann,
}

impl From<WindowingCase> for Windowing {
    fn from(value: WindowingCase) -> Self {
        match value {
            WindowingCase::None => Windowing::None,
            WindowingCase::Hann => Windowing::Hann,
        }
    }
}

fn default_min_score() -> f64 {
    0.999
}

#[derive(Debug, Deserialize)]
struct Case {
    case_id: String,
    shift: [f64; 2],
    #[serde(default)]
    windowing: WindowingCase,
    tolerance_px: f64,
    #[serde(default = "default_min_score")]
    min_score: f64,
}

fn surface(x: f64, y: f64) -> f64 {
    (0.9 * x + 0.4 * y).sin()
        + 0.8 * (0.35 * x - 0.7 * y + 1.0).cos()
        + 0.6 * (0.21 * x + 0.13 * y + 2.0).sin()
        + 0.5 * (1.3 * y + 0.2).cos()
}

fn sampled(shift: [f64; 2]) -> ScalarField2D {
    sampled_on(shift, 0.0, 1.0)
}

/// The surface scaled by `amplitude` and raised to `level`.
fn sampled_on(shift: [f64; 2], level: f64, amplitude: f64) -> ScalarField2D {
    let data = (0..XRES * YRES)
        .map(|i| {
            let x = (i % XRES) as f64 - shift[0];
            let y = (i / XRES) as f64 - shift[1];
            level + amplitude * surface(x, y)
        })
        .collect();
    ScalarField2D::from_vec(data, XRES, YRES, XRES as f64 * PIXEL, YRES as f64 * PIXEL).unwrap()
}

fn params() -> CrossCorrelationParams {
    CrossCorrelationParams {
        search_width: 7,
        search_height: 7,
        window_width: 9,
        window_height: 9,
    }
}

/// `true` when the true match and its refinement neighbors lie in the field.
fn match_in_bounds(col: usize, row: usize, shift: [f64; 2], p: &CrossCorrelationParams) -> bool {
    let left = (col - p.window_width / 2) as f64;
    let top = (row - p.window_height / 2) as f64;
    (left + shift[0]).floor() >= 1.0
        && (top + shift[1]).floor() >= 1.0
        && (left + shift[0]).ceil() + (p.window_width + 1) as f64 <= XRES as f64
        && (top + shift[1]).ceil() + (p.window_height + 1) as f64 <= YRES as f64
}

#[test]
fn registration_cases_recover_the_shift() {
    let cases: Vec<Case> = serde_json::from_str(CASES_JSON).unwrap();
    let p = params();
    let reference = sampled([0.0, 0.0]);

    for case in cases {
        let moved = sampled(case.shift);
        let mut job = CrossCorrelationJob::init(
            &reference,
            &moved,
            p,
            CrossCorrelationOutputs::default(),
        )
        .unwrap();
        job.set_weights(case.windowing.into()).unwrap();
        let result = run_to_completion(job).unwrap();
        let dx = result.dx.unwrap();
        let dy = result.dy.unwrap();
        let score = result.score.unwrap();

        let mut checked = 0;
        for row in p.window_height / 2..=YRES - p.window_height + p.window_height / 2 {
            for col in p.window_width / 2..=XRES - p.window_width + p.window_width / 2 {
                if !match_in_bounds(col, row, case.shift, &p) {
                    continue;
                }
                let ex = (dx.get(col, row).unwrap() / PIXEL - case.shift[0]).abs();
                let ey = (dy.get(col, row).unwrap() / PIXEL - case.shift[1]).abs();
                assert!(ex <= case.tolerance_px, "{}: dx error {ex}", case.case_id);
                assert!(ey <= case.tolerance_px, "{}: dy error {ey}", case.case_id);
                assert!(
                    score.get(col, row).unwrap() >= case.min_score,
                    "{}: score {}",
                    case.case_id,
                    score.get(col, row).unwrap()
                );
                checked += 1;
            }
        }
        assert!(checked > 300, "{}: only {checked} points", case.case_id);
    }
}

#[test]
fn self_registration_is_zero_everywhere() {
    let field = sampled([0.0, 0.0]);
    let p = CrossCorrelationParams {
        search_width: 3,
        search_height: 3,
        ..params()
    };
    let result = crosscorrelate(&field, &field, p, CrossCorrelationOutputs::default()).unwrap();
    let dx = result.dx.unwrap();
    let dy = result.dy.unwrap();
    for (&x, &y) in dx.get_data().iter().zip(dy.get_data()) {
        assert!(x.abs() < 0.5 * PIXEL);
        assert!(y.abs() < 0.5 * PIXEL);
    }
}

#[test]
fn small_relief_on_a_large_level_registers() {
    let p = params();
    let reference = sampled_on([0.0, 0.0], 1e6, 1e-5);
    for shift in [[0.0, 0.0], [2.0, -1.0]] {
        let moved = sampled_on(shift, 1e6, 1e-5);
        let result =
            crosscorrelate(&reference, &moved, p, CrossCorrelationOutputs::default()).unwrap();
        let dx = result.dx.unwrap();
        let dy = result.dy.unwrap();
        let score = result.score.unwrap();

        let mut checked = 0;
        for row in p.window_height / 2..=YRES - p.window_height + p.window_height / 2 {
            for col in p.window_width / 2..=XRES - p.window_width + p.window_width / 2 {
                if !match_in_bounds(col, row, shift, &p) {
                    continue;
                }
                let s = score.get(col, row).unwrap();
                assert!(s >= 0.999, "shift {shift:?}: score {s} at ({col}, {row})");
                assert!((dx.get(col, row).unwrap() / PIXEL - shift[0]).abs() <= 0.1);
                assert!((dy.get(col, row).unwrap() / PIXEL - shift[1]).abs() <= 0.1);
                checked += 1;
            }
        }
        assert!(checked > 300, "shift {shift:?}: only {checked} points");
    }
}

#[test]
fn flat_fields_stay_in_place() {
    let mut flat = ScalarField2D::new(16, 16, 4.0, 4.0).unwrap();
    flat.fill(3.0);
    let p = CrossCorrelationParams {
        search_width: 5,
        search_height: 5,
        window_width: 6,
        window_height: 6,
    };
    for windowing in [Windowing::None, Windowing::Hann, Windowing::Blackman] {
        let mut job =
            CrossCorrelationJob::init(&flat, &flat, p, CrossCorrelationOutputs::default()).unwrap();
        job.set_weights(windowing).unwrap();
        let result = run_to_completion(job).unwrap();
        assert!(result.dx.unwrap().get_data().iter().all(|&v| v == 0.0));
        assert!(result.dy.unwrap().get_data().iter().all(|&v| v == 0.0));
        assert!(result.score.unwrap().get_data().iter().all(|&v| v == 0.0));
    }
}

#[test]
fn paused_job_matches_uninterrupted_run() {
    let a = sampled([0.0, 0.0]);
    let b = sampled([1.0, 2.0]);
    let p = params();
    let expected = crosscorrelate(&a, &b, p, CrossCorrelationOutputs::default()).unwrap();

    let mut first = CrossCorrelationJob::init(&a, &b, p, CrossCorrelationOutputs::default()).unwrap();
    let mut second =
        CrossCorrelationJob::init(&a, &b, p, CrossCorrelationOutputs::default()).unwrap();
    // Interleave two jobs to simulate a host doing other work between steps.
    let mut last_fraction = 0.0;
    while !first.progress().is_finished() {
        let progress = first.iterate().unwrap();
        assert!(progress.fraction >= last_fraction);
        last_fraction = progress.fraction;
        for _ in 0..3 {
            second.iterate().unwrap();
        }
    }
    let second = run_to_completion(second).unwrap();
    let first = first.finalize();
    assert_eq!(first, expected);
    assert_eq!(second, expected);
}

#[test]
fn weights_are_frozen_once_iteration_starts() {
    let field = sampled([0.0, 0.0]);
    let mut job =
        CrossCorrelationJob::init(&field, &field, params(), CrossCorrelationOutputs::default())
            .unwrap();
    job.set_weights(Windowing::Blackman).unwrap();
    job.set_weights(Windowing::Welch).unwrap();
    assert_eq!(job.progress().state, ComputationState::Init);

    job.iterate().unwrap();
    assert_eq!(job.set_weights(Windowing::Hann), Err(CorrError::WeightsLocked));
    let expected = Windowing::Welch.sample(4, 9) * Windowing::Welch.sample(0, 9);
    assert!((job.weights().get(4, 0).unwrap() - expected).abs() < 1e-12);
}
