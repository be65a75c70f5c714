use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use surfcorr::{
    correlate, crosscorrelate, CorrelationMethod, CrossCorrelationOutputs,
    CrossCorrelationParams, ScalarField2D,
};

fn make_field(width: usize, height: usize) -> ScalarField2D {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as f64 * 1e-9);
        }
    }
    ScalarField2D::from_vec(data, width, height, width as f64 * 1e-8, height as f64 * 1e-8)
        .unwrap()
}

fn extract_patch(field: &ScalarField2D, x0: usize, y0: usize, size: usize) -> ScalarField2D {
    let mut patch = ScalarField2D::new(size, size, size as f64, size as f64).unwrap();
    field.area_copy(&mut patch, x0, y0, size, size, 0, 0).unwrap();
    patch
}

fn bench_correlation(c: &mut Criterion) {
    let data = make_field(256, 256);
    let mut score = data.new_alike().unwrap();

    for kernel_size in [8, 32, 96] {
        let kernel = extract_patch(&data, 60, 40, kernel_size);
        for (name, method) in [
            ("spatial", CorrelationMethod::Spatial),
            ("fft", CorrelationMethod::Fft),
            ("poc", CorrelationMethod::PhaseOnlyCorrelation),
        ] {
            c.bench_function(&format!("correlate_{name}_kernel{kernel_size}"), |b| {
                b.iter(|| {
                    correlate(&data, &kernel, &mut score, method).unwrap();
                    black_box(score.get_data()[0])
                });
            });
        }
    }
}

fn bench_crosscorrelation(c: &mut Criterion) {
    let data1 = make_field(96, 96);
    let mut data2 = data1.new_alike().unwrap();
    data1.area_copy(&mut data2, 0, 0, 94, 95, 2, 1).unwrap();

    for (search, window) in [(5, 8), (9, 12)] {
        let params = CrossCorrelationParams {
            search_width: search,
            search_height: search,
            window_width: window,
            window_height: window,
        };
        c.bench_function(&format!("crosscorrelate_s{search}_w{window}"), |b| {
            b.iter(|| {
                black_box(
                    crosscorrelate(&data1, &data2, params, CrossCorrelationOutputs::default())
                        .unwrap(),
                )
            });
        });
    }
}

criterion_group!(benches, bench_correlation, bench_crosscorrelation);
criterion_main!(benches);
