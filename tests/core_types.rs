use surfcorr::lowlevel::{area_gather, AreaStatistics};
use surfcorr::{
    CorrError, CorrelationJob, CrossCorrelationJob, CrossCorrelationOutputs,
    CrossCorrelationParams, ScalarField2D,
};

#[test]
fn field_rejects_invalid_dimensions() {
    let err = ScalarField2D::new(0, 3, 1.0, 1.0).err().unwrap();
    assert_eq!(
        err,
        CorrError::InvalidDimensions {
            width: 0,
            height: 3,
        }
    );

    let err = ScalarField2D::from_pixels(vec![0.0; 5], 2, 3).err().unwrap();
    assert_eq!(err, CorrError::BufferSizeMismatch { needed: 6, got: 5 });
}

#[test]
fn field_rejects_invalid_extent() {
    for (xreal, yreal) in [(0.0, 1.0), (1.0, -2.0), (f64::NAN, 1.0), (1.0, f64::INFINITY)] {
        let err = ScalarField2D::new(4, 4, xreal, yreal).err().unwrap();
        assert!(matches!(err, CorrError::InvalidExtent { .. }));
    }
}

#[test]
fn field_reports_geometry() {
    let field = ScalarField2D::new(8, 4, 2e-6, 1e-6).unwrap();
    assert_eq!(field.get_dims(), (8, 4));
    assert_eq!(field.get_physical_extent(), (2e-6, 1e-6));
    assert!((field.dx() - 2.5e-7).abs() < 1e-20);
    assert!((field.dy() - 2.5e-7).abs() < 1e-20);

    let alike = field.new_alike().unwrap();
    assert_eq!(alike.get_dims(), field.get_dims());
    assert_eq!(alike.get_physical_extent(), field.get_physical_extent());
    assert!(alike.get_data().iter().all(|&v| v == 0.0));
}

#[test]
fn extent_can_be_replaced_without_touching_samples() {
    let data: Vec<f64> = (0..12).map(f64::from).collect();
    let field = ScalarField2D::from_pixels(data.clone(), 4, 3).unwrap();
    let scaled = field.with_extent(2.0, 1.5).unwrap();
    assert_eq!(scaled.get_physical_extent(), (2.0, 1.5));
    assert_eq!(scaled.get_data(), &data[..]);
    assert!((scaled.dx() - 0.5).abs() < 1e-15);

    let err = scaled.with_extent(0.0, 1.0).err().unwrap();
    assert!(matches!(err, CorrError::InvalidExtent { .. }));
}

#[test]
fn area_copy_rejects_rectangles_outside_either_field() {
    let src = ScalarField2D::new(6, 6, 1.0, 1.0).unwrap();
    let mut dst = ScalarField2D::new(4, 4, 1.0, 1.0).unwrap();
    assert!(src.area_copy(&mut dst, 0, 0, 4, 4, 0, 0).is_ok());
    assert!(src.area_copy(&mut dst, 3, 0, 4, 4, 0, 0).is_err());
    assert!(src.area_copy(&mut dst, 0, 0, 3, 3, 2, 0).is_err());
}

#[test]
fn area_statistics_and_gather_agree() {
    let data: Vec<f64> = (0..35).map(|i| ((i * 37) % 11) as f64).collect();
    let field = ScalarField2D::from_pixels(data, 7, 5).unwrap();
    let stats = AreaStatistics::compute(&field, 3, 3).unwrap();
    let avg = area_gather(&field, 3, 3, true).unwrap();
    for (a, b) in stats.avg().get_data().iter().zip(avg.get_data()) {
        assert!((a - b).abs() < 1e-12);
    }
    let (avg, rms) = stats.into_fields();
    assert_eq!(avg.get_dims(), (7, 5));
    assert!(rms.get_data().iter().all(|&v| v >= 0.0));
}

#[test]
fn jobs_validate_geometry_at_init() {
    let data = ScalarField2D::new(6, 6, 1.0, 1.0).unwrap();
    let kernel = ScalarField2D::new(7, 2, 1.0, 1.0).unwrap();
    let err = CorrelationJob::init(&data, &kernel).err().unwrap();
    assert_eq!(
        err,
        CorrError::KernelTooLarge {
            kernel_width: 7,
            kernel_height: 2,
            width: 6,
            height: 6,
        }
    );

    let other = ScalarField2D::new(6, 5, 1.0, 1.0).unwrap();
    let err = CrossCorrelationJob::init(
        &data,
        &other,
        CrossCorrelationParams::default(),
        CrossCorrelationOutputs::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, CorrError::DimensionMismatch { .. }));
}

#[test]
fn errors_render_readable_messages() {
    let err = CorrError::KernelTooLarge {
        kernel_width: 9,
        kernel_height: 3,
        width: 8,
        height: 8,
    };
    assert_eq!(err.to_string(), "kernel 9x3 does not fit into field 8x8");
    assert_eq!(
        CorrError::WeightsLocked.to_string(),
        "weights can only be set before the first iteration"
    );
}
