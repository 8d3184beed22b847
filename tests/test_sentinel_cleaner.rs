use approx::assert_relative_eq;
use cloudsift::core::{clean, MaskRule, SentinelCleaner};
use cloudsift::types::{SiftError, Validity};
use ndarray::{array, Array1, Array2, ArrayD, IxDyn};

fn assert_cleaned(actual: &Array1<f64>, expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        if e.is_nan() {
            assert!(a.is_nan(), "element {} should be missing, got {}", i, a);
        } else {
            assert_relative_eq!(a, e, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_cloudsat_height_scenario() {
    let raw = array![100i32, -9999, 50000, 200];
    let validity = Validity::new(-9999.0, (-5000.0, 30000.0));

    let cleaned = clean(&raw, &validity).unwrap();

    // 50000 exceeds the 30000 maximum
    assert_cleaned(&cleaned, &[100.0, f64::NAN, f64::NAN, 200.0]);
}

#[test]
fn test_reflectivity_scenario() {
    let raw = array![150i16, -8192, 600, -9000];
    let validity = Validity::new(-8192.0, (-4000.0, 5000.0)).with_scale_factor(100.0);

    let cleaned = clean(&raw, &validity).unwrap();

    // -9000 lies below the -4000 minimum, so it is masked rather than scaled
    assert_cleaned(&cleaned, &[1.5, f64::NAN, 6.0, f64::NAN]);
}

#[test]
fn test_reflectivity_in_range_negative_value_is_scaled() {
    let raw = array![-3000i16, -4000, 5000];
    let validity = Validity::new(-8192.0, (-4000.0, 5000.0)).with_scale_factor(100.0);

    let cleaned = clean(&raw, &validity).unwrap();

    assert_cleaned(&cleaned, &[-30.0, -40.0, 50.0]);
}

#[test]
fn test_empty_input_is_invalid_argument() {
    let raw = Array1::<i16>::zeros(0);
    let validity = Validity::new(-9999.0, (-5000.0, 30000.0));

    assert!(matches!(clean(&raw, &validity), Err(SiftError::InvalidArgument(_))));
}

#[test]
fn test_inverted_range_is_invalid_argument() {
    let raw = array![1i16, 2, 3];
    let validity = Validity::new(-9999.0, (10.0, -10.0));

    assert!(matches!(clean(&raw, &validity), Err(SiftError::InvalidArgument(_))));
}

#[test]
fn test_zero_scale_factor_is_invalid_argument() {
    let raw = array![1i16, 2, 3];
    let validity = Validity::new(-9999.0, (0.0, 10.0)).with_scale_factor(0.0);

    assert!(matches!(clean(&raw, &validity), Err(SiftError::InvalidArgument(_))));
}

#[test]
fn test_bounds_are_inclusive() {
    let raw = array![-5000i32, -5001, 30000, 30001];
    let validity = Validity::new(-9999.0, (-5000.0, 30000.0));

    let cleaned = clean(&raw, &validity).unwrap();

    assert_cleaned(&cleaned, &[-5000.0, f64::NAN, 30000.0, f64::NAN]);
}

#[test]
fn test_every_element_classified() {
    let raw = Array1::from_iter(-10_000i32..=10_000);
    let fill = -9999.0;
    let (lo, hi) = (-4000.0, 5000.0);
    let scale = 100.0;
    let validity = Validity::new(fill, (lo, hi)).with_scale_factor(scale);

    let cleaned = clean(&raw, &validity).unwrap();

    for (&x, &y) in raw.iter().zip(cleaned.iter()) {
        let x = x as f64;
        if x < lo || x > hi || x == fill {
            assert!(y.is_nan(), "{} should be missing", x);
        } else {
            assert_eq!(y, x / scale);
            assert!(y >= lo / scale && y <= hi / scale);
        }
    }
}

#[test]
fn test_cleaning_is_idempotent_in_physical_units() {
    let raw = Array2::from_shape_fn((40, 25), |(i, j)| (i as i32 * 300 - 6000) + j as i32 * 7);
    let validity = Validity::new(-8192.0, (-4000.0, 5000.0)).with_scale_factor(100.0);

    let once = clean(&raw, &validity).unwrap();

    let physical = validity.valid_range.scaled(validity.scale_factor);
    let again_validity = Validity::new(validity.fill_value / validity.scale_factor, physical);
    let twice = clean(&once, &again_validity).unwrap();

    for (&a, &b) in once.iter().zip(twice.iter()) {
        if a.is_nan() {
            assert!(b.is_nan());
        } else {
            assert_eq!(a, b);
        }
    }
}

#[test]
fn test_shape_preserved() {
    let raw = ArrayD::<i16>::from_shape_fn(IxDyn(&[3, 4, 5]), |idx| (idx[0] * 20 + idx[1] * 5 + idx[2]) as i16);
    let validity = Validity::new(-1.0, (0.0, 50.0));

    let cleaned = clean(&raw, &validity).unwrap();

    assert_eq!(cleaned.shape(), raw.shape());
}

#[test]
fn test_large_array_matches_elementwise_rule() {
    // Big enough to take the parallel path when it is enabled
    let raw = Array2::from_shape_fn((400, 300), |(i, j)| ((i * 300 + j) % 12000) as i32 - 6000);
    let validity = Validity::new(-5999.0, (-5000.0, 5000.0)).with_scale_factor(10.0);
    let cleaner = SentinelCleaner::new(validity).unwrap();

    let cleaned = cleaner.clean(&raw).unwrap();

    assert_eq!(cleaned.dim(), (400, 300));
    for (&x, &y) in raw.iter().zip(cleaned.iter()) {
        match cleaner.classify(x as f64) {
            Some(_) => assert!(y.is_nan()),
            None => assert_eq!(y, x as f64 / 10.0),
        }
    }
}

#[test]
fn test_range_only_rule_keeps_in_range_fill() {
    let raw = array![0.0f32, 2.5, 5.0];
    let validity = Validity::new(2.5, (0.0, 5.0));

    let strict = SentinelCleaner::new(validity).unwrap().clean(&raw).unwrap();
    let legacy = SentinelCleaner::new(validity)
        .unwrap()
        .with_rule(MaskRule::RangeOnly)
        .clean(&raw)
        .unwrap();

    assert!(strict[1].is_nan());
    assert_eq!(legacy[1], 2.5);
    assert_eq!(strict[2], legacy[2]);
}
