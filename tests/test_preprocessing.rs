//! Integration test: scaling and joint row permutation

use clr_sweep::error::SweepError;
use clr_sweep::preprocessing::{PreprocessingConfig, Preprocessor, SymmetricScaler};
use clr_sweep::random::RandomSource;
use ndarray::{array, Array1, Array2, Axis};

/// 10 rows, 3 columns with distinct ranges: [0, 9], [-50, 40], [100, 190]
fn synthetic() -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((10, 3), |(i, j)| {
        let i = i as f64;
        match j {
            0 => i,
            1 => -50.0 + 10.0 * ((i as usize * 7) % 10) as f64,
            _ => 100.0 + 10.0 * ((i as usize * 3) % 10) as f64,
        }
    });
    let y = Array1::from_iter((0..10).map(|i| i as f64 * 100.0));
    (x, y)
}

#[test]
fn test_end_to_end_fixed_seed() {
    let (x, y) = synthetic();
    let seed = 42;
    let expected_perm = vec![0, 3, 5, 7, 9, 4, 8, 1, 6, 2];

    let mut rng = RandomSource::new(seed);
    let out = Preprocessor::new().fit_transform(&x, &y, &mut rng).unwrap();

    assert_eq!(out.permutation, expected_perm);
    for col in out.x.columns() {
        let lo = col.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!((lo + 1.0).abs() < 1e-12, "column min {}", lo);
        assert!((hi - 1.0).abs() < 1e-12, "column max {}", hi);
    }

    // Row i of the output is original row perm[i], scaled
    let scaled = SymmetricScaler::new().fit_transform(&x).unwrap();
    for (i, &src) in expected_perm.iter().enumerate() {
        assert_eq!(out.x.row(i), scaled.row(src));
        assert_eq!(out.y[i], y[src]);
    }
}

#[test]
fn test_rows_keep_their_labels() {
    let (x, y) = synthetic();
    let mut rng = RandomSource::new(9);
    let out = Preprocessor::new().fit_transform(&x, &y, &mut rng).unwrap();

    // y was built as 100 × original row index, and column 0 was the row index
    for i in 0..10 {
        let original = out.y[i] / 100.0;
        let restored = out.scaler.inverse_transform(&out.x.select(Axis(0), &[i])).unwrap();
        assert!((restored[[0, 0]] - original).abs() < 1e-9);
    }

    let mut sorted = out.y.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    assert_eq!(Array1::from_vec(sorted), y);
}

#[test]
fn test_zero_range_column_is_domain_error() {
    let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
    let y = array![1.0, 2.0, 3.0];
    let err = Preprocessor::new()
        .fit_transform(&x, &y, &mut RandomSource::new(0))
        .unwrap_err();
    assert!(matches!(err, SweepError::DomainError(ref msg) if msg.contains("column 1")));
}

#[test]
fn test_in_place_matches_pure() {
    let (x, y) = synthetic();
    let pure = Preprocessor::new()
        .fit_transform(&x, &y, &mut RandomSource::new(5))
        .unwrap();
    let in_place = Preprocessor::with_config(PreprocessingConfig::new().with_in_place(true))
        .run(x.clone(), y.clone(), &mut RandomSource::new(5))
        .unwrap();
    assert_eq!(pure.x, in_place.x);
    assert_eq!(pure.y, in_place.y);
    assert_eq!(pure.permutation, in_place.permutation);
}

#[test]
fn test_pure_path_leaves_input_untouched() {
    let (x, y) = synthetic();
    let before = x.clone();
    let _ = Preprocessor::new()
        .fit_transform(&x, &y, &mut RandomSource::new(1))
        .unwrap();
    assert_eq!(x, before);
}

#[test]
fn test_mismatched_rows_rejected() {
    let x = array![[0.0], [1.0]];
    let y = array![1.0];
    assert!(matches!(
        Preprocessor::new().fit_transform(&x, &y, &mut RandomSource::new(0)),
        Err(SweepError::ShapeError { .. })
    ));
}

#[test]
fn test_different_seeds_permute_differently() {
    let (x, y) = synthetic();
    let a = Preprocessor::new()
        .fit_transform(&x, &y, &mut RandomSource::new(1))
        .unwrap();
    let b = Preprocessor::new()
        .fit_transform(&x, &y, &mut RandomSource::new(2))
        .unwrap();
    assert_ne!(a.permutation, b.permutation);
}
