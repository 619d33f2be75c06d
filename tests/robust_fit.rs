//! End-to-end tests for the Theil–Sen estimator.
//!
//! These tests verify the public fitting API on contaminated problems:
//! - Recovery of known coefficients despite gross outliers
//! - Determinism across worker counts
//! - Least-squares equivalences (full-size subsets, underdetermined data)
//! - Model export and reuse for prediction
//!
//! ## Test Organization
//!
//! 1. **Robust Recovery** - 2-D and 4-D synthetic problems
//! 2. **Parallelism** - sequential vs parallel fits
//! 3. **Least-Squares Paths** - subsets of size n, more features than samples
//! 4. **Model Files** - JSON export/import

use approx::assert_abs_diff_eq;
use nalgebra::{DMatrix, DVector};

use theil_sen::data::{SyntheticSpec, generate_linear};
use theil_sen::domain::{FitPath, MaxSubpopulation, Parallelism, SubsampleSize, TheilSenConfig};
use theil_sen::error::TheilSenError;
use theil_sen::fit::TheilSen;
use theil_sen::io::{fit_from_model_file, to_model_file};
use theil_sen::math::ordinary_least_squares;

fn seeded(seed: u64) -> TheilSenConfig {
    TheilSenConfig {
        random_state: Some(seed),
        ..TheilSenConfig::default()
    }
}

/// `n` rows of a well-spread design with `p` columns and a dense target.
fn underdetermined(n: usize, p: usize) -> (DMatrix<f64>, DVector<f64>) {
    let spec = SyntheticSpec {
        n_samples: n,
        coefficients: (0..p).map(|j| 1.0 + j as f64 * 0.5).collect(),
        outlier_fraction: 0.0,
        seed: 3,
        ..SyntheticSpec::default()
    };
    let data = generate_linear(&spec).unwrap();
    (data.x, data.y)
}

// ============================================================================
// Robust Recovery Tests
// ============================================================================

/// y = 5·x1 + 10·x2 + 1 with 10% of targets replaced by N(0, 50²) draws.
#[test]
fn test_recovers_2d_coefficients_with_outliers() {
    let data = generate_linear(&SyntheticSpec::default()).unwrap();
    let fit = TheilSen::new(seeded(0)).fit(&data.x, &data.y).unwrap();

    assert_abs_diff_eq!(fit.coefficients()[0], 5.0, epsilon = 0.2);
    assert_abs_diff_eq!(fit.coefficients()[1], 10.0, epsilon = 0.2);
    assert_eq!(fit.diagnostics().path, FitPath::Subpopulations);
    assert_eq!(fit.diagnostics().n_subsamples, 3);
    assert!(!fit.diagnostics().exhaustive);
    assert_eq!(fit.diagnostics().n_subpopulation, 10_000);

    let (ols, _) = ordinary_least_squares(&data.x, &data.y, true).unwrap();
    let ts_err = (fit.coefficients() - &data.coefficients).norm();
    let ols_err = (&ols - &data.coefficients).norm();
    assert!(ts_err < ols_err, "theil-sen {ts_err} vs ols {ols_err}");
}

/// Larger 4-D problem with a reduced subpopulation budget.
#[test]
fn test_recovers_4d_coefficients_with_small_budget() {
    let spec = SyntheticSpec {
        n_samples: 10_000,
        coefficients: vec![5.0, 10.0, 42.0, 7.0],
        ..SyntheticSpec::default()
    };
    let data = generate_linear(&spec).unwrap();
    let config = TheilSenConfig {
        max_subpopulation: MaxSubpopulation::Limit(1000),
        ..seeded(0)
    };
    let fit = TheilSen::new(config).fit(&data.x, &data.y).unwrap();

    assert_eq!(fit.diagnostics().n_subpopulation, 1000);
    for (got, want) in fit.coefficients().iter().zip(data.coefficients.iter()) {
        assert_abs_diff_eq!(*got, *want, epsilon = 0.2);
    }
}

// ============================================================================
// Parallelism Tests
// ============================================================================

/// Worker count does not change the result for a fixed seed.
#[test]
fn test_parallel_and_sequential_fits_agree() {
    let data = generate_linear(&SyntheticSpec::default()).unwrap();

    let sequential = TheilSen::new(seeded(5)).fit(&data.x, &data.y).unwrap();
    let parallel = TheilSen::new(TheilSenConfig {
        n_jobs: Parallelism::Workers(4),
        ..seeded(5)
    })
    .fit(&data.x, &data.y)
    .unwrap();

    assert_eq!(parallel.diagnostics().n_workers, 4);
    assert_eq!(sequential.coefficients(), parallel.coefficients());
    assert_eq!(sequential.intercept(), parallel.intercept());
}

#[test]
fn test_all_cores_sentinel_runs() {
    let data = generate_linear(&SyntheticSpec {
        n_samples: 30,
        ..SyntheticSpec::default()
    })
    .unwrap();
    let fit = TheilSen::new(TheilSenConfig {
        n_jobs: Parallelism::AllCores,
        ..seeded(1)
    })
    .fit(&data.x, &data.y)
    .unwrap();
    assert!(fit.diagnostics().n_workers >= 1);
}

// ============================================================================
// Least-Squares Path Tests
// ============================================================================

/// One subset containing every row is an ordinary least-squares fit.
#[test]
fn test_full_size_subset_matches_least_squares() {
    let data = generate_linear(&SyntheticSpec::default()).unwrap();
    let fit = TheilSen::new(TheilSenConfig {
        n_subsamples: SubsampleSize::Fixed(100),
        ..seeded(0)
    })
    .fit(&data.x, &data.y)
    .unwrap();
    let (ols, _) = ordinary_least_squares(&data.x, &data.y, true).unwrap();

    assert_eq!(fit.diagnostics().n_subpopulation, 1);
    for (got, want) in fit.coefficients().iter().zip(ols.iter()) {
        assert_abs_diff_eq!(*got, *want, epsilon = 1e-9);
    }
}

/// More features than samples without intercept: plain least squares.
#[test]
fn test_underdetermined_without_intercept_is_least_squares() {
    let (x, y) = underdetermined(10, 20);
    let fit = TheilSen::new(TheilSenConfig {
        fit_intercept: false,
        ..seeded(0)
    })
    .fit(&x, &y)
    .unwrap();
    let (ols, _) = ordinary_least_squares(&x, &y, false).unwrap();

    assert_eq!(fit.diagnostics().path, FitPath::LeastSquares);
    assert_eq!(fit.intercept(), 0.0);
    for (got, want) in fit.coefficients().iter().zip(ols.iter()) {
        assert_abs_diff_eq!(*got, *want, epsilon = 1e-12);
    }
}

/// With an intercept the underdetermined fit interpolates the data.
#[test]
fn test_underdetermined_with_intercept_reproduces_targets() {
    let (x, y) = underdetermined(10, 20);
    let fit = TheilSen::new(seeded(0)).fit(&x, &y).unwrap();
    let pred = fit.predict(&x).unwrap();

    assert_eq!(fit.diagnostics().path, FitPath::LeastSquares);
    assert_eq!(fit.diagnostics().n_subsamples, 10);
    for (p, t) in pred.iter().zip(y.iter()) {
        assert_abs_diff_eq!(*p, *t, epsilon = 1e-9);
    }
}

#[test]
fn test_underdetermined_rejects_other_subset_sizes() {
    let (x, y) = underdetermined(10, 20);
    for n_subsamples in [9, 11] {
        let err = TheilSen::new(TheilSenConfig {
            n_subsamples: SubsampleSize::Fixed(n_subsamples),
            ..seeded(0)
        })
        .fit(&x, &y)
        .unwrap_err();
        assert!(matches!(err, TheilSenError::InvalidParameter(_)), "{err}");
    }
}

// ============================================================================
// Model File Tests
// ============================================================================

/// A fit exported to JSON predicts identically after reloading.
#[test]
fn test_model_json_predicts_like_original_fit() {
    let data = generate_linear(&SyntheticSpec {
        n_samples: 40,
        ..SyntheticSpec::default()
    })
    .unwrap();
    let config = seeded(9);
    let fit = TheilSen::new(config.clone()).fit(&data.x, &data.y).unwrap();

    let names = vec!["x1".to_string(), "x2".to_string()];
    let model = to_model_file(&fit, &names, "y", &config);
    let json = serde_json::to_string(&model).unwrap();
    let reloaded = fit_from_model_file(&serde_json::from_str(&json).unwrap()).unwrap();

    let before = fit.predict(&data.x).unwrap();
    let after = reloaded.predict(&data.x).unwrap();
    for (a, b) in after.iter().zip(before.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
    }
    assert_abs_diff_eq!(reloaded.breakdown_point(), fit.breakdown_point(), epsilon = 1e-15);
}
