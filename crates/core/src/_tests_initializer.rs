#![cfg(test)]

use num_complex::Complex64;

use super::eigensolver::{conj_dot, norm};
use super::error::InitError;
use super::initializer::{
    magnitude_rescale, null_initializer, NullInitOptions, Verbosity,
};
use super::operator::{DenseOperator, MatrixFreeOperator, SensingOperator};
use super::selector;

fn quiet_opts() -> NullInitOptions {
    NullInitOptions {
        verbosity: Verbosity::Quiet,
        ..NullInitOptions::default()
    }
}

/// Deterministic quasi-random value; the quadratic phase keeps matrices
/// built from it full rank (an affine phase would collapse to rank two).
fn chirp(k: usize) -> f64 {
    let t = k as f64;
    (0.5 * t * t + 0.3 * t + 0.1).sin()
}

fn chirp_matrix(m: usize, n: usize) -> DenseOperator {
    let data: Vec<Complex64> = (0..m * n)
        .map(|k| Complex64::new(chirp(k), 0.0))
        .collect();
    DenseOperator::new(m, n, data).expect("fixture dimensions are valid")
}

fn concrete_operator() -> DenseOperator {
    DenseOperator::from_real_rows(&[
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 1.0],
        vec![1.0, -1.0],
    ])
    .expect("valid matrix")
}

fn measure<O: SensingOperator>(op: &O, x: &[Complex64]) -> Vec<f64> {
    let mut image = vec![Complex64::ZERO; op.rows()];
    op.apply(x, &mut image);
    image.iter().map(|value| value.norm()).collect()
}

fn cosine(a: &[Complex64], b: &[Complex64]) -> f64 {
    conj_dot(a, b).norm() / (norm(a) * norm(b))
}

#[test]
fn concrete_four_by_two_scenario() {
    let op = concrete_operator();
    let b0 = [1.0, 0.0, 1.0, 1.0];
    let estimate = null_initializer(&op, &b0, &quiet_opts()).expect("must produce an estimate");

    let truth = [Complex64::new(1.0, 0.0), Complex64::ZERO];
    let alignment = cosine(&estimate, &truth);
    assert!(
        alignment >= 0.8,
        "estimate should align with [1, 0] up to the mask tie-break, cosine={alignment}"
    );
    let magnitude = norm(&estimate);
    assert!(
        (0.5..1.2).contains(&magnitude),
        "rescaled magnitude should be near 1, got {magnitude}"
    );
}

#[test]
fn recovers_synthetic_signal_direction() {
    let n = 6;
    let m = 96;
    let op = chirp_matrix(m, n);
    let x_true: Vec<Complex64> = (0..n)
        .map(|j| Complex64::new((1.7 * j as f64 + 0.2).cos(), 0.0))
        .collect();
    let b0 = measure(&op, &x_true);

    let estimate = null_initializer(&op, &b0, &quiet_opts()).expect("must converge");
    let alignment = cosine(&estimate, &x_true);
    assert!(
        alignment > 0.9,
        "spectral recovery too weak at 16x oversampling: cosine={alignment}"
    );
}

#[test]
fn recovers_complex_signal_direction() {
    let n = 2;
    let m = 16;
    let data: Vec<Complex64> = (0..m * n)
        .map(|k| Complex64::new(chirp(k), chirp(k + 7919)))
        .collect();
    let op = DenseOperator::new(m, n, data).expect("valid matrix");
    let x_true = [Complex64::new(0.8, 0.3), Complex64::new(-0.2, 0.6)];
    let b0 = measure(&op, &x_true);

    let estimate = null_initializer(&op, &b0, &quiet_opts()).expect("must converge");
    let alignment = cosine(&estimate, &x_true);
    assert!(
        alignment > 0.8,
        "complex recovery too weak: cosine={alignment}"
    );
}

#[test]
fn rescale_is_idempotent() {
    let op = concrete_operator();
    let b0 = [1.0, 0.0, 1.0, 1.0];
    let mask = selector::select_low_magnitude(&b0, 0.5).expect("valid input");
    let x = [Complex64::new(0.6, 0.0), Complex64::new(0.0, 0.3)];

    let (scaled, first) = magnitude_rescale(&op, &mask, &b0, &x).expect("non-degenerate");
    assert!(first.is_finite() && first != 0.0);
    let (_, second) = magnitude_rescale(&op, &mask, &b0, &scaled).expect("non-degenerate");
    assert!(
        (second - 1.0).abs() < 1e-12,
        "second rescale should be a no-op, got scale {second}"
    );
}

#[test]
fn zero_measurements_with_zero_operator_are_degenerate() {
    // Degeneracy is a property of the model magnitudes |A x0|, not of b0:
    // all-zero measurements with a generic operator still rescale (to a
    // zero-scale estimate). A zero operator makes A x0 vanish on the
    // held-out rows, which is the case the denominator guard rejects.
    let op = DenseOperator::new(4, 2, vec![Complex64::ZERO; 8]).expect("valid dimensions");
    let b0 = [0.0; 4];
    let err = null_initializer(&op, &b0, &quiet_opts())
        .expect_err("model magnitudes vanish on the held-out set");
    assert!(matches!(err, InitError::DegenerateScale));
}

#[test]
fn measurement_length_mismatch_is_reported() {
    let op = concrete_operator();
    let b0 = [1.0, 0.0, 1.0];
    let err = null_initializer(&op, &b0, &quiet_opts()).expect_err("length mismatch");
    match err {
        InitError::DimensionMismatch { expected, got } => {
            assert_eq!(expected, 4);
            assert_eq!(got, 3);
        }
        other => panic!("expected DimensionMismatch, got {other:?}"),
    }
}

#[test]
fn negative_measurement_is_rejected() {
    let op = concrete_operator();
    let b0 = [1.0, -1.0, 1.0, 1.0];
    let err = null_initializer(&op, &b0, &quiet_opts()).expect_err("negative magnitude");
    assert!(matches!(err, InitError::InvalidInput(_)));
}

#[test]
fn matrix_free_and_dense_paths_agree() {
    let dense = chirp_matrix(24, 4);
    let forward_op = dense.clone();
    let adjoint_op = dense.clone();
    let implicit = MatrixFreeOperator::new(
        24,
        4,
        move |x: &[Complex64], out: &mut [Complex64]| forward_op.apply(x, out),
        move |y: &[Complex64], out: &mut [Complex64]| adjoint_op.apply_adjoint(y, out),
    )
    .expect("valid dimensions");

    let x_true: Vec<Complex64> = (0..4)
        .map(|j| Complex64::new((0.9 * j as f64 + 0.4).sin(), 0.0))
        .collect();
    let b0 = measure(&dense, &x_true);

    let from_dense = null_initializer(&dense, &b0, &quiet_opts()).expect("dense path");
    let from_implicit = null_initializer(&implicit, &b0, &quiet_opts()).expect("implicit path");
    for (idx, (got, want)) in from_implicit.iter().zip(from_dense.iter()).enumerate() {
        assert!(
            (got - want).norm() < 1e-10,
            "estimates diverge at index {idx}: {got} vs {want}"
        );
    }
}

#[test]
fn custom_gamma_changes_the_partition() {
    let op = chirp_matrix(20, 3);
    let x_true: Vec<Complex64> = (0..3)
        .map(|j| Complex64::new((0.8 * j as f64 + 0.1).cos(), 0.0))
        .collect();
    let b0 = measure(&op, &x_true);

    let opts = NullInitOptions {
        gamma: 0.7,
        ..quiet_opts()
    };
    let estimate = null_initializer(&op, &b0, &opts).expect("must converge");
    assert_eq!(estimate.len(), 3);
    assert!(norm(&estimate) > 0.0);
}
