//! Null initializer pipeline: subset selection, spectral solve, magnitude
//! rescale.

use std::time::Instant;

use num_complex::Complex64;

use crate::{
    eigensolver::{self, EigenOptions},
    error::InitError,
    metrics::{MetricsEvent, MetricsRecorder},
    operator::SensingOperator,
    selector::{self, SelectionMask},
};

/// Denominator floor for the least-squares rescale. The eigenvector is
/// unit-norm, so a sum of squared model magnitudes at or below this level
/// means the excluded rows annihilate the estimate.
const MIN_RESCALE_DENOM: f64 = 1e-30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Verbose,
}

impl Verbosity {
    fn enabled(self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::Verbose
    }
}

#[derive(Debug, Clone)]
pub struct NullInitOptions {
    /// Fraction of measurements excluded as too correlated with the signal.
    pub gamma: f64,
    pub eigensolver: EigenOptions,
    /// Progress text on stderr; never changes the computed estimate.
    pub verbosity: Verbosity,
}

impl Default for NullInitOptions {
    fn default() -> Self {
        Self {
            gamma: 0.5,
            eigensolver: EigenOptions::default(),
            verbosity: Verbosity::default(),
        }
    }
}

/// Compute the null-initializer estimate for one set of magnitude
/// measurements.
pub fn null_initializer<O: SensingOperator>(
    op: &O,
    b0: &[f64],
    opts: &NullInitOptions,
) -> Result<Vec<Complex64>, InitError> {
    null_initializer_with_metrics(op, b0, opts, None)
}

/// As [`null_initializer`], additionally emitting per-stage metrics events.
pub fn null_initializer_with_metrics<O: SensingOperator>(
    op: &O,
    b0: &[f64],
    opts: &NullInitOptions,
    metrics: Option<&MetricsRecorder>,
) -> Result<Vec<Complex64>, InitError> {
    let pipeline_start = Instant::now();
    let m = op.rows();
    let n = op.cols();
    if m == 0 || n == 0 {
        return Err(InitError::InvalidInput(
            "sensing operator must have non-zero dimensions".to_string(),
        ));
    }
    if b0.len() != m {
        return Err(InitError::DimensionMismatch {
            expected: m,
            got: b0.len(),
        });
    }

    if opts.verbosity.enabled() {
        eprintln!(
            "[init] m={} n={} gamma={} max_subspace={} max_restarts={} tol={}",
            m,
            n,
            opts.gamma,
            opts.eigensolver.max_subspace,
            opts.eigensolver.max_restarts,
            opts.eigensolver.tol
        );
    }
    if let Some(recorder) = metrics {
        recorder.emit(MetricsEvent::InitStart {
            rows: m,
            cols: n,
            gamma: opts.gamma,
            max_subspace: opts.eigensolver.max_subspace,
            max_restarts: opts.eigensolver.max_restarts,
            tol: opts.eigensolver.tol,
        });
    }

    let mask_start = Instant::now();
    let mask = selector::select_low_magnitude(b0, opts.gamma)?;
    let mask_elapsed = mask_start.elapsed();
    if opts.verbosity.enabled() {
        eprintln!(
            "[mask] included={} excluded={} elapsed={:.2?}",
            mask.included(),
            mask.excluded(),
            mask_elapsed
        );
    }
    if let Some(recorder) = metrics {
        recorder.emit(MetricsEvent::MaskSelected {
            included: mask.included(),
            excluded: mask.excluded(),
            duration_ms: mask_elapsed.as_secs_f64() * 1000.0,
        });
    }

    // Action of Y = Aᴴ diag(I) A through forward, mask, adjoint. The
    // forward buffer is reused across all Lanczos applications.
    let eig_start = Instant::now();
    let mut forward = vec![Complex64::ZERO; m];
    let apply_y = |x: &[Complex64], out: &mut [Complex64]| {
        op.apply(x, &mut forward);
        for (value, &keep) in forward.iter_mut().zip(mask.as_slice()) {
            if !keep {
                *value = Complex64::ZERO;
            }
        }
        op.apply_adjoint(&forward, out);
    };
    let eig = eigensolver::smallest_eigenpair(apply_y, n, &opts.eigensolver)?;
    let eig_elapsed = eig_start.elapsed();
    if opts.verbosity.enabled() {
        eprintln!(
            "[eig] lambda={:.6e} residual={:.3e} applications={} restarts={} elapsed={:.2?}",
            eig.eigenvalue, eig.residual, eig.applications, eig.restarts, eig_elapsed
        );
    }
    if let Some(recorder) = metrics {
        recorder.emit(MetricsEvent::EigenSolve {
            eigenvalue: eig.eigenvalue,
            residual: eig.residual,
            applications: eig.applications,
            restarts: eig.restarts,
            duration_ms: eig_elapsed.as_secs_f64() * 1000.0,
        });
    }

    let rescale_start = Instant::now();
    let (estimate, scale) = magnitude_rescale(op, &mask, b0, &eig.vector)?;
    let rescale_elapsed = rescale_start.elapsed();
    if opts.verbosity.enabled() {
        eprintln!(
            "[rescale] scale={:.6e} held_out={} elapsed={:.2?}",
            scale,
            mask.excluded(),
            rescale_elapsed
        );
        eprintln!("[done] estimate ready in {:.2?}", pipeline_start.elapsed());
    }
    if let Some(recorder) = metrics {
        recorder.emit(MetricsEvent::Rescale {
            scale,
            held_out: mask.excluded(),
            duration_ms: rescale_elapsed.as_secs_f64() * 1000.0,
        });
        recorder.emit(MetricsEvent::InitDone {
            duration_ms: pipeline_start.elapsed().as_secs_f64() * 1000.0,
        });
    }

    Ok(estimate)
}

/// Closed-form least-squares magnitude fit over the excluded measurements.
///
/// With held-out magnitudes `b` and model magnitudes `ax = |A x0|` on the
/// excluded set, the scale minimizing `‖s·ax − b‖²` is `⟨ax, b⟩/⟨ax, ax⟩`.
/// Returns the scaled estimate together with the scale factor so callers
/// can observe idempotence (rescaling an already-scaled estimate yields
/// `s ≈ 1`).
pub fn magnitude_rescale<O: SensingOperator>(
    op: &O,
    mask: &SelectionMask,
    b0: &[f64],
    x0: &[Complex64],
) -> Result<(Vec<Complex64>, f64), InitError> {
    let mut model = vec![Complex64::ZERO; op.rows()];
    op.apply(x0, &mut model);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (idx, value) in model.iter().enumerate() {
        if mask.is_included(idx) {
            continue;
        }
        let ax = value.norm();
        numerator += ax * b0[idx];
        denominator += ax * ax;
    }

    if denominator <= MIN_RESCALE_DENOM {
        return Err(InitError::DegenerateScale);
    }

    let scale = numerator / denominator;
    let estimate = x0.iter().map(|&value| value * scale).collect();
    Ok((estimate, scale))
}
