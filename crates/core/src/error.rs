//! Error kinds surfaced by the null initializer.

use thiserror::Error;

/// Failures of one initializer invocation.
///
/// All errors surface immediately to the caller; nothing is retried and no
/// partial estimate is returned alongside an error.
#[derive(Debug, Error)]
pub enum InitError {
    /// Construction-time validation failure: zero operator dimension,
    /// exclusion fraction outside (0, 1), or a non-finite / negative
    /// measurement entry.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Measurement vector length disagrees with the operator's row count.
    #[error("measurement vector has {got} entries but the operator produces {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The eigensolver exhausted its restart budget before reaching the
    /// requested residual tolerance.
    #[error(
        "eigensolver failed to converge after {restarts} restarts \
         (residual {residual:.3e}, tol {tol:.3e})"
    )]
    Convergence {
        restarts: usize,
        residual: f64,
        tol: f64,
    },

    /// The least-squares rescale denominator is numerically zero: the model
    /// magnitudes vanish on every held-out measurement.
    #[error("rescale denominator is numerically zero on the held-out measurement set")]
    DegenerateScale,
}
