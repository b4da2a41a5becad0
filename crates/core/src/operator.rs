//! Sensing-operator adapters (dense matrix and matrix-free closures).

use num_complex::Complex64;
use rayon::prelude::*;

use crate::error::InitError;

/// A linear sensing map together with its adjoint.
///
/// `apply_adjoint` must be the exact conjugate transpose of `apply`: the
/// spectral solver treats the composed masked operator `Aᴴ diag(I) A` as
/// Hermitian and inherits any adjoint mismatch as silent corruption rather
/// than a detectable error.
///
/// Implementations write into a caller-provided output slice whose length
/// must match the advertised dimension (`rows()` for `apply`, `cols()` for
/// `apply_adjoint`). The core never mutates or retains the operator beyond
/// one invocation.
pub trait SensingOperator {
    /// Output dimension of the forward map (measurement count m).
    fn rows(&self) -> usize;
    /// Input dimension of the forward map (signal length n).
    fn cols(&self) -> usize;
    /// Forward application `y = A x`.
    fn apply(&self, input: &[Complex64], output: &mut [Complex64]);
    /// Adjoint application `x = Aᴴ y`.
    fn apply_adjoint(&self, input: &[Complex64], output: &mut [Complex64]);
}

/// Dense row-major matrix adapter.
///
/// Dimensions are derived from the matrix shape, so callers supplying a
/// dense operator never pass `m`/`n` explicitly.
#[derive(Debug, Clone)]
pub struct DenseOperator {
    rows: usize,
    cols: usize,
    data: Vec<Complex64>,
}

impl DenseOperator {
    /// Wrap a row-major complex matrix.
    pub fn new(rows: usize, cols: usize, data: Vec<Complex64>) -> Result<Self, InitError> {
        if rows == 0 || cols == 0 {
            return Err(InitError::InvalidInput(
                "dense operator must have non-zero dimensions".to_string(),
            ));
        }
        if data.len() != rows * cols {
            return Err(InitError::InvalidInput(format!(
                "dense operator storage has {} entries, expected {}x{}={}",
                data.len(),
                rows,
                cols,
                rows * cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from real-valued row slices (the configuration-file path).
    pub fn from_real_rows(rows: &[Vec<f64>]) -> Result<Self, InitError> {
        let m = rows.len();
        let n = rows.first().map(|row| row.len()).unwrap_or(0);
        if m == 0 || n == 0 {
            return Err(InitError::InvalidInput(
                "dense operator must have non-zero dimensions".to_string(),
            ));
        }
        let mut data = Vec::with_capacity(m * n);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(InitError::InvalidInput(format!(
                    "row {idx} has {} entries, expected {n}",
                    row.len()
                )));
            }
            data.extend(row.iter().map(|&value| Complex64::new(value, 0.0)));
        }
        Ok(Self {
            rows: m,
            cols: n,
            data,
        })
    }

    pub fn row(&self, row: usize) -> &[Complex64] {
        let offset = row * self.cols;
        &self.data[offset..offset + self.cols]
    }
}

impl SensingOperator for DenseOperator {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn apply(&self, input: &[Complex64], output: &mut [Complex64]) {
        assert_eq!(input.len(), self.cols, "input length must match cols");
        assert_eq!(output.len(), self.rows, "output length must match rows");
        output.par_iter_mut().enumerate().for_each(|(row, value)| {
            let offset = row * self.cols;
            let mut accum = Complex64::ZERO;
            for (coeff, entry) in self.data[offset..offset + self.cols].iter().zip(input) {
                accum += coeff * entry;
            }
            *value = accum;
        });
    }

    fn apply_adjoint(&self, input: &[Complex64], output: &mut [Complex64]) {
        assert_eq!(input.len(), self.rows, "input length must match rows");
        assert_eq!(output.len(), self.cols, "output length must match cols");
        output.par_iter_mut().enumerate().for_each(|(col, value)| {
            let mut accum = Complex64::ZERO;
            for (row, entry) in input.iter().enumerate() {
                accum += self.data[row * self.cols + col].conj() * entry;
            }
            *value = accum;
        });
    }
}

/// Matrix-free adapter around caller-supplied forward/adjoint closures.
///
/// Both closures and both dimensions are required up front; nothing is
/// inferred for implicit operators.
pub struct MatrixFreeOperator<F, G>
where
    F: Fn(&[Complex64], &mut [Complex64]),
    G: Fn(&[Complex64], &mut [Complex64]),
{
    rows: usize,
    cols: usize,
    forward: F,
    adjoint: G,
}

impl<F, G> MatrixFreeOperator<F, G>
where
    F: Fn(&[Complex64], &mut [Complex64]),
    G: Fn(&[Complex64], &mut [Complex64]),
{
    pub fn new(rows: usize, cols: usize, forward: F, adjoint: G) -> Result<Self, InitError> {
        if rows == 0 || cols == 0 {
            return Err(InitError::InvalidInput(
                "matrix-free operator must have non-zero dimensions".to_string(),
            ));
        }
        Ok(Self {
            rows,
            cols,
            forward,
            adjoint,
        })
    }
}

impl<F, G> SensingOperator for MatrixFreeOperator<F, G>
where
    F: Fn(&[Complex64], &mut [Complex64]),
    G: Fn(&[Complex64], &mut [Complex64]),
{
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn apply(&self, input: &[Complex64], output: &mut [Complex64]) {
        assert_eq!(input.len(), self.cols, "input length must match cols");
        assert_eq!(output.len(), self.rows, "output length must match rows");
        (self.forward)(input, output);
    }

    fn apply_adjoint(&self, input: &[Complex64], output: &mut [Complex64]) {
        assert_eq!(input.len(), self.rows, "input length must match rows");
        assert_eq!(output.len(), self.cols, "output length must match cols");
        (self.adjoint)(input, output);
    }
}
