//! Matrix-free Lanczos solver for the smallest eigenpair of a Hermitian
//! positive semi-definite operator.
//!
//! The operator is only ever touched through its action on a vector, so the
//! masked normal operator `Aᴴ diag(I) A` never has to be materialized. One
//! solve runs restarted Lanczos with full reorthogonalization: build a
//! Krylov basis, diagonalize the real symmetric tridiagonal projection,
//! take the smallest Ritz pair, and restart from it until the residual
//! estimate `β_k |s_k|` drops below the requested tolerance. A breakdown
//! (β numerically zero) means the Krylov subspace is invariant and the
//! Ritz pair is exact.
//!
//! For a Hermitian PSD operator the smallest algebraic eigenvalue and the
//! eigenvalue of smallest real part coincide, so a single solver covers
//! both phrasings of the target.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::InitError;

/// Relative β threshold below which a Lanczos step is treated as an exact
/// invariant subspace rather than a continuation.
const BREAKDOWN_TOL: f64 = 1e-14;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EigenOptions {
    /// Krylov basis size per restart cycle (capped at the problem
    /// dimension).
    pub max_subspace: usize,
    /// Restart budget before the solve is declared non-convergent.
    pub max_restarts: usize,
    /// Residual tolerance, relative to the largest Ritz magnitude.
    pub tol: f64,
}

impl Default for EigenOptions {
    fn default() -> Self {
        Self {
            max_subspace: 48,
            max_restarts: 60,
            tol: 1e-10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EigenResult {
    /// Smallest Ritz value at convergence.
    pub eigenvalue: f64,
    /// Unit-norm eigenvector estimate (global phase arbitrary).
    pub vector: Vec<Complex64>,
    /// Final residual estimate `β_k |s_k|`.
    pub residual: f64,
    /// Total operator applications across all restart cycles.
    pub applications: usize,
    /// Restart cycles consumed before convergence.
    pub restarts: usize,
}

/// Compute the smallest eigenpair of the Hermitian operator realized by
/// `operator`, which must write `Y x` into its output slice.
pub fn smallest_eigenpair<F>(
    mut operator: F,
    n: usize,
    opts: &EigenOptions,
) -> Result<EigenResult, InitError>
where
    F: FnMut(&[Complex64], &mut [Complex64]),
{
    if n == 0 {
        return Err(InitError::InvalidInput(
            "eigenproblem dimension must be non-zero".to_string(),
        ));
    }

    let max_subspace = opts.max_subspace.max(2).min(n);
    let mut seed = initial_vector(n);
    let mut applications = 0usize;
    let mut last_residual = f64::INFINITY;

    for restart in 0..=opts.max_restarts {
        let cycle = lanczos_cycle(&mut operator, &seed, max_subspace, &mut applications);
        let k = cycle.alphas.len();
        let (values, vectors) = tridiagonal_eigendecomposition(&cycle.alphas, &cycle.betas);
        let theta = values[0];
        let ritz_scale = values[k - 1].abs().max(theta.abs());

        // Ritz vector for the smallest eigenvalue: x = Σ_j basis_j s_j.
        let mut x = vec![Complex64::ZERO; n];
        for (j, basis_vector) in cycle.basis.iter().enumerate() {
            let coeff = vectors[j * k];
            if coeff != 0.0 {
                axpy(Complex64::new(coeff, 0.0), basis_vector, &mut x);
            }
        }
        normalize(&mut x);

        let residual = cycle.beta_out * vectors[(k - 1) * k].abs();
        if cycle.breakdown || residual <= opts.tol * ritz_scale.max(f64::MIN_POSITIVE) {
            return Ok(EigenResult {
                eigenvalue: theta,
                vector: x,
                residual,
                applications,
                restarts: restart,
            });
        }

        last_residual = residual;
        seed = x;
    }

    Err(InitError::Convergence {
        restarts: opts.max_restarts,
        residual: last_residual,
        tol: opts.tol,
    })
}

struct LanczosCycle {
    basis: Vec<Vec<Complex64>>,
    alphas: Vec<f64>,
    betas: Vec<f64>,
    /// β linking the last basis vector out of the subspace; zero on
    /// breakdown.
    beta_out: f64,
    breakdown: bool,
}

fn lanczos_cycle<F>(
    operator: &mut F,
    seed: &[Complex64],
    max_subspace: usize,
    applications: &mut usize,
) -> LanczosCycle
where
    F: FnMut(&[Complex64], &mut [Complex64]),
{
    let n = seed.len();
    let mut basis: Vec<Vec<Complex64>> = Vec::with_capacity(max_subspace);
    let mut alphas = Vec::with_capacity(max_subspace);
    let mut betas: Vec<f64> = Vec::with_capacity(max_subspace.saturating_sub(1));

    let mut q = seed.to_vec();
    normalize(&mut q);
    let mut w = vec![Complex64::ZERO; n];
    let mut beta_out = 0.0;
    let mut breakdown = false;

    for step in 0..max_subspace {
        operator(&q, &mut w);
        *applications += 1;

        let alpha = conj_dot(&q, &w).re;
        axpy(Complex64::new(-alpha, 0.0), &q, &mut w);
        if step > 0 {
            let beta_prev = betas[step - 1];
            axpy(Complex64::new(-beta_prev, 0.0), &basis[step - 1], &mut w);
        }
        basis.push(std::mem::take(&mut q));
        alphas.push(alpha);

        // Full reorthogonalization; the three-term recurrence alone loses
        // orthogonality as soon as a Ritz pair starts converging.
        for basis_vector in &basis {
            let overlap = conj_dot(basis_vector, &w);
            axpy(-overlap, basis_vector, &mut w);
        }

        let beta = norm(&w);
        let scale = alphas
            .iter()
            .map(|a| a.abs())
            .chain(betas.iter().copied())
            .fold(beta, f64::max);
        if beta <= BREAKDOWN_TOL * scale.max(f64::MIN_POSITIVE) {
            breakdown = true;
            beta_out = 0.0;
            break;
        }

        if step + 1 == max_subspace {
            beta_out = beta;
            break;
        }

        betas.push(beta);
        q = w.clone();
        scale_in_place(1.0 / beta, &mut q);
    }

    LanczosCycle {
        basis,
        alphas,
        betas,
        beta_out,
        breakdown,
    }
}

/// Eigendecomposition of the real symmetric tridiagonal matrix with
/// diagonal `alphas` and off-diagonal `betas`.
///
/// Returns eigenvalues sorted ascending and eigenvectors in row-major
/// layout: `vectors[row * k + col]` is component `row` of eigenvector
/// `col`. Subspace dimensions here are tiny (≤ max_subspace), so cyclic
/// Jacobi sweeps on the densified matrix are robust and cheap.
fn tridiagonal_eigendecomposition(alphas: &[f64], betas: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let k = alphas.len();
    debug_assert_eq!(betas.len() + 1, k.max(1));

    if k == 1 {
        return (vec![alphas[0]], vec![1.0]);
    }

    let mut work = vec![0.0f64; k * k];
    for (i, &alpha) in alphas.iter().enumerate() {
        work[i * k + i] = alpha;
    }
    for (i, &beta) in betas.iter().enumerate() {
        work[i * k + i + 1] = beta;
        work[(i + 1) * k + i] = beta;
    }

    let mut vectors = vec![0.0f64; k * k];
    for i in 0..k {
        vectors[i * k + i] = 1.0;
    }

    const MAX_SWEEPS: usize = 64;
    const TOL: f64 = 1e-15;

    for _sweep in 0..MAX_SWEEPS {
        let mut max_off = 0.0f64;

        for p in 0..k {
            for q in (p + 1)..k {
                let apq = work[p * k + q];
                let apq_abs = apq.abs();
                if apq_abs > max_off {
                    max_off = apq_abs;
                }
                if apq_abs < TOL {
                    continue;
                }

                let app = work[p * k + p];
                let aqq = work[q * k + q];
                let tau = (aqq - app) / (2.0 * apq);
                let t = if tau >= 0.0 {
                    1.0 / (tau + (1.0 + tau * tau).sqrt())
                } else {
                    -1.0 / (-tau + (1.0 + tau * tau).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;

                work[p * k + p] = app - t * apq;
                work[q * k + q] = aqq + t * apq;
                work[p * k + q] = 0.0;
                work[q * k + p] = 0.0;

                for r in 0..k {
                    if r != p && r != q {
                        let arp = work[r * k + p];
                        let arq = work[r * k + q];
                        let new_arp = c * arp - s * arq;
                        let new_arq = s * arp + c * arq;
                        work[r * k + p] = new_arp;
                        work[p * k + r] = new_arp;
                        work[r * k + q] = new_arq;
                        work[q * k + r] = new_arq;
                    }
                }

                for r in 0..k {
                    let vrp = vectors[r * k + p];
                    let vrq = vectors[r * k + q];
                    vectors[r * k + p] = c * vrp - s * vrq;
                    vectors[r * k + q] = s * vrp + c * vrq;
                }
            }
        }

        if max_off < TOL {
            break;
        }
    }

    let eigenvalues: Vec<f64> = (0..k).map(|i| work[i * k + i]).collect();
    let mut indices: Vec<usize> = (0..k).collect();
    indices.sort_by(|&a, &b| eigenvalues[a].partial_cmp(&eigenvalues[b]).unwrap());

    let sorted_values: Vec<f64> = indices.iter().map(|&i| eigenvalues[i]).collect();
    let mut sorted_vectors = vec![0.0f64; k * k];
    for (new_col, &old_col) in indices.iter().enumerate() {
        for row in 0..k {
            sorted_vectors[row * k + new_col] = vectors[row * k + old_col];
        }
    }

    (sorted_values, sorted_vectors)
}

/// Deterministic non-degenerate starting vector; exercises both real and
/// imaginary components so complex operators get a generic seed.
fn initial_vector(n: usize) -> Vec<Complex64> {
    let mut seed: Vec<Complex64> = (0..n)
        .map(|idx| {
            let t = idx as f64 + 0.5;
            Complex64::new(t.cos(), (0.37 * t + 0.21).sin() * 0.5)
        })
        .collect();
    normalize(&mut seed);
    seed
}

/// Conjugate dot product `⟨x, y⟩ = xᴴ · y` (first argument conjugated).
pub(crate) fn conj_dot(x: &[Complex64], y: &[Complex64]) -> Complex64 {
    x.iter().zip(y).map(|(a, b)| a.conj() * b).sum()
}

pub(crate) fn norm(x: &[Complex64]) -> f64 {
    x.iter().map(|value| value.norm_sqr()).sum::<f64>().sqrt()
}

pub(crate) fn axpy(alpha: Complex64, x: &[Complex64], y: &mut [Complex64]) {
    for (dst, src) in y.iter_mut().zip(x) {
        *dst += alpha * src;
    }
}

fn scale_in_place(alpha: f64, x: &mut [Complex64]) {
    for value in x.iter_mut() {
        *value *= alpha;
    }
}

fn normalize(x: &mut [Complex64]) {
    let length = norm(x);
    if length > 0.0 {
        scale_in_place(1.0 / length, x);
    }
}
