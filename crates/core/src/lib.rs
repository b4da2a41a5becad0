//! Spectral null initializer for phase-retrieval pipelines.
//!
//! Given a sensing operator, its adjoint, and magnitude-only measurements,
//! compute a starting estimate of the unknown signal: select the
//! low-magnitude measurement subset, extract the smallest eigenvector of
//! the implicit operator `Aᴴ diag(I) A`, and rescale it against the
//! held-out measurements.

pub mod eigensolver;
pub mod error;
pub mod initializer;
pub mod io;
pub mod metrics;
pub mod operator;
pub mod selector;

#[cfg(test)]
mod _tests_initializer;
