//! Configuration file parsing for dense initializer jobs.
//!
//! The main type is `JobConfig`, parseable from a TOML file by the CLI and
//! convertible into a dense operator plus initializer options.
//!
//! # File Format
//!
//! Top-level keys come first; TOML attaches any key after a table header
//! to that table, so `measurements` and `gamma` must precede `[operator]`.
//!
//! ```toml
//! measurements = [1.0, 0.0, 1.0, 1.0]
//! gamma = 0.5
//!
//! [operator]
//! rows = [
//!     [1.0, 0.0],
//!     [0.0, 1.0],
//!     [1.0, 1.0],
//!     [1.0, -1.0],
//! ]
//!
//! [eigensolver]
//! max_subspace = 48
//! max_restarts = 60
//! tol = 1e-10
//!
//! [metrics]
//! enabled = false
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    eigensolver::EigenOptions,
    error::InitError,
    initializer::{NullInitOptions, Verbosity},
    metrics::MetricsConfig,
    operator::DenseOperator,
};

/// Dense operator specification: real-valued rows of equal length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub rows: Vec<Vec<f64>>,
}

/// One initializer job, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub operator: OperatorConfig,
    /// Observed measurement magnitudes, one per operator row.
    pub measurements: Vec<f64>,
    /// Fraction of measurements excluded as too signal-correlated.
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default)]
    pub eigensolver: EigenOptions,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_gamma() -> f64 {
    0.5
}

impl JobConfig {
    /// Build the dense operator described by the `[operator]` section.
    pub fn build_operator(&self) -> Result<DenseOperator, InitError> {
        DenseOperator::from_real_rows(&self.operator.rows)
    }

    pub fn init_options(&self, verbosity: Verbosity) -> NullInitOptions {
        NullInitOptions {
            gamma: self.gamma,
            eigensolver: self.eigensolver.clone(),
            verbosity,
        }
    }
}
