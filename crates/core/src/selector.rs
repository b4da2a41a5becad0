//! Low-magnitude measurement selection.
//!
//! The null initializer keeps the measurements *least* correlated with the
//! unknown signal: rank all magnitudes, drop the largest γ·m of them, and
//! mark the remaining (1−γ)·m smallest as included. The implicit operator
//! `Aᴴ diag(I) A` is then built from the included subset only.

use serde::{Deserialize, Serialize};

use crate::error::InitError;

/// Boolean include-mask over the measurement vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionMask {
    include: Vec<bool>,
    included: usize,
}

impl SelectionMask {
    /// Total number of measurements.
    pub fn len(&self) -> usize {
        self.include.len()
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }

    /// Count of included (small-magnitude) measurements.
    pub fn included(&self) -> usize {
        self.included
    }

    /// Count of excluded (large-magnitude) measurements, used by the
    /// rescaling fit.
    pub fn excluded(&self) -> usize {
        self.include.len() - self.included
    }

    pub fn is_included(&self, idx: usize) -> bool {
        self.include[idx]
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.include
    }
}

/// Rank measurements by magnitude and include the smallest `(1−γ)·m`.
///
/// The sort is stable and descending, so the partition boundary for tied
/// magnitudes follows the original measurement ordering. Which of two equal
/// values lands on either side of the boundary is accepted nondeterminism
/// of the method, not something this function tries to resolve.
///
/// A measurement count too small to condition the masked operator is a
/// quality risk for the downstream eigensolve, not an error here.
pub fn select_low_magnitude(b0: &[f64], gamma: f64) -> Result<SelectionMask, InitError> {
    if !(gamma > 0.0 && gamma < 1.0) {
        return Err(InitError::InvalidInput(format!(
            "exclusion fraction gamma must lie in (0, 1), got {gamma}"
        )));
    }
    for (idx, &value) in b0.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(InitError::InvalidInput(format!(
                "measurement {idx} is {value}; magnitudes must be finite and non-negative"
            )));
        }
    }

    let m = b0.len();
    let mut order: Vec<usize> = (0..m).collect();
    // Entries are finite by the check above, so partial_cmp cannot fail.
    order.sort_by(|&a, &b| b0[b].partial_cmp(&b0[a]).unwrap());

    let boundary = ((m as f64) * gamma).round() as usize;
    let boundary = boundary.min(m);
    let mut include = vec![false; m];
    for &idx in &order[boundary..] {
        include[idx] = true;
    }

    Ok(SelectionMask {
        include,
        included: m - boundary,
    })
}
