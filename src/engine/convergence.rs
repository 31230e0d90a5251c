//! Convergence analysis over milestone records.
//!
//! # Governing Equations
//!
//! ```text
//! Standard Error:   SE(π̂) = 4 · √(p(1-p)/n),   p = inside / n
//! Convergence Rate: |π̂ - π| ~ O(n^{-1/2})     (log-log slope ≈ -0.5)
//! ```

use serde::{Deserialize, Serialize};

use super::sampler::RunningCount;
use super::state::{EstimateRecord, RunState};

/// Log-log slope predicted by the central limit theorem.
pub const CLT_SLOPE: f64 = -0.5;

/// Log-log regression slope of absolute error against sample count.
///
/// Records with zero error are skipped. Returns `None` with fewer than three
/// usable records or when every record shares one `n`.
#[must_use]
pub fn convergence_slope(records: &[EstimateRecord]) -> Option<f64> {
    let points: Vec<(f64, f64)> = records
        .iter()
        .filter(|r| r.n > 0 && r.absolute_error > f64::EPSILON)
        .map(|r| ((r.n as f64).ln(), r.absolute_error.ln()))
        .collect();

    if points.len() < 3 {
        return None;
    }

    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_x2: f64 = points.iter().map(|(x, _)| x * x).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return None;
    }

    Some((n * sum_xy - sum_x * sum_y) / denominator)
}

/// Binomial standard error of `4 · inside / total`; zero before any sample.
#[must_use]
pub fn standard_error(counts: &RunningCount) -> f64 {
    if counts.total == 0 {
        return 0.0;
    }
    let n = counts.total as f64;
    let p = counts.inside as f64 / n;
    4.0 * (p * (1.0 - p) / n).sqrt()
}

/// Convergence figures for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceSummary {
    /// Log-log slope of error vs n, when computable.
    pub slope: Option<f64>,
    /// Standard error of the current estimate.
    pub standard_error: f64,
    /// `|current estimate - π|`.
    pub absolute_error: f64,
}

impl ConvergenceSummary {
    /// Summarize a snapshot.
    #[must_use]
    pub fn from_state(state: &RunState) -> Self {
        let counts = RunningCount {
            total: state.total_points,
            inside: state.points_inside,
        };
        Self {
            slope: convergence_slope(&state.records),
            standard_error: standard_error(&counts),
            absolute_error: (state.current_pi_estimate - std::f64::consts::PI).abs(),
        }
    }

    /// Whether the slope lies within `tolerance` of [`CLT_SLOPE`].
    #[must_use]
    pub fn slope_matches_clt(&self, tolerance: f64) -> bool {
        self.slope
            .is_some_and(|slope| (slope - CLT_SLOPE).abs() <= tolerance)
    }
}
