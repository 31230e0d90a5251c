//! Batch sampling and classification.
//!
//! # Governing Equations
//!
//! ```text
//! Inclusion:  I(x, y) = 1  iff  x² + y² ≤ 1     (closed quarter disc)
//! Estimator:  π̂ = 4 · Σ I / n
//! ```

use serde::{Deserialize, Serialize};

use super::rng::UniformSource;

/// A single point drawn uniformly from the unit square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Horizontal coordinate in `[0, 1)`.
    pub x: f64,
    /// Vertical coordinate in `[0, 1)`.
    pub y: f64,
}

impl Sample {
    /// Create a sample from explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Draw `x` then `y` from the source.
    pub fn draw<S: UniformSource + ?Sized>(source: &mut S) -> Self {
        let x = source.next_unit();
        let y = source.next_unit();
        Self { x, y }
    }

    /// Whether the sample lies in the closed quarter disc (boundary included).
    #[must_use]
    pub fn is_inside(&self) -> bool {
        self.x * self.x + self.y * self.y <= 1.0
    }
}

/// Running sample counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningCount {
    /// Samples generated.
    pub total: u64,
    /// Samples inside the quarter disc.
    pub inside: u64,
}

impl RunningCount {
    /// Record one classified sample.
    pub fn record(&mut self, inside: bool) {
        self.total += 1;
        if inside {
            self.inside += 1;
        }
    }

    /// Current estimate `4 · inside / total`, or 0 before any sample.
    #[must_use]
    pub fn pi_estimate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        4.0 * self.inside as f64 / self.total as f64
    }

    /// Clear both counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Draw and classify `size` samples, folding them into `counts`.
///
/// `on_sample` sees every classified sample in draw order; the engine uses it
/// to feed the scatter painter.
pub fn sample_batch<S, F>(source: &mut S, counts: &mut RunningCount, size: u64, mut on_sample: F)
where
    S: UniformSource + ?Sized,
    F: FnMut(&Sample, bool),
{
    for _ in 0..size {
        let sample = Sample::draw(source);
        let inside = sample.is_inside();
        counts.record(inside);
        on_sample(&sample, inside);
    }
}
