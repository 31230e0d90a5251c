//! Run state and snapshot publication.
//!
//! The engine is the only writer of [`RunState`]. Every transition is
//! published as an immutable snapshot over a `watch` channel; observers hold
//! a receiver and re-read the latest snapshot whenever it changes.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::sampler::RunningCount;
use crate::error::{SamplerError, SamplerResult};

/// Point-in-time estimate recorded at a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimateRecord {
    /// Total samples drawn when the record was taken.
    pub n: u64,
    /// `4 · inside / n`.
    pub pi_estimate: f64,
    /// `|pi_estimate - π|`.
    pub absolute_error: f64,
    /// `absolute_error / π · 100`.
    pub relative_error_percent: f64,
}

impl EstimateRecord {
    /// Build a record from the counters at this instant.
    #[must_use]
    pub fn from_counts(counts: &RunningCount) -> Self {
        Self::from_estimate(counts.total, counts.pi_estimate())
    }

    /// Build a record from a sample count and estimate.
    #[must_use]
    pub fn from_estimate(n: u64, pi_estimate: f64) -> Self {
        let absolute_error = (pi_estimate - std::f64::consts::PI).abs();
        Self {
            n,
            pi_estimate,
            absolute_error,
            relative_error_percent: absolute_error / std::f64::consts::PI * 100.0,
        }
    }
}

/// Snapshot of the engine exposed to observers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Whether a run is in progress.
    pub is_running: bool,
    /// `100 · total / target`, in `[0, 100]`.
    pub progress_percent: f64,
    /// Latest estimate `4 · inside / total`.
    pub current_pi_estimate: f64,
    /// Samples drawn so far.
    pub total_points: u64,
    /// Samples inside the quarter disc so far.
    pub points_inside: u64,
    /// Milestone records in increasing `n`.
    pub records: Vec<EstimateRecord>,
}

impl RunState {
    /// The zeroed state a run starts from.
    #[must_use]
    pub fn started() -> Self {
        Self {
            is_running: true,
            ..Self::default()
        }
    }

    /// Fold the latest counters into the snapshot.
    pub fn apply_counts(&mut self, counts: &RunningCount, target: u64) {
        self.total_points = counts.total;
        self.points_inside = counts.inside;
        self.current_pi_estimate = counts.pi_estimate();
        self.progress_percent = progress_percent(counts.total, target);
    }

    /// Latest milestone record, if any.
    #[must_use]
    pub fn last_record(&self) -> Option<&EstimateRecord> {
        self.records.last()
    }

    /// Serialize the snapshot for a JSON-speaking host shell.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot holds a non-finite float.
    pub fn to_json(&self) -> SamplerResult<String> {
        serde_json::to_string(self).map_err(|e| SamplerError::serialization(e.to_string()))
    }
}

/// `100 · total / target`; zero for a zero target.
#[must_use]
pub fn progress_percent(total: u64, target: u64) -> f64 {
    if target == 0 {
        return 0.0;
    }
    total as f64 / target as f64 * 100.0
}

/// Single-writer publisher of [`RunState`] snapshots.
#[derive(Debug)]
pub struct StatePublisher {
    tx: watch::Sender<RunState>,
}

impl Default for StatePublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatePublisher {
    /// Create a publisher holding the idle state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RunState::default());
        Self { tx }
    }

    /// Get a receiver that observes every subsequent publish.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.tx.subscribe()
    }

    /// Replace the published snapshot.
    ///
    /// Succeeds even when no observer is subscribed.
    pub fn publish(&self, state: RunState) {
        self.tx.send_replace(state);
    }

    /// Clone of the latest snapshot.
    #[must_use]
    pub fn latest(&self) -> RunState {
        self.tx.borrow().clone()
    }

    /// Number of live observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
