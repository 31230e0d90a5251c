//! Incremental Monte Carlo sampling engine.
//!
//! A run walks a logarithmic milestone schedule in bounded batches:
//!
//! ```text
//! for m in milestones(target):
//!     while total < m:
//!         sample min(batch_size, m - total) points
//!         publish snapshot          (estimate, progress)
//!         yield to host
//!     record estimate at m          (publish)
//! publish idle snapshot
//! ```
//!
//! The engine is the single writer of [`RunState`]; observers subscribe to a
//! `watch` channel. `run` borrows the engine mutably, so a second run cannot
//! start on the same engine while one is in flight.

pub mod convergence;
pub mod milestones;
pub mod rng;
pub mod sampler;
pub mod state;
pub mod yield_point;

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, info, trace};

pub use convergence::ConvergenceSummary;
pub use milestones::{clamp_target, milestones, MAX_TARGET, MIN_TARGET};
pub use rng::{SimRng, UniformSource};
pub use sampler::{RunningCount, Sample};
pub use state::{EstimateRecord, RunState, StatePublisher};
pub use yield_point::{FrameTicker, Immediate, Pacer, TaskYield, YieldPoint};

use crate::config::{SamplerConfig, ScatterConfig};
use crate::scatter::{PixelBuffer, RasterSink, ScatterPainter};

/// Samples processed between two yields by default.
pub const BATCH_SIZE: u64 = 5_000;

/// Pixel buffer shared between the engine and the host.
pub type SharedRaster = Arc<Mutex<PixelBuffer>>;

/// Monte Carlo π sampling engine.
///
/// # Example
///
/// ```rust
/// use pisim::config::SamplerConfig;
/// use pisim::engine::{Immediate, SamplingEngine, SimRng};
///
/// let config = SamplerConfig::default();
/// let mut engine = SamplingEngine::new(&config, SimRng::new(42), Immediate);
///
/// let state = tokio::runtime::Builder::new_current_thread()
///     .build()
///     .map(|rt| rt.block_on(engine.run(150)))
///     .unwrap_or_default();
///
/// let milestones: Vec<u64> = state.records.iter().map(|r| r.n).collect();
/// assert_eq!(milestones, vec![1, 10, 100, 150]);
/// assert!(!state.is_running);
/// ```
pub struct SamplingEngine<S = SimRng, Y = Pacer> {
    source: S,
    yielder: Y,
    batch_size: u64,
    max_target: u64,
    default_target: u64,
    scatter: ScatterConfig,
    counts: RunningCount,
    state: RunState,
    publisher: StatePublisher,
    painter: Option<ScatterPainter>,
    raster: Option<SharedRaster>,
}

impl<S: std::fmt::Debug, Y: std::fmt::Debug> std::fmt::Debug for SamplingEngine<S, Y> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingEngine")
            .field("source", &self.source)
            .field("yielder", &self.yielder)
            .field("batch_size", &self.batch_size)
            .field("max_target", &self.max_target)
            .field("counts", &self.counts)
            .field("painter", &self.painter)
            .finish_non_exhaustive()
    }
}

impl SamplingEngine<SimRng, Pacer> {
    /// Build an engine entirely from configuration.
    ///
    /// Uses the configured seed (or OS entropy), the configured pacing, and,
    /// when scatter is enabled, a fresh [`PixelBuffer`] reachable through
    /// [`SamplingEngine::raster`].
    #[must_use]
    pub fn from_config(config: &SamplerConfig) -> Self {
        let rng = SimRng::from_seed_or_entropy(config.reproducibility.seed);
        info!(seed = rng.master_seed(), "sampling engine seeded");

        let mut engine = Self::new(config, rng, Pacer::from_config(&config.pacing));
        if config.scatter.enabled {
            let raster: SharedRaster =
                Arc::new(Mutex::new(PixelBuffer::from_config(&config.scatter)));
            engine.attach_sink(Box::new(Arc::clone(&raster)));
            engine.raster = Some(raster);
        }
        engine
    }
}

impl<S: UniformSource, Y: YieldPoint> SamplingEngine<S, Y> {
    /// Create an idle engine with an injected random source and yield point.
    ///
    /// No raster sink is attached.
    #[must_use]
    pub fn new(config: &SamplerConfig, source: S, yielder: Y) -> Self {
        Self {
            source,
            yielder,
            batch_size: config.sampling.batch_size.max(1),
            max_target: config.sampling.max_target,
            default_target: config.sampling.default_target,
            scatter: config.scatter.clone(),
            counts: RunningCount::default(),
            state: RunState::default(),
            publisher: StatePublisher::new(),
            painter: None,
            raster: None,
        }
    }

    /// Attach a raster sink, consuming and returning the engine.
    #[must_use]
    pub fn with_sink<K: RasterSink + Send + 'static>(mut self, sink: K) -> Self {
        self.attach_sink(Box::new(sink));
        self
    }

    /// Attach a raster sink, replacing any previous one.
    pub fn attach_sink(&mut self, sink: Box<dyn RasterSink + Send>) {
        self.painter = Some(ScatterPainter::new(sink, &self.scatter));
        self.raster = None;
    }

    /// Detach and return the current raster sink.
    pub fn detach_sink(&mut self) -> Option<Box<dyn RasterSink + Send>> {
        self.raster = None;
        self.painter.take().map(ScatterPainter::into_sink)
    }

    /// Pixel buffer created by [`SamplingEngine::from_config`], if any.
    #[must_use]
    pub fn raster(&self) -> Option<SharedRaster> {
        self.raster.clone()
    }

    /// Scatter painter for the attached sink, if any.
    #[must_use]
    pub const fn painter(&self) -> Option<&ScatterPainter> {
        self.painter.as_ref()
    }

    /// Subscribe to state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.publisher.subscribe()
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.publisher.latest()
    }

    /// Samples processed between two yields.
    #[must_use]
    pub const fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Random source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Yield point.
    #[must_use]
    pub const fn yielder(&self) -> &Y {
        &self.yielder
    }

    /// Run to the configured default target.
    pub async fn run_default(&mut self) -> RunState {
        self.run(self.default_target).await
    }

    /// Sample until `target_count` points have been drawn.
    ///
    /// The target is clamped to `[1, max_target]`. Every batch publishes a
    /// snapshot and then suspends at the yield point; every milestone
    /// appends an [`EstimateRecord`]. Returns the final (idle) snapshot.
    pub async fn run(&mut self, target_count: u64) -> RunState {
        let target = clamp_target(target_count, self.max_target);
        let schedule = milestones(target);
        info!(
            requested = target_count,
            target,
            milestones = schedule.len(),
            batch_size = self.batch_size,
            "starting run"
        );

        self.counts.reset();
        self.state = RunState::started();
        self.publisher.publish(self.state.clone());
        if let Some(painter) = self.painter.as_mut() {
            painter.begin_run();
        }

        for &milestone in &schedule {
            while self.counts.total < milestone {
                let size = self.batch_size.min(milestone - self.counts.total);
                self.process_batch(size);

                self.state.apply_counts(&self.counts, target);
                self.publisher.publish(self.state.clone());
                trace!(
                    total = self.counts.total,
                    inside = self.counts.inside,
                    progress = self.state.progress_percent,
                    "batch complete"
                );

                self.yielder.yield_now().await;
            }

            let record = EstimateRecord::from_counts(&self.counts);
            debug!(
                n = record.n,
                pi_estimate = record.pi_estimate,
                absolute_error = record.absolute_error,
                "milestone recorded"
            );
            self.state.records.push(record);
            self.publisher.publish(self.state.clone());
        }

        self.state.is_running = false;
        self.publisher.publish(self.state.clone());
        info!(
            total = self.counts.total,
            inside = self.counts.inside,
            pi_estimate = self.state.current_pi_estimate,
            "run complete"
        );
        self.state.clone()
    }

    fn process_batch(&mut self, size: u64) {
        match self.painter.as_mut().filter(|p| p.wants_samples()) {
            Some(painter) => {
                sampler::sample_batch(&mut self.source, &mut self.counts, size, |sample, inside| {
                    painter.paint(sample, inside);
                });
            }
            None => sampler::sample_batch(&mut self.source, &mut self.counts, size, |_, _| {}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::sampler::testing::ScriptedSource;
    use super::*;
    use crate::config::PacingMode;
    use crate::scatter::{Color, SinkError};
    use std::f64::consts::PI;

    fn engine(seed: u64) -> SamplingEngine<SimRng, Immediate> {
        SamplingEngine::new(&SamplerConfig::default(), SimRng::new(seed), Immediate)
    }

    /// Records the published snapshot at every yield.
    #[derive(Debug)]
    struct SnapshotRecorder {
        rx: watch::Receiver<RunState>,
        seen: Vec<RunState>,
    }

    impl YieldPoint for SnapshotRecorder {
        fn yield_now(&mut self) -> impl std::future::Future<Output = ()> + Send {
            self.seen.push(self.rx.borrow_and_update().clone());
            std::future::ready(())
        }
    }

    #[derive(Debug)]
    struct DetachedSink;

    impl RasterSink for DetachedSink {
        fn dimensions(&self) -> (u32, u32) {
            (280, 280)
        }

        fn clear(&mut self) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("no context".into()))
        }

        fn draw_outline(&mut self, _color: Color) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("no context".into()))
        }

        fn plot(&mut self, _x: u32, _y: u32, _color: Color) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("no context".into()))
        }
    }

    #[test]
    fn test_new_engine_is_idle() {
        let engine = engine(42);
        let state = engine.state();
        assert!(!state.is_running);
        assert_eq!(state.total_points, 0);
        assert!(state.records.is_empty());
        assert_eq!(engine.batch_size(), BATCH_SIZE);
    }

    #[test]
    fn test_zero_batch_size_is_raised() {
        let config = SamplerConfig::builder().batch_size(0).build();
        let engine = SamplingEngine::new(&config, SimRng::new(1), Immediate);
        assert_eq!(engine.batch_size(), 1);
    }

    #[tokio::test]
    async fn test_run_single_sample() {
        let mut engine = engine(42);
        let state = engine.run(1).await;

        assert!(!state.is_running);
        assert_eq!(state.total_points, 1);
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].n, 1);
        assert_eq!(state.progress_percent, 100.0);
    }

    #[tokio::test]
    async fn test_run_records_each_milestone() {
        let mut engine = engine(42);
        let state = engine.run(150).await;

        let ns: Vec<u64> = state.records.iter().map(|r| r.n).collect();
        assert_eq!(ns, vec![1, 10, 100, 150]);
        assert_eq!(state.total_points, 150);
    }

    #[tokio::test]
    async fn test_run_zero_behaves_as_one() {
        let mut engine = engine(42);
        let state = engine.run(0).await;
        assert_eq!(state.total_points, 1);
        assert_eq!(state.records.len(), 1);
    }

    #[tokio::test]
    async fn test_final_estimate_matches_counts() {
        let mut engine = engine(7);
        let state = engine.run(12_345).await;

        let expected = 4.0 * state.points_inside as f64 / state.total_points as f64;
        assert!((state.current_pi_estimate - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_record_error_metrics() {
        let mut engine = engine(3);
        let state = engine.run(10_000).await;

        for record in &state.records {
            let abs = (record.pi_estimate - PI).abs();
            assert!((record.absolute_error - abs).abs() < 1e-9);
            assert!((record.relative_error_percent - abs / PI * 100.0).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_state_published_to_subscriber() {
        let mut engine = engine(42);
        let rx = engine.subscribe();
        let final_state = engine.run(100).await;

        assert_eq!(*rx.borrow(), final_state);
        assert_eq!(engine.state(), final_state);
    }

    #[tokio::test]
    async fn test_yields_once_per_batch() {
        let config = SamplerConfig::builder().batch_size(40).build();
        let base = SamplingEngine::new(&config, SimRng::new(1), Immediate);
        let mut engine = rebind(base);
        engine.run(150).await;

        // Milestones 1, 10, 100, 150 with batch 40:
        // [1] [9] [40 40 10] [40 10]  => 7 batches
        let totals: Vec<u64> = engine.yielder.seen.iter().map(|s| s.total_points).collect();
        assert_eq!(totals, vec![1, 10, 50, 90, 100, 140, 150]);
    }

    /// Swap in a recorder subscribed to the engine's own publisher.
    fn rebind<S>(engine: SamplingEngine<S, Immediate>) -> SamplingEngine<S, SnapshotRecorder> {
        SamplingEngine {
            source: engine.source,
            yielder: SnapshotRecorder {
                rx: engine.publisher.subscribe(),
                seen: Vec::new(),
            },
            batch_size: engine.batch_size,
            max_target: engine.max_target,
            default_target: engine.default_target,
            scatter: engine.scatter,
            counts: engine.counts,
            state: engine.state,
            publisher: engine.publisher,
            painter: engine.painter,
            raster: engine.raster,
        }
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_completes_at_hundred() {
        let config = SamplerConfig::builder().batch_size(333).build();
        let base = SamplingEngine::new(&config, SimRng::new(5), Immediate);
        let mut engine = rebind(base);
        engine.run(5_000).await;

        let progress: Vec<f64> = engine
            .yielder
            .seen
            .iter()
            .map(|s| s.progress_percent)
            .collect();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        let (last, earlier) = progress.split_last().expect("at least one batch");
        assert_eq!(*last, 100.0);
        assert!(earlier.iter().all(|&p| p < 100.0));
        assert!(engine.yielder.seen.iter().all(|s| s.is_running));
    }

    #[tokio::test]
    async fn test_scripted_source_boundary_counts_inside() {
        let config = SamplerConfig::default();
        let mut engine = SamplingEngine::new(&config, ScriptedSource::new(vec![0.6, 0.8]), Immediate);
        let state = engine.run(10).await;

        assert_eq!(state.points_inside, 10);
        assert!((state.current_pi_estimate - 4.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_rerun_resets_state() {
        let mut engine = engine(42);
        engine.run(1_000).await;
        let second = engine.run(10).await;

        assert_eq!(second.total_points, 10);
        assert_eq!(second.records.len(), 2);
    }

    #[tokio::test]
    async fn test_run_default_uses_configured_target() {
        let config = SamplerConfig::builder().default_target(250).build();
        let mut engine = SamplingEngine::new(&config, SimRng::new(1), Immediate);
        let state = engine.run_default().await;
        assert_eq!(state.total_points, 250);
    }

    #[tokio::test]
    async fn test_configured_max_target_clamps() {
        let config = SamplerConfig::builder().max_target(500).build();
        let mut engine = SamplingEngine::new(&config, SimRng::new(1), Immediate);
        let state = engine.run(1_000_000).await;
        assert_eq!(state.total_points, 500);
        assert_eq!(state.records.last().map(|r| r.n), Some(500));
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_affect_statistics() {
        let mut plain = engine(42);
        let mut with_sink = engine(42).with_sink(DetachedSink);

        let a = plain.run(20_000).await;
        let b = with_sink.run(20_000).await;

        assert_eq!(a, b);
        assert!(with_sink.painter().is_some_and(ScatterPainter::has_failed));
    }

    #[tokio::test]
    async fn test_scatter_draws_first_samples_only() {
        let raster: SharedRaster = Arc::new(Mutex::new(PixelBuffer::new(280, 280)));
        let mut engine = engine(42).with_sink(Arc::clone(&raster));
        engine.run(50_000).await;

        let painter = engine.painter().expect("painter attached");
        assert_eq!(painter.offered(), 5_000);
        assert!(painter.plotted() > 4_000);

        let buffer = raster.lock().expect("lock");
        assert!(buffer.count(Color::INSIDE_BLUE) > 0);
        assert!(buffer.count(Color::OUTSIDE_RED) > 0);
    }

    #[tokio::test]
    async fn test_from_config_with_scatter_exposes_raster() {
        let config = SamplerConfig::builder()
            .seed(42)
            .pacing(PacingMode::Immediate)
            .build();
        let mut engine = SamplingEngine::from_config(&config);
        assert_eq!(engine.source().master_seed(), 42);

        engine.run(1_000).await;
        let raster = engine.raster().expect("raster enabled by default");
        let blue = raster.lock().expect("lock").count(Color::INSIDE_BLUE);
        assert!(blue > 0);
    }

    #[test]
    fn test_from_config_without_scatter() {
        let config = SamplerConfig::builder().scatter(false).build();
        let engine = SamplingEngine::from_config(&config);
        assert!(engine.raster().is_none());
        assert!(engine.painter().is_none());
    }

    #[test]
    fn test_detach_sink() {
        let mut engine = engine(1).with_sink(PixelBuffer::new(8, 8));
        let sink = engine.detach_sink().expect("sink attached");
        assert_eq!(sink.dimensions(), (8, 8));
        assert!(engine.painter().is_none());
        assert!(engine.detach_sink().is_none());
    }

    #[tokio::test]
    async fn test_reproducible_with_same_seed() {
        let a = engine(99).run(30_000).await;
        let b = engine(99).run(30_000).await;
        assert_eq!(a, b);
    }

    #[test]
    fn test_debug() {
        let engine = engine(42);
        let debug = format!("{engine:?}");
        assert!(debug.contains("SamplingEngine"));
        assert!(debug.contains("batch_size"));
    }
}
