//! Cooperative yield points.
//!
//! The engine suspends once per batch by awaiting a [`YieldPoint`]. Hosts
//! pick how long that suspension lasts:
//!
//! | Yield point | Resumes |
//! |---|---|
//! | [`Immediate`] | at once (headless runs, tests) |
//! | [`TaskYield`] | after the executor has polled other ready tasks |
//! | [`FrameTicker`] | on the next tick of a fixed frame interval |
//!
//! [`Pacer`] selects one of these from [`PacingConfig`].

use std::future::Future;
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

use crate::config::{PacingConfig, PacingMode};

/// A point at which the engine hands control back to its host.
pub trait YieldPoint {
    /// Suspend until the host signals the next opportunity to continue.
    fn yield_now(&mut self) -> impl Future<Output = ()> + Send;
}

impl<Y: YieldPoint> YieldPoint for &mut Y {
    fn yield_now(&mut self) -> impl Future<Output = ()> + Send {
        (**self).yield_now()
    }
}

/// Never suspends.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl YieldPoint for Immediate {
    fn yield_now(&mut self) -> impl Future<Output = ()> + Send {
        std::future::ready(())
    }
}

/// Yields to the tokio executor once per batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskYield;

impl YieldPoint for TaskYield {
    fn yield_now(&mut self) -> impl Future<Output = ()> + Send {
        tokio::task::yield_now()
    }
}

/// Resumes on the next tick of a fixed frame interval.
///
/// The interval is created lazily on first use, so the ticker can be built
/// outside a runtime.
#[derive(Debug)]
pub struct FrameTicker {
    period: Duration,
    interval: Option<Interval>,
    frames: u64,
}

impl FrameTicker {
    /// Default frame period (~60 Hz).
    pub const DEFAULT_PERIOD: Duration = Duration::from_millis(16);

    /// Create a ticker with the given frame period.
    ///
    /// A zero period is raised to one millisecond.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            interval: None,
            frames: 0,
        }
    }

    /// Frame period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Frames waited on so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameTicker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERIOD)
    }
}

impl YieldPoint for FrameTicker {
    fn yield_now(&mut self) -> impl Future<Output = ()> + Send {
        async move {
            let period = self.period;
            let interval = self.interval.get_or_insert_with(|| {
                let mut interval =
                    tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                interval
            });
            interval.tick().await;
            self.frames += 1;
        }
    }
}

/// Yield point selected from configuration.
#[derive(Debug)]
pub enum Pacer {
    /// See [`Immediate`].
    Immediate(Immediate),
    /// See [`TaskYield`].
    Task(TaskYield),
    /// See [`FrameTicker`].
    Frame(FrameTicker),
}

impl Pacer {
    /// Build the pacer described by the `pacing` section.
    #[must_use]
    pub fn from_config(config: &PacingConfig) -> Self {
        match config.mode {
            PacingMode::Immediate => Self::Immediate(Immediate),
            PacingMode::Task => Self::Task(TaskYield),
            PacingMode::Frame => Self::Frame(FrameTicker::new(Duration::from_millis(
                config.frame_interval_ms,
            ))),
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}

impl YieldPoint for Pacer {
    fn yield_now(&mut self) -> impl Future<Output = ()> + Send {
        async move {
            match self {
                Self::Immediate(inner) => inner.yield_now().await,
                Self::Task(inner) => inner.yield_now().await,
                Self::Frame(inner) => inner.yield_now().await,
            }
        }
    }
}
