//! # pisim
//!
//! Incremental Monte Carlo estimation of π for interactive hosts.
//!
//! The [`engine::SamplingEngine`] draws points from the unit square in
//! bounded batches, counts those inside the quarter disc, and:
//! - publishes an immutable [`engine::RunState`] snapshot after every batch
//! - suspends at a pluggable [`engine::YieldPoint`] so the host stays responsive
//! - records an [`engine::EstimateRecord`] at every power of ten and at the target
//! - optionally plots the first samples onto a [`scatter::RasterSink`]
//!
//! ## Example
//!
//! ```rust
//! use pisim::prelude::*;
//!
//! let config = SamplerConfig::builder()
//!     .seed(42)
//!     .pacing(PacingMode::Immediate)
//!     .build();
//! let mut engine = SamplingEngine::from_config(&config);
//! let observer = engine.subscribe();
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().build();
//! if let Ok(runtime) = runtime {
//!     runtime.block_on(engine.run(1_000));
//! }
//!
//! assert_eq!(observer.borrow().total_points, 1_000);
//! assert_eq!(observer.borrow().records.len(), 4);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::missing_const_for_fn,
    clippy::float_cmp,
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod scatter;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{PacingMode, SamplerConfig, SamplerConfigBuilder};
    pub use crate::engine::{
        ConvergenceSummary, EstimateRecord, Immediate, Pacer, RunState, SamplingEngine, SimRng,
        TaskYield, UniformSource, YieldPoint,
    };
    pub use crate::error::{SamplerError, SamplerResult};
    pub use crate::scatter::{Color, PixelBuffer, RasterSink, SinkError};
}

/// Re-export for public API
pub use error::{SamplerError, SamplerResult};
