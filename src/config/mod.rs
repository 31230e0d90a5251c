//! Configuration system with YAML schema and validation.
//!
//! Mistake-proofing happens in three layers:
//! - Type-safe configuration structs with `deny_unknown_fields`
//! - Field-level bounds via `validator`
//! - Cross-field semantic checks

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::engine::milestones::MAX_TARGET;
use crate::error::{SamplerError, SamplerResult};
use crate::scatter::Color;

/// Top-level sampler configuration.
///
/// ```yaml
/// sampling:
///   batch_size: 5000
/// reproducibility:
///   seed: 42
/// pacing:
///   mode: frame
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Batching and target limits.
    #[validate(nested)]
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Reproducibility settings.
    #[serde(default)]
    pub reproducibility: ReproducibilityConfig,

    /// Scatter visualization.
    #[validate(nested)]
    #[serde(default)]
    pub scatter: ScatterConfig,

    /// Cooperative yield pacing.
    #[validate(nested)]
    #[serde(default)]
    pub pacing: PacingConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl SamplerConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SamplerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SamplerResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        config.validate_semantic()?;
        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> SamplerResult<String> {
        serde_yaml::to_string(self).map_err(|e| SamplerError::serialization(e.to_string()))
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SamplerConfigBuilder {
        SamplerConfigBuilder::default()
    }

    /// Validate constraints spanning several fields.
    fn validate_semantic(&self) -> SamplerResult<()> {
        if self.sampling.default_target > self.sampling.max_target {
            return Err(SamplerError::config(format!(
                "default_target {} exceeds max_target {}",
                self.sampling.default_target, self.sampling.max_target
            )));
        }
        Ok(())
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            sampling: SamplingConfig::default(),
            reproducibility: ReproducibilityConfig::default(),
            scatter: ScatterConfig::default(),
            pacing: PacingConfig::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct SamplerConfigBuilder {
    seed: Option<u64>,
    batch_size: Option<u64>,
    max_target: Option<u64>,
    default_target: Option<u64>,
    scatter_enabled: Option<bool>,
    draw_limit: Option<u64>,
    pacing: Option<PacingMode>,
}

impl SamplerConfigBuilder {
    /// Set the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the number of samples processed between yields.
    #[must_use]
    pub const fn batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Set the upper clamp for requested targets.
    #[must_use]
    pub const fn max_target(mut self, max_target: u64) -> Self {
        self.max_target = Some(max_target);
        self
    }

    /// Set the target used by `run_default`.
    #[must_use]
    pub const fn default_target(mut self, default_target: u64) -> Self {
        self.default_target = Some(default_target);
        self
    }

    /// Enable or disable the scatter painter.
    #[must_use]
    pub const fn scatter(mut self, enabled: bool) -> Self {
        self.scatter_enabled = Some(enabled);
        self
    }

    /// Set how many leading samples are drawn.
    #[must_use]
    pub const fn draw_limit(mut self, draw_limit: u64) -> Self {
        self.draw_limit = Some(draw_limit);
        self
    }

    /// Set the pacing mode.
    #[must_use]
    pub const fn pacing(mut self, mode: PacingMode) -> Self {
        self.pacing = Some(mode);
        self
    }

    /// Build the configuration.
    ///
    /// Values are not validated here; use [`SamplerConfigBuilder::try_build`]
    /// for checked construction.
    #[must_use]
    pub fn build(self) -> SamplerConfig {
        let mut config = SamplerConfig::default();

        if let Some(seed) = self.seed {
            config.reproducibility.seed = Some(seed);
        }
        if let Some(batch_size) = self.batch_size {
            config.sampling.batch_size = batch_size;
        }
        if let Some(max_target) = self.max_target {
            config.sampling.max_target = max_target;
        }
        if let Some(default_target) = self.default_target {
            config.sampling.default_target = default_target;
        }
        if let Some(enabled) = self.scatter_enabled {
            config.scatter.enabled = enabled;
        }
        if let Some(draw_limit) = self.draw_limit {
            config.scatter.draw_limit = draw_limit;
        }
        if let Some(mode) = self.pacing {
            config.pacing.mode = mode;
        }

        config
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if any field is out of bounds.
    pub fn try_build(self) -> SamplerResult<SamplerConfig> {
        let config = self.build();
        config.validate()?;
        config.validate_semantic()?;
        Ok(config)
    }
}

/// Batching and target limits.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SamplingConfig {
    /// Samples processed between two yields.
    #[validate(range(min = 1, max = 1_000_000))]
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// Requested targets are clamped to `[1, max_target]`.
    #[validate(range(min = 1, max = 100_000_000))]
    #[serde(default = "default_max_target")]
    pub max_target: u64,

    /// Target used when the caller does not name one.
    #[validate(range(min = 1))]
    #[serde(default = "default_target")]
    pub default_target: u64,
}

const fn default_batch_size() -> u64 {
    5_000
}

const fn default_max_target() -> u64 {
    MAX_TARGET
}

const fn default_target() -> u64 {
    10_000_000
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_target: default_max_target(),
            default_target: default_target(),
        }
    }
}

/// Reproducibility settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReproducibilityConfig {
    /// Master seed; `None` draws one from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Scatter visualization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ScatterConfig {
    /// Whether the engine builds its own pixel buffer.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Leading samples drawn per run.
    #[serde(default = "default_draw_limit")]
    pub draw_limit: u64,

    /// Raster width in pixels.
    #[validate(range(min = 1, max = 4096))]
    #[serde(default = "default_raster_side")]
    pub width: u32,

    /// Raster height in pixels.
    #[validate(range(min = 1, max = 4096))]
    #[serde(default = "default_raster_side")]
    pub height: u32,

    /// Colour of inside points.
    #[serde(default = "default_inside_color")]
    pub inside_color: Color,

    /// Colour of outside points.
    #[serde(default = "default_outside_color")]
    pub outside_color: Color,

    /// Colour of the quarter-circle outline.
    #[serde(default = "default_outline_color")]
    pub outline_color: Color,
}

const fn default_true() -> bool {
    true
}

const fn default_draw_limit() -> u64 {
    5_000
}

const fn default_raster_side() -> u32 {
    280
}

const fn default_inside_color() -> Color {
    Color::INSIDE_BLUE
}

const fn default_outside_color() -> Color {
    Color::OUTSIDE_RED
}

const fn default_outline_color() -> Color {
    Color::OUTLINE_BLUE
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            draw_limit: default_draw_limit(),
            width: default_raster_side(),
            height: default_raster_side(),
            inside_color: default_inside_color(),
            outside_color: default_outside_color(),
            outline_color: default_outline_color(),
        }
    }
}

/// Cooperative yield pacing.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PacingConfig {
    /// How the engine suspends after each batch.
    #[serde(default)]
    pub mode: PacingMode,

    /// Frame period for [`PacingMode::Frame`].
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

const fn default_frame_interval_ms() -> u64 {
    16
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            mode: PacingMode::default(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

/// How the engine suspends after each batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PacingMode {
    /// Never suspend.
    Immediate,
    /// Yield to the async executor.
    #[default]
    Task,
    /// Wait for the next frame tick.
    Frame,
}
