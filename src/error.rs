//! Error types for pisim.
//!
//! The sampling engine itself never fails: out-of-range targets are clamped
//! and raster sink failures are skipped. Errors only surface at the edges,
//! when configuration is loaded or snapshots are serialized for a host shell.

use thiserror::Error;

/// Result type alias for pisim operations.
pub type SamplerResult<T> = Result<T, SamplerError>;

/// Unified error type for configuration and export operations.
#[derive(Debug, Error)]
pub enum SamplerError {
    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SamplerError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error originates from configuration loading.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::YamlParse(_) | Self::Validation(_)
        )
    }
}
