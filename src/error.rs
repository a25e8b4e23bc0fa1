//! Error types for deplayer
//!
//! All modules use `DeplayerResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for deplayer operations
pub type DeplayerResult<T> = Result<T, DeplayerError>;

/// All errors that can occur during a build invocation
#[derive(Error, Debug)]
pub enum DeplayerError {
    // Configuration errors
    #[error("failed to parse {key} value {value}: {reason}")]
    ConfigInvalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid buildpack descriptor at {path}: {reason}")]
    DescriptorInvalid { path: PathBuf, reason: String },

    #[error("Invalid build plan at {path}: {reason}")]
    PlanInvalid { path: PathBuf, reason: String },

    // Resolution errors
    #[error("No build plan entry requests {0}")]
    PlanEntryMissing(String),

    #[error("Failed to resolve {id} {version} for stack {stack}: {reason}")]
    Resolution {
        id: String,
        version: String,
        stack: String,
        reason: String,
    },

    // Layer errors
    #[error("Failed to reset layer {path}: {source}")]
    LayerReset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid layer metadata at {path}: {reason}")]
    LayerMetadata { path: PathBuf, reason: String },

    // Delivery errors
    #[error("Failed to deliver {id}: {reason}")]
    Delivery { id: String, reason: String },

    #[error("Checksum mismatch for {uri}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        uri: String,
        expected: String,
        actual: String,
    },

    // SBOM errors
    #[error("SBOM generation failed: {0}")]
    SbomGeneration(String),

    #[error("Unsupported SBOM format: {0}")]
    SbomFormat(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeplayerError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a resolution error
    pub fn resolution(
        id: impl Into<String>,
        version: impl Into<String>,
        stack: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Resolution {
            id: id.into(),
            version: version.into(),
            stack: stack.into(),
            reason: reason.into(),
        }
    }

    /// Create a delivery error
    pub fn delivery(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Delivery {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Name of the build phase that produced this error
    pub fn phase(&self) -> &'static str {
        match self {
            Self::ConfigInvalid { .. }
            | Self::DescriptorInvalid { .. }
            | Self::PlanInvalid { .. } => "configuration",
            Self::PlanEntryMissing(_) | Self::Resolution { .. } => "resolution",
            Self::LayerReset { .. } | Self::LayerMetadata { .. } => "layer reset",
            Self::Delivery { .. } | Self::ChecksumMismatch { .. } => "delivery",
            Self::SbomGeneration(_) | Self::SbomFormat(_) => "sbom generation",
            Self::Io { .. } | Self::Json(_) | Self::TomlParse(_) | Self::TomlSerialize(_) => "io",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether rerunning the whole invocation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Delivery { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Use one of: true, false, 1, 0, t, f"),
            Self::PlanEntryMissing(_) => {
                Some("Add an [[entries]] table naming the dependency to the build plan")
            }
            Self::ChecksumMismatch { .. } => {
                Some("Check the sha256 recorded in buildpack.toml against the artifact")
            }
            Self::Delivery { .. } => Some("The layer was reset; rerun the build to retry"),
            _ => None,
        }
    }
}
