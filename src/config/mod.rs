//! Invocation configuration
//!
//! Environment switches are read once, at the invocation boundary, into a
//! `BuildConfig` that is handed to the lifecycle controller. An invalid value
//! fails the invocation before any layer is touched.

pub mod buildpack;

pub use buildpack::{BuildpackDescriptor, BuildpackInfo, CatalogMetadata, DESCRIPTOR_FILE};

use crate::error::{DeplayerError, DeplayerResult};
use std::env::VarError;
use tracing::debug;

/// Environment switch that turns off SBOM generation
pub const DISABLE_SBOM_ENV: &str = "BP_DISABLE_SBOM";

/// Options that change how a build invocation behaves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// Skip SBOM generation on rebuild
    pub disable_sbom: bool,
}

impl BuildConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> DeplayerResult<Self> {
        let raw = match std::env::var(DISABLE_SBOM_ENV) {
            Ok(value) => Some(value),
            Err(VarError::NotPresent) => None,
            Err(VarError::NotUnicode(value)) => {
                return Err(DeplayerError::ConfigInvalid {
                    key: DISABLE_SBOM_ENV.to_string(),
                    value: value.to_string_lossy().into_owned(),
                    reason: "invalid syntax".to_string(),
                })
            }
        };
        Self::from_lookup(|_| raw.clone())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> DeplayerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let disable_sbom = match lookup(DISABLE_SBOM_ENV) {
            Some(value) => parse_bool(&value).ok_or_else(|| DeplayerError::ConfigInvalid {
                key: DISABLE_SBOM_ENV.to_string(),
                value: value.clone(),
                reason: "invalid syntax".to_string(),
            })?,
            None => false,
        };

        debug!("SBOM generation disabled: {}", disable_sbom);
        Ok(Self { disable_sbom })
    }
}

/// Parse a boolean using the spellings build platforms conventionally accept
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
