//! Buildpack descriptor schema
//!
//! The descriptor lives at `<buildpack>/buildpack.toml` and doubles as the
//! dependency catalog consulted by the resolver.

use crate::dependency::Dependency;
use crate::error::{DeplayerError, DeplayerResult};
use crate::provenance::SbomFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// File name of the descriptor inside the buildpack directory
pub const DESCRIPTOR_FILE: &str = "buildpack.toml";

/// Root of `buildpack.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildpackDescriptor {
    pub buildpack: BuildpackInfo,

    #[serde(default)]
    pub metadata: CatalogMetadata,
}

/// `[buildpack]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildpackInfo {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    /// Media types SBOM documents are rendered into
    #[serde(default)]
    pub sbom_formats: Vec<SbomFormat>,
}

/// `[metadata]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CatalogMetadata {
    /// Constraint used when a plan entry asks for the "default" version
    #[serde(default)]
    pub default_versions: HashMap<String, String>,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl BuildpackDescriptor {
    /// Parse a descriptor from a TOML file on disk
    pub async fn from_file(path: &Path) -> DeplayerResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DeplayerError::io(format!("reading buildpack descriptor {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|e| DeplayerError::DescriptorInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse a descriptor from a TOML string
    pub fn parse(content: &str) -> DeplayerResult<Self> {
        toml::from_str(content).map_err(|e| DeplayerError::DescriptorInvalid {
            path: DESCRIPTOR_FILE.into(),
            reason: e.to_string(),
        })
    }
}
