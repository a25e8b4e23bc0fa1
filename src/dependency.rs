//! Resolved dependency records
//!
//! A `Dependency` is the concrete distribution chosen from the buildpack
//! catalog for a requested id and version constraint. Its `sha256` is the
//! identity of the installed artifact and the layer's cache key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stack wildcard accepted in a catalog entry's `stacks` list
pub const ANY_STACK: &str = "*";

/// A concrete dependency distribution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Dependency {
    /// Catalog id (e.g. "pnpm")
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Exact version of this distribution
    pub version: String,

    /// Stack ids this distribution supports
    #[serde(default)]
    pub stacks: Vec<String>,

    /// Where the artifact is fetched from
    pub uri: String,

    /// SHA-256 of the artifact, hex encoded
    pub sha256: String,

    /// Upstream source archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,

    /// SPDX license ids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpe: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,

    /// RFC3339 date after which the distribution is unsupported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_date: Option<String>,
}

impl Dependency {
    /// Content hash identifying the installed artifact
    pub fn content_hash(&self) -> &str {
        &self.sha256
    }

    /// Name to show in logs, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Whether this distribution can be installed on the given stack
    pub fn supports_stack(&self, stack: &str) -> bool {
        self.stacks.iter().any(|s| s == stack || s == ANY_STACK)
    }

    /// File name the artifact is stored under in the layer
    pub fn artifact_name(&self) -> String {
        let trimmed = self.uri.trim_end_matches('/');
        let name = trimmed.rsplit('/').next().unwrap_or_default();
        let name = name.split(['?', '#']).next().unwrap_or_default();
        if name.is_empty() {
            format!("{}-{}", self.id, self.version)
        } else {
            name.to_string()
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.display_name(), self.version)
    }
}
