//! Build plan entries
//!
//! The build plan lists requirements other build steps placed on this one.
//! Each entry names a dependency and carries free-form metadata; the keys
//! understood here are `version`, `version-source`, `build` and `launch`.

use crate::error::{DeplayerError, DeplayerResult};
use crate::layer::LayerRoles;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version requested when a plan entry does not name one
pub const DEFAULT_VERSION: &str = "default";

/// The plan handed to this build step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

/// A single request to include a dependency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,

    #[serde(default)]
    pub metadata: toml::Table,
}

impl PlanEntry {
    /// Requested version constraint, `"default"` when absent or not a string
    pub fn requested_version(&self) -> &str {
        self.metadata
            .get("version")
            .and_then(toml::Value::as_str)
            .unwrap_or(DEFAULT_VERSION)
    }

    /// Where the version constraint came from (e.g. "package.json")
    pub fn version_source(&self) -> Option<&str> {
        self.metadata
            .get("version-source")
            .and_then(toml::Value::as_str)
    }

    fn flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(false)
    }
}

impl BuildPlan {
    /// Parse a plan from TOML
    pub fn parse(content: &str) -> DeplayerResult<Self> {
        toml::from_str(content).map_err(|e| DeplayerError::PlanInvalid {
            path: "plan.toml".into(),
            reason: e.to_string(),
        })
    }

    /// Load a plan from a TOML file
    pub async fn from_file(path: &Path) -> DeplayerResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DeplayerError::io(format!("reading build plan {}", path.display()), e)
        })?;
        toml::from_str(&content).map_err(|e| DeplayerError::PlanInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Select the entry for `name`.
    ///
    /// Entries whose `version-source` appears earlier in `priorities` win;
    /// entries with an unlisted source rank after all listed ones. Ties keep
    /// plan order.
    pub fn resolve(&self, name: &str, priorities: &[&str]) -> Option<&PlanEntry> {
        let rank = |entry: &PlanEntry| {
            entry
                .version_source()
                .and_then(|source| priorities.iter().position(|p| *p == source))
                .unwrap_or(priorities.len())
        };

        self.entries
            .iter()
            .filter(|e| e.name == name)
            .min_by_key(|e| rank(e))
    }

    /// Merge the build and launch requirements of every entry for `name`.
    ///
    /// Cache participation mirrors build participation.
    pub fn merge_layer_types(&self, name: &str) -> LayerRoles {
        let (launch, build) = self
            .entries
            .iter()
            .filter(|e| e.name == name)
            .fold((false, false), |(launch, build), e| {
                (launch || e.flag("launch"), build || e.flag("build"))
            });

        LayerRoles::new(build, launch)
    }
}
