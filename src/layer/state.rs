//! In-memory layer state
//!
//! A layer is a directory exclusively owned by one build step plus a
//! `<name>.toml` sibling holding its roles and metadata. SBOM documents are
//! stored next to it as `<name>.sbom.<ext>`.

use crate::error::{DeplayerError, DeplayerResult};
use crate::provenance::SbomFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which phases of the image a layer participates in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerRoles {
    /// Available to subsequent build steps
    pub build: bool,
    /// Exported into the runtime image
    pub launch: bool,
    /// Restored on the next invocation
    pub cache: bool,
}

impl LayerRoles {
    /// Roles for a layer; it is cached exactly when it is used at build time
    pub fn new(build: bool, launch: bool) -> Self {
        Self {
            build,
            launch,
            cache: build,
        }
    }
}

/// A layer as seen by one build invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Layer name (file stem of the directory and its metadata file)
    pub name: String,

    /// Layer content directory
    pub path: PathBuf,

    pub roles: LayerRoles,

    /// Persisted metadata. Only `cache_sha` is interpreted.
    pub metadata: toml::Table,

    /// Rendered SBOM documents produced during this invocation
    pub sbom: BTreeMap<SbomFormat, String>,
}

impl Layer {
    /// Create an empty layer rooted at `layers_dir/name`
    pub fn new(layers_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: layers_dir.join(name),
            roles: LayerRoles::default(),
            metadata: toml::Table::new(),
            sbom: BTreeMap::new(),
        }
    }

    fn layers_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Path of the `<name>.toml` metadata file
    pub fn metadata_path(&self) -> PathBuf {
        self.layers_dir().join(format!("{}.toml", self.name))
    }

    /// Path of the SBOM document for `format`
    pub fn sbom_path(&self, format: SbomFormat) -> PathBuf {
        self.layers_dir()
            .join(format!("{}.sbom.{}", self.name, format.extension()))
    }

    /// Discard all prior contents, metadata, roles and SBOM documents.
    ///
    /// Leaves an empty directory at `path` and no metadata file, so a build
    /// that fails after this point presents as a fresh layer next time.
    pub async fn reset(&mut self) -> DeplayerResult<()> {
        debug!("Resetting layer {}", self.path.display());

        let reset_err = |path: &Path, source: io::Error| DeplayerError::LayerReset {
            path: path.to_path_buf(),
            source,
        };

        remove_path(&self.path)
            .await
            .map_err(|e| reset_err(&self.path, e))?;

        let metadata_path = self.metadata_path();
        remove_path(&metadata_path)
            .await
            .map_err(|e| reset_err(&metadata_path, e))?;

        for format in SbomFormat::all() {
            let sbom_path = self.sbom_path(*format);
            remove_path(&sbom_path)
                .await
                .map_err(|e| reset_err(&sbom_path, e))?;
        }

        tokio::fs::create_dir_all(&self.path)
            .await
            .map_err(|e| reset_err(&self.path, e))?;

        self.roles = LayerRoles::default();
        self.metadata.clear();
        self.sbom.clear();
        Ok(())
    }
}

/// Remove a file or directory tree; a missing path is not an error
async fn remove_path(path: &Path) -> io::Result<()> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path).await,
        Ok(_) => tokio::fs::remove_file(path).await,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
