//! Layer state persistence
//!
//! Layout under the layers directory:
//!
//! | Path | Contents |
//! |------|----------|
//! | `<name>/` | installed dependency |
//! | `<name>.toml` | `[types]` roles and `[metadata]` |
//! | `<name>.sbom.<ext>` | SBOM document per format |
//! | `build.toml` / `launch.toml` | `[[bom]]` entries |

use crate::error::{DeplayerError, DeplayerResult};
use crate::layer::state::{Layer, LayerRoles};
use crate::lifecycle::BuildOutcome;
use crate::provenance::BomEntry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// On-disk shape of `<name>.toml`
#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerFile {
    #[serde(default)]
    types: LayerRoles,

    #[serde(default)]
    metadata: toml::Table,
}

/// On-disk shape of `build.toml` and `launch.toml`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BomFile {
    #[serde(default)]
    pub bom: Vec<BomEntry>,
}

/// Handle on a layers directory that persists across invocations
#[derive(Debug, Clone)]
pub struct LayerStore {
    root: PathBuf,
}

impl LayerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layers directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a layer, or an empty one if nothing was persisted for it
    pub async fn get(&self, name: &str) -> DeplayerResult<Layer> {
        validate_layer_name(name)?;

        let mut layer = Layer::new(&self.root, name);
        let path = layer.metadata_path();

        if !path.exists() {
            debug!("No persisted state for layer {}", name);
            return Ok(layer);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| DeplayerError::io(format!("reading {}", path.display()), e))?;

        let file: LayerFile =
            toml::from_str(&content).map_err(|e| DeplayerError::LayerMetadata {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        layer.roles = file.types;
        layer.metadata = file.metadata;
        Ok(layer)
    }

    /// Persist a layer's roles, metadata and any SBOM documents it carries.
    ///
    /// SBOM files already on disk are left alone when the layer carries none.
    pub async fn commit(&self, layer: &Layer) -> DeplayerResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            DeplayerError::io(format!("creating layers directory {}", self.root.display()), e)
        })?;

        let file = LayerFile {
            types: layer.roles,
            metadata: layer.metadata.clone(),
        };
        let path = layer.metadata_path();
        write(&path, &toml::to_string(&file)?).await?;

        for (format, document) in &layer.sbom {
            write(&layer.sbom_path(*format), document).await?;
        }

        debug!("Committed layer {}", layer.name);
        Ok(())
    }

    /// Persist every layer of an outcome plus the build and launch BOMs
    pub async fn commit_outcome(&self, outcome: &BuildOutcome) -> DeplayerResult<()> {
        for layer in &outcome.layers {
            self.commit(layer).await?;
        }

        self.write_bom("build.toml", &outcome.build.bom).await?;
        self.write_bom("launch.toml", &outcome.launch.bom).await?;
        Ok(())
    }

    /// Read `build.toml` or `launch.toml`; missing files yield no entries
    pub async fn read_bom(&self, file_name: &str) -> DeplayerResult<Vec<BomEntry>> {
        let path = self.root.join(file_name);
        if !path.exists() {
            return Ok(vec![]);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| DeplayerError::io(format!("reading {}", path.display()), e))?;
        let file: BomFile = toml::from_str(&content)?;
        Ok(file.bom)
    }

    async fn write_bom(&self, file_name: &str, bom: &[BomEntry]) -> DeplayerResult<()> {
        let path = self.root.join(file_name);

        if bom.is_empty() {
            if path.exists() {
                fs::remove_file(&path)
                    .await
                    .map_err(|e| DeplayerError::io(format!("removing {}", path.display()), e))?;
            }
            return Ok(());
        }

        let file = BomFile { bom: bom.to_vec() };
        write(&path, &toml::to_string(&file)?).await
    }
}

async fn write(path: &Path, content: &str) -> DeplayerResult<()> {
    fs::write(path, content)
        .await
        .map_err(|e| DeplayerError::io(format!("writing {}", path.display()), e))
}

/// Layer names become file names; reject anything that could escape the root.
fn validate_layer_name(name: &str) -> DeplayerResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(DeplayerError::LayerMetadata {
            path: PathBuf::from(name),
            reason: "layer names must contain only alphanumeric characters, hyphens, or underscores"
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Decision;
    use crate::provenance::{BuildMetadata, LaunchMetadata, SbomFormat};
    use tempfile::TempDir;

    fn bom_entry() -> BomEntry {
        let mut metadata = toml::Table::new();
        metadata.insert("version".to_string(), "8.6.2".into());
        BomEntry {
            name: "Pnpm".to_string(),
            metadata,
        }
    }

    #[tokio::test]
    async fn get_missing_layer_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = LayerStore::new(dir.path());

        let layer = store.get("pnpm").await.unwrap();

        assert_eq!(layer.path, dir.path().join("pnpm"));
        assert!(layer.metadata.is_empty());
        assert_eq!(layer.roles, LayerRoles::default());
        assert!(!layer.path.exists());
    }

    #[tokio::test]
    async fn commit_and_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = LayerStore::new(dir.path());

        let mut layer = store.get("pnpm").await.unwrap();
        layer.roles = LayerRoles::new(true, false);
        layer
            .metadata
            .insert("cache_sha".to_string(), "xyz999".into());
        store.commit(&layer).await.unwrap();

        let loaded = store.get("pnpm").await.unwrap();
        assert_eq!(loaded.roles, layer.roles);
        assert_eq!(
            loaded.metadata.get("cache_sha").and_then(|v| v.as_str()),
            Some("xyz999")
        );
    }

    #[tokio::test]
    async fn commit_writes_sbom_documents() {
        let dir = TempDir::new().unwrap();
        let store = LayerStore::new(dir.path());

        let mut layer = store.get("pnpm").await.unwrap();
        layer
            .sbom
            .insert(SbomFormat::Syft, r#"{"artifacts":[]}"#.to_string());
        store.commit(&layer).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("pnpm.sbom.syft.json")).unwrap();
        assert_eq!(written, r#"{"artifacts":[]}"#);
    }

    #[tokio::test]
    async fn commit_keeps_existing_sbom_when_layer_has_none() {
        let dir = TempDir::new().unwrap();
        let store = LayerStore::new(dir.path());
        std::fs::write(dir.path().join("pnpm.sbom.cdx.json"), "{}").unwrap();

        let layer = store.get("pnpm").await.unwrap();
        store.commit(&layer).await.unwrap();

        assert!(dir.path().join("pnpm.sbom.cdx.json").exists());
    }

    #[tokio::test]
    async fn get_rejects_corrupt_metadata() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pnpm.toml"), "types = [").unwrap();
        let store = LayerStore::new(dir.path());

        let err = store.get("pnpm").await.unwrap_err();
        assert!(matches!(err, DeplayerError::LayerMetadata { .. }));
    }

    #[tokio::test]
    async fn get_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = LayerStore::new(dir.path());

        assert!(store.get("../etc").await.is_err());
        assert!(store.get("").await.is_err());
    }

    #[tokio::test]
    async fn commit_outcome_writes_bom_files_by_role() {
        let dir = TempDir::new().unwrap();
        let store = LayerStore::new(dir.path());
        std::fs::write(dir.path().join("build.toml"), "[[bom]]\nname = \"stale\"\n").unwrap();

        let outcome = BuildOutcome {
            layers: vec![store.get("pnpm").await.unwrap()],
            build: BuildMetadata::default(),
            launch: LaunchMetadata {
                bom: vec![bom_entry()],
            },
            decision: Decision::Rebuilt,
        };
        store.commit_outcome(&outcome).await.unwrap();

        assert!(!dir.path().join("build.toml").exists());
        let launch = store.read_bom("launch.toml").await.unwrap();
        assert_eq!(launch, vec![bom_entry()]);
        assert!(dir.path().join("pnpm.toml").exists());
    }
}
