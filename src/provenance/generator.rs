//! SBOM generation from installed layer contents

use crate::dependency::Dependency;
use crate::error::{DeplayerError, DeplayerResult};
use crate::provenance::sbom::{Sbom, SbomFile};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Produces an SBOM by inspecting what was installed into a layer
#[async_trait]
pub trait SbomGenerator: Send + Sync {
    async fn generate_from_dependency(
        &self,
        dependency: &Dependency,
        dir: &Path,
    ) -> DeplayerResult<Sbom>;
}

/// Walks the layer directory and hashes every regular file
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemSbomGenerator;

impl FilesystemSbomGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SbomGenerator for FilesystemSbomGenerator {
    async fn generate_from_dependency(
        &self,
        dependency: &Dependency,
        dir: &Path,
    ) -> DeplayerResult<Sbom> {
        if !dir.is_dir() {
            return Err(DeplayerError::SbomGeneration(format!(
                "layer directory {} does not exist",
                dir.display()
            )));
        }

        let mut files = Vec::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(&current)
                .await
                .map_err(|e| scan_error(&current, e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| scan_error(&current, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| scan_error(&path, e))?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    files.push(describe_file(dir, path).await?);
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(Sbom {
            dependency: dependency.clone(),
            files,
        })
    }
}

async fn describe_file(root: &Path, path: PathBuf) -> DeplayerResult<SbomFile> {
    let contents = fs::read(&path).await.map_err(|e| scan_error(&path, e))?;
    let sha256 = hex::encode(Sha256::digest(&contents));

    let relative = path
        .strip_prefix(root)
        .unwrap_or(&path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    Ok(SbomFile {
        path: relative,
        sha256,
        size: contents.len() as u64,
    })
}

fn scan_error(path: &Path, source: std::io::Error) -> DeplayerError {
    DeplayerError::SbomGeneration(format!("scanning {}: {}", path.display(), source))
}
