//! Substitutable collaborators for lifecycle tests

use crate::dependency::Dependency;
use crate::error::{DeplayerError, DeplayerResult};
use crate::manager::DependencyManager;
use crate::provenance::{bill_of_materials, BomEntry, Sbom, SbomFile, SbomGenerator};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Arguments of a recorded `resolve` call
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveCall {
    pub path: PathBuf,
    pub id: String,
    pub version: String,
    pub stack: String,
}

/// Dependency manager returning a fixed dependency and recording calls
#[derive(Debug, Default)]
pub struct FakeDependencyManager {
    pub dependency: Mutex<Dependency>,
    pub resolve_error: Mutex<Option<String>>,
    pub deliver_error: Mutex<Option<String>>,
    pub resolve_calls: Mutex<Vec<ResolveCall>>,
    pub deliver_calls: Mutex<Vec<PathBuf>>,
}

impl FakeDependencyManager {
    pub fn new(sha256: &str) -> Self {
        let fake = Self::default();
        *fake.dependency.lock().unwrap() = Dependency {
            id: "pnpm".to_string(),
            name: "Pnpm".to_string(),
            version: "8.6.2".to_string(),
            stacks: vec!["io.buildpacks.stacks.jammy".to_string()],
            uri: "https://example.com/pnpm-8.6.2.tgz".to_string(),
            sha256: sha256.to_string(),
            ..Default::default()
        };
        fake
    }

    pub fn set_sha256(&self, sha256: &str) {
        self.dependency.lock().unwrap().sha256 = sha256.to_string();
    }

    pub fn fail_delivery(&self, reason: &str) {
        *self.deliver_error.lock().unwrap() = Some(reason.to_string());
    }

    pub fn fail_resolution(&self, reason: &str) {
        *self.resolve_error.lock().unwrap() = Some(reason.to_string());
    }

    pub fn deliveries(&self) -> usize {
        self.deliver_calls.lock().unwrap().len()
    }

    pub fn last_resolve(&self) -> Option<ResolveCall> {
        self.resolve_calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl DependencyManager for FakeDependencyManager {
    async fn resolve(
        &self,
        path: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> DeplayerResult<Dependency> {
        self.resolve_calls.lock().unwrap().push(ResolveCall {
            path: path.to_path_buf(),
            id: id.to_string(),
            version: version.to_string(),
            stack: stack.to_string(),
        });

        if let Some(reason) = self.resolve_error.lock().unwrap().clone() {
            return Err(DeplayerError::resolution(id, version, stack, reason));
        }
        Ok(self.dependency.lock().unwrap().clone())
    }

    async fn deliver(
        &self,
        dependency: &Dependency,
        _cnb_path: &Path,
        layer_path: &Path,
        _platform_path: &Path,
    ) -> DeplayerResult<()> {
        self.deliver_calls
            .lock()
            .unwrap()
            .push(layer_path.to_path_buf());

        if let Some(reason) = self.deliver_error.lock().unwrap().clone() {
            return Err(DeplayerError::delivery(&dependency.id, reason));
        }

        let bin = layer_path.join("bin");
        std::fs::create_dir_all(&bin).map_err(|e| DeplayerError::io("creating bin", e))?;
        std::fs::write(bin.join(&dependency.id), &dependency.sha256)
            .map_err(|e| DeplayerError::io("writing binary", e))?;
        Ok(())
    }

    fn generate_bill_of_materials(&self, dependencies: &[Dependency]) -> Vec<BomEntry> {
        bill_of_materials(dependencies)
    }
}

/// SBOM generator returning a one-file SBOM and recording calls
#[derive(Debug, Default)]
pub struct FakeSbomGenerator {
    pub error: Mutex<Option<String>>,
    pub calls: Mutex<Vec<(Dependency, PathBuf)>>,
}

impl FakeSbomGenerator {
    pub fn fail(&self, reason: &str) {
        *self.error.lock().unwrap() = Some(reason.to_string());
    }

    pub fn generations(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SbomGenerator for FakeSbomGenerator {
    async fn generate_from_dependency(
        &self,
        dependency: &Dependency,
        dir: &Path,
    ) -> DeplayerResult<Sbom> {
        self.calls
            .lock()
            .unwrap()
            .push((dependency.clone(), dir.to_path_buf()));

        if let Some(reason) = self.error.lock().unwrap().clone() {
            return Err(DeplayerError::SbomGeneration(reason));
        }

        Ok(Sbom {
            dependency: dependency.clone(),
            files: vec![SbomFile {
                path: format!("bin/{}", dependency.id),
                sha256: dependency.sha256.clone(),
                size: dependency.sha256.len() as u64,
            }],
        })
    }
}
