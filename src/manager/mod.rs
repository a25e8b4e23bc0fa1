//! Dependency management abstraction
//!
//! The lifecycle controller talks to resolution, delivery and BOM generation
//! only through `DependencyManager`. Production uses `CatalogManager`, which
//! reads the buildpack descriptor; tests substitute fakes.

pub mod catalog;

pub use catalog::CatalogManager;

use crate::dependency::Dependency;
use crate::error::DeplayerResult;
use crate::provenance::BomEntry;
use async_trait::async_trait;
use std::path::Path;

/// Resolves, installs and describes dependencies
#[async_trait]
pub trait DependencyManager: Send + Sync {
    /// Map a dependency id and version constraint to a concrete distribution
    /// from the catalog at `path`
    async fn resolve(
        &self,
        path: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> DeplayerResult<Dependency>;

    /// Install `dependency` into `layer_path`
    async fn deliver(
        &self,
        dependency: &Dependency,
        cnb_path: &Path,
        layer_path: &Path,
        platform_path: &Path,
    ) -> DeplayerResult<()>;

    /// Describe dependencies as BOM entries
    fn generate_bill_of_materials(&self, dependencies: &[Dependency]) -> Vec<BomEntry>;
}
