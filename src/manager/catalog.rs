//! Catalog-backed dependency manager
//!
//! Resolution picks the highest catalog version that matches the requested
//! constraint and stack. Delivery fetches the artifact, verifies its SHA-256
//! and places it in the layer.

use crate::config::BuildpackDescriptor;
use crate::dependency::Dependency;
use crate::error::{DeplayerError, DeplayerResult};
use crate::manager::DependencyManager;
use crate::plan::DEFAULT_VERSION;
use crate::provenance::{bill_of_materials, BomEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use semver::{Version, VersionReq};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Largest artifact accepted over HTTP
const MAX_ARTIFACT_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Platform binding type that redirects dependency downloads
const DEPENDENCY_MAPPING_TYPE: &str = "dependency-mapping";

/// Dependency manager backed by the `[[metadata.dependencies]]` catalog
#[derive(Debug, Default, Clone, Copy)]
pub struct CatalogManager;

impl CatalogManager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DependencyManager for CatalogManager {
    async fn resolve(
        &self,
        path: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> DeplayerResult<Dependency> {
        let descriptor = BuildpackDescriptor::from_file(path).await?;
        let dependency = select(&descriptor, id, version, stack)?;

        if is_deprecated(&dependency, Utc::now()) {
            warn!(
                "Version {} of {} is deprecated and will be removed from the catalog",
                dependency.version,
                dependency.display_name()
            );
        }

        Ok(dependency)
    }

    async fn deliver(
        &self,
        dependency: &Dependency,
        cnb_path: &Path,
        layer_path: &Path,
        platform_path: &Path,
    ) -> DeplayerResult<()> {
        let uri = match mapped_uri(dependency, platform_path).await? {
            Some(mapped) => {
                debug!("Dependency mapping redirects {} to {}", dependency.uri, mapped);
                mapped
            }
            None => dependency.uri.clone(),
        };

        let contents = fetch(&dependency.id, &uri, cnb_path).await?;
        verify_checksum(&uri, &contents, &dependency.sha256)?;

        tokio::fs::create_dir_all(layer_path).await.map_err(|e| {
            let reason = format!("creating {}: {}", layer_path.display(), e);
            DeplayerError::delivery(&dependency.id, reason)
        })?;

        let target = layer_path.join(dependency.artifact_name());
        tokio::fs::write(&target, &contents).await.map_err(|e| {
            DeplayerError::delivery(&dependency.id, format!("writing {}: {}", target.display(), e))
        })?;

        debug!("Installed {} ({} bytes)", target.display(), contents.len());
        Ok(())
    }

    fn generate_bill_of_materials(&self, dependencies: &[Dependency]) -> Vec<BomEntry> {
        bill_of_materials(dependencies)
    }
}

/// Choose the highest catalog entry matching id, stack and version constraint
pub fn select(
    descriptor: &BuildpackDescriptor,
    id: &str,
    version: &str,
    stack: &str,
) -> DeplayerResult<Dependency> {
    let constraint = if version == DEFAULT_VERSION {
        descriptor
            .metadata
            .default_versions
            .get(id)
            .map(String::as_str)
            .unwrap_or("*")
    } else {
        version
    };

    let requirement = parse_constraint(constraint).ok_or_else(|| {
        DeplayerError::resolution(id, version, stack, "invalid version constraint")
    })?;

    let supported: Vec<&Dependency> = descriptor
        .metadata
        .dependencies
        .iter()
        .filter(|d| d.id == id && d.supports_stack(stack))
        .collect();

    let chosen = supported
        .iter()
        .filter_map(|d| parse_version(&d.version).map(|v| (v, *d)))
        .filter(|(v, _)| requirement.matches(v))
        .max_by(|(a, _), (b, _)| a.cmp(b));

    match chosen {
        Some((_, dependency)) => {
            debug!("Resolved {} {} to {}", id, constraint, dependency.version);
            Ok(dependency.clone())
        }
        None => {
            let mut available: Vec<&str> = supported.iter().map(|d| d.version.as_str()).collect();
            available.sort_unstable();
            let reason = if available.is_empty() {
                "no versions available".to_string()
            } else {
                format!(
                    "no version matches {} (supported: {})",
                    constraint,
                    available.join(", ")
                )
            };
            Err(DeplayerError::resolution(id, version, stack, reason))
        }
    }
}

/// Parse a version, padding missing minor/patch components
fn parse_version(version: &str) -> Option<Version> {
    let trimmed = version.trim().trim_start_matches('v');
    if let Ok(v) = Version::parse(trimmed) {
        return Some(v);
    }

    let core: Vec<&str> = trimmed.split('.').collect();
    if core.is_empty() || core.len() > 3 || core.iter().any(|p| p.parse::<u64>().is_err()) {
        return None;
    }
    let mut padded = core;
    padded.resize(3, "0");
    Version::parse(&padded.join(".")).ok()
}

/// A bare version is an exact pin; anything else is a semver requirement
fn parse_constraint(constraint: &str) -> Option<VersionReq> {
    let trimmed = constraint.trim();
    if let Ok(exact) = Version::parse(trimmed.trim_start_matches('v')) {
        return VersionReq::parse(&format!("={exact}")).ok();
    }
    VersionReq::parse(trimmed).ok()
}

fn is_deprecated(dependency: &Dependency, now: DateTime<Utc>) -> bool {
    dependency
        .deprecation_date
        .as_deref()
        .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
        .is_some_and(|d| d.with_timezone(&Utc) <= now)
}

/// Look up a `dependency-mapping` binding for the dependency's checksum
async fn mapped_uri(
    dependency: &Dependency,
    platform_path: &Path,
) -> DeplayerResult<Option<String>> {
    let bindings = platform_path.join("bindings");
    if !bindings.is_dir() {
        return Ok(None);
    }

    let mut entries = tokio::fs::read_dir(&bindings)
        .await
        .map_err(|e| DeplayerError::io(format!("reading {}", bindings.display()), e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DeplayerError::io(format!("reading {}", bindings.display()), e))?
    {
        let binding = entry.path();
        let kind = tokio::fs::read_to_string(binding.join("type")).await.ok();
        if kind.as_deref().map(str::trim) != Some(DEPENDENCY_MAPPING_TYPE) {
            continue;
        }

        let mapping = binding.join(&dependency.sha256);
        match tokio::fs::read_to_string(&mapping).await {
            Ok(uri) => return Ok(Some(uri.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(DeplayerError::delivery(
                    &dependency.id,
                    format!("reading dependency mapping {}: {}", mapping.display(), e),
                ))
            }
        }
    }

    Ok(None)
}

/// Read the artifact from a file path, `file://` URI, or HTTP(S) URL
async fn fetch(id: &str, uri: &str, cnb_path: &Path) -> DeplayerResult<Vec<u8>> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        let url = uri.to_string();
        let result = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ureq::Error> {
            let mut response = ureq::get(url.as_str()).call()?;
            response
                .body_mut()
                .with_config()
                .limit(MAX_ARTIFACT_BYTES)
                .read_to_vec()
        })
        .await
        .map_err(|e| DeplayerError::Internal(format!("download task failed: {e}")))?;

        return result.map_err(|e| DeplayerError::delivery(id, format!("downloading {uri}: {e}")));
    }

    let local = local_path(uri, cnb_path);
    tokio::fs::read(&local)
        .await
        .map_err(|e| DeplayerError::delivery(id, format!("reading {}: {}", local.display(), e)))
}

fn local_path(uri: &str, cnb_path: &Path) -> PathBuf {
    let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cnb_path.join(path)
    }
}

fn verify_checksum(uri: &str, contents: &[u8], expected: &str) -> DeplayerResult<()> {
    let actual = hex::encode(Sha256::digest(contents));
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(DeplayerError::ChecksumMismatch {
            uri: uri.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}
