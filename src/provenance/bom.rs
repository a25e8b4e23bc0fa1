//! Bill-of-materials entries
//!
//! A BOM entry is a cheap, metadata-only provenance record generated from the
//! resolved dependency on every invocation, including the reuse path.

use crate::dependency::Dependency;
use crate::layer::LayerRoles;
use serde::{Deserialize, Serialize};

/// Provenance record for one dependency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BomEntry {
    pub name: String,

    #[serde(default)]
    pub metadata: toml::Table,
}

/// BOM attached to the build phase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildMetadata {
    pub bom: Vec<BomEntry>,
}

/// BOM attached to the launch phase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchMetadata {
    pub bom: Vec<BomEntry>,
}

/// Attach BOM entries to the phases the layer participates in
pub fn record_provenance(bom: Vec<BomEntry>, roles: LayerRoles) -> (BuildMetadata, LaunchMetadata) {
    let build = if roles.build {
        BuildMetadata { bom: bom.clone() }
    } else {
        BuildMetadata::default()
    };

    let launch = if roles.launch {
        LaunchMetadata { bom }
    } else {
        LaunchMetadata::default()
    };

    (build, launch)
}

/// Generate one BOM entry per dependency
pub fn bill_of_materials(dependencies: &[Dependency]) -> Vec<BomEntry> {
    dependencies.iter().map(entry_for).collect()
}

fn entry_for(dependency: &Dependency) -> BomEntry {
    let mut metadata = toml::Table::new();
    metadata.insert("version".to_string(), dependency.version.as_str().into());
    metadata.insert("uri".to_string(), dependency.uri.as_str().into());
    metadata.insert("sha256".to_string(), dependency.sha256.as_str().into());

    let mut checksum = toml::Table::new();
    checksum.insert("algorithm".to_string(), "SHA-256".into());
    checksum.insert("hash".to_string(), dependency.sha256.as_str().into());
    metadata.insert("checksum".to_string(), toml::Value::Table(checksum));

    if !dependency.stacks.is_empty() {
        metadata.insert("stacks".to_string(), string_array(&dependency.stacks));
    }
    if !dependency.licenses.is_empty() {
        metadata.insert("licenses".to_string(), string_array(&dependency.licenses));
    }

    let optional = [
        ("cpe", &dependency.cpe),
        ("purl", &dependency.purl),
        ("source", &dependency.source),
        ("source-sha256", &dependency.source_sha256),
        ("deprecation-date", &dependency.deprecation_date),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            metadata.insert(key.to_string(), value.as_str().into());
        }
    }

    BomEntry {
        name: dependency.display_name().to_string(),
        metadata,
    }
}

fn string_array(values: &[String]) -> toml::Value {
    toml::Value::Array(values.iter().map(|v| v.as_str().into()).collect())
}
