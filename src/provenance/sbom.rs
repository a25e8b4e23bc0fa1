//! SBOM documents and their output formats
//!
//! An `Sbom` is generated from the installed layer contents and rendered into
//! each media type the buildpack descriptor lists under `sbom-formats`.

use crate::dependency::Dependency;
use crate::error::{DeplayerError, DeplayerResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const TOOL_NAME: &str = env!("CARGO_PKG_NAME");
const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Supported SBOM output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SbomFormat {
    /// CycloneDX 1.3 JSON
    CycloneDx,
    /// SPDX 2.2 JSON
    Spdx,
    /// Syft native JSON
    Syft,
}

impl SbomFormat {
    /// All formats, in rendering order
    pub fn all() -> &'static [Self] {
        &[Self::CycloneDx, Self::Spdx, Self::Syft]
    }

    /// Media type as written in buildpack descriptors
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::CycloneDx => "application/vnd.cyclonedx+json",
            Self::Spdx => "application/spdx+json",
            Self::Syft => "application/vnd.syft+json",
        }
    }

    /// File extension used for `<layer>.sbom.<ext>`
    pub fn extension(&self) -> &'static str {
        match self {
            Self::CycloneDx => "cdx.json",
            Self::Spdx => "spdx.json",
            Self::Syft => "syft.json",
        }
    }
}

impl fmt::Display for SbomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.media_type())
    }
}

impl FromStr for SbomFormat {
    type Err = DeplayerError;

    /// Parse a media type; parameters such as `;version=1.3` are ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let media_type = s.split(';').next().unwrap_or_default().trim();
        Self::all()
            .iter()
            .find(|f| f.media_type() == media_type)
            .copied()
            .ok_or_else(|| DeplayerError::SbomFormat(s.to_string()))
    }
}

impl TryFrom<String> for SbomFormat {
    type Error = DeplayerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SbomFormat> for String {
    fn from(format: SbomFormat) -> Self {
        format.media_type().to_string()
    }
}

/// A file observed in the installed layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbomFile {
    /// Path relative to the layer root, `/` separated
    pub path: String,
    /// SHA-256 of the file contents, hex encoded
    pub sha256: String,
    pub size: u64,
}

/// Software bill of materials for one installed dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sbom {
    pub dependency: Dependency,
    pub files: Vec<SbomFile>,
}

impl Sbom {
    /// Render this SBOM into each requested format
    pub fn in_formats(
        &self,
        formats: &[SbomFormat],
    ) -> DeplayerResult<BTreeMap<SbomFormat, String>> {
        let mut rendered = BTreeMap::new();

        for format in formats {
            let document = match format {
                SbomFormat::CycloneDx => self.cyclonedx(),
                SbomFormat::Spdx => self.spdx(),
                SbomFormat::Syft => self.syft(),
            };
            rendered.insert(*format, serde_json::to_string_pretty(&document)?);
        }

        Ok(rendered)
    }

    fn cyclonedx(&self) -> Value {
        let dep = &self.dependency;

        let mut component = json!({
            "type": "library",
            "name": dep.display_name(),
            "version": dep.version,
            "hashes": [{ "alg": "SHA-256", "content": dep.sha256 }],
            "licenses": dep.licenses.iter()
                .map(|id| json!({ "license": { "id": id } }))
                .collect::<Vec<_>>(),
        });
        if let Some(cpe) = &dep.cpe {
            component["cpe"] = json!(cpe);
        }
        if let Some(purl) = &dep.purl {
            component["purl"] = json!(purl);
        }

        let files = self.files.iter().map(|file| {
            json!({
                "type": "file",
                "name": file.path,
                "hashes": [{ "alg": "SHA-256", "content": file.sha256 }],
            })
        });

        json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.3",
            "serialNumber": format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            "version": 1,
            "metadata": {
                "timestamp": Utc::now().to_rfc3339(),
                "tools": [{ "vendor": TOOL_NAME, "name": TOOL_NAME, "version": TOOL_VERSION }],
            },
            "components": std::iter::once(component).chain(files).collect::<Vec<_>>(),
        })
    }

    fn spdx(&self) -> Value {
        let dep = &self.dependency;

        let license = if dep.licenses.is_empty() {
            "NOASSERTION".to_string()
        } else {
            dep.licenses.join(" AND ")
        };

        let mut external_refs = Vec::new();
        if let Some(cpe) = &dep.cpe {
            external_refs.push(json!({
                "referenceCategory": "SECURITY",
                "referenceType": "cpe23Type",
                "referenceLocator": cpe,
            }));
        }
        if let Some(purl) = &dep.purl {
            external_refs.push(json!({
                "referenceCategory": "PACKAGE_MANAGER",
                "referenceType": "purl",
                "referenceLocator": purl,
            }));
        }

        let files: Vec<Value> = self
            .files
            .iter()
            .enumerate()
            .map(|(index, file)| {
                json!({
                    "SPDXID": format!("SPDXRef-File-{index}"),
                    "fileName": file.path,
                    "checksums": [{ "algorithm": "SHA256", "checksumValue": file.sha256 }],
                    "licenseConcluded": "NOASSERTION",
                })
            })
            .collect();

        json!({
            "spdxVersion": "SPDX-2.2",
            "dataLicense": "CC0-1.0",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": format!("{}-{}", dep.id, dep.version),
            "documentNamespace": format!(
                "https://{TOOL_NAME}.invalid/spdx/{}-{}",
                dep.id,
                uuid::Uuid::new_v4()
            ),
            "creationInfo": {
                "created": Utc::now().to_rfc3339(),
                "creators": [format!("Tool: {TOOL_NAME}-{TOOL_VERSION}")],
            },
            "packages": [{
                "SPDXID": format!("SPDXRef-Package-{}", spdx_id_fragment(&dep.id)),
                "name": dep.display_name(),
                "versionInfo": dep.version,
                "downloadLocation": dep.uri,
                "filesAnalyzed": !files.is_empty(),
                "checksums": [{ "algorithm": "SHA256", "checksumValue": dep.sha256 }],
                "licenseConcluded": "NOASSERTION",
                "licenseDeclared": license,
                "externalRefs": external_refs,
            }],
            "files": files,
        })
    }

    fn syft(&self) -> Value {
        let dep = &self.dependency;

        json!({
            "artifacts": [{
                "id": format!("{}-{}", dep.id, dep.version),
                "name": dep.display_name(),
                "version": dep.version,
                "type": "binary",
                "licenses": dep.licenses,
                "cpes": dep.cpe.iter().collect::<Vec<_>>(),
                "purl": dep.purl.clone().unwrap_or_default(),
                "metadata": { "uri": dep.uri, "sha256": dep.sha256 },
            }],
            "files": self.files.iter().map(|file| json!({
                "location": { "path": file.path },
                "digests": [{ "algorithm": "sha256", "value": file.sha256 }],
                "size": file.size,
            })).collect::<Vec<_>>(),
            "source": { "type": "directory" },
            "descriptor": { "name": TOOL_NAME, "version": TOOL_VERSION },
            "schema": { "version": "3.0.1" },
        })
    }
}

/// SPDX ids allow only letters, digits, `.` and `-`
fn spdx_id_fragment(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' })
        .collect()
}
