//! Provenance recording
//!
//! BOM entries are generated on every invocation and attached to the build
//! and launch metadata according to the layer's roles. SBOM documents are
//! generated only when a layer is rebuilt and SBOM output is not disabled.

pub mod bom;
pub mod generator;
pub mod sbom;

pub use bom::{bill_of_materials, record_provenance, BomEntry, BuildMetadata, LaunchMetadata};
pub use generator::{FilesystemSbomGenerator, SbomGenerator};
pub use sbom::{Sbom, SbomFile, SbomFormat};
