//! deplayer - cached dependency layer build step
//!
//! Installs a catalog dependency into a Cloud Native Buildpacks layer,
//! reusing the layer when it already holds the same artifact, and records
//! the bill of materials and SBOM documents for what was installed.

pub mod cli;
pub mod config;
pub mod dependency;
pub mod error;
pub mod layer;
pub mod lifecycle;
pub mod manager;
pub mod plan;
pub mod provenance;

pub use error::{DeplayerError, DeplayerResult};
