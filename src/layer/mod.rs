//! Persisted dependency layers
//!
//! A layer caches one installed dependency across build invocations. Its
//! metadata records the content hash of what was installed; nothing else
//! decides whether the installation can be reused.

pub mod state;
pub mod store;

pub use state::{Layer, LayerRoles};
pub use store::{BomFile, LayerStore};
