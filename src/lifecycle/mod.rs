//! Layer reuse decision and lifecycle
//!
//! `should_reuse` compares the persisted cache key with the freshly resolved
//! content hash. `Build` acts on that decision: it either hands the existing
//! layer back with updated roles, or resets it, installs the dependency,
//! records its SBOM and commits the new cache key.

pub mod build;
pub mod decision;

#[cfg(test)]
pub(crate) mod fakes;

pub use build::{Build, BuildContext, BuildOutcome, Decision, LifecycleState};
pub use decision::{should_reuse, CACHE_KEY};
