//! Layer reuse decision

use crate::dependency::Dependency;

/// Metadata key holding the content hash of the last committed install
pub const CACHE_KEY: &str = "cache_sha";

/// Whether the persisted layer already holds exactly this dependency.
///
/// True only when `metadata` carries a string `cache_sha` equal to the
/// dependency's content hash. Versions, paths and timestamps are never
/// consulted.
pub fn should_reuse(metadata: &toml::Table, dependency: &Dependency) -> bool {
    metadata
        .get(CACHE_KEY)
        .and_then(toml::Value::as_str)
        .is_some_and(|cached| cached == dependency.content_hash())
}
