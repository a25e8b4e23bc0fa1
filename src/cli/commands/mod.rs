//! CLI command implementations

pub mod build;
pub mod inspect;

pub use build::execute as build;
pub use inspect::execute as inspect;
