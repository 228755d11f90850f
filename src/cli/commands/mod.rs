//! CLI command implementations.

pub mod enrich;
pub mod fetch;
pub mod freshness;
pub mod validate;
