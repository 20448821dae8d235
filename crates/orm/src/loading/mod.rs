//! Relationship Loading
//!
//! The eager-loading engine: batch resolution of requested relations for a
//! whole result set in a fixed number of queries.

pub mod eager_loader;

pub use eager_loader::load_related;
