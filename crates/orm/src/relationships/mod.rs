//! Relationships
//!
//! Descriptor metadata, key inference, resolved relation values, and pivot
//! table operations for the four relationship variants.

pub mod inference;
pub mod metadata;
pub mod pivot;
pub mod types;

pub use metadata::{PivotDef, RelationDef, RelationKind};
pub use pivot::SyncResult;
pub use types::Related;
