//! Relationship Metadata
//!
//! Relationship descriptors declared on an entity definition. Descriptors
//! carry the related definition as a thunk so mutually-related entity types
//! can reference each other; the thunk is only invoked at resolution time,
//! never while definitions are being built.

use serde::{Deserialize, Serialize};

use super::inference;
use crate::model::EntityDef;

/// The four relationship variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// One parent has one related row (foreign key on the related table).
    HasOne,
    /// One parent has many related rows (foreign key on the related table).
    HasMany,
    /// Inverse: this row carries the foreign key of a single parent.
    BelongsTo,
    /// Many-to-many through a pivot table.
    BelongsToMany,
}

impl RelationKind {
    /// Whether this relationship resolves to a collection.
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::BelongsToMany)
    }

    /// Whether this relationship goes through a pivot table.
    pub fn requires_pivot(self) -> bool {
        matches!(self, Self::BelongsToMany)
    }
}

/// Pivot table configuration for many-to-many relationships. Unset fields
/// fall back to convention at resolution time.
#[derive(Debug, Clone, Default)]
pub struct PivotDef {
    pub table: Option<String>,
    /// Pivot column referencing the owning entity.
    pub foreign_pivot_key: Option<String>,
    /// Pivot column referencing the related entity.
    pub related_pivot_key: Option<String>,
}

/// A declared relationship on an entity definition.
#[derive(Clone)]
pub struct RelationDef {
    pub name: String,
    pub kind: RelationKind,
    pub related: fn() -> &'static EntityDef,
    foreign_key: Option<String>,
    owner_key: Option<String>,
    pivot: Option<PivotDef>,
}

impl std::fmt::Debug for RelationDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("foreign_key", &self.foreign_key)
            .field("owner_key", &self.owner_key)
            .field("pivot", &self.pivot)
            .finish()
    }
}

impl RelationDef {
    fn new(name: &str, kind: RelationKind, related: fn() -> &'static EntityDef) -> Self {
        Self {
            name: name.to_string(),
            kind,
            related,
            foreign_key: None,
            owner_key: None,
            pivot: kind.requires_pivot().then(PivotDef::default),
        }
    }

    pub fn has_one(name: &str, related: fn() -> &'static EntityDef) -> Self {
        Self::new(name, RelationKind::HasOne, related)
    }

    pub fn has_many(name: &str, related: fn() -> &'static EntityDef) -> Self {
        Self::new(name, RelationKind::HasMany, related)
    }

    pub fn belongs_to(name: &str, related: fn() -> &'static EntityDef) -> Self {
        Self::new(name, RelationKind::BelongsTo, related)
    }

    pub fn belongs_to_many(name: &str, related: fn() -> &'static EntityDef) -> Self {
        Self::new(name, RelationKind::BelongsToMany, related)
    }

    /// Override the inferred foreign key column.
    pub fn with_foreign_key(mut self, column: &str) -> Self {
        self.foreign_key = Some(column.to_string());
        self
    }

    /// Override the inferred local/owner key column.
    pub fn with_owner_key(mut self, column: &str) -> Self {
        self.owner_key = Some(column.to_string());
        self
    }

    /// Override the inferred pivot table name (many-to-many only).
    pub fn with_pivot_table(mut self, table: &str) -> Self {
        if let Some(pivot) = self.pivot.as_mut() {
            pivot.table = Some(table.to_string());
        }
        self
    }

    /// Override the inferred pivot key columns (many-to-many only).
    pub fn with_pivot_keys(mut self, foreign_pivot_key: &str, related_pivot_key: &str) -> Self {
        if let Some(pivot) = self.pivot.as_mut() {
            pivot.foreign_pivot_key = Some(foreign_pivot_key.to_string());
            pivot.related_pivot_key = Some(related_pivot_key.to_string());
        }
        self
    }

    pub fn related(&self) -> &'static EntityDef {
        (self.related)()
    }

    /// Foreign key column, resolved against convention: for `has*` relations
    /// it lives on the related table and names the owner; for `belongs_to` it
    /// lives on the owning table and names the related type.
    pub fn resolved_foreign_key(&self, owner: &EntityDef) -> String {
        match &self.foreign_key {
            Some(column) => column.clone(),
            None => match self.kind {
                RelationKind::HasOne | RelationKind::HasMany => {
                    inference::foreign_key(&owner.name)
                }
                RelationKind::BelongsTo => inference::foreign_key(&self.related().name),
                RelationKind::BelongsToMany => inference::foreign_key(&self.related().name),
            },
        }
    }

    /// Local key on the side that owns the identity being matched: the owner's
    /// primary key for `has*`, the related primary key for `belongs_to`.
    pub fn resolved_owner_key(&self, owner: &EntityDef) -> String {
        match &self.owner_key {
            Some(column) => column.clone(),
            None => match self.kind {
                RelationKind::HasOne | RelationKind::HasMany => owner.primary_key.clone(),
                RelationKind::BelongsTo | RelationKind::BelongsToMany => {
                    self.related().primary_key.clone()
                }
            },
        }
    }

    pub fn resolved_pivot_table(&self, owner: &EntityDef) -> String {
        match self.pivot.as_ref().and_then(|p| p.table.clone()) {
            Some(table) => table,
            None => inference::pivot_table(&owner.table, &self.related().table),
        }
    }

    pub fn resolved_pivot_foreign_key(&self, owner: &EntityDef) -> String {
        match self.pivot.as_ref().and_then(|p| p.foreign_pivot_key.clone()) {
            Some(column) => column,
            None => inference::foreign_key(&owner.name),
        }
    }

    pub fn resolved_pivot_related_key(&self) -> String {
        match self.pivot.as_ref().and_then(|p| p.related_pivot_key.clone()) {
            Some(column) => column,
            None => inference::foreign_key(&self.related().name),
        }
    }
}
