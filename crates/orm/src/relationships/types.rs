//! Relation Values and Lazy Resolution
//!
//! A relationship resolves to a [`Related`] value: a single model-or-null for
//! `has_one`/`belongs_to`, a collection for `has_many`/`belongs_to_many`.
//! Only resolved values are cached on the owning model; the descriptor itself
//! is re-read from the entity definition on every access.

use crate::collection::ModelCollection;
use crate::error::{ModelError, OrmResult};
use crate::model::Model;
use crate::query::ModelQuery;
use crate::relationships::pivot;
use crate::relationships::RelationKind;

/// A resolved relationship value.
#[derive(Debug, Clone)]
pub enum Related {
    /// `has_one` / `belongs_to`: a single related model, or none.
    One(Option<Box<Model>>),
    /// `has_many` / `belongs_to_many`: a collection, possibly empty.
    Many(ModelCollection),
}

impl Related {
    pub fn empty_for(kind: RelationKind) -> Self {
        if kind.is_collection() {
            Related::Many(ModelCollection::new())
        } else {
            Related::One(None)
        }
    }

    pub fn one(&self) -> Option<&Model> {
        match self {
            Related::One(model) => model.as_deref(),
            Related::Many(_) => None,
        }
    }

    pub fn many(&self) -> Option<&ModelCollection> {
        match self {
            Related::Many(collection) => Some(collection),
            Related::One(_) => None,
        }
    }

    /// Number of related models currently held.
    pub fn count(&self) -> usize {
        match self {
            Related::One(model) => usize::from(model.is_some()),
            Related::Many(collection) => collection.len(),
        }
    }
}

impl Model {
    /// Resolve a relationship lazily, caching the value. Repeated calls
    /// return the cached value without touching the database.
    pub fn relation(&mut self, name: &str) -> OrmResult<&Related> {
        if !self.relation_loaded(name) {
            let resolved = self.resolve_relation(name)?;
            self.set_relation(name, resolved);
        }
        self.related(name).ok_or_else(|| {
            ModelError::Relationship(format!("relation '{name}' missing after resolution"))
        })
    }

    /// Build the constrained query a relationship describes, without
    /// executing it.
    pub fn relation_query(&self, name: &str) -> OrmResult<ModelQuery> {
        let relation = self.def.relation(name).ok_or_else(|| {
            ModelError::Relationship(format!(
                "unknown relation '{name}' on entity '{}'",
                self.def.name
            ))
        })?;
        let database = self.require_database()?;
        let related = relation.related();
        let query = ModelQuery::new(related, &database);
        let query = match relation.kind {
            RelationKind::HasOne | RelationKind::HasMany => {
                let owner_key = relation.resolved_owner_key(self.def);
                let foreign_key = relation.resolved_foreign_key(self.def);
                query.where_eq(&foreign_key, self.get_raw(&owner_key))
            }
            RelationKind::BelongsTo => {
                let foreign_key = relation.resolved_foreign_key(self.def);
                let owner_key = relation.resolved_owner_key(self.def);
                query.where_eq(&owner_key, self.get_raw(&foreign_key))
            }
            RelationKind::BelongsToMany => {
                return Err(ModelError::Relationship(format!(
                    "relation '{name}' resolves through a pivot table; use relation()"
                )))
            }
        };
        Ok(query)
    }

    fn resolve_relation(&self, name: &str) -> OrmResult<Related> {
        let relation = self.def.relation(name).ok_or_else(|| {
            ModelError::Relationship(format!(
                "unknown relation '{name}' on entity '{}'",
                self.def.name
            ))
        })?;
        let database = self.require_database()?;
        let related_def = relation.related();

        match relation.kind {
            RelationKind::HasOne | RelationKind::HasMany => {
                let owner_key = relation.resolved_owner_key(self.def);
                let key = self.get_raw(&owner_key);
                if key.is_null() {
                    return Ok(Related::empty_for(relation.kind));
                }
                let foreign_key = relation.resolved_foreign_key(self.def);
                let query = ModelQuery::new(related_def, &database).where_eq(&foreign_key, key);
                if relation.kind == RelationKind::HasOne {
                    Ok(Related::One(query.first()?.map(Box::new)))
                } else {
                    Ok(Related::Many(query.get()?))
                }
            }
            RelationKind::BelongsTo => {
                let foreign_key = relation.resolved_foreign_key(self.def);
                let key = self.get_raw(&foreign_key);
                // A null foreign key resolves to none, never an error.
                if key.is_null() {
                    return Ok(Related::One(None));
                }
                let owner_key = relation.resolved_owner_key(self.def);
                let query = ModelQuery::new(related_def, &database).where_eq(&owner_key, key);
                Ok(Related::One(query.first()?.map(Box::new)))
            }
            RelationKind::BelongsToMany => {
                let key = self.primary_key_value();
                if key.is_null() {
                    return Ok(Related::Many(ModelCollection::new()));
                }
                let table = relation.resolved_pivot_table(self.def);
                let foreign_pivot_key = relation.resolved_pivot_foreign_key(self.def);
                let related_pivot_key = relation.resolved_pivot_related_key();
                let rows =
                    pivot::pivot_rows(&database, &table, &foreign_pivot_key, &[key])?;
                let ids: Vec<_> = rows
                    .iter()
                    .filter_map(|row| row.get(&related_pivot_key).cloned())
                    .filter(|id| !id.is_null())
                    .collect();
                if ids.is_empty() {
                    return Ok(Related::Many(ModelCollection::new()));
                }
                let query = ModelQuery::new(related_def, &database)
                    .where_in(&related_def.primary_key, ids);
                Ok(Related::Many(query.get()?))
            }
        }
    }
}
