//! Query Builder - Core builder implementation

use std::collections::HashSet;

use crate::database::Database;
use crate::model::EntityDef;
use crate::query::types::{Connective, OrderDirection, WhereCondition};

/// Fluent query builder for one entity type. Filter and sort methods
/// accumulate state; terminal methods (in `execution`, `pagination`, `dml`)
/// apply the type's global scopes and execute through the statement layer.
#[derive(Debug, Clone)]
pub struct ModelQuery {
    pub(crate) def: &'static EntityDef,
    pub(crate) database: Database,
    pub(crate) select_columns: Vec<String>,
    pub(crate) conditions: Vec<(Connective, WhereCondition)>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) limit_count: Option<u64>,
    pub(crate) offset_count: Option<u64>,
    /// Relation names to eager-load, deduplicated, in request order.
    pub(crate) eager_load: Vec<String>,
    pub(crate) excluded_scopes: HashSet<String>,
    pub(crate) all_scopes_excluded: bool,
    pub(crate) scopes_applied: bool,
    /// Index separating caller conditions from scope-added ones, so scope
    /// filters compile into their own AND-joined fragment and cannot be
    /// escaped by a caller's OR.
    pub(crate) scope_boundary: Option<usize>,
}

impl ModelQuery {
    /// Create a query for an entity type on a database handle.
    pub fn new(def: &'static EntityDef, database: &Database) -> Self {
        Self {
            def,
            database: database.clone(),
            select_columns: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit_count: None,
            offset_count: None,
            eager_load: Vec::new(),
            excluded_scopes: HashSet::new(),
            all_scopes_excluded: false,
            scopes_applied: false,
            scope_boundary: None,
        }
    }

    pub fn definition(&self) -> &'static EntityDef {
        self.def
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Restrict the SELECT column list. An empty list selects everything.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit_count = Some(count);
        self
    }

    pub fn offset(mut self, count: u64) -> Self {
        self.offset_count = Some(count);
        self
    }

    /// Request eager loading of a relation. Duplicate names across repeated
    /// calls are deduplicated; the request is idempotent.
    pub fn with(mut self, relation: &str) -> Self {
        if !self.eager_load.iter().any(|name| name == relation) {
            self.eager_load.push(relation.to_string());
        }
        self
    }

    /// Request eager loading of several relations.
    pub fn with_many<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for relation in relations {
            self = self.with(&relation.into());
        }
        self
    }

    /// Apply a refinement only when the condition holds.
    pub fn when<F>(self, condition: bool, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        if condition {
            f(self)
        } else {
            self
        }
    }
}
