//! Query Scopes
//!
//! Global scopes registered for an entity type apply to every terminal
//! operation unless excluded by name or wholesale. Local scopes are named
//! refinements declared on the entity definition and invoked explicitly.

use crate::error::{ModelError, OrmResult};
use crate::query::builder::ModelQuery;
use crate::registry::SOFT_DELETE_SCOPE;

impl ModelQuery {
    /// Exclude one named global scope for this query.
    pub fn without_global_scope(mut self, name: &str) -> Self {
        self.excluded_scopes.insert(name.to_string());
        self
    }

    /// Exclude every global scope for this query.
    pub fn without_global_scopes(mut self) -> Self {
        self.all_scopes_excluded = true;
        self
    }

    /// Include soft-deleted rows alongside live ones.
    pub fn with_trashed(self) -> Self {
        self.without_global_scope(SOFT_DELETE_SCOPE)
    }

    /// Only soft-deleted rows.
    pub fn only_trashed(self) -> Self {
        let column = self.def.soft_delete.clone();
        let query = self.without_global_scope(SOFT_DELETE_SCOPE);
        match column {
            Some(column) => query.where_not_null(&column),
            None => query,
        }
    }

    /// Invoke a named local scope declared on the entity definition.
    pub fn scope(self, name: &str) -> OrmResult<Self> {
        match self.def.scopes.get(name) {
            Some(scope) => Ok(scope(self)),
            None => Err(ModelError::Query(format!(
                "unknown scope '{name}' on entity '{}'",
                self.def.name
            ))),
        }
    }

    /// Boot the type and fold the registered global scopes into the query
    /// state, once. Terminal operations call this before compiling.
    pub(crate) fn prepare(mut self) -> Self {
        if self.scopes_applied {
            return self;
        }
        self.scopes_applied = true;
        self.database.registry().boot(self.def);
        if self.all_scopes_excluded {
            return self;
        }
        let scopes = self.database.registry().global_scopes(self.def);
        let excluded = self.excluded_scopes.clone();
        let mut query = self;
        let boundary = query.conditions.len();
        for (name, scope) in scopes {
            if !excluded.contains(&name) {
                query = scope(query);
            }
        }
        if query.conditions.len() > boundary {
            query.scope_boundary = Some(boundary);
        }
        // A scope may have rebuilt the query; the flag rides along because
        // scopes refine rather than replace.
        query.scopes_applied = true;
        query
    }
}
