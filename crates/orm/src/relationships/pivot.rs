//! Pivot Table Operations
//!
//! Many-to-many attachment management: `attach` inserts missing pivot rows,
//! `detach` removes the given ids, `sync` makes the pivot rows exactly match
//! the given id set. All three operate directly on the pivot table and fire
//! no entity lifecycle events.

use serde_json::Value;

use crate::backends::{Row, Statement};
use crate::collection::key_string;
use crate::database::Database;
use crate::error::{ModelError, OrmResult};
use crate::model::Model;
use crate::relationships::{RelationDef, RelationKind};

/// Outcome of a [`Model::sync`] call.
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    pub attached: Vec<Value>,
    pub detached: Vec<Value>,
}

/// Fetch pivot rows whose column matches any of the given keys.
pub(crate) fn pivot_rows(
    database: &Database,
    table: &str,
    column: &str,
    keys: &[Value],
) -> OrmResult<Vec<Row>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders: Vec<String> = (0..keys.len()).map(|i| format!(":k{i}")).collect();
    let mut statement = Statement::prepare()
        .from(table)
        .where_expr(&format!("{column} IN ({})", placeholders.join(", ")));
    for (i, key) in keys.iter().enumerate() {
        statement = statement.assign(&format!("k{i}"), key.clone());
    }
    database.connection().query(&statement)
}

impl Model {
    fn pivot_relation(&self, name: &str) -> OrmResult<&RelationDef> {
        let relation = self.def.relation(name).ok_or_else(|| {
            ModelError::Relationship(format!(
                "unknown relation '{name}' on entity '{}'",
                self.def.name
            ))
        })?;
        if relation.kind != RelationKind::BelongsToMany {
            return Err(ModelError::Relationship(format!(
                "relation '{name}' is not many-to-many"
            )));
        }
        Ok(relation)
    }

    /// Currently attached related ids for a many-to-many relation.
    pub fn attached_ids(&self, name: &str) -> OrmResult<Vec<Value>> {
        let relation = self.pivot_relation(name)?;
        let database = self.require_database()?;
        let table = relation.resolved_pivot_table(self.def);
        let foreign_pivot_key = relation.resolved_pivot_foreign_key(self.def);
        let related_pivot_key = relation.resolved_pivot_related_key();
        let rows = pivot_rows(
            &database,
            &table,
            &foreign_pivot_key,
            &[self.require_primary_key()?],
        )?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get(&related_pivot_key).cloned())
            .filter(|id| !id.is_null())
            .collect())
    }

    /// Insert pivot rows for any of the given ids not yet attached.
    pub fn attach(&mut self, name: &str, ids: &[Value]) -> OrmResult<()> {
        let relation = self.pivot_relation(name)?;
        let database = self.require_database()?;
        let table = relation.resolved_pivot_table(self.def);
        let foreign_pivot_key = relation.resolved_pivot_foreign_key(self.def);
        let related_pivot_key = relation.resolved_pivot_related_key();
        let own_key = self.require_primary_key()?;

        let existing: Vec<String> = self
            .attached_ids(name)?
            .iter()
            .map(key_string)
            .collect();
        for id in ids {
            if existing.contains(&key_string(id)) {
                continue;
            }
            let statement = Statement::prepare()
                .insert(&table, [foreign_pivot_key.as_str(), related_pivot_key.as_str()])
                .assign(&foreign_pivot_key, own_key.clone())
                .assign(&related_pivot_key, id.clone());
            database.connection().execute(&statement)?;
        }
        self.unset_relation(name);
        Ok(())
    }

    /// Remove pivot rows for the given ids.
    pub fn detach(&mut self, name: &str, ids: &[Value]) -> OrmResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let relation = self.pivot_relation(name)?;
        let database = self.require_database()?;
        let table = relation.resolved_pivot_table(self.def);
        let foreign_pivot_key = relation.resolved_pivot_foreign_key(self.def);
        let related_pivot_key = relation.resolved_pivot_related_key();

        let placeholders: Vec<String> = (0..ids.len()).map(|i| format!(":k{i}")).collect();
        let mut statement = Statement::prepare()
            .delete(&table, Default::default())
            .where_expr(&foreign_pivot_key)
            .assign(&foreign_pivot_key, self.require_primary_key()?)
            .where_expr(&format!(
                "{related_pivot_key} IN ({})",
                placeholders.join(", ")
            ));
        for (i, id) in ids.iter().enumerate() {
            statement = statement.assign(&format!("k{i}"), id.clone());
        }
        let affected = database.connection().execute(&statement)?;
        self.unset_relation(name);
        Ok(affected)
    }

    /// Make the pivot rows exactly match the given id set: insert missing,
    /// delete extras.
    pub fn sync(&mut self, name: &str, ids: &[Value]) -> OrmResult<SyncResult> {
        let current = self.attached_ids(name)?;
        let wanted: Vec<String> = ids.iter().map(key_string).collect();
        let existing: Vec<String> = current.iter().map(key_string).collect();

        let to_attach: Vec<Value> = ids
            .iter()
            .filter(|id| !existing.contains(&key_string(id)))
            .cloned()
            .collect();
        let to_detach: Vec<Value> = current
            .iter()
            .filter(|id| !wanted.contains(&key_string(id)))
            .cloned()
            .collect();

        if !to_attach.is_empty() {
            self.attach(name, &to_attach)?;
        }
        if !to_detach.is_empty() {
            self.detach(name, &to_detach)?;
        }
        self.unset_relation(name);
        Ok(SyncResult {
            attached: to_attach,
            detached: to_detach,
        })
    }
}
