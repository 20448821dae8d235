//! Query Builder DML operations
//!
//! `create` inserts through the full model lifecycle; `bulk_update` and
//! `bulk_delete` write directly through the statement layer, bypassing
//! per-row events, and report affected-row counts.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{ModelError, OrmResult};
use crate::model::Model;
use crate::query::builder::ModelQuery;

impl ModelQuery {
    /// Mass-assign and persist a new model. Lifecycle events fire as for any
    /// other save; when a "before" listener cancels, the returned model is
    /// simply left unsaved (`exists()` is false).
    pub fn create(self, attributes: Value) -> OrmResult<Model> {
        let mut model = Model::new_on(self.def, &self.database);
        model.fill(attributes);
        model.save()?;
        Ok(model)
    }

    /// UPDATE every matching row with the given attribute map. Global scopes
    /// apply; per-row events do not fire. Returns the affected-row count.
    pub fn bulk_update(self, attributes: Value) -> OrmResult<u64> {
        let Value::Object(map) = attributes else {
            return Err(ModelError::Query(
                "bulk_update expects an object of column values".to_string(),
            ));
        };
        let query = self.prepare();
        let mut values: BTreeMap<String, Value> = map.into_iter().collect();
        if query.def.timestamps {
            values.insert("updated_at".to_string(), Model::timestamp_now());
        }
        let statement = query.update_statement(values);
        tracing::debug!(entity = %query.def.name, "executing bulk update");
        query.database.connection().execute(&statement)
    }

    /// Delete every matching row, bypassing per-row events. Soft-delete
    /// entities get the stamped variant instead of row removal. Returns the
    /// affected-row count.
    pub fn bulk_delete(self) -> OrmResult<u64> {
        let query = self.prepare();
        let statement = match query.def.soft_delete.clone() {
            Some(column) => {
                let mut values = BTreeMap::new();
                values.insert(column, Model::timestamp_now());
                if query.def.timestamps {
                    values.insert("updated_at".to_string(), Model::timestamp_now());
                }
                query.update_statement(values)
            }
            None => query.delete_statement(),
        };
        tracing::debug!(entity = %query.def.name, "executing bulk delete");
        query.database.connection().execute(&statement)
    }
}
