//! Soft Deletes
//!
//! Entities that declare a soft-delete column never lose rows on `delete()`:
//! the column is stamped instead, and the global scope installed at boot
//! hides stamped rows from every query. `force_delete()` performs the real
//! removal, `restore()` clears the stamp.

use serde_json::Value;

use crate::backends::Statement;
use crate::database::Database;
use crate::error::{ModelError, OrmResult};
use crate::events::ModelEvent;
use crate::model::instance::Model;

impl Model {
    fn soft_delete_column(&self) -> OrmResult<String> {
        self.def.soft_delete.clone().ok_or_else(|| {
            ModelError::Configuration(format!(
                "entity '{}' does not use soft deletes",
                self.def.name
            ))
        })
    }

    /// Whether this instance carries a soft-delete stamp.
    pub fn trashed(&self) -> bool {
        match &self.def.soft_delete {
            Some(column) => !self.get_raw(column).is_null(),
            None => false,
        }
    }

    pub(crate) fn perform_soft_delete(&mut self, database: &Database) -> OrmResult<bool> {
        if !self.exists {
            return Ok(false);
        }
        if !self.fire(ModelEvent::Deleting) {
            return Ok(false);
        }

        let column = self.soft_delete_column()?;
        self.attributes.insert(column.clone(), Self::timestamp_now());
        if self.def.timestamps {
            self.attributes
                .insert("updated_at".to_string(), Self::timestamp_now());
        }
        self.write_stamp_columns(database)?;

        self.sync_original();
        self.fire(ModelEvent::Deleted);
        Ok(true)
    }

    /// Hard-delete the row regardless of the soft-delete capability.
    pub fn force_delete(&mut self) -> OrmResult<bool> {
        let database = self.require_database()?;
        database.registry().boot(self.def);
        if !self.exists {
            return Ok(false);
        }
        if !self.fire(ModelEvent::ForceDeleting) {
            return Ok(false);
        }

        let primary_key = self.require_primary_key()?;
        let statement = Statement::prepare().delete(
            &self.def.table,
            [(self.def.primary_key.clone(), primary_key)].into(),
        );
        database.connection().execute(&statement)?;

        self.exists = false;
        self.fire(ModelEvent::ForceDeleted);
        Ok(true)
    }

    /// Clear the soft-delete stamp.
    pub fn restore(&mut self) -> OrmResult<bool> {
        let database = self.require_database()?;
        database.registry().boot(self.def);
        let column = self.soft_delete_column()?;
        if !self.exists {
            return Ok(false);
        }
        if !self.fire(ModelEvent::Restoring) {
            return Ok(false);
        }

        self.attributes.insert(column, Value::Null);
        if self.def.timestamps {
            self.attributes
                .insert("updated_at".to_string(), Self::timestamp_now());
        }
        self.write_stamp_columns(&database)?;

        self.sync_original();
        self.fire(ModelEvent::Restored);
        Ok(true)
    }

    /// UPDATE the soft-delete stamp (and `updated_at`) by primary key.
    fn write_stamp_columns(&mut self, database: &Database) -> OrmResult<()> {
        let column = self.soft_delete_column()?;
        let mut columns = vec![column.clone()];
        if self.def.timestamps {
            columns.push("updated_at".to_string());
        }
        let mut statement = Statement::prepare()
            .update(&self.def.table, columns.clone())
            .where_expr(&format!("{} = :_pk", self.def.primary_key))
            .assign("_pk", self.require_primary_key()?);
        for name in columns {
            let value = self.get_raw(&name);
            statement = statement.assign(&name, value);
        }
        database.connection().execute(&statement)?;
        Ok(())
    }
}
