//! CRUD Operations
//!
//! Persistence for model instances: `save()` branches to insert or update,
//! fires the lifecycle event flows, stamps timestamps, and reads back
//! generated keys; `delete()` removes by primary key (soft-delete entities
//! reroute, see `soft_deletes`); `refresh()` re-selects the row.
//!
//! Event cancellation surfaces as `Ok(false)`, never as an error — callers
//! check the return value.

use chrono::Utc;
use serde_json::Value;

use crate::backends::Statement;
use crate::database::Database;
use crate::error::{ModelError, OrmResult};
use crate::events::ModelEvent;
use crate::model::instance::Model;

impl Model {
    /// Fire one lifecycle event through the bound registry. Unbound models
    /// have no listeners, so firing trivially succeeds.
    pub(crate) fn fire(&mut self, event: ModelEvent) -> bool {
        let Some(database) = self.database.clone() else {
            return true;
        };
        database.registry().fire(self.def, event, self)
    }

    pub(crate) fn timestamp_now() -> Value {
        Value::String(Utc::now().to_rfc3339())
    }

    /// Persist the instance: insert when it does not exist yet, otherwise
    /// update the dirty attributes. Returns `Ok(false)` when a "before"
    /// listener canceled the operation, or when an update found nothing
    /// dirty.
    pub fn save(&mut self) -> OrmResult<bool> {
        let database = self.require_database()?;
        database.registry().boot(self.def);
        if !self.fire(ModelEvent::Saving) {
            return Ok(false);
        }
        if self.exists {
            self.perform_update(&database)
        } else {
            self.perform_insert(&database)
        }
    }

    fn perform_insert(&mut self, database: &Database) -> OrmResult<bool> {
        if !self.fire(ModelEvent::Creating) {
            return Ok(false);
        }

        if self.def.timestamps {
            let now = Self::timestamp_now();
            self.attributes
                .entry("created_at".to_string())
                .or_insert_with(|| now.clone());
            self.attributes.insert("updated_at".to_string(), now);
        }

        let columns: Vec<String> = self.attributes.keys().cloned().collect();
        let statement = Statement::prepare()
            .insert(&self.def.table, columns)
            .assign_map(self.attributes.clone());
        database.connection().execute(&statement)?;

        if self.primary_key_value().is_null() {
            let id = database.connection().last_insert_id()?;
            self.attributes.insert(self.def.primary_key.clone(), id);
        }

        self.exists = true;
        self.changes = self.attributes.clone();
        self.sync_original();
        self.fire(ModelEvent::Created);
        self.fire(ModelEvent::Saved);
        Ok(true)
    }

    fn perform_update(&mut self, database: &Database) -> OrmResult<bool> {
        if self.dirty().is_empty() {
            // Nothing to write. `saving` already fired; `updating`/`updated`/
            // `saved` do not.
            return Ok(false);
        }
        if !self.fire(ModelEvent::Updating) {
            return Ok(false);
        }

        if self.def.timestamps {
            self.attributes
                .insert("updated_at".to_string(), Self::timestamp_now());
        }

        let dirty = self.dirty();
        let primary_key = self.require_primary_key()?;
        let columns: Vec<String> = dirty.keys().cloned().collect();
        let statement = Statement::prepare()
            .update(&self.def.table, columns)
            .assign_map(dirty.clone())
            .where_expr(&format!("{} = :_pk", self.def.primary_key))
            .assign("_pk", primary_key);
        database.connection().execute(&statement)?;

        self.changes = dirty;
        self.sync_original();
        self.fire(ModelEvent::Updated);
        self.fire(ModelEvent::Saved);
        Ok(true)
    }

    /// Delete the row this instance represents. Soft-delete entities stamp
    /// the delete column instead of removing the row.
    pub fn delete(&mut self) -> OrmResult<bool> {
        let database = self.require_database()?;
        database.registry().boot(self.def);
        if self.def.soft_delete.is_some() {
            return self.perform_soft_delete(&database);
        }
        if !self.exists {
            return Ok(false);
        }
        if !self.fire(ModelEvent::Deleting) {
            return Ok(false);
        }

        let primary_key = self.require_primary_key()?;
        let statement = Statement::prepare().delete(
            &self.def.table,
            [(self.def.primary_key.clone(), primary_key)].into(),
        );
        database.connection().execute(&statement)?;

        self.exists = false;
        self.fire(ModelEvent::Deleted);
        Ok(true)
    }

    /// Re-select the row by primary key, replacing attributes and the
    /// original snapshot and clearing the relation cache. Bypasses global
    /// scopes so soft-deleted instances can still be refreshed.
    pub fn refresh(&mut self) -> OrmResult<()> {
        let database = self.require_database()?;
        let primary_key = self.require_primary_key()?;
        let statement = Statement::prepare()
            .from(&self.def.table)
            .where_expr(&self.def.primary_key)
            .assign(&self.def.primary_key, primary_key)
            .limit(1);
        let mut rows = database.connection().query(&statement)?;
        let row = rows
            .pop()
            .ok_or_else(|| ModelError::NotFound(self.def.table.clone()))?;

        self.attributes = row;
        self.sync_original();
        self.changes.clear();
        self.exists = true;
        self.relations.clear();
        Ok(())
    }
}
