//! Model Instances
//!
//! A [`Model`] is one row's worth of state: current attributes, the original
//! snapshot as loaded, the persisted flag, the relation cache, and an
//! optional bound database handle. Relation-cache key presence distinguishes
//! "not loaded" from "loaded as empty/null".

use std::collections::BTreeMap;

use serde_json::Value;

use crate::backends::Row;
use crate::database::Database;
use crate::error::{ModelError, OrmResult};
use crate::model::definition::EntityDef;
use crate::relationships::Related;

/// A stateful entity instance.
#[derive(Debug, Clone)]
pub struct Model {
    pub(crate) def: &'static EntityDef,
    pub(crate) database: Option<Database>,
    pub(crate) attributes: BTreeMap<String, Value>,
    pub(crate) original: BTreeMap<String, Value>,
    pub(crate) changes: BTreeMap<String, Value>,
    pub(crate) exists: bool,
    pub(crate) relations: BTreeMap<String, Related>,
}

impl Model {
    /// A fresh, unbound, non-persisted instance.
    pub fn new(def: &'static EntityDef) -> Self {
        Self {
            def,
            database: None,
            attributes: BTreeMap::new(),
            original: BTreeMap::new(),
            changes: BTreeMap::new(),
            exists: false,
            relations: BTreeMap::new(),
        }
    }

    /// A fresh instance bound to a database handle.
    pub fn new_on(def: &'static EntityDef, database: &Database) -> Self {
        let mut model = Self::new(def);
        model.database = Some(database.clone());
        model
    }

    /// Build an instance from a fetched row: `exists` is set and the original
    /// snapshot equals the attributes.
    pub fn hydrate(def: &'static EntityDef, database: &Database, row: Row) -> Self {
        Self {
            def,
            database: Some(database.clone()),
            original: row.clone(),
            attributes: row,
            changes: BTreeMap::new(),
            exists: true,
            relations: BTreeMap::new(),
        }
    }

    pub fn definition(&self) -> &'static EntityDef {
        self.def
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    pub fn set_database(&mut self, database: &Database) {
        self.database = Some(database.clone());
    }

    /// The bound handle, or the fail-fast error every persistence operation
    /// starts with.
    pub(crate) fn require_database(&self) -> OrmResult<Database> {
        self.database
            .clone()
            .ok_or_else(|| ModelError::ConnectionMissing(self.def.name.clone()))
    }

    /// Whether this instance is backed by a database row.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Raw primary-key value; `Null` until the first successful insert.
    pub fn primary_key_value(&self) -> Value {
        self.attributes
            .get(&self.def.primary_key)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub(crate) fn require_primary_key(&self) -> OrmResult<Value> {
        match self.primary_key_value() {
            Value::Null => Err(ModelError::MissingPrimaryKey),
            value => Ok(value),
        }
    }

    // --- relation cache ---------------------------------------------------

    /// Whether a relation has been resolved (possibly to null/empty).
    pub fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// A resolved relation value, if loaded.
    pub fn related(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    /// Store a resolved relation value.
    pub fn set_relation(&mut self, name: &str, value: Related) {
        self.relations.insert(name.to_string(), value);
    }

    /// Drop a cached relation value.
    pub fn unset_relation(&mut self, name: &str) {
        self.relations.remove(name);
    }

    /// Names of the relations currently loaded.
    pub fn loaded_relations(&self) -> Vec<&str> {
        self.relations.keys().map(String::as_str).collect()
    }
}
