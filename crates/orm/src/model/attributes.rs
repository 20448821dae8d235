//! Attribute Access
//!
//! Read resolution order: accessor, then declared cast, then the raw stored
//! value. Write resolution order: mutator, then inverse cast, then store
//! as-is. Mass assignment honors the fillable allow-list first, then the
//! guarded deny-list (`*` blocks everything). Dirty state is the
//! attribute-by-attribute difference between `attributes` and `original`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::casts;
use crate::model::instance::Model;

impl Model {
    /// Read an attribute through accessors and casts. Missing attributes
    /// read as `Null`.
    pub fn get(&self, name: &str) -> Value {
        let raw = self.get_raw(name);
        if let Some(accessor) = self.def.accessors.get(name) {
            return accessor(self, raw);
        }
        if let Some(cast) = self.def.casts.get(name) {
            return cast.apply(raw);
        }
        raw
    }

    /// Read the raw stored value, bypassing accessors and casts.
    pub fn get_raw(&self, name: &str) -> Value {
        self.attributes.get(name).cloned().unwrap_or(Value::Null)
    }

    /// Write an attribute through mutators and casts.
    pub fn set<V: Into<Value>>(&mut self, name: &str, value: V) {
        let incoming = value.into();
        let stored = if let Some(mutator) = self.def.mutators.get(name) {
            mutator(self, incoming)
        } else if let Some(cast) = self.def.casts.get(name) {
            cast.store(incoming)
        } else {
            incoming
        };
        self.attributes.insert(name.to_string(), stored);
    }

    /// Write an attribute bypassing mutators and casts.
    pub fn set_raw<V: Into<Value>>(&mut self, name: &str, value: V) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.keys().map(String::as_str).collect()
    }

    // --- mass assignment --------------------------------------------------

    /// Mass-assign every fillable key of an attribute map. Non-object values
    /// and guarded keys are ignored.
    pub fn fill(&mut self, attributes: Value) -> &mut Self {
        if let Value::Object(map) = attributes {
            for (name, value) in map {
                if self.is_fillable(&name) {
                    self.set(&name, value);
                }
            }
        }
        self
    }

    /// A key is fillable when the allow-list contains it, or — with an empty
    /// allow-list — when the deny-list does not (`*` denies everything).
    pub fn is_fillable(&self, name: &str) -> bool {
        if !self.def.fillable.is_empty() {
            return self.def.fillable.iter().any(|f| f == name);
        }
        !self
            .def
            .guarded
            .iter()
            .any(|g| g == "*" || g == name)
    }

    // --- dirty tracking ---------------------------------------------------

    /// Whether any attribute differs from the original snapshot.
    pub fn is_dirty(&self) -> bool {
        !self.dirty().is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.is_dirty()
    }

    /// Whether one specific attribute differs from its original value.
    pub fn is_dirty_attribute(&self, name: &str) -> bool {
        self.attributes.get(name) != self.original.get(name)
    }

    /// Current values of every attribute that differs from the original
    /// snapshot.
    pub fn dirty(&self) -> BTreeMap<String, Value> {
        self.attributes
            .iter()
            .filter(|(name, value)| self.original.get(*name) != Some(value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// The original (as-loaded) value of an attribute.
    pub fn original_value(&self, name: &str) -> Value {
        self.original.get(name).cloned().unwrap_or(Value::Null)
    }

    /// Attributes written by the most recent successful save.
    pub fn changes(&self) -> &BTreeMap<String, Value> {
        &self.changes
    }

    pub fn was_changed(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Snapshot current attributes as the new original state.
    pub fn sync_original(&mut self) {
        self.original = self.attributes.clone();
    }

    // --- typed conveniences -----------------------------------------------

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).as_i64()
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).as_f64()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).as_bool()
    }

    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name) {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.get(name) {
            Value::String(s) => casts::parse_datetime(&s),
            _ => None,
        }
    }
}
