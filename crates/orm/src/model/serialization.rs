//! Model Serialization
//!
//! `to_map()` runs every attribute through accessors and casts, then filters
//! through the `visible` allow-list when non-empty, else the `hidden`
//! deny-list. Serialization never mutates, so repeated calls yield identical
//! maps.

use serde_json::{Map, Value};

use crate::error::OrmResult;
use crate::model::instance::Model;

impl Model {
    /// Serialize attributes to a JSON object map.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for name in self.attributes.keys() {
            if self.is_serialized(name) {
                map.insert(name.clone(), self.get(name));
            }
        }
        map
    }

    /// Serialize attributes to a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }

    /// Serialize attributes to a JSON string.
    pub fn to_json(&self) -> OrmResult<String> {
        Ok(serde_json::to_string(&self.to_value())?)
    }

    fn is_serialized(&self, name: &str) -> bool {
        if !self.def.visible.is_empty() {
            return self.def.visible.iter().any(|v| v == name);
        }
        !self.def.hidden.iter().any(|h| h == name)
    }
}
