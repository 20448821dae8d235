//! Model Collections
//!
//! An ordered, 0-indexed sequence of models of one entity type, in query
//! order, without deduplication. Transformation methods return a new
//! collection; aggregate helpers take an attribute name, with closure
//! variants where extraction logic is needed.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Index;

use serde_json::Value;

use crate::model::Model;

#[derive(Debug, Clone, Default)]
pub struct ModelCollection {
    items: Vec<Model>,
}

impl ModelCollection {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_vec(items: Vec<Model>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Model> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&Model> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Model> {
        self.items.last()
    }

    pub fn push(&mut self, model: Model) {
        self.items.push(model);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Model> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Model> {
        self.items.iter_mut()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Model] {
        &mut self.items
    }

    pub fn into_vec(self) -> Vec<Model> {
        self.items
    }

    // --- transformations (return a new collection) ------------------------

    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Model) -> bool,
    {
        Self::from_vec(self.items.iter().filter(|m| predicate(m)).cloned().collect())
    }

    pub fn map<T, F>(&self, f: F) -> Vec<T>
    where
        F: FnMut(&Model) -> T,
    {
        self.items.iter().map(f).collect()
    }

    pub fn flat_map<T, I, F>(&self, f: F) -> Vec<T>
    where
        F: FnMut(&Model) -> I,
        I: IntoIterator<Item = T>,
    {
        self.items.iter().flat_map(f).collect()
    }

    /// Sort ascending by an attribute's value.
    pub fn sort_by_attribute(&self, attribute: &str) -> Self {
        let mut items = self.items.clone();
        items.sort_by(|a, b| compare_values(&a.get(attribute), &b.get(attribute)));
        Self::from_vec(items)
    }

    pub fn sort_by<F>(&self, mut comparator: F) -> Self
    where
        F: FnMut(&Model, &Model) -> Ordering,
    {
        let mut items = self.items.clone();
        items.sort_by(|a, b| comparator(a, b));
        Self::from_vec(items)
    }

    /// Keep the first occurrence of each distinct attribute value.
    pub fn unique(&self, attribute: &str) -> Self {
        let mut seen = BTreeSet::new();
        let mut items = Vec::new();
        for model in &self.items {
            if seen.insert(key_string(&model.get(attribute))) {
                items.push(model.clone());
            }
        }
        Self::from_vec(items)
    }

    pub fn reverse(&self) -> Self {
        let mut items = self.items.clone();
        items.reverse();
        Self::from_vec(items)
    }

    pub fn take(&self, count: usize) -> Self {
        Self::from_vec(self.items.iter().take(count).cloned().collect())
    }

    /// Split into consecutive chunks of at most `size` models.
    pub fn chunk(&self, size: usize) -> Vec<Self> {
        if size == 0 {
            return Vec::new();
        }
        self.items
            .chunks(size)
            .map(|chunk| Self::from_vec(chunk.to_vec()))
            .collect()
    }

    // --- traversal --------------------------------------------------------

    pub fn each<F>(&self, f: F)
    where
        F: FnMut(&Model),
    {
        self.items.iter().for_each(f);
    }

    // --- aggregates -------------------------------------------------------

    /// Attribute values in collection order.
    pub fn pluck(&self, attribute: &str) -> Vec<Value> {
        self.items.iter().map(|m| m.get(attribute)).collect()
    }

    pub fn sum(&self, attribute: &str) -> f64 {
        self.items
            .iter()
            .filter_map(|m| m.get(attribute).as_f64())
            .sum()
    }

    pub fn avg(&self, attribute: &str) -> Option<f64> {
        let values: Vec<f64> = self
            .items
            .iter()
            .filter_map(|m| m.get(attribute).as_f64())
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    pub fn min(&self, attribute: &str) -> Option<Value> {
        self.items
            .iter()
            .map(|m| m.get(attribute))
            .filter(|v| !v.is_null())
            .min_by(|a, b| compare_values(a, b))
    }

    pub fn max(&self, attribute: &str) -> Option<Value> {
        self.items
            .iter()
            .map(|m| m.get(attribute))
            .filter(|v| !v.is_null())
            .max_by(|a, b| compare_values(a, b))
    }

    /// Group models by an attribute's value, keyed by its string form.
    pub fn group_by(&self, attribute: &str) -> BTreeMap<String, Self> {
        let mut groups: BTreeMap<String, Self> = BTreeMap::new();
        for model in &self.items {
            groups
                .entry(key_string(&model.get(attribute)))
                .or_default()
                .push(model.clone());
        }
        groups
    }

    /// Key models by an attribute's value; later models win on collisions.
    pub fn key_by(&self, attribute: &str) -> BTreeMap<String, Model> {
        self.items
            .iter()
            .map(|m| (key_string(&m.get(attribute)), m.clone()))
            .collect()
    }

    /// First model whose attribute equals the given value.
    pub fn first_where<V: Into<Value>>(&self, attribute: &str, value: V) -> Option<&Model> {
        let value = value.into();
        self.items.iter().find(|m| m.get(attribute) == value)
    }

    pub fn contains<V: Into<Value>>(&self, attribute: &str, value: V) -> bool {
        self.first_where(attribute, value).is_some()
    }

    /// Serialize every model in order.
    pub fn to_value(&self) -> Value {
        Value::Array(self.items.iter().map(Model::to_value).collect())
    }
}

/// Stable string form of a value for grouping and keying.
pub(crate) fn key_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

impl Index<usize> for ModelCollection {
    type Output = Model;

    fn index(&self, index: usize) -> &Model {
        &self.items[index]
    }
}

impl IntoIterator for ModelCollection {
    type Item = Model;
    type IntoIter = std::vec::IntoIter<Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ModelCollection {
    type Item = &'a Model;
    type IntoIter = std::slice::Iter<'a, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Model> for ModelCollection {
    fn from_iter<I: IntoIterator<Item = Model>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl Extend<Model> for ModelCollection {
    fn extend<I: IntoIterator<Item = Model>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use serde_json::json;

    use crate::model::EntityDef;

    static ITEM_DEF: Lazy<EntityDef> =
        Lazy::new(|| EntityDef::builder("Item").timestamps(false).build());

    fn item(id: i64, name: &str, price: f64) -> Model {
        let mut model = Model::new(&ITEM_DEF);
        model.set("id", id);
        model.set("name", name);
        model.set("price", price);
        model
    }

    fn items() -> ModelCollection {
        ModelCollection::from_vec(vec![
            item(1, "apple", 1.5),
            item(2, "banana", 0.5),
            item(3, "apple", 2.0),
        ])
    }

    #[test]
    fn transformations_return_new_collections() {
        let collection = items();
        let apples = collection.filter(|m| m.get("name") == json!("apple"));
        assert_eq!(apples.len(), 2);
        // The source is untouched.
        assert_eq!(collection.len(), 3);

        let sorted = collection.sort_by_attribute("price");
        assert_eq!(sorted[0].get("name"), json!("banana"));

        let unique = collection.unique("name");
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].get("id"), json!(1));
    }

    #[test]
    fn aggregates_over_attribute_values() {
        let collection = items();
        assert_eq!(collection.pluck("id"), vec![json!(1), json!(2), json!(3)]);
        assert_eq!(collection.sum("price"), 4.0);
        assert_eq!(collection.avg("price"), Some(4.0 / 3.0));
        assert_eq!(collection.min("price"), Some(json!(0.5)));
        assert_eq!(collection.max("price"), Some(json!(2.0)));
    }

    #[test]
    fn grouping_and_keying() {
        let collection = items();
        let groups = collection.group_by("name");
        assert_eq!(groups["apple"].len(), 2);
        assert_eq!(groups["banana"].len(), 1);

        let by_id = collection.key_by("id");
        assert_eq!(by_id["2"].get("name"), json!("banana"));
    }

    #[test]
    fn lookup_helpers() {
        let collection = items();
        let found = collection.first_where("name", "banana").unwrap();
        assert_eq!(found.get("id"), json!(2));
        assert!(collection.contains("name", "apple"));
        assert!(!collection.contains("name", "cherry"));
    }

    #[test]
    fn chunking_preserves_order() {
        let chunks = items().chunk(2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 2);
        assert_eq!(chunks[1].len(), 1);
        assert_eq!(chunks[1][0].get("id"), json!(3));
    }
}
