//! Eager Loader
//!
//! Batch-resolves requested relations for an already-fetched root set. Each
//! relation name costs exactly one additional query (two for many-to-many:
//! pivot hop plus related table), independent of the number of roots. Every
//! root ends up with its relation-cache key present — roots without matches
//! receive none/empty rather than being left unloaded.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::collection::key_string;
use crate::collection::ModelCollection;
use crate::database::Database;
use crate::error::OrmResult;
use crate::model::{EntityDef, Model};
use crate::query::ModelQuery;
use crate::relationships::pivot::pivot_rows;
use crate::relationships::{Related, RelationDef, RelationKind};

/// Attach the named relations onto every model in the slice. Names that do
/// not correspond to a declared relation are skipped.
pub fn load_related(
    database: &Database,
    def: &'static EntityDef,
    models: &mut [Model],
    names: &[String],
) -> OrmResult<()> {
    if models.is_empty() {
        return Ok(());
    }
    for name in names {
        match def.relation(name) {
            Some(relation) => load_one(database, def, models, relation)?,
            None => {
                // Lenient by design; the debug line keeps typos discoverable.
                tracing::debug!(entity = %def.name, relation = %name, "skipping unknown eager relation");
            }
        }
    }
    Ok(())
}

fn load_one(
    database: &Database,
    def: &'static EntityDef,
    models: &mut [Model],
    relation: &RelationDef,
) -> OrmResult<()> {
    match relation.kind {
        RelationKind::HasOne | RelationKind::HasMany => load_has(database, def, models, relation),
        RelationKind::BelongsTo => load_belongs_to(database, def, models, relation),
        RelationKind::BelongsToMany => load_belongs_to_many(database, def, models, relation),
    }
}

/// Distinct non-null values, keyed by their canonical string form.
fn distinct_values<'a, I>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for value in values {
        if value.is_null() {
            continue;
        }
        if seen.insert(key_string(value)) {
            out.push(value.clone());
        }
    }
    out
}

fn load_has(
    database: &Database,
    def: &'static EntityDef,
    models: &mut [Model],
    relation: &RelationDef,
) -> OrmResult<()> {
    let owner_key = relation.resolved_owner_key(def);
    let foreign_key = relation.resolved_foreign_key(def);
    let related_def = relation.related();

    let keys = distinct_values(models.iter().map(|m| &m.attributes).filter_map(|a| a.get(&owner_key)));
    let mut groups: HashMap<String, Vec<Model>> = HashMap::new();
    if !keys.is_empty() {
        let related = ModelQuery::new(related_def, database)
            .where_in(&foreign_key, keys)
            .get()?;
        tracing::debug!(entity = %def.name, relation = %relation.name, matched = related.len(), "eager loaded");
        for model in related {
            groups
                .entry(key_string(&model.get_raw(&foreign_key)))
                .or_default()
                .push(model);
        }
    }

    for root in models.iter_mut() {
        let key = key_string(&root.get_raw(&owner_key));
        let group = groups.get(&key);
        let value = match relation.kind {
            RelationKind::HasOne => Related::One(
                group
                    .and_then(|models| models.first())
                    .cloned()
                    .map(Box::new),
            ),
            _ => Related::Many(ModelCollection::from_vec(
                group.cloned().unwrap_or_default(),
            )),
        };
        root.set_relation(&relation.name, value);
    }
    Ok(())
}

fn load_belongs_to(
    database: &Database,
    def: &'static EntityDef,
    models: &mut [Model],
    relation: &RelationDef,
) -> OrmResult<()> {
    let foreign_key = relation.resolved_foreign_key(def);
    let owner_key = relation.resolved_owner_key(def);
    let related_def = relation.related();

    let keys = distinct_values(
        models
            .iter()
            .map(|m| &m.attributes)
            .filter_map(|a| a.get(&foreign_key)),
    );
    let mut owners: HashMap<String, Model> = HashMap::new();
    if !keys.is_empty() {
        let related = ModelQuery::new(related_def, database)
            .where_in(&owner_key, keys)
            .get()?;
        tracing::debug!(entity = %def.name, relation = %relation.name, matched = related.len(), "eager loaded");
        for model in related {
            owners.insert(key_string(&model.get_raw(&owner_key)), model);
        }
    }

    for root in models.iter_mut() {
        let key = root.get_raw(&foreign_key);
        let owner = if key.is_null() {
            None
        } else {
            owners.get(&key_string(&key)).cloned().map(Box::new)
        };
        root.set_relation(&relation.name, Related::One(owner));
    }
    Ok(())
}

fn load_belongs_to_many(
    database: &Database,
    def: &'static EntityDef,
    models: &mut [Model],
    relation: &RelationDef,
) -> OrmResult<()> {
    let table = relation.resolved_pivot_table(def);
    let foreign_pivot_key = relation.resolved_pivot_foreign_key(def);
    let related_pivot_key = relation.resolved_pivot_related_key();
    let related_def = relation.related();

    let keys = distinct_values(
        models
            .iter()
            .map(|m| &m.attributes)
            .filter_map(|a| a.get(&def.primary_key)),
    );

    // One query against the pivot, one against the related table.
    let mut pairs: Vec<(String, Value)> = Vec::new();
    if !keys.is_empty() {
        for row in pivot_rows(database, &table, &foreign_pivot_key, &keys)? {
            let owner = row.get(&foreign_pivot_key).cloned().unwrap_or(Value::Null);
            let related = row.get(&related_pivot_key).cloned().unwrap_or(Value::Null);
            if !owner.is_null() && !related.is_null() {
                pairs.push((key_string(&owner), related));
            }
        }
    }

    let related_ids = distinct_values(pairs.iter().map(|(_, id)| id));
    let mut by_id: HashMap<String, Model> = HashMap::new();
    if !related_ids.is_empty() {
        let related = ModelQuery::new(related_def, database)
            .where_in(&related_def.primary_key, related_ids)
            .get()?;
        tracing::debug!(entity = %def.name, relation = %relation.name, matched = related.len(), "eager loaded");
        for model in related {
            by_id.insert(key_string(&model.get_raw(&related_def.primary_key)), model);
        }
    }

    let mut groups: HashMap<String, Vec<Model>> = HashMap::new();
    for (owner, related_id) in &pairs {
        if let Some(model) = by_id.get(&key_string(related_id)) {
            groups.entry(owner.clone()).or_default().push(model.clone());
        }
    }

    for root in models.iter_mut() {
        let key = key_string(&root.get_raw(&def.primary_key));
        let group = groups.get(&key).cloned().unwrap_or_default();
        root.set_relation(&relation.name, Related::Many(ModelCollection::from_vec(group)));
    }
    Ok(())
}
