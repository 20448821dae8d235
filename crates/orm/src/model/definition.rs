//! Entity Definitions
//!
//! Every entity type is described by one [`EntityDef`] built once and held in
//! a `once_cell` static: table metadata, casts, mass-assignment lists,
//! accessor/mutator tables, relationship descriptors, named local scopes, and
//! the boot hook. The definition replaces runtime reflection — whether a name
//! is a relation, an accessor, or a scope is answered by registry lookup.

use std::collections::HashMap;

use serde_json::Value;

use crate::collection::ModelCollection;
use crate::database::Database;
use crate::error::OrmResult;
use crate::model::casts::Cast;
use crate::model::instance::Model;
use crate::query::ModelQuery;
use crate::registry::Registry;
use crate::relationships::{inference, RelationDef};

/// Accessor: computes the exposed value for an attribute from its raw stored
/// value.
pub type Accessor = fn(&Model, Value) -> Value;

/// Mutator: computes the stored value for an attribute from an incoming
/// value; when present it replaces the cast on writes.
pub type Mutator = fn(&Model, Value) -> Value;

/// Named local scope: refines a query when invoked by name.
pub type LocalScope = fn(ModelQuery) -> ModelQuery;

/// One-time setup hook, run when the type is first booted in a registry.
pub type BootHook = fn(&Registry);

/// Static description of an entity type.
#[derive(Debug)]
pub struct EntityDef {
    /// Entity type name, e.g. `Author`. Also the registry key.
    pub name: String,
    pub table: String,
    pub primary_key: String,
    /// Stamp `created_at`/`updated_at` on insert and update.
    pub timestamps: bool,
    /// Soft-delete column, when the capability is enabled.
    pub soft_delete: Option<String>,
    pub casts: HashMap<String, Cast>,
    /// Mass-assignment allow-list; when non-empty it wins over `guarded`.
    pub fillable: Vec<String>,
    /// Mass-assignment deny-list; `*` blocks everything.
    pub guarded: Vec<String>,
    /// Serialization deny-list.
    pub hidden: Vec<String>,
    /// Serialization allow-list; when non-empty it wins over `hidden`.
    pub visible: Vec<String>,
    pub accessors: HashMap<String, Accessor>,
    pub mutators: HashMap<String, Mutator>,
    pub relations: HashMap<String, RelationDef>,
    pub scopes: HashMap<String, LocalScope>,
    pub boot: Option<BootHook>,
}

impl EntityDef {
    /// Start building a definition. The table name defaults to the
    /// snake-cased type name plus `s`; override with [`EntityDefBuilder::table`].
    pub fn builder(name: &str) -> EntityDefBuilder {
        EntityDefBuilder {
            def: EntityDef {
                name: name.to_string(),
                table: inference::table_name(name),
                primary_key: "id".to_string(),
                timestamps: true,
                soft_delete: None,
                casts: HashMap::new(),
                fillable: Vec::new(),
                guarded: Vec::new(),
                hidden: Vec::new(),
                visible: Vec::new(),
                accessors: HashMap::new(),
                mutators: HashMap::new(),
                relations: HashMap::new(),
                scopes: HashMap::new(),
                boot: None,
            },
        }
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }
}

/// Builder for [`EntityDef`].
pub struct EntityDefBuilder {
    def: EntityDef,
}

impl EntityDefBuilder {
    pub fn table(mut self, table: &str) -> Self {
        self.def.table = table.to_string();
        self
    }

    pub fn primary_key(mut self, column: &str) -> Self {
        self.def.primary_key = column.to_string();
        self
    }

    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.def.timestamps = enabled;
        self
    }

    /// Enable soft deletes on the default `deleted_at` column.
    pub fn soft_deletes(self) -> Self {
        self.soft_deletes_column("deleted_at")
    }

    pub fn soft_deletes_column(mut self, column: &str) -> Self {
        self.def.soft_delete = Some(column.to_string());
        self
    }

    pub fn cast(mut self, attribute: &str, cast: Cast) -> Self {
        self.def.casts.insert(attribute.to_string(), cast);
        self
    }

    pub fn fillable<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.fillable = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn guarded<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.guarded = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn hidden<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.hidden = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn visible<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.visible = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn accessor(mut self, attribute: &str, accessor: Accessor) -> Self {
        self.def.accessors.insert(attribute.to_string(), accessor);
        self
    }

    pub fn mutator(mut self, attribute: &str, mutator: Mutator) -> Self {
        self.def.mutators.insert(attribute.to_string(), mutator);
        self
    }

    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.def.relations.insert(relation.name.clone(), relation);
        self
    }

    pub fn scope(mut self, name: &str, scope: LocalScope) -> Self {
        self.def.scopes.insert(name.to_string(), scope);
        self
    }

    pub fn boot(mut self, hook: BootHook) -> Self {
        self.def.boot = Some(hook);
        self
    }

    pub fn build(self) -> EntityDef {
        self.def
    }
}

/// Trait implemented by entity marker types, tying a name to its static
/// definition and providing the usual entry points.
pub trait Entity: 'static {
    fn definition() -> &'static EntityDef;

    /// Start a query for this entity type.
    fn query(database: &Database) -> ModelQuery {
        ModelQuery::new(Self::definition(), database)
    }

    /// A fresh, non-persisted instance bound to the database handle.
    fn build(database: &Database) -> Model {
        Model::new_on(Self::definition(), database)
    }

    /// Mass-assign and persist a new instance.
    fn create(database: &Database, attributes: Value) -> OrmResult<Model> {
        Self::query(database).create(attributes)
    }

    fn find(database: &Database, id: impl Into<Value>) -> OrmResult<Option<Model>> {
        Self::query(database).find(id)
    }

    fn find_or_fail(database: &Database, id: impl Into<Value>) -> OrmResult<Model> {
        Self::query(database).find_or_fail(id)
    }

    fn all(database: &Database) -> OrmResult<ModelCollection> {
        Self::query(database).get()
    }
}
