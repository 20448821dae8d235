//! Lifecycle Registry
//!
//! Per-entity-type tables: booted flag, named global scopes, event listeners,
//! and observers. The registry lives on the [`crate::database::Database`]
//! handle rather than in process-global state, and [`Registry::reset`] clears
//! everything together so a long-lived worker process can be reused across
//! logical requests without leaking state between them.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::events::{self, Listener, ModelEvent, Observer};
use crate::model::{EntityDef, Model};
use crate::query::ModelQuery;

/// Global scope closure: refines every query for the entity type it is
/// registered under, unless excluded by name on a specific query.
pub type GlobalScope = Arc<dyn Fn(ModelQuery) -> ModelQuery + Send + Sync>;

/// Scope name installed by the soft-delete capability at boot time.
pub const SOFT_DELETE_SCOPE: &str = "soft_delete";

#[derive(Default)]
struct TypeRegistry {
    booted: bool,
    global_scopes: Vec<(String, GlobalScope)>,
    listeners: HashMap<ModelEvent, Vec<Listener>>,
    observers: Vec<Arc<dyn Observer>>,
}

/// Registry of per-entity-type lifecycle state.
#[derive(Default)]
pub struct Registry {
    types: DashMap<String, TypeRegistry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one-time setup for an entity type: installs the soft-delete scope
    /// when the definition declares one, then runs the definition's boot hook.
    /// Subsequent calls are no-ops until the registry is reset.
    pub fn boot(&self, def: &'static EntityDef) {
        {
            let mut entry = self.types.entry(def.name.clone()).or_default();
            if entry.booted {
                return;
            }
            entry.booted = true;
            if let Some(column) = def.soft_delete.clone() {
                entry.global_scopes.push((
                    SOFT_DELETE_SCOPE.to_string(),
                    Arc::new(move |query: ModelQuery| query.where_null(&column)),
                ));
            }
        }
        // The hook runs outside the map guard so it can register scopes and
        // listeners for its own type.
        if let Some(boot) = def.boot {
            boot(self);
        }
    }

    pub fn is_booted(&self, def: &EntityDef) -> bool {
        self.types
            .get(&def.name)
            .map(|entry| entry.booted)
            .unwrap_or(false)
    }

    /// Register a named global scope. A scope with the same name is replaced.
    pub fn add_global_scope<F>(&self, def: &EntityDef, name: &str, scope: F)
    where
        F: Fn(ModelQuery) -> ModelQuery + Send + Sync + 'static,
    {
        let mut entry = self.types.entry(def.name.clone()).or_default();
        entry.global_scopes.retain(|(existing, _)| existing != name);
        entry.global_scopes.push((name.to_string(), Arc::new(scope)));
    }

    /// Registered global scopes for a type, in registration order.
    pub fn global_scopes(&self, def: &EntityDef) -> Vec<(String, GlobalScope)> {
        self.types
            .get(&def.name)
            .map(|entry| entry.global_scopes.clone())
            .unwrap_or_default()
    }

    /// Register an event listener closure.
    pub fn listen<F>(&self, def: &EntityDef, event: ModelEvent, listener: F)
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        let mut entry = self.types.entry(def.name.clone()).or_default();
        entry
            .listeners
            .entry(event)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Register an observer covering all twelve events.
    pub fn observe(&self, def: &EntityDef, observer: Arc<dyn Observer>) {
        let mut entry = self.types.entry(def.name.clone()).or_default();
        entry.observers.push(observer);
    }

    /// Fire an event. Returns `false` when a cancelable event was vetoed by a
    /// listener or observer; firing halts at the first veto.
    pub fn fire(&self, def: &EntityDef, event: ModelEvent, model: &mut Model) -> bool {
        let (listeners, observers) = {
            match self.types.get(&def.name) {
                Some(entry) => (
                    entry.listeners.get(&event).cloned().unwrap_or_default(),
                    entry.observers.clone(),
                ),
                None => return true,
            }
        };
        for listener in listeners {
            if !listener(model) && event.is_cancelable() {
                tracing::debug!(entity = %def.name, event = event.name(), "event canceled by listener");
                return false;
            }
        }
        for observer in observers {
            if !events::dispatch(observer.as_ref(), event, model) && event.is_cancelable() {
                tracing::debug!(entity = %def.name, event = event.name(), "event canceled by observer");
                return false;
            }
        }
        true
    }

    /// Clear booted flags, scopes, listeners, and observers for every type.
    pub fn reset(&self) {
        self.types.clear();
    }

    /// Clear the tables of a single entity type.
    pub fn reset_entity(&self, def: &EntityDef) {
        self.types.remove(&def.name);
    }
}
