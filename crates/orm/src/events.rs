//! Lifecycle Events
//!
//! Entities fire lifecycle events around persistence operations. "Before"
//! events (`Creating`, `Updating`, `Saving`, `Deleting`, `Restoring`,
//! `ForceDeleting`) may cancel the operation by returning `false` from any
//! listener; the enclosing operation then reports `Ok(false)` to its caller.
//! "After" events are purely observational.

use std::sync::Arc;

use crate::model::Model;

/// The twelve lifecycle events an entity can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelEvent {
    Creating,
    Created,
    Updating,
    Updated,
    Saving,
    Saved,
    Deleting,
    Deleted,
    Restoring,
    Restored,
    ForceDeleting,
    ForceDeleted,
}

impl ModelEvent {
    /// "Before" events can cancel the surrounding operation.
    pub fn is_cancelable(self) -> bool {
        matches!(
            self,
            ModelEvent::Creating
                | ModelEvent::Updating
                | ModelEvent::Saving
                | ModelEvent::Deleting
                | ModelEvent::Restoring
                | ModelEvent::ForceDeleting
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelEvent::Creating => "creating",
            ModelEvent::Created => "created",
            ModelEvent::Updating => "updating",
            ModelEvent::Updated => "updated",
            ModelEvent::Saving => "saving",
            ModelEvent::Saved => "saved",
            ModelEvent::Deleting => "deleting",
            ModelEvent::Deleted => "deleted",
            ModelEvent::Restoring => "restoring",
            ModelEvent::Restored => "restored",
            ModelEvent::ForceDeleting => "force_deleting",
            ModelEvent::ForceDeleted => "force_deleted",
        }
    }
}

/// Event listener closure. For "before" events the return value decides
/// whether the operation proceeds; for "after" events it is ignored.
pub type Listener = Arc<dyn Fn(&mut Model) -> bool + Send + Sync>;

/// Observer with a hook per lifecycle event. Register one with
/// [`crate::registry::Registry::observe`] to listen to every event of an
/// entity type without wiring individual closures.
pub trait Observer: Send + Sync {
    fn creating(&self, _model: &mut Model) -> bool {
        true
    }
    fn created(&self, _model: &Model) {}
    fn updating(&self, _model: &mut Model) -> bool {
        true
    }
    fn updated(&self, _model: &Model) {}
    fn saving(&self, _model: &mut Model) -> bool {
        true
    }
    fn saved(&self, _model: &Model) {}
    fn deleting(&self, _model: &mut Model) -> bool {
        true
    }
    fn deleted(&self, _model: &Model) {}
    fn restoring(&self, _model: &mut Model) -> bool {
        true
    }
    fn restored(&self, _model: &Model) {}
    fn force_deleting(&self, _model: &mut Model) -> bool {
        true
    }
    fn force_deleted(&self, _model: &Model) {}
}

/// Route one event through an observer's matching hook.
pub(crate) fn dispatch(observer: &dyn Observer, event: ModelEvent, model: &mut Model) -> bool {
    match event {
        ModelEvent::Creating => observer.creating(model),
        ModelEvent::Created => {
            observer.created(model);
            true
        }
        ModelEvent::Updating => observer.updating(model),
        ModelEvent::Updated => {
            observer.updated(model);
            true
        }
        ModelEvent::Saving => observer.saving(model),
        ModelEvent::Saved => {
            observer.saved(model);
            true
        }
        ModelEvent::Deleting => observer.deleting(model),
        ModelEvent::Deleted => {
            observer.deleted(model);
            true
        }
        ModelEvent::Restoring => observer.restoring(model),
        ModelEvent::Restored => {
            observer.restored(model);
            true
        }
        ModelEvent::ForceDeleting => observer.force_deleting(model),
        ModelEvent::ForceDeleted => {
            observer.force_deleted(model);
            true
        }
    }
}
