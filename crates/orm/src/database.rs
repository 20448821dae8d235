//! Database Handle
//!
//! Bundles the statement-layer [`Connection`] with the lifecycle
//! [`Registry`]. The handle is passed explicitly into every entity and query
//! operation; the ORM keeps no implicit global connection state.

use std::fmt;
use std::sync::Arc;

use crate::backends::Connection;
use crate::registry::Registry;

/// Shared handle to one logical unit of work's connection plus the lifecycle
/// registry. Cloning is cheap; clones refer to the same connection and
/// registry.
#[derive(Clone)]
pub struct Database {
    connection: Arc<dyn Connection>,
    registry: Arc<Registry>,
}

impl Database {
    /// Create a handle with a fresh registry.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            registry: Arc::new(Registry::new()),
        }
    }

    /// Create a handle sharing an existing registry, for callers that manage
    /// registry lifetime separately from connections.
    pub fn with_registry(connection: Arc<dyn Connection>, registry: Arc<Registry>) -> Self {
        Self {
            connection,
            registry,
        }
    }

    pub fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        self.registry.as_ref()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}
