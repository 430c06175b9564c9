//! Request-scoped context passed through filtering and dispatch.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Context attached to one MCP request.
///
/// Cloning is cheap and every clone shares the same extension map, so a
/// handler can read what the dispatcher attached (error bag, registry
/// handle) through its own clone. Values are stored by type and cloned out
/// on read; store small handles (`Arc`s), not owned payloads.
#[derive(Clone, Default)]
pub struct RequestContext {
    ext: Arc<Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the extension of type `T`.
    pub fn insert<T: Clone + Send + Sync + 'static>(&self, value: T) {
        self.lock().insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Clone out the extension of type `T`, if present.
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.lock()
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
    }

    /// Whether an extension of type `T` is attached.
    pub fn contains<T: Clone + Send + Sync + 'static>(&self) -> bool {
        self.lock().contains_key(&TypeId::of::<T>())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TypeId, Box<dyn Any + Send + Sync>>> {
        self.ext.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("extensions", &self.lock().len())
            .finish()
    }
}
