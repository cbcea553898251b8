//! Binary input sources and the resolver that finds them.
//!
//! How levels are read from hardware is the host's business. The crate
//! only needs a current level and edge notifications, plus a way to turn
//! a configured port id into a live source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

/// Callback receiving each new raw level.
pub type RawListener = Box<dyn Fn(bool) + Send + Sync>;

/// Handle returned by [`BinaryInput::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A live binary signal.
pub trait BinaryInput: Send + Sync {
    /// Port id this input was resolved from.
    fn id(&self) -> &str;

    /// Current raw level.
    fn value(&self) -> bool;

    /// Register for raw level changes, delivered in the order they occur.
    fn subscribe(&self, listener: RawListener) -> ListenerId;

    /// Stop delivering to `id`. Unknown ids are ignored.
    fn unsubscribe(&self, id: ListenerId);
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("input port '{port_id}' not found")]
    NotFound { port_id: String },
}

/// Turns a configured port id into a live input.
pub trait InputResolver: Send + Sync {
    fn resolve(&self, port_id: &str) -> Result<Arc<dyn BinaryInput>, ResolutionError>;
}

struct Listeners {
    level: bool,
    next_id: u64,
    subscribed: Vec<(ListenerId, RawListener)>,
}

/// Settable in-process input.
///
/// Only level changes are delivered; setting the current level again is
/// silent. Listeners run while the input is locked so edges reach them in
/// order, which means a listener must not call back into the input.
pub struct MemoryInput {
    id: String,
    inner: Mutex<Listeners>,
}

impl MemoryInput {
    pub fn new(id: impl Into<String>, level: bool) -> Self {
        Self {
            id: id.into(),
            inner: Mutex::new(Listeners {
                level,
                next_id: 0,
                subscribed: Vec::new(),
            }),
        }
    }

    /// Drive the raw level.
    pub fn set(&self, level: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.level == level {
            return;
        }
        inner.level = level;
        debug!(port = %self.id, level, listeners = inner.subscribed.len(), "Raw level changed");
        for (_, listener) in &inner.subscribed {
            listener(level);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribed
            .len()
    }
}

impl BinaryInput for MemoryInput {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .level
    }

    fn subscribe(&self, listener: RawListener) -> ListenerId {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        let id = ListenerId(inner.next_id);
        inner.subscribed.push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribed
            .retain(|(existing, _)| *existing != id);
    }
}

/// In-process [`InputResolver`] keyed by port id.
#[derive(Default)]
pub struct PortRegistry {
    ports: RwLock<HashMap<String, Arc<dyn BinaryInput>>>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `input` resolvable under its own id, replacing any previous
    /// input with that id.
    pub fn register(&self, input: Arc<dyn BinaryInput>) {
        self.ports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(input.id().to_string(), input);
    }

    pub fn remove(&self, port_id: &str) -> Option<Arc<dyn BinaryInput>> {
        self.ports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(port_id)
    }
}

impl InputResolver for PortRegistry {
    fn resolve(&self, port_id: &str) -> Result<Arc<dyn BinaryInput>, ResolutionError> {
        self.ports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(port_id)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound {
                port_id: port_id.to_string(),
            })
    }
}
