//! Producer variants: how the bytes behind one key come into existence.
//!
//! Every key maps to exactly one [`Resource`]. The variant is matched in one
//! place, [`Resource::materialize`], which both the host lookup path and the
//! persistence engine go through.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, OnceLock};

use bytes::Bytes;
use rrp_types::ResourceKey;
use tracing::debug;

use crate::error::{BoxError, StoreError, StoreResult};
use crate::executor::panic_message;
use crate::future::PackFuture;
use crate::immediate::Immediate;
use crate::traits::ResourceStore;

/// Deferred generator for a lazy resource. Receives the owning store and the
/// key being produced.
pub type LazyGenerator =
    Box<dyn FnOnce(&dyn ResourceStore, &ResourceKey) -> Result<Vec<u8>, BoxError> + Send>;

/// Computation submitted to the worker pool for an async resource. Receives
/// the key being produced.
pub type AsyncGenerator = Box<dyn FnOnce(&ResourceKey) -> Result<Vec<u8>, BoxError> + Send>;

/// Discriminant of a [`Resource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Eager,
    Lazy,
    Async,
    Immediate,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Eager => "eager",
            ResourceKind::Lazy => "lazy",
            ResourceKind::Async => "async",
            ResourceKind::Immediate => "immediate",
        };
        f.write_str(name)
    }
}

/// The producer backing one key.
pub enum Resource {
    /// Fixed bytes.
    Eager(Bytes),
    /// Generated on first read, at most once.
    Lazy(LazyResource),
    /// Computed on the worker pool, started at registration.
    Async(PackFuture<Bytes>),
    /// Typed value encoded on demand.
    Immediate(Immediate),
}

impl Resource {
    pub fn lazy(generator: LazyGenerator) -> Self {
        Resource::Lazy(LazyResource::new(generator))
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Eager(_) => ResourceKind::Eager,
            Resource::Lazy(_) => ResourceKind::Lazy,
            Resource::Async(_) => ResourceKind::Async,
            Resource::Immediate(_) => ResourceKind::Immediate,
        }
    }

    /// Produce the bytes for `key`.
    ///
    /// Lazy resources are forced and cached, async resources block until
    /// their computation finishes, immediate values run their codec.
    pub fn materialize(&self, store: &dyn ResourceStore, key: &ResourceKey) -> StoreResult<Bytes> {
        match self {
            Resource::Eager(bytes) => Ok(bytes.clone()),
            Resource::Lazy(lazy) => lazy.force(store, key),
            Resource::Async(future) => future
                .get()
                .map_err(|source| StoreError::AsyncComputation {
                    key: key.clone(),
                    source,
                }),
            Resource::Immediate(value) => value.encode().map(Bytes::from).map_err(|e| {
                StoreError::UnsupportedImmediate {
                    key: key.clone(),
                    type_name: value.type_name(),
                    reason: e.to_string(),
                }
            }),
        }
    }

    pub fn as_immediate(&self) -> Option<&Immediate> {
        match self {
            Resource::Immediate(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Eager(bytes) => f.debug_tuple("Eager").field(&bytes.len()).finish(),
            Resource::Lazy(lazy) => f
                .debug_struct("Lazy")
                .field("forced", &lazy.is_forced())
                .finish(),
            Resource::Async(future) => f.debug_tuple("Async").field(future).finish(),
            Resource::Immediate(value) => f.debug_tuple("Immediate").field(value).finish(),
        }
    }
}

/// A memoizing cell around a [`LazyGenerator`].
///
/// The generator runs at most once, even when several threads force the
/// resource at the same time; the losers block until the winner finishes.
/// A failed or panicking generation is memoized too.
pub struct LazyResource {
    generator: Mutex<Option<LazyGenerator>>,
    value: OnceLock<Result<Bytes, String>>,
}

impl LazyResource {
    pub fn new(generator: LazyGenerator) -> Self {
        Self {
            generator: Mutex::new(Some(generator)),
            value: OnceLock::new(),
        }
    }

    /// Returns `true` once the generator has run.
    pub fn is_forced(&self) -> bool {
        self.value.get().is_some()
    }

    fn force(&self, store: &dyn ResourceStore, key: &ResourceKey) -> StoreResult<Bytes> {
        let outcome = self.value.get_or_init(|| {
            let generator = self
                .generator
                .lock()
                .expect("lazy generator lock poisoned")
                .take();
            match generator {
                Some(generator) => {
                    debug!(%key, "generating lazy resource");
                    match panic::catch_unwind(AssertUnwindSafe(|| generator(store, key))) {
                        Ok(result) => result.map(Bytes::from).map_err(|e| e.to_string()),
                        Err(payload) => Err(format!(
                            "generator panicked: {}",
                            panic_message(payload.as_ref())
                        )),
                    }
                }
                None => Err("generator did not complete".to_string()),
            }
        });
        outcome.clone().map_err(|reason| StoreError::LazyGeneration {
            key: key.clone(),
            reason,
        })
    }
}
