use std::any::Any;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use rrp_types::ResourceKey;

use crate::error::StoreResult;
use crate::immediate::Immediate;
use crate::resource::{Resource, ResourceKind};
use crate::traits::ResourceStore;

/// A looked-up resource, not yet materialized.
///
/// Holding a handle keeps the producer alive even if the key is cleared or
/// replaced afterwards.
pub struct ResourceHandle<'a> {
    store: &'a dyn ResourceStore,
    key: ResourceKey,
    resource: Arc<Resource>,
}

impl<'a> ResourceHandle<'a> {
    pub fn new(store: &'a dyn ResourceStore, key: ResourceKey, resource: Arc<Resource>) -> Self {
        Self {
            store,
            key,
            resource,
        }
    }

    /// Look `key` up in `store`.
    pub fn lookup(store: &'a dyn ResourceStore, key: ResourceKey) -> Option<Self> {
        let resource = store.resource(&key)?;
        Some(Self::new(store, key, resource))
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }

    pub fn resource(&self) -> &Arc<Resource> {
        &self.resource
    }

    /// Materialize the bytes. May block on an async resource.
    pub fn bytes(&self) -> StoreResult<Bytes> {
        self.resource.materialize(self.store, &self.key)
    }

    /// Materialize into a readable stream.
    pub fn open(&self) -> StoreResult<Cursor<Bytes>> {
        self.bytes().map(Cursor::new)
    }

    pub fn immediate(&self) -> Option<&Immediate> {
        self.resource.as_immediate()
    }

    /// The typed value of an immediate resource, skipping encoding. `None`
    /// for other kinds or a different type.
    pub fn immediate_value<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.immediate()?.downcast::<T>()
    }
}

impl fmt::Debug for ResourceHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("key", &self.key)
            .field("resource", &self.resource)
            .finish()
    }
}
