use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use rrp_types::{Bucket, ResourceKey, Side};
use tracing::debug;

use crate::error::StoreResult;
use crate::executor::{self, Executor};
use crate::future::PackFuture;
use crate::guard::DuplicatePolicy;
use crate::handle::ResourceHandle;
use crate::immediate::Immediate;
use crate::resource::{AsyncGenerator, LazyGenerator, Resource};
use crate::traits::ResourceStore;

type BucketMap = BTreeMap<ResourceKey, Arc<Resource>>;

/// In-memory, `BTreeMap`-based resource store.
///
/// Each bucket sits behind its own `RwLock`, so client, server, and root
/// traffic never contend. Producers are held in `Arc`s and cloned out of the
/// map before materialization; no lock is held while a generator runs, so
/// generators may read other keys of the same store.
pub struct InMemoryResourceStore {
    label: String,
    client: RwLock<BucketMap>,
    server: RwLock<BucketMap>,
    root: RwLock<BucketMap>,
    permissive: AtomicBool,
    executor: Arc<dyn Executor>,
}

impl InMemoryResourceStore {
    /// Create an empty store with the strict duplicate policy.
    ///
    /// `label` names the owning pack in duplicate errors.
    pub fn new(label: impl Into<String>, executor: Arc<dyn Executor>) -> Self {
        Self {
            label: label.into(),
            client: RwLock::new(BTreeMap::new()),
            server: RwLock::new(BTreeMap::new()),
            root: RwLock::new(BTreeMap::new()),
            permissive: AtomicBool::new(false),
            executor,
        }
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        *self.permissive.get_mut() = policy == DuplicatePolicy::Permissive;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        if self.permissive.load(Ordering::Acquire) {
            DuplicatePolicy::Permissive
        } else {
            DuplicatePolicy::Strict
        }
    }

    pub fn set_duplicate_policy(&self, policy: DuplicatePolicy) {
        self.permissive
            .store(policy == DuplicatePolicy::Permissive, Ordering::Release);
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// Look up `key` and wrap it in a handle bound to this store.
    pub fn get(&self, key: &ResourceKey) -> Option<ResourceHandle<'_>> {
        let resource = self.resource(key)?;
        Some(ResourceHandle::new(self, key.clone(), resource))
    }

    /// Total number of resources across all buckets.
    pub fn len(&self) -> usize {
        Bucket::ALL
            .iter()
            .map(|b| self.bucket(*b).read().expect("bucket lock poisoned").len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket(&self, bucket: Bucket) -> &RwLock<BucketMap> {
        match bucket {
            Bucket::Client => &self.client,
            Bucket::Server => &self.server,
            Bucket::Root => &self.root,
        }
    }

    fn insert(&self, key: ResourceKey, resource: Resource) -> StoreResult<()> {
        let mut map = self
            .bucket(key.bucket())
            .write()
            .expect("bucket lock poisoned");
        self.duplicate_policy()
            .admit(&key, map.contains_key(&key), &self.label)?;
        debug!(%key, kind = %resource.kind(), "resource added");
        map.insert(key, Arc::new(resource));
        Ok(())
    }
}

impl ResourceStore for InMemoryResourceStore {
    fn add_eager(&self, key: ResourceKey, data: Bytes) -> StoreResult<Bytes> {
        self.insert(key, Resource::Eager(data.clone()))?;
        Ok(data)
    }

    fn add_lazy(&self, key: ResourceKey, generator: LazyGenerator) -> StoreResult<()> {
        self.insert(key, Resource::lazy(generator))
    }

    fn add_async(
        &self,
        key: ResourceKey,
        generator: AsyncGenerator,
    ) -> StoreResult<PackFuture<Bytes>> {
        let (job, future) = {
            let mut map = self
                .bucket(key.bucket())
                .write()
                .expect("bucket lock poisoned");
            self.duplicate_policy()
                .admit(&key, map.contains_key(&key), &self.label)?;
            let job_key = key.clone();
            let (job, future) =
                executor::prepare(move || generator(&job_key).map(Bytes::from));
            debug!(%key, kind = "async", "resource added");
            map.insert(key, Arc::new(Resource::Async(future.clone())));
            (job, future)
        };
        // Submitted after the lock is released so an inline executor can
        // run generators that touch this store.
        self.executor.execute(job);
        Ok(future)
    }

    fn add_immediate(&self, key: ResourceKey, value: Immediate) -> StoreResult<()> {
        self.insert(key, Resource::Immediate(value))
    }

    fn resource(&self, key: &ResourceKey) -> Option<Arc<Resource>> {
        self.bucket(key.bucket())
            .read()
            .expect("bucket lock poisoned")
            .get(key)
            .cloned()
    }

    fn entries(&self, bucket: Bucket) -> Vec<(ResourceKey, Arc<Resource>)> {
        self.bucket(bucket)
            .read()
            .expect("bucket lock poisoned")
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect()
    }

    fn clear(&self, side: Side) {
        let mut map = self
            .bucket(Bucket::from(side))
            .write()
            .expect("bucket lock poisoned");
        debug!(%side, removed = map.len(), pack = %self.label, "cleared resources");
        map.clear();
    }

    fn clear_root(&self) {
        let mut map = self.root.write().expect("bucket lock poisoned");
        debug!(removed = map.len(), pack = %self.label, "cleared root resources");
        map.clear();
    }

    fn count(&self, side: Side) -> usize {
        self.bucket(Bucket::from(side))
            .read()
            .expect("bucket lock poisoned")
            .len()
    }

    fn root_count(&self) -> usize {
        self.root.read().expect("bucket lock poisoned").len()
    }
}

impl std::fmt::Debug for InMemoryResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryResourceStore")
            .field("label", &self.label)
            .field("client", &self.count(Side::Client))
            .field("server", &self.count(Side::Server))
            .field("root", &self.root_count())
            .field("policy", &self.duplicate_policy())
            .finish()
    }
}
