use std::sync::Arc;

use bytes::Bytes;
use rrp_types::{Bucket, ResourceKey, Side};

use crate::error::StoreResult;
use crate::future::PackFuture;
use crate::immediate::Immediate;
use crate::resource::{AsyncGenerator, LazyGenerator, Resource};

/// Partitioned store of resource producers.
///
/// All implementations must satisfy these invariants:
/// - Each key maps to at most one producer per bucket at any instant.
/// - Every add consults the duplicate policy before the bucket is mutated.
/// - Single-key operations are safe from any thread without external locking.
/// - There is no cross-key atomicity: readers may observe a pack mid-population.
/// - Async adds start their computation at registration, never on first read.
pub trait ResourceStore: Send + Sync {
    /// Insert fixed bytes. Returns the same bytes for call chaining.
    fn add_eager(&self, key: ResourceKey, data: Bytes) -> StoreResult<Bytes>;

    /// Insert a generator that runs on first read, at most once.
    fn add_lazy(&self, key: ResourceKey, generator: LazyGenerator) -> StoreResult<()>;

    /// Submit `generator` to the worker pool now and insert its future. The
    /// generator is handed `key` when it runs.
    ///
    /// The returned future may be awaited or cancelled independently of the
    /// store. Failures surface when the key is materialized.
    fn add_async(&self, key: ResourceKey, generator: AsyncGenerator)
        -> StoreResult<PackFuture<Bytes>>;

    /// Insert a typed value with its codec.
    fn add_immediate(&self, key: ResourceKey, value: Immediate) -> StoreResult<()>;

    /// Look up the producer for `key`.
    fn resource(&self, key: &ResourceKey) -> Option<Arc<Resource>>;

    /// Snapshot of one bucket, sorted by key.
    ///
    /// Taken without blocking writers for longer than the copy; later
    /// mutations are not reflected.
    fn entries(&self, bucket: Bucket) -> Vec<(ResourceKey, Arc<Resource>)>;

    /// Remove every resource of one side.
    fn clear(&self, side: Side);

    /// Remove every root resource.
    fn clear_root(&self);

    /// Number of resources on one side.
    fn count(&self, side: Side) -> usize;

    /// Number of root resources.
    fn root_count(&self) -> usize;

    /// Remove everything.
    fn clear_all(&self) {
        for side in Side::ALL {
            self.clear(side);
        }
        self.clear_root();
    }

    fn contains(&self, key: &ResourceKey) -> bool {
        self.resource(key).is_some()
    }
}
