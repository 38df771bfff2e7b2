use std::collections::BTreeSet;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use rrp_persist::{DumpScope, DumpStats, LoadStats};
use rrp_store::{
    submit, BoxError, DuplicatePolicy, Executor, Immediate, InMemoryResourceStore, PackFuture,
    ResourceHandle, ResourceStore,
};
use rrp_types::{Bucket, PackMetadata, ResourceId, ResourceKey, RootPath, Side, PACK_METADATA_FILE};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use zip::{ZipArchive, ZipWriter};

use crate::config::PackConfig;
use crate::error::PackResult;
use crate::regeneration::{RegenerationController, RegenerationOutcome};

/// A runtime resource pack.
///
/// Wraps an [`InMemoryResourceStore`] with the pack identity, settings,
/// regeneration callbacks, and the lookup operations a host pulls from.
pub struct RuntimePack {
    id: ResourceId,
    config: PackConfig,
    store: InMemoryResourceStore,
    regeneration: RwLock<RegenerationController<RuntimePack>>,
}

impl RuntimePack {
    /// Create an empty pack with default settings.
    pub fn new(id: ResourceId, executor: Arc<dyn Executor>) -> Self {
        Self::with_config(id, PackConfig::default(), executor)
    }

    pub fn with_config(id: ResourceId, config: PackConfig, executor: Arc<dyn Executor>) -> Self {
        let policy = if config.allow_duplicates {
            DuplicatePolicy::Permissive
        } else {
            DuplicatePolicy::Strict
        };
        let store = InMemoryResourceStore::new(id.to_string(), executor).with_policy(policy);
        debug!(pack = %id, ?policy, "pack created");
        Self {
            id,
            config,
            store,
            regeneration: RwLock::new(RegenerationController::new()),
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Name used in log lines and duplicate errors.
    pub fn display_name(&self) -> &str {
        self.store.label()
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    pub fn store(&self) -> &InMemoryResourceStore {
        &self.store
    }

    /// Switch between the strict and permissive duplicate policy.
    pub fn allow_duplicates(&self, allow: bool) {
        let policy = if allow {
            DuplicatePolicy::Permissive
        } else {
            DuplicatePolicy::Strict
        };
        self.store.set_duplicate_policy(policy);
    }

    // ---- Population ----

    /// Add fixed bytes. Returns them for chaining.
    pub fn add_resource(
        &self,
        side: Side,
        id: ResourceId,
        data: impl Into<Bytes>,
    ) -> PackResult<Bytes> {
        Ok(self.store.add_eager(ResourceKey::sided(side, id), data.into())?)
    }

    /// Add a resource generated on first read.
    pub fn add_lazy_resource<F>(&self, side: Side, id: ResourceId, generator: F) -> PackResult<()>
    where
        F: FnOnce(&dyn ResourceStore, &ResourceKey) -> Result<Vec<u8>, BoxError> + Send + 'static,
    {
        Ok(self
            .store
            .add_lazy(ResourceKey::sided(side, id), Box::new(generator))?)
    }

    /// Add a resource computed on the worker pool, starting now. The task is
    /// handed the key it produces.
    pub fn add_async_resource<F>(
        &self,
        side: Side,
        id: ResourceId,
        task: F,
    ) -> PackResult<PackFuture<Bytes>>
    where
        F: FnOnce(&ResourceKey) -> Result<Vec<u8>, BoxError> + Send + 'static,
    {
        Ok(self
            .store
            .add_async(ResourceKey::sided(side, id), Box::new(task))?)
    }

    pub fn add_immediate_resource(
        &self,
        side: Side,
        id: ResourceId,
        value: Immediate,
    ) -> PackResult<()> {
        Ok(self
            .store
            .add_immediate(ResourceKey::sided(side, id), value)?)
    }

    pub fn add_root_resource(&self, path: RootPath, data: impl Into<Bytes>) -> PackResult<Bytes> {
        Ok(self.store.add_eager(ResourceKey::root(path), data.into())?)
    }

    pub fn add_lazy_root_resource<F>(&self, path: RootPath, generator: F) -> PackResult<()>
    where
        F: FnOnce(&dyn ResourceStore, &ResourceKey) -> Result<Vec<u8>, BoxError> + Send + 'static,
    {
        Ok(self
            .store
            .add_lazy(ResourceKey::root(path), Box::new(generator))?)
    }

    pub fn add_async_root_resource<F>(
        &self,
        path: RootPath,
        task: F,
    ) -> PackResult<PackFuture<Bytes>>
    where
        F: FnOnce(&ResourceKey) -> Result<Vec<u8>, BoxError> + Send + 'static,
    {
        Ok(self.store.add_async(ResourceKey::root(path), Box::new(task))?)
    }

    pub fn add_immediate_root_resource(&self, path: RootPath, value: Immediate) -> PackResult<()> {
        Ok(self.store.add_immediate(ResourceKey::root(path), value)?)
    }

    /// Run `task` on the worker pool with access to this pack.
    ///
    /// A task that submits more work to the same pool and then blocks on it
    /// can deadlock a saturated pool. Avoid waiting on nested submissions.
    pub fn run_async<F>(self: &Arc<Self>, task: F) -> PackFuture<()>
    where
        F: FnOnce(&RuntimePack) -> Result<(), BoxError> + Send + 'static,
    {
        let pack = Arc::clone(self);
        let executor = Arc::clone(self.store.executor());
        submit(executor.as_ref(), move || task(&pack))
    }

    // ---- Clearing ----

    pub fn clear_resources(&self, side: Side) {
        self.store.clear(side);
    }

    pub fn clear_root_resources(&self) {
        self.store.clear_root();
    }

    pub fn clear_all(&self) {
        self.store.clear_all();
    }

    pub fn count(&self, side: Side) -> usize {
        self.store.count(side)
    }

    pub fn root_count(&self) -> usize {
        self.store.root_count()
    }

    // ---- Host lookup ----

    pub fn get_resource(&self, side: Side, id: &ResourceId) -> Option<ResourceHandle<'_>> {
        self.store.get(&ResourceKey::sided(side, id.clone()))
    }

    pub fn get_root_resource(&self, path: &RootPath) -> Option<ResourceHandle<'_>> {
        self.store.get(&ResourceKey::root(path.clone()))
    }

    /// Open a resource for reading, or `None` if the pack has no such key.
    pub fn open(&self, side: Side, id: &ResourceId) -> PackResult<Option<Cursor<Bytes>>> {
        match self.get_resource(side, id) {
            Some(handle) => Ok(Some(handle.open()?)),
            None => Ok(None),
        }
    }

    /// Open a root file. `pack.mcmeta` is always available: when the pack
    /// holds none, the synthesized metadata is served.
    pub fn open_root(&self, path: &RootPath) -> PackResult<Option<Cursor<Bytes>>> {
        if let Some(handle) = self.get_root_resource(path) {
            return Ok(Some(handle.open()?));
        }
        if is_metadata_path(path) {
            let bytes = self.synthesized_metadata().to_json_bytes()?;
            return Ok(Some(Cursor::new(Bytes::from(bytes))));
        }
        Ok(None)
    }

    /// Hand every resource in `namespace` whose path starts with `prefix` to
    /// `consumer`, in key order. Returns how many matched.
    pub fn find_resources<F>(&self, side: Side, namespace: &str, prefix: &str, mut consumer: F) -> usize
    where
        F: FnMut(&ResourceId, ResourceHandle<'_>),
    {
        let mut matched = 0;
        for (key, resource) in self.store.entries(Bucket::from(side)) {
            let Some(id) = key.id().cloned() else {
                continue;
            };
            if id.namespace() != namespace || !id.path().starts_with(prefix) {
                continue;
            }
            matched += 1;
            consumer(&id, ResourceHandle::new(&self.store, key, resource));
        }
        matched
    }

    /// Namespaces with at least one resource on `side`.
    pub fn namespaces(&self, side: Side) -> BTreeSet<String> {
        self.store
            .entries(Bucket::from(side))
            .into_iter()
            .filter_map(|(key, _)| key.id().map(|id| id.namespace().to_string()))
            .collect()
    }

    /// The pack's `pack.mcmeta`: the root entry if present, else the
    /// synthesized default.
    pub fn metadata(&self) -> PackResult<PackMetadata> {
        let path = metadata_path()?;
        match self.get_root_resource(&path) {
            Some(handle) => Ok(PackMetadata::from_slice(&handle.bytes()?)?),
            None => Ok(self.synthesized_metadata()),
        }
    }

    /// Deserialize one named section of the pack metadata.
    pub fn parse_metadata<T: DeserializeOwned>(&self, section: &str) -> PackResult<Option<T>> {
        Ok(self.metadata()?.section(section)?)
    }

    pub fn synthesized_metadata(&self) -> PackMetadata {
        self.config.metadata(&self.id)
    }

    // ---- Regeneration ----

    pub fn set_regenerate_callback<F>(&self, callback: F)
    where
        F: Fn(&RuntimePack, &CancellationToken) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.regeneration
            .write()
            .expect("regeneration lock poisoned")
            .set_all_callback(callback);
    }

    pub fn set_sided_regenerate_callback<F>(&self, side: Side, callback: F)
    where
        F: Fn(&RuntimePack, &CancellationToken) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.regeneration
            .write()
            .expect("regeneration lock poisoned")
            .set_sided_callback(side, callback);
    }

    pub fn supports_sided_regeneration(&self, side: Side) -> bool {
        self.regeneration
            .read()
            .expect("regeneration lock poisoned")
            .has_sided_callback(side)
    }

    /// Rebuild the whole pack on the calling thread.
    pub fn regenerate(&self, cancel: &CancellationToken) -> PackResult<RegenerationOutcome> {
        let outcome = self.controller().regenerate_all(self, cancel)?;
        info!(pack = %self.id, callbacks = outcome.callbacks_run, interrupted = outcome.interrupted, "pack regenerated");
        Ok(outcome)
    }

    /// Rebuild one side. Does nothing without a callback for it.
    pub fn regenerate_sided(
        &self,
        side: Side,
        cancel: &CancellationToken,
    ) -> PackResult<RegenerationOutcome> {
        self.controller().regenerate_sided(side, self, cancel)
    }

    // Callbacks run against a snapshot so they may replace themselves.
    fn controller(&self) -> RegenerationController<RuntimePack> {
        self.regeneration
            .read()
            .expect("regeneration lock poisoned")
            .clone()
    }

    // ---- Persistence ----

    /// Dump everything to `<dump_dir>/<namespace>;<path>`.
    pub fn dump(&self) -> PackResult<DumpStats> {
        let target = self.config.dump_path(&self.id);
        self.dump_to(&target, DumpScope::ALL, &CancellationToken::new())
    }

    pub fn dump_to(
        &self,
        target: &Path,
        scope: DumpScope,
        cancel: &CancellationToken,
    ) -> PackResult<DumpStats> {
        Ok(rrp_persist::dump_to_dir(
            &self.store,
            &self.synthesized_metadata(),
            target,
            scope,
            cancel,
        )?)
    }

    /// Dump into an archive the caller owns and finishes.
    pub fn dump_zip<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        scope: DumpScope,
        cancel: &CancellationToken,
    ) -> PackResult<DumpStats> {
        Ok(rrp_persist::dump_to_zip(
            &self.store,
            &self.synthesized_metadata(),
            zip,
            scope,
            cancel,
        )?)
    }

    pub fn load_dir(&self, source: &Path, cancel: &CancellationToken) -> PackResult<LoadStats> {
        Ok(rrp_persist::load_from_dir(&self.store, source, cancel)?)
    }

    pub fn load_zip<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        cancel: &CancellationToken,
    ) -> PackResult<LoadStats> {
        Ok(rrp_persist::load_from_zip(&self.store, archive, cancel)?)
    }

    /// Close hook. Dumps the pack first when `dump_on_close` is set.
    pub fn close(&self) -> PackResult<()> {
        if self.config.dump_on_close {
            self.dump()?;
        }
        info!(
            pack = %self.id,
            client = self.count(Side::Client),
            server = self.count(Side::Server),
            root = self.root_count(),
            "pack closed"
        );
        Ok(())
    }
}

impl std::fmt::Debug for RuntimePack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimePack")
            .field("id", &self.id)
            .field("store", &self.store)
            .field("regeneration", &self.regeneration)
            .finish()
    }
}

fn metadata_path() -> PackResult<RootPath> {
    Ok(RootPath::new([PACK_METADATA_FILE])?)
}

fn is_metadata_path(path: &RootPath) -> bool {
    path.segments().len() == 1 && path.segments()[0] == PACK_METADATA_FILE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use rrp_store::{
        InlineExecutor, ResourceKind, StoreError, WorkerPool, WorkerPoolConfig,
    };
    use serde::Deserialize;

    use crate::error::PackError;

    fn id(s: &str) -> ResourceId {
        ResourceId::parse(s).unwrap()
    }

    fn pack() -> RuntimePack {
        RuntimePack::new(id("demo:test"), Arc::new(InlineExecutor))
    }

    fn read_all(mut cursor: Cursor<Bytes>) -> Vec<u8> {
        let mut out = Vec::new();
        cursor.read_to_end(&mut out).unwrap();
        out
    }

    // ---------------------------------------------------------------
    // Population and lookup
    // ---------------------------------------------------------------

    #[test]
    fn add_resource_returns_bytes() {
        let pack = pack();
        let bytes = pack
            .add_resource(Side::Client, id("demo:sprite"), vec![1u8, 2, 3, 4])
            .unwrap();
        assert_eq!(bytes, Bytes::from(vec![1u8, 2, 3, 4]));
        assert_eq!(pack.count(Side::Client), 1);
        assert_eq!(pack.count(Side::Server), 0);
        assert_eq!(pack.display_name(), "demo:test");
    }

    #[test]
    fn strict_pack_rejects_duplicates() {
        let pack = pack();
        pack.add_resource(Side::Server, id("demo:table"), &b"one"[..])
            .unwrap();
        let err = pack
            .add_resource(Side::Server, id("demo:table"), &b"two"[..])
            .unwrap_err();
        assert!(matches!(err, PackError::Store(StoreError::Duplicate { .. })));

        // Same key on the other side is a different resource.
        pack.add_resource(Side::Client, id("demo:table"), &b"two"[..])
            .unwrap();
    }

    #[test]
    fn permissive_pack_overwrites() {
        let config = PackConfig {
            allow_duplicates: true,
            ..PackConfig::default()
        };
        let pack = RuntimePack::with_config(id("demo:test"), config, Arc::new(InlineExecutor));
        pack.add_resource(Side::Client, id("demo:a"), &b"first"[..])
            .unwrap();
        pack.add_resource(Side::Client, id("demo:a"), &b"second"[..])
            .unwrap();
        let read = read_all(pack.open(Side::Client, &id("demo:a")).unwrap().unwrap());
        assert_eq!(read, b"second");

        pack.allow_duplicates(false);
        assert!(pack
            .add_resource(Side::Client, id("demo:a"), &b"third"[..])
            .is_err());
    }

    #[test]
    fn open_missing_is_none() {
        let pack = pack();
        assert!(pack.open(Side::Client, &id("demo:nothing")).unwrap().is_none());
        let path = RootPath::parse("pack.png").unwrap();
        assert!(pack.open_root(&path).unwrap().is_none());
    }

    #[test]
    fn open_root_serves_synthesized_metadata() {
        let pack = pack();
        let path = RootPath::parse(PACK_METADATA_FILE).unwrap();
        let bytes = read_all(pack.open_root(&path).unwrap().unwrap());
        let meta = PackMetadata::from_slice(&bytes).unwrap();
        assert_eq!(meta, pack.synthesized_metadata());
        assert_eq!(meta.pack.id.as_deref(), Some("demo:test"));
    }

    #[test]
    fn lazy_resource_is_generated_once() {
        let pack = pack();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        pack.add_lazy_resource(Side::Server, id("demo:table"), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![9, 9, 9, 9])
        })
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        for _ in 0..3 {
            let read = read_all(pack.open(Side::Server, &id("demo:table")).unwrap().unwrap());
            assert_eq!(read, vec![9u8, 9, 9, 9]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn root_resources_support_every_kind() {
        let pack = pack();
        pack.add_root_resource(RootPath::parse("a").unwrap(), &b"eager"[..])
            .unwrap();
        pack.add_lazy_root_resource(RootPath::parse("b").unwrap(), |_, _| {
            Ok(b"lazy".to_vec())
        })
        .unwrap();
        let future = pack
            .add_async_root_resource(RootPath::parse("c").unwrap(), |_| Ok(b"async".to_vec()))
            .unwrap();
        pack.add_immediate_root_resource(RootPath::parse("d").unwrap(), Immediate::json("imm"))
            .unwrap();

        assert_eq!(future.get().unwrap(), "async");
        assert_eq!(pack.root_count(), 4);
        let kinds: Vec<ResourceKind> = ["a", "b", "c", "d"]
            .iter()
            .map(|p| {
                pack.get_root_resource(&RootPath::parse(p).unwrap())
                    .unwrap()
                    .kind()
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Eager,
                ResourceKind::Lazy,
                ResourceKind::Async,
                ResourceKind::Immediate
            ]
        );
    }

    #[test]
    fn immediate_value_skips_encoding() {
        #[derive(Debug, PartialEq, serde::Serialize)]
        struct Model {
            parent: String,
        }

        let pack = pack();
        pack.add_immediate_resource(
            Side::Client,
            id("demo:models/item/gem"),
            Immediate::json(Model {
                parent: "item/generated".into(),
            }),
        )
        .unwrap();

        let handle = pack
            .get_resource(Side::Client, &id("demo:models/item/gem"))
            .unwrap();
        let model = handle.immediate_value::<Model>().unwrap();
        assert_eq!(model.parent, "item/generated");
        assert!(handle.immediate_value::<String>().is_none());

        let text = handle.bytes().unwrap();
        assert!(std::str::from_utf8(&text).unwrap().contains("item/generated"));
    }

    #[test]
    fn find_resources_filters_by_namespace_and_prefix() {
        let pack = pack();
        for path in ["demo:textures/a", "demo:textures/b", "demo:models/c", "other:textures/d"] {
            pack.add_resource(Side::Client, id(path), &b"x"[..]).unwrap();
        }

        let mut found = Vec::new();
        let matched = pack.find_resources(Side::Client, "demo", "textures/", |id, handle| {
            assert_eq!(handle.bytes().unwrap(), "x");
            found.push(id.to_string());
        });
        assert_eq!(matched, 2);
        assert_eq!(found, vec!["demo:textures/a", "demo:textures/b"]);

        assert_eq!(
            pack.find_resources(Side::Server, "demo", "", |_, _| {}),
            0
        );
    }

    #[test]
    fn namespaces_per_side() {
        let pack = pack();
        pack.add_resource(Side::Client, id("alpha:a"), &b"x"[..]).unwrap();
        pack.add_resource(Side::Client, id("beta:b"), &b"x"[..]).unwrap();
        pack.add_resource(Side::Server, id("gamma:c"), &b"x"[..]).unwrap();

        let client: Vec<String> = pack.namespaces(Side::Client).into_iter().collect();
        assert_eq!(client, vec!["alpha", "beta"]);
        let server: Vec<String> = pack.namespaces(Side::Server).into_iter().collect();
        assert_eq!(server, vec!["gamma"]);
    }

    #[test]
    fn parse_metadata_sections() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Filter {
            block: Vec<serde_json::Value>,
        }

        let pack = pack();
        assert!(pack.parse_metadata::<Filter>("filter").unwrap().is_none());

        let doc = serde_json::json!({
            "pack": { "pack_format": 15, "description": "custom" },
            "filter": { "block": [ { "namespace": "minecraft" } ] }
        });
        pack.add_root_resource(
            RootPath::parse(PACK_METADATA_FILE).unwrap(),
            serde_json::to_vec(&doc).unwrap(),
        )
        .unwrap();

        let filter: Filter = pack.parse_metadata("filter").unwrap().unwrap();
        assert_eq!(filter.block.len(), 1);
        assert_eq!(pack.metadata().unwrap().pack.description, "custom");
    }

    #[test]
    fn clear_is_selective() {
        let pack = pack();
        pack.add_resource(Side::Client, id("demo:a"), &b"x"[..]).unwrap();
        pack.add_resource(Side::Server, id("demo:b"), &b"x"[..]).unwrap();
        pack.add_root_resource(RootPath::parse("pack.png").unwrap(), &b"x"[..])
            .unwrap();

        pack.clear_resources(Side::Client);
        assert_eq!(pack.count(Side::Client), 0);
        assert_eq!(pack.count(Side::Server), 1);
        assert_eq!(pack.root_count(), 1);

        pack.clear_root_resources();
        assert_eq!(pack.root_count(), 0);
        assert_eq!(pack.count(Side::Server), 1);

        pack.clear_all();
        assert_eq!(pack.count(Side::Server), 0);
    }

    // ---------------------------------------------------------------
    // Worker pool
    // ---------------------------------------------------------------

    #[test]
    fn async_failure_surfaces_on_read() {
        let pool = WorkerPool::new(WorkerPoolConfig {
            threads: 2,
            thread_name: "rrp-test".into(),
        })
        .unwrap();
        let pack = RuntimePack::new(id("demo:test"), Arc::new(pool));

        let start = Instant::now();
        pack.add_async_resource(Side::Client, id("demo:slow"), |_| {
            std::thread::sleep(Duration::from_millis(50));
            Err("generator failed".into())
        })
        .unwrap();
        assert!(start.elapsed() < Duration::from_millis(40));

        let err = pack.open(Side::Client, &id("demo:slow")).unwrap_err();
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(matches!(
            err,
            PackError::Store(StoreError::AsyncComputation { .. })
        ));
    }

    #[test]
    fn run_async_populates_in_background() {
        let pool = WorkerPool::new(WorkerPoolConfig {
            threads: 1,
            thread_name: "rrp-test".into(),
        })
        .unwrap();
        let pack = Arc::new(RuntimePack::new(id("demo:test"), Arc::new(pool)));

        let done = pack.run_async(|pack| {
            for i in 0..4 {
                pack.add_resource(Side::Server, id(&format!("demo:entry_{i}")), vec![i as u8])?;
            }
            Ok(())
        });
        done.get().unwrap();
        assert_eq!(pack.count(Side::Server), 4);
    }

    #[test]
    fn run_async_reports_errors() {
        let pack = Arc::new(pack());
        pack.add_resource(Side::Client, id("demo:a"), &b"x"[..]).unwrap();
        let done = pack.run_async(|pack| {
            pack.add_resource(Side::Client, id("demo:a"), &b"y"[..])?;
            Ok(())
        });
        assert!(done.get().is_err());
    }

    // ---------------------------------------------------------------
    // Regeneration
    // ---------------------------------------------------------------

    #[test]
    fn regenerate_replays_population() {
        let pack = pack();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        pack.set_regenerate_callback(move |pack, _| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            pack.clear_resources(Side::Client);
            pack.add_resource(Side::Client, id("demo:gen"), vec![n as u8])?;
            Ok(())
        });

        pack.regenerate(&CancellationToken::new()).unwrap();
        pack.regenerate(&CancellationToken::new()).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(pack.count(Side::Client), 1);
        let read = read_all(pack.open(Side::Client, &id("demo:gen")).unwrap().unwrap());
        assert_eq!(read, vec![1u8]);

        // Whole-pack regeneration only: partial requests do nothing.
        assert!(!pack.supports_sided_regeneration(Side::Client));
        let outcome = pack
            .regenerate_sided(Side::Client, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.callbacks_run, 0);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn sided_regeneration() {
        let pack = pack();
        pack.set_sided_regenerate_callback(Side::Server, |pack, _| {
            pack.clear_resources(Side::Server);
            pack.add_resource(Side::Server, id("demo:data"), &b"d"[..])?;
            Ok(())
        });
        pack.add_resource(Side::Client, id("demo:keep"), &b"k"[..])
            .unwrap();

        let outcome = pack
            .regenerate_sided(Side::Server, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.callbacks_run, 1);
        assert_eq!(pack.count(Side::Server), 1);
        assert_eq!(pack.count(Side::Client), 1);
    }

    #[test]
    fn failing_regeneration_is_an_error() {
        let pack = pack();
        pack.set_regenerate_callback(|pack, _| {
            pack.add_resource(Side::Client, id("demo:dup"), &b"a"[..])?;
            pack.add_resource(Side::Client, id("demo:dup"), &b"b"[..])?;
            Ok(())
        });
        let err = pack.regenerate(&CancellationToken::new()).unwrap_err();
        assert!(matches!(err, PackError::Regeneration { scope: "all", .. }));
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    #[test]
    fn scenario_dump_eager_and_lazy() {
        let pack = pack();
        pack.add_resource(Side::Client, id("demo:sprite"), vec![1u8, 2, 3, 4])
            .unwrap();
        pack.add_lazy_resource(Side::Server, id("demo:table"), |_, _| Ok(vec![5, 6, 7, 8]))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let stats = pack
            .dump_to(dir.path(), DumpScope::ALL, &CancellationToken::new())
            .unwrap();

        assert_eq!(stats.as_array(), [1, 1, 1]);
        assert_eq!(fs::read(dir.path().join("assets/demo/sprite")).unwrap(), vec![1u8, 2, 3, 4]);
        assert_eq!(fs::read(dir.path().join("data/demo/table")).unwrap(), vec![5u8, 6, 7, 8]);
        assert!(dir.path().join(PACK_METADATA_FILE).is_file());
    }

    #[test]
    fn dump_uses_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = PackConfig {
            dump_dir: dir.path().to_path_buf(),
            dump_on_close: true,
            ..PackConfig::default()
        };
        let pack = RuntimePack::with_config(id("demo:test"), config, Arc::new(InlineExecutor));
        pack.add_resource(Side::Client, id("demo:sprite"), &b"s"[..])
            .unwrap();

        pack.close().unwrap();
        let target = dir.path().join("demo;test");
        assert!(target.join("assets/demo/sprite").is_file());
        assert!(target.join(PACK_METADATA_FILE).is_file());
    }

    #[test]
    fn zip_dump_then_load() {
        let original = pack();
        original
            .add_resource(Side::Client, id("demo:textures/gem.png"), &b"png"[..])
            .unwrap();
        original
            .add_lazy_resource(Side::Server, id("demo:loot/gem.json"), |_, _| {
                Ok(b"{}".to_vec())
            })
            .unwrap();

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        original
            .dump_zip(&mut zip, DumpScope::ALL, &CancellationToken::new())
            .unwrap();
        let cursor = zip.finish().unwrap();

        let restored = RuntimePack::new(id("demo:copy"), Arc::new(InlineExecutor));
        let mut archive = ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        let stats = restored
            .load_zip(&mut archive, &CancellationToken::new())
            .unwrap();

        assert_eq!(stats.as_array(), [1, 1, 1]);
        let read = read_all(
            restored
                .open(Side::Server, &id("demo:loot/gem.json"))
                .unwrap()
                .unwrap(),
        );
        assert_eq!(read, b"{}");
        // Loaded metadata is the original pack's, not the new one's.
        assert_eq!(restored.metadata().unwrap().pack.id.as_deref(), Some("demo:test"));
    }

    #[test]
    fn dir_load_keeps_eager_kind() {
        let original = pack();
        original
            .add_lazy_resource(Side::Client, id("demo:lazy"), |_, _| Ok(b"l".to_vec()))
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        original
            .dump_to(dir.path(), DumpScope::ALL, &CancellationToken::new())
            .unwrap();

        let restored = pack();
        restored
            .load_dir(dir.path(), &CancellationToken::new())
            .unwrap();
        let handle = restored.get_resource(Side::Client, &id("demo:lazy")).unwrap();
        assert_eq!(handle.kind(), ResourceKind::Eager);
    }
}
