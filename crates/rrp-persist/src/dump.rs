//! Store → directory / archive.

use std::fs;
use std::io::{Seek, Write};
use std::path::Path;

use rrp_store::ResourceStore;
use rrp_types::{Bucket, PackMetadata, ResourceKey, RootPath, Side, PACK_METADATA_FILE};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zip::ZipWriter;

use crate::error::{PersistError, PersistResult};
use crate::sink::{DirSink, DumpSink, ZipSink};

/// Which partitions a dump includes. Root entries are always written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DumpScope {
    pub client: bool,
    pub server: bool,
}

impl DumpScope {
    pub const ALL: DumpScope = DumpScope {
        client: true,
        server: true,
    };
    pub const ROOT_ONLY: DumpScope = DumpScope {
        client: false,
        server: false,
    };

    /// Root entries plus one side.
    pub fn only(side: Side) -> Self {
        match side {
            Side::Client => DumpScope {
                client: true,
                server: false,
            },
            Side::Server => DumpScope {
                client: false,
                server: true,
            },
        }
    }

    pub fn includes(&self, side: Side) -> bool {
        match side {
            Side::Client => self.client,
            Side::Server => self.server,
        }
    }
}

impl Default for DumpScope {
    fn default() -> Self {
        Self::ALL
    }
}

/// Entries written by a dump, per bucket.
///
/// `root` includes a synthesized metadata file. When `interrupted` is set the
/// counts describe exactly what reached the target before the dump halted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DumpStats {
    pub root: usize,
    pub client: usize,
    pub server: usize,
    pub interrupted: bool,
}

impl DumpStats {
    /// `[root, client, server]`.
    pub fn as_array(&self) -> [usize; 3] {
        [self.root, self.client, self.server]
    }

    pub fn total(&self) -> usize {
        self.root + self.client + self.server
    }

    fn record(&mut self, bucket: Bucket) {
        match bucket {
            Bucket::Root => self.root += 1,
            Bucket::Client => self.client += 1,
            Bucket::Server => self.server += 1,
        }
    }
}

/// Dump into `target`, which is deleted and recreated first.
///
/// Interruption through `cancel` halts between entries, leaves whatever was
/// already written on disk, and returns normally with `interrupted` set.
pub fn dump_to_dir(
    store: &dyn ResourceStore,
    metadata: &PackMetadata,
    target: &Path,
    scope: DumpScope,
    cancel: &CancellationToken,
) -> PersistResult<DumpStats> {
    if target.exists() {
        fs::remove_dir_all(target).map_err(|e| PersistError::io(target, e))?;
    }
    fs::create_dir_all(target).map_err(|e| PersistError::io(target, e))?;

    let mut sink = DirSink::new(target);
    let stats = dump_with(store, metadata, &mut sink, scope, cancel)?;
    info!(
        target = %target.display(),
        root = stats.root,
        client = stats.client,
        server = stats.server,
        interrupted = stats.interrupted,
        "dumped pack to directory"
    );
    Ok(stats)
}

/// Dump into a caller-owned zip archive. The caller finishes the archive.
pub fn dump_to_zip<W: Write + Seek>(
    store: &dyn ResourceStore,
    metadata: &PackMetadata,
    zip: &mut ZipWriter<W>,
    scope: DumpScope,
    cancel: &CancellationToken,
) -> PersistResult<DumpStats> {
    let mut sink = ZipSink::new(zip);
    let stats = dump_with(store, metadata, &mut sink, scope, cancel)?;
    info!(
        root = stats.root,
        client = stats.client,
        server = stats.server,
        interrupted = stats.interrupted,
        "dumped pack to archive"
    );
    Ok(stats)
}

/// Traverse the store into any sink: root entries, synthesized metadata if
/// no root entry provides it, then client and server entries per `scope`.
pub fn dump_with(
    store: &dyn ResourceStore,
    metadata: &PackMetadata,
    sink: &mut dyn DumpSink,
    scope: DumpScope,
    cancel: &CancellationToken,
) -> PersistResult<DumpStats> {
    let mut stats = DumpStats::default();
    let metadata_key = ResourceKey::root(RootPath::new([PACK_METADATA_FILE])?);

    let root = store.entries(Bucket::Root);
    let has_metadata = root.iter().any(|(key, _)| *key == metadata_key);
    let mut buckets = vec![root];
    for side in Side::ALL {
        if scope.includes(side) {
            buckets.push(store.entries(Bucket::from(side)));
        }
    }

    for (index, entries) in buckets.into_iter().enumerate() {
        for (key, resource) in entries {
            if halted(cancel, &mut stats) {
                return Ok(stats);
            }
            let bytes = resource.materialize(store, &key)?;
            let relative = key.relative_path();
            sink.write_entry(&relative, &bytes)?;
            debug!(entry = %relative, len = bytes.len(), kind = %resource.kind(), "dumped entry");
            stats.record(key.bucket());
        }

        if index == 0 && !has_metadata {
            if halted(cancel, &mut stats) {
                return Ok(stats);
            }
            sink.write_entry(PACK_METADATA_FILE, &metadata.to_json_bytes()?)?;
            debug!(entry = PACK_METADATA_FILE, "synthesized pack metadata");
            stats.root += 1;
        }
    }

    Ok(stats)
}

fn halted(cancel: &CancellationToken, stats: &mut DumpStats) -> bool {
    if cancel.is_cancelled() {
        warn!(
            root = stats.root,
            client = stats.client,
            server = stats.server,
            "dump interrupted; partial output left in place"
        );
        stats.interrupted = true;
        true
    } else {
        false
    }
}
