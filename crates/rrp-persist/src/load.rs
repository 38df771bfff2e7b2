//! Directory / archive → store.
//!
//! Every loaded entry becomes an eager resource. Entries under `assets/` and
//! `data/` with at least a namespace and a path become client and server
//! entries; everything else is a root entry keyed by its full path.

use std::fs;
use std::io::{Read, Seek};
use std::path::Path;

use bytes::Bytes;
use rrp_store::ResourceStore;
use rrp_types::{Bucket, ResourceId, ResourceKey, RootPath, Side, TypeError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::{PersistError, PersistResult};

/// Entries inserted by a load, per bucket, plus entries that were skipped
/// because their path is not a valid key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub root: usize,
    pub client: usize,
    pub server: usize,
    pub skipped: usize,
    pub interrupted: bool,
}

impl LoadStats {
    /// `[root, client, server]`.
    pub fn as_array(&self) -> [usize; 3] {
        [self.root, self.client, self.server]
    }

    pub fn total(&self) -> usize {
        self.root + self.client + self.server
    }
}

/// Map a `/`-separated relative path to the key it is stored under.
pub fn classify(relative: &str) -> Result<ResourceKey, TypeError> {
    let segments: Vec<&str> = relative.split('/').collect();
    if segments.len() >= 3 {
        if let Some(side) = Side::from_directory(segments[0]) {
            let id = ResourceId::new(segments[1], segments[2..].join("/"))?;
            return Ok(ResourceKey::sided(side, id));
        }
    }
    Ok(ResourceKey::root(RootPath::new(segments)?))
}

/// Load every file under `source` into `store`.
pub fn load_from_dir(
    store: &dyn ResourceStore,
    source: &Path,
    cancel: &CancellationToken,
) -> PersistResult<LoadStats> {
    let mut loader = Loader::new(store, cancel);
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            PersistError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if loader.halted() {
            break;
        }

        let path = entry.path();
        let relative = match relative_path(source, path) {
            Some(relative) => relative,
            None => {
                warn!(path = %path.display(), "skipping entry with non UTF-8 path");
                loader.stats.skipped += 1;
                continue;
            }
        };
        let data = fs::read(path).map_err(|e| PersistError::io(path, e))?;
        loader.insert(&relative, data)?;
    }

    let stats = loader.finish();
    info!(
        source = %source.display(),
        root = stats.root,
        client = stats.client,
        server = stats.server,
        skipped = stats.skipped,
        interrupted = stats.interrupted,
        "loaded pack from directory"
    );
    Ok(stats)
}

/// Load every file entry of `archive` into `store`.
pub fn load_from_zip<R: Read + Seek>(
    store: &dyn ResourceStore,
    archive: &mut ZipArchive<R>,
    cancel: &CancellationToken,
) -> PersistResult<LoadStats> {
    let mut loader = Loader::new(store, cancel);
    for index in 0..archive.len() {
        if loader.halted() {
            break;
        }
        let mut file = archive
            .by_index(index)
            .map_err(|e| PersistError::zip(format!("#{index}"), e))?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().trim_start_matches('/').to_string();
        // The header size is untrusted; let the buffer grow as data arrives.
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| PersistError::io(name.as_str(), e))?;
        loader.insert(&name, data)?;
    }

    let stats = loader.finish();
    info!(
        root = stats.root,
        client = stats.client,
        server = stats.server,
        skipped = stats.skipped,
        interrupted = stats.interrupted,
        "loaded pack from archive"
    );
    Ok(stats)
}

fn relative_path(source: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(source).ok()?;
    let segments = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

struct Loader<'a> {
    store: &'a dyn ResourceStore,
    cancel: &'a CancellationToken,
    stats: LoadStats,
}

impl<'a> Loader<'a> {
    fn new(store: &'a dyn ResourceStore, cancel: &'a CancellationToken) -> Self {
        Self {
            store,
            cancel,
            stats: LoadStats::default(),
        }
    }

    fn halted(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            warn!(
                loaded = self.stats.total(),
                "load interrupted; keeping entries loaded so far"
            );
            self.stats.interrupted = true;
        }
        self.stats.interrupted
    }

    fn insert(&mut self, relative: &str, data: Vec<u8>) -> PersistResult<()> {
        let key = match classify(relative) {
            Ok(key) => key,
            Err(e) => {
                warn!(entry = relative, error = %e, "skipping entry with invalid key");
                self.stats.skipped += 1;
                return Ok(());
            }
        };
        debug!(%key, len = data.len(), "loaded entry");
        let bucket = key.bucket();
        self.store.add_eager(key, Bytes::from(data))?;
        match bucket {
            Bucket::Root => self.stats.root += 1,
            Bucket::Client => self.stats.client += 1,
            Bucket::Server => self.stats.server += 1,
        }
        Ok(())
    }

    fn finish(self) -> LoadStats {
        self.stats
    }
}
