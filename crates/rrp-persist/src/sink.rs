//! Write targets for a dump.
//!
//! The dump traversal is target-agnostic; it hands each entry's relative
//! path (`/`-separated) and bytes to a [`DumpSink`].

use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{PersistError, PersistResult};

/// Receives dumped entries one at a time.
pub trait DumpSink {
    /// Write one complete entry. Any stream opened for it is closed before
    /// this returns.
    fn write_entry(&mut self, relative: &str, data: &[u8]) -> PersistResult<()>;
}

/// Writes entries as files under a root directory.
#[derive(Debug)]
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl DumpSink for DirSink {
    fn write_entry(&mut self, relative: &str, data: &[u8]) -> PersistResult<()> {
        let path = relative
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
        }
        fs::write(&path, data).map_err(|e| PersistError::io(&path, e))
    }
}

/// Writes entries into a caller-owned zip archive.
pub struct ZipSink<'a, W: Write + Seek> {
    zip: &'a mut ZipWriter<W>,
}

impl<'a, W: Write + Seek> ZipSink<'a, W> {
    pub fn new(zip: &'a mut ZipWriter<W>) -> Self {
        Self { zip }
    }
}

impl<W: Write + Seek> DumpSink for ZipSink<'_, W> {
    fn write_entry(&mut self, relative: &str, data: &[u8]) -> PersistResult<()> {
        self.zip
            .start_file(relative, SimpleFileOptions::default())
            .map_err(|e| PersistError::zip(relative, e))?;
        self.zip
            .write_all(data)
            .map_err(|e| PersistError::io(relative, e))
    }
}
