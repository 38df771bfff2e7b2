use std::fs;
use std::path::{Path, PathBuf};

use rrp_types::{PackMetadata, ResourceId};
use serde::{Deserialize, Serialize};

use crate::error::{PackError, PackResult};

/// Per-pack settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// `pack_format` written into synthesized metadata.
    pub pack_format: u32,
    /// Description written into synthesized metadata.
    pub description: String,
    /// Parent directory of [`RuntimePack::dump`](crate::RuntimePack::dump) output.
    pub dump_dir: PathBuf,
    /// Start with the permissive duplicate policy.
    pub allow_duplicates: bool,
    /// Dump the whole pack when it is closed.
    pub dump_on_close: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            pack_format: 15,
            description: "runtime resource pack".to_string(),
            dump_dir: PathBuf::from("rrp.debug"),
            allow_duplicates: false,
            dump_on_close: false,
        }
    }
}

impl PackConfig {
    pub fn from_toml_str(s: &str) -> PackResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> PackResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| PackError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Default dump location for the pack `id`: `<dump_dir>/<namespace>;<path>`.
    pub fn dump_path(&self, id: &ResourceId) -> PathBuf {
        self.dump_dir
            .join(format!("{};{}", id.namespace(), id.path()))
    }

    /// Metadata used when the pack has no `pack.mcmeta` of its own.
    pub fn metadata(&self, id: &ResourceId) -> PackMetadata {
        PackMetadata::new(id.to_string(), self.pack_format, self.description.clone())
    }
}
