//! The `pack.mcmeta` document.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// File name of the pack metadata document at the pack root.
pub const PACK_METADATA_FILE: &str = "pack.mcmeta";

/// The mandatory `pack` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackSection {
    pub pack_format: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A parsed `pack.mcmeta`: the `pack` section plus any other named sections,
/// kept as raw JSON until a caller asks for them by type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackMetadata {
    pub pack: PackSection,
    #[serde(flatten)]
    pub sections: BTreeMap<String, Value>,
}

impl PackMetadata {
    /// Minimal metadata carrying only the pack identity.
    pub fn new(id: impl Into<String>, pack_format: u32, description: impl Into<String>) -> Self {
        Self {
            pack: PackSection {
                pack_format,
                description: description.into(),
                id: Some(id.into()),
            },
            sections: BTreeMap::new(),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, TypeError> {
        serde_json::from_reader(reader).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Pretty-printed JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec_pretty(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Deserialize the named section, or `Ok(None)` if it is absent.
    ///
    /// `"pack"` is served from the typed [`PackSection`].
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, TypeError> {
        let value = if name == "pack" {
            serde_json::to_value(&self.pack).map_err(|e| TypeError::Serialization(e.to_string()))?
        } else {
            match self.sections.get(name) {
                Some(value) => value.clone(),
                None => return Ok(None),
            }
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| TypeError::Serialization(format!("section {name:?}: {e}")))
    }
}
