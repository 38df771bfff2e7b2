use std::io;
use std::path::PathBuf;

use rrp_persist::PersistError;
use rrp_store::{BoxError, StoreError};
use rrp_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("invalid key: {0}")]
    Type(#[from] TypeError),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("cannot read config {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A regeneration callback failed; the pass it belonged to stopped.
    #[error("{scope} regeneration failed: {source}")]
    Regeneration {
        scope: &'static str,
        #[source]
        source: BoxError,
    },
}

pub type PackResult<T> = Result<T, PackError>;
