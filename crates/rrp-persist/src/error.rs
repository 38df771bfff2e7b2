use std::io;
use std::path::PathBuf;

use rrp_store::StoreError;
use rrp_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("zip error at {entry:?}: {source}")]
    Zip {
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("pack metadata: {0}")]
    Metadata(#[from] TypeError),
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn zip(entry: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::Zip {
            entry: entry.into(),
            source,
        }
    }
}

pub type PersistResult<T> = Result<T, PersistError>;
