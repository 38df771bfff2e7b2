use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid namespace {namespace:?}: {reason}")]
    InvalidNamespace { namespace: String, reason: String },

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid resource id {0:?}: expected \"namespace:path\"")]
    MalformedId(String),

    #[error("invalid root path: {0}")]
    InvalidRootPath(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
