use rrp_types::{Bucket, ResourceKey, TypeError};

/// Boxed error returned by user-supplied generators and codecs.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of a job that did not produce a value.
///
/// Cloneable so every holder of a [`PackFuture`](crate::PackFuture) observes
/// the same failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The job returned an error.
    #[error("task failed: {0}")]
    Failed(String),

    /// The job panicked.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The future was cancelled before the job started.
    #[error("task cancelled before it started")]
    Cancelled,

    /// The executor dropped the job without running it.
    #[error("task abandoned by its executor")]
    Abandoned,
}

/// Errors from resource store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Strict duplicate policy rejected an insert. The store is unchanged.
    #[error("duplicate {bucket} resource {key} in pack {pack:?}")]
    Duplicate {
        bucket: Bucket,
        key: ResourceKey,
        pack: String,
    },

    /// An immediate value's codec could not produce bytes.
    #[error("immediate resource {key} of type {type_name} cannot be encoded: {reason}")]
    UnsupportedImmediate {
        key: ResourceKey,
        type_name: &'static str,
        reason: String,
    },

    /// The computation behind an async resource did not produce bytes.
    #[error("async resource {key} failed: {source}")]
    AsyncComputation {
        key: ResourceKey,
        #[source]
        source: TaskError,
    },

    /// A lazy resource's generator returned an error.
    #[error("lazy resource {key} failed: {reason}")]
    LazyGeneration { key: ResourceKey, reason: String },

    /// Invalid identifier or path.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
