//! Runtime resource packs.
//!
//! A [`RuntimePack`] is an in-memory pack of client assets, server data, and
//! root files, built by generation code at run time and read by a host
//! through [`RuntimePack::open`], [`RuntimePack::find_resources`] and
//! friends. It can be dumped to or loaded from a directory or zip archive,
//! and rebuilt through registered regeneration callbacks.
//!
//! One [`WorkerPool`] is meant to be shared by every pack in the process:
//!
//! ```no_run
//! use std::sync::Arc;
//! use rrp_pack::{ResourceId, RuntimePack, Side, WorkerPool};
//!
//! let pool = Arc::new(WorkerPool::with_defaults()?);
//! let pack = RuntimePack::new(ResourceId::parse("demo:generated")?, pool);
//! pack.add_resource(Side::Client, ResourceId::parse("demo:lang/en_us.json")?, &b"{}"[..])?;
//! pack.dump()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod pack;
pub mod regeneration;

pub use config::PackConfig;
pub use error::{PackError, PackResult};
pub use pack::RuntimePack;
pub use regeneration::{RegenerationCallback, RegenerationController, RegenerationOutcome};

// Re-export key types
pub use rrp_persist::{DumpScope, DumpStats, LoadStats};
pub use rrp_store::{
    BoxError, Bytes, DuplicatePolicy, Executor, HostOnly, Immediate, ImmediateCodec,
    InlineExecutor, JsonCodec, PackFuture, ResourceHandle, ResourceKind, WorkerPool,
    WorkerPoolConfig,
};
pub use rrp_types::{PackMetadata, ResourceId, ResourceKey, RootPath, Side};
pub use tokio_util::sync::CancellationToken;
