//! Concurrent resource store for runtime resource packs.
//!
//! A pack's contents live in three buckets (client, server, root), each a
//! concurrent map from key to a producer. A producer is one of four
//! [`Resource`] variants:
//!
//! - [`Resource::Eager`] -- fixed bytes
//! - [`Resource::Lazy`] -- generated on first read, at most once
//! - [`Resource::Async`] -- computed on the worker pool from registration on
//! - [`Resource::Immediate`] -- a typed value encoded only when bytes are demanded
//!
//! # Storage Backends
//!
//! All backends implement the [`ResourceStore`] trait:
//!
//! - [`InMemoryResourceStore`] -- `RwLock<BTreeMap>` per bucket
//!
//! # Design Rules
//!
//! 1. Each key maps to exactly one producer per bucket at any instant.
//! 2. The [`DuplicatePolicy`] is consulted before a bucket is mutated.
//! 3. No lock is held while a producer materializes.
//! 4. Async work starts at registration on an injected [`Executor`].
//! 5. Failures of deferred producers surface when the key is materialized.

pub mod error;
pub mod executor;
pub mod future;
pub mod guard;
pub mod handle;
pub mod immediate;
pub mod memory;
pub mod resource;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{BoxError, StoreError, StoreResult, TaskError};
pub use executor::{submit, Executor, InlineExecutor, Job, WorkerPool, WorkerPoolConfig};
pub use future::{PackFuture, Promise};
pub use guard::DuplicatePolicy;
pub use handle::ResourceHandle;
pub use immediate::{HostOnly, Immediate, ImmediateCodec, JsonCodec};
pub use memory::InMemoryResourceStore;
pub use resource::{AsyncGenerator, LazyGenerator, LazyResource, Resource, ResourceKind};
pub use traits::ResourceStore;

pub use bytes::Bytes;
