//! Foundation types for runtime resource packs.
//!
//! A runtime pack is an in-memory collection of asset and data files that a
//! host application queries by namespaced key. This crate provides the key
//! and partition vocabulary shared by every other `rrp-*` crate.
//!
//! # Key Types
//!
//! - [`ResourceId`] -- `namespace:path` identifier for one client or server resource
//! - [`RootPath`] -- ordered path segments naming a top-level file (e.g. `pack.mcmeta`)
//! - [`Side`] -- the CLIENT (assets) or SERVER (data) partition
//! - [`Bucket`] -- one of the three storage buckets (client, server, root)
//! - [`ResourceKey`] -- a fully-qualified key: a sided id or a root path
//! - [`PackMetadata`] -- the `pack.mcmeta` document

pub mod error;
pub mod id;
pub mod key;
pub mod metadata;

pub use error::TypeError;
pub use id::{ResourceId, DEFAULT_NAMESPACE};
pub use key::{Bucket, ResourceKey, RootPath, Side};
pub use metadata::{PackMetadata, PackSection, PACK_METADATA_FILE};
