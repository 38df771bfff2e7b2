//! Persistence engine for runtime resource packs.
//!
//! Dumps a [`ResourceStore`](rrp_store::ResourceStore) to a directory or zip
//! archive and loads one back.
//!
//! # Layout
//!
//! - root entries at their joined path (e.g. `pack.mcmeta`, `pack.png`)
//! - client entries at `assets/<namespace>/<path>`
//! - server entries at `data/<namespace>/<path>`
//!
//! A dump writes `pack.mcmeta` from the supplied [`PackMetadata`](rrp_types::PackMetadata)
//! when the root bucket has none of its own.
//!
//! # Cancellation
//!
//! Dump and load poll a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! before every entry. An interrupted operation is not an error: it stops,
//! keeps what it already wrote, logs a warning, and reports
//! `interrupted: true` in its stats.

pub mod dump;
pub mod error;
pub mod load;
pub mod sink;

pub use dump::{dump_to_dir, dump_to_zip, dump_with, DumpScope, DumpStats};
pub use error::{PersistError, PersistResult};
pub use load::{classify, load_from_dir, load_from_zip, LoadStats};
pub use sink::{DirSink, DumpSink, ZipSink};
