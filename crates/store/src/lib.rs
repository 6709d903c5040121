//! Partitioned, transactional, disk-backed document store.
//!
//! The store persists two kinds of artifacts on top of an embedded ordered
//! key-value engine: a collection of policies (opaque byte blobs keyed by
//! id) and a single JSON document rooted at `/`. Caller-declared partition
//! patterns control how the document tree is sharded into individual keys:
//! values under a pattern's matches get one key per immediate child of the
//! match, while unpartitioned values collapse into their shortest enclosing
//! root key. Reads that span multiple keys reconstruct the subtree from the
//! prefix range, so partitions that align with the caller's lookups keep
//! reads single-key.
//!
//! # Quick start
//!
//! ```no_run
//! use quarry_store::{Options, Store, TransactionParams};
//! use quarry_core::{PatchOp, Path};
//!
//! fn main() -> quarry_core::Result<()> {
//!     let store = Store::open(
//!         Options::new("./data").with_partition(Path::parse("/tenants/*")?),
//!     )?;
//!
//!     let mut txn = store.transaction(TransactionParams::write())?;
//!     txn.write(
//!         PatchOp::Add,
//!         &Path::parse("/tenants/acme")?,
//!         serde_json::json!({"tier": "gold"}),
//!     )?;
//!     txn.commit()?;
//!
//!     let txn = store.transaction(TransactionParams::read())?;
//!     let value = txn.read(&Path::parse("/tenants/acme/tier")?)?;
//!     assert_eq!(value, serde_json::json!("gold"));
//!     store.abort(txn);
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! Many readers, one writer. Read transactions observe the snapshot taken
//! when they open; the committing writer briefly excludes readers while it
//! dispatches post-commit triggers, so every trigger sees exactly the
//! committed state.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod backend;
pub mod config;
pub mod context;
mod diagnostics;
mod gc;
mod mapper;
mod metadata;
mod partition;
mod stats;
pub mod store;
pub mod trigger;
pub mod txn;

pub use config::{DurabilityMode, Options};
pub use context::{CancelToken, Context};
pub use stats::StatsSnapshot;
pub use store::Store;
pub use trigger::{DataChange, PolicyChange, TriggerConfig, TriggerEvent, TriggerHandle};
pub use txn::{Transaction, TransactionParams};
