//! # QuarryDB
//!
//! A partitioned, transactional, disk-backed document store. QuarryDB
//! persists two kinds of artifacts on top of an embedded ordered key-value
//! engine:
//!
//! - **policies** — opaque byte blobs keyed by identifier;
//! - a **data document** — one JSON tree rooted at `/`.
//!
//! Caller-declared **partitions** control how the document tree is sharded
//! into individual keys. A partition pattern like `/tenants/*` stores each
//! value under a tenant at its own key, so lookups that align with the
//! pattern stay single-key while a read of `/tenants` reconstructs the full
//! map from the key range.
//!
//! # Quick start
//!
//! ```no_run
//! use quarrydb::{Options, PatchOp, Path, Store, TransactionParams};
//!
//! fn main() -> quarrydb::Result<()> {
//!     let store = Store::open(
//!         Options::new("./quarry-data").with_partition(Path::parse("/tenants/*")?),
//!     )?;
//!
//!     let mut txn = store.transaction(TransactionParams::write())?;
//!     txn.write(
//!         PatchOp::Add,
//!         &Path::parse("/tenants/acme")?,
//!         serde_json::json!({"tier": "gold"}),
//!     )?;
//!     txn.upsert_policy("authz", b"package authz\nallow = false")?;
//!     txn.commit()?;
//!
//!     let txn = store.transaction(TransactionParams::read())?;
//!     assert_eq!(
//!         txn.read(&Path::parse("/tenants/acme/tier")?)?,
//!         serde_json::json!("gold"),
//!     );
//!     store.abort(txn);
//!     store.close();
//!     Ok(())
//! }
//! ```
//!
//! # Guarantees
//!
//! - Writes within a transaction commit atomically; readers observe the
//!   snapshot current when their transaction opened.
//! - One writer at a time; readers never block it until the brief
//!   trigger-dispatch window at commit.
//! - Post-commit triggers observe exactly the committed state through a
//!   read-only transaction.
//! - The partition layout may evolve additively across restarts; changes
//!   that would strand persisted data are rejected at open.
//!
//! The implementation lives in the workspace crates; this crate re-exports
//! the public API surface.

pub use quarry_core::{
    apply_patch, insert_at, roundtrip, value_at, ErrorCode, PatchOp, Path, Result, StoreError,
    Value, WILDCARD,
};
pub use quarry_store::{
    CancelToken, Context, DataChange, DurabilityMode, Options, PolicyChange, StatsSnapshot, Store,
    Transaction, TransactionParams, TriggerConfig, TriggerEvent, TriggerHandle,
};
