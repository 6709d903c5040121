//! Embedded key-value engine adapter.
//!
//! Everything the store needs from the engine goes through this module:
//! ordered byte keys, snapshot-isolated read transactions, a single
//! serializable writer, atomic commit, prefix iteration, and a compaction
//! entry point that reports whether it made progress. Nothing outside this
//! file names the engine.
//!
//! The database handle sits behind a reader-writer lock because compaction
//! needs exclusive access to the handle; transaction creation takes a read
//! share only for the duration of the call, so compaction never blocks
//! in-flight transactions (it simply reports no progress while any are
//! open).

use crate::config::{DurabilityMode, Options};
use crate::context::Context;
use parking_lot::RwLock;
use quarry_core::{Result, StoreError};
use redb::{
    Database, Durability, ReadTransaction, ReadableTable, TableDefinition, WriteTransaction,
};
use tracing::debug;

const KEYSPACE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("keyspace");

#[derive(Debug)]
pub(crate) struct Backend {
    db: RwLock<Database>,
    durability: DurabilityMode,
}

impl Backend {
    /// Open (or create) the engine files under `<dir>/data`.
    pub fn open(opts: &Options) -> Result<Self> {
        let dir = opts.dir.join("data");
        std::fs::create_dir_all(&dir)
            .map_err(|e| StoreError::internal(format!("create {}: {e}", dir.display())))?;

        let mut builder = Database::builder();
        if let Some(bytes) = opts.cache_bytes {
            builder.set_cache_size(bytes);
        }
        let db = builder
            .create(dir.join("quarry.redb"))
            .map_err(StoreError::engine)?;

        // Materialize the table so read transactions opened before the first
        // write can see it.
        let txn = db.begin_write().map_err(StoreError::engine)?;
        txn.open_table(KEYSPACE).map_err(StoreError::engine)?;
        txn.commit().map_err(StoreError::engine)?;

        Ok(Backend {
            db: RwLock::new(db),
            durability: opts.durability,
        })
    }

    pub fn begin_read(&self) -> Result<EngineSession> {
        let txn = self.db.read().begin_read().map_err(StoreError::engine)?;
        Ok(EngineSession::Read(txn))
    }

    pub fn begin_write(&self) -> Result<EngineSession> {
        let mut txn = self.db.read().begin_write().map_err(StoreError::engine)?;
        if self.durability == DurabilityMode::Standard {
            txn.set_durability(Durability::Eventual);
        }
        Ok(EngineSession::Write(txn))
    }

    /// Run one compaction pass. Returns true when space was reclaimed.
    ///
    /// The engine refuses to compact while transactions are open; that is
    /// reported as no progress so the background driver backs off until the
    /// next tick.
    pub fn compact(&self) -> bool {
        let mut db = self.db.write();
        match db.compact() {
            Ok(progress) => progress,
            Err(err) => {
                debug!("compaction pass skipped: {err}");
                false
            }
        }
    }
}

/// One engine transaction, read or write.
///
/// Write sessions see their own mutations; read sessions observe the
/// snapshot taken when they were opened.
pub(crate) enum EngineSession {
    Read(ReadTransaction),
    Write(WriteTransaction),
}

impl EngineSession {
    pub fn is_write(&self) -> bool {
        matches!(self, EngineSession::Write(_))
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self {
            EngineSession::Read(txn) => {
                let table = txn.open_table(KEYSPACE).map_err(StoreError::engine)?;
                let found = table.get(key).map_err(StoreError::engine)?;
                Ok(found.map(|guard| guard.value().to_vec()))
            }
            EngineSession::Write(txn) => {
                let table = txn.open_table(KEYSPACE).map_err(StoreError::engine)?;
                let found = table.get(key).map_err(StoreError::engine)?;
                Ok(found.map(|guard| guard.value().to_vec()))
            }
        }
    }

    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let EngineSession::Write(txn) = self else {
            return Err(StoreError::internal("set on a read-only engine session"));
        };
        let mut table = txn.open_table(KEYSPACE).map_err(StoreError::engine)?;
        table.insert(key, value).map_err(StoreError::engine)?;
        Ok(())
    }

    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let EngineSession::Write(txn) = self else {
            return Err(StoreError::internal("delete on a read-only engine session"));
        };
        let mut table = txn.open_table(KEYSPACE).map_err(StoreError::engine)?;
        table.remove(key).map_err(StoreError::engine)?;
        Ok(())
    }

    /// Visit every `(key, value)` whose key starts with `prefix`, in key
    /// order. The visitor returns `Ok(false)` to stop early. The context is
    /// checked between steps; cancellation fails the scan with `Cancelled`.
    pub fn scan_prefix<F>(&self, prefix: &[u8], ctx: &Context, visit: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<bool>,
    {
        match self {
            EngineSession::Read(txn) => {
                let table = txn.open_table(KEYSPACE).map_err(StoreError::engine)?;
                scan_table(&table, prefix, ctx, visit)
            }
            EngineSession::Write(txn) => {
                let table = txn.open_table(KEYSPACE).map_err(StoreError::engine)?;
                scan_table(&table, prefix, ctx, visit)
            }
        }
    }

    /// Commit this session. Read sessions just release their snapshot.
    pub fn commit(self) -> Result<()> {
        match self {
            EngineSession::Read(_) => Ok(()),
            EngineSession::Write(txn) => txn.commit().map_err(StoreError::engine),
        }
    }

    /// Discard this session. Dropping has the same effect; this form exists
    /// for explicit call sites.
    pub fn abort(self) {
        match self {
            EngineSession::Read(_) => {}
            EngineSession::Write(txn) => {
                let _ = txn.abort();
            }
        }
    }
}

fn scan_table<T, F>(table: &T, prefix: &[u8], ctx: &Context, mut visit: F) -> Result<()>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
    F: FnMut(&[u8], &[u8]) -> Result<bool>,
{
    let upper = prefix_upper_bound(prefix);
    let range = match &upper {
        Some(hi) => table.range(prefix..hi.as_slice()),
        None => table.range(prefix..),
    }
    .map_err(StoreError::engine)?;

    for entry in range {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let (key, value) = entry.map_err(StoreError::engine)?;
        if !visit(key.value(), value.value())? {
            break;
        }
    }
    Ok(())
}

/// Smallest byte string greater than every key starting with `prefix`, or
/// `None` when no such bound exists (all trailing `0xff`).
fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last < 0xff {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}
