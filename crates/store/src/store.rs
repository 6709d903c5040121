//! Store lifecycle and concurrency coordination.
//!
//! The store owns the engine, the path mapper, the partition trie, and the
//! trigger registry. Concurrency follows a single-writer regime:
//!
//! - a writer mutex serializes write transactions end to end;
//! - a reader-writer lock hands each read transaction a share; the
//!   committing writer takes it exclusively for the trigger-dispatch window,
//!   which waits out in-flight readers;
//! - the engine provides snapshot isolation beneath both.
//!
//! Trigger callbacks run inside the commit critical section against a fresh
//! read-only transaction, so each registered trigger observes exactly the
//! committed state, at most once per commit.

use crate::backend::Backend;
use crate::config::Options;
use crate::context::Context;
use crate::diagnostics;
use crate::gc::CompactionDriver;
use crate::mapper::PathMapper;
use crate::metadata::{
    self, Metadata, BASE_PARTITION_VERSION, SUPPORTED_SCHEMA_VERSION, SYSTEM_PARTITION,
};
use crate::partition::{PartitionTrie, PathSet};
use crate::stats::{StatsSnapshot, StoreStats};
use crate::trigger::{TriggerConfig, TriggerEvent, TriggerHandle};
use crate::txn::{Transaction, TransactionParams, TxnLock};
use parking_lot::{Mutex, RwLock};
use quarry_core::{Path, Result, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// A partitioned, transactional, disk-backed document store.
///
/// Created by [`Store::open`]; shared by reference across threads. All data
/// access goes through [`Transaction`]s obtained from
/// [`transaction`](Store::transaction).
#[derive(Debug)]
pub struct Store {
    pub(crate) backend: Arc<Backend>,
    pub(crate) mapper: PathMapper,
    pub(crate) partitions: PartitionTrie,
    pub(crate) stats: Arc<StoreStats>,
    partition_list: PathSet,
    xid: AtomicU64,
    handle_ids: AtomicU64,
    writer: Mutex<()>,
    readers: RwLock<()>,
    triggers: Mutex<HashMap<u64, TriggerConfig>>,
    compactor: CompactionDriver,
    closed: AtomicBool,
}

impl Store {
    /// Open (or create) a store in `opts.dir`.
    ///
    /// Fails with `Internal` on overlapping partitions, a schema version
    /// mismatch, or a backwards-incompatible partition change relative to
    /// the persisted layout (see the metadata module).
    pub fn open(opts: Options) -> Result<Store> {
        let mut partitions = PathSet::new(opts.partitions.clone());
        if !partitions.is_disjoint() {
            return Err(StoreError::internal(format!(
                "partitions are overlapped: {}",
                join(&partitions.to_vec())
            )));
        }
        partitions.push(Path::parse(SYSTEM_PARTITION)?);
        if !partitions.is_disjoint() {
            return Err(StoreError::internal(format!(
                "system partitions are managed: {}",
                join(&partitions.to_vec())
            )));
        }

        let backend = Arc::new(Backend::open(&opts)?);

        let session = backend.begin_write()?;
        let existing = metadata::load(&session)?;
        if let Some(meta) = &existing {
            if meta.schema_version != SUPPORTED_SCHEMA_VERSION {
                return Err(StoreError::internal(format!(
                    "unsupported schema version: {} (want {SUPPORTED_SCHEMA_VERSION})",
                    meta.schema_version
                )));
            }
        }
        let mapper = match &existing {
            Some(meta) => PathMapper::new(meta.schema_version, meta.partition_version),
            None => PathMapper::new(SUPPORTED_SCHEMA_VERSION, BASE_PARTITION_VERSION),
        };
        if let Some(meta) = &existing {
            metadata::validate_partitions(&session, &mapper, meta, &partitions)?;
        }
        metadata::store(
            &session,
            &Metadata {
                schema_version: SUPPORTED_SCHEMA_VERSION,
                partition_version: BASE_PARTITION_VERSION,
                partitions: partitions.to_vec(),
            },
        )?;
        session.commit()?;

        let stats = Arc::new(StoreStats::default());
        let compactor = CompactionDriver::start(
            Arc::clone(&backend),
            opts.compaction_interval,
            Arc::clone(&stats),
        );

        let store = Store {
            partitions: PartitionTrie::build(&partitions),
            mapper,
            stats,
            partition_list: partitions,
            backend,
            xid: AtomicU64::new(0),
            handle_ids: AtomicU64::new(0),
            writer: Mutex::new(()),
            readers: RwLock::new(()),
            triggers: Mutex::new(HashMap::new()),
            compactor,
            closed: AtomicBool::new(false),
        };

        diagnostics::log_partition_statistics(
            &store.backend,
            &store.mapper,
            &store.partition_list,
        )?;
        info!(dir = %opts.dir.display(), "store opened");
        Ok(store)
    }

    /// Open a transaction.
    ///
    /// Write transactions queue on the writer mutex; read transactions take
    /// a reader share and observe the snapshot current at this call.
    pub fn transaction(&self, params: TransactionParams) -> Result<Transaction<'_>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::internal("store is closed"));
        }
        let id = self.next_id();
        self.stats.record_transaction();
        let (lock, session) = if params.write {
            let guard = self.writer.lock();
            (TxnLock::Write(guard), self.backend.begin_write()?)
        } else {
            let guard = self.readers.read();
            (TxnLock::Read(guard), self.backend.begin_read()?)
        };
        trace!(txn = id, write = params.write, "transaction opened");
        Ok(Transaction::new(self, id, params.context, session, lock))
    }

    /// Commit a transaction.
    ///
    /// For a write transaction this flushes the staged mutations atomically,
    /// then dispatches registered triggers against a fresh read-only
    /// transaction while readers are held out. Committing a read transaction
    /// just releases its snapshot.
    pub fn commit(&self, txn: Transaction<'_>) -> Result<()> {
        if !txn.same_store(self) {
            return Err(StoreError::invalid_transaction("unknown transaction"));
        }
        if !txn.is_write() {
            drop(txn);
            return Ok(());
        }

        let excl = self.readers.write();
        let (session, lock, changes, context, id) = txn.into_parts();
        session.commit()?;
        self.stats.record_commit();
        debug!(txn = id, "commit");

        let event = TriggerEvent {
            context: context.clone(),
            data: changes.data,
            policy: changes.policy,
        };
        self.dispatch_triggers(context, &event);

        drop(excl);
        drop(lock);
        Ok(())
    }

    fn dispatch_triggers(&self, context: Context, event: &TriggerEvent) {
        let triggers = self.triggers.lock();
        if triggers.is_empty() {
            return;
        }
        let session = match self.backend.begin_read() {
            Ok(session) => session,
            Err(err) => {
                warn!("trigger dispatch skipped: {err}");
                return;
            }
        };
        // The exclusive reader lock is already held; this transaction runs
        // under it rather than taking its own share.
        let read_txn = Transaction::new(self, self.next_id(), context, session, TxnLock::None);
        for config in triggers.values() {
            self.stats.record_trigger();
            if let Err(err) = (config.on_commit)(&read_txn, event) {
                warn!("trigger callback failed: {err}");
            }
        }
    }

    /// Abort a transaction, discarding staged work and releasing its locks.
    /// Dropping the transaction has the same effect.
    ///
    /// # Panics
    ///
    /// Panics if the transaction belongs to a different store, mirroring
    /// the ownership check [`commit`](Store::commit) reports as an error.
    pub fn abort(&self, txn: Transaction<'_>) {
        if !txn.same_store(self) {
            panic!("invalid transaction: unknown transaction");
        }
        self.stats.record_abort();
        let (session, lock, _changes, _context, id) = txn.into_parts();
        session.abort();
        drop(lock);
        trace!(txn = id, "abort");
    }

    /// Register a post-commit trigger. Requires a write transaction.
    pub fn register_trigger(
        &self,
        txn: &Transaction<'_>,
        config: TriggerConfig,
    ) -> Result<TriggerHandle> {
        if !txn.same_store(self) {
            return Err(StoreError::invalid_transaction("unknown transaction"));
        }
        if !txn.is_write() {
            return Err(StoreError::invalid_transaction(
                "triggers must be registered with a write transaction",
            ));
        }
        let id = self.handle_ids.fetch_add(1, Ordering::Relaxed) + 1;
        self.triggers.lock().insert(id, config);
        Ok(TriggerHandle { id })
    }

    /// Remove a trigger registration. Requires a write transaction.
    pub fn unregister_trigger(&self, txn: &Transaction<'_>, handle: TriggerHandle) -> Result<()> {
        if !txn.same_store(self) {
            return Err(StoreError::invalid_transaction("unknown transaction"));
        }
        if !txn.is_write() {
            return Err(StoreError::invalid_transaction(
                "triggers must be unregistered with a write transaction",
            ));
        }
        self.triggers.lock().remove(&handle.id);
        Ok(())
    }

    pub(crate) fn has_triggers(&self) -> bool {
        !self.triggers.lock().is_empty()
    }

    /// The partition patterns in effect, including the reserved
    /// `/system/*` partition.
    pub fn partition_patterns(&self) -> Vec<Path> {
        self.partition_list.to_vec()
    }

    /// Point-in-time operation counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop the background compaction driver and drain in-flight
    /// transactions. Idempotent; further transactions fail.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.compactor.shutdown();
        let _writer = self.writer.lock();
        let _readers = self.readers.write();
        info!("store closed");
    }

    fn next_id(&self) -> u64 {
        self.xid.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.close();
    }
}

fn join(paths: &[Path]) -> String {
    paths
        .iter()
        .map(Path::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
