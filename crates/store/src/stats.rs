//! Operation counters.
//!
//! Cheap relaxed atomics, always on. [`StatsSnapshot`] is the point-in-time
//! view handed to callers; individual counters may be mid-update relative to
//! each other.

use std::sync::atomic::{AtomicU64, Ordering};

/// Internal counter block shared by the store and its background driver.
#[derive(Debug, Default)]
pub(crate) struct StoreStats {
    transactions: AtomicU64,
    commits: AtomicU64,
    aborts: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
    policy_ops: AtomicU64,
    triggers_dispatched: AtomicU64,
    compaction_passes: AtomicU64,
}

impl StoreStats {
    pub fn record_transaction(&self) {
        self.transactions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abort(&self) {
        self.aborts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_policy_op(&self) {
        self.policy_ops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_trigger(&self) {
        self.triggers_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_compaction_pass(&self) {
        self.compaction_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            transactions: self.transactions.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            aborts: self.aborts.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            policy_ops: self.policy_ops.load(Ordering::Relaxed),
            triggers_dispatched: self.triggers_dispatched.load(Ordering::Relaxed),
            compaction_passes: self.compaction_passes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the store's operation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Transactions allocated (read and write).
    pub transactions: u64,
    /// Write transactions committed.
    pub commits: u64,
    /// Transactions aborted.
    pub aborts: u64,
    /// `read` operations served.
    pub reads: u64,
    /// `write` operations applied.
    pub writes: u64,
    /// Policy operations (list/get/upsert/delete).
    pub policy_ops: u64,
    /// Trigger callbacks dispatched.
    pub triggers_dispatched: u64,
    /// Background compaction passes that reclaimed space.
    pub compaction_passes: u64,
}
