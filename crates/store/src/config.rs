//! Store configuration.

use quarry_core::Path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How eagerly committed data reaches stable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityMode {
    /// Batched sync. Commits are atomic but the last moments before a crash
    /// may be lost.
    Standard,
    /// Sync on every commit.
    Always,
}

impl Default for DurabilityMode {
    fn default() -> Self {
        DurabilityMode::Always
    }
}

/// Parameters for [`Store::open`](crate::Store::open).
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory the store owns. Engine files live under `<dir>/data`, which
    /// leaves room for sibling files (backups, exports) later.
    pub dir: PathBuf,
    /// Partition patterns controlling how the document tree is sharded into
    /// keys. `*` segments match any single segment. `/system/*` is reserved
    /// and appended automatically.
    pub partitions: Vec<Path>,
    /// Engine cache budget in bytes; `None` uses the engine default.
    pub cache_bytes: Option<usize>,
    /// Commit durability.
    pub durability: DurabilityMode,
    /// Interval between background compaction passes.
    pub compaction_interval: Duration,
}

impl Options {
    /// Options with defaults for everything but the directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Options {
            dir: dir.into(),
            partitions: Vec::new(),
            cache_bytes: None,
            durability: DurabilityMode::default(),
            compaction_interval: Duration::from_secs(60),
        }
    }

    /// Replace the partition list.
    pub fn with_partitions(mut self, partitions: Vec<Path>) -> Self {
        self.partitions = partitions;
        self
    }

    /// Append one partition pattern.
    pub fn with_partition(mut self, partition: Path) -> Self {
        self.partitions.push(partition);
        self
    }

    /// Set the engine cache budget.
    pub fn with_cache_bytes(mut self, bytes: usize) -> Self {
        self.cache_bytes = Some(bytes);
        self
    }

    /// Set the commit durability mode.
    pub fn with_durability(mut self, durability: DurabilityMode) -> Self {
        self.durability = durability;
        self
    }

    /// Set the background compaction interval.
    pub fn with_compaction_interval(mut self, interval: Duration) -> Self {
        self.compaction_interval = interval;
        self
    }
}
