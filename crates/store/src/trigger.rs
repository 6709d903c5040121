//! Post-commit triggers.
//!
//! Triggers are registered under a write transaction and dispatched after
//! each successful write commit with a read-only transaction that observes
//! exactly the committed state. Dispatch order is unspecified; delivery is
//! at most once per commit. Callback errors are logged and never roll back
//! the commit.

use crate::context::Context;
use crate::txn::Transaction;
use quarry_core::{Path, Result};

/// Callback invoked after a successful write commit.
///
/// The supplied transaction is read-only; callbacks must not write and must
/// not register further triggers.
pub type OnCommit = Box<dyn Fn(&Transaction<'_>, &TriggerEvent) -> Result<()> + Send + Sync>;

/// Trigger registration parameters.
pub struct TriggerConfig {
    /// The callback to dispatch on commit.
    pub on_commit: OnCommit,
}

impl std::fmt::Debug for TriggerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerConfig").finish_non_exhaustive()
    }
}

/// One staged data mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChange {
    /// Path the write targeted.
    pub path: Path,
    /// True for removals.
    pub removed: bool,
}

/// One staged policy mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyChange {
    /// Policy identifier.
    pub id: String,
    /// True for deletions.
    pub removed: bool,
}

/// Summary of a committed write transaction.
///
/// The change lists carry what the write path staged; they are best-effort
/// and carry no per-path granularity guarantee beyond that. The boolean
/// accessors are always accurate.
#[derive(Debug, Default)]
pub struct TriggerEvent {
    /// The committing transaction's caller context.
    pub context: Context,
    /// Staged data mutations, in operation order.
    pub data: Vec<DataChange>,
    /// Staged policy mutations, in operation order.
    pub policy: Vec<PolicyChange>,
}

impl TriggerEvent {
    /// True if the commit touched the data document.
    pub fn data_changed(&self) -> bool {
        !self.data.is_empty()
    }

    /// True if the commit touched the policy collection.
    pub fn policy_changed(&self) -> bool {
        !self.policy.is_empty()
    }
}

/// Opaque handle naming a registered trigger.
///
/// Pass it back to [`Store::unregister_trigger`](crate::Store::unregister_trigger)
/// under a write transaction to remove the registration.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TriggerHandle {
    pub(crate) id: u64,
}
