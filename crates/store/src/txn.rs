//! Transactions over the partitioned keyspace.
//!
//! A transaction projects logical paths onto engine keys through the
//! store's partition trie and path mapper:
//!
//! - paths at or below a split point resolve to a single key; a remaining
//!   suffix is navigated (reads) or patched (writes) inside the decoded
//!   value;
//! - paths at or above the split frontier fan out: reads reconstruct the
//!   subtree from the prefix range (merging any value stored at the path's
//!   own key), writes replace the subtree and push the new value down to
//!   the frontier.
//!
//! Write transactions see their own mutations; read transactions observe
//! the snapshot taken at open. Commit and abort consume the transaction, so
//! a finished transaction cannot be reused.

use crate::backend::EngineSession;
use crate::context::Context;
use crate::store::Store;
use crate::trigger::{DataChange, PolicyChange};
use parking_lot::{MutexGuard, RwLockReadGuard};
use quarry_core::value::{apply_patch, insert_at, roundtrip, value_at};
use quarry_core::{PatchOp, Path, Result, StoreError, Value};
use serde_json::Map;
use tracing::trace;

/// Parameters for [`Store::transaction`].
#[derive(Debug, Clone, Default)]
pub struct TransactionParams {
    /// Open a write transaction. At most one write transaction runs at a
    /// time; readers are unaffected until it commits.
    pub write: bool,
    /// Caller context; carried into trigger events and honored during long
    /// scans.
    pub context: Context,
}

impl TransactionParams {
    /// Parameters for a read transaction.
    pub fn read() -> Self {
        TransactionParams::default()
    }

    /// Parameters for a write transaction.
    pub fn write() -> Self {
        TransactionParams {
            write: true,
            context: Context::default(),
        }
    }

    /// Attach a caller context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

/// The concurrency-coordination guard a transaction holds for its lifetime.
pub(crate) enum TxnLock<'s> {
    Write(#[allow(dead_code)] MutexGuard<'s, ()>),
    Read(#[allow(dead_code)] RwLockReadGuard<'s, ()>),
    /// Trigger-dispatch transactions run under the committing writer's
    /// exclusive lock and hold nothing themselves.
    None,
}

#[derive(Default)]
pub(crate) struct ChangeLog {
    pub data: Vec<DataChange>,
    pub policy: Vec<PolicyChange>,
}

/// A transaction handle. Obtained from [`Store::transaction`]; finished by
/// [`commit`](Transaction::commit) or [`abort`](Transaction::abort) (or by
/// dropping, which aborts).
pub struct Transaction<'s> {
    store: &'s Store,
    id: u64,
    context: Context,
    session: EngineSession,
    lock: TxnLock<'s>,
    changes: ChangeLog,
}

impl<'s> Transaction<'s> {
    pub(crate) fn new(
        store: &'s Store,
        id: u64,
        context: Context,
        session: EngineSession,
        lock: TxnLock<'s>,
    ) -> Self {
        Transaction {
            store,
            id,
            context,
            session,
            lock,
            changes: ChangeLog::default(),
        }
    }

    /// The transaction's store-unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True for write transactions.
    pub fn is_write(&self) -> bool {
        self.session.is_write()
    }

    /// The caller context this transaction runs under.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub(crate) fn same_store(&self, store: &Store) -> bool {
        std::ptr::eq(self.store, store)
    }

    pub(crate) fn into_parts(self) -> (EngineSession, TxnLock<'s>, ChangeLog, Context, u64) {
        (self.session, self.lock, self.changes, self.context, self.id)
    }

    /// Commit through the owning store. Equivalent to `store.commit(txn)`.
    pub fn commit(self) -> Result<()> {
        let store = self.store;
        store.commit(self)
    }

    /// Abort through the owning store. Equivalent to `store.abort(txn)`.
    pub fn abort(self) {
        let store = self.store;
        store.abort(self);
    }

    fn ensure_write(&self, operation: &str) -> Result<()> {
        if self.is_write() {
            return Ok(());
        }
        Err(StoreError::invalid_transaction(format!(
            "{operation} requires a write transaction"
        )))
    }

    // ------------------------------------------------------------------
    // Data operations
    // ------------------------------------------------------------------

    /// Read the value at `path`.
    ///
    /// Below the split frontier this is a single key lookup plus descent
    /// into the decoded value; at or above it, the subtree is reconstructed
    /// from every intersecting key. Returns `NotFound` when nothing is
    /// stored at or under the path.
    pub fn read(&self, path: &Path) -> Result<Value> {
        self.store.stats.record_read();
        let (depth, node) = self.store.partitions.find(path);
        if node.is_some() {
            return self.read_partition(path);
        }

        let key = self.store.mapper.data_path_to_key(&path.prefix(depth));
        let bytes = self
            .session
            .get(&key)?
            .ok_or_else(|| StoreError::not_found(path))?;
        let doc: Value = serde_json::from_slice(&bytes)?;
        match value_at(&doc, &path[depth..]) {
            Some(value) => Ok(value.clone()),
            None => Err(StoreError::not_found(path)),
        }
    }

    /// Reconstruct the subtree at a path on or above the split frontier.
    ///
    /// A value stored at the path's own key (a scalar written at a
    /// partition root) forms the base; every key strictly under the path is
    /// grafted in at its relative suffix.
    fn read_partition(&self, path: &Path) -> Result<Value> {
        let mut result: Option<Value> = None;

        let own = self.store.mapper.data_path_to_key(path);
        if let Some(bytes) = self.session.get(&own)? {
            result = Some(serde_json::from_slice(&bytes)?);
        }

        let prefix = self.store.mapper.data_prefix_to_key(path);
        let mapper = &self.store.mapper;
        self.session.scan_prefix(&prefix, &self.context, |key, bytes| {
            let key_path = mapper.data_key_to_path(key)?;
            let value: Value = serde_json::from_slice(bytes)?;
            let slot = result.get_or_insert_with(|| Value::Object(Map::new()));
            insert_at(slot, &key_path[path.len()..], value);
            Ok(true)
        })?;

        result.ok_or_else(|| StoreError::not_found(path))
    }

    /// Apply a patch operation at `path`.
    ///
    /// The value is round-tripped through JSON first, so unencodable input
    /// is rejected before any key is touched. For `Remove` the value is
    /// ignored. Writing a value at a path replaces the whole subtree under
    /// it; `Add` creates missing intermediate objects, `Replace` and
    /// `Remove` fail with `NotFound` when the target does not exist.
    pub fn write(&mut self, op: PatchOp, path: &Path, value: Value) -> Result<()> {
        self.ensure_write("write")?;
        let value = match op {
            PatchOp::Remove => Value::Null,
            _ => roundtrip(value)?,
        };
        self.store.stats.record_write();
        trace!(txn = self.id, %path, ?op, "write");
        self.apply_write(op, path, value)?;
        if self.store.has_triggers() {
            self.changes.data.push(DataChange {
                path: path.clone(),
                removed: op == PatchOp::Remove,
            });
        }
        Ok(())
    }

    /// No-op: intermediate objects are implicit in the path-as-key layout.
    /// Kept for parity with stores that need explicit directory creation;
    /// still requires a write transaction.
    pub fn make_dir(&self, _path: &Path) -> Result<()> {
        self.ensure_write("make_dir")
    }

    fn apply_write(&self, op: PatchOp, path: &Path, value: Value) -> Result<()> {
        let (depth, node) = self.store.partitions.find(path);
        if node.is_some() {
            self.write_partition(op, path, value)
        } else if depth == path.len() {
            self.write_key(op, path, value)
        } else {
            self.write_within(op, path, depth, value)
        }
    }

    /// The path resolves to exactly one key.
    fn write_key(&self, op: PatchOp, path: &Path, value: Value) -> Result<()> {
        let key = self.store.mapper.data_path_to_key(path);
        match op {
            PatchOp::Remove => {
                if self.session.get(&key)?.is_none() {
                    return Err(StoreError::not_found(path));
                }
                self.session.delete(&key)
            }
            PatchOp::Replace => {
                if self.session.get(&key)?.is_none() {
                    return Err(StoreError::not_found(path));
                }
                self.session.set(&key, &serde_json::to_vec(&value)?)
            }
            PatchOp::Add => self.session.set(&key, &serde_json::to_vec(&value)?),
        }
    }

    /// The path extends past its key: patch inside the stored value.
    fn write_within(&self, op: PatchOp, path: &Path, depth: usize, value: Value) -> Result<()> {
        let key = self.store.mapper.data_path_to_key(&path.prefix(depth));
        let mut doc = match self.session.get(&key)? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None if op == PatchOp::Add => Value::Object(Map::new()),
            None => return Err(StoreError::not_found(path)),
        };
        apply_patch(&mut doc, op, &path[depth..], value)?;
        self.session.set(&key, &serde_json::to_vec(&doc)?)
    }

    /// The path sits at or above the split frontier: replace the subtree.
    fn write_partition(&self, op: PatchOp, path: &Path, value: Value) -> Result<()> {
        if matches!(op, PatchOp::Replace | PatchOp::Remove) && !self.subtree_exists(path)? {
            return Err(StoreError::not_found(path));
        }
        self.delete_subtree(path)?;
        match op {
            PatchOp::Remove => Ok(()),
            PatchOp::Add | PatchOp::Replace => self.push_down(path, value),
        }
    }

    fn subtree_exists(&self, path: &Path) -> Result<bool> {
        if self
            .session
            .get(&self.store.mapper.data_path_to_key(path))?
            .is_some()
        {
            return Ok(true);
        }
        let mut found = false;
        let prefix = self.store.mapper.data_prefix_to_key(path);
        self.session.scan_prefix(&prefix, &self.context, |_, _| {
            found = true;
            Ok(false)
        })?;
        Ok(found)
    }

    /// Delete the key at `path` and every key strictly under it.
    fn delete_subtree(&self, path: &Path) -> Result<()> {
        self.session
            .delete(&self.store.mapper.data_path_to_key(path))?;
        let prefix = self.store.mapper.data_prefix_to_key(path);
        let mut keys = Vec::new();
        self.session.scan_prefix(&prefix, &self.context, |key, _| {
            keys.push(key.to_vec());
            Ok(true)
        })?;
        for key in &keys {
            self.session.delete(key)?;
        }
        Ok(())
    }

    /// Install `value` under `path`, splitting object fields until each
    /// piece crosses the frontier into its own key. Non-objects (and empty
    /// objects) at frontier paths land whole at the path's own key.
    fn push_down(&self, path: &Path, value: Value) -> Result<()> {
        let (_, node) = self.store.partitions.find(path);
        if node.is_some() {
            match value {
                Value::Object(fields) if !fields.is_empty() => {
                    for (name, sub) in fields {
                        self.push_down(&path.child(&name), sub)?;
                    }
                    Ok(())
                }
                other => self.put_value(path, &other),
            }
        } else {
            self.put_value(path, &value)
        }
    }

    fn put_value(&self, path: &Path, value: &Value) -> Result<()> {
        let key = self.store.mapper.data_path_to_key(path);
        self.session.set(&key, &serde_json::to_vec(value)?)
    }

    // ------------------------------------------------------------------
    // Policy operations
    // ------------------------------------------------------------------

    /// List the ids of all stored policies, in key order.
    pub fn list_policies(&self) -> Result<Vec<String>> {
        self.store.stats.record_policy_op();
        let mapper = &self.store.mapper;
        let mut ids = Vec::new();
        self.session
            .scan_prefix(mapper.policy_prefix(), &self.context, |key, _| {
                ids.push(mapper.policy_key_to_id(key)?);
                Ok(true)
            })?;
        Ok(ids)
    }

    /// Fetch a policy's bytes. `NotFound` for unknown ids.
    pub fn get_policy(&self, id: &str) -> Result<Vec<u8>> {
        self.store.stats.record_policy_op();
        let key = self.store.mapper.policy_id_to_key(id);
        self.session
            .get(&key)?
            .ok_or_else(|| StoreError::not_found(format!("policy {id:?}")))
    }

    /// Insert or overwrite a policy.
    pub fn upsert_policy(&mut self, id: &str, body: &[u8]) -> Result<()> {
        self.ensure_write("upsert_policy")?;
        self.store.stats.record_policy_op();
        let key = self.store.mapper.policy_id_to_key(id);
        self.session.set(&key, body)?;
        if self.store.has_triggers() {
            self.changes.policy.push(PolicyChange {
                id: id.to_string(),
                removed: false,
            });
        }
        Ok(())
    }

    /// Delete a policy. `NotFound` for unknown ids.
    pub fn delete_policy(&mut self, id: &str) -> Result<()> {
        self.ensure_write("delete_policy")?;
        self.store.stats.record_policy_op();
        let key = self.store.mapper.policy_id_to_key(id);
        if self.session.get(&key)?.is_none() {
            return Err(StoreError::not_found(format!("policy {id:?}")));
        }
        self.session.delete(&key)?;
        if self.store.has_triggers() {
            self.changes.policy.push(PolicyChange {
                id: id.to_string(),
                removed: true,
            });
        }
        Ok(())
    }
}
