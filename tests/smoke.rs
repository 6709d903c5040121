//! Facade smoke test: the re-exported API is enough for the common
//! open → write → commit → read cycle.

use quarrydb::{Options, PatchOp, Path, Store, TransactionParams};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_end_to_end_through_facade() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(
        Options::new(dir.path()).with_partition(Path::parse("/tenants/*").unwrap()),
    )
    .unwrap();

    let mut txn = store.transaction(TransactionParams::write()).unwrap();
    txn.write(
        PatchOp::Add,
        &Path::parse("/tenants/acme").unwrap(),
        json!({"tier": "gold"}),
    )
    .unwrap();
    txn.upsert_policy("authz", b"package authz").unwrap();
    txn.commit().unwrap();

    let txn = store.transaction(TransactionParams::read()).unwrap();
    assert_eq!(
        txn.read(&Path::parse("/tenants/acme/tier").unwrap()).unwrap(),
        json!("gold")
    );
    assert_eq!(txn.get_policy("authz").unwrap(), b"package authz".to_vec());
    store.abort(txn);
    store.close();
}
