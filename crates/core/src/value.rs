//! JSON value plumbing: round-trip coercion, pointer navigation, and patch
//! application.
//!
//! Values are plain [`serde_json::Value`]s. The crate enables
//! `arbitrary_precision`, so numbers survive read/write round trips as their
//! exact JSON tokens, and the default sorted object map keeps reconstruction
//! output deterministic.

use crate::{Result, StoreError};
use serde_json::{Map, Value};

/// Patch operation kinds accepted by `Transaction::write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchOp {
    /// Insert or overwrite; creates missing intermediate objects.
    Add,
    /// Overwrite an existing value; fails if the target does not exist.
    Replace,
    /// Delete an existing value; fails if the target does not exist.
    Remove,
}

/// Coerce a value into canonical form by serializing and re-parsing it.
///
/// Unencodable values are rejected here, before any key is touched.
pub fn roundtrip(value: Value) -> Result<Value> {
    let bytes = serde_json::to_vec(&value)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Navigate `value` along `path`, treating numeric segments as sequence
/// indices. Returns `None` when the path leaves the value.
pub fn value_at<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = value;
    for seg in path {
        current = match current {
            Value::Object(map) => map.get(seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Graft `value` into `root` at `path`, creating intermediate objects and
/// overwriting anything in the way. Used when reconstructing a subtree from
/// multiple keys.
pub fn insert_at(root: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return;
    };
    let mut current = root;
    for seg in parents {
        current = ensure_object(current).entry(seg.clone()).or_insert(Value::Null);
    }
    ensure_object(current).insert(last.clone(), value);
}

fn ensure_object(slot: &mut Value) -> &mut Map<String, Value> {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just coerced to an object"),
    }
}

/// Apply a patch to `root` at `path` with JSON-patch semantics.
///
/// `Add` creates missing intermediate objects (the path-as-key layout makes
/// hierarchy implicit); `Replace` and `Remove` fail with `NotFound` when the
/// target or any intermediate step is missing. Sequence segments are
/// indices; for `Add`, the segment `-` appends.
pub fn apply_patch(root: &mut Value, op: PatchOp, path: &[String], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        return match op {
            PatchOp::Add | PatchOp::Replace => {
                *root = value;
                Ok(())
            }
            PatchOp::Remove => Err(StoreError::internal(
                "cannot remove the enclosing document in place",
            )),
        };
    };

    let parent = navigate_mut(root, parents, op == PatchOp::Add)?;
    match parent {
        Value::Object(map) => match op {
            PatchOp::Add => {
                map.insert(last.clone(), value);
                Ok(())
            }
            PatchOp::Replace => {
                if !map.contains_key(last) {
                    return Err(StoreError::not_found(display(path)));
                }
                map.insert(last.clone(), value);
                Ok(())
            }
            PatchOp::Remove => map
                .remove(last)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found(display(path))),
        },
        Value::Array(items) => match op {
            PatchOp::Add if last == "-" => {
                items.push(value);
                Ok(())
            }
            PatchOp::Add => {
                let idx = index(last, path)?;
                if idx > items.len() {
                    return Err(StoreError::not_found(display(path)));
                }
                items.insert(idx, value);
                Ok(())
            }
            PatchOp::Replace => {
                let idx = index(last, path)?;
                let slot = items
                    .get_mut(idx)
                    .ok_or_else(|| StoreError::not_found(display(path)))?;
                *slot = value;
                Ok(())
            }
            PatchOp::Remove => {
                let idx = index(last, path)?;
                if idx >= items.len() {
                    return Err(StoreError::not_found(display(path)));
                }
                items.remove(idx);
                Ok(())
            }
        },
        _ => Err(StoreError::not_found(display(path))),
    }
}

fn navigate_mut<'a>(
    root: &'a mut Value,
    path: &[String],
    create_missing: bool,
) -> Result<&'a mut Value> {
    let mut current = root;
    for (i, seg) in path.iter().enumerate() {
        current = match current {
            Value::Object(map) => {
                if create_missing && !map.contains_key(seg) {
                    map.insert(seg.clone(), Value::Object(Map::new()));
                }
                map.get_mut(seg)
                    .ok_or_else(|| StoreError::not_found(display(&path[..=i])))?
            }
            Value::Array(items) => {
                let idx = index(seg, &path[..=i])?;
                items
                    .get_mut(idx)
                    .ok_or_else(|| StoreError::not_found(display(&path[..=i])))?
            }
            _ => return Err(StoreError::not_found(display(&path[..=i]))),
        };
    }
    Ok(current)
}

fn index(seg: &str, path: &[String]) -> Result<usize> {
    seg.parse::<usize>()
        .map_err(|_| StoreError::not_found(display(path)))
}

fn display(path: &[String]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for seg in path {
        out.push('/');
        out.push_str(seg);
    }
    out
}
