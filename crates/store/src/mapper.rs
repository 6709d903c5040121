//! Bijection between logical paths and engine keys.
//!
//! Every persisted key starts with `/<schema_version>/<partition_version>/
//! <kind>` where `<kind>` is `data` or `policies`. Path segments (and policy
//! ids) percent-escape `%` and `/`, so a segment containing a separator
//! cannot collide with a deeper path and the inverse mapping is exact.
//!
//! `data_prefix_to_key` appends a trailing `/`, which makes the resulting
//! byte prefix cover every strict descendant of a path and nothing else: the
//! path's own key (no trailing slash) and sibling keys sharing a name prefix
//! (`/tenants` vs `/tenantsfoo`) both fall outside it.

use quarry_core::{Path, Result, StoreError};

#[derive(Debug)]
pub(crate) struct PathMapper {
    data_prefix: String,
    policies_prefix: String,
}

impl PathMapper {
    pub fn new(schema_version: i64, partition_version: i64) -> Self {
        PathMapper {
            data_prefix: format!("/{schema_version}/{partition_version}/data"),
            policies_prefix: format!("/{schema_version}/{partition_version}/policies/"),
        }
    }

    /// The exact key storing the value rooted at `path`.
    pub fn data_path_to_key(&self, path: &Path) -> Vec<u8> {
        let mut key = self.data_prefix.clone();
        for seg in path.iter() {
            key.push('/');
            key.push_str(&escape(seg));
        }
        key.into_bytes()
    }

    /// The shortest byte prefix covering every key strictly under `path`.
    pub fn data_prefix_to_key(&self, path: &Path) -> Vec<u8> {
        let mut key = self.data_path_to_key(path);
        key.push(b'/');
        key
    }

    /// Recover the logical path from a data key.
    pub fn data_key_to_path(&self, key: &[u8]) -> Result<Path> {
        let text = std::str::from_utf8(key)
            .map_err(|_| StoreError::internal("malformed data key: not utf-8"))?;
        let rest = text.strip_prefix(self.data_prefix.as_str()).ok_or_else(|| {
            StoreError::internal(format!("malformed data key {text:?}: wrong prefix"))
        })?;
        if rest.is_empty() {
            return Ok(Path::root());
        }
        let rest = rest.strip_prefix('/').ok_or_else(|| {
            StoreError::internal(format!("malformed data key {text:?}: wrong prefix"))
        })?;
        let segments = rest.split('/').map(unescape).collect();
        Ok(Path::new(segments))
    }

    /// The key storing the policy with the given id.
    pub fn policy_id_to_key(&self, id: &str) -> Vec<u8> {
        let mut key = self.policies_prefix.clone();
        key.push_str(&escape(id));
        key.into_bytes()
    }

    /// Recover a policy id from its key.
    pub fn policy_key_to_id(&self, key: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(key)
            .map_err(|_| StoreError::internal("malformed policy key: not utf-8"))?;
        let rest = text
            .strip_prefix(self.policies_prefix.as_str())
            .ok_or_else(|| {
                StoreError::internal(format!("malformed policy key {text:?}: wrong prefix"))
            })?;
        Ok(unescape(rest))
    }

    /// Byte prefix shared by every policy key.
    pub fn policy_prefix(&self) -> &[u8] {
        self.policies_prefix.as_bytes()
    }
}

fn escape(segment: &str) -> String {
    segment.replace('%', "%25").replace('/', "%2F")
}

fn unescape(segment: &str) -> String {
    segment.replace("%2F", "/").replace("%25", "%")
}
