//! Persisted store metadata and partition-layout compatibility checks.
//!
//! A single reserved key (outside the versioned keyspace) records the schema
//! version, the partition layout version, and the partition list that the
//! persisted keys were written under. On open, the schema version must match
//! exactly and the partition layout may only evolve additively: removing a
//! partition, or adding one where unpartitioned data already exists, would
//! strand keys written under the old layout.

use crate::backend::EngineSession;
use crate::mapper::PathMapper;
use crate::partition::PathSet;
use quarry_core::{Path, Result, StoreError};
use serde::{Deserialize, Serialize};

/// Reserved key holding the metadata record.
pub(crate) const METADATA_KEY: &[u8] = b"metadata";

/// Version of the physical key layout understood by this implementation.
pub(crate) const SUPPORTED_SCHEMA_VERSION: i64 = 1;

/// Version of the caller-supplied partition layout.
pub(crate) const BASE_PARTITION_VERSION: i64 = 1;

/// The always-present partition covering `/system`; no user partition may
/// overlap it.
pub(crate) const SYSTEM_PARTITION: &str = "/system/*";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Metadata {
    pub schema_version: i64,
    pub partition_version: i64,
    pub partitions: Vec<Path>,
}

pub(crate) fn load(session: &EngineSession) -> Result<Option<Metadata>> {
    match session.get(METADATA_KEY)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub(crate) fn store(session: &EngineSession, metadata: &Metadata) -> Result<()> {
    session.set(METADATA_KEY, &serde_json::to_vec(metadata)?)
}

/// Reject backwards-incompatible partition changes.
///
/// Removed partitions are always incompatible. Added partitions are probed
/// at every path prefix, longest first; an existing key at any prefix means
/// the new partition would split a value currently stored as a single blob.
/// Wildcard segments probe as the literal `*`, which no data key can carry.
pub(crate) fn validate_partitions(
    session: &EngineSession,
    mapper: &PathMapper,
    existing: &Metadata,
    partitions: &PathSet,
) -> Result<()> {
    let old = PathSet::new(existing.partitions.clone());
    let removed = old.diff(partitions);
    if !removed.is_empty() {
        return Err(StoreError::internal(format!(
            "partitions are backwards incompatible (removed: {})",
            join(&removed)
        )));
    }

    for added in partitions.to_vec() {
        if old.contains(&added) {
            continue;
        }
        for i in (1..=added.len()).rev() {
            let probe = added.prefix(i);
            let key = mapper.data_path_to_key(&probe);
            if session.get(&key)?.is_some() {
                return Err(StoreError::internal(format!(
                    "partitions are backwards incompatible (existing data: {probe})"
                )));
            }
        }
    }

    Ok(())
}

fn join(paths: &[Path]) -> String {
    paths
        .iter()
        .map(Path::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
