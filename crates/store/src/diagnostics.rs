//! Per-partition keyspace statistics, logged at debug level on open.
//!
//! For literal partitions one line reports the key count and the estimated
//! on-disk size (key plus value length) under the partition prefix. For
//! wildcard patterns the counts are grouped per concrete match, so each
//! tenant-like subtree gets its own line. Nothing runs unless debug logging
//! is enabled.

use crate::backend::{Backend, EngineSession};
use crate::context::Context;
use crate::mapper::PathMapper;
use crate::partition::PathSet;
use quarry_core::{Path, Result};
use std::collections::BTreeMap;
use tracing::{debug, enabled, warn, Level};

pub(crate) fn log_partition_statistics(
    backend: &Backend,
    mapper: &PathMapper,
    partitions: &PathSet,
) -> Result<()> {
    if !enabled!(Level::DEBUG) {
        return Ok(());
    }
    let session = backend.begin_read()?;
    let ctx = Context::default();

    if partitions.len() == 1 {
        // Only the reserved /system/* partition is present.
        warn!("no partitions configured");
        log_prefix_statistics(&session, mapper, &Path::root(), &ctx)?;
    }
    for partition in partitions.iter() {
        match partition.wildcard_index() {
            Some(at) => log_wildcard_statistics(&session, mapper, partition, at, &ctx)?,
            None => log_prefix_statistics(&session, mapper, partition, &ctx)?,
        }
    }
    Ok(())
}

fn log_prefix_statistics(
    session: &EngineSession,
    mapper: &PathMapper,
    partition: &Path,
    ctx: &Context,
) -> Result<()> {
    let prefix = mapper.data_prefix_to_key(partition);
    let mut count = 0u64;
    let mut size = 0u64;
    session.scan_prefix(&prefix, ctx, |key, value| {
        count += 1;
        size += (key.len() + value.len()) as u64;
        Ok(true)
    })?;
    debug!("partition {partition}: key count: {count} (estimated size {size} bytes)");
    Ok(())
}

fn log_wildcard_statistics(
    session: &EngineSession,
    mapper: &PathMapper,
    partition: &Path,
    wildcard_at: usize,
    ctx: &Context,
) -> Result<()> {
    let prefix = mapper.data_prefix_to_key(&partition.prefix(wildcard_at));
    let mut groups: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    session.scan_prefix(&prefix, ctx, |key, value| {
        if let Ok(path) = mapper.data_key_to_path(key) {
            if path.matches_prefix(partition) {
                let concrete = path.prefix(partition.len());
                let entry = groups.entry(concrete.to_string()).or_default();
                entry.0 += 1;
                entry.1 += (key.len() + value.len()) as u64;
            }
        }
        Ok(true)
    })?;

    if groups.is_empty() {
        debug!("partition pattern {partition}: key count: 0 (estimated size 0 bytes)");
    }
    for (concrete, (count, size)) in &groups {
        debug!(
            "partition {concrete} (pattern {partition}): key count: {count} (estimated size {size} bytes)"
        );
    }
    Ok(())
}
