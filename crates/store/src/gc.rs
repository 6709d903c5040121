//! Background compaction driver.
//!
//! A dedicated thread ticks at the configured interval and runs engine
//! compaction passes until the engine reports no further progress. Shutdown
//! is signalled through an atomic flag checked at sub-second granularity so
//! close never waits out a full interval.

use crate::backend::Backend;
use crate::stats::StoreStats;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

pub(crate) struct CompactionDriver {
    shutdown: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for CompactionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompactionDriver").finish_non_exhaustive()
    }
}

impl CompactionDriver {
    pub fn start(backend: Arc<Backend>, interval: Duration, stats: Arc<StoreStats>) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("quarry-compaction".to_string())
            .spawn(move || run(&backend, interval, &stats, &flag))
            .expect("failed to spawn compaction thread");
        CompactionDriver {
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Signal the driver to stop and join its thread. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

fn run(backend: &Backend, interval: Duration, stats: &StoreStats, shutdown: &AtomicBool) {
    loop {
        // Sleep in small steps so shutdown is observed promptly.
        let step = Duration::from_millis(100).min(interval);
        let mut elapsed = Duration::ZERO;
        while elapsed < interval {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            thread::sleep(step);
            elapsed += step;
        }

        let mut passes = 0u64;
        while backend.compact() {
            stats.record_compaction_pass();
            passes += 1;
        }
        if passes > 0 {
            debug!(passes, "compaction reclaimed space");
        }
    }
}
