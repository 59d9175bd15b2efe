//! Runtime counters and their point-in-time snapshot.
//!
//! [`RuntimeStats`] is shared by every revision and segment of one
//! [`Runtime`](crate::Runtime) and updated with relaxed atomics.
//! [`RuntimeMetrics`] is the plain snapshot handed to callers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a runtime's counters.
///
/// All counters are cumulative since the runtime was created, except
/// `live_segments`, which is the number of segments created and not yet
/// released or collapsed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeMetrics {
    /// Successful `fork()` calls.
    pub forks: u64,
    /// `fork()` calls that failed to spawn a worker thread.
    pub failed_forks: u64,
    /// Completed joins, including ones that reported a panic.
    pub joins: u64,
    /// Joins whose forked action panicked or whose merge failed.
    pub panicked_joins: u64,
    /// Revisions whose handle was dropped without a join.
    pub abandoned: u64,
    /// Merge results written into a joining revision.
    pub merges_applied: u64,
    /// Segments allocated.
    pub segments_created: u64,
    /// Segments torn down by reference-counted release.
    pub segments_released: u64,
    /// Segments folded away by collapse.
    pub segments_collapsed: u64,
    /// Segments currently alive in the version DAG.
    pub live_segments: u64,
}

/// Shared atomic counters behind [`RuntimeMetrics`].
#[derive(Debug, Default)]
pub(crate) struct RuntimeStats {
    forks: AtomicU64,
    failed_forks: AtomicU64,
    joins: AtomicU64,
    panicked_joins: AtomicU64,
    abandoned: AtomicU64,
    merges_applied: AtomicU64,
    segments_created: AtomicU64,
    segments_released: AtomicU64,
    segments_collapsed: AtomicU64,
}

// Compile-time assertion: RuntimeStats must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RuntimeStats>();
};

impl RuntimeStats {
    pub fn record_fork(&self) {
        self.forks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_fork(&self) {
        self.failed_forks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_join(&self, failed: bool) {
        self.joins.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.panicked_joins.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_merges(&self, count: u64) {
        self.merges_applied.fetch_add(count, Ordering::Relaxed);
    }

    pub fn segment_created(&self) {
        self.segments_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn segment_released(&self) {
        self.segments_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn segment_collapsed(&self) {
        self.segments_collapsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RuntimeMetrics {
        let created = self.segments_created.load(Ordering::Relaxed);
        let released = self.segments_released.load(Ordering::Relaxed);
        let collapsed = self.segments_collapsed.load(Ordering::Relaxed);
        RuntimeMetrics {
            forks: self.forks.load(Ordering::Relaxed),
            failed_forks: self.failed_forks.load(Ordering::Relaxed),
            joins: self.joins.load(Ordering::Relaxed),
            panicked_joins: self.panicked_joins.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            merges_applied: self.merges_applied.load(Ordering::Relaxed),
            segments_created: created,
            segments_released: released,
            segments_collapsed: collapsed,
            live_segments: created.saturating_sub(released + collapsed),
        }
    }
}
