//! Strongly-typed identifiers for segments and revisions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for [`VersionId`] allocation.
static VERSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Counter for [`RevisionId`] allocation.
static REVISION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifies one segment of the version DAG.
///
/// Allocated from a process-wide monotonic atomic counter at segment
/// creation via [`VersionId::next`]. Never reused: a versioned value's
/// entry for a given id is written, then erased, and never revisited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionId(u64);

impl VersionId {
    /// Allocate a fresh, unique version id.
    ///
    /// Each call returns a strictly larger id than every previous call
    /// within this process. Thread-safe.
    pub fn next() -> Self {
        Self(VERSION_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identifies a revision (one isolated execution context).
///
/// Only used for diagnostics, thread names, and error reporting; the
/// engine never orders revisions by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevisionId(u64);

impl RevisionId {
    /// Allocate a fresh, unique revision id. Thread-safe.
    pub fn next() -> Self {
        Self(REVISION_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}
