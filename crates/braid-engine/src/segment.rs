//! Segments: the nodes of the version DAG.
//!
//! A [`Segment`] is the write destination of one revision between two
//! forks. It owns a fresh [`VersionId`], a logical reference count, a
//! link to its parent segment, and the set of versioned values written
//! under it.
//!
//! # Reference counting
//!
//! `refcount` counts live holders: revisions whose `current` points at
//! the segment, plus child segments whose parent link points at it.
//! Revision `root` pointers keep the allocation alive through `Arc` but
//! do not count. When the count reaches zero the segment's entries are
//! erased from every value it wrote and the parent loses one holder.
//!
//! # Logging
//!
//! - **TRACE** `braid::engine::segment`: `segment_released`: refcount hit zero
//! - **TRACE** `braid::engine::segment`: `segment_collapsed`: folded into the current segment

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use braid_core::VersionId;
use smallvec::SmallVec;
use tracing::trace;

use crate::metrics::RuntimeStats;
use crate::revision::Revision;
use crate::sync::lock;

/// A merge result computed during a join, applied once every merge
/// function for that join has returned.
pub(crate) type PendingMerge = Box<dyn FnOnce(&Arc<Segment>) + Send>;

/// Type-erased view of a versioned value, as stored in a segment's
/// written set.
pub(crate) trait TrackedCell: Send + Sync {
    /// Erase this value's entry for `segment`.
    fn release(&self, segment: &Segment);

    /// Move `parent`'s entry onto `current` unless `current` already has
    /// a newer one, then erase `parent`'s entry.
    fn collapse(&self, current: &Arc<Segment>, parent: &Segment);

    /// Compute the merge of this value for a join, if `segment` is the
    /// deepest segment of `joined` that wrote it.
    fn prepare_merge(
        &self,
        main: &Revision,
        joined: &Revision,
        segment: &Segment,
    ) -> Option<PendingMerge>;
}

type WrittenSet = SmallVec<[Weak<dyn TrackedCell>; 4]>;

/// A node of the version DAG.
pub(crate) struct Segment {
    version: VersionId,
    parent: Mutex<Option<Arc<Segment>>>,
    refcount: AtomicUsize,
    written: Mutex<WrittenSet>,
    stats: Arc<RuntimeStats>,
}

impl Segment {
    /// Allocate a segment with a fresh version id and one holder (the
    /// caller). Takes a reference on `parent`.
    pub fn new(parent: Option<Arc<Segment>>, stats: Arc<RuntimeStats>) -> Arc<Self> {
        if let Some(parent) = &parent {
            parent.refcount.fetch_add(1, Ordering::AcqRel);
        }
        stats.segment_created();
        Arc::new(Self {
            version: VersionId::next(),
            parent: Mutex::new(parent),
            refcount: AtomicUsize::new(1),
            written: Mutex::new(SmallVec::new()),
            stats,
        })
    }

    pub fn version(&self) -> VersionId {
        self.version
    }

    pub fn parent(&self) -> Option<Arc<Segment>> {
        lock(&self.parent).clone()
    }

    pub fn refcount(&self) -> usize {
        self.refcount.load(Ordering::Acquire)
    }

    /// Register a value in the written set.
    pub fn track(&self, cell: Weak<dyn TrackedCell>) {
        lock(&self.written).push(cell);
    }

    /// Live values written under this segment.
    pub fn written(&self) -> Vec<Arc<dyn TrackedCell>> {
        lock(&self.written).iter().filter_map(Weak::upgrade).collect()
    }

    /// Number of segments from this one up to the end of its chain,
    /// inclusive.
    pub fn depth(self: &Arc<Self>) -> usize {
        let mut depth = 1;
        let mut cursor = self.parent();
        while let Some(segment) = cursor {
            depth += 1;
            cursor = segment.parent();
        }
        depth
    }

    /// Drop one holder. Segments whose count reaches zero erase their
    /// entries and release their parent in turn.
    ///
    /// Walks the chain with a loop, so teardown of an arbitrarily long
    /// unreachable suffix uses constant stack.
    pub fn release(self: &Arc<Self>) {
        let mut next = Some(Arc::clone(self));
        while let Some(segment) = next.take() {
            let previous = segment.refcount.fetch_sub(1, Ordering::AcqRel);
            debug_assert!(previous > 0, "segment {} released twice", segment.version);
            if previous != 1 {
                break;
            }
            let written = std::mem::take(&mut *lock(&segment.written));
            for cell in written.iter().filter_map(Weak::upgrade) {
                cell.release(&segment);
            }
            segment.stats.segment_released();
            trace!(
                target: "braid::engine::segment",
                version = %segment.version,
                "segment_released"
            );
            next = lock(&segment.parent).take();
        }
    }

    /// Path compression after a join. Must be called on `main`'s current
    /// segment.
    ///
    /// Folds each parent held only by this segment's link (refcount 1)
    /// into this segment, stopping at `main`'s root. Parents with other
    /// holders are on a live revision's chain and are left untouched.
    pub fn collapse(self: &Arc<Self>, main: &Revision) {
        let root = main.root();
        while let Some(parent) = self.parent() {
            if Arc::ptr_eq(&parent, root) || parent.refcount() != 1 {
                break;
            }
            let written = std::mem::take(&mut *lock(&parent.written));
            for cell in written.iter().filter_map(Weak::upgrade) {
                cell.collapse(self, &parent);
            }
            // The parent's reference on the grandparent moves to this
            // segment's link; the parent itself has no holders left.
            let grandparent = lock(&parent.parent).take();
            *lock(&self.parent) = grandparent;
            parent.refcount.store(0, Ordering::Release);
            self.stats.segment_collapsed();
            trace!(
                target: "braid::engine::segment",
                version = %parent.version,
                into = %self.version,
                "segment_collapsed"
            );
        }
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        // Unlink iteratively: dropping a long chain through nested Arc
        // drops would recurse once per segment.
        let mut next = self
            .parent
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        while let Some(segment) = next.take() {
            match Arc::try_unwrap(segment) {
                Ok(mut owned) => {
                    next = owned
                        .parent
                        .get_mut()
                        .unwrap_or_else(PoisonError::into_inner)
                        .take();
                }
                Err(_) => break,
            }
        }
    }
}
