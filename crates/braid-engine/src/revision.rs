//! Revisions: forkable units of execution, and the fork/join protocol.
//!
//! A [`Revision`] owns a chain of segments through its `current`
//! pointer and remembers the segment it was forked from as its `root`.
//! Forking starts a child revision on its own worker thread; joining
//! waits for it, merges its writes into the joiner, and compresses the
//! joiner's chain.
//!
//! # Join entitlement
//!
//! Each revision carries a [`Lineage`] node. When a revision is joined
//! its node is linked to the joiner's, so the set of revisions that have
//! been absorbed into a live revision resolves to that revision's node.
//! A handle may be joined by the revision that forked it, or by any
//! revision the forker has (transitively) been joined into. Joining from
//! anywhere else is a [`JoinError::ForeignJoin`].
//!
//! # Logging
//!
//! - **DEBUG** `braid::engine::revision`: `revision_forked`, `revision_joined`
//! - **WARN** `braid::engine::revision`: `revision_panicked`,
//!   `merge_failed`, `revision_abandoned`, `fork_failed`. A revision
//!   abandoned after panicking carries the payload in its `panic` field.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};

use braid_core::{ForkError, JoinError, RevisionId};
use tracing::{debug, warn};

use crate::context;
use crate::runtime::RuntimeShared;
use crate::segment::Segment;
use crate::sync::lock;

/// Union-find node recording which revision a joined revision was
/// absorbed into.
pub(crate) struct Lineage {
    revision: RevisionId,
    absorbed_into: OnceLock<Arc<Lineage>>,
}

impl Lineage {
    fn new(revision: RevisionId) -> Arc<Self> {
        Arc::new(Self {
            revision,
            absorbed_into: OnceLock::new(),
        })
    }

    /// The live revision this lineage has been absorbed into, or itself.
    fn resolve(self: &Arc<Self>) -> Arc<Lineage> {
        let mut node = Arc::clone(self);
        while let Some(next) = node.absorbed_into.get() {
            let next = Arc::clone(next);
            node = next;
        }
        node
    }
}

/// A unit of execution with its own view of every versioned value.
pub(crate) struct Revision {
    id: RevisionId,
    root: Arc<Segment>,
    current: Mutex<Arc<Segment>>,
    lineage: Arc<Lineage>,
    joined: AtomicBool,
    runtime: Arc<RuntimeShared>,
}

// Compile-time assertion: revisions cross threads inside handles.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Revision>();
};

impl Revision {
    /// A revision with a fresh, parentless segment as both root and
    /// current.
    pub fn new_root(runtime: Arc<RuntimeShared>) -> Arc<Self> {
        let id = RevisionId::next();
        let root = Segment::new(None, Arc::clone(&runtime.stats));
        Arc::new(Self {
            id,
            root: Arc::clone(&root),
            current: Mutex::new(root),
            lineage: Lineage::new(id),
            joined: AtomicBool::new(false),
            runtime,
        })
    }

    pub fn id(&self) -> RevisionId {
        self.id
    }

    /// The segment this revision was forked from. For a root revision,
    /// its initial segment.
    pub fn root(&self) -> &Arc<Segment> {
        &self.root
    }

    /// The segment this revision is currently writing to.
    pub fn current(&self) -> Arc<Segment> {
        Arc::clone(&lock(&self.current))
    }

    fn set_current(&self, segment: Arc<Segment>) {
        *lock(&self.current) = segment;
    }

    /// Length of the segment chain reachable from `current`.
    pub fn chain_depth(&self) -> usize {
        self.current().depth()
    }

    /// Release this revision's hold on its chain. Used for root
    /// revisions going out of scope.
    pub fn release_chain(&self) {
        if !self.joined.swap(true, Ordering::AcqRel) {
            self.current().release();
        }
    }

    /// Start `action` in a new child revision on a fresh worker thread.
    pub fn fork<F, R>(&self, action: F) -> Result<RevisionHandle<R>, ForkError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let stats = &self.runtime.stats;
        let ancestor = self.current();
        let child_id = RevisionId::next();
        let child = Arc::new(Revision {
            id: child_id,
            root: Arc::clone(&ancestor),
            current: Mutex::new(Segment::new(Some(Arc::clone(&ancestor)), Arc::clone(stats))),
            lineage: Lineage::new(child_id),
            joined: AtomicBool::new(false),
            runtime: Arc::clone(&self.runtime),
        });
        let continuation = Segment::new(Some(Arc::clone(&ancestor)), Arc::clone(stats));

        let config = &self.runtime.config;
        let mut builder = thread::Builder::new().name(format!("{}-{}", config.thread_name, child_id.get()));
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }
        let worker_revision = Arc::clone(&child);
        let spawned = builder.spawn(move || {
            let _ambient = context::install(worker_revision);
            panic::catch_unwind(AssertUnwindSafe(action)).map_err(|payload| panic_message(&*payload))
        });

        match spawned {
            Ok(worker) => {
                self.set_current(continuation);
                ancestor.release();
                stats.record_fork();
                debug!(
                    target: "braid::engine::revision",
                    revision = %child_id,
                    parent = %self.id,
                    version = %ancestor.version(),
                    "revision_forked"
                );
                Ok(RevisionHandle {
                    revision: child,
                    forker: Arc::clone(&self.lineage),
                    worker: Some(worker),
                })
            }
            Err(e) => {
                // Roll back: both new segments go, the ancestor is back
                // to exactly the holders it had before.
                child.current().release();
                continuation.release();
                stats.record_failed_fork();
                warn!(
                    target: "braid::engine::revision",
                    parent = %self.id,
                    reason = %e,
                    "fork_failed"
                );
                Err(ForkError::ThreadSpawnFailed {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Wait for `handle`'s revision and absorb it into this one.
    pub fn join<R>(&self, mut handle: RevisionHandle<R>) -> Result<R, JoinError> {
        let child = Arc::clone(&handle.revision);
        if !Arc::ptr_eq(&handle.forker.resolve(), &self.lineage) {
            // The handle is abandoned when it drops on return.
            return Err(JoinError::ForeignJoin {
                revision: child.id,
                joiner: self.id,
            });
        }

        let result = match handle.wait() {
            Ok(value) => self.absorb(&child, true).map(|()| value),
            Err(message) => match self.absorb(&child, false) {
                Ok(()) => {
                    warn!(
                        target: "braid::engine::revision",
                        revision = %child.id,
                        message = %message,
                        "revision_panicked"
                    );
                    Err(JoinError::Panicked {
                        revision: child.id,
                        message,
                    })
                }
                Err(e) => Err(e),
            },
        };
        self.runtime.stats.record_join(result.is_err());
        result
    }

    /// Merge `child`'s writes (if `merge`), release its chain, and
    /// collapse this revision's chain.
    pub(crate) fn absorb(&self, child: &Revision, merge: bool) -> Result<(), JoinError> {
        if child.joined.swap(true, Ordering::AcqRel) {
            return Err(JoinError::DoubleJoin { revision: child.id });
        }

        let mut failure = None;
        let mut merged = 0;
        if merge {
            match self.merge_from(child) {
                Ok(count) => merged = count,
                Err(message) => failure = Some(message),
            }
            self.runtime.stats.record_merges(merged);
        }

        child.current().release();
        self.current().collapse(self);
        let _ = child.lineage.absorbed_into.set(Arc::clone(&self.lineage));

        debug!(
            target: "braid::engine::revision",
            revision = %child.id,
            joiner = %self.id,
            merged,
            "revision_joined"
        );

        match failure {
            None => Ok(()),
            Some(message) => {
                warn!(
                    target: "braid::engine::revision",
                    revision = %child.id,
                    message = %message,
                    "merge_failed"
                );
                Err(JoinError::MergeFailed {
                    revision: child.id,
                    message,
                })
            }
        }
    }

    /// Compute every merge result for `child` first, then apply them.
    /// A panicking merge function leaves this revision untouched.
    fn merge_from(&self, child: &Revision) -> Result<u64, String> {
        let mut segments = Vec::new();
        let mut cursor = Some(child.current());
        while let Some(segment) = cursor {
            if Arc::ptr_eq(&segment, &child.root) {
                break;
            }
            cursor = segment.parent();
            segments.push(segment);
        }

        let prepared = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut pending = Vec::new();
            for segment in &segments {
                for cell in segment.written() {
                    if let Some(apply) = cell.prepare_merge(self, child, segment) {
                        pending.push(apply);
                    }
                }
            }
            pending
        }))
        .map_err(|payload| panic_message(&*payload))?;

        let target = self.current();
        let count = prepared.len() as u64;
        for apply in prepared {
            apply(&target);
        }
        Ok(count)
    }
}

/// Handle to a forked revision. Consumed by [`join`](crate::join).
///
/// Dropping a handle without joining it abandons the revision: the drop
/// waits for the worker thread, discards its writes, and releases its
/// segments.
#[must_use = "a revision handle should be joined; dropping it discards the revision's writes"]
pub struct RevisionHandle<R> {
    revision: Arc<Revision>,
    forker: Arc<Lineage>,
    worker: Option<JoinHandle<Result<R, String>>>,
}

impl<R> RevisionHandle<R> {
    /// Id of the forked revision.
    pub fn id(&self) -> RevisionId {
        self.revision.id
    }

    /// Id of the revision that forked this one.
    pub fn forked_by(&self) -> RevisionId {
        self.forker.revision
    }

    /// Whether the forked action has finished running.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    fn wait(&mut self) -> Result<R, String> {
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .unwrap_or_else(|payload| Err(panic_message(&*payload))),
            None => Err("worker thread already collected".to_string()),
        }
    }
}

impl<R> std::fmt::Debug for RevisionHandle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionHandle")
            .field("revision", &self.revision.id)
            .field("forked_by", &self.forker.revision)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl<R> Drop for RevisionHandle<R> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.abandon();
        }
    }
}

impl<R> RevisionHandle<R> {
    /// Waits for the worker, discards the revision's writes and returns the
    /// panic message if the action did not complete.
    fn abandon(&mut self) -> Option<String> {
        let failure = self.wait().err();
        if !self.revision.joined.swap(true, Ordering::AcqRel) {
            self.revision.current().release();
        }
        self.revision.runtime.stats.record_abandoned();
        warn!(
            target: "braid::engine::revision",
            revision = %self.revision.id,
            panic = failure.as_deref(),
            "revision_abandoned"
        );
        failure
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
