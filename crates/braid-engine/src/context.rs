//! The ambient revision of each thread, and the free functions that act
//! on it.
//!
//! Every thread has a current revision. Worker threads started by
//! [`fork`] run inside the child revision. A thread that touches the
//! runtime outside any [`Runtime::enter`] scope lazily gets a root
//! revision of [`Runtime::global`], released when the thread exits.

use std::cell::RefCell;
use std::sync::Arc;

use braid_core::{ForkError, JoinError, RevisionId};

use crate::revision::{Revision, RevisionHandle};
use crate::runtime::Runtime;

struct Ambient {
    current: Option<Arc<Revision>>,
    lazy_root: Option<Arc<Revision>>,
}

impl Drop for Ambient {
    fn drop(&mut self) {
        if let Some(root) = self.lazy_root.take() {
            root.release_chain();
        }
    }
}

thread_local! {
    static AMBIENT: RefCell<Ambient> = const {
        RefCell::new(Ambient {
            current: None,
            lazy_root: None,
        })
    };
}

/// The calling thread's current revision, creating a root revision of
/// the global runtime if there is none.
pub(crate) fn current() -> Arc<Revision> {
    AMBIENT.with(|ambient| {
        let mut ambient = ambient.borrow_mut();
        if let Some(revision) = &ambient.current {
            return Arc::clone(revision);
        }
        let root = match ambient.lazy_root.clone() {
            Some(root) => root,
            None => {
                let root = Revision::new_root(Runtime::global().shared());
                ambient.lazy_root = Some(Arc::clone(&root));
                root
            }
        };
        ambient.current = Some(Arc::clone(&root));
        root
    })
}

/// Restores the previously ambient revision on drop.
pub(crate) struct AmbientGuard {
    previous: Option<Arc<Revision>>,
}

/// Make `revision` the calling thread's current revision until the
/// returned guard drops.
pub(crate) fn install(revision: Arc<Revision>) -> AmbientGuard {
    let previous = AMBIENT.with(|ambient| ambient.borrow_mut().current.replace(revision));
    AmbientGuard { previous }
}

impl Drop for AmbientGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = AMBIENT.try_with(|ambient| ambient.borrow_mut().current = previous);
    }
}

/// A root revision installed for the duration of [`Runtime::enter`].
/// Restores the outer revision and releases the root's chain on drop,
/// including during unwinding.
pub(crate) struct RootScope {
    root: Arc<Revision>,
    ambient: Option<AmbientGuard>,
}

impl RootScope {
    pub fn enter(root: Arc<Revision>) -> Self {
        let ambient = Some(install(Arc::clone(&root)));
        Self { root, ambient }
    }
}

impl Drop for RootScope {
    fn drop(&mut self) {
        drop(self.ambient.take());
        self.root.release_chain();
    }
}

/// Fork a child revision of the calling thread's revision that runs
/// `action` concurrently on its own worker thread.
///
/// The child sees every value as of this call. Its writes stay
/// invisible to everyone else until the returned handle is passed to
/// [`join`].
///
/// # Errors
///
/// [`ForkError::ThreadSpawnFailed`] if the worker thread cannot be
/// started. The version DAG is left exactly as it was.
pub fn fork<F, R>(action: F) -> Result<RevisionHandle<R>, ForkError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    current().fork(action)
}

/// Wait for a forked revision, merge its writes into the calling
/// thread's revision, and return the value its action produced.
///
/// # Errors
///
/// - [`JoinError::ForeignJoin`] if the calling revision is neither the
///   forker nor a revision the forker was joined into. Checked before
///   blocking; the handle is then abandoned.
/// - [`JoinError::Panicked`] if the action panicked. Its writes are
///   discarded.
/// - [`JoinError::MergeFailed`] if a merge function panicked. No merge
///   result of this join is applied.
pub fn join<R>(handle: RevisionHandle<R>) -> Result<R, JoinError> {
    current().join(handle)
}

/// Number of segments in the calling revision's chain.
///
/// After every forked revision has been joined, the root revision's
/// chain is back to a constant length no matter how many fork/join
/// rounds ran.
pub fn chain_depth() -> usize {
    current().chain_depth()
}

/// Id of the calling thread's current revision.
pub fn current_revision_id() -> RevisionId {
    current().id()
}
