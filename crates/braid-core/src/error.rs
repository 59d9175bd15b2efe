//! Error types for the Braid revision runtime.
//!
//! Organized by operation: reading a versioned value, forking a
//! revision, and joining one. Contract violations get their own named
//! variants instead of being left undefined.

use std::error::Error;
use std::fmt;

use crate::id::{RevisionId, VersionId};

/// Errors from reading a versioned value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadError {
    /// No segment on the reading revision's chain holds an entry for the
    /// value. Happens when a value is read from a revision that does not
    /// descend from the segment that declared it.
    Uninitialized {
        /// The segment the lookup started from.
        version: VersionId,
    },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized { version } => {
                write!(f, "uninitialized read: no entry reachable from {version}")
            }
        }
    }
}

impl Error for ReadError {}

/// Errors from `fork()`.
///
/// A failed fork leaves the version DAG exactly as it was before the
/// call: both segments allocated for the child and the continuation are
/// rolled back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForkError {
    /// The worker thread for the child revision could not be created.
    ThreadSpawnFailed {
        /// The OS error reported by the thread builder.
        reason: String,
    },
}

impl fmt::Display for ForkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ForkError {}

/// Errors from `join()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinError {
    /// The revision has already been joined.
    DoubleJoin {
        /// The revision that was joined twice.
        revision: RevisionId,
    },
    /// The joining revision is not entitled to this handle: it neither
    /// forked the revision nor absorbed (transitively) the revision that did.
    ForeignJoin {
        /// The revision behind the handle.
        revision: RevisionId,
        /// The revision that attempted the join.
        joiner: RevisionId,
    },
    /// The forked action panicked. Its writes were discarded and its
    /// segments released.
    Panicked {
        /// The revision whose action panicked.
        revision: RevisionId,
        /// The panic payload, if it was a string.
        message: String,
    },
    /// A merge function panicked while reconciling the revision. No merge
    /// result from this join was applied.
    MergeFailed {
        /// The revision being joined.
        revision: RevisionId,
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleJoin { revision } => write!(f, "double join of revision {revision}"),
            Self::ForeignJoin { revision, joiner } => {
                write!(f, "foreign join: {joiner} is not entitled to join {revision}")
            }
            Self::Panicked { revision, message } => {
                write!(f, "revision {revision} panicked: {message}")
            }
            Self::MergeFailed { revision, message } => {
                write!(f, "merge failed while joining {revision}: {message}")
            }
        }
    }
}

impl Error for JoinError {}
