//! Error type for the parallel helpers.

use std::error::Error;
use std::fmt;

use braid_core::{ForkError, JoinError, ReadError};

/// Failure of a parallel helper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParallelError {
    /// `min_parallel` was zero.
    ZeroGrain,
    /// A split could not fork its left half.
    Fork(ForkError),
    /// Joining a forked half failed, e.g. because the caller's closure
    /// panicked in it.
    Join(JoinError),
    /// An accumulator could not be read.
    Read(ReadError),
}

impl fmt::Display for ParallelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroGrain => write!(f, "min_parallel must be at least 1"),
            Self::Fork(e) => write!(f, "fork failed: {e}"),
            Self::Join(e) => write!(f, "join failed: {e}"),
            Self::Read(e) => write!(f, "read failed: {e}"),
        }
    }
}

impl Error for ParallelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ZeroGrain => None,
            Self::Fork(e) => Some(e),
            Self::Join(e) => Some(e),
            Self::Read(e) => Some(e),
        }
    }
}

impl From<ForkError> for ParallelError {
    fn from(e: ForkError) -> Self {
        Self::Fork(e)
    }
}

impl From<JoinError> for ParallelError {
    fn from(e: JoinError) -> Self {
        Self::Join(e)
    }
}

impl From<ReadError> for ParallelError {
    fn from(e: ReadError) -> Self {
        Self::Read(e)
    }
}
