//! Core types and traits for the Braid revision runtime.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Braid workspace:
//! version and revision identifiers, the per-subsystem error types, and
//! the [`Merge`] trait with its built-in strategies.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod merge;

pub use error::{ForkError, JoinError, ReadError};
pub use id::{RevisionId, VersionId};
pub use merge::{Additive, Max, MaxBy, Merge, Min, MinBy, Overwrite};
