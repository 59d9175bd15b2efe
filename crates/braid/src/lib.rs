//! Braid: deterministic fork/join concurrency with versioned values.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Braid sub-crates. For most users, adding `braid` as a single
//! dependency is sufficient.
//!
//! A program forks *revisions* that run concurrently, each with its own
//! view of every [`Versioned`](prelude::Versioned) value. Joining a
//! revision merges its writes back through each value's merge function.
//! The final state depends only on the fork/join structure, not on
//! thread timing.
//!
//! # Quick start
//!
//! ```rust
//! use braid::prelude::*;
//!
//! let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
//! runtime.enter(|| {
//!     let hits: Versioned<i64, Additive> = Versioned::new();
//!     let best: Versioned<i64, Max> = Versioned::new();
//!
//!     let child = {
//!         let (hits, best) = (hits.clone(), best.clone());
//!         fork(move || {
//!             hits.update(|h| h + 5).unwrap();
//!             best.set(40);
//!         })
//!         .unwrap()
//!     };
//!     hits.update(|h| h + 3).unwrap();
//!     best.set(25);
//!     join(child).unwrap();
//!
//!     assert_eq!(hits.get(), Ok(8));
//!     assert_eq!(best.get(), Ok(40));
//! });
//! assert_eq!(runtime.metrics().live_segments, 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `braid-core` | IDs, error enums, the `Merge` trait and strategies |
//! | [`engine`] | `braid-engine` | Versioned values, fork/join, runtime, metrics |
//! | [`algo`] | `braid-algo` | Divide-and-conquer parallel helpers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core identifiers, errors, and merge strategies (`braid-core`).
///
/// Implement [`types::Merge`] to give a value custom join semantics.
pub use braid_core as types;

/// The revision engine (`braid-engine`).
///
/// [`engine::Runtime`] scopes, [`engine::fork`] / [`engine::join`], and
/// [`engine::Versioned`] values.
pub use braid_engine as engine;

/// Parallel helpers built on fork/join (`braid-algo`).
pub use braid_algo as algo;

/// Common imports for typical Braid usage.
///
/// ```rust
/// use braid::prelude::*;
/// ```
pub mod prelude {
    // Merge strategies
    pub use braid_core::{Additive, Max, MaxBy, Merge, Min, MinBy, Overwrite};

    // Errors
    pub use braid_core::{ForkError, JoinError, ReadError};

    // Engine
    pub use braid_engine::{
        fork, join, RevisionHandle, Runtime, RuntimeConfig, RuntimeMetrics, Versioned,
    };

    // Helpers
    pub use braid_algo::{ParallelConfig, ParallelError};
}
