//! Fork/join engine for the Braid revision runtime.
//!
//! Revisions are units of concurrent execution that each see a private,
//! isolated view of every [`Versioned`] value. [`fork`] starts a child
//! revision on its own worker thread; [`join`] waits for it and merges
//! its writes back using each value's merge function. The result of a
//! program depends only on its fork/join structure, never on thread
//! timing.
//!
//! Internally every revision writes into a segment of a version DAG.
//! Segments are reference counted and collapsed after joins, so a
//! program that repeatedly forks and joins keeps a bounded chain.
//!
//! # Quick start
//!
//! ```
//! use braid_engine::{fork, join, Runtime, RuntimeConfig, Versioned};
//!
//! let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
//! runtime.enter(|| {
//!     let x: Versioned<i32> = Versioned::with_value(0);
//!     let y: Versioned<i32> = Versioned::with_value(0);
//!
//!     let handle = {
//!         let (x, y) = (x.clone(), y.clone());
//!         fork(move || {
//!             if x.get().unwrap() == 0 {
//!                 y.set(y.get().unwrap() + 1);
//!             }
//!         })
//!         .unwrap()
//!     };
//!     if y.get().unwrap() == 0 {
//!         x.set(x.get().unwrap() + 1);
//!     }
//!     join(handle).unwrap();
//!
//!     // Both branches read the pre-fork state.
//!     assert_eq!((x.get().unwrap(), y.get().unwrap()), (1, 1));
//! });
//! assert_eq!(runtime.metrics().live_segments, 0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
mod context;
pub mod metrics;
mod revision;
mod runtime;
pub(crate) mod segment;
pub mod store;
mod sync;
mod versioned;

pub use config::{ConfigError, RuntimeConfig, MIN_STACK_SIZE};
pub use context::{chain_depth, current_revision_id, fork, join};
pub use metrics::RuntimeMetrics;
pub use revision::RevisionHandle;
pub use runtime::Runtime;
pub use store::VersionStore;
pub use versioned::Versioned;
