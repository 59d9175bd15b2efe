//! Divide-and-conquer parallel helpers built on Braid revisions.
//!
//! Every helper splits its index range in half until a piece is no
//! longer than [`ParallelConfig::min_parallel`]. At each split the left
//! half runs in a forked revision while the right half runs in the
//! current one, then the fork is joined. Results flow back either
//! through the forked action's return value ([`transform`], [`sort`])
//! or through [`Versioned`](braid_engine::Versioned) cells and their
//! merge functions ([`sum`], [`min_element`], [`max_element`], and any
//! side effects of [`for_each`]).
//!
//! Inputs are shared with worker threads as `Arc<[T]>`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod each;
pub mod error;
pub mod reduce;
pub mod sort;
mod split;

pub use config::ParallelConfig;
pub use each::{for_each, transform, zip_transform};
pub use error::ParallelError;
pub use reduce::{max_element, min_element, sum};
pub use sort::sort;
