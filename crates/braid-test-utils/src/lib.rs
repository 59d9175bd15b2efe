//! Test utilities for Braid development.
//!
//! Provides [`fresh_runtime`] for tests that assert on counters, and
//! the [`RandomProgram`](fixtures::RandomProgram) fixture: seeded
//! fork/join programs with a sequential oracle for determinism checks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{Outcome, ProgramShape, RandomProgram, Step};

use braid_engine::{Runtime, RuntimeConfig};

/// A runtime of its own, so counter assertions are not disturbed by
/// other tests running in parallel.
pub fn fresh_runtime() -> Runtime {
    Runtime::new(RuntimeConfig::default()).expect("default config is valid")
}

/// Run `f` in a root revision of a fresh runtime and return its result
/// together with the runtime, for inspecting counters afterwards.
pub fn run_fresh<U>(f: impl FnOnce() -> U) -> (U, Runtime) {
    let runtime = fresh_runtime();
    let out = runtime.enter(f);
    (out, runtime)
}
