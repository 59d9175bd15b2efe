//! Benchmark workloads for the Braid revision runtime.
//!
//! - [`sequential_fib`] / [`parallel_fib`]: recursive Fibonacci, the
//!   parallel version forking both recursive calls above a cutoff and
//!   accumulating leaves in an additive value
//! - [`sequential_sum`] / [`parallel_sum`]: slice sum, the parallel
//!   version splitting in halves above a cutoff

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use braid_algo::ParallelError;
use braid_core::Additive;
use braid_engine::{fork, join, Versioned};

/// Plain recursive Fibonacci.
pub fn sequential_fib(n: u32) -> u64 {
    if n <= 1 {
        return u64::from(n);
    }
    sequential_fib(n - 1) + sequential_fib(n - 2)
}

/// Fibonacci with both recursive calls forked while `n >= cutoff`.
/// Adds `fib(n)` to `sum`.
pub fn parallel_fib(n: u32, cutoff: u32, sum: &Versioned<u64, Additive>) -> Result<(), ParallelError> {
    if n < cutoff || n <= 1 {
        sum.update(|s| s + sequential_fib(n))?;
        return Ok(());
    }
    let spawn = |k: u32| {
        let sum = sum.clone();
        fork(move || parallel_fib(k, cutoff, &sum))
    };
    let r1 = spawn(n - 1)?;
    let r2 = spawn(n - 2)?;
    let first = join(r1)?;
    let second = join(r2)?;
    first.and(second)
}

/// Sum of `data`, one element at a time.
pub fn sequential_sum(data: &[i64]) -> i64 {
    data.iter().sum()
}

/// Sum of `data[lo..hi]` added to `sum`, forking both halves while the
/// range is at least `cutoff` long.
///
/// # Panics
///
/// Panics if `lo > hi` or `hi > data.len()`.
pub fn parallel_sum(
    data: &Arc<[i64]>,
    lo: usize,
    hi: usize,
    cutoff: usize,
    sum: &Versioned<i64, Additive>,
) -> Result<(), ParallelError> {
    assert!(
        lo <= hi && hi <= data.len(),
        "parallel_sum range {lo}..{hi} out of bounds for length {}",
        data.len()
    );
    let len = hi - lo;
    if len < cutoff.max(2) {
        let local = sequential_sum(&data[lo..hi]);
        sum.update(|s| s + local)?;
        return Ok(());
    }
    let mid = lo + len / 2;
    let spawn = |lo: usize, hi: usize| {
        let (data, sum) = (Arc::clone(data), sum.clone());
        fork(move || parallel_sum(&data, lo, hi, cutoff, &sum))
    };
    let r1 = spawn(lo, mid)?;
    let r2 = spawn(mid, hi)?;
    let first = join(r1)?;
    let second = join(r2)?;
    first.and(second)
}
