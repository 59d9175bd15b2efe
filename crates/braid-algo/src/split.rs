//! The shared recursive splitter.

use std::sync::Arc;

use braid_engine::{fork, join};

use crate::error::ParallelError;

/// Evaluate `leaf` over `lo..hi` in pieces of at most `grain` elements
/// and fold the piece results with `combine`, left before right.
///
/// The left half of every split runs in a forked revision. The forked
/// half is always joined, even when the right half fails, so no
/// revision outlives the call.
pub(crate) fn split_join<R, L, C>(
    lo: usize,
    hi: usize,
    grain: usize,
    leaf: &Arc<L>,
    combine: &Arc<C>,
) -> Result<R, ParallelError>
where
    R: Send + 'static,
    L: Fn(usize, usize) -> Result<R, ParallelError> + Send + Sync + 'static,
    C: Fn(R, R) -> R + Send + Sync + 'static,
{
    if hi - lo <= grain {
        return leaf(lo, hi);
    }
    let mid = lo + (hi - lo) / 2;
    let left = {
        let (leaf, combine) = (Arc::clone(leaf), Arc::clone(combine));
        fork(move || split_join(lo, mid, grain, &leaf, &combine))?
    };
    let right = split_join(mid, hi, grain, leaf, combine);
    let left = join(left)?;
    Ok(combine(left?, right?))
}
