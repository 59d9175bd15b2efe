//! Parallel merge sort.

use std::sync::Arc;

use crate::config::ParallelConfig;
use crate::error::ParallelError;
use crate::split::split_join;

/// Stable sort. Pieces are sorted in their own revisions and merged
/// pairwise on the way back up.
pub fn sort<T>(items: Vec<T>, config: &ParallelConfig) -> Result<Vec<T>, ParallelError>
where
    T: Ord + Clone + Send + Sync + 'static,
{
    config.validate()?;
    let len = items.len();
    let items: Arc<[T]> = items.into();
    let leaf = Arc::new(move |lo: usize, hi: usize| -> Result<Vec<T>, ParallelError> {
        let mut piece = items[lo..hi].to_vec();
        piece.sort();
        Ok(piece)
    });
    split_join(0, len, config.min_parallel, &leaf, &Arc::new(merge_sorted))
}

/// Merge two sorted runs. Equal elements keep `left` first.
fn merge_sorted<T: Ord>(left: Vec<T>, right: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l <= r,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        out.extend(next);
    }
    out
}
