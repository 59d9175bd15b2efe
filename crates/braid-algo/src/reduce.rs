//! Reductions through versioned accumulators: [`sum`], [`min_element`],
//! [`max_element`].
//!
//! Each piece folds its elements locally, then folds the local result
//! into a [`Versioned`] accumulator declared by the caller's revision.
//! The accumulator's merge function combines the pieces at every join.

use std::cmp::Ordering;
use std::ops::{Add, Sub};
use std::sync::Arc;

use braid_core::{Additive, MaxBy, Merge, MinBy};
use braid_engine::Versioned;

use crate::config::ParallelConfig;
use crate::error::ParallelError;
use crate::split::split_join;

/// Sum of all elements, accumulated in a `Versioned<T, Additive>`.
pub fn sum<T>(items: Arc<[T]>, config: &ParallelConfig) -> Result<T, ParallelError>
where
    T: Clone + Default + Add<Output = T> + Sub<Output = T> + Send + Sync + 'static,
{
    config.validate()?;
    let total: Versioned<T, Additive> = Versioned::new();
    let acc = total.clone();
    let len = items.len();
    let leaf = Arc::new(move |lo: usize, hi: usize| -> Result<(), ParallelError> {
        let partial = items[lo..hi]
            .iter()
            .cloned()
            .fold(T::default(), |a, b| a + b);
        acc.update(|s| s.clone() + partial)?;
        Ok(())
    });
    split_join(0, len, config.min_parallel, &leaf, &Arc::new(|(), ()| ()))?;
    Ok(total.get()?)
}

/// Index of the first smallest element, or `None` if `items` is empty.
pub fn min_element<T>(items: Arc<[T]>, config: &ParallelConfig) -> Result<Option<usize>, ParallelError>
where
    T: Ord + Send + Sync + 'static,
{
    let len = items.len();
    let order = move |a: &Option<usize>, b: &Option<usize>| match (a, b) {
        (Some(i), Some(j)) => items[*i].cmp(&items[*j]).then(i.cmp(j)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    best_index(len, MinBy::new(order), config)
}

/// Index of the first largest element, or `None` if `items` is empty.
pub fn max_element<T>(items: Arc<[T]>, config: &ParallelConfig) -> Result<Option<usize>, ParallelError>
where
    T: Ord + Send + Sync + 'static,
{
    let len = items.len();
    // Lower indices rank higher among equal elements.
    let order = move |a: &Option<usize>, b: &Option<usize>| match (a, b) {
        (Some(i), Some(j)) => items[*i].cmp(&items[*j]).then(j.cmp(i)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };
    best_index(len, MaxBy::new(order), config)
}

/// Fold indices `0..len` with `pick`, which keeps `main` unless `joined`
/// is strictly better.
fn best_index<M>(len: usize, pick: M, config: &ParallelConfig) -> Result<Option<usize>, ParallelError>
where
    M: Merge<Option<usize>> + Clone,
{
    config.validate()?;
    let best: Versioned<Option<usize>, M> = Versioned::with_merge(None, pick.clone());
    let acc = best.clone();
    let leaf = Arc::new(move |lo: usize, hi: usize| -> Result<(), ParallelError> {
        let local = (lo..hi).fold(None, |cur, i| pick.merge(&cur, &Some(i), &cur));
        acc.update(|cur| pick.merge(cur, &local, cur))?;
        Ok(())
    });
    split_join(0, len, config.min_parallel, &leaf, &Arc::new(|(), ()| ()))?;
    Ok(best.get()?)
}
