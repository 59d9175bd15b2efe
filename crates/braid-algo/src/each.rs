//! Element-wise helpers: [`for_each`], [`transform`], [`zip_transform`].

use std::sync::Arc;

use crate::config::ParallelConfig;
use crate::error::ParallelError;
use crate::split::split_join;

/// Apply `f` to every element.
///
/// Pieces run in different revisions, so `f` should communicate through
/// captured [`Versioned`](braid_engine::Versioned) cells; their merge
/// functions reconcile the pieces' writes.
///
/// ```
/// use std::sync::Arc;
/// use braid_algo::{for_each, ParallelConfig};
/// use braid_core::Additive;
/// use braid_engine::Versioned;
///
/// let items: Arc<[i64]> = vec![1; 5000].into();
/// let total: Versioned<i64, Additive> = Versioned::new();
/// let acc = total.clone();
/// for_each(items, move |n| acc.set(acc.get().unwrap() + n), &ParallelConfig::default()).unwrap();
/// assert_eq!(total.get().unwrap(), 5000);
/// ```
pub fn for_each<T, F>(items: Arc<[T]>, f: F, config: &ParallelConfig) -> Result<(), ParallelError>
where
    T: Send + Sync + 'static,
    F: Fn(&T) + Send + Sync + 'static,
{
    config.validate()?;
    let len = items.len();
    let leaf = Arc::new(move |lo: usize, hi: usize| -> Result<(), ParallelError> {
        items[lo..hi].iter().for_each(&f);
        Ok(())
    });
    split_join(0, len, config.min_parallel, &leaf, &Arc::new(|(), ()| ()))
}

/// Map every element through `f`, preserving order.
pub fn transform<T, U, F>(
    items: Arc<[T]>,
    f: F,
    config: &ParallelConfig,
) -> Result<Vec<U>, ParallelError>
where
    T: Send + Sync + 'static,
    U: Send + 'static,
    F: Fn(&T) -> U + Send + Sync + 'static,
{
    config.validate()?;
    let len = items.len();
    let leaf = Arc::new(move |lo: usize, hi: usize| -> Result<Vec<U>, ParallelError> {
        Ok(items[lo..hi].iter().map(&f).collect())
    });
    split_join(0, len, config.min_parallel, &leaf, &Arc::new(concat))
}

/// Combine elements pairwise through `f`, preserving order. The output
/// is as long as the shorter input.
pub fn zip_transform<A, B, U, F>(
    left: Arc<[A]>,
    right: Arc<[B]>,
    f: F,
    config: &ParallelConfig,
) -> Result<Vec<U>, ParallelError>
where
    A: Send + Sync + 'static,
    B: Send + Sync + 'static,
    U: Send + 'static,
    F: Fn(&A, &B) -> U + Send + Sync + 'static,
{
    config.validate()?;
    let len = left.len().min(right.len());
    let leaf = Arc::new(move |lo: usize, hi: usize| -> Result<Vec<U>, ParallelError> {
        Ok(left[lo..hi]
            .iter()
            .zip(&right[lo..hi])
            .map(|(a, b)| f(a, b))
            .collect())
    });
    split_join(0, len, config.min_parallel, &leaf, &Arc::new(concat))
}

fn concat<U>(mut left: Vec<U>, right: Vec<U>) -> Vec<U> {
    left.extend(right);
    left
}
