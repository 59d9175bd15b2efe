//! The [`Merge`] trait and the built-in merge strategies.
//!
//! A merge function reconciles one versioned value when a revision is
//! joined. It receives three views of the value:
//!
//! - `main`: the joining revision's current value,
//! - `joined`: the final value written by the joined revision,
//! - `ancestor`: the value as seen from the point the joined revision
//!   was forked.
//!
//! Merge functions must be pure: the same three inputs always produce
//! the same output, independent of thread timing. That is what makes
//! the final state of a fork/join program deterministic.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// Three-way merge applied to a versioned value at join time.
///
/// Implemented for the strategies in this module and for any closure
/// `Fn(&T, &T, &T) -> T` (`main`, `joined`, `ancestor`).
pub trait Merge<T>: Send + Sync + 'static {
    /// Produce the value the joining revision observes after the join.
    fn merge(&self, main: &T, joined: &T, ancestor: &T) -> T;
}

impl<T, F> Merge<T> for F
where
    F: Fn(&T, &T, &T) -> T + Send + Sync + 'static,
{
    fn merge(&self, main: &T, joined: &T, ancestor: &T) -> T {
        self(main, joined, ancestor)
    }
}

/// The joined revision's value replaces the main value. Default strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Overwrite;

impl<T: Clone> Merge<T> for Overwrite {
    fn merge(&self, _main: &T, joined: &T, _ancestor: &T) -> T {
        joined.clone()
    }
}

/// Commutative accumulation: `(main + joined) - ancestor`.
///
/// Both revisions' deltas relative to the fork point survive the join,
/// so concurrent increments add up. The ancestor is subtracted last so an
/// unsigned counter may be decremented by the joined revision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Additive;

impl<T> Merge<T> for Additive
where
    T: Clone + Add<Output = T> + Sub<Output = T>,
{
    fn merge(&self, main: &T, joined: &T, ancestor: &T) -> T {
        (main.clone() + joined.clone()) - ancestor.clone()
    }
}

/// Keeps the larger of `main` and `joined`. Ties keep `main`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Max;

impl<T: Clone + PartialOrd> Merge<T> for Max {
    fn merge(&self, main: &T, joined: &T, _ancestor: &T) -> T {
        if joined > main {
            joined.clone()
        } else {
            main.clone()
        }
    }
}

/// Keeps the smaller of `main` and `joined`. Ties keep `main`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Min;

impl<T: Clone + PartialOrd> Merge<T> for Min {
    fn merge(&self, main: &T, joined: &T, _ancestor: &T) -> T {
        if joined < main {
            joined.clone()
        } else {
            main.clone()
        }
    }
}

/// [`Max`] under a caller-supplied comparator.
///
/// Used when the stored value refers to something else that carries the
/// ordering, e.g. an index into shared data compared by the element it
/// points at. Ties keep `main`.
#[derive(Clone, Copy)]
pub struct MaxBy<F> {
    compare: F,
}

impl<F> MaxBy<F> {
    /// Build a max-merge from a comparator.
    pub fn new(compare: F) -> Self {
        Self { compare }
    }
}

impl<F> fmt::Debug for MaxBy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaxBy").finish_non_exhaustive()
    }
}

impl<T, F> Merge<T> for MaxBy<F>
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    fn merge(&self, main: &T, joined: &T, _ancestor: &T) -> T {
        match (self.compare)(joined, main) {
            Ordering::Greater => joined.clone(),
            _ => main.clone(),
        }
    }
}

/// [`Min`] under a caller-supplied comparator. Ties keep `main`.
#[derive(Clone, Copy)]
pub struct MinBy<F> {
    compare: F,
}

impl<F> MinBy<F> {
    /// Build a min-merge from a comparator.
    pub fn new(compare: F) -> Self {
        Self { compare }
    }
}

impl<F> fmt::Debug for MinBy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinBy").finish_non_exhaustive()
    }
}

impl<T, F> Merge<T> for MinBy<F>
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    fn merge(&self, main: &T, joined: &T, _ancestor: &T) -> T {
        match (self.compare)(joined, main) {
            Ordering::Less => joined.clone(),
            _ => main.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn overwrite_takes_joined() {
        assert_eq!(Overwrite.merge(&5, &10, &5), 10);
        assert_eq!(Overwrite.merge(&"a", &"b", &"c"), "b");
    }

    #[test]
    fn additive_combines_deltas() {
        // root=0, main added 3, child added 5.
        assert_eq!(Additive.merge(&3, &5, &0), 8);
        assert_eq!(Additive.merge(&101, &105, &100), 106);
    }

    #[test]
    fn additive_unsigned_joined_decrement() {
        // root=10, main went up to 12, child went down to 9.
        assert_eq!(Additive.merge(&12u64, &9, &10), 11);
    }

    #[test]
    fn max_and_min() {
        assert_eq!(Max.merge(&5, &10, &0), 10);
        assert_eq!(Max.merge(&10, &5, &0), 10);
        assert_eq!(Min.merge(&-10, &-5, &0), -10);
        assert_eq!(Min.merge(&-5, &-10, &0), -10);
    }

    #[test]
    fn ties_keep_main() {
        let by_key = MaxBy::new(|a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0));
        assert_eq!(by_key.merge(&(1, 'm'), &(1, 'j'), &(0, 'a')), (1, 'm'));
        let by_key = MinBy::new(|a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0));
        assert_eq!(by_key.merge(&(1, 'm'), &(1, 'j'), &(0, 'a')), (1, 'm'));
    }

    #[test]
    fn comparator_variants_compare_pointed_at_data() {
        let data = [4, 9, 1, 7];
        let max = MaxBy::new(move |a: &usize, b: &usize| data[*a].cmp(&data[*b]));
        assert_eq!(max.merge(&0, &1, &0), 1);
        assert_eq!(max.merge(&1, &3, &0), 1);
        let min = MinBy::new(move |a: &usize, b: &usize| data[*a].cmp(&data[*b]));
        assert_eq!(min.merge(&0, &2, &0), 2);
    }

    #[test]
    fn closures_are_merge_functions() {
        let concat = |m: &String, j: &String, _a: &String| format!("{m}{j}");
        assert_eq!(concat.merge(&"ab".to_string(), &"cd".to_string(), &String::new()), "abcd");
    }

    proptest! {
        #[test]
        fn additive_is_commutative(a in -1000i64..1000, m in -1000i64..1000, j in -1000i64..1000) {
            prop_assert_eq!(Additive.merge(&m, &j, &a), Additive.merge(&j, &m, &a));
        }

        #[test]
        fn additive_untouched_child_is_identity(a in -1000i64..1000, m in -1000i64..1000) {
            prop_assert_eq!(Additive.merge(&m, &a, &a), m);
        }

        #[test]
        fn max_is_commutative_and_idempotent(m in any::<i32>(), j in any::<i32>()) {
            prop_assert_eq!(Max.merge(&m, &j, &0), Max.merge(&j, &m, &0));
            prop_assert_eq!(Max.merge(&m, &m, &0), m);
        }

        #[test]
        fn min_never_exceeds_inputs(m in any::<i32>(), j in any::<i32>()) {
            let r = Min.merge(&m, &j, &0);
            prop_assert!(r <= m && r <= j);
        }
    }
}
