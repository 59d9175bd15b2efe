//! Versioned values: shared cells whose history is partitioned by segment.
//!
//! A [`Versioned<T, M>`] handle is cheap to clone; every clone refers to
//! the same cell. Reads resolve through the ambient revision's segment
//! chain, writes land in the ambient revision's current segment, and at
//! join time the cell's merge function `M` reconciles the joined
//! revision's final value with the joiner's.
//!
//! Segments only hold weak handles to the cells they name. A cell lives
//! as long as any `Versioned` clone does; once the last clone is dropped
//! its history goes with it and segments skip it.

use std::fmt;
use std::sync::{Arc, Weak};

use braid_core::{Merge, Overwrite, ReadError, VersionId};

use crate::context;
use crate::revision::Revision;
use crate::segment::{PendingMerge, Segment, TrackedCell};
use crate::store::VersionStore;

/// A shared variable that can be read and written without locks from
/// concurrently running revisions.
///
/// Declaring a value writes its initial value into the ambient
/// revision's current segment, so every revision forked afterwards
/// observes it.
///
/// ```
/// use braid_core::Additive;
/// use braid_engine::{fork, join, Versioned};
///
/// let hits: Versioned<i64, Additive> = Versioned::new();
/// let child = {
///     let hits = hits.clone();
///     fork(move || hits.set(hits.get().unwrap() + 5)).unwrap()
/// };
/// hits.set(hits.get().unwrap() + 3);
/// join(child).unwrap();
/// assert_eq!(hits.get().unwrap(), 8);
/// ```
pub struct Versioned<T, M = Overwrite> {
    cell: Arc<VersionedCell<T, M>>,
}

impl<T, M> Clone for Versioned<T, M> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T, M> Versioned<T, M>
where
    T: Clone + Send + Sync + 'static,
    M: Merge<T>,
{
    /// Declare a value with an explicit initial value and merge function.
    pub fn with_merge(value: T, merge: M) -> Self {
        let cell = Arc::new_cyclic(|this| VersionedCell {
            history: VersionStore::new(),
            merge,
            this: this.clone(),
        });
        let revision = context::current();
        cell.write(&revision.current(), value);
        Self { cell }
    }

    /// The value as seen by the ambient revision.
    pub fn get(&self) -> Result<T, ReadError> {
        let revision = context::current();
        self.cell.read(&revision)
    }

    /// Write `value` in the ambient revision. Invisible to every other
    /// revision until this one is joined.
    pub fn set(&self, value: T) {
        let revision = context::current();
        self.cell.write(&revision.current(), value);
    }

    /// Read-modify-write in the ambient revision.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<(), ReadError> {
        let revision = context::current();
        let value = self.cell.read(&revision)?;
        self.cell.write(&revision.current(), f(&value));
        Ok(())
    }

    /// Every live entry of this value, ordered by version id.
    pub fn versions(&self) -> Vec<(VersionId, T)> {
        self.cell.history.snapshot()
    }

    /// Whether two handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T, M> Versioned<T, M>
where
    T: Clone + Send + Sync + 'static,
    M: Merge<T> + Default,
{
    /// Declare a value with an explicit initial value and the default
    /// merge function.
    pub fn with_value(value: T) -> Self {
        Self::with_merge(value, M::default())
    }
}

impl<T, M> Versioned<T, M>
where
    T: Clone + Default + Send + Sync + 'static,
    M: Merge<T> + Default,
{
    /// Declare a value initialized to `T::default()`.
    pub fn new() -> Self {
        Self::with_value(T::default())
    }
}

impl<T, M> Default for Versioned<T, M>
where
    T: Clone + Default + Send + Sync + 'static,
    M: Merge<T> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, M> fmt::Debug for Versioned<T, M>
where
    T: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Versioned")
            .field("versions", &self.cell.history.snapshot())
            .finish()
    }
}

/// The shared state behind every clone of a [`Versioned`] handle.
struct VersionedCell<T, M> {
    history: VersionStore<T>,
    merge: M,
    /// Back-reference used to hand segments a non-owning handle.
    this: Weak<Self>,
}

impl<T, M> VersionedCell<T, M>
where
    T: Clone + Send + Sync + 'static,
    M: Merge<T>,
{
    /// First entry found walking up from `start`, with the segment it
    /// belongs to.
    fn lookup(&self, start: &Arc<Segment>) -> Option<(VersionId, T)> {
        let mut cursor = Some(Arc::clone(start));
        while let Some(segment) = cursor {
            if let Some(value) = self.history.get(segment.version()) {
                return Some((segment.version(), value));
            }
            cursor = segment.parent();
        }
        None
    }

    fn read(&self, revision: &Revision) -> Result<T, ReadError> {
        let start = revision.current();
        self.lookup(&start)
            .map(|(_, value)| value)
            .ok_or(ReadError::Uninitialized {
                version: start.version(),
            })
    }

    /// Store `value` under `segment`, registering in its written set on
    /// the first write.
    fn write(&self, segment: &Arc<Segment>, value: T) {
        if !self.history.has(segment.version()) {
            let handle: Weak<dyn TrackedCell> = self.this.clone();
            segment.track(handle);
        }
        self.history.set(segment.version(), value);
    }
}

impl<T, M> TrackedCell for VersionedCell<T, M>
where
    T: Clone + Send + Sync + 'static,
    M: Merge<T>,
{
    fn release(&self, segment: &Segment) {
        self.history.erase(segment.version());
    }

    fn collapse(&self, current: &Arc<Segment>, parent: &Segment) {
        if !self.history.has(current.version()) {
            if let Some(value) = self.history.get(parent.version()) {
                self.write(current, value);
            }
        }
        self.history.erase(parent.version());
    }

    fn prepare_merge(
        &self,
        main: &Revision,
        joined: &Revision,
        segment: &Segment,
    ) -> Option<PendingMerge> {
        // Only the deepest write on the joined chain merges.
        let (found, joined_value) = self.lookup(&joined.current())?;
        if found != segment.version() {
            return None;
        }
        let merged = match (self.lookup(&main.current()), self.lookup(joined.root())) {
            (Some((_, main_value)), Some((_, ancestor))) => {
                self.merge.merge(&main_value, &joined_value, &ancestor)
            }
            // Declared inside the joined revision: nothing to reconcile.
            _ => joined_value,
        };
        let cell = self.this.upgrade()?;
        Some(Box::new(move |target: &Arc<Segment>| {
            cell.write(target, merged)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Runtime, RuntimeConfig};
    use braid_core::{Additive, Max, Min};

    fn runtime() -> Runtime {
        Runtime::new(RuntimeConfig::default()).unwrap()
    }

    #[test]
    fn unset_value_reads_default() {
        runtime().enter(|| {
            let v: Versioned<i32> = Versioned::new();
            assert_eq!(v.get(), Ok(0));
            let s: Versioned<String> = Versioned::new();
            assert_eq!(s.get(), Ok(String::new()));
        });
    }

    #[test]
    fn repeated_set_overwrites_single_entry() {
        runtime().enter(|| {
            let v: Versioned<i32> = Versioned::new();
            v.set(1);
            v.set(2);
            v.set(3);
            assert_eq!(v.get(), Ok(3));
            assert_eq!(v.versions().len(), 1);
        });
    }

    #[test]
    fn update_reads_then_writes() {
        runtime().enter(|| {
            let v: Versioned<i32> = Versioned::with_value(10);
            v.update(|x| x * 2).unwrap();
            assert_eq!(v.get(), Ok(20));
        });
    }

    #[test]
    fn clones_share_one_cell() {
        runtime().enter(|| {
            let a: Versioned<i32> = Versioned::new();
            let b = a.clone();
            b.set(42);
            assert_eq!(a.get(), Ok(42));
            assert!(a.ptr_eq(&b));
            let c: Versioned<i32> = Versioned::new();
            assert!(!a.ptr_eq(&c));
        });
    }

    #[test]
    fn merge_strategies_on_join() {
        runtime().enter(|| {
            let add: Versioned<i32, Additive> = Versioned::new();
            let max: Versioned<i32, Max> = Versioned::new();
            let min: Versioned<i32, Min> = Versioned::new();

            let child = {
                let (add, max, min) = (add.clone(), max.clone(), min.clone());
                crate::fork(move || {
                    add.set(add.get().unwrap() + 5);
                    max.set(10);
                    min.set(-5);
                })
                .unwrap()
            };
            add.set(add.get().unwrap() + 3);
            max.set(5);
            min.set(-10);
            crate::join(child).unwrap();

            assert_eq!(add.get(), Ok(8));
            assert_eq!(max.get(), Ok(10));
            assert_eq!(min.get(), Ok(-10));
        });
    }

    #[test]
    fn closure_merge_function() {
        runtime().enter(|| {
            let log = Versioned::with_merge(String::from("a"), |m: &String, j: &String, a: &String| {
                format!("{m}{}", &j[a.len()..])
            });
            let child = {
                let log = log.clone();
                crate::fork(move || log.set(format!("{}c", log.get().unwrap()))).unwrap()
            };
            log.set(format!("{}b", log.get().unwrap()));
            crate::join(child).unwrap();
            assert_eq!(log.get(), Ok("abc".to_string()));
        });
    }

    #[test]
    fn debug_lists_versions() {
        runtime().enter(|| {
            let v: Versioned<i32> = Versioned::with_value(7);
            let rendered = format!("{v:?}");
            assert!(rendered.starts_with("Versioned"));
            assert!(rendered.contains('7'));
        });
    }
}
