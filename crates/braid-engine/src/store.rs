//! Per-value version history.
//!
//! [`VersionStore`] maps segment version ids to one variable's values.
//! Every operation takes a single mutex scoped to the store. Coarse
//! locking is enough here: a value only has entries for the segments
//! that wrote it and have not been released or collapsed yet, which in
//! practice is a handful.

use std::sync::Mutex;

use braid_core::VersionId;
use indexmap::IndexMap;

use crate::sync::lock;

/// Thread-safe sparse mapping from [`VersionId`] to a value.
#[derive(Debug)]
pub struct VersionStore<T> {
    entries: Mutex<IndexMap<VersionId, T>>,
}

impl<T> Default for VersionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VersionStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
        }
    }

    /// Whether an entry exists for `version`.
    pub fn has(&self, version: VersionId) -> bool {
        lock(&self.entries).contains_key(&version)
    }

    /// Insert or overwrite the entry for `version`.
    ///
    /// Returns the previous value, if any.
    pub fn set(&self, version: VersionId, value: T) -> Option<T> {
        lock(&self.entries).insert(version, value)
    }

    /// Remove the entry for `version`. No-op if absent.
    pub fn erase(&self, version: VersionId) {
        lock(&self.entries).swap_remove(&version);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Returns `true` if no entries are live.
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl<T: Clone> VersionStore<T> {
    /// A copy of the entry for `version`, or `None` if absent.
    pub fn get(&self, version: VersionId) -> Option<T> {
        lock(&self.entries).get(&version).cloned()
    }

    /// Copy of every live entry, ordered by version id.
    pub fn snapshot(&self) -> Vec<(VersionId, T)> {
        let mut entries: Vec<(VersionId, T)> = lock(&self.entries)
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }
}
