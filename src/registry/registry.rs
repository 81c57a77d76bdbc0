// Package registry keeps the live set of autoload jobs.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, error, info};

use crate::model::entry::LOAD_TIME_SENTINEL;
use crate::model::{AutoLoadEntry, CacheKey, CachePolicy, Codec, Invocation};
use crate::time;

use super::SortType;

/// Pluggable snapshot ordering.
pub type Comparator = dyn Fn(&AutoLoadEntry, &AutoLoadEntry) -> CmpOrdering + Send + Sync;

/// Bounded map from full cache key to its autoload job.
pub struct AutoLoadRegistry {
    entries: DashMap<String, Arc<AutoLoadEntry>>,
    // Reserved slots; never exceeds max_element.
    size: AtomicUsize,
    max_element: usize,
    codec: Arc<dyn Codec>,
    closed: AtomicBool,
}

impl AutoLoadRegistry {
    pub fn new(max_element: usize, codec: Arc<dyn Codec>) -> Self {
        Self {
            entries: DashMap::with_capacity(max_element.min(1 << 16)),
            size: AtomicUsize::new(0),
            max_element,
            codec,
            closed: AtomicBool::new(false),
        }
    }

    pub fn max_element(&self) -> usize {
        self.max_element
    }

    pub fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Registers a job for `key` when the policy qualifies and there is room.
    ///
    /// The invocation is snapshotted before it is stored; a failed snapshot
    /// aborts the registration. When another caller won the race for the same
    /// key, its entry is returned instead.
    pub fn register_if_absent(
        &self,
        key: &CacheKey,
        invocation: &Invocation,
        policy: CachePolicy,
    ) -> Option<Arc<AutoLoadEntry>> {
        if self.is_shutdown() || key.is_empty() || !policy.qualifies_for_autoload() {
            return None;
        }
        if !self.reserve_slot() {
            debug!(
                component = "registry",
                event = "capacity_reached",
                key = %key,
                max_element = self.max_element,
                "autoload registry is full"
            );
            return None;
        }

        let full_key = key.full_key();
        if let Some(existing) = self.entries.get(&full_key) {
            self.release_slot();
            return Some(existing.value().clone());
        }

        let snapshot = match invocation.snapshot(self.codec.as_ref()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.release_slot();
                error!(
                    component = "registry",
                    event = "snapshot_failed",
                    key = %key,
                    error = %e,
                    "failed to snapshot invocation arguments"
                );
                return None;
            }
        };

        let entry = match self.entries.entry(full_key) {
            Entry::Occupied(occupied) => {
                self.release_slot();
                return Some(occupied.get().clone());
            }
            Entry::Vacant(vacant) => {
                let entry = Arc::new(AutoLoadEntry::new(key.clone(), snapshot, policy));
                vacant.insert(entry.clone());
                entry
            }
        };

        // Lost a race with shutdown: do not leave state behind.
        if self.is_shutdown() {
            self.remove_entry(&entry);
            return None;
        }
        Some(entry)
    }

    /// Records a foreground access; no-op when the key is not registered.
    pub fn touch(&self, key: &CacheKey) {
        if let Some(entry) = self.entries.get(&key.full_key()) {
            entry.touch_request(time::now_millis());
        }
    }

    /// Forces the next cycle to reload `key`, unless a refresh is already running.
    pub fn reset_last_load(&self, key: &CacheKey) {
        if let Some(entry) = self.entries.get(&key.full_key()) {
            Self::reset_entry(entry.value());
        }
    }

    /// Resets every entry stored under the routed key `key`: the whole-key
    /// entry and each of its `key:hfield` entries.
    ///
    /// Matching is by registry key, so a plain key named `key:x` is reset too.
    pub fn reset_last_load_under(&self, key: &str) {
        let prefix = format!("{key}:");
        for entry in self.entries.iter() {
            if entry.key() == key || entry.key().starts_with(&prefix) {
                Self::reset_entry(entry.value());
            }
        }
    }

    fn reset_entry(entry: &AutoLoadEntry) {
        if !entry.is_loading() {
            entry.set_last_load_time(LOAD_TIME_SENTINEL);
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<AutoLoadEntry>> {
        self.entries.get(&key.full_key()).map(|e| e.value().clone())
    }

    pub fn remove(&self, key: &CacheKey) -> Option<Arc<AutoLoadEntry>> {
        let removed = self.entries.remove(&key.full_key()).map(|(_, e)| e);
        if removed.is_some() {
            self.release_slot();
        }
        removed
    }

    /// Removes exactly this entry; a newer registration under the same key survives.
    pub fn remove_entry(&self, entry: &Arc<AutoLoadEntry>) -> bool {
        let removed = self
            .entries
            .remove_if(entry.full_key(), |_, current| Arc::ptr_eq(current, entry))
            .is_some();
        if removed {
            self.release_slot();
        }
        removed
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies the live entries, ordered by `comparator` when given.
    pub fn snapshot(&self, comparator: Option<&Comparator>) -> Vec<Arc<AutoLoadEntry>> {
        let mut entries: Vec<Arc<AutoLoadEntry>> =
            self.entries.iter().map(|e| e.value().clone()).collect();
        if let Some(cmp) = comparator {
            entries.sort_by(|a, b| cmp(a.as_ref(), b.as_ref()));
        }
        entries
    }

    pub fn snapshot_sorted(&self, sort_type: SortType) -> Vec<Arc<AutoLoadEntry>> {
        match sort_type.comparator() {
            Some(cmp) => self.snapshot(Some(&cmp)),
            None => self.snapshot(None),
        }
    }

    /// Makes the registry inert and drops every entry.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let released = self.entries.len();
        self.entries.clear();
        self.size.store(0, Ordering::Release);
        info!(
            component = "registry",
            event = "shutdown",
            released,
            "autoload registry shut down"
        );
    }

    fn reserve_slot(&self) -> bool {
        let max = self.max_element;
        self.size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                if n < max {
                    Some(n + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    fn release_slot(&self) {
        let _ = self
            .size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}
