#![forbid(unsafe_code)]

//! Presentation-state cache.
//!
//! Maps element serials to host-allocated presentation state. Entries are
//! created lazily the first time a stateful element is presented, retained
//! across frames, and removed only by explicit compaction — there is no LRU
//! and no size bound.
//!
//! # Design Invariants
//!
//! 1. **Allocate once**: the allocator runs at most once per serial between
//!    allocation and the next compaction of that serial. An allocator that
//!    returns `None` ("no persistent state needed") is remembered: the entry
//!    stays, and later presentations of that serial receive `None` without
//!    re-running the allocator.
//!
//! 2. **No sentinel entries**: the cache never holds an entry for the
//!    sentinel serial. Callers skip the cache entirely for sentinel elements;
//!    reaching it with one is a programmer error.
//!
//! 3. **Unconditional compaction**: naming a serial in a compaction batch
//!    deletes its entry even if the element is still present in the display
//!    sequence, forcing a fresh allocation on the next presentation.

use std::collections::HashMap;

use crate::serial::Serial;

/// Cache of per-element presentation state, keyed by [`Serial`].
#[derive(Debug, Default)]
pub struct StateCache<S> {
    entries: HashMap<Serial, Option<S>>,
}

impl<S> StateCache<S> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Number of live entries, counting allocated-but-stateless ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry exists for `serial`.
    #[must_use]
    pub fn contains(&self, serial: &Serial) -> bool {
        self.entries.contains_key(serial)
    }

    /// Fetch the state for `serial`, running `alloc` if no entry exists yet.
    ///
    /// Returns `None` either when the allocator declined to allocate for this
    /// serial or when the entry was allocated stateless earlier.
    ///
    /// # Panics
    ///
    /// In test builds, panics if called with the sentinel serial — sentinel
    /// elements are stateless by contract and must bypass the cache.
    pub fn get_or_allocate(
        &mut self,
        serial: &Serial,
        alloc: impl FnOnce() -> Option<S>,
    ) -> Option<&mut S> {
        debug_assert!(
            !serial.is_none(),
            "state cache must never be reached with the sentinel serial"
        );
        self.entries
            .entry(serial.clone())
            .or_insert_with(alloc)
            .as_mut()
    }

    /// Delete the entries named in `serials`, returning how many existed.
    ///
    /// Sentinel serials in the batch are ignored.
    pub fn compact<'a>(&mut self, serials: impl IntoIterator<Item = &'a Serial>) -> usize {
        serials
            .into_iter()
            .filter(|s| !s.is_none())
            .filter(|s| self.entries.remove(s).is_some())
            .count()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_once_per_serial() {
        let mut cache: StateCache<u32> = StateCache::new();
        let serial = Serial::from("row-1");
        let mut calls = 0;

        for _ in 0..3 {
            let state = cache.get_or_allocate(&serial, || {
                calls += 1;
                Some(7)
            });
            assert_eq!(state.copied(), Some(7));
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn stateless_allocation_is_remembered() {
        let mut cache: StateCache<u32> = StateCache::new();
        let serial = Serial::from("row-2");
        let mut calls = 0;

        for _ in 0..3 {
            let state = cache.get_or_allocate(&serial, || {
                calls += 1;
                None
            });
            assert!(state.is_none());
        }
        // The declined allocation still occupies an entry so the allocator
        // does not run again.
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&serial));
    }

    #[test]
    fn compaction_forces_reallocation() {
        let mut cache: StateCache<u32> = StateCache::new();
        let serial = Serial::from("row-3");
        let mut calls = 0;
        let mut alloc = || {
            calls += 1;
            Some(calls)
        };

        let _ = cache.get_or_allocate(&serial, &mut alloc);
        assert_eq!(cache.compact([&serial]), 1);
        assert!(!cache.contains(&serial));

        let state = cache.get_or_allocate(&serial, &mut alloc);
        assert_eq!(state.copied(), Some(2));
        assert_eq!(calls, 2);
    }

    #[test]
    fn compaction_ignores_unknown_and_sentinel_serials() {
        let mut cache: StateCache<u32> = StateCache::new();
        let kept = Serial::from("kept");
        let _ = cache.get_or_allocate(&kept, || Some(1));

        let unknown = Serial::from("never-allocated");
        let sentinel = Serial::none();
        assert_eq!(cache.compact([&unknown, &sentinel]), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn state_is_mutable_in_place() {
        let mut cache: StateCache<Vec<u8>> = StateCache::new();
        let serial = Serial::from("row-4");

        cache
            .get_or_allocate(&serial, || Some(vec![1]))
            .unwrap()
            .push(2);
        let state = cache.get_or_allocate(&serial, || unreachable!());
        assert_eq!(state.unwrap(), &[1, 2]);
    }

    #[test]
    #[should_panic(expected = "sentinel")]
    fn sentinel_serial_is_rejected() {
        let mut cache: StateCache<u32> = StateCache::new();
        let _ = cache.get_or_allocate(&Serial::none(), || Some(0));
    }
}
