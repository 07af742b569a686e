#![forbid(unsafe_code)]

//! Update batches and the sequence arithmetic behind them.
//!
//! Every change to the stored sequence — a background load or a synchronous
//! modification — becomes a [`StateUpdate`]: a complete replacement synthesis
//! plus the bookkeeping the manager needs to apply it atomically. The
//! bookkeeping is the `source_map`, recording where each raw element of the
//! previous sequence landed in the new one (`None` when removed). Viewport
//! stabilization reads it, together with both display-to-source tables, to
//! shift the host's first-visible index by exactly the net display-element
//! change above the window.

use std::collections::HashSet;

use lazylist_core::{Direction, Element, Serial, Synthesis};

use crate::hooks::Comparator;

/// Where an update batch came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum UpdateOrigin {
    /// Produced by the background worker from a loader result.
    Load {
        direction: Direction,
        has_more: bool,
        /// How many elements the loader returned (before dedup).
        loaded: usize,
    },
    /// Produced synchronously by `Manager::modify`.
    Modify,
}

/// An atomic replacement of the stored sequence and its display form.
pub(crate) struct StateUpdate<T> {
    pub synthesis: Synthesis<T>,
    pub raw: Vec<T>,
    /// Old raw index → new raw index, `None` for removed elements.
    pub source_map: Vec<Option<usize>>,
    /// Serials whose cache entries must drop with this update.
    pub compact: Vec<Serial>,
    pub origin: UpdateOrigin,
    /// Generation of the raw sequence this update was computed against.
    pub generation: u64,
}

/// A request for more elements adjacent to the known sequence.
pub(crate) struct LoadRequest<T> {
    pub direction: Direction,
    /// Boundary serial in the requested direction; sentinel when nothing is
    /// loaded yet.
    pub relative_to: Serial,
    /// Snapshot of the raw sequence the worker merges into. The worker owns
    /// this copy outright, so it never aliases manager storage.
    pub base: Vec<T>,
    pub generation: u64,
}

/// Merge a loaded batch into a raw-sequence snapshot.
///
/// Loads are adjacent to the boundary they were requested against, so a
/// `Before` batch prepends and an `After` batch appends. Elements whose
/// serial already exists in the snapshot replace the stored element in place
/// instead of duplicating it.
pub(crate) fn merge_loaded<T: Element>(
    mut base: Vec<T>,
    loaded: Vec<T>,
    direction: Direction,
) -> (Vec<T>, Vec<Option<usize>>) {
    let base_len = base.len();
    let mut fresh: Vec<T> = Vec::with_capacity(loaded.len());
    for element in loaded {
        let serial = element.serial();
        if !serial.is_none() {
            if let Some(slot) = base.iter_mut().find(|b| b.serial() == serial) {
                *slot = element;
                continue;
            }
        }
        fresh.push(element);
    }

    let (raw, source_map) = match direction {
        Direction::Before => {
            let shift = fresh.len();
            fresh.extend(base);
            (fresh, (0..base_len).map(|i| Some(i + shift)).collect())
        }
        Direction::After => {
            base.extend(fresh);
            (base, (0..base_len).map(Some).collect())
        }
    };
    debug_assert_unique_serials(&raw);
    (raw, source_map)
}

/// Apply a synchronous modification to a raw-sequence snapshot.
///
/// Removals happen first; additions then either replace an element with the
/// same serial in place or insert at the position the comparator picks: after
/// every stored element that orders before the new one. The trivial
/// always-true comparator therefore appends.
pub(crate) fn apply_modification<T: Element>(
    base: &[T],
    added: Vec<T>,
    removed: &[Serial],
    comparator: &Comparator<T>,
) -> (Vec<T>, Vec<Option<usize>>) {
    let removed: HashSet<&Serial> = removed.iter().filter(|s| !s.is_none()).collect();

    let mut raw: Vec<T> = Vec::with_capacity(base.len() + added.len());
    let mut source_map: Vec<Option<usize>> = Vec::with_capacity(base.len());
    for element in base {
        let serial = element.serial();
        if !serial.is_none() && removed.contains(&serial) {
            source_map.push(None);
        } else {
            source_map.push(Some(raw.len()));
            raw.push(element.clone());
        }
    }

    for element in added {
        let serial = element.serial();
        if !serial.is_none() {
            if let Some(i) = raw.iter().position(|b| b.serial() == serial) {
                raw[i] = element;
                continue;
            }
        }
        let at = raw
            .iter()
            .position(|b| !comparator(b, &element))
            .unwrap_or(raw.len());
        raw.insert(at, element);
        for slot in source_map.iter_mut().flatten() {
            if *slot >= at {
                *slot += 1;
            }
        }
    }
    debug_assert_unique_serials(&raw);
    (raw, source_map)
}

/// Shift the first-visible display index across a sequence replacement.
///
/// The shift is the net display-element change at or above the window:
/// display elements whose source element was removed and sat at or before
/// `first` pull it down; display elements produced by newly-inserted source
/// elements above the window push it up. Synthetic rows count through their
/// originating source element, which is what keeps the index stable when a
/// separator vanishes together with the element it was derived from.
pub(crate) fn stabilize<T>(
    old: &Synthesis<T>,
    new: &Synthesis<T>,
    source_map: &[Option<usize>],
    first: isize,
) -> isize {
    if first < 0 || old.is_empty() {
        return first;
    }
    let anchor_index = (first as usize).min(old.len() - 1);

    let mut removed_at_or_before = 0usize;
    for i in 0..=anchor_index {
        let src = old
            .source_index(i)
            .expect("display index within bounds has a source");
        if source_map.get(src).copied().flatten().is_none() {
            removed_at_or_before += 1;
        }
    }

    // First surviving source element at or after the window start, located in
    // the new sequence. Insertions ahead of it sit above the window.
    let anchor_src = old
        .source_index(anchor_index)
        .expect("display index within bounds has a source");
    let anchor_new = (anchor_src..source_map.len()).find_map(|j| source_map[j]);

    let inserted_above = match anchor_new {
        Some(anchor) => {
            let mut from_old = vec![false; new.source_len()];
            for slot in source_map.iter().flatten() {
                from_old[*slot] = true;
            }
            (0..new.len())
                .filter(|&i| {
                    let src = new
                        .source_index(i)
                        .expect("display index within bounds has a source");
                    src < anchor && !from_old[src]
                })
                .count()
        }
        // Everything from the window onward was removed; nothing left to
        // anchor insertions against.
        None => 0,
    };

    (first - removed_at_or_before as isize + inserted_above as isize).max(0)
}

fn debug_assert_unique_serials<T: Element>(raw: &[T]) {
    if cfg!(debug_assertions) {
        let mut seen = HashSet::new();
        for element in raw {
            let serial = element.serial();
            if !serial.is_none() {
                assert!(
                    seen.insert(serial.clone()),
                    "serial collision in stored sequence: {serial}"
                );
            }
        }
    }
}
