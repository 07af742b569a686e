#![forbid(unsafe_code)]

//! List manager: the orchestrator tying the pieces together.
//!
//! A [`Manager`] owns the applied display sequence and the presentation-state
//! cache, runs one background load worker, and exposes the per-frame surface
//! the host render loop drives:
//!
//! 1. [`Manager::updated_len`] — drain pending results, apply them FIFO,
//!    stabilize the viewport, return the display length.
//! 2. [`Manager::present`] — resolve one visible index into the host's
//!    renderable, allocating state lazily.
//! 3. [`Manager::evaluate_viewport`] — decide whether to request more data.
//!
//! # Key Invariants
//!
//! 1. **Frame thread never blocks**: results drain with `try_recv`, requests
//!    enqueue on an unbounded channel, and the loader only ever runs on the
//!    worker.
//! 2. **Atomic replacement**: each applied update swaps the entire synthesis;
//!    `updated_len` and `present` are consistent within a frame.
//! 3. **Single writer**: the synthesis and the state cache are only mutated
//!    on the frame thread, during drain or `modify`.
//! 4. **Explicit lifecycle**: [`Manager::shutdown`] (or `Drop`) closes both
//!    channels; the worker exits after any in-flight load. `modify` stays
//!    safe to call afterwards.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use lazylist_core::{Direction, Element, Serial, StateCache, Synthesis, Viewport, plan, synthesize};

use crate::hooks::{Allocator, Comparator, Hooks, Presenter, Synthesizer};
use crate::update::{self, LoadRequest, StateUpdate, UpdateOrigin};

/// Which end of the visible window is held fixed when the sequence changes
/// around it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Stickiness {
    /// Anchor the first visible element: insertions and removals above the
    /// window shift the recorded first-visible index so the same content
    /// stays on screen.
    #[default]
    Before,
    /// As `Before`, except a window already showing the end stays pinned to
    /// the end as elements append — the chat follow-mode behavior.
    After,
}

/// Manager configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ListConfig {
    /// Fraction of the sequence treated as a prefetch zone at each end.
    /// Zero or negative falls back to
    /// [`DEFAULT_PREFETCH`](lazylist_core::DEFAULT_PREFETCH).
    pub prefetch: f32,
    /// Viewport anchoring policy.
    pub stickiness: Stickiness,
}

impl ListConfig {
    /// Set the prefetch fraction.
    #[must_use]
    pub fn with_prefetch(mut self, prefetch: f32) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Set the stickiness policy.
    #[must_use]
    pub fn with_stickiness(mut self, stickiness: Stickiness) -> Self {
        self.stickiness = stickiness;
        self
    }
}

/// Counters describing a manager's activity so far.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ManagerStats {
    /// Allocator invocations (one per serial per allocation epoch).
    pub allocations: u64,
    /// Presenter invocations.
    pub presentations: u64,
    /// Cache entries dropped by compaction batches.
    pub compactions: u64,
    /// Load requests handed to the worker.
    pub loads_issued: u64,
    /// Updates applied to the display sequence.
    pub updates_applied: u64,
    /// Worker results discarded because a synchronous modification made them
    /// stale.
    pub updates_discarded: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Running,
    ShutDown,
}

/// A virtualized, bidirectionally-paginated list manager.
///
/// Generic over the host's element type `T`, per-element state `S`, and
/// renderable `R`. Construct with [`Manager::new`]; drive once per frame with
/// [`updated_len`](Self::updated_len), [`present`](Self::present), and
/// [`evaluate_viewport`](Self::evaluate_viewport).
pub struct Manager<T: Element, S, R> {
    config: ListConfig,
    phase: Phase,
    /// Bumped by every synchronous modification; worker results stamped with
    /// an older generation are discarded on arrival.
    generation: u64,
    raw: Vec<T>,
    synthesis: Synthesis<T>,
    cache: StateCache<S>,
    /// Updates waiting to be applied at the next `updated_len`.
    pending: VecDeque<StateUpdate<T>>,
    in_flight: Option<Direction>,
    ended_before: bool,
    ended_after: bool,
    allocator: Allocator<T, S>,
    presenter: Presenter<T, S, R>,
    synthesizer: Synthesizer<T>,
    comparator: Comparator<T>,
    requests: Option<Sender<LoadRequest<T>>>,
    results: Option<Receiver<StateUpdate<T>>>,
    worker: Option<JoinHandle<()>>,
    stats: ManagerStats,
}

impl<T: Element, S, R> Manager<T, S, R> {
    /// Build a manager and spawn its load worker.
    #[must_use]
    pub fn new(config: ListConfig, hooks: Hooks<T, S, R>) -> Self {
        let (req_tx, req_rx) = mpsc::channel();
        let (res_tx, res_rx) = mpsc::channel();
        let worker = crate::worker::spawn(
            hooks.loader,
            hooks.synthesizer.clone(),
            hooks.invalidator,
            req_rx,
            res_tx,
        );
        Self {
            config,
            phase: Phase::Running,
            generation: 0,
            raw: Vec::new(),
            synthesis: Synthesis::empty(),
            cache: StateCache::new(),
            pending: VecDeque::new(),
            in_flight: None,
            ended_before: false,
            ended_after: false,
            allocator: hooks.allocator,
            presenter: hooks.presenter,
            synthesizer: hooks.synthesizer,
            comparator: hooks.comparator,
            requests: Some(req_tx),
            results: Some(res_rx),
            worker: Some(worker),
            stats: ManagerStats::default(),
        }
    }

    /// Drain pending results, apply them in order, stabilize `viewport`, and
    /// return the current display length.
    ///
    /// This is the once-per-frame synchronization point: call it before
    /// sizing the virtualization window, and before any [`present`] calls
    /// for the frame. Never blocks.
    ///
    /// [`present`]: Self::present
    pub fn updated_len(&mut self, viewport: &mut Viewport) -> usize {
        self.drain_results();
        while let Some(batch) = self.pending.pop_front() {
            self.apply_update(batch, viewport);
        }
        self.synthesis.len()
    }

    /// The display length as of the last [`updated_len`](Self::updated_len).
    ///
    /// Does not drain results; useful between frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.synthesis.len()
    }

    /// Whether the display sequence is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.synthesis.is_empty()
    }

    /// Resolve the display element at `index` into the host's renderable,
    /// allocating presentation state on first sight of a stateful serial.
    ///
    /// `index` must come from the current frame, i.e. be below the value the
    /// last [`updated_len`](Self::updated_len) returned. An out-of-range
    /// index is a programmer error: it panics in test builds and yields
    /// `None` in release builds.
    pub fn present(&mut self, index: usize) -> Option<R> {
        let Some(element) = self.synthesis.get(index) else {
            debug_assert!(
                false,
                "present called with out-of-range index {index} (len {})",
                self.synthesis.len()
            );
            return None;
        };
        self.stats.presentations += 1;

        let serial = element.serial();
        let state = if serial.is_none() {
            None
        } else {
            let allocator = &mut self.allocator;
            let allocations = &mut self.stats.allocations;
            self.cache.get_or_allocate(&serial, || {
                *allocations += 1;
                allocator(element)
            })
        };
        Some((self.presenter)(element, state))
    }

    /// Apply the prefetch policy to `viewport` and, if it asks for one,
    /// enqueue a load request.
    ///
    /// At most one request is in flight at a time, so redundant evaluations
    /// coalesce into the pending one; evaluations in a direction the loader
    /// has declared exhausted are no-ops.
    pub fn evaluate_viewport(&mut self, viewport: Viewport) {
        if self.phase != Phase::Running || self.in_flight.is_some() {
            return;
        }
        let total = self.synthesis.len();
        let Some(direction) = plan(viewport, total, self.config.prefetch) else {
            return;
        };
        let ended = match direction {
            Direction::Before => self.ended_before,
            Direction::After => self.ended_after,
        };
        if ended {
            return;
        }

        let base: Vec<T> = self.staged_raw().to_vec();
        let relative_to = boundary_serial(&base, direction);
        let Some(requests) = self.requests.as_ref() else {
            return;
        };
        let request = LoadRequest {
            direction,
            relative_to,
            base,
            generation: self.generation,
        };
        if requests.send(request).is_ok() {
            self.in_flight = Some(direction);
            self.stats.loads_issued += 1;
            tracing::debug!(%direction, total, "load requested");
        }
    }

    /// Synchronously mutate the stored sequence, bypassing the loader.
    ///
    /// `added` elements replace same-serial elements in place or insert at
    /// the position the comparator picks; `changed` serials keep their
    /// element but drop its cached state; `removed` serials leave the
    /// sequence and drop their state. The resulting update is applied — with
    /// viewport stabilization — at the next
    /// [`updated_len`](Self::updated_len).
    ///
    /// Safe to call after [`shutdown`](Self::shutdown): the mutation still
    /// lands in the in-memory sequence and cache, it just has no worker to
    /// race with.
    pub fn modify(&mut self, added: Vec<T>, changed: &[Serial], removed: &[Serial]) {
        let added_any = !added.is_empty();
        let (raw, source_map) =
            update::apply_modification(self.staged_raw(), added, removed, &self.comparator);
        let synthesis = synthesize(&raw, |prev, cur, next| (self.synthesizer)(prev, cur, next));

        let compact: Vec<Serial> = removed
            .iter()
            .chain(changed)
            .filter(|s| !s.is_none())
            .cloned()
            .collect();

        self.generation += 1;
        tracing::debug!(
            raw_len = raw.len(),
            compact = compact.len(),
            generation = self.generation,
            "sequence modified"
        );
        self.pending.push_back(StateUpdate {
            synthesis,
            raw,
            source_map,
            compact,
            origin: UpdateOrigin::Modify,
            generation: self.generation,
        });
        if added_any {
            self.ended_before = false;
            self.ended_after = false;
        }
    }

    /// Stop the background worker and close both channels. Idempotent.
    ///
    /// The worker finishes any load already in flight, finds its channels
    /// closed, and exits; nothing further is applied. `modify` remains
    /// callable.
    pub fn shutdown(&mut self) {
        if self.phase == Phase::ShutDown {
            return;
        }
        self.phase = Phase::ShutDown;
        self.requests = None;
        self.results = None;
        self.in_flight = None;
        tracing::debug!("list manager shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.phase == Phase::ShutDown
    }

    /// Whether the worker thread has exited.
    ///
    /// Becomes true some time after [`shutdown`](Self::shutdown) — once any
    /// in-flight load returns.
    #[must_use]
    pub fn worker_exited(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Number of live presentation-state entries.
    #[must_use]
    pub fn cached_states(&self) -> usize {
        self.cache.len()
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> ManagerStats {
        self.stats
    }

    /// The raw sequence as the most recent pending update left it, falling
    /// back to the applied sequence. Modifications and load snapshots build
    /// on this so queued updates chain correctly.
    fn staged_raw(&self) -> &[T] {
        self.pending.back().map_or(&self.raw, |u| &u.raw)
    }

    fn drain_results(&mut self) {
        let Some(results) = self.results.as_ref() else {
            return;
        };
        let mut drained = Vec::new();
        while let Ok(batch) = results.try_recv() {
            drained.push(batch);
        }
        for batch in drained {
            if let UpdateOrigin::Load { direction, .. } = batch.origin {
                if self.in_flight == Some(direction) {
                    self.in_flight = None;
                }
            }
            self.pending.push_back(batch);
        }
    }

    fn apply_update(&mut self, batch: StateUpdate<T>, viewport: &mut Viewport) {
        if let UpdateOrigin::Load {
            direction,
            has_more,
            loaded,
        } = batch.origin
        {
            if batch.generation != self.generation {
                self.stats.updates_discarded += 1;
                tracing::debug!(
                    %direction,
                    stale = batch.generation,
                    current = self.generation,
                    "stale load result discarded"
                );
                return;
            }
            if !has_more {
                match direction {
                    Direction::Before => self.ended_before = true,
                    Direction::After => self.ended_after = true,
                }
            }
            if loaded > 0 {
                match direction.opposite() {
                    Direction::Before => self.ended_before = false,
                    Direction::After => self.ended_after = false,
                }
            }
        }

        let was_at_end =
            viewport.first + viewport.visible as isize >= self.synthesis.len() as isize;
        let stabilized = update::stabilize(
            &self.synthesis,
            &batch.synthesis,
            &batch.source_map,
            viewport.first,
        );
        viewport.first = if self.config.stickiness == Stickiness::After && was_at_end {
            (batch.synthesis.len() as isize - viewport.visible as isize).max(0)
        } else {
            stabilized
        };

        self.stats.compactions += self.cache.compact(batch.compact.iter()) as u64;
        self.raw = batch.raw;
        self.synthesis = batch.synthesis;
        self.stats.updates_applied += 1;
    }
}

impl<T: Element, S, R> Drop for Manager<T, S, R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn boundary_serial<T: Element>(raw: &[T], direction: Direction) -> Serial {
    let found = match direction {
        Direction::Before => raw.iter().map(Element::serial).find(|s| !s.is_none()),
        Direction::After => raw.iter().rev().map(Element::serial).find(|s| !s.is_none()),
    };
    found.unwrap_or_else(Serial::none)
}
