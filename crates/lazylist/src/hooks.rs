#![forbid(unsafe_code)]

//! Hook contracts supplied by the host application.
//!
//! A [`Manager`](crate::Manager) is constructed around a [`Hooks`] bundle:
//! the data source ([`Loader`]), the synthesis and ordering functions shared
//! with the background worker, and the frame-side presentation hooks.
//!
//! | Hook | Runs on | Contract |
//! |------|---------|----------|
//! | `loader` | worker | may block arbitrarily long; never called on the frame thread |
//! | `synthesizer` | both | deterministic, side-effect free |
//! | `comparator` | frame | ordering predicate for synchronous insertions |
//! | `allocator` | frame | called at most once per serial per allocation epoch |
//! | `presenter` | frame | pure function of element + state, called per visible index per frame |
//! | `invalidator` | worker | requests a host redraw after a result is ready |

use std::sync::Arc;

use lazylist_core::{Direction, Element, Serial};

/// A batch of elements returned by a [`Loader`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Loaded<T> {
    /// The fetched elements, ordered the same way as the stored sequence.
    pub elements: Vec<T>,
    /// Whether more data may exist past this batch in the requested
    /// direction. `false` suppresses further requests that way until new
    /// elements arrive from the other direction or from a synchronous
    /// mutation. A failed fetch is indistinguishable from `false`; retry and
    /// backoff policy belongs to the loader itself.
    pub has_more: bool,
}

impl<T> Loaded<T> {
    /// A batch with more data expected past it.
    #[must_use]
    pub fn more(elements: Vec<T>) -> Self {
        Self {
            elements,
            has_more: true,
        }
    }

    /// A final batch: whatever it carries, the direction is exhausted.
    #[must_use]
    pub fn end(elements: Vec<T>) -> Self {
        Self {
            elements,
            has_more: false,
        }
    }
}

/// The external data source.
///
/// Called only from the background worker, so it may block on a database,
/// network API, or anything else with unbounded latency. `relative_to` is the
/// boundary serial of the known sequence in the requested direction, or the
/// sentinel when nothing is loaded yet (meaning: fetch from the implicit
/// start or end).
pub trait Loader<T>: Send {
    /// Fetch elements adjacent to `relative_to` in `direction`.
    fn load(&mut self, direction: Direction, relative_to: &Serial) -> Loaded<T>;
}

impl<T, F> Loader<T> for F
where
    F: FnMut(Direction, &Serial) -> Loaded<T> + Send,
{
    fn load(&mut self, direction: Direction, relative_to: &Serial) -> Loaded<T> {
        self(direction, relative_to)
    }
}

/// Shared synthesizer function: expands `(prev, cur, next)` triples into
/// display elements. Must be deterministic and side-effect free.
pub type Synthesizer<T> = Arc<dyn Fn(Option<&T>, &T, Option<&T>) -> Vec<T> + Send + Sync>;

/// Ordering predicate: `true` when the first element orders before the
/// second. Used when synchronous insertions place new elements into the
/// stored sequence.
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Host redraw request, called from the worker after each result.
pub type Invalidator = Arc<dyn Fn() + Send + Sync>;

/// Allocates presentation state for an element the first time it is
/// presented. Returning `None` means no persistent state is needed.
pub type Allocator<T, S> = Box<dyn FnMut(&T) -> Option<S>>;

/// Produces the host's renderable for an element and its cached state.
/// State is `None` exactly for sentinel elements and for serials whose
/// allocator declined.
pub type Presenter<T, S, R> = Box<dyn FnMut(&T, Option<&mut S>) -> R>;

/// The full hook bundle handed to [`Manager::new`](crate::Manager::new).
pub struct Hooks<T, S, R> {
    /// Background data source.
    pub loader: Box<dyn Loader<T>>,
    /// Display-sequence expansion.
    pub synthesizer: Synthesizer<T>,
    /// Ordering predicate for synchronous insertions.
    pub comparator: Comparator<T>,
    /// Presentation-state allocation.
    pub allocator: Allocator<T, S>,
    /// Element presentation.
    pub presenter: Presenter<T, S, R>,
    /// Redraw request.
    pub invalidator: Invalidator,
}

impl<T: Element, S, R> Hooks<T, S, R> {
    /// Build a bundle from the two hooks every host needs, with defaults for
    /// the rest: passthrough synthesis, append-order comparator, no state
    /// allocation, no-op invalidation.
    pub fn new(
        loader: impl Loader<T> + 'static,
        presenter: impl FnMut(&T, Option<&mut S>) -> R + 'static,
    ) -> Self {
        Self {
            loader: Box::new(loader),
            synthesizer: Arc::new(|_, cur: &T, _| vec![cur.clone()]),
            comparator: Arc::new(|_, _| true),
            allocator: Box::new(|_| None),
            presenter: Box::new(presenter),
            invalidator: Arc::new(|| {}),
        }
    }

    /// Replace the synthesizer.
    #[must_use]
    pub fn with_synthesizer(
        mut self,
        f: impl Fn(Option<&T>, &T, Option<&T>) -> Vec<T> + Send + Sync + 'static,
    ) -> Self {
        self.synthesizer = Arc::new(f);
        self
    }

    /// Replace the comparator.
    #[must_use]
    pub fn with_comparator(mut self, f: impl Fn(&T, &T) -> bool + Send + Sync + 'static) -> Self {
        self.comparator = Arc::new(f);
        self
    }

    /// Replace the allocator.
    #[must_use]
    pub fn with_allocator(mut self, f: impl FnMut(&T) -> Option<S> + 'static) -> Self {
        self.allocator = Box::new(f);
        self
    }

    /// Replace the invalidator.
    #[must_use]
    pub fn with_invalidator(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.invalidator = Arc::new(f);
        self
    }
}
