#![forbid(unsafe_code)]

//! Synthesis pipeline.
//!
//! [`synthesize`] expands a raw ordered sequence into the display sequence the
//! host actually renders. For every raw element it invokes the host's
//! synthesizer with the element and its neighbors (`None` at the boundaries)
//! and concatenates whatever the synthesizer returns, in order. This supports:
//!
//! - 1:1 passthrough (return the element alone),
//! - 1:N expansion (prepend a date boundary or unread marker when a predicate
//!   over `prev`/`cur` holds),
//! - N:0 suppression (return an empty vector to drop an element).
//!
//! # Determinism
//!
//! For a fixed input sequence and a fixed synthesizer, the output is identical
//! across runs. Callers rely on this to diff synthesis results cheaply, so
//! synthesizers must be pure. Re-synthesis runs from scratch every time the
//! raw sequence changes; it is not incremental.
//!
//! Each display element remembers the raw index that produced it (the
//! display-to-source mapping). Viewport stabilization uses it to account for
//! synthetic rows that appear and disappear with their source element.

/// The expanded, display-ready sequence derived from a raw sequence.
///
/// Produced by [`synthesize`]; owned and replaced wholesale by the manager on
/// every update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Synthesis<T> {
    elements: Vec<T>,
    to_source: Vec<usize>,
    source_len: usize,
}

impl<T> Synthesis<T> {
    /// An empty synthesis (no raw elements, no display elements).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            elements: Vec::new(),
            to_source: Vec::new(),
            source_len: 0,
        }
    }

    /// Number of display elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the display sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of raw elements this synthesis was derived from.
    #[must_use]
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// The display element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    /// The raw index that produced the display element at `index`.
    #[must_use]
    pub fn source_index(&self, index: usize) -> Option<usize> {
        self.to_source.get(index).copied()
    }

    /// The display sequence as a slice.
    #[must_use]
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Iterate over `(display_index, element)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.elements.iter().enumerate()
    }
}

/// Expand `source` into a display sequence via the per-triple synthesizer.
///
/// `synthesizer(prev, cur, next)` is called once per raw element, with `prev`
/// and `next` being `None` at the sequence boundaries. Returned elements are
/// concatenated in order; all of them map back to `cur`'s raw index.
#[must_use]
pub fn synthesize<T, F>(source: &[T], synthesizer: F) -> Synthesis<T>
where
    F: Fn(Option<&T>, &T, Option<&T>) -> Vec<T>,
{
    let mut elements = Vec::with_capacity(source.len());
    let mut to_source = Vec::with_capacity(source.len());
    for (i, cur) in source.iter().enumerate() {
        let prev = if i > 0 { source.get(i - 1) } else { None };
        let next = source.get(i + 1);
        for out in synthesizer(prev, cur, next) {
            elements.push(out);
            to_source.push(i);
        }
    }
    Synthesis {
        elements,
        to_source,
        source_len: source.len(),
    }
}
