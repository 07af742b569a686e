#![forbid(unsafe_code)]

//! Viewport-driven prefetch policy.
//!
//! [`plan`] is a pure function from the current viewport to at most one load
//! direction. The host evaluates it once per frame after layout; the manager
//! turns the answer into a load request.
//!
//! # Policy
//!
//! The fractional position of the visible window's center inside the loaded
//! sequence decides everything: a center inside the leading `prefetch`
//! fraction requests [`Direction::Before`], a center inside the trailing
//! fraction requests [`Direction::After`]. Overscroll (`first < 0`, or the
//! window extending past the end) short-circuits to the matching direction.
//!
//! # Short lists
//!
//! One prefetch zone spans `ceil(prefetch * total)` whole elements. When the
//! sequence is shorter than two such zones plus a visible window, no window
//! placement can keep clear of both zones at once, and the center test above
//! degenerates. To keep short lists from starving, the policy then answers
//! `After` for any non-overscrolled viewport (and still `Before` for
//! `first < 0`). An empty sequence is the extreme case: the first evaluation
//! always requests `After`.

use std::fmt;

/// Fraction of the sequence treated as a prefetch zone at each end when the
/// configured value is zero or unset.
pub const DEFAULT_PREFETCH: f32 = 0.2;

/// Which end of the sequence a load request targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    /// Load elements preceding the known sequence.
    Before,
    /// Load elements following the known sequence.
    After,
}

impl Direction {
    /// The other direction.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// What the host render loop currently shows.
///
/// `first` is signed: hosts report overscrolled positions past either end
/// while a scroll gesture settles.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Viewport {
    /// Index of the first visible display element.
    pub first: isize,
    /// Number of visible display elements.
    pub visible: usize,
}

impl Viewport {
    /// Construct a viewport.
    #[must_use]
    pub fn new(first: isize, visible: usize) -> Self {
        Self { first, visible }
    }
}

/// Decide whether the viewport warrants a load request, and in which
/// direction.
///
/// `total` is the current display-sequence length; `prefetch` is the zone
/// fraction, with values `<= 0` falling back to [`DEFAULT_PREFETCH`]. At most
/// one direction is returned per evaluation; ties prefer `Before` except
/// under the short-list rule described in the module docs.
#[must_use]
pub fn plan(viewport: Viewport, total: usize, prefetch: f32) -> Option<Direction> {
    let prefetch = if prefetch <= 0.0 {
        DEFAULT_PREFETCH
    } else {
        prefetch
    };

    if viewport.first < 0 {
        return Some(Direction::Before);
    }

    // Short-list starvation guard: no window placement clears both zones.
    let margin = (prefetch * total as f32).ceil() as usize;
    if total < 2 * margin + viewport.visible.max(1) {
        #[cfg(feature = "tracing")]
        tracing::trace!(total, margin, "short sequence, requesting after");
        return Some(Direction::After);
    }

    let center = viewport.first + (viewport.visible / 2) as isize;
    let frac = center as f32 / total as f32;
    let before = frac <= prefetch;
    let after =
        frac >= 1.0 - prefetch || viewport.first + viewport.visible as isize > total as isize;

    let decision = if before {
        Some(Direction::Before)
    } else if after {
        Some(Direction::After)
    } else {
        None
    };
    #[cfg(feature = "tracing")]
    tracing::trace!(first = viewport.first, frac, ?decision, "prefetch evaluated");
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(first: isize) -> Viewport {
        Viewport::new(first, 1)
    }

    #[test]
    fn leading_zone_requests_before() {
        for first in [0, 1, 2] {
            assert_eq!(
                plan(at(first), 10, 0.2),
                Some(Direction::Before),
                "first={first}"
            );
        }
    }

    #[test]
    fn middle_requests_nothing() {
        for first in [3, 4, 5, 6, 7] {
            assert_eq!(plan(at(first), 10, 0.2), None, "first={first}");
        }
    }

    #[test]
    fn trailing_zone_requests_after() {
        for first in [8, 9] {
            assert_eq!(
                plan(at(first), 10, 0.2),
                Some(Direction::After),
                "first={first}"
            );
        }
    }

    #[test]
    fn overscroll_past_end_requests_after() {
        assert_eq!(plan(at(10), 10, 0.2), Some(Direction::After));
        assert_eq!(plan(at(12), 10, 0.2), Some(Direction::After));
    }

    #[test]
    fn overscroll_before_start_requests_before() {
        assert_eq!(plan(at(-1), 10, 0.2), Some(Direction::Before));
    }

    #[test]
    fn zero_prefetch_defaults() {
        for first in -1..=10 {
            assert_eq!(
                plan(at(first), 10, 0.0),
                plan(at(first), 10, DEFAULT_PREFETCH),
                "first={first}"
            );
        }
    }

    #[test]
    fn short_list_never_starves() {
        // Two elements leave no neutral middle; every settled position keeps
        // asking for more data at the end.
        for first in [0, 1] {
            assert_eq!(
                plan(at(first), 2, 0.15),
                Some(Direction::After),
                "first={first}"
            );
        }
        assert_eq!(plan(at(-1), 2, 0.15), Some(Direction::Before));
    }

    #[test]
    fn empty_sequence_requests_after() {
        assert_eq!(plan(at(0), 0, 0.2), Some(Direction::After));
    }

    #[test]
    fn window_center_shifts_the_zones() {
        // A 4-tall window centers at first + 2, so the before zone ends
        // earlier and the after zone starts earlier than with visible = 1.
        assert_eq!(plan(Viewport::new(0, 4), 20, 0.2), Some(Direction::Before));
        assert_eq!(plan(Viewport::new(2, 4), 20, 0.2), Some(Direction::Before));
        assert_eq!(plan(Viewport::new(3, 4), 20, 0.2), None);
        assert_eq!(plan(Viewport::new(13, 4), 20, 0.2), None);
        assert_eq!(plan(Viewport::new(14, 4), 20, 0.2), Some(Direction::After));
    }

    #[test]
    fn opposite_flips() {
        assert_eq!(Direction::Before.opposite(), Direction::After);
        assert_eq!(Direction::After.opposite(), Direction::Before);
    }

    proptest! {
        #[test]
        fn long_list_middle_is_quiet(
            total in 50usize..500,
            visible in 1usize..10,
        ) {
            // With a generous middle, a window dead-center never triggers.
            let first = (total / 2) as isize;
            prop_assert_eq!(plan(Viewport::new(first, visible), total, 0.2), None);
        }

        #[test]
        fn at_most_one_direction(
            first in -5isize..505,
            visible in 0usize..10,
            total in 0usize..500,
            prefetch in 0.0f32..0.45,
        ) {
            // Policy always terminates with zero or one answer; overscroll
            // before the start always wins Before.
            let decision = plan(Viewport::new(first, visible), total, prefetch);
            if first < 0 {
                prop_assert_eq!(decision, Some(Direction::Before));
            }
        }
    }
}
