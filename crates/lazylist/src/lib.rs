#![forbid(unsafe_code)]

//! lazylist
//!
//! A virtualized, bidirectionally-paginated list manager. It maintains a
//! logical, potentially unbounded ordered sequence of host-defined elements,
//! loads more from either end as a viewport scrolls, derives synthetic
//! display rows (separators, markers) from the raw sequence, and caches
//! per-element presentation state with explicit compaction — all without
//! knowing how elements are drawn.
//!
//! # Key Components
//!
//! - [`Manager`] - the orchestrator the host render loop drives once per frame
//! - [`Hooks`] / [`Loader`] - the contracts the host supplies: data source,
//!   synthesizer, comparator, allocator, presenter, invalidator
//! - [`ListConfig`] / [`Stickiness`] - prefetch margin and viewport anchoring
//! - [`ManagerStats`] - activity counters
//!
//! The pure data model ([`Element`], [`Serial`], [`Synthesis`],
//! [`StateCache`], [`Viewport`], the prefetch policy) lives in
//! `lazylist-core` and is re-exported here.
//!
//! # How it fits together
//!
//! The host calls [`Manager::updated_len`] once per frame to drain background
//! results and stabilize its scroll position, [`Manager::present`] for each
//! visible index, and [`Manager::evaluate_viewport`] after layout to let the
//! prefetch policy request more data. A single background worker services
//! those requests through the host's [`Loader`], which may block as long as
//! it needs to — the frame thread never waits on it.

pub mod hooks;
pub mod manager;
mod update;
mod worker;

pub use hooks::{Allocator, Comparator, Hooks, Invalidator, Loaded, Loader, Presenter, Synthesizer};
pub use lazylist_core::{
    DEFAULT_PREFETCH, Direction, Element, Serial, StateCache, Synthesis, Viewport, plan,
    synthesize,
};
pub use manager::{ListConfig, Manager, ManagerStats, Stickiness};
