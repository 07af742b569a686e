#![forbid(unsafe_code)]

//! Core data model for lazylist.
//!
//! This crate holds the pure half of the virtualized list system: element
//! identity, the synthesis pipeline that derives the display sequence, the
//! per-element presentation-state cache, and the viewport-driven prefetch
//! policy. Nothing here spawns threads or performs I/O; the orchestration
//! lives in the `lazylist` crate.
//!
//! # Key Components
//!
//! - [`Serial`] / [`Element`] - stable element identity and the capability
//!   trait host row types implement
//! - [`Synthesis`] / [`synthesize`] - expansion of a raw sequence into the
//!   display sequence (separators, duplication, suppression)
//! - [`StateCache`] - lazily-allocated, explicitly-compacted presentation
//!   state keyed by serial
//! - [`Viewport`] / [`plan`] - the pure prefetch policy deciding when to load
//!   more elements, and from which end

pub mod prefetch;
pub mod serial;
pub mod state;
pub mod synthesis;

pub use prefetch::{DEFAULT_PREFETCH, Direction, Viewport, plan};
pub use serial::{Element, Serial};
pub use state::StateCache;
pub use synthesis::{Synthesis, synthesize};
