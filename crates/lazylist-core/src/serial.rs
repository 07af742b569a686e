//! Element identity.
//!
//! Every list element exposes a [`Serial`]: an opaque, stable string identity
//! used to key presentation state, to address load requests ("give me more
//! elements before/after this one"), and to diff sequences across updates.
//!
//! # Design Invariants
//!
//! 1. **Uniqueness**: among concurrently-tracked elements whose serial is not
//!    the sentinel, no two share a `Serial`. A collision means a misbehaving
//!    data source and fails fast in test builds.
//!
//! 2. **Sentinel**: the empty serial ([`Serial::none`]) marks synthetic or
//!    ephemeral elements. Sentinel elements are never cached, never targeted
//!    by loads, and never deduplicated against previous frames.
//!
//! 3. **Cheap extraction**: [`Element::serial`] must be O(1) and side-effect
//!    free; it is called for every visible element on every frame. `Serial`
//!    wraps `Arc<str>` so cloning never copies the text.

use std::fmt;
use std::sync::Arc;

/// Opaque stable identity for a list element.
///
/// The empty serial is the identity-less sentinel; see [`Serial::none`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Serial(Arc<str>);

impl Serial {
    /// Create a serial from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The identity-less sentinel.
    ///
    /// Elements carrying this serial are treated as freshly rendered every
    /// frame: no state is allocated for them and no load request targets them.
    #[must_use]
    pub fn none() -> Self {
        Self(Arc::from(""))
    }

    /// Whether this serial is the sentinel.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    /// The serial text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Serial {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&str> for Serial {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Serial {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for Serial {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("<none>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// A list element with a stable identity.
///
/// Host applications implement this on their row type — typically a closed
/// enum of row kinds where concrete variants carry a serial field and
/// synthetic variants (separators, markers) return [`Serial::none`]:
///
/// ```
/// use lazylist_core::{Element, Serial};
///
/// #[derive(Clone)]
/// enum Row {
///     Message { id: u64, body: String },
///     DateBoundary,
/// }
///
/// impl Element for Row {
///     fn serial(&self) -> Serial {
///         match self {
///             Row::Message { id, .. } => Serial::from(format!("msg-{id}")),
///             Row::DateBoundary => Serial::none(),
///         }
///     }
/// }
/// ```
///
/// The manager never inspects an element beyond its serial; everything else
/// flows through the host's hooks.
pub trait Element: Clone + Send + 'static {
    /// The element's stable identity.
    ///
    /// Must be O(1) and side-effect free.
    fn serial(&self) -> Serial;
}
