//! Strongly-typed identifiers.

use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A coordinate in grid-space, `(x, y)`.
///
/// Uses a fixed-size pair rather than a general N-dimensional vector: every
/// topology the step engine serves (§3 `PatchGrid`) is a 2-D rectangle.
pub type GridCoord = (i64, i64);

/// A coordinate in an arbitrary numeric space, used by spatial queries that
/// need to carry either grid or earth coordinates.
///
/// `SmallVec<[f64; 2]>` avoids heap allocation for the 2-D case that covers
/// every topology in this workspace.
pub type Coord = SmallVec<[f64; 2]>;

static ENTITY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique, process-wide identifier for an entity instance.
///
/// Allocated from a monotonic atomic counter via [`EntityId::next`], the
/// same pattern `SpaceInstanceId` uses in the sibling spatial crate: two
/// entities never compare equal even if built from the same prototype at
/// the same coordinate, which matters once organisms are created and
/// destroyed within a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocate a fresh, unique entity ID. Thread-safe.
    pub fn next() -> Self {
        Self(ENTITY_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of entity, determining which synthetic scopes apply to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// The singleton simulation entity, reachable as `meta` from any scope.
    Simulation,
    /// A grid cell. Owns zero or more organisms.
    Patch,
    /// An agent bound to a patch as `parent`.
    Organism,
    /// A handle to a precomputed grid, reachable via `external`.
    ExternalResource,
}

impl EntityKind {
    /// Whether this kind is a `MemberSpatialEntity` (exposes `parent`).
    pub fn is_member_spatial(&self) -> bool {
        matches!(self, Self::Organism)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Simulation => "Simulation",
            Self::Patch => "Patch",
            Self::Organism => "Organism",
            Self::ExternalResource => "ExternalResource",
        };
        write!(f, "{s}")
    }
}

/// Identifies a named attribute on an entity.
///
/// Interned as an owned `String` rather than a symbol table index: handler
/// names are author-facing DSL identifiers, not a closed set known at
/// compile time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey(pub String);

impl AttributeKey {
    /// Build an attribute key from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the attribute name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AttributeKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AttributeKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
