//! Node identity.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;

/// Unique identifier for a node within a single store.
///
/// Ids are formatted `"{session}:{counter}"`: `session` is assigned once when
/// the store is constructed and `counter` increases monotonically for every
/// id the store ever allocates, even across transactions that later roll back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an already-formatted id (e.g. a pre-assigned `sid` from a template).
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build the canonical `"{session}:{counter}"` form.
    pub fn from_parts(session: u64, counter: u64) -> Self {
        Self(format!("{session}:{counter}"))
    }

    /// Borrow the id as a plain string, as carried on the wire in [`crate::Operation`].
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for NodeId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Monotonically increasing id allocator for one store instance.
///
/// Single-threaded by design (see the crate's concurrency model): a plain
/// `u64` counter is sufficient, no atomics required. The counter sits behind
/// a `Cell` so an overlay view, which only ever holds a shared reference to
/// the base store, can still allocate fresh ids for nodes it stages.
#[derive(Debug)]
pub struct IdAllocator {
    session: u64,
    counter: Cell<u64>,
}

impl IdAllocator {
    /// Create an allocator rooted at the given session origin.
    pub fn new(session: u64) -> Self {
        Self { session, counter: Cell::new(0) }
    }

    /// Allocate the next id. Strictly increasing for the lifetime of the allocator (P6).
    pub fn next(&self) -> NodeId {
        let counter = self.counter.get();
        let id = NodeId::from_parts(self.session, counter);
        self.counter.set(counter + 1);
        id
    }

    /// The session origin this allocator was constructed with.
    pub fn session(&self) -> u64 {
        self.session
    }
}
