use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for node IDs — fast comparisons, low memory.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

static NODE_COUNTER: AtomicU64 = AtomicU64::new(1);
static TRANSITION_COUNTER: AtomicU64 = AtomicU64::new(1);
static CONNECTION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A lightweight, interned identifier for graph nodes.
/// Internally a `Spur` index — 4 bytes, Copy, Eq, Hash in O(1).
///
/// The ID is stable for the node's lifetime and distinct from the display
/// name: renaming a node never changes its `NodeId`, so views can keep
/// selection and geometry keyed by it across renames.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a string as a NodeId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh unique ID (for newly created nodes).
    pub fn fresh() -> Self {
        let n = NODE_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("node_{n}"))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

/// Stable numeric identifier of a state transition.
///
/// Preserved across undo/redo so that visual connections and relink
/// commands can address the same transition after a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransitionId(pub u64);

impl TransitionId {
    pub fn fresh() -> Self {
        TransitionId(TRANSITION_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Stable numeric identifier of a blend-tree data connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    pub fn fresh() -> Self {
        ConnectionId(CONNECTION_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("walk_state");
        let b = NodeId::intern("walk_state");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "walk_state");
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        assert_ne!(a, b);

        let t1 = TransitionId::fresh();
        let t2 = TransitionId::fresh();
        assert_ne!(t1, t2);
    }
}
