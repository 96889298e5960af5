//! Limits applied to recursive traversals of the object graph.

/// Default nesting bound for compare, serialize, copy, parse and text decode.
pub const DEFAULT_MAX_DEPTH: usize = 200;

/// Default bound on indirect-to-indirect resolution chains.
pub const DEFAULT_MAX_RESOLVE_CHAIN: usize = 10;

/// Traversal limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectLimits {
    /// Maximum container nesting a recursive walk will follow.
    pub max_depth: usize,

    /// Maximum number of indirect hops followed by `resolve`.
    pub max_resolve_chain: usize,
}

impl Default for ObjectLimits {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectLimits {
    /// Create limits with defaults.
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_resolve_chain: DEFAULT_MAX_RESOLVE_CHAIN,
        }
    }

    /// Set the nesting bound.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the resolution chain bound.
    pub fn with_max_resolve_chain(mut self, hops: usize) -> Self {
        self.max_resolve_chain = hops;
        self
    }
}
