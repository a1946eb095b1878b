//! Size limits for configuration value trees
//!
//! The limits are fixed at registry construction time and enforced by the
//! deep-clone operations of the value tree. Violations surface as
//! `TreeTooDeep` / `TreeTooLarge` errors, which is what makes candidate
//! synchronization genuinely fallible.

use serde::{Deserialize, Serialize};

/// Size limits for configuration value trees
///
/// These bound the work a single candidate synchronization is allowed to do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum nesting depth of a value tree (default: 128)
    pub max_tree_depth: usize,

    /// Maximum total node count of a value tree (default: 1M nodes)
    pub max_tree_nodes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_tree_depth: 128,
            max_tree_nodes: 1_000_000,
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    ///
    /// Useful for unit tests that need to trip limit enforcement without
    /// building extremely large trees.
    pub fn with_small_limits() -> Self {
        Limits {
            max_tree_depth: 8,
            max_tree_nodes: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_tree_depth, 128);
        assert_eq!(limits.max_tree_nodes, 1_000_000);
    }

    #[test]
    fn test_small_limits_are_smaller() {
        let small = Limits::with_small_limits();
        let default = Limits::default();
        assert!(small.max_tree_depth < default.max_tree_depth);
        assert!(small.max_tree_nodes < default.max_tree_nodes);
    }
}
