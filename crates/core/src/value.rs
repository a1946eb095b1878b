//! Configuration value tree
//!
//! A reduced hierarchical value model exposing exactly the operations the
//! lock broker consumes: empty-root allocation, limited deep clones (full and
//! config-only), child counting, and partial-lock back-reference maintenance.
//! Node types, schema binding, and wire encoding live outside this crate.
//!
//! Every node carries a `config` flag separating configuration data from
//! operational state data; the config-only clone is what backs the
//! candidate's discard-changes reset.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::types::LockId;
use serde::{Deserialize, Serialize};

/// Name of the root container every datastore tree hangs off
pub const CONFIG_ROOT_NAME: &str = "config";

/// One node of a configuration value tree
///
/// Containers hold children in insertion order; leaves hold a string payload.
/// A node may carry back-references to the partial locks whose select
/// expressions matched it; back-references never survive a clone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueNode {
    name: String,
    value: Option<String>,
    config: bool,
    children: Vec<ValueNode>,
    plock_refs: Vec<LockId>,
}

impl ValueNode {
    /// Allocate an empty datastore root: a config-true container named
    /// [`CONFIG_ROOT_NAME`]
    pub fn config_root() -> Self {
        ValueNode::container(CONFIG_ROOT_NAME, true)
    }

    /// Create an empty container node
    pub fn container(name: impl Into<String>, config: bool) -> Self {
        ValueNode {
            name: name.into(),
            value: None,
            config,
            children: Vec::new(),
            plock_refs: Vec::new(),
        }
    }

    /// Create a leaf node with a string payload
    pub fn leaf(name: impl Into<String>, value: impl Into<String>, config: bool) -> Self {
        ValueNode {
            name: name.into(),
            value: Some(value.into()),
            config,
            children: Vec::new(),
            plock_refs: Vec::new(),
        }
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Leaf payload, `None` for containers
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Whether this node is configuration data (as opposed to operational
    /// state data)
    pub fn is_config(&self) -> bool {
        self.config
    }

    /// Append a child node, preserving insertion order
    pub fn add_child(&mut self, child: ValueNode) {
        self.children.push(child);
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Direct children in insertion order
    pub fn children(&self) -> &[ValueNode] {
        &self.children
    }

    /// Find a direct child by name
    pub fn find_child(&self, name: &str) -> Option<&ValueNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Find a direct child by name, mutably
    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut ValueNode> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Total number of nodes in this subtree, including `self`
    pub fn total_nodes(&self) -> usize {
        1 + self.children.iter().map(ValueNode::total_nodes).sum::<usize>()
    }

    /// Deep-clone this subtree, enforcing the given limits
    ///
    /// Back-references to partial locks are not carried into the clone.
    pub fn try_clone(&self, limits: &Limits) -> Result<ValueNode> {
        let mut count = 0;
        self.clone_limited(limits, 1, &mut count, false)
    }

    /// Deep-clone this subtree filtered to configuration data
    ///
    /// The root node is always cloned; descendants with `config == false`
    /// are skipped together with their subtrees. Back-references are not
    /// carried into the clone.
    pub fn clone_config_data(&self, limits: &Limits) -> Result<ValueNode> {
        let mut count = 0;
        self.clone_limited(limits, 1, &mut count, true)
    }

    fn clone_limited(
        &self,
        limits: &Limits,
        depth: usize,
        count: &mut usize,
        config_only: bool,
    ) -> Result<ValueNode> {
        if depth > limits.max_tree_depth {
            return Err(Error::TreeTooDeep {
                actual: depth,
                max: limits.max_tree_depth,
            });
        }
        *count += 1;
        if *count > limits.max_tree_nodes {
            return Err(Error::TreeTooLarge {
                actual: *count,
                max: limits.max_tree_nodes,
            });
        }

        let mut node = ValueNode {
            name: self.name.clone(),
            value: self.value.clone(),
            config: self.config,
            children: Vec::with_capacity(self.children.len()),
            plock_refs: Vec::new(),
        };
        for child in &self.children {
            if config_only && !child.config {
                continue;
            }
            node.children
                .push(child.clone_limited(limits, depth + 1, count, config_only)?);
        }
        Ok(node)
    }

    /// Record a partial-lock back-reference on this node
    pub fn mark_partial_lock(&mut self, lock_id: LockId) {
        if !self.plock_refs.contains(&lock_id) {
            self.plock_refs.push(lock_id);
        }
    }

    /// Whether this node carries a back-reference to the given lock
    pub fn holds_partial_lock(&self, lock_id: LockId) -> bool {
        self.plock_refs.contains(&lock_id)
    }

    /// Whether any node in this subtree carries a back-reference to the
    /// given lock
    pub fn subtree_holds_partial_lock(&self, lock_id: LockId) -> bool {
        self.holds_partial_lock(lock_id)
            || self
                .children
                .iter()
                .any(|c| c.subtree_holds_partial_lock(lock_id))
    }

    /// Remove every back-reference to the given lock from this subtree
    pub fn clear_partial_lock(&mut self, lock_id: LockId) {
        self.plock_refs.retain(|id| *id != lock_id);
        for child in &mut self.children {
            child.clear_partial_lock(lock_id);
        }
    }

    /// Structural equality of content: name, payload, config flag, and
    /// children, ignoring partial-lock back-references
    pub fn content_eq(&self, other: &ValueNode) -> bool {
        self.name == other.name
            && self.value == other.value
            && self.config == other.config
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.content_eq(b))
    }
}
