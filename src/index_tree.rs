// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Weighted Index Tree
//!
//! A complete binary tree over non-negative leaf weights, used to map a
//! cumulative offset back to the leaf that holds it (a rank query).
//!
//! # Operations
//!
//! - `append(weight)`: O(log n) - add the next leaf, doubling capacity if full
//! - `set(index, weight)`: O(log n) - change a leaf's weight
//! - `query(offset)`: O(log n) - find `(leaf, offset_within_leaf)`
//! - `total()`: O(1) - sum of all weights
//!
//! # Structure
//!
//! Nodes live in an arena and point at their children by index. A child of
//! `NULL` stands for a subtree whose leaves are all zero; it is only
//! allocated once a write descends into it.
//!
//! Growing the tree never touches existing nodes. The old root becomes the
//! left child of a new root, and the right child starts out as `NULL`:
//!
//! ```text
//! capacity 2:        capacity 4:
//!
//!     (25)               (25)
//!    /    \             /    \
//!  21      4         (25)    NULL
//!                   /    \
//!                 21      4
//! ```
//!
//! Leaf `i` therefore keeps the same position as capacity grows, and the
//! new root's value is the old root's value with no recomputation.

use smallvec::SmallVec;
use tracing::debug;

use crate::error::Error;
use crate::error::Result;

/// Node index type. u32 keeps nodes small on 64-bit.
type Idx = u32;

/// Marks an all-zero subtree that has not been allocated yet.
const NULL: Idx = Idx::MAX;

/// Longest root-to-leaf path we expect to record on the stack.
const PATH_INLINE: usize = 32;

#[derive(Clone, Copy, Debug)]
struct Node {
    /// Sum of the leaf weights below this node (the weight itself for a leaf).
    value: u64,
    left: Idx,
    right: Idx,
}

impl Node {
    fn zero() -> Node {
        return Node { value: 0, left: NULL, right: NULL };
    }
}

/// A dynamically growing order-statistics tree over leaf weights.
#[derive(Clone, Debug)]
pub struct WeightedIndexTree {
    /// Arena of nodes.
    nodes: Vec<Node>,
    root: Idx,
    /// Number of leaf slots, always a power of two.
    capacity: usize,
    /// Number of leaves appended so far.
    len: usize,
}

impl WeightedIndexTree {
    /// Create an empty tree with a single zero leaf slot.
    pub fn new() -> Self {
        return WeightedIndexTree {
            nodes: vec![Node::zero()],
            root: 0,
            capacity: 1,
            len: 0,
        };
    }

    /// Sum of all leaf weights.
    pub fn total(&self) -> u64 {
        return self.node(self.root).value;
    }

    /// Number of leaves appended.
    pub fn len(&self) -> usize {
        return self.len;
    }

    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    /// Number of leaf slots. Always a power of two and at least `len()`.
    pub fn capacity(&self) -> usize {
        return self.capacity;
    }

    // --- Node access helpers ---

    fn node(&self, idx: Idx) -> &Node {
        return &self.nodes[idx as usize];
    }

    fn node_mut(&mut self, idx: Idx) -> &mut Node {
        return &mut self.nodes[idx as usize];
    }

    fn value_of(&self, idx: Idx) -> u64 {
        if idx == NULL {
            return 0;
        }
        return self.node(idx).value;
    }

    fn alloc(&mut self, node: Node) -> Idx {
        let idx = self.nodes.len() as Idx;
        debug_assert_ne!(idx, NULL, "weighted index tree arena exhausted");
        self.nodes.push(node);
        return idx;
    }

    /// Double the capacity by hanging the current tree off a new root.
    fn grow(&mut self) {
        let old_root = self.root;
        let value = self.node(old_root).value;
        self.root = self.alloc(Node { value, left: old_root, right: NULL });
        self.capacity *= 2;
        debug!(capacity = self.capacity, nodes = self.nodes.len(), "weighted index tree grew");
    }

    // --- Core operations ---

    /// Add the next leaf with the given weight, returning its index.
    pub fn append(&mut self, weight: u64) -> usize {
        if self.len == self.capacity {
            self.grow();
        }
        let index = self.len;
        self.len += 1;
        self.write(index, weight);
        return index;
    }

    /// Set the weight of the leaf at `index`.
    ///
    /// Any slot below the capacity may be written, including slots past
    /// `len()` that have not been appended yet.
    pub fn set(&mut self, index: usize, weight: u64) -> Result<()> {
        if index >= self.capacity {
            return Err(Error::OutOfRange {
                index: index as u64,
                bound: self.capacity as u64,
            });
        }
        self.write(index, weight);
        return Ok(());
    }

    /// Weight of the leaf at `index`. Unwritten slots weigh zero.
    pub fn weight(&self, index: usize) -> Result<u64> {
        if index >= self.capacity {
            return Err(Error::OutOfRange {
                index: index as u64,
                bound: self.capacity as u64,
            });
        }

        let mut idx = self.root;
        let mut lo = 0;
        let mut span = self.capacity;
        while span > 1 {
            if idx == NULL {
                return Ok(0);
            }
            let half = span / 2;
            let node = self.node(idx);
            if index >= lo + half {
                lo += half;
                idx = node.right;
            } else {
                idx = node.left;
            }
            span = half;
        }
        return Ok(self.value_of(idx));
    }

    /// Find the leaf holding the cumulative `offset`.
    ///
    /// Returns `(leaf_index, offset_within_leaf)` such that the weights of
    /// all leaves before `leaf_index` sum to at most `offset`, and
    /// `offset_within_leaf` is less than the leaf's own weight.
    pub fn query(&self, offset: u64) -> Result<(usize, u64)> {
        let total = self.total();
        if offset >= total {
            return Err(Error::OutOfRange { index: offset, bound: total });
        }

        let mut remaining = offset;
        let mut idx = self.root;
        let mut lo = 0;
        let mut span = self.capacity;
        while span > 1 {
            // remaining < value(idx) holds on every step, so we never
            // descend into a NULL subtree.
            debug_assert_ne!(idx, NULL);
            let node = self.node(idx);
            let left = self.value_of(node.left);
            let half = span / 2;
            if remaining >= left {
                remaining -= left;
                lo += half;
                idx = node.right;
            } else {
                idx = node.left;
            }
            span = half;
        }
        return Ok((lo, remaining));
    }

    /// Write a leaf and refresh every aggregate on its root path.
    /// The caller guarantees `index < capacity`.
    fn write(&mut self, index: usize, weight: u64) {
        let mut path: SmallVec<[Idx; PATH_INLINE]> = SmallVec::new();
        let mut idx = self.root;
        let mut lo = 0;
        let mut span = self.capacity;

        while span > 1 {
            path.push(idx);
            let half = span / 2;
            let go_right = index >= lo + half;
            let node = *self.node(idx);
            let mut child = if go_right { node.right } else { node.left };
            if child == NULL {
                child = self.alloc(Node::zero());
                let parent = self.node_mut(idx);
                if go_right {
                    parent.right = child;
                } else {
                    parent.left = child;
                }
            }
            if go_right {
                lo += half;
            }
            span = half;
            idx = child;
        }

        self.node_mut(idx).value = weight;
        for &parent in path.iter().rev() {
            let node = *self.node(parent);
            let value = self.value_of(node.left) + self.value_of(node.right);
            self.node_mut(parent).value = value;
        }
    }

    // --- Invariant checking ---

    /// Every internal node holds the sum of its children.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(self.capacity.is_power_of_two());
        assert!(self.len <= self.capacity);
        self.check_subtree(self.root, self.capacity);
    }

    #[cfg(test)]
    fn check_subtree(&self, idx: Idx, span: usize) -> u64 {
        if idx == NULL {
            return 0;
        }
        let node = self.node(idx);
        if span == 1 {
            assert_eq!(node.left, NULL);
            assert_eq!(node.right, NULL);
            return node.value;
        }
        let sum = self.check_subtree(node.left, span / 2) + self.check_subtree(node.right, span / 2);
        assert_eq!(
            sum, node.value,
            "INVARIANT VIOLATED: node value={} != children sum={}",
            node.value, sum
        );
        return sum;
    }
}

impl Default for WeightedIndexTree {
    fn default() -> Self {
        return Self::new();
    }
}
