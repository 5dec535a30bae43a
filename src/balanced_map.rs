//! An ordered map implemented with an AVL tree.

use std::cmp::{self, Ordering};
use std::fmt;

use crate::error::{Error, Result};

/// An ordered map implemented with an AVL tree.
///
/// Nodes are kept in an arena and link to each other by index, parent links included.
/// Every operation runs in O(log n).
///
/// ```
/// use forest::{BalancedMap, Error};
/// let mut map = BalancedMap::new();
/// map.insert(0, "zero").unwrap();
/// map.insert(1, "one").unwrap();
/// map.insert(2, "two").unwrap();
/// assert_eq!(map.insert(1, "uno"), Err(Error::KeyExists));
/// assert_eq!(map.get(&1), Some(&"one"));
/// assert_eq!(map.remove(&1), Some("one"));
/// assert!(map.get(&1).is_none());
/// ```
#[derive(Clone)]
pub struct BalancedMap<K, V> {
    nodes: Vec<Node<K, V>>,
    root: Link,
}

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    left: Link,
    right: Link,
    parent: Link,
    height: usize,
}

type NodeIdx = usize;
type Link = Option<NodeIdx>;

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K: Ord, V> BalancedMap<K, V> {
    /// Creates an empty map.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of levels of the tree, 0 for an empty map.
    pub fn height(&self) -> usize {
        match self.root {
            None => 0,
            Some(root) => self.nodes[root].height + 1,
        }
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        self.nodes = Vec::new();
        self.root = None;
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|idx| &self.nodes[idx].value)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.find(key).map(|idx| &mut self.nodes[idx].value)
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.find(key).map(|idx| {
            let node = &self.nodes[idx];
            (&node.key, &node.value)
        })
    }

    /// Returns true if the map contains a value for the key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Inserts a key-value pair into the map.
    /// Fails with [`Error::KeyExists`] if the key is already present, leaving the stored value as is.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let (parent, slot) = match self.find_insert_pos(&key) {
            Some(pos) => pos,
            None => {
                trace!(len = self.nodes.len(), "insert rejected, key exists");
                return Err(Error::KeyExists);
            }
        };

        let idx = self.nodes.len();
        self.nodes.push(Node::new(parent, key, value));
        match (parent, slot) {
            (None, _) => self.root = Some(idx),
            (Some(parent_idx), Ordering::Less) => self.nodes[parent_idx].left = Some(idx),
            (Some(parent_idx), _) => self.nodes[parent_idx].right = Some(idx),
        }
        self.rebalance_once(parent);
        Ok(())
    }

    /// Removes a key from the map.
    /// Returns the value at the key if the key was previously in the map.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map.
    /// Returns the stored key and value if the key was previously in the map.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let idx = self.find(key)?;
        self.unlink_node(idx);
        let node = self.release(idx);
        debug_assert!(self.find(&node.key).is_none());
        Some((node.key, node.value))
    }

    /// Checks the tree structure and panics on the first violation found.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        // Check root link
        if let Some(root) = self.root {
            assert!(self.nodes[root].parent.is_none());
        }

        // Check tree nodes
        let mut num_nodes = 0;
        let mut previous: Option<&K> = None;
        self.traverse(
            |idx| {
                let node = &self.nodes[idx];
                let mut height = 0;
                let mut left_height = 0;
                let mut right_height = 0;

                // Check link for left child node
                if let Some(left) = node.left {
                    assert_eq!(self.nodes[left].parent, Some(idx));
                    assert!(self.nodes[left].key < node.key);
                    left_height = self.nodes[left].height + 1;
                    height = cmp::max(height, left_height);
                }

                // Check link for right child node
                if let Some(right) = node.right {
                    assert_eq!(self.nodes[right].parent, Some(idx));
                    assert!(self.nodes[right].key > node.key);
                    right_height = self.nodes[right].height + 1;
                    height = cmp::max(height, right_height);
                }

                // Check height
                assert_eq!(node.height, height);

                // Check AVL condition (nearly balance)
                assert!(left_height <= right_height + 1);
                assert!(right_height <= left_height + 1);

                num_nodes += 1;
            },
            |idx| {
                let key = &self.nodes[idx].key;
                if let Some(previous) = previous {
                    assert!(previous < key);
                }
                previous = Some(key);
            },
        );

        // Every arena slot must be reachable
        assert_eq!(num_nodes, self.nodes.len());
    }

    /// Renders the tree shape as `key(left, right)`, `_` standing for a missing child.
    #[cfg(test)]
    pub(crate) fn shape(&self) -> String
    where
        K: fmt::Display,
    {
        let mut out = String::new();
        self.write_shape(self.root, &mut out);
        out
    }

    #[cfg(test)]
    fn write_shape(&self, link: Link, out: &mut String)
    where
        K: fmt::Display,
    {
        match link {
            None => out.push('_'),
            Some(idx) => {
                let node = &self.nodes[idx];
                out.push_str(&node.key.to_string());
                if node.left.is_some() || node.right.is_some() {
                    out.push('(');
                    self.write_shape(node.left, out);
                    out.push_str(", ");
                    self.write_shape(node.right, out);
                    out.push(')');
                }
            }
        }
    }

    fn find(&self, key: &K) -> Link {
        let mut current = self.root;
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            current = match key.cmp(&node.key) {
                Ordering::Equal => break,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            }
        }
        current
    }

    /// Returns the parent of the empty slot the key belongs to, and which side of the parent it is on.
    /// Returns `None` if the key is already present.
    fn find_insert_pos(&self, key: &K) -> Option<(Link, Ordering)> {
        let mut parent: Link = None;
        let mut side = Ordering::Equal;
        let mut current = self.root;
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            side = key.cmp(&node.key);
            parent = current;
            current = match side {
                Ordering::Equal => return None,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        Some((parent, side))
    }

    /// Points the parent's link to `old` (or the root link if there is no parent) at `new`.
    fn relink(&mut self, parent: Link, old: NodeIdx, new: Link) {
        match parent {
            None => self.root = new,
            Some(parent_idx) => {
                let parent_node = &mut self.nodes[parent_idx];
                if parent_node.left == Some(old) {
                    parent_node.left = new;
                } else {
                    parent_node.right = new;
                }
            }
        }
    }

    fn unlink_node(&mut self, idx: NodeIdx) {
        let parent = self.nodes[idx].parent;

        // Check if node to-unlink has left sub tree
        if let Some(mut max_child) = self.nodes[idx].left {
            // Find largest child node in left sub tree (the in-order predecessor).
            // With a single left child this is the child itself, which then simply takes the node's place.
            let mut max_child_parent = idx;
            while let Some(right) = self.nodes[max_child].right {
                max_child_parent = max_child;
                max_child = right;
            }

            // Largest child node is stem or leaf, unlink from tree
            debug_assert!(self.nodes[max_child].right.is_none());
            let max_child_left = self.nodes[max_child].left;
            if max_child_parent == idx {
                self.nodes[idx].left = max_child_left;
            } else {
                self.nodes[max_child_parent].right = max_child_left;
            }
            if let Some(left) = max_child_left {
                self.nodes[left].parent = Some(max_child_parent);
            }

            // Replace node to-unlink by largest child node
            let left = self.nodes[idx].left;
            let right = self.nodes[idx].right;
            if let Some(left) = left {
                self.nodes[left].parent = Some(max_child);
            }
            if let Some(right) = right {
                self.nodes[right].parent = Some(max_child);
            }
            let height = self.nodes[idx].height;
            let replacement = &mut self.nodes[max_child];
            replacement.left = left;
            replacement.right = right;
            replacement.parent = parent;
            replacement.height = height;
            self.relink(parent, idx, Some(max_child));

            // Parent of largest child node might be out of balance now
            let mut rebalance_from = max_child_parent;
            if rebalance_from == idx {
                // Parent is node to-unlink and has been replaced by largest child
                rebalance_from = max_child;
            }
            self.rebalance(Some(rebalance_from));
        } else {
            // Node to-unlink is stem or leaf, splice its right child (if any) into its place.
            let right = self.nodes[idx].right;
            if let Some(right) = right {
                self.nodes[right].parent = parent;
            }
            self.relink(parent, idx, right);
            // Parent node might be out of balance now
            self.rebalance(parent);
        }
    }

    /// Takes an unlinked node out of the arena.
    /// The last node of the arena moves into the freed slot and its links are redirected.
    fn release(&mut self, idx: NodeIdx) -> Node<K, V> {
        let node = self.nodes.swap_remove(idx);
        let moved_from = self.nodes.len();
        if idx < moved_from {
            let Node {
                parent,
                left,
                right,
                ..
            } = self.nodes[idx];
            self.relink(parent, moved_from, Some(idx));
            for child in [left, right].into_iter().flatten() {
                self.nodes[child].parent = Some(idx);
            }
        }
        node
    }

    fn left_height(&self, idx: NodeIdx) -> usize {
        match self.nodes[idx].left {
            None => 0,
            Some(left) => self.nodes[left].height + 1,
        }
    }

    fn right_height(&self, idx: NodeIdx) -> usize {
        match self.nodes[idx].right {
            None => 0,
            Some(right) => self.nodes[right].height + 1,
        }
    }

    fn adjust_height(&mut self, idx: NodeIdx) {
        self.nodes[idx].height = cmp::max(self.left_height(idx), self.right_height(idx));
    }

    //   A          B
    //    \        / \
    //     B   => A   D
    //    / \      \
    //   C   D      C
    fn rotate_left(&mut self, idx: NodeIdx) -> NodeIdx {
        let Some(right) = self.nodes[idx].right else {
            return idx;
        };
        trace!(node = idx, pivot = right, "rotate left");

        let right_left = self.nodes[right].left;
        self.nodes[idx].right = right_left;
        if let Some(right_left) = right_left {
            self.nodes[right_left].parent = Some(idx);
        }

        let parent = self.nodes[idx].parent;
        self.nodes[right].parent = parent;
        self.relink(parent, idx, Some(right));

        self.nodes[right].left = Some(idx);
        self.nodes[idx].parent = Some(right);

        self.adjust_height(idx);
        self.adjust_height(right);
        right
    }

    //       A      B
    //      /      / \
    //     B   => C   A
    //    / \        /
    //   C   D      D
    fn rotate_right(&mut self, idx: NodeIdx) -> NodeIdx {
        let Some(left) = self.nodes[idx].left else {
            return idx;
        };
        trace!(node = idx, pivot = left, "rotate right");

        let left_right = self.nodes[left].right;
        self.nodes[idx].left = left_right;
        if let Some(left_right) = left_right {
            self.nodes[left_right].parent = Some(idx);
        }

        let parent = self.nodes[idx].parent;
        self.nodes[left].parent = parent;
        self.relink(parent, idx, Some(left));

        self.nodes[left].right = Some(idx);
        self.nodes[idx].parent = Some(left);

        self.adjust_height(idx);
        self.adjust_height(left);
        left
    }

    /// Rebalances nodes starting from given position towards the root node.
    /// Stops as soon as a subtree keeps its former height, since nothing above it changes then.
    /// Removal may need a rotation at every level on the way.
    fn rebalance(&mut self, start_from: Link) {
        let mut current = start_from;
        while let Some(idx) = current {
            let parent = self.nodes[idx].parent;
            let former_height = self.nodes[idx].height;
            let subtree_root = self.rebalance_node(idx).unwrap_or(idx);
            if self.nodes[subtree_root].height == former_height {
                break;
            }
            current = parent;
        }
    }

    /// Rebalances nodes starting from given position towards the root node.
    /// Stops after first rebalance operation.
    /// This is enough to restore balance after a single insert operation.
    fn rebalance_once(&mut self, start_from: Link) {
        let mut current = start_from;
        while let Some(idx) = current {
            let parent = self.nodes[idx].parent;
            let former_height = self.nodes[idx].height;
            if self.rebalance_node(idx).is_some() || self.nodes[idx].height == former_height {
                break;
            }
            current = parent;
        }
    }

    /// Restores AVL condition (balance) at given node if necessary and adjusts height.
    /// Resulting balance will be +1, 0 or -1 height difference between left and right subtree.
    /// Initial balance must not exceed +2 or -2, which always holds after a single update.
    /// Returns the new root of the subtree if rebalancing had been necessary.
    fn rebalance_node(&mut self, idx: NodeIdx) -> Option<NodeIdx> {
        let left_height = self.left_height(idx);
        let right_height = self.right_height(idx);
        debug_assert!(left_height <= right_height + 2);
        debug_assert!(right_height <= left_height + 2);
        if left_height > right_height + 1 {
            // Rebalance right
            if let Some(left) = self.nodes[idx].left {
                if self.right_height(left) > self.left_height(left) {
                    self.rotate_left(left);
                }
            }
            Some(self.rotate_right(idx))
        } else if right_height > left_height + 1 {
            // Rebalance left
            if let Some(right) = self.nodes[idx].right {
                if self.left_height(right) > self.right_height(right) {
                    self.rotate_right(right);
                }
            }
            Some(self.rotate_left(idx))
        } else {
            self.adjust_height(idx);
            None
        }
    }

    fn traverse<Pre, In>(&self, mut preorder: Pre, mut inorder: In)
    where
        Pre: FnMut(NodeIdx),
        In: FnMut(NodeIdx),
    {
        if let Some(mut idx) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(idx);
                        if let Some(left) = self.nodes[idx].left {
                            idx = left;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(idx);
                        if let Some(right) = self.nodes[idx].right {
                            idx = right;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        if let Some(parent) = self.nodes[idx].parent {
                            if Some(idx) == self.nodes[parent].left {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            idx = parent;
                        } else {
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl<K: Ord, V> Default for BalancedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for BalancedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        self.traverse(
            |_| {},
            |idx| {
                let node = &self.nodes[idx];
                map.entry(&node.key, &node.value);
            },
        );
        map.finish()
    }
}

impl<K, V> Node<K, V> {
    fn new(parent: Link, key: K, value: V) -> Self {
        Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            height: 0,
        }
    }
}
