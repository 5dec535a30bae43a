//! An ordered map over symbol sequences implemented with a ternary search tree.

use std::cmp::{self, Ordering};
use std::fmt;

use crate::error::{Error, Result};

/// An ordered map over symbol sequences implemented with a ternary search tree.
///
/// Point operations take time proportional to the key length, independent of the number of
/// stored keys. Keys sharing a prefix share the nodes spelling it, and every entry under a
/// prefix can be listed in lexicographic order.
///
/// Nodes live in a single vector and refer to each other by index, so no operation recurses
/// along the tree; long sibling chains are as safe to walk, clone and drop as short ones.
///
/// ```
/// use forest::PrefixMap;
/// let mut map = PrefixMap::new();
/// for (i, word) in ["hello", "world", "heaven", "hell", "healthy"].iter().enumerate() {
///     let key: Vec<char> = word.chars().collect();
///     map.insert(&key, i + 1).unwrap();
/// }
/// let prefix: Vec<char> = "hea".chars().collect();
/// let words: Vec<String> = map
///     .keys(&prefix)
///     .into_iter()
///     .map(|key| key.into_iter().collect())
///     .collect();
/// assert_eq!(words, ["healthy", "heaven"]);
/// ```
#[derive(Clone)]
pub struct PrefixMap<K, V> {
    nodes: Vec<Node<K, V>>,
    // Slots of pruned nodes, reused by later inserts
    free: Vec<NodeIdx>,
    root: Link,
    num_keys: usize,
    max_key_len: usize,
}

#[derive(Clone)]
struct Node<K, V> {
    split: K,
    lt: Link,
    eq: Link,
    gt: Link,
    // Set iff the path to this node spells a stored key.
    value: Option<V>,
}

type NodeIdx = usize;
type Link = Option<NodeIdx>;

/// A place holding a link: the root or one of the three children of a node.
#[derive(Clone, Copy)]
enum Slot {
    Root,
    Lt(NodeIdx),
    Eq(NodeIdx),
    Gt(NodeIdx),
}

impl<K: Ord + Clone, V> PrefixMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            num_keys: 0,
            max_key_len: 0,
        }
    }

    /// Returns true if the map contains no keys.
    pub fn is_empty(&self) -> bool {
        self.num_keys == 0
    }

    /// Returns the number of keys in the map.
    pub fn len(&self) -> usize {
        self.num_keys
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        self.nodes = Vec::new();
        self.free = Vec::new();
        self.root = None;
        self.num_keys = 0;
        self.max_key_len = 0;
    }

    /// Returns a reference to the value corresponding to the key.
    /// An empty key is never found.
    pub fn get(&self, key: &[K]) -> Option<&V> {
        let idx = self.find(key)?;
        self.nodes[idx].value.as_ref()
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &[K]) -> Option<&mut V> {
        let idx = self.find(key)?;
        self.nodes[idx].value.as_mut()
    }

    /// Returns true if the map contains a value for the key.
    pub fn contains_key(&self, key: &[K]) -> bool {
        self.get(key).is_some()
    }

    /// Inserts a key-value pair into the map.
    /// Fails with [`Error::EmptyKey`] for a zero-length key and with [`Error::KeyExists`] if
    /// the key is already present.
    pub fn insert(&mut self, key: &[K], value: V) -> Result<()> {
        if key.is_empty() {
            trace!("insert rejected, empty key");
            return Err(Error::EmptyKey);
        }

        let mut slot = Slot::Root;
        let mut depth = 0;
        loop {
            let symbol = &key[depth];
            let idx = match self.link(slot) {
                Some(idx) => idx,
                None => {
                    let idx = self.alloc(symbol.clone());
                    self.set_link(slot, Some(idx));
                    idx
                }
            };
            let node = &mut self.nodes[idx];
            slot = match symbol.cmp(&node.split) {
                Ordering::Less => Slot::Lt(idx),
                Ordering::Greater => Slot::Gt(idx),
                Ordering::Equal if depth + 1 < key.len() => {
                    depth += 1;
                    Slot::Eq(idx)
                }
                Ordering::Equal => {
                    if node.value.is_some() {
                        trace!(key_len = key.len(), "insert rejected, key exists");
                        return Err(Error::KeyExists);
                    }
                    node.value = Some(value);
                    break;
                }
            };
        }

        self.num_keys += 1;
        self.max_key_len = cmp::max(self.max_key_len, key.len());
        Ok(())
    }

    /// Removes a key from the map.
    /// Returns the value at the key if the key was previously in the map.
    ///
    /// Nodes left without a value and without a continuation are pruned on the way back.
    pub fn remove(&mut self, key: &[K]) -> Option<V> {
        if key.is_empty() {
            return None;
        }

        // Every slot passed on the way down, ending with the one holding the key's node
        let mut path = Vec::new();
        let mut slot = Slot::Root;
        let mut depth = 0;
        let target = loop {
            let idx = self.link(slot)?;
            path.push(slot);
            let node = &self.nodes[idx];
            slot = match key[depth].cmp(&node.split) {
                Ordering::Less => Slot::Lt(idx),
                Ordering::Greater => Slot::Gt(idx),
                Ordering::Equal if depth + 1 < key.len() => {
                    depth += 1;
                    Slot::Eq(idx)
                }
                Ordering::Equal => break idx,
            };
        };

        let value = self.nodes[target].value.take()?;
        self.num_keys -= 1;

        while let Some(slot) = path.pop() {
            if !self.prune(slot) {
                break;
            }
        }
        Some(value)
    }

    /// Returns all entries whose key starts with the prefix, in lexicographic key order.
    /// An empty prefix selects every entry.
    pub fn entries(&self, prefix: &[K]) -> Vec<(Vec<K>, &V)> {
        self.map_prefix(prefix, |key, value| (key.to_vec(), value))
    }

    /// Returns all keys starting with the prefix, in lexicographic order.
    pub fn keys(&self, prefix: &[K]) -> Vec<Vec<K>> {
        self.map_prefix(prefix, |key, _| key.to_vec())
    }

    /// Returns the values of all keys starting with the prefix, in lexicographic key order.
    pub fn values(&self, prefix: &[K]) -> Vec<&V> {
        self.map_prefix(prefix, |_, value| value)
    }

    /// Applies `f` to every entry whose key starts with the prefix, in lexicographic key order,
    /// and collects the results.
    pub fn map_prefix<'a, R, F>(&'a self, prefix: &[K], f: F) -> Vec<R>
    where
        F: FnMut(&[K], &'a V) -> R,
    {
        // max_key_len never shrinks on remove, so it bounds every stored key
        if prefix.len() > self.max_key_len {
            return Vec::new();
        }

        let mut walker = Walker {
            nodes: &self.nodes,
            key_buf: Vec::with_capacity(self.max_key_len),
            results: Vec::with_capacity(self.num_keys),
            callback: f,
        };

        let start = if prefix.is_empty() {
            self.root
        } else {
            let Some(idx) = self.find(prefix) else {
                return Vec::new();
            };
            let node = &self.nodes[idx];
            walker.key_buf.extend_from_slice(prefix);
            if let Some(value) = &node.value {
                walker.emit(value);
            }
            node.eq
        };
        walker.walk(start);
        walker.results
    }

    /// Checks the tree structure and panics on the first violation found.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        let mut seen = vec![false; self.nodes.len()];
        let mut num_values = 0;
        let mut longest = 0;

        let mut stack: Vec<(NodeIdx, Option<&K>, Option<&K>, usize)> = Vec::new();
        stack.extend(self.root.map(|root| (root, None, None, 0)));
        while let Some((idx, lower, upper, depth)) = stack.pop() {
            assert!(!seen[idx], "node {idx} reachable twice");
            seen[idx] = true;
            let node = &self.nodes[idx];

            // Sibling chains are binary search trees over the split symbol
            if let Some(lower) = lower {
                assert!(*lower < node.split);
            }
            if let Some(upper) = upper {
                assert!(node.split < *upper);
            }

            // Dead nodes are pruned unless both siblings hang off them
            assert!(
                node.value.is_some()
                    || node.eq.is_some()
                    || (node.lt.is_some() && node.gt.is_some())
            );

            if node.value.is_some() {
                num_values += 1;
                longest = cmp::max(longest, depth + 1);
            }

            stack.extend(node.lt.map(|lt| (lt, lower, Some(&node.split), depth)));
            stack.extend(node.eq.map(|eq| (eq, None, None, depth + 1)));
            stack.extend(node.gt.map(|gt| (gt, Some(&node.split), upper, depth)));
        }

        assert_eq!(num_values, self.num_keys);
        // The cached length only grows on insert
        assert!(longest <= self.max_key_len);

        for &idx in &self.free {
            assert!(!seen[idx], "free slot {idx} still linked");
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s), "node slot neither linked nor free");
    }

    fn find(&self, key: &[K]) -> Link {
        if key.is_empty() {
            return None;
        }
        let mut current = self.root;
        let mut depth = 0;
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            current = match key[depth].cmp(&node.split) {
                Ordering::Less => node.lt,
                Ordering::Greater => node.gt,
                Ordering::Equal if depth + 1 < key.len() => {
                    depth += 1;
                    node.eq
                }
                Ordering::Equal => return Some(idx),
            };
        }
        None
    }

    fn link(&self, slot: Slot) -> Link {
        match slot {
            Slot::Root => self.root,
            Slot::Lt(idx) => self.nodes[idx].lt,
            Slot::Eq(idx) => self.nodes[idx].eq,
            Slot::Gt(idx) => self.nodes[idx].gt,
        }
    }

    fn set_link(&mut self, slot: Slot, link: Link) {
        match slot {
            Slot::Root => self.root = link,
            Slot::Lt(idx) => self.nodes[idx].lt = link,
            Slot::Eq(idx) => self.nodes[idx].eq = link,
            Slot::Gt(idx) => self.nodes[idx].gt = link,
        }
    }

    fn alloc(&mut self, split: K) -> NodeIdx {
        let node = Node::new(split);
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Drops the node in `slot` if it neither ends a key nor continues one.
    /// A single remaining sibling takes its place, which keeps the sibling order intact.
    /// Returns true if the node was dropped.
    fn prune(&mut self, slot: Slot) -> bool {
        let Some(idx) = self.link(slot) else {
            return false;
        };
        let node = &self.nodes[idx];
        if node.value.is_some() || node.eq.is_some() {
            return false;
        }
        let replacement = match (node.lt, node.gt) {
            (None, None) => None,
            (Some(sibling), None) | (None, Some(sibling)) => Some(sibling),
            (Some(_), Some(_)) => return false,
        };

        self.set_link(slot, replacement);
        let node = &mut self.nodes[idx];
        node.lt = None;
        node.gt = None;
        self.free.push(idx);
        trace!(node = idx, replaced = replacement.is_some(), "pruned dead node");
        true
    }
}

impl<K: Ord + Clone, V> Default for PrefixMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone + fmt::Debug, V: fmt::Debug> fmt::Debug for PrefixMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries(&[])).finish()
    }
}

/// Depth-first walk collecting callback results, with the symbols of the current path in `key_buf`.
struct Walker<'a, K, V, R, F> {
    nodes: &'a [Node<K, V>],
    key_buf: Vec<K>,
    results: Vec<R>,
    callback: F,
}

enum Step {
    Descend(NodeIdx),
    // Push the node's symbol and emit its value
    Visit(NodeIdx),
    // Pop the symbol pushed by the matching visit
    Ascend,
}

impl<'a, K: Clone, V, R, F> Walker<'a, K, V, R, F>
where
    F: FnMut(&[K], &'a V) -> R,
{
    /// Visits the lower siblings, the node itself and its continuations, then the upper
    /// siblings, using an explicit stack.
    fn walk(&mut self, start: Link) {
        let nodes = self.nodes;
        let mut stack: Vec<Step> = start.map(Step::Descend).into_iter().collect();
        while let Some(step) = stack.pop() {
            match step {
                Step::Descend(idx) => {
                    let node = &nodes[idx];
                    stack.extend(node.gt.map(Step::Descend));
                    stack.push(Step::Ascend);
                    stack.extend(node.eq.map(Step::Descend));
                    stack.push(Step::Visit(idx));
                    stack.extend(node.lt.map(Step::Descend));
                }
                Step::Visit(idx) => {
                    let node = &nodes[idx];
                    self.key_buf.push(node.split.clone());
                    if let Some(value) = &node.value {
                        self.emit(value);
                    }
                }
                Step::Ascend => {
                    self.key_buf.pop();
                }
            }
        }
    }

    fn emit(&mut self, value: &'a V) {
        let result = (self.callback)(&self.key_buf, value);
        self.results.push(result);
    }
}

impl<K, V> Node<K, V> {
    fn new(split: K) -> Self {
        Node {
            split,
            lt: None,
            eq: None,
            gt: None,
            value: None,
        }
    }
}
