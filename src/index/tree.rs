//! Ordered index implementation
//!
//! Arena-backed binary search tree with parent indices.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::mem;

use super::{IndexRecord, KeyOrdering, NodeId};
use crate::error::{PhonebookError, Result};

#[derive(Debug)]
struct Node<V> {
    record: IndexRecord<V>,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// Binary search tree keyed by name
///
/// Not internally synchronized: the owner decides the locking discipline.
#[derive(Debug)]
pub struct OrderedIndex<V> {
    /// Node arena, `None` marks a released slot
    nodes: Vec<Option<Node<V>>>,

    /// Released slots available for reuse
    free: Vec<usize>,

    root: Option<NodeId>,
    len: usize,
    ordering: KeyOrdering,
}

impl<V> OrderedIndex<V> {
    /// Create an empty index using the given descent rule
    pub fn new(ordering: KeyOrdering) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
            ordering,
        }
    }

    /// Descent rule of this index
    pub fn ordering(&self) -> KeyOrdering {
        self.ordering
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Root node, if any
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    // =========================================================================
    // Insert / Lookup
    // =========================================================================

    /// Insert a record if its name is absent
    ///
    /// A name already present (wherever [`find`](Self::find) reaches it)
    /// fails with `DuplicateName` and leaves the index unchanged. Otherwise
    /// descends with the configured rule and attaches the new node as a
    /// child of the last visited node.
    pub fn insert(&mut self, name: impl Into<String>, value: V, offset: u64) -> Result<NodeId> {
        let name = name.into();
        if self.find(&name).is_some() {
            return Err(PhonebookError::DuplicateName);
        }

        let mut parent = None;
        let mut attach_left = false;
        let mut curr = self.root;

        while let Some(id) = curr {
            let node = self.node(id);
            attach_left = self.ordering.goes_left(&name, &node.record.name);
            parent = Some(id);
            curr = if attach_left { node.left } else { node.right };
        }

        let id = self.alloc(Node {
            record: IndexRecord { name, value, offset },
            parent,
            left: None,
            right: None,
        });

        match parent {
            None => self.root = Some(id),
            Some(p) => {
                let parent_node = self.node_mut(p);
                if attach_left {
                    parent_node.left = Some(id);
                } else {
                    parent_node.right = Some(id);
                }
            }
        }

        self.len += 1;
        Ok(id)
    }

    /// Find the node whose full name equals `name`
    ///
    /// Descends by the configured rule, checking the full name at each
    /// visited node. When the first bytes tie under `FirstChar` both
    /// subtrees are searched.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        let mut pending: Vec<NodeId> = self.root.into_iter().collect();

        while let Some(id) = pending.pop() {
            let node = self.node(id);
            if node.record.name == name {
                return Some(id);
            }
            match self.ordering.compare(name, &node.record.name) {
                Ordering::Less => pending.extend(node.left),
                Ordering::Greater => pending.extend(node.right),
                Ordering::Equal => {
                    pending.extend(node.right);
                    pending.extend(node.left);
                }
            }
        }
        None
    }

    /// Record held by a node
    pub fn get(&self, id: NodeId) -> Option<&IndexRecord<V>> {
        self.try_node(id).map(|node| &node.record)
    }

    /// Find a record by name
    pub fn lookup(&self, name: &str) -> Option<&IndexRecord<V>> {
        self.find(name).and_then(|id| self.get(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.try_node(id).and_then(|node| node.parent)
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.try_node(id).and_then(|node| node.left)
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.try_node(id).and_then(|node| node.right)
    }

    // =========================================================================
    // Min / Max
    // =========================================================================

    /// Leftmost node of the subtree rooted at `id`
    pub fn min(&self, id: NodeId) -> Option<NodeId> {
        self.try_node(id)?;
        Some(self.leftmost(id))
    }

    /// Rightmost node of the subtree rooted at `id`
    pub fn max(&self, id: NodeId) -> Option<NodeId> {
        self.try_node(id)?;
        Some(self.rightmost(id))
    }

    /// Leftmost record of the whole index
    pub fn first(&self) -> Option<&IndexRecord<V>> {
        self.root.and_then(|root| self.get(self.leftmost(root)))
    }

    /// Rightmost record of the whole index
    pub fn last(&self) -> Option<&IndexRecord<V>> {
        self.root.and_then(|root| self.get(self.rightmost(root)))
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.node(id).left {
            id = left;
        }
        id
    }

    fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.node(id).right {
            id = right;
        }
        id
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete the record held by `id` and return it
    ///
    /// - leaf: unlinked from its parent (or the root is cleared)
    /// - left child only: the max of the left subtree is copied up
    /// - right child only, or both children: the min of the right subtree
    ///   (in-order successor) is copied up
    ///
    /// After a copy-up the promoted node is deleted the same way, until a
    /// leaf is released. `id` stays valid if it was not the released leaf,
    /// but then holds the promoted record.
    pub fn delete(&mut self, id: NodeId) -> Option<IndexRecord<V>> {
        self.try_node(id)?;

        let mut target = id;
        loop {
            let (left, right) = {
                let node = self.node(target);
                (node.left, node.right)
            };
            let promoted = match (left, right) {
                (None, None) => return Some(self.unlink_leaf(target)),
                (Some(left), None) => self.rightmost(left),
                (_, Some(right)) => self.leftmost(right),
            };
            self.swap_records(target, promoted);
            target = promoted;
        }
    }

    /// Find and delete a record by name
    pub fn remove(&mut self, name: &str) -> Option<IndexRecord<V>> {
        let id = self.find(name)?;
        self.delete(id)
    }

    fn unlink_leaf(&mut self, id: NodeId) -> IndexRecord<V> {
        let node = self.release(id);
        self.detach_from_parent(id, node.parent);
        self.len -= 1;
        node.record
    }

    fn detach_from_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        match parent {
            None => self.root = None,
            Some(p) => {
                let parent_node = self.node_mut(p);
                if parent_node.left == Some(id) {
                    parent_node.left = None;
                } else {
                    parent_node.right = None;
                }
            }
        }
    }

    fn swap_records(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let (lo, hi) = if a.0 < b.0 { (a.0, b.0) } else { (b.0, a.0) };
        let (head, tail) = self.nodes.split_at_mut(hi);
        if let (Some(lo_node), Some(hi_node)) = (head[lo].as_mut(), tail[0].as_mut()) {
            mem::swap(&mut lo_node.record, &mut hi_node.record);
        }
    }

    // =========================================================================
    // Clear
    // =========================================================================

    /// Release every node of the subtree rooted at `id`
    ///
    /// Iterative, so arbitrarily deep (degenerate) trees are fine.
    /// Returns the number of released records.
    pub fn clear_subtree(&mut self, id: NodeId) -> usize {
        let parent = match self.try_node(id) {
            Some(node) => node.parent,
            None => return 0,
        };
        self.detach_from_parent(id, parent);

        let mut released = 0;
        let mut stack = vec![id];
        while let Some(curr) = stack.pop() {
            let node = self.release(curr);
            stack.extend(node.left);
            stack.extend(node.right);
            released += 1;
        }

        self.len -= released;
        released
    }

    /// Release every node
    pub fn clear(&mut self) {
        if let Some(root) = self.root {
            self.clear_subtree(root);
        }
        self.nodes.clear();
        self.free.clear();
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// In-order traversal
    ///
    /// Sorted by name under `Lexicographic`; grouped by first byte under
    /// `FirstChar`.
    pub fn iter(&self) -> IndexIter<'_, V> {
        let mut iter = IndexIter {
            index: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    /// Check structural invariants
    ///
    /// Verifies parent links, reachable count, name uniqueness and the
    /// search ordering against every ancestor (`left <= node <= right`).
    pub fn verify(&self) -> std::result::Result<(), String> {
        if let Some(root) = self.root {
            if self.node(root).parent.is_some() {
                return Err("root has a parent".to_string());
            }
        }

        let mut names = HashSet::new();
        let mut reachable = 0;
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();

        while let Some(id) = stack.pop() {
            let node = self.try_node(id).ok_or_else(|| format!("dangling node {}", id.0))?;
            reachable += 1;

            if !names.insert(node.record.name.as_str()) {
                return Err(format!("duplicate name '{}'", node.record.name));
            }

            for child in [node.left, node.right].into_iter().flatten() {
                let child_node = self
                    .try_node(child)
                    .ok_or_else(|| format!("dangling child {}", child.0))?;
                if child_node.parent != Some(id) {
                    return Err(format!(
                        "'{}' does not point back to parent '{}'",
                        child_node.record.name, node.record.name
                    ));
                }
                stack.push(child);
            }

            self.verify_against_ancestors(id)?;
        }

        if reachable != self.len {
            return Err(format!("{} reachable nodes but len is {}", reachable, self.len));
        }
        Ok(())
    }

    fn verify_against_ancestors(&self, id: NodeId) -> std::result::Result<(), String> {
        let name = &self.node(id).record.name;
        let mut child = id;
        let mut ancestor = self.node(id).parent;

        while let Some(a) = ancestor {
            let node = self.node(a);
            let misplaced = match self.ordering.compare(name, &node.record.name) {
                Ordering::Less => node.left != Some(child),
                Ordering::Greater => node.left == Some(child),
                Ordering::Equal => false,
            };
            if misplaced {
                return Err(format!(
                    "'{}' is on the wrong side of '{}'",
                    name, node.record.name
                ));
            }
            child = a;
            ancestor = node.parent;
        }
        Ok(())
    }

    // =========================================================================
    // Arena
    // =========================================================================

    fn alloc(&mut self, node: Node<V>) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node<V> {
        match self.nodes.get_mut(id.0).and_then(Option::take) {
            Some(node) => {
                self.free.push(id.0);
                node
            }
            None => panic!("release of dangling node {}", id.0),
        }
    }

    fn try_node(&self, id: NodeId) -> Option<&Node<V>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Links inside the arena always point at live slots.
    fn node(&self, id: NodeId) -> &Node<V> {
        match self.try_node(id) {
            Some(node) => node,
            None => panic!("dangling node {}", id.0),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<V> {
        match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("dangling node {}", id.0),
        }
    }
}

impl<V> Default for OrderedIndex<V> {
    fn default() -> Self {
        Self::new(KeyOrdering::default())
    }
}

/// In-order iterator over an [`OrderedIndex`]
pub struct IndexIter<'a, V> {
    index: &'a OrderedIndex<V>,
    stack: Vec<NodeId>,
}

impl<'a, V> IndexIter<'a, V> {
    fn push_left_spine(&mut self, mut curr: Option<NodeId>) {
        while let Some(id) = curr {
            self.stack.push(id);
            curr = self.index.node(id).left;
        }
    }
}

impl<'a, V> Iterator for IndexIter<'a, V> {
    type Item = &'a IndexRecord<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.index.node(id);
        self.push_left_spine(node.right);
        Some(&node.record)
    }
}

impl<'a, V> IntoIterator for &'a OrderedIndex<V> {
    type Item = &'a IndexRecord<V>;
    type IntoIter = IndexIter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
