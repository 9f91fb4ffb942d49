//! Ordered Index Module
//!
//! In-memory binary search tree mapping a name to a value plus the byte
//! offset of its record in the backing log.
//!
//! ## Responsibilities
//! - Point lookup, insert-if-absent, delete
//! - Min/max retrieval and full traversal
//! - O(1) parent access (needed by delete) without cyclic ownership
//!
//! ## Data Structure Choice
//! Nodes live in an arena (`Vec<Option<Node>>` plus a free list) and refer
//! to each other through [`NodeId`] indices, including an explicit parent
//! index. Deletion copies the promoted record up into the deleted slot and
//! then deletes the promoted node, so a [`NodeId`] handed out before a
//! delete may afterwards hold a different record.
//!
//! ## Descent Rule
//! ```text
//! FirstChar:      name[0] <= node.name[0]  -> left, else right
//! Lexicographic:  name    <= node.name     -> left, else right
//! ```
//! `FirstChar` is the historical on-disk-compatible behavior: names sharing
//! a first byte form chains and in-order traversal is only grouped by first
//! byte, not sorted. `Lexicographic` is a true BST.
//!
//! A copy-up delete under `FirstChar` may place a record above the right
//! subtree of a node with the same first byte, so the invariant kept is
//! `left <= node <= right` on first bytes. Lookups therefore search both
//! children when the first bytes tie.

mod tree;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub use tree::{IndexIter, OrderedIndex};

/// Stable handle to a node in an [`OrderedIndex`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Record stored in each node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord<V> {
    /// Unique key
    pub name: String,

    /// Payload (phone number, credential, ...)
    pub value: V,

    /// Byte offset of the record in the backing log
    pub offset: u64,
}

/// Rule used to pick a subtree while descending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyOrdering {
    /// Compare only the first byte of the names (ties descend left)
    #[default]
    FirstChar,

    /// Compare whole names
    Lexicographic,
}

impl KeyOrdering {
    /// Compare `name` with a node key under this rule
    ///
    /// `Equal` under `FirstChar` only means the first bytes tie.
    pub fn compare(self, name: &str, node_name: &str) -> Ordering {
        match self {
            KeyOrdering::FirstChar => first_byte(name).cmp(&first_byte(node_name)),
            KeyOrdering::Lexicographic => name.cmp(node_name),
        }
    }

    /// Whether a new `name` is attached in the left subtree of a node keyed `node_name`
    pub fn goes_left(self, name: &str, node_name: &str) -> bool {
        self.compare(name, node_name) != Ordering::Greater
    }
}

fn first_byte(name: &str) -> u8 {
    name.as_bytes().first().copied().unwrap_or(0)
}
