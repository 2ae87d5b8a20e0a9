use std::cmp::Ordering;

use crate::error::QuillIndexResult;
use crate::storage::page::RowId;
use crate::utils::scalar::ScalarValue;

/// Position of a node inside the tree's node arena.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum BPlusTreeNode {
    Internal(BPlusTreeInternalNode),
    Leaf(BPlusTreeLeafNode),
}

impl BPlusTreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, BPlusTreeNode::Leaf(_))
    }

    /// Number of keys held by the node.
    pub fn key_count(&self) -> usize {
        match self {
            BPlusTreeNode::Internal(internal) => internal.keys.len(),
            BPlusTreeNode::Leaf(leaf) => leaf.array.len(),
        }
    }
}

/// Separator `keys[i]` sits between `children[i]` and `children[i + 1]`:
/// keys below it live left, keys equal to or above it live right.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BPlusTreeInternalNode {
    pub keys: Vec<ScalarValue>,
    pub children: Vec<NodeId>,
}

impl BPlusTreeInternalNode {
    pub fn new(key: ScalarValue, left: NodeId, right: NodeId) -> Self {
        Self {
            keys: vec![key],
            children: vec![left, right],
        }
    }

    /// Index of the child whose interval contains `key`.
    pub fn child_index(&self, key: &ScalarValue) -> QuillIndexResult<usize> {
        Ok(match binary_search_by_key(&self.keys, key, |k| k)? {
            Ok(pos) => pos + 1,
            Err(pos) => pos,
        })
    }

    pub fn child_at(&self, index: usize) -> NodeId {
        self.children[index]
    }

    /// Place `key` and its right-hand child directly after `left_child`.
    pub fn insert_after(
        &mut self,
        left_child: NodeId,
        key: ScalarValue,
        right_child: NodeId,
    ) -> bool {
        match self.children.iter().position(|c| *c == left_child) {
            Some(pos) => {
                self.keys.insert(pos, key);
                self.children.insert(pos + 1, right_child);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BPlusTreeLeafNode {
    /// Ascending, unique keys with their row ids.
    pub array: Vec<(ScalarValue, RowId)>,
    pub next_node_id: Option<NodeId>,
}

impl BPlusTreeLeafNode {
    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn key_at(&self, index: usize) -> &ScalarValue {
        &self.array[index].0
    }

    pub fn kv_at(&self, index: usize) -> (&ScalarValue, RowId) {
        let (key, row_id) = &self.array[index];
        (key, *row_id)
    }

    pub fn first_key(&self) -> Option<&ScalarValue> {
        self.array.first().map(|(k, _)| k)
    }

    pub fn last_key(&self) -> Option<&ScalarValue> {
        self.array.last().map(|(k, _)| k)
    }

    /// `Ok(pos)` on an exact hit, `Err(pos)` with the insertion point otherwise.
    pub fn lookup(&self, key: &ScalarValue) -> QuillIndexResult<Result<usize, usize>> {
        binary_search_by_key(&self.array, key, |(k, _)| k)
    }

    /// Insert or replace; returns the previous row id for an existing key.
    pub fn upsert(
        &mut self,
        key: ScalarValue,
        row_id: RowId,
    ) -> QuillIndexResult<Option<RowId>> {
        match self.lookup(&key)? {
            Ok(pos) => Ok(Some(std::mem::replace(&mut self.array[pos].1, row_id))),
            Err(pos) => {
                self.array.insert(pos, (key, row_id));
                Ok(None)
            }
        }
    }

    /// First position whose key is above `key`, or at `key` when `inclusive`.
    pub fn next_closest(&self, key: &ScalarValue, inclusive: bool) -> QuillIndexResult<usize> {
        Ok(match self.lookup(key)? {
            Ok(pos) if inclusive => pos,
            Ok(pos) => pos + 1,
            Err(pos) => pos,
        })
    }

    pub fn split_off(&mut self, at: usize) -> Vec<(ScalarValue, RowId)> {
        self.array.split_off(at)
    }
}

/// Binary search over ascending keys where comparing can fail on mixed types.
pub(crate) fn binary_search_by_key<T>(
    items: &[T],
    key: &ScalarValue,
    project: impl Fn(&T) -> &ScalarValue,
) -> QuillIndexResult<Result<usize, usize>> {
    let (mut low, mut high) = (0, items.len());
    while low < high {
        let mid = low + (high - low) / 2;
        match project(&items[mid]).try_cmp(key)? {
            Ordering::Less => low = mid + 1,
            Ordering::Greater => high = mid,
            Ordering::Equal => return Ok(Ok(mid)),
        }
    }
    Ok(Err(low))
}
