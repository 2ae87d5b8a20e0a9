use std::ops::{Bound, RangeBounds};

use log::{debug, trace, warn};

use crate::catalog::DataType;
use crate::config::BPlusTreeConfig;
use crate::error::{QuillIndexError, QuillIndexResult};
use crate::expression::{Operator, QueryNode};
use crate::storage::index::{check_key_type, Index, TreeIndexIterator};
use crate::storage::page::{
    BPlusTreeInternalNode, BPlusTreeLeafNode, BPlusTreeNode, NodeId, RowId,
};
use crate::utils::scalar::ScalarValue;

/// Unique-key B+Tree whose nodes live in an arena addressed by `NodeId`.
/// Leaves are threaded left to right through `next_node_id`.
#[derive(Debug, Clone)]
pub struct BPlusTreeIndex {
    attribute: String,
    order: usize,
    key_type: Option<DataType>,
    nodes: Vec<BPlusTreeNode>,
    root: NodeId,
    len: usize,
}

impl BPlusTreeIndex {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self::from_parts(attribute.into(), BPlusTreeConfig::default().order)
    }

    pub fn try_new(attribute: impl Into<String>, config: BPlusTreeConfig) -> QuillIndexResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(attribute.into(), config.order))
    }

    fn from_parts(attribute: String, order: usize) -> Self {
        Self {
            attribute,
            order,
            key_type: None,
            nodes: vec![BPlusTreeNode::Leaf(BPlusTreeLeafNode::default())],
            root: 0,
            len: 0,
        }
    }

    pub fn get_order(&self) -> usize {
        self.order
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Edges from the root to any leaf; a lone root leaf has height 0.
    pub fn get_height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let BPlusTreeNode::Internal(internal) = &self.nodes[current] {
            current = internal.child_at(0);
            height += 1;
        }
        height
    }

    pub fn get_root_node_id(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, node_id: NodeId) -> QuillIndexResult<&BPlusTreeNode> {
        self.nodes.get(node_id).ok_or_else(|| {
            QuillIndexError::Internal(format!("b+tree node {} does not exist", node_id))
        })
    }

    pub(crate) fn leaf(&self, node_id: NodeId) -> QuillIndexResult<&BPlusTreeLeafNode> {
        match self.node(node_id)? {
            BPlusTreeNode::Leaf(leaf) => Ok(leaf),
            BPlusTreeNode::Internal(_) => Err(QuillIndexError::Internal(format!(
                "b+tree node {} is not a leaf",
                node_id
            ))),
        }
    }

    fn leaf_mut(&mut self, node_id: NodeId) -> QuillIndexResult<&mut BPlusTreeLeafNode> {
        match self.nodes.get_mut(node_id) {
            Some(BPlusTreeNode::Leaf(leaf)) => Ok(leaf),
            _ => Err(QuillIndexError::Internal(format!(
                "b+tree node {} is not a leaf",
                node_id
            ))),
        }
    }

    /// Descends to the leaf whose interval covers `key`, returning it together
    /// with the internal nodes passed on the way.
    fn find_leaf_with_path(&self, key: &ScalarValue) -> QuillIndexResult<(NodeId, Vec<NodeId>)> {
        let mut path = Vec::new();
        let mut current = self.root;
        while let BPlusTreeNode::Internal(internal) = self.node(current)? {
            path.push(current);
            current = internal.child_at(internal.child_index(key)?);
        }
        Ok((current, path))
    }

    pub(crate) fn find_leaf(&self, key: &ScalarValue) -> QuillIndexResult<NodeId> {
        Ok(self.find_leaf_with_path(key)?.0)
    }

    pub(crate) fn find_first_leaf(&self) -> QuillIndexResult<NodeId> {
        let mut current = self.root;
        while let BPlusTreeNode::Internal(internal) = self.node(current)? {
            current = internal.child_at(0);
        }
        Ok(current)
    }

    fn check_search_key(&self, key: &ScalarValue) -> QuillIndexResult<()> {
        match self.key_type {
            Some(expected) => key.check_type(expected),
            None => Ok(()),
        }
    }

    /// Row id stored under `key`.
    pub fn get(&self, key: &ScalarValue) -> QuillIndexResult<Option<RowId>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.check_search_key(key)?;
        let leaf = self.leaf(self.find_leaf(key)?)?;
        Ok(match leaf.lookup(key)? {
            Ok(pos) => Some(leaf.kv_at(pos).1),
            Err(_) => None,
        })
    }

    fn split(&mut self, mut node_id: NodeId, mut path: Vec<NodeId>) -> QuillIndexResult<()> {
        loop {
            let new_node_id = self.nodes.len();
            let (separator, new_node) = match &mut self.nodes[node_id] {
                BPlusTreeNode::Leaf(leaf) => {
                    let moved = leaf.split_off(leaf.len() / 2);
                    let new_leaf = BPlusTreeLeafNode {
                        array: moved,
                        next_node_id: leaf.next_node_id,
                    };
                    leaf.next_node_id = Some(new_node_id);
                    let separator = new_leaf.first_key().cloned().ok_or_else(|| {
                        QuillIndexError::Internal("leaf split produced empty sibling".to_string())
                    })?;
                    (separator, BPlusTreeNode::Leaf(new_leaf))
                }
                BPlusTreeNode::Internal(internal) => {
                    let mid = (internal.keys.len() - 1) / 2;
                    let right_keys = internal.keys.split_off(mid + 1);
                    let right_children = internal.children.split_off(mid + 1);
                    let separator = internal.keys.pop().ok_or_else(|| {
                        QuillIndexError::Internal("internal split without separator".to_string())
                    })?;
                    (
                        separator,
                        BPlusTreeNode::Internal(BPlusTreeInternalNode {
                            keys: right_keys,
                            children: right_children,
                        }),
                    )
                }
            };
            debug!(
                "b+tree {} split node {} -> {} at {}",
                self.attribute, node_id, new_node_id, separator
            );
            self.nodes.push(new_node);

            let Some(parent_id) = path.pop() else {
                let new_root_id = self.nodes.len();
                self.nodes.push(BPlusTreeNode::Internal(BPlusTreeInternalNode::new(
                    separator,
                    node_id,
                    new_node_id,
                )));
                self.root = new_root_id;
                debug!(
                    "b+tree {} new root {}, height {}",
                    self.attribute,
                    new_root_id,
                    self.get_height()
                );
                return Ok(());
            };

            let BPlusTreeNode::Internal(parent) = &mut self.nodes[parent_id] else {
                return Err(QuillIndexError::Internal(format!(
                    "b+tree parent {} is not internal",
                    parent_id
                )));
            };
            if !parent.insert_after(node_id, separator, new_node_id) {
                return Err(QuillIndexError::Internal(format!(
                    "b+tree node {} is not a child of {}",
                    node_id, parent_id
                )));
            }
            if parent.keys.len() < self.order {
                return Ok(());
            }
            node_id = parent_id;
        }
    }

    /// Iterates `(key, row_id)` pairs in key order within `range`.
    pub fn scan<R: RangeBounds<ScalarValue>>(&self, range: R) -> TreeIndexIterator<'_> {
        TreeIndexIterator::new(self, range)
    }

    pub fn range_query(
        &self,
        start: &ScalarValue,
        start_inclusive: bool,
        end: &ScalarValue,
        end_inclusive: bool,
    ) -> QuillIndexResult<Vec<RowId>> {
        let start_bound = if start_inclusive {
            Bound::Included(start.clone())
        } else {
            Bound::Excluded(start.clone())
        };
        let end_bound = if end_inclusive {
            Bound::Included(end.clone())
        } else {
            Bound::Excluded(end.clone())
        };
        let mut iter = self.scan((start_bound, end_bound));
        let mut row_ids = Vec::new();
        while let Some((_, row_id)) = iter.next()? {
            row_ids.push(row_id);
        }
        Ok(row_ids)
    }

    pub fn get_min_key(&self) -> QuillIndexResult<Option<ScalarValue>> {
        Ok(self.scan(..).next()?.map(|(key, _)| key.clone()))
    }

    pub fn get_max_key(&self) -> QuillIndexResult<Option<ScalarValue>> {
        let mut current = self.root;
        while let BPlusTreeNode::Internal(internal) = self.node(current)? {
            current = *internal.children.last().ok_or_else(|| {
                QuillIndexError::Internal(format!("b+tree node {} has no children", current))
            })?;
        }
        if let Some(key) = self.leaf(current)?.last_key() {
            return Ok(Some(key.clone()));
        }
        // rightmost leaf drained by deletes
        let mut max = None;
        let mut next = Some(self.find_first_leaf()?);
        while let Some(node_id) = next {
            let leaf = self.leaf(node_id)?;
            if let Some(key) = leaf.last_key() {
                max = Some(key);
            }
            next = leaf.next_node_id;
        }
        Ok(max.cloned())
    }

    /// All keys in ascending order, read through the leaf chain.
    pub fn get_all_keys(&self) -> QuillIndexResult<Vec<ScalarValue>> {
        let mut iter = self.scan(..);
        let mut keys = Vec::with_capacity(self.len);
        while let Some((key, _)) = iter.next()? {
            keys.push(key.clone());
        }
        Ok(keys)
    }

    fn required_value(node: &QueryNode, value: Option<ScalarValue>) -> QuillIndexResult<ScalarValue> {
        value.ok_or_else(|| {
            QuillIndexError::InvalidPredicate(format!(
                "{} on {} is missing a value",
                node.operator, node.attribute
            ))
        })
    }
}

impl Index for BPlusTreeIndex {
    fn insert(&mut self, key: ScalarValue, row_id: RowId) -> QuillIndexResult<()> {
        check_key_type(&mut self.key_type, &key)?;
        trace!("b+tree {} insert {} -> {}", self.attribute, key, row_id);

        let (leaf_id, path) = self.find_leaf_with_path(&key)?;
        let order = self.order;
        let leaf = self.leaf_mut(leaf_id)?;
        if let Some(previous) = leaf.upsert(key, row_id)? {
            warn!(
                "b+tree {} replaced row id {} with {} for an existing key",
                self.attribute, previous, row_id
            );
            return Ok(());
        }
        let overflow = leaf.len() >= order;
        self.len += 1;
        if overflow {
            self.split(leaf_id, path)?;
        }
        Ok(())
    }

    fn search(&self, key: &ScalarValue) -> QuillIndexResult<Vec<RowId>> {
        Ok(self.get(key)?.into_iter().collect())
    }

    fn evaluate(&self, node: &QueryNode) -> QuillIndexResult<Vec<RowId>> {
        match node.operator {
            Operator::Equals => self.search(&Self::required_value(node, node.parsed_value())?),
            Operator::Lt => {
                let value = Self::required_value(node, node.parsed_value())?;
                match self.get_min_key()? {
                    Some(min) => self.range_query(&min, true, &value, false),
                    None => Ok(vec![]),
                }
            }
            Operator::Gt => {
                let value = Self::required_value(node, node.parsed_value())?;
                match self.get_max_key()? {
                    Some(max) => self.range_query(&value, false, &max, true),
                    None => Ok(vec![]),
                }
            }
            Operator::Range => {
                let low = Self::required_value(node, node.parsed_value())?;
                let high = Self::required_value(node, node.parsed_second_value())?;
                if self.is_empty() {
                    return Ok(vec![]);
                }
                self.range_query(&low, false, &high, false)
            }
            Operator::And | Operator::Or | Operator::Not => Ok(vec![]),
        }
    }

    /// Removes the key from its leaf. Nodes are never merged, so separators
    /// keep routing correctly and drained leaves stay in the chain.
    fn delete(&mut self, key: &ScalarValue) -> QuillIndexResult<bool> {
        if self.is_empty() {
            return Ok(false);
        }
        self.check_search_key(key)?;
        let leaf_id = self.find_leaf(key)?;
        let leaf = self.leaf_mut(leaf_id)?;
        match leaf.lookup(key)? {
            Ok(pos) => {
                leaf.array.remove(pos);
                self.len -= 1;
                trace!("b+tree {} delete {}", self.attribute, key);
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    fn pretty_name(&self) -> &'static str {
        "B+Tree Index"
    }

    fn attribute(&self) -> &str {
        &self.attribute
    }

    fn supports(&self, operator: Operator) -> bool {
        operator.is_comparison()
    }
}
