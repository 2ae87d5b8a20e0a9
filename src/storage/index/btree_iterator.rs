use std::cmp::Ordering;
use std::ops::{Bound, RangeBounds};

use crate::error::QuillIndexResult;
use crate::storage::page::{NodeId, RowId};
use crate::utils::scalar::ScalarValue;

use super::btree_index::BPlusTreeIndex;

/// Walks the leaf chain of a B+Tree between two bounds.
#[derive(Debug)]
pub struct TreeIndexIterator<'a> {
    index: &'a BPlusTreeIndex,
    start_bound: Bound<ScalarValue>,
    end_bound: Bound<ScalarValue>,
    current_node_id: Option<NodeId>,
    cursor: usize,
    started: bool,
}

impl<'a> TreeIndexIterator<'a> {
    pub fn new<R: RangeBounds<ScalarValue>>(index: &'a BPlusTreeIndex, range: R) -> Self {
        Self {
            index,
            start_bound: range.start_bound().cloned(),
            end_bound: range.end_bound().cloned(),
            current_node_id: None,
            cursor: 0,
            started: false,
        }
    }

    fn seek(&mut self) -> QuillIndexResult<()> {
        match &self.start_bound {
            Bound::Included(key) | Bound::Excluded(key) => {
                let node_id = self.index.find_leaf(key)?;
                let inclusive = matches!(self.start_bound, Bound::Included(_));
                self.cursor = self.index.leaf(node_id)?.next_closest(key, inclusive)?;
                self.current_node_id = Some(node_id);
            }
            Bound::Unbounded => {
                self.current_node_id = Some(self.index.find_first_leaf()?);
                self.cursor = 0;
            }
        }
        self.started = true;
        Ok(())
    }

    /// Next `(key, row_id)` in ascending key order.
    pub fn next(&mut self) -> QuillIndexResult<Option<(&'a ScalarValue, RowId)>> {
        if !self.started {
            self.seek()?;
        }
        while let Some(node_id) = self.current_node_id {
            let leaf = self.index.leaf(node_id)?;
            if self.cursor >= leaf.len() {
                // also steps over leaves drained by deletes
                self.current_node_id = leaf.next_node_id;
                self.cursor = 0;
                continue;
            }

            let (key, row_id) = leaf.kv_at(self.cursor);
            let in_range = match &self.end_bound {
                Bound::Included(end_key) => key.try_cmp(end_key)? != Ordering::Greater,
                Bound::Excluded(end_key) => key.try_cmp(end_key)? == Ordering::Less,
                Bound::Unbounded => true,
            };
            if !in_range {
                self.current_node_id = None;
                return Ok(None);
            }
            self.cursor += 1;
            return Ok(Some((key, row_id)));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Bound;

    use crate::config::BPlusTreeConfig;
    use crate::storage::index::{BPlusTreeIndex, Index};
    use crate::storage::page::RowId;
    use crate::utils::scalar::ScalarValue;

    fn build(keys: impl IntoIterator<Item = i64>) -> BPlusTreeIndex {
        let mut tree =
            BPlusTreeIndex::try_new("k", BPlusTreeConfig::default().with_order(3usize)).unwrap();
        for k in keys {
            tree.insert(k.into(), k as RowId).unwrap();
        }
        tree
    }

    fn collect(tree: &BPlusTreeIndex, range: (Bound<ScalarValue>, Bound<ScalarValue>)) -> Vec<RowId> {
        let mut iter = tree.scan(range);
        let mut out = Vec::new();
        while let Some((_, row_id)) = iter.next().unwrap() {
            out.push(row_id);
        }
        out
    }

    #[test]
    fn test_iterator_functionality() {
        let tree = build((1..=20).rev());
        let mut iter = tree.scan(..);
        let mut expected = 1;
        while let Some((key, row_id)) = iter.next().unwrap() {
            assert_eq!(key, &ScalarValue::from(expected as i64));
            assert_eq!(row_id, expected);
            expected += 1;
        }
        assert_eq!(expected, 21);
        // exhausted iterator stays exhausted
        assert!(iter.next().unwrap().is_none());
    }

    #[test]
    fn test_iterator_bounds() {
        let tree = build((0..30).map(|k| k * 2));
        let b = |k: i64| ScalarValue::from(k);
        assert_eq!(
            collect(&tree, (Bound::Included(b(10)), Bound::Excluded(b(16)))),
            vec![10, 12, 14]
        );
        assert_eq!(
            collect(&tree, (Bound::Excluded(b(10)), Bound::Included(b(16)))),
            vec![12, 14, 16]
        );
        assert_eq!(
            collect(&tree, (Bound::Included(b(11)), Bound::Included(b(13)))),
            vec![12]
        );
        assert_eq!(
            collect(&tree, (Bound::Excluded(b(54)), Bound::Unbounded)),
            vec![56, 58]
        );
        assert_eq!(
            collect(&tree, (Bound::Unbounded, Bound::Excluded(b(4)))),
            vec![0, 2]
        );
    }

    #[test]
    fn test_iterator_skips_drained_leaves() {
        let mut tree = build(1..=15);
        for k in 4..=11 {
            tree.delete(&k.into()).unwrap();
        }
        assert_eq!(
            collect(&tree, (Bound::Included(ScalarValue::from(2)), Bound::Unbounded)),
            vec![2, 3, 12, 13, 14, 15]
        );
    }

    #[test]
    fn test_iterator_on_empty_tree() {
        let tree = build(std::iter::empty());
        assert!(tree.scan(..).next().unwrap().is_none());
        assert!(collect(
            &tree,
            (Bound::Included(ScalarValue::from(1)), Bound::Unbounded)
        )
        .is_empty());
    }
}
