use crate::catalog::DataType;
use crate::error::QuillIndexResult;
use crate::expression::{Operator, QueryNode};
use crate::storage::page::RowId;
use crate::utils::scalar::ScalarValue;

pub mod bitmap_index;
pub mod btree_index;
pub mod btree_iterator;
pub mod hash_index;

pub use bitmap_index::BitmapIndex;
pub use btree_index::BPlusTreeIndex;
pub use btree_iterator::TreeIndexIterator;
pub use hash_index::ExtendibleHashIndex;

/// Common contract of every secondary index over one attribute.
pub trait Index: std::fmt::Debug {
    /// Associates `row_id` with `key`.
    fn insert(&mut self, key: ScalarValue, row_id: RowId) -> QuillIndexResult<()>;

    /// Row ids stored under exactly `key`, empty when absent.
    fn search(&self, key: &ScalarValue) -> QuillIndexResult<Vec<RowId>>;

    /// Answers a comparison leaf. Operators the index cannot serve yield an
    /// empty result.
    fn evaluate(&self, node: &QueryNode) -> QuillIndexResult<Vec<RowId>>;

    /// Returns whether something was removed.
    fn delete(&mut self, key: &ScalarValue) -> QuillIndexResult<bool>;

    fn pretty_name(&self) -> &'static str;

    fn attribute(&self) -> &str;

    fn supports(&self, operator: Operator) -> bool;
}

/// Pins the key type on first use and rejects keys of any other type.
pub(crate) fn check_key_type(
    key_type: &mut Option<DataType>,
    key: &ScalarValue,
) -> QuillIndexResult<()> {
    match key_type {
        Some(expected) => key.check_type(*expected),
        None => {
            *key_type = Some(key.data_type());
            Ok(())
        }
    }
}
