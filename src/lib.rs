pub mod catalog;
pub mod config;
pub mod error;
pub mod execution;
pub mod expression;
pub mod storage;
pub mod utils;

pub use catalog::{DataType, IndexCatalog, IndexResolver};
pub use error::{QuillIndexError, QuillIndexResult};
pub use execution::QueryEvaluator;
pub use expression::{Operator, QueryNode};
pub use storage::index::{BPlusTreeIndex, BitmapIndex, ExtendibleHashIndex, Index};
pub use storage::page::RowId;
pub use utils::scalar::ScalarValue;
