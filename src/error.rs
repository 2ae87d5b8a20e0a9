use thiserror::Error;

use crate::catalog::DataType;
use crate::storage::page::RowId;

pub type QuillIndexResult<T, E = QuillIndexError> = Result<T, E>;

#[derive(Debug, Error, PartialEq)]
pub enum QuillIndexError {
    #[error("Type mismatch: cannot compare {0} with {1}")]
    TypeMismatch(DataType, DataType),

    #[error("Row id {row_id} is outside the universe [0, {max_row_id}]")]
    RowIdOutOfRange { row_id: RowId, max_row_id: RowId },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
