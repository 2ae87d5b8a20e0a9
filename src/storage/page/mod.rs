pub mod hash_page;
mod index_page;

pub use hash_page::*;
pub use index_page::*;

/// Identifier of a tuple within a table, in `[0, max_row_id]`.
pub type RowId = u32;
