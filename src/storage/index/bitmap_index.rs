use std::collections::HashMap;

use log::trace;

use crate::catalog::DataType;
use crate::error::{QuillIndexError, QuillIndexResult};
use crate::expression::{Operator, QueryNode};
use crate::storage::index::{check_key_type, Index};
use crate::storage::page::RowId;
use crate::utils::scalar::ScalarValue;

const WORD_BITS: u32 = u32::BITS;

/// Equality index keeping one bit vector per distinct key over the row
/// universe `[0, max_row_id]`.
#[derive(Debug, Clone)]
pub struct BitmapIndex {
    attribute: String,
    max_row_id: RowId,
    key_type: Option<DataType>,
    bitmaps: HashMap<ScalarValue, Vec<u32>>,
}

impl BitmapIndex {
    pub fn new(attribute: impl Into<String>, max_row_id: RowId) -> Self {
        Self {
            attribute: attribute.into(),
            max_row_id,
            key_type: None,
            bitmaps: HashMap::new(),
        }
    }

    pub fn max_row_id(&self) -> RowId {
        self.max_row_id
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.bitmaps.len()
    }

    fn word_count(&self) -> usize {
        (self.max_row_id as usize + 1).div_ceil(WORD_BITS as usize)
    }

    fn collect_bits(&self, words: &[u32]) -> Vec<RowId> {
        let mut row_ids = Vec::new();
        for (word_idx, word) in words.iter().enumerate() {
            let mut bits = *word;
            while bits != 0 {
                let bit = bits.trailing_zeros();
                let row_id = word_idx as u32 * WORD_BITS + bit;
                if row_id > self.max_row_id {
                    return row_ids;
                }
                row_ids.push(row_id);
                bits &= bits - 1;
            }
        }
        row_ids
    }

    /// Literal as a key of the indexed type, with a text fallback.
    fn resolve_literal(&self, literal: &str) -> Option<ScalarValue> {
        let parsed = ScalarValue::from_literal(literal);
        match self.key_type {
            None => Some(parsed),
            Some(expected) if parsed.data_type() == expected => Some(parsed),
            Some(DataType::Varchar) => Some(ScalarValue::Varchar(literal.to_string())),
            Some(_) => None,
        }
    }
}

impl Index for BitmapIndex {
    fn insert(&mut self, key: ScalarValue, row_id: RowId) -> QuillIndexResult<()> {
        if row_id > self.max_row_id {
            return Err(QuillIndexError::RowIdOutOfRange {
                row_id,
                max_row_id: self.max_row_id,
            });
        }
        check_key_type(&mut self.key_type, &key)?;
        trace!("bitmap index {} insert {} -> {}", self.attribute, key, row_id);

        let word_count = self.word_count();
        let words = self
            .bitmaps
            .entry(key)
            .or_insert_with(|| vec![0; word_count]);
        words[(row_id / WORD_BITS) as usize] |= 1 << (row_id % WORD_BITS);
        Ok(())
    }

    fn search(&self, key: &ScalarValue) -> QuillIndexResult<Vec<RowId>> {
        Ok(self
            .bitmaps
            .get(key)
            .map(|words| self.collect_bits(words))
            .unwrap_or_default())
    }

    fn evaluate(&self, node: &QueryNode) -> QuillIndexResult<Vec<RowId>> {
        if node.operator != Operator::Equals {
            return Ok(vec![]);
        }
        let literal = node.value.as_deref().ok_or_else(|| {
            QuillIndexError::InvalidPredicate(format!("EQUALS on {} without a value", node.attribute))
        })?;
        match self.resolve_literal(literal) {
            Some(key) => self.search(&key),
            None => Ok(vec![]),
        }
    }

    /// Bitmaps never forget a row.
    fn delete(&mut self, _key: &ScalarValue) -> QuillIndexResult<bool> {
        Ok(false)
    }

    fn pretty_name(&self) -> &'static str {
        "BitMap Index"
    }

    fn attribute(&self) -> &str {
        &self.attribute
    }

    fn supports(&self, operator: Operator) -> bool {
        operator == Operator::Equals
    }
}
