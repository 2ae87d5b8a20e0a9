use std::collections::BTreeMap;

use log::debug;

use crate::error::{QuillIndexError, QuillIndexResult};
use crate::expression::Operator;
use crate::storage::index::Index;
use crate::storage::page::RowId;
use crate::utils::scalar::ScalarValue;

/// Picks the index that answers a comparison on `attribute`.
pub trait IndexResolver {
    fn get_index(&self, attribute: &str, operator: Operator) -> Option<&dyn Index>;
}

/// Registry of the indexes built over each attribute. Several indexes may
/// cover one attribute; lookups prefer the first one registered that
/// supports the requested operator.
#[derive(Debug, Default)]
pub struct IndexCatalog {
    inner: BTreeMap<String, Vec<Box<dyn Index>>>,
}

impl IndexCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, index: Box<dyn Index>) {
        debug!(
            "register {} on attribute {}",
            index.pretty_name(),
            index.attribute()
        );
        self.inner
            .entry(index.attribute().to_string())
            .or_default()
            .push(index);
    }

    /// Adds `key -> row_id` to every index over `attribute`.
    pub fn insert(
        &mut self,
        attribute: &str,
        key: ScalarValue,
        row_id: RowId,
    ) -> QuillIndexResult<()> {
        let indexes = self
            .inner
            .get_mut(attribute)
            .ok_or_else(|| QuillIndexError::IndexNotFound(attribute.to_string()))?;
        for index in indexes.iter_mut() {
            index.insert(key.clone(), row_id)?;
        }
        Ok(())
    }

    pub fn indexes(&self, attribute: &str) -> &[Box<dyn Index>] {
        self.inner.get(attribute).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn attributes(&self) -> Vec<&str> {
        self.inner.keys().map(String::as_str).collect()
    }
}

impl IndexResolver for IndexCatalog {
    fn get_index(&self, attribute: &str, operator: Operator) -> Option<&dyn Index> {
        let indexes = self.inner.get(attribute)?;
        indexes
            .iter()
            .find(|index| index.supports(operator))
            .or_else(|| indexes.first())
            .map(|index| &**index)
    }
}

#[cfg(test)]
mod tests {
    use super::{IndexCatalog, IndexResolver};
    use crate::error::QuillIndexError;
    use crate::expression::Operator;
    use crate::storage::index::{BPlusTreeIndex, BitmapIndex, ExtendibleHashIndex};

    #[test]
    fn routes_by_capability() {
        let mut catalog = IndexCatalog::new();
        catalog.register(Box::new(BitmapIndex::new("age", 9)));
        catalog.register(Box::new(BPlusTreeIndex::new("age")));
        catalog.register(Box::new(ExtendibleHashIndex::new("name")));

        let eq = catalog.get_index("age", Operator::Equals).unwrap();
        assert_eq!(eq.pretty_name(), "BitMap Index");
        let lt = catalog.get_index("age", Operator::Lt).unwrap();
        assert_eq!(lt.pretty_name(), "B+Tree Index");
        // no capable index: fall back to the first one
        let range = catalog.get_index("name", Operator::Range).unwrap();
        assert_eq!(range.pretty_name(), "Hash Index");
        assert!(catalog.get_index("salary", Operator::Equals).is_none());
        assert_eq!(catalog.attributes(), vec!["age", "name"]);
    }

    #[test]
    fn insert_fans_out() {
        let mut catalog = IndexCatalog::new();
        catalog.register(Box::new(BitmapIndex::new("age", 9)));
        catalog.register(Box::new(BPlusTreeIndex::new("age")));
        catalog.insert("age", 30.into(), 4).unwrap();

        for index in catalog.indexes("age") {
            assert_eq!(index.search(&30.into()).unwrap(), vec![4]);
        }
        assert!(catalog.indexes("missing").is_empty());
        assert_eq!(
            catalog.insert("missing", 1.into(), 1),
            Err(QuillIndexError::IndexNotFound("missing".to_string()))
        );
    }
}
