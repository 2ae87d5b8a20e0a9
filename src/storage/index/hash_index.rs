use std::collections::HashSet;

use log::{debug, trace};

use crate::catalog::DataType;
use crate::config::ExtendibleHashConfig;
use crate::error::{QuillIndexError, QuillIndexResult};
use crate::expression::{Operator, QueryNode};
use crate::storage::index::{check_key_type, Index};
use crate::storage::page::{BucketId, HashBucket, RowId};
use crate::utils::scalar::ScalarValue;

/// Extendible hash index. The directory maps the low `global_depth` bits of a
/// key's hash to a bucket in the arena; several slots may share a bucket.
#[derive(Debug, Clone)]
pub struct ExtendibleHashIndex {
    attribute: String,
    key_type: Option<DataType>,
    global_depth: u32,
    max_global_depth: u32,
    bucket_capacity: usize,
    directory: Vec<BucketId>,
    buckets: Vec<HashBucket>,
    len: usize,
}

impl ExtendibleHashIndex {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self::from_config(attribute.into(), ExtendibleHashConfig::default())
    }

    pub fn try_new(
        attribute: impl Into<String>,
        config: ExtendibleHashConfig,
    ) -> QuillIndexResult<Self> {
        config.validate()?;
        Ok(Self::from_config(attribute.into(), config))
    }

    fn from_config(attribute: String, config: ExtendibleHashConfig) -> Self {
        let slots = 1usize << config.initial_global_depth;
        Self {
            attribute,
            key_type: None,
            global_depth: config.initial_global_depth,
            max_global_depth: config.max_global_depth,
            bucket_capacity: config.bucket_capacity,
            directory: (0..slots).collect(),
            buckets: (0..slots)
                .map(|_| HashBucket::new(config.bucket_capacity, config.initial_global_depth))
                .collect(),
            len: 0,
        }
    }

    pub fn get_global_depth(&self) -> u32 {
        self.global_depth
    }

    pub fn get_local_depth(&self, bucket_id: BucketId) -> Option<u32> {
        self.buckets.get(bucket_id).map(HashBucket::local_depth)
    }

    /// Local depth of the bucket behind directory slot `slot`.
    pub fn get_local_depth_at_slot(&self, slot: usize) -> Option<u32> {
        self.get_local_depth(*self.directory.get(slot)?)
    }

    /// Directory length, i.e. `2^global_depth`.
    pub fn get_bucket_count(&self) -> usize {
        self.directory.len()
    }

    pub fn distinct_bucket_count(&self) -> usize {
        self.directory.iter().collect::<HashSet<_>>().len()
    }

    /// Bucket addressed by each directory slot, in slot order.
    pub fn get_buckets(&self) -> Vec<&HashBucket> {
        self.directory.iter().map(|id| &self.buckets[*id]).collect()
    }

    pub fn directory(&self) -> &[BucketId] {
        &self.directory
    }

    pub fn bucket(&self, bucket_id: BucketId) -> Option<&HashBucket> {
        self.buckets.get(bucket_id)
    }

    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot_of(&self, key: &ScalarValue) -> usize {
        (key.hash_code() as usize) & ((1usize << self.global_depth) - 1)
    }

    fn check_search_key(&self, key: &ScalarValue) -> QuillIndexResult<()> {
        match self.key_type {
            Some(expected) => key.check_type(expected),
            None => Ok(()),
        }
    }

    /// A full bucket can only make room for `key` when some entry differs
    /// from it in the low `max_global_depth` hash bits.
    fn can_split_for(&self, bucket_id: BucketId, key: &ScalarValue) -> bool {
        let mask = (1u64 << self.max_global_depth) - 1;
        let bits = key.hash_code() & mask;
        self.buckets[bucket_id]
            .keys()
            .any(|other| other.hash_code() & mask != bits)
    }

    fn double_directory(&mut self) -> QuillIndexResult<()> {
        if self.global_depth >= self.max_global_depth {
            return Err(QuillIndexError::Storage(format!(
                "hash index {} cannot grow past global depth {}",
                self.attribute, self.max_global_depth
            )));
        }
        self.directory.extend_from_within(..);
        self.global_depth += 1;
        debug!(
            "hash index {} doubled directory to {} slots",
            self.attribute,
            self.directory.len()
        );
        Ok(())
    }

    /// Splits the bucket behind `slot`, doubling the directory first when the
    /// bucket already uses every directory bit.
    fn split_bucket(&mut self, slot: usize) -> QuillIndexResult<()> {
        let bucket_id = self.directory[slot];
        let old_local = self.buckets[bucket_id].local_depth();
        if old_local == self.global_depth {
            self.double_directory()?;
        }

        let new_local = old_local + 1;
        let new_bucket_id = self.buckets.len();
        self.buckets[bucket_id].header.local_depth = new_local;
        self.buckets.push(HashBucket::new(self.bucket_capacity, new_local));
        for (i, target) in self.directory.iter_mut().enumerate() {
            if *target == bucket_id && ((i >> old_local) & 1) == 1 {
                *target = new_bucket_id;
            }
        }

        for (key, row_id) in self.buckets[bucket_id].drain() {
            let target = self.directory[self.slot_of(&key)];
            if !self.buckets[target].try_push(key, row_id) {
                return Err(QuillIndexError::Internal(format!(
                    "hash bucket {} overflowed during split",
                    target
                )));
            }
        }
        debug!(
            "hash index {} split bucket {} into {} at local depth {}",
            self.attribute, bucket_id, new_bucket_id, new_local
        );
        Ok(())
    }
}

impl Index for ExtendibleHashIndex {
    fn insert(&mut self, key: ScalarValue, row_id: RowId) -> QuillIndexResult<()> {
        check_key_type(&mut self.key_type, &key)?;
        trace!("hash index {} insert {} -> {}", self.attribute, key, row_id);
        loop {
            let slot = self.slot_of(&key);
            let bucket_id = self.directory[slot];
            if !self.buckets[bucket_id].is_full() {
                self.buckets[bucket_id].try_push(key, row_id);
                self.len += 1;
                return Ok(());
            }
            if !self.can_split_for(bucket_id, &key) {
                return Err(QuillIndexError::Storage(format!(
                    "hash index {} bucket {} is full of keys hashing like {}",
                    self.attribute, bucket_id, key
                )));
            }
            self.split_bucket(slot)?;
        }
    }

    fn search(&self, key: &ScalarValue) -> QuillIndexResult<Vec<RowId>> {
        if self.is_empty() {
            return Ok(vec![]);
        }
        self.check_search_key(key)?;
        let bucket_id = self.directory[self.slot_of(key)];
        Ok(self.buckets[bucket_id].row_ids_for(key))
    }

    fn evaluate(&self, node: &QueryNode) -> QuillIndexResult<Vec<RowId>> {
        if node.operator != Operator::Equals {
            return Ok(vec![]);
        }
        let key = node.parsed_value().ok_or_else(|| {
            QuillIndexError::InvalidPredicate(format!(
                "EQUALS on {} without a value",
                node.attribute
            ))
        })?;
        self.search(&key)
    }

    /// Removes one matching entry. Buckets are never merged and the directory
    /// never shrinks.
    fn delete(&mut self, key: &ScalarValue) -> QuillIndexResult<bool> {
        if self.is_empty() {
            return Ok(false);
        }
        self.check_search_key(key)?;
        let bucket_id = self.directory[self.slot_of(key)];
        let removed = self.buckets[bucket_id].remove_first(key).is_some();
        if removed {
            self.len -= 1;
            trace!("hash index {} delete {}", self.attribute, key);
        }
        Ok(removed)
    }

    fn pretty_name(&self) -> &'static str {
        "Hash Index"
    }

    fn attribute(&self) -> &str {
        &self.attribute
    }

    fn supports(&self, operator: Operator) -> bool {
        operator == Operator::Equals
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::ExtendibleHashIndex;
    use crate::config::ExtendibleHashConfig;
    use crate::error::QuillIndexError;
    use crate::expression::QueryNode;
    use crate::storage::index::Index;
    use crate::storage::page::RowId;
    use crate::utils::scalar::ScalarValue;

    fn create_index(depth: u32, capacity: usize) -> ExtendibleHashIndex {
        ExtendibleHashIndex::try_new("k", ExtendibleHashConfig::new(depth, capacity, 20)).unwrap()
    }

    /// Every bucket is shared by exactly `2^(global - local)` slots that agree
    /// on their low `local` bits, and every entry sits where its hash points.
    fn verify_directory(index: &ExtendibleHashIndex) {
        let global = index.get_global_depth();
        assert_eq!(index.get_bucket_count(), 1 << global);
        let mut slots_per_bucket: HashMap<usize, Vec<usize>> = HashMap::new();
        for (slot, bucket_id) in index.directory().iter().enumerate() {
            slots_per_bucket.entry(*bucket_id).or_default().push(slot);
        }
        for (bucket_id, slots) in slots_per_bucket {
            let bucket = index.bucket(bucket_id).unwrap();
            let local = bucket.local_depth();
            assert!(local <= global);
            assert_eq!(slots.len(), 1 << (global - local));
            let mask = (1usize << local) - 1;
            assert!(slots.iter().all(|s| s & mask == slots[0] & mask));
            assert!(bucket.array.len() <= index.bucket_capacity());
            assert_eq!(bucket.header.current_size, bucket.array.len());
            for key in bucket.keys() {
                assert_eq!(index.directory()[index.slot_of(key)], bucket_id);
            }
        }
    }

    #[test]
    fn test_split_scenario() {
        let mut index = create_index(1, 2);
        assert_eq!(index.get_bucket_count(), 2);
        for key in [1, 3, 5] {
            index.insert(key.into(), key as RowId).unwrap();
        }
        assert_eq!(index.get_global_depth(), 2);
        assert_eq!(index.get_bucket_count(), 4);
        assert_eq!(index.distinct_bucket_count(), 3);
        assert_eq!(index.get_local_depth(0), Some(1));
        assert_eq!(index.get_local_depth(1), Some(2));
        assert_eq!(index.get_local_depth(2), Some(2));
        assert_eq!(index.get_local_depth(3), None);
        assert_eq!(index.get_local_depth_at_slot(0), Some(1));
        assert_eq!(index.get_local_depth_at_slot(2), Some(1));
        assert_eq!(index.get_local_depth_at_slot(3), Some(2));
        assert_eq!(index.get_local_depth_at_slot(4), None);
        for key in [1, 3, 5] {
            assert_eq!(index.search(&key.into()).unwrap(), vec![key as RowId]);
        }
        verify_directory(&index);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut index = create_index(2, 4);
        for row_id in [4, 9, 2] {
            index.insert("dup".into(), row_id).unwrap();
        }
        assert_eq!(index.search(&"dup".into()).unwrap(), vec![4, 9, 2]);
        assert!(index.delete(&"dup".into()).unwrap());
        assert_eq!(index.search(&"dup".into()).unwrap(), vec![9, 2]);
        assert_eq!(index.len(), 2);
        assert!(!index.delete(&"nope".into()).unwrap());
    }

    #[test]
    fn test_full_bucket_of_one_key_is_rejected_without_growth() {
        let mut index = ExtendibleHashIndex::new("k");
        let depth = index.get_global_depth();
        let slots = index.get_bucket_count();
        let capacity = index.bucket_capacity() as RowId;
        for row_id in 0..capacity {
            index.insert(7.into(), row_id).unwrap();
        }
        assert!(matches!(
            index.insert(7.into(), capacity),
            Err(QuillIndexError::Storage(_))
        ));
        assert_eq!(index.get_global_depth(), depth);
        assert_eq!(index.get_bucket_count(), slots);
        assert_eq!(index.distinct_bucket_count(), slots);
        assert_eq!(index.len(), capacity as usize);
        assert_eq!(
            index.search(&7.into()).unwrap(),
            (0..capacity).collect::<Vec<_>>()
        );

        index.insert(8.into(), 99).unwrap();
        assert_eq!(index.get_bucket_count(), slots);
        verify_directory(&index);
    }

    #[test]
    fn test_collisions_beyond_depth_limit_are_rejected_up_front() {
        // 1 and 17 agree on the low four bits
        let mut index =
            ExtendibleHashIndex::try_new("k", ExtendibleHashConfig::new(1, 2, 4)).unwrap();
        index.insert(1.into(), 1).unwrap();
        index.insert(17.into(), 2).unwrap();
        assert!(matches!(
            index.insert(33.into(), 3),
            Err(QuillIndexError::Storage(_))
        ));
        assert_eq!(index.get_global_depth(), 1);
        assert_eq!(index.len(), 2);
        assert_eq!(index.search(&17.into()).unwrap(), vec![2]);
        verify_directory(&index);

        // 3 differs in bit 1, so the bucket can split
        index.insert(3.into(), 4).unwrap();
        assert_eq!(index.get_global_depth(), 2);
        assert_eq!(index.search(&3.into()).unwrap(), vec![4]);
        verify_directory(&index);
    }

    #[test]
    fn test_random_inserts_keep_directory_consistent() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut index = create_index(0, 3);
        let mut expected: HashMap<i64, Vec<RowId>> = HashMap::new();
        for row_id in 0..3_000u32 {
            let key: i64 = rng.random_range(0..100_000);
            index.insert(key.into(), row_id).unwrap();
            expected.entry(key).or_default().push(row_id);
        }
        verify_directory(&index);
        assert_eq!(index.len(), 3_000);
        for (key, row_ids) in &expected {
            assert_eq!(&index.search(&(*key).into()).unwrap(), row_ids);
        }
        assert!(index.search(&(-1).into()).unwrap().is_empty());
    }

    #[test]
    fn test_text_float_and_date_keys() {
        let mut names = create_index(1, 2);
        for (row_id, name) in ["ada", "bob", "cy", "dee", "eve", "fin"].iter().enumerate() {
            names.insert((*name).into(), row_id as RowId).unwrap();
        }
        verify_directory(&names);
        assert_eq!(names.evaluate(&QueryNode::equals("k", "eve")).unwrap(), vec![4]);

        let mut prices = create_index(1, 2);
        for (row_id, price) in [1.5, 2.25, 3.0, 99.99].iter().enumerate() {
            prices.insert((*price).into(), row_id as RowId).unwrap();
        }
        assert_eq!(prices.evaluate(&QueryNode::equals("k", "2.25")).unwrap(), vec![1]);

        let mut dates = create_index(1, 2);
        for day in 1..=6 {
            let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
            dates.insert(date.into(), day).unwrap();
        }
        verify_directory(&dates);
        assert_eq!(
            dates.evaluate(&QueryNode::equals("k", "2024-05-03")).unwrap(),
            vec![3]
        );
    }

    #[test]
    fn test_evaluate_supports_equals_only() {
        let mut index = ExtendibleHashIndex::new("k");
        index.insert(10.into(), 1).unwrap();
        assert!(index
            .evaluate(&QueryNode::less_than("k", "20"))
            .unwrap()
            .is_empty());
        assert!(index
            .evaluate(&QueryNode::range("k", "0", "20"))
            .unwrap()
            .is_empty());
        assert_eq!(index.evaluate(&QueryNode::equals("k", "10")).unwrap(), vec![1]);
    }

    #[test]
    fn test_type_mismatch() {
        let mut index = create_index(1, 2);
        index.insert(1.into(), 1).unwrap();
        assert!(matches!(
            index.insert(ScalarValue::from("1"), 2),
            Err(QuillIndexError::TypeMismatch(..))
        ));
        assert!(matches!(
            index.evaluate(&QueryNode::equals("k", "x")),
            Err(QuillIndexError::TypeMismatch(..))
        ));
    }
}
