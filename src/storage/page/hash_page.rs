use crate::storage::page::RowId;
use crate::utils::scalar::ScalarValue;

/// Position of a bucket inside the hash index's bucket arena.
pub type BucketId = usize;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HashBucketHeader {
    pub current_size: usize,
    pub max_size: usize,
    pub local_depth: u32,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HashBucket {
    pub header: HashBucketHeader,
    pub array: Vec<(ScalarValue, RowId)>,
}

impl HashBucket {
    pub fn new(max_size: usize, local_depth: u32) -> Self {
        Self {
            header: HashBucketHeader {
                current_size: 0,
                max_size,
                local_depth,
            },
            array: Vec::with_capacity(max_size),
        }
    }

    pub fn is_full(&self) -> bool {
        self.header.current_size >= self.header.max_size
    }

    pub fn local_depth(&self) -> u32 {
        self.header.local_depth
    }

    /// Append unless the bucket is at capacity.
    pub fn try_push(&mut self, key: ScalarValue, row_id: RowId) -> bool {
        if self.is_full() {
            return false;
        }
        self.array.push((key, row_id));
        self.header.current_size += 1;
        true
    }

    pub fn row_ids_for(&self, key: &ScalarValue) -> Vec<RowId> {
        self.array
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, row_id)| *row_id)
            .collect()
    }

    /// Remove the first entry for `key`, shifting later entries left.
    pub fn remove_first(&mut self, key: &ScalarValue) -> Option<RowId> {
        let pos = self.array.iter().position(|(k, _)| k == key)?;
        let (_, row_id) = self.array.remove(pos);
        self.header.current_size -= 1;
        Some(row_id)
    }

    pub fn drain(&mut self) -> Vec<(ScalarValue, RowId)> {
        self.header.current_size = 0;
        std::mem::take(&mut self.array)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ScalarValue> {
        self.array.iter().map(|(k, _)| k)
    }
}
