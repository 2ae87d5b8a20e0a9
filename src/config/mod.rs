use derive_with::With;

use crate::error::{QuillIndexError, QuillIndexResult};

/// Smallest branching factor that still leaves room for a split.
pub const MIN_BTREE_ORDER: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, With)]
pub struct BPlusTreeConfig {
    /// Maximum number of children per internal node. A leaf splits once it
    /// holds `order` keys.
    pub order: usize,
}

impl BPlusTreeConfig {
    pub fn validate(&self) -> QuillIndexResult<()> {
        if self.order < MIN_BTREE_ORDER {
            return Err(QuillIndexError::InvalidConfig(format!(
                "b+tree order must be at least {}, got {}",
                MIN_BTREE_ORDER, self.order
            )));
        }
        Ok(())
    }
}

impl Default for BPlusTreeConfig {
    fn default() -> Self {
        BPlusTreeConfig { order: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, With, derive_new::new)]
pub struct ExtendibleHashConfig {
    /// Number of low-order hash bits used to address the directory at construction.
    pub initial_global_depth: u32,
    /// Entries a bucket holds before it has to split.
    pub bucket_capacity: usize,
    /// Upper bound for directory doubling. Inserts that would need a deeper
    /// directory fail instead of growing without end.
    pub max_global_depth: u32,
}

impl ExtendibleHashConfig {
    pub fn validate(&self) -> QuillIndexResult<()> {
        if self.bucket_capacity == 0 {
            return Err(QuillIndexError::InvalidConfig(
                "hash bucket capacity must be positive".to_string(),
            ));
        }
        // directory slots are addressed with usize shifts
        if self.max_global_depth >= usize::BITS {
            return Err(QuillIndexError::InvalidConfig(format!(
                "max global depth {} exceeds addressable bits {}",
                self.max_global_depth,
                usize::BITS - 1
            )));
        }
        if self.initial_global_depth > self.max_global_depth {
            return Err(QuillIndexError::InvalidConfig(format!(
                "initial global depth {} exceeds max global depth {}",
                self.initial_global_depth, self.max_global_depth
            )));
        }
        Ok(())
    }
}

impl Default for ExtendibleHashConfig {
    fn default() -> Self {
        ExtendibleHashConfig {
            initial_global_depth: 10,
            bucket_capacity: 4,
            max_global_depth: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_are_valid() {
        assert!(BPlusTreeConfig::default().validate().is_ok());
        assert!(ExtendibleHashConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_small_order() {
        let config = BPlusTreeConfig::default().with_order(2usize);
        assert!(matches!(
            config.validate(),
            Err(QuillIndexError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_bad_hash_config() {
        assert!(ExtendibleHashConfig::new(1, 0, 8).validate().is_err());
        assert!(ExtendibleHashConfig::new(9, 2, 8).validate().is_err());
        assert!(ExtendibleHashConfig::new(1, 2, 64).validate().is_err());
        assert!(ExtendibleHashConfig::new(1, 2, 8).validate().is_ok());
    }
}
