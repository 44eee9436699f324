//! Error types for cuckoo filter operations.

/// Failure outcomes of cuckoo filter operations. Success is `Ok(())`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CuckooError {
    /// The item, or its fingerprint, is not stored in the filter.
    #[error("item not found in the filter")]
    NotFound,

    /// The filter cannot accept another item, either because it holds `max_items` items or
    /// because its victim slot is already occupied.
    #[error("not enough space in the filter")]
    NotEnoughSpace,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for cuckoo filter operations.
pub type Result<T> = std::result::Result<T, CuckooError>;

#[cfg(test)]
mod tests {
    use super::CuckooError;

    #[test]
    fn test_display() {
        assert_eq!(CuckooError::NotFound.to_string(), "item not found in the filter");
        assert_eq!(
            CuckooError::NotEnoughSpace.to_string(),
            "not enough space in the filter",
        );
        assert_eq!(
            CuckooError::InvalidConfig(String::from("max_items must be positive")).to_string(),
            "invalid configuration: max_items must be positive",
        );
    }
}
