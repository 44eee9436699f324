//! Construction parameters shared by `CuckooFilter` and `DynamicCuckooFilter`.

use crate::cuckoo::{DEFAULT_FINGERPRINT_BIT_COUNT, DEFAULT_LOAD_FACTOR_THRESHOLD};
use crate::error::{CuckooError, Result};

/// Configuration for cuckoo filters.
///
/// # Examples
///
/// ```
/// use dynamic_cuckoo_filter::CuckooFilterConfig;
///
/// let config = CuckooFilterConfig::new()
///     .with_max_items(512)
///     .with_fingerprint_bit_count(16)
///     .with_seed(42);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.load_factor_threshold, 0.9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CuckooFilterConfig {
    /// Number of items a single filter is sized for.
    pub max_items: usize,

    /// Width of each stored fingerprint, between 2 and 64 bits.
    pub fingerprint_bit_count: usize,

    /// Load factor at which a dynamic filter stops inserting into a chained filter. Ignored by a
    /// standalone `CuckooFilter`.
    pub load_factor_threshold: f64,

    /// Seed for the eviction RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl CuckooFilterConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of items a single filter is sized for.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Sets the fingerprint width in bits.
    pub fn with_fingerprint_bit_count(mut self, fingerprint_bit_count: usize) -> Self {
        self.fingerprint_bit_count = fingerprint_bit_count;
        self
    }

    /// Sets the load factor threshold of a dynamic filter.
    pub fn with_load_factor_threshold(mut self, load_factor_threshold: f64) -> Self {
        self.load_factor_threshold = load_factor_threshold;
        self
    }

    /// Seeds the eviction RNG so that kickout choices are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that every value is within range.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::InvalidConfig`] naming the first offending value.
    pub fn validate(&self) -> Result<()> {
        if self.max_items == 0 {
            return Err(CuckooError::InvalidConfig(String::from(
                "max_items must be greater than zero",
            )));
        }
        if self.fingerprint_bit_count < 2 || self.fingerprint_bit_count > 64 {
            return Err(CuckooError::InvalidConfig(format!(
                "fingerprint_bit_count must be between 2 and 64, got {}",
                self.fingerprint_bit_count,
            )));
        }
        if !(self.load_factor_threshold > 0.0 && self.load_factor_threshold <= 1.0) {
            return Err(CuckooError::InvalidConfig(format!(
                "load_factor_threshold must be in (0, 1], got {}",
                self.load_factor_threshold,
            )));
        }
        Ok(())
    }
}

impl Default for CuckooFilterConfig {
    fn default() -> Self {
        Self {
            max_items: 1024,
            fingerprint_bit_count: DEFAULT_FINGERPRINT_BIT_COUNT,
            load_factor_threshold: DEFAULT_LOAD_FACTOR_THRESHOLD,
            seed: None,
        }
    }
}
