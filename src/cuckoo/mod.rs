//! Space-efficient probabilistic data structures to test for membership in a set with the ability
//! to remove items.

mod cuckoo_filter;
mod dynamic_cuckoo_filter;
mod table;

/// Number of fingerprint slots in every bucket.
pub const ENTRIES_PER_BUCKET: usize = 4;
pub(crate) const DEFAULT_FINGERPRINT_BIT_COUNT: usize = 8;
pub(crate) const DEFAULT_LOAD_FACTOR_THRESHOLD: f64 = 0.9;
const MAX_KICKS: usize = 500;

pub use self::cuckoo_filter::{CuckooFilter, Victim};
pub use self::dynamic_cuckoo_filter::DynamicCuckooFilter;
pub use self::table::{BucketInsert, Table};
