//! # dynamic-cuckoo-filter
//!
//! `dynamic-cuckoo-filter` contains cuckoo filters: approximate set-membership structures that
//! support insertion, membership queries, and deletion with a controllable false positive rate and
//! no false negatives.
//!
//! A [`CuckooFilter`](cuckoo::CuckooFilter) is a fixed-capacity table of buckets holding short
//! fingerprints. Every item has two candidate buckets, and a full bucket relocates one of its
//! fingerprints to that fingerprint's alternate bucket. When a bounded chain of relocations does
//! not find room, the displaced fingerprint is parked in a single victim slot.
//!
//! A [`DynamicCuckooFilter`](cuckoo::DynamicCuckooFilter) chains equally sized cuckoo filters,
//! appending a filter when every filter has reached its load factor threshold, and can compact
//! itself by draining sparse filters into fuller ones.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! dynamic-cuckoo-filter = "*"
//! ```
//!
//! ```rust
//! use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
//!
//! let mut filter = DynamicCuckooFilter::<String>::new(1000);
//! filter.insert("foo").unwrap();
//! assert!(filter.contains("foo"));
//! ```
//!
//! ## Logging
//!
//! Chain growth, victim cascades, and compaction are reported through [`tracing`] at the `debug`
//! level. Parking a fingerprint in a victim slot is reported at the `trace` level.
//!
//! ## References
//!
//!  - [Cuckoo Filter: Practically Better Than Bloom](https://dl.acm.org/citation.cfm?id=2674994)
//!  > Fan, Bin, Dave G. Andersen, Michael Kaminsky, and Michael D. Mitzenmacher. 2014. “Cuckoo Filter: Practically Better Than Bloom.” In *Proceedings of the 10th Acm International on Conference on Emerging Networking Experiments and Technologies*, 75–88. CoNEXT ’14. New York, NY, USA: ACM. doi:[10.1145/2674005.2674994](https://doi.org/10.1145/2674005.2674994).
//!  - [The Dynamic Cuckoo Filter](https://ieeexplore.ieee.org/document/8117563)
//!  > Chen, Hanhua, Liangyi Liao, Hai Jin, and Jie Wu. 2017. “The Dynamic Cuckoo Filter.” In *2017 IEEE 25th International Conference on Network Protocols (ICNP)*, 1–10. doi:[10.1109/ICNP.2017.8117563](https://doi.org/10.1109/ICNP.2017.8117563).

#![warn(missing_docs)]

pub mod bit_array_vec;
pub mod bit_vec;
pub mod config;
pub mod cuckoo;
pub mod error;
mod util;

pub use crate::config::CuckooFilterConfig;
pub use crate::error::{CuckooError, Result};
pub use crate::util::SipHasherBuilder;
