use byteorder::{ByteOrder, LittleEndian};
use rand::Rng;
use siphasher::sip::SipHasher;
use std::hash::BuildHasher;
use std::hash::{Hash, Hasher};
use std::{cmp, fmt};

/// The default hash builder for all filters.
#[derive(Clone, Copy)]
pub struct SipHasherBuilder {
    k0: u64,
    k1: u64,
    hasher: SipHasher,
}

impl SipHasherBuilder {
    /// Constructs a new `SipHasherBuilder` that uses the thread-local RNG to seed itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::SipHasherBuilder;
    ///
    /// let hash_builder = SipHasherBuilder::from_entropy();
    /// ```
    pub fn from_entropy() -> Self {
        let mut rng = rand::thread_rng();
        Self::from_seed(rng.gen(), rng.gen())
    }

    /// Constructs a new `SipHasherBuilder` that is seeded with the given keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::SipHasherBuilder;
    ///
    /// let hash_builder = SipHasherBuilder::from_seed(0, 0);
    /// ```
    pub fn from_seed(k0: u64, k1: u64) -> Self {
        SipHasherBuilder {
            k0,
            k1,
            hasher: SipHasher::new_with_keys(k0, k1),
        }
    }
}

impl fmt::Debug for SipHasherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SipHasherBuilder")
            .field("k0", &self.k0)
            .field("k1", &self.k1)
            .finish()
    }
}

impl cmp::PartialEq for SipHasherBuilder {
    fn eq(&self, other: &SipHasherBuilder) -> bool {
        self.k0 == other.k0 && self.k1 == other.k1
    }
}

impl BuildHasher for SipHasherBuilder {
    type Hasher = SipHasher;

    #[inline]
    fn build_hasher(&self) -> SipHasher {
        self.hasher
    }
}

pub fn hash(hash_builder: &impl BuildHasher, item: &impl Hash) -> u64 {
    let mut hasher = hash_builder.build_hasher();
    item.hash(&mut hasher);
    hasher.finish()
}

/// Hashes the little-endian byte representation of a fingerprint.
pub fn hash_fingerprint(hash_builder: &impl BuildHasher, fingerprint: u64) -> u64 {
    let mut bytes = [0u8; 8];
    LittleEndian::write_u64(&mut bytes, fingerprint);
    let mut hasher = hash_builder.build_hasher();
    hasher.write(&bytes);
    hasher.finish()
}

#[cfg(test)]
pub mod tests {
    use super::{hash, hash_fingerprint, SipHasherBuilder};
    use siphasher::sip::SipHasher;

    pub fn hash_builder_1() -> SipHasherBuilder {
        SipHasherBuilder {
            k0: 0,
            k1: 0,
            hasher: SipHasher::new_with_keys(0, 0),
        }
    }

    pub fn hash_builder_2() -> SipHasherBuilder {
        SipHasherBuilder {
            k0: 1,
            k1: 1,
            hasher: SipHasher::new_with_keys(1, 1),
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let s1 = "TCGATCTCTGTTCGGTATGCCACCAATTTCAAGGTAAACT";
        let s2 = String::from(s1);
        assert_eq!(hash(&hash_builder_1(), &s1), hash(&hash_builder_1(), &s2.as_str()));
    }

    #[test]
    fn test_hash_differs_between_items() {
        let s1 = "ACATATGTCCGTATGTACATACCTACGGACGTACATACGA";
        let s2 = "TGGTACGGTCGTATGTGCTTGAGTAAGTACGTAAGTAACT";
        assert_ne!(hash(&hash_builder_1(), &s1), hash(&hash_builder_1(), &s2));
    }

    #[test]
    fn test_hash_differs_between_keys() {
        assert_ne!(hash(&hash_builder_1(), &"foo"), hash(&hash_builder_2(), &"foo"));
    }

    #[test]
    fn test_hash_fingerprint() {
        let hash_builder = hash_builder_1();
        assert_eq!(
            hash_fingerprint(&hash_builder, 0xAB),
            hash_fingerprint(&hash_builder, 0xAB),
        );
        assert_ne!(
            hash_fingerprint(&hash_builder, 0xAB),
            hash_fingerprint(&hash_builder, 0xAC),
        );
    }

    #[test]
    fn test_hasher_builder_eq() {
        assert_eq!(hash_builder_1(), SipHasherBuilder::from_seed(0, 0));
        assert_ne!(hash_builder_1(), hash_builder_2());
    }
}
