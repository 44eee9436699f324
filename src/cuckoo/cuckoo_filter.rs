use crate::config::CuckooFilterConfig;
use crate::cuckoo::table::{BucketInsert, Table};
use crate::cuckoo::{DEFAULT_FINGERPRINT_BIT_COUNT, ENTRIES_PER_BUCKET, MAX_KICKS};
use crate::error::{CuckooError, Result};
use crate::util::{self, SipHasherBuilder};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use tracing::trace;

/// A fingerprint that could not be placed within the kick limit, together with the bucket index
/// it was last destined for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Victim {
    /// Bucket index the fingerprint belongs to. The alternate bucket is recoverable from the
    /// fingerprint.
    pub index: usize,
    /// The homeless fingerprint.
    pub fingerprint: u64,
}

/// A space-efficient probabilistic data structure to test for membership in a set. Cuckoo filters
/// also provide the flexibility to remove items.
///
/// A cuckoo filter is based on cuckoo hashing and is essentially a cuckoo hash table storing
/// each keys' fingerprint. Every item maps to two candidate buckets of four slots each; when both
/// are full, resident fingerprints are kicked to their alternate bucket, up to 500 times. If the
/// chain of kicks does not terminate, the last homeless fingerprint is parked in a single victim
/// slot and the filter refuses further inserts until a removal makes room for it.
///
/// # Examples
///
/// ```
/// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
/// use dynamic_cuckoo_filter::CuckooError;
///
/// let mut filter = CuckooFilter::<String>::new(100);
///
/// assert!(!filter.contains("foo"));
/// assert_eq!(filter.insert("foo"), Ok(()));
/// assert!(filter.contains("foo"));
///
/// assert_eq!(filter.remove("foo"), Ok(()));
/// assert!(!filter.contains("foo"));
/// assert_eq!(filter.remove("foo"), Err(CuckooError::NotFound));
///
/// assert_eq!(filter.len(), 0);
/// assert_eq!(filter.capacity(), 128);
/// assert_eq!(filter.bucket_count(), 32);
/// assert_eq!(filter.fingerprint_bit_count(), 8);
/// ```
#[derive(Debug)]
pub struct CuckooFilter<T, B = SipHasherBuilder> {
    table: Table,
    victim: Option<Victim>,
    len: usize,
    max_items: usize,
    hash_builder: B,
    rng: XorShiftRng,
    _marker: PhantomData<T>,
}

impl<T> CuckooFilter<T> {
    /// Constructs a new, empty `CuckooFilter` that holds up to `max_items` items using 8-bit
    /// fingerprints.
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
    ///
    /// let filter = CuckooFilter::<String>::new(100);
    /// ```
    pub fn new(max_items: usize) -> Self {
        Self::with_hasher(
            max_items,
            DEFAULT_FINGERPRINT_BIT_COUNT,
            SipHasherBuilder::from_entropy(),
        )
    }

    /// Constructs a new, empty `CuckooFilter` that holds up to `max_items` items using
    /// `fingerprint_bit_count`-bit fingerprints.
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is zero or if `fingerprint_bit_count` is not between 2 and 64.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
    ///
    /// let filter = CuckooFilter::<String>::from_fingerprint_bit_count(100, 16);
    /// assert_eq!(filter.fingerprint_bit_count(), 16);
    /// ```
    pub fn from_fingerprint_bit_count(max_items: usize, fingerprint_bit_count: usize) -> Self {
        Self::with_hasher(
            max_items,
            fingerprint_bit_count,
            SipHasherBuilder::from_entropy(),
        )
    }

    /// Constructs a new, empty `CuckooFilter` from a configuration. The load factor threshold is
    /// unused by a standalone filter, but the whole configuration is still validated, so an
    /// out-of-range threshold is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::InvalidConfig`] if the configuration does not validate.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
    /// use dynamic_cuckoo_filter::CuckooFilterConfig;
    ///
    /// let config = CuckooFilterConfig::new().with_max_items(10).with_seed(1);
    /// let filter = CuckooFilter::<String>::from_config(&config).unwrap();
    /// assert_eq!(filter.max_items(), 10);
    /// ```
    pub fn from_config(config: &CuckooFilterConfig) -> Result<Self> {
        Self::from_config_with_hasher(config, SipHasherBuilder::from_entropy())
    }
}

impl<T, B> CuckooFilter<T, B>
where
    B: BuildHasher,
{
    /// Constructs a new, empty `CuckooFilter` that holds up to `max_items` items using
    /// `fingerprint_bit_count`-bit fingerprints and the given hasher builder. Kickouts are drawn
    /// from an entropy-seeded RNG.
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is zero or if `fingerprint_bit_count` is not between 2 and 64.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
    /// use dynamic_cuckoo_filter::SipHasherBuilder;
    ///
    /// let filter = CuckooFilter::<String>::with_hasher(100, 8, SipHasherBuilder::from_seed(0, 0));
    /// ```
    pub fn with_hasher(max_items: usize, fingerprint_bit_count: usize, hash_builder: B) -> Self {
        Self::with_rng(
            max_items,
            fingerprint_bit_count,
            hash_builder,
            XorShiftRng::from_entropy(),
        )
    }

    /// Constructs a new, empty `CuckooFilter` like [`CuckooFilter::with_hasher`], but with the
    /// kickout RNG seeded by `seed` so that evictions are reproducible.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
    /// use dynamic_cuckoo_filter::SipHasherBuilder;
    ///
    /// let filter = CuckooFilter::<String>::with_hasher_and_seed(
    ///     100,
    ///     8,
    ///     SipHasherBuilder::from_seed(0, 0),
    ///     42,
    /// );
    /// ```
    pub fn with_hasher_and_seed(
        max_items: usize,
        fingerprint_bit_count: usize,
        hash_builder: B,
        seed: u64,
    ) -> Self {
        Self::with_rng(
            max_items,
            fingerprint_bit_count,
            hash_builder,
            XorShiftRng::seed_from_u64(seed),
        )
    }

    /// Constructs a new, empty `CuckooFilter` from a configuration and a hasher builder.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::InvalidConfig`] if the configuration does not validate.
    pub fn from_config_with_hasher(config: &CuckooFilterConfig, hash_builder: B) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => XorShiftRng::seed_from_u64(seed),
            None => XorShiftRng::from_entropy(),
        };
        Ok(Self::with_rng(
            config.max_items,
            config.fingerprint_bit_count,
            hash_builder,
            rng,
        ))
    }

    pub(super) fn with_rng(
        max_items: usize,
        fingerprint_bit_count: usize,
        hash_builder: B,
        rng: XorShiftRng,
    ) -> Self {
        assert!(max_items > 0);
        assert!(fingerprint_bit_count > 1 && fingerprint_bit_count <= 64);
        CuckooFilter {
            table: Table::new(Table::bucket_count_for(max_items), fingerprint_bit_count),
            victim: None,
            len: 0,
            max_items,
            hash_builder,
            rng,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn fingerprint_mask(&self) -> u64 {
        let bit_count = self.fingerprint_bit_count();
        if bit_count == 64 {
            !0
        } else {
            (1 << bit_count) - 1
        }
    }

    // The fingerprint comes from the high half of the hash and the bucket index from the low
    // half, so items sharing a bucket do not also share fingerprint bits.
    fn fingerprint_and_index<U>(&self, item: &U) -> (u64, usize)
    where
        T: Borrow<U>,
        U: Hash + ?Sized,
    {
        let hash = util::hash(&self.hash_builder, &item);
        let fingerprint = hash.rotate_right(32) & self.fingerprint_mask();
        let index = (hash % self.bucket_count() as u64) as usize;
        (fingerprint, index)
    }

    /// Returns the alternate bucket index of `fingerprint` stored at bucket `index`. Applying it
    /// twice yields `index` again.
    pub fn alt_index(&self, index: usize, fingerprint: u64) -> usize {
        let hash = util::hash_fingerprint(&self.hash_builder, fingerprint);
        ((index as u64 ^ hash) % self.bucket_count() as u64) as usize
    }

    fn victim_matches(&self, fingerprint: u64, index_1: usize, index_2: usize) -> bool {
        match self.victim {
            Some(victim) => {
                victim.fingerprint == fingerprint
                    && (victim.index == index_1 || victim.index == index_2)
            }
            None => false,
        }
    }

    /// Inserts an element into the cuckoo filter. Inserting the same element twice stores two
    /// copies of its fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::NotEnoughSpace`] if the filter already holds `max_items` items or if
    /// its victim slot is occupied.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
    ///
    /// let mut filter = CuckooFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// ```
    pub fn insert<U>(&mut self, item: &U) -> Result<()>
    where
        T: Borrow<U>,
        U: Hash + ?Sized,
    {
        if self.victim.is_some() || self.len >= self.max_items {
            return Err(CuckooError::NotEnoughSpace);
        }
        let (fingerprint, index) = self.fingerprint_and_index(item);
        self.insert_at(index, fingerprint)
    }

    /// Inserts `fingerprint` starting at bucket `index`, kicking resident fingerprints to their
    /// alternate buckets when needed. If the kick limit is reached, the homeless fingerprint is
    /// stored as the victim; the fingerprint still counts as inserted.
    ///
    /// This does not check `max_items`, so a caller that places fingerprints directly may push
    /// the load factor above one.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::NotEnoughSpace`] if a victim is already parked.
    pub fn insert_at(&mut self, index: usize, fingerprint: u64) -> Result<()> {
        if self.victim.is_some() {
            return Err(CuckooError::NotEnoughSpace);
        }
        let mut index = index;
        let mut fingerprint = fingerprint;
        for kick in 0..MAX_KICKS {
            match self
                .table
                .insert(index, fingerprint, kick > 0, &mut self.rng)
            {
                BucketInsert::Inserted => {
                    self.len += 1;
                    return Ok(());
                }
                BucketInsert::Full => {}
                BucketInsert::Evicted(evicted) => {
                    fingerprint = evicted;
                    index = self.alt_index(index, evicted);
                }
            }
        }

        trace!(index, fingerprint, "kick limit reached, storing victim");
        self.victim = Some(Victim { index, fingerprint });
        self.len += 1;
        Ok(())
    }

    /// Checks if an element is possibly in the cuckoo filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
    ///
    /// let mut filter = CuckooFilter::<String>::new(100);
    ///
    /// assert!(!filter.contains("foo"));
    /// filter.insert("foo").unwrap();
    /// assert!(filter.contains("foo"));
    /// ```
    pub fn contains<U>(&self, item: &U) -> bool
    where
        T: Borrow<U>,
        U: Hash + ?Sized,
    {
        let (fingerprint, index_1) = self.fingerprint_and_index(item);
        let index_2 = self.alt_index(index_1, fingerprint);
        self.table.find(index_1, index_2, fingerprint)
            || self.victim_matches(fingerprint, index_1, index_2)
    }

    /// Removes one copy of an element from the cuckoo filter. If a victim is parked, it is
    /// re-inserted afterwards since the removal may have freed a slot for it.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::NotFound`] if the element's fingerprint is in neither of its
    /// buckets nor in the victim slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
    ///
    /// let mut filter = CuckooFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// assert!(filter.remove("foo").is_ok());
    /// assert!(!filter.contains("foo"));
    /// assert!(filter.remove("foo").is_err());
    /// ```
    pub fn remove<U>(&mut self, item: &U) -> Result<()>
    where
        T: Borrow<U>,
        U: Hash + ?Sized,
    {
        let (fingerprint, index_1) = self.fingerprint_and_index(item);
        let index_2 = self.alt_index(index_1, fingerprint);

        if self.table.delete(index_1, fingerprint) || self.table.delete(index_2, fingerprint) {
            self.len -= 1;
        } else if self.victim_matches(fingerprint, index_1, index_2) {
            self.victim = None;
            self.len -= 1;
        } else {
            return Err(CuckooError::NotFound);
        }

        if let Some(victim) = self.victim.take() {
            self.len -= 1;
            self.insert_at(victim.index, victim.fingerprint)?;
        }
        Ok(())
    }

    /// Returns the fingerprints stored in bucket `index`, in slot order.
    pub fn bucket(&self, index: usize) -> Vec<u64> {
        self.table.bucket(index)
    }

    /// Returns `true` if every slot of bucket `index` is occupied.
    pub fn is_bucket_full(&self, index: usize) -> bool {
        self.table.is_bucket_full(index)
    }

    /// Inserts `fingerprint` into bucket `index` without kicking anything out.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::NotEnoughSpace`] if the bucket is full.
    pub fn insert_into_bucket(&mut self, index: usize, fingerprint: u64) -> Result<()> {
        match self
            .table
            .insert(index, fingerprint, false, &mut self.rng)
        {
            BucketInsert::Inserted => {
                self.len += 1;
                Ok(())
            }
            _ => Err(CuckooError::NotEnoughSpace),
        }
    }

    /// Removes one copy of `fingerprint` from bucket `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::NotFound`] if the bucket does not hold `fingerprint`.
    pub fn remove_from_bucket(&mut self, index: usize, fingerprint: u64) -> Result<()> {
        if self.table.delete(index, fingerprint) {
            self.len -= 1;
            Ok(())
        } else {
            Err(CuckooError::NotFound)
        }
    }

    /// Returns the parked victim, if any.
    pub fn victim(&self) -> Option<Victim> {
        self.victim
    }

    /// Clears the victim slot if it holds `fingerprint` destined for bucket `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::NotFound`] if the victim slot is empty or holds something else.
    pub fn remove_victim(&mut self, index: usize, fingerprint: u64) -> Result<()> {
        match self.victim {
            Some(victim) if victim.index == index && victim.fingerprint == fingerprint => {
                self.victim = None;
                self.len -= 1;
                Ok(())
            }
            _ => Err(CuckooError::NotFound),
        }
    }

    /// Clears the cuckoo filter, removing all elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
    ///
    /// let mut filter = CuckooFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// filter.clear();
    ///
    /// assert!(!filter.contains("foo"));
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
        self.victim = None;
        self.len = 0;
    }

    /// Returns the number of items in the cuckoo filter, including a parked victim.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no items in the cuckoo filter.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of items the cuckoo filter was sized for.
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Returns the number of fingerprint slots in the cuckoo filter.
    pub fn capacity(&self) -> usize {
        self.table.slot_count()
    }

    /// Returns the number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the number of fingerprints stored in the table, excluding a parked victim.
    pub fn occupied_len(&self) -> usize {
        self.table.occupied_len()
    }

    /// Returns the ratio of stored items to `max_items`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
    ///
    /// let mut filter = CuckooFilter::<u32>::new(10);
    /// filter.insert(&1).unwrap();
    /// assert!((filter.load_factor() - 0.1).abs() < std::f64::EPSILON);
    /// ```
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.max_items as f64
    }

    /// Returns the size of the fingerprint table in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.table.size_in_bytes()
    }

    /// Returns the number of table bits spent per stored item. Infinite for an empty filter.
    pub fn bits_per_item(&self) -> f64 {
        (self.size_in_bytes() * 8) as f64 / self.len as f64
    }

    /// Returns the number of bits in each fingerprint.
    pub fn fingerprint_bit_count(&self) -> usize {
        self.table.fingerprint_bit_count()
    }

    /// Returns the estimated false positive probability of the cuckoo filter. This value will
    /// increase as more items are added.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::CuckooFilter;
    ///
    /// let mut filter = CuckooFilter::<String>::new(100);
    /// assert!(filter.estimated_fpp() < std::f64::EPSILON);
    ///
    /// filter.insert("foo").unwrap();
    /// assert!(filter.estimated_fpp() > std::f64::EPSILON);
    /// ```
    pub fn estimated_fpp(&self) -> f64 {
        let fingerprints_count = 2.0f64.powi(self.fingerprint_bit_count() as i32);
        let single_fpp = (fingerprints_count - 2.0) / (fingerprints_count - 1.0);
        let occupied_ratio = self.len as f64 / self.capacity() as f64;
        1.0 - single_fpp.powf(2.0 * ENTRIES_PER_BUCKET as f64 * occupied_ratio)
    }

    /// Returns a reference to the cuckoo filter's hasher builder.
    pub fn hasher(&self) -> &B {
        &self.hash_builder
    }
}

impl<T, B> PartialEq for CuckooFilter<T, B>
where
    B: PartialEq,
{
    fn eq(&self, other: &CuckooFilter<T, B>) -> bool {
        self.table == other.table
            && self.victim == other.victim
            && self.len == other.len
            && self.max_items == other.max_items
            && self.hash_builder == other.hash_builder
    }
}
