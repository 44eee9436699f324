use crate::config::CuckooFilterConfig;
use crate::cuckoo::{CuckooFilter, DEFAULT_FINGERPRINT_BIT_COUNT, DEFAULT_LOAD_FACTOR_THRESHOLD};
use crate::error::{CuckooError, Result};
use crate::util::SipHasherBuilder;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use tracing::debug;

/// A growable, space-efficient probabilistic data structure to test for membership in a set.
/// Dynamic cuckoo filters also provide the flexibility to remove items.
///
/// A dynamic cuckoo filter is a chain of equally sized cuckoo filters. Items are inserted into
/// the first filter whose load factor is below the threshold, and a new filter is appended once
/// every filter has reached it. A victim produced by one filter is handed down the chain, so an
/// insert into a dynamic cuckoo filter never fails.
///
/// Since every filter in the chain shares the same hasher and bucket count, fingerprints can be
/// moved between filters bucket by bucket. [`DynamicCuckooFilter::compact`] uses this to drain
/// sparsely populated filters into fuller ones and drop the filters it empties.
///
/// # Examples
///
/// ```
/// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
///
/// let mut filter = DynamicCuckooFilter::<u32>::new(100);
///
/// for item in 0..200 {
///     filter.insert(&item).unwrap();
/// }
/// assert!(filter.contains(&0));
/// assert_eq!(filter.len(), 200);
/// assert!(filter.filter_count() >= 2);
///
/// for item in 0..150 {
///     filter.remove(&item).unwrap();
/// }
/// filter.compact().unwrap();
/// assert_eq!(filter.len(), 50);
/// ```
#[derive(Debug)]
pub struct DynamicCuckooFilter<T, B = SipHasherBuilder> {
    filters: Vec<CuckooFilter<T, B>>,
    current: usize,
    max_items: usize,
    fingerprint_bit_count: usize,
    load_factor_threshold: f64,
    hash_builder: B,
    rng: XorShiftRng,
}

impl<T> DynamicCuckooFilter<T> {
    /// Constructs a new, empty `DynamicCuckooFilter` whose filters each hold up to `max_items`
    /// items, using 8-bit fingerprints and a load factor threshold of 0.9.
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    ///
    /// let filter = DynamicCuckooFilter::<String>::new(100);
    /// ```
    pub fn new(max_items: usize) -> Self {
        Self::with_hasher(
            max_items,
            DEFAULT_FINGERPRINT_BIT_COUNT,
            DEFAULT_LOAD_FACTOR_THRESHOLD,
            SipHasherBuilder::from_entropy(),
        )
    }

    /// Constructs a new, empty `DynamicCuckooFilter` whose filters each hold up to `max_items`
    /// items using `fingerprint_bit_count`-bit fingerprints, and which appends a filter once the
    /// load factor of every filter reaches `load_factor_threshold`.
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is zero, if `fingerprint_bit_count` is not between 2 and 64, or if
    /// `load_factor_threshold` is not in `(0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    ///
    /// let filter = DynamicCuckooFilter::<String>::from_parameters(100, 16, 0.8);
    /// assert_eq!(filter.fingerprint_bit_count(), 16);
    /// ```
    pub fn from_parameters(
        max_items: usize,
        fingerprint_bit_count: usize,
        load_factor_threshold: f64,
    ) -> Self {
        Self::with_hasher(
            max_items,
            fingerprint_bit_count,
            load_factor_threshold,
            SipHasherBuilder::from_entropy(),
        )
    }

    /// Constructs a new, empty `DynamicCuckooFilter` from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::InvalidConfig`] if the configuration does not validate.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    /// use dynamic_cuckoo_filter::CuckooFilterConfig;
    ///
    /// let config = CuckooFilterConfig::new().with_max_items(512).with_seed(7);
    /// let filter = DynamicCuckooFilter::<String>::from_config(&config).unwrap();
    /// assert_eq!(filter.max_items(), 512);
    /// ```
    pub fn from_config(config: &CuckooFilterConfig) -> Result<Self> {
        Self::from_config_with_hasher(config, SipHasherBuilder::from_entropy())
    }
}

impl<T, B> DynamicCuckooFilter<T, B>
where
    B: BuildHasher + Clone,
{
    /// Constructs a new, empty `DynamicCuckooFilter` with the given hasher builder, which is
    /// shared by every filter in the chain.
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is zero, if `fingerprint_bit_count` is not between 2 and 64, or if
    /// `load_factor_threshold` is not in `(0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    /// use dynamic_cuckoo_filter::SipHasherBuilder;
    ///
    /// let filter = DynamicCuckooFilter::<String>::with_hasher(
    ///     100,
    ///     8,
    ///     0.9,
    ///     SipHasherBuilder::from_seed(0, 0),
    /// );
    /// ```
    pub fn with_hasher(
        max_items: usize,
        fingerprint_bit_count: usize,
        load_factor_threshold: f64,
        hash_builder: B,
    ) -> Self {
        Self::with_rng(
            max_items,
            fingerprint_bit_count,
            load_factor_threshold,
            hash_builder,
            XorShiftRng::from_entropy(),
        )
    }

    /// Constructs a new, empty `DynamicCuckooFilter` like [`DynamicCuckooFilter::with_hasher`],
    /// but with every kickout RNG in the chain derived from `seed`.
    pub fn with_hasher_and_seed(
        max_items: usize,
        fingerprint_bit_count: usize,
        load_factor_threshold: f64,
        hash_builder: B,
        seed: u64,
    ) -> Self {
        Self::with_rng(
            max_items,
            fingerprint_bit_count,
            load_factor_threshold,
            hash_builder,
            XorShiftRng::seed_from_u64(seed),
        )
    }

    /// Constructs a new, empty `DynamicCuckooFilter` from a configuration and a hasher builder.
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
            config.load_factor_threshold,
            hash_builder,
            rng,
        ))
    }

    fn with_rng(
        max_items: usize,
        fingerprint_bit_count: usize,
        load_factor_threshold: f64,
        hash_builder: B,
        rng: XorShiftRng,
    ) -> Self {
        assert!(load_factor_threshold > 0.0 && load_factor_threshold <= 1.0);
        let mut filter = DynamicCuckooFilter {
            filters: Vec::new(),
            current: 0,
            max_items,
            fingerprint_bit_count,
            load_factor_threshold,
            hash_builder,
            rng,
        };
        let first = filter.new_filter();
        filter.filters.push(first);
        filter
    }

    fn new_filter(&mut self) -> CuckooFilter<T, B> {
        CuckooFilter::with_rng(
            self.max_items,
            self.fingerprint_bit_count,
            self.hash_builder.clone(),
            XorShiftRng::seed_from_u64(self.rng.gen()),
        )
    }

    fn push_filter(&mut self) {
        let filter = self.new_filter();
        self.filters.push(filter);
        debug!(filter_count = self.filters.len(), "appended cuckoo filter");
    }

    #[inline]
    fn is_saturated(&self, index: usize) -> bool {
        self.filters[index].load_factor() >= self.load_factor_threshold
    }

    fn reset_cursor(&mut self) {
        let last = self.filters.len() - 1;
        self.current = (0..self.filters.len())
            .find(|&index| !self.is_saturated(index))
            .unwrap_or(last);
    }

    // Hands victims down the chain starting at filter `index`, appending filters as needed. Each
    // step either places the fingerprint or moves on to a later filter, and a fresh filter always
    // has room, so this terminates.
    fn cascade_victims(&mut self, mut index: usize) -> Result<()> {
        while let Some(victim) = self.filters[index].victim() {
            self.filters[index].remove_victim(victim.index, victim.fingerprint)?;
            index += 1;
            if index == self.filters.len() {
                self.push_filter();
            }
            debug!(filter = index, bucket = victim.index, "cascading victim");
            self.filters[index].insert_at(victim.index, victim.fingerprint)?;
        }
        Ok(())
    }

    /// Inserts an element into the dynamic cuckoo filter. Inserting the same element twice
    /// stores two copies of its fingerprint.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    ///
    /// let mut filter = DynamicCuckooFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// ```
    pub fn insert<U>(&mut self, item: &U) -> Result<()>
    where
        T: Borrow<U>,
        U: Hash + ?Sized,
    {
        while self.is_saturated(self.current) {
            if self.current + 1 == self.filters.len() {
                self.push_filter();
            }
            self.current += 1;
        }

        self.filters[self.current].insert(item)?;
        self.cascade_victims(self.current)
    }

    /// Checks if an element is possibly in the dynamic cuckoo filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    ///
    /// let mut filter = DynamicCuckooFilter::<String>::new(100);
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
        self.filters.iter().any(|filter| filter.contains(item))
    }

    /// Removes one copy of an element from the first filter in the chain that holds it.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::NotFound`] if no filter holds the element.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    ///
    /// let mut filter = DynamicCuckooFilter::<String>::new(100);
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
        let index = self
            .filters
            .iter_mut()
            .position(|filter| filter.remove(item).is_ok())
            .ok_or(CuckooError::NotFound)?;

        // the cursor tracks the earliest filter below the threshold
        if index < self.current && !self.is_saturated(index) {
            self.current = index;
        }
        Ok(())
    }

    /// Consolidates sparsely populated filters. Every filter below the load factor threshold is
    /// queued by ascending length; the fingerprints of each queued filter are moved, bucket by
    /// bucket, into the same bucket of later queued filters until those reach the threshold or
    /// the bucket fills up. Filters that end up empty are removed from the chain, preserving the
    /// order of the rest. The total number of items is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    ///
    /// let mut filter = DynamicCuckooFilter::<u32>::new(100);
    /// for item in 0..400 {
    ///     filter.insert(&item).unwrap();
    /// }
    /// let filter_count = filter.filter_count();
    ///
    /// for item in 100..400 {
    ///     filter.remove(&item).unwrap();
    /// }
    /// filter.compact().unwrap();
    ///
    /// assert!(filter.filter_count() < filter_count);
    /// assert_eq!(filter.len(), 100);
    /// ```
    pub fn compact(&mut self) -> Result<()> {
        let threshold = self.load_factor_threshold;
        let len = self.len();

        let mut queue = (0..self.filters.len())
            .filter(|&index| !self.is_saturated(index))
            .collect::<Vec<usize>>();
        queue.sort_by_key(|&index| self.filters[index].len());

        let mut is_removed = vec![false; self.filters.len()];
        let mut moved_count = 0;
        for (position, &source) in queue.iter().enumerate() {
            for bucket_index in 0..self.bucket_count() {
                let mut fingerprints = self.filters[source]
                    .bucket(bucket_index)
                    .into_iter()
                    .peekable();

                for &target in queue[position + 1..].iter().rev() {
                    while let Some(&fingerprint) = fingerprints.peek() {
                        if self.filters[target].load_factor() >= threshold
                            || self.filters[target].is_bucket_full(bucket_index)
                        {
                            break;
                        }
                        self.filters[target].insert_into_bucket(bucket_index, fingerprint)?;
                        self.filters[source].remove_from_bucket(bucket_index, fingerprint)?;
                        fingerprints.next();
                        moved_count += 1;
                    }
                    if fingerprints.peek().is_none() {
                        break;
                    }
                }

                if self.filters[source].is_empty() {
                    is_removed[source] = true;
                    break;
                }
            }
        }

        if is_removed.iter().all(|is_removed| *is_removed) {
            is_removed[0] = false;
        }
        let removed_count = is_removed.iter().filter(|is_removed| **is_removed).count();
        let mut index = 0;
        self.filters.retain(|_| {
            let keep = !is_removed[index];
            index += 1;
            keep
        });
        self.reset_cursor();

        debug_assert_eq!(len, self.len());
        debug!(
            moved_count,
            removed_count,
            filter_count = self.filters.len(),
            "compacted dynamic cuckoo filter"
        );
        Ok(())
    }

    /// Clears the dynamic cuckoo filter, leaving a single empty filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    ///
    /// let mut filter = DynamicCuckooFilter::<String>::new(100);
    ///
    /// filter.insert("foo").unwrap();
    /// filter.clear();
    ///
    /// assert!(!filter.contains("foo"));
    /// assert_eq!(filter.filter_count(), 1);
    /// ```
    pub fn clear(&mut self) {
        self.filters.truncate(1);
        self.filters[0].clear();
        self.current = 0;
    }

    /// Returns the number of items in the dynamic cuckoo filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    ///
    /// let filter = DynamicCuckooFilter::<String>::new(100);
    ///
    /// assert_eq!(filter.len(), 0);
    /// ```
    pub fn len(&self) -> usize {
        self.filters.iter().map(|filter| filter.len()).sum()
    }

    /// Returns `true` if there are no items in the dynamic cuckoo filter.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fingerprint slots across all filters.
    pub fn capacity(&self) -> usize {
        self.filters.iter().map(|filter| filter.capacity()).sum()
    }

    /// Returns the ratio of stored items to the combined `max_items` of every filter.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / (self.max_items * self.filters.len()) as f64
    }

    /// Returns the number of items each filter is sized for.
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Returns the load factor at which a filter stops receiving new items.
    pub fn load_factor_threshold(&self) -> f64 {
        self.load_factor_threshold
    }

    /// Returns the number of buckets in each filter.
    pub fn bucket_count(&self) -> usize {
        self.filters[0].bucket_count()
    }

    /// Returns the number of bits in each fingerprint.
    pub fn fingerprint_bit_count(&self) -> usize {
        self.fingerprint_bit_count
    }

    /// Returns the number of filters in the chain.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    ///
    /// let filter = DynamicCuckooFilter::<String>::new(100);
    ///
    /// assert_eq!(filter.filter_count(), 1);
    /// ```
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Returns the number of items in each filter, in chain order.
    pub fn filter_lens(&self) -> Vec<usize> {
        self.filters.iter().map(|filter| filter.len()).collect()
    }

    /// Returns the filters of the chain, in chain order.
    pub fn filters(&self) -> &[CuckooFilter<T, B>] {
        &self.filters
    }

    /// Returns the size of all fingerprint tables in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.filters.iter().map(|filter| filter.size_in_bytes()).sum()
    }

    /// Returns the number of table bits spent per stored item. Infinite for an empty filter.
    pub fn bits_per_item(&self) -> f64 {
        (self.size_in_bytes() * 8) as f64 / self.len() as f64
    }

    /// Returns the estimated false positive probability of the dynamic cuckoo filter. This value
    /// will increase as more items are added.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::cuckoo::DynamicCuckooFilter;
    ///
    /// let mut filter = DynamicCuckooFilter::<String>::new(100);
    /// assert!(filter.estimated_fpp() < std::f64::EPSILON);
    ///
    /// filter.insert("foo").unwrap();
    /// assert!(filter.estimated_fpp() > std::f64::EPSILON);
    /// ```
    pub fn estimated_fpp(&self) -> f64 {
        1.0 - self
            .filters
            .iter()
            .map(|filter| 1.0 - filter.estimated_fpp())
            .product::<f64>()
    }

    /// Returns a reference to the hasher builder shared by every filter.
    pub fn hasher(&self) -> &B {
        &self.hash_builder
    }
}
