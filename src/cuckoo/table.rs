use crate::bit_array_vec::BitArrayVec;
use crate::bit_vec::BitVec;
use crate::cuckoo::ENTRIES_PER_BUCKET;
use rand::Rng;

/// Outcome of inserting a fingerprint into a single bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BucketInsert {
    /// The fingerprint was written into an empty slot.
    Inserted,
    /// The bucket is full and nothing was written.
    Full,
    /// The bucket was full, so the fingerprint replaced a random slot whose previous fingerprint
    /// is returned and must be re-homed by the caller.
    Evicted(u64),
}

/// Bucketized fingerprint storage. Every bucket holds `ENTRIES_PER_BUCKET` slots, and every slot
/// is either empty or holds a fingerprint. Emptiness is tracked by a separate presence bit, so a
/// fingerprint of `0` is a legitimate value.
///
/// The table knows nothing about items or hashing; all indexes and fingerprints are computed by
/// the owning filter.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    fingerprints: BitArrayVec,
    occupied: BitVec,
    bucket_count: usize,
}

impl Table {
    /// Returns the bucket count that fits `max_items` items: `ceil(max_items / 4)` rounded up to
    /// the next power of two, and at least one.
    pub fn bucket_count_for(max_items: usize) -> usize {
        ((max_items + ENTRIES_PER_BUCKET - 1) / ENTRIES_PER_BUCKET)
            .max(1)
            .next_power_of_two()
    }

    /// Constructs an empty table of `bucket_count` buckets. `bucket_count` must be a power of two.
    pub fn new(bucket_count: usize, fingerprint_bit_count: usize) -> Self {
        assert!(bucket_count > 0 && bucket_count.is_power_of_two());
        let slot_count = bucket_count * ENTRIES_PER_BUCKET;
        Table {
            fingerprints: BitArrayVec::new(fingerprint_bit_count, slot_count),
            occupied: BitVec::new(slot_count),
            bucket_count,
        }
    }

    #[inline]
    fn get_vec_index(&self, index: usize, slot: usize) -> usize {
        assert!(index < self.bucket_count && slot < ENTRIES_PER_BUCKET);
        index * ENTRIES_PER_BUCKET + slot
    }

    /// Returns the fingerprint in slot `slot` of bucket `index`, or `None` if the slot is empty.
    ///
    /// # Panics
    ///
    /// Panics if `index` or `slot` is out of range.
    pub fn read(&self, index: usize, slot: usize) -> Option<u64> {
        let vec_index = self.get_vec_index(index, slot);
        if self.occupied.get(vec_index)? {
            Some(self.fingerprints.get(vec_index))
        } else {
            None
        }
    }

    /// Writes `fingerprint` into slot `slot` of bucket `index`, replacing any previous value.
    pub fn write(&mut self, index: usize, slot: usize, fingerprint: u64) {
        let vec_index = self.get_vec_index(index, slot);
        self.fingerprints.set(vec_index, fingerprint);
        self.occupied.set(vec_index, true);
    }

    /// Empties slot `slot` of bucket `index`.
    pub fn clear_slot(&mut self, index: usize, slot: usize) {
        let vec_index = self.get_vec_index(index, slot);
        self.fingerprints.set(vec_index, 0);
        self.occupied.set(vec_index, false);
    }

    /// Returns the fingerprints stored in bucket `index`, in slot order.
    pub fn bucket(&self, index: usize) -> Vec<u64> {
        (0..ENTRIES_PER_BUCKET)
            .filter_map(|slot| self.read(index, slot))
            .collect()
    }

    /// Returns `true` if `fingerprint` is stored in bucket `index_1` or bucket `index_2`.
    pub fn find(&self, index_1: usize, index_2: usize, fingerprint: u64) -> bool {
        (0..ENTRIES_PER_BUCKET).any(|slot| {
            self.read(index_1, slot) == Some(fingerprint)
                || self.read(index_2, slot) == Some(fingerprint)
        })
    }

    /// Empties the first slot of bucket `index` that holds `fingerprint`. Returns `true` if a
    /// slot was emptied.
    pub fn delete(&mut self, index: usize, fingerprint: u64) -> bool {
        match (0..ENTRIES_PER_BUCKET).find(|&slot| self.read(index, slot) == Some(fingerprint)) {
            Some(slot) => {
                self.clear_slot(index, slot);
                true
            }
            None => false,
        }
    }

    /// Writes `fingerprint` into the first empty slot of bucket `index`. If the bucket is full and
    /// `kickout` is set, a uniformly random slot is overwritten instead and its previous
    /// fingerprint is returned.
    pub fn insert<R>(
        &mut self,
        index: usize,
        fingerprint: u64,
        kickout: bool,
        rng: &mut R,
    ) -> BucketInsert
    where
        R: Rng,
    {
        if let Some(slot) = (0..ENTRIES_PER_BUCKET).find(|&slot| self.read(index, slot).is_none()) {
            self.write(index, slot, fingerprint);
            return BucketInsert::Inserted;
        }

        if !kickout {
            return BucketInsert::Full;
        }

        let slot = rng.gen_range(0, ENTRIES_PER_BUCKET);
        let vec_index = self.get_vec_index(index, slot);
        let evicted = self.fingerprints.get(vec_index);
        self.fingerprints.set(vec_index, fingerprint);
        BucketInsert::Evicted(evicted)
    }

    /// Returns `true` if every slot of bucket `index` is occupied.
    pub fn is_bucket_full(&self, index: usize) -> bool {
        (0..ENTRIES_PER_BUCKET).all(|slot| self.read(index, slot).is_some())
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.fingerprints.clear();
        self.occupied.set_all(false);
    }

    /// Returns the number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Returns the total number of slots, used or not.
    pub fn slot_count(&self) -> usize {
        self.bucket_count * ENTRIES_PER_BUCKET
    }

    /// Returns the number of occupied slots.
    pub fn occupied_len(&self) -> usize {
        self.occupied.count_ones()
    }

    /// Returns the width of a stored fingerprint in bits.
    pub fn fingerprint_bit_count(&self) -> usize {
        self.fingerprints.bit_count()
    }

    /// Returns the size of the fingerprint storage in bytes, `ceil(bits * 4 / 8)` per bucket.
    pub fn size_in_bytes(&self) -> usize {
        let bytes_per_bucket = (self.fingerprint_bit_count() * ENTRIES_PER_BUCKET + 7) / 8;
        bytes_per_bucket * self.bucket_count
    }
}

#[cfg(test)]
mod tests {
    use super::{BucketInsert, Table};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn rng() -> XorShiftRng {
        XorShiftRng::seed_from_u64(0)
    }

    #[test]
    fn test_bucket_count_for() {
        assert_eq!(Table::bucket_count_for(1), 1);
        assert_eq!(Table::bucket_count_for(4), 1);
        assert_eq!(Table::bucket_count_for(5), 2);
        assert_eq!(Table::bucket_count_for(10), 4);
        assert_eq!(Table::bucket_count_for(100), 32);
        assert_eq!(Table::bucket_count_for(512), 128);
    }

    #[test]
    fn test_new() {
        let table = Table::new(4, 8);
        assert_eq!(table.bucket_count(), 4);
        assert_eq!(table.slot_count(), 16);
        assert_eq!(table.occupied_len(), 0);
        assert_eq!(table.size_in_bytes(), 16);
        assert_eq!(table.fingerprint_bit_count(), 8);

        let table = Table::new(4, 7);
        assert_eq!(table.size_in_bytes(), 16);

        let table = Table::new(2, 16);
        assert_eq!(table.size_in_bytes(), 16);
    }

    #[test]
    fn test_read_write() {
        let mut table = Table::new(2, 8);
        assert_eq!(table.read(1, 2), None);

        table.write(1, 2, 0xAB);
        assert_eq!(table.read(1, 2), Some(0xAB));
        assert_eq!(table.occupied_len(), 1);

        table.write(1, 2, 0xCD);
        assert_eq!(table.read(1, 2), Some(0xCD));
        assert_eq!(table.occupied_len(), 1);

        table.clear_slot(1, 2);
        assert_eq!(table.read(1, 2), None);
        assert_eq!(table.occupied_len(), 0);
    }

    #[test]
    #[should_panic]
    fn test_read_out_of_range_bucket() {
        let table = Table::new(4, 8);
        table.read(4, 0);
    }

    #[test]
    #[should_panic]
    fn test_write_out_of_range_slot() {
        let mut table = Table::new(4, 8);
        table.write(0, 4, 1);
    }

    #[test]
    fn test_zero_fingerprint_is_stored() {
        let mut table = Table::new(1, 8);
        table.write(0, 0, 0);
        assert_eq!(table.read(0, 0), Some(0));
        assert_eq!(table.bucket(0), vec![0]);
        assert!(table.find(0, 0, 0));
        assert!(table.delete(0, 0));
        assert!(!table.find(0, 0, 0));
    }

    #[test]
    fn test_bucket() {
        let mut table = Table::new(2, 16);
        table.write(0, 3, 3);
        table.write(0, 1, 1);
        assert_eq!(table.bucket(0), vec![1, 3]);
        assert!(table.bucket(1).is_empty());
    }

    #[test]
    fn test_find() {
        let mut table = Table::new(4, 8);
        table.write(2, 0, 7);
        assert!(table.find(2, 3, 7));
        assert!(table.find(3, 2, 7));
        assert!(!table.find(0, 1, 7));
        assert!(!table.find(2, 3, 8));
    }

    #[test]
    fn test_delete() {
        let mut table = Table::new(1, 8);
        table.write(0, 1, 5);
        table.write(0, 2, 5);

        assert!(table.delete(0, 5));
        assert_eq!(table.read(0, 1), None);
        assert_eq!(table.read(0, 2), Some(5));

        assert!(table.delete(0, 5));
        assert!(!table.delete(0, 5));
        assert_eq!(table.occupied_len(), 0);
    }

    #[test]
    fn test_insert() {
        let mut rng = rng();
        let mut table = Table::new(1, 8);
        for fingerprint in 1..=4 {
            assert_eq!(
                table.insert(0, fingerprint, false, &mut rng),
                BucketInsert::Inserted,
            );
        }
        assert!(table.is_bucket_full(0));
        assert_eq!(table.bucket(0), vec![1, 2, 3, 4]);

        assert_eq!(table.insert(0, 9, false, &mut rng), BucketInsert::Full);
        assert_eq!(table.bucket(0), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_insert_kickout() {
        let mut rng = rng();
        let mut table = Table::new(1, 8);
        for fingerprint in 1..=4 {
            table.insert(0, fingerprint, true, &mut rng);
        }

        match table.insert(0, 9, true, &mut rng) {
            BucketInsert::Evicted(evicted) => {
                assert!((1..=4).contains(&evicted));
                let bucket = table.bucket(0);
                assert!(bucket.contains(&9));
                assert!(!bucket.contains(&evicted));
                assert_eq!(table.occupied_len(), 4);
            }
            outcome => panic!("expected an eviction, got {:?}", outcome),
        }
    }

    #[test]
    fn test_insert_kickout_is_reproducible() {
        let evictions = |seed| {
            let mut rng = XorShiftRng::seed_from_u64(seed);
            let mut table = Table::new(1, 8);
            for fingerprint in 1..=4 {
                table.insert(0, fingerprint, true, &mut rng);
            }
            (10..20)
                .map(|fingerprint| table.insert(0, fingerprint, true, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(evictions(3), evictions(3));
    }

    #[test]
    fn test_clear() {
        let mut table = Table::new(2, 8);
        table.write(0, 0, 1);
        table.write(1, 3, 2);
        table.clear();
        assert_eq!(table.occupied_len(), 0);
        assert!(table.bucket(0).is_empty());
        assert!(table.bucket(1).is_empty());
    }
}
