//! Fixed-length list of bits.

use std::mem;
use std::ops::Range;

/// A fixed-length list of bits implemented using a `Vec<u8>`. The number of set bits is tracked
/// on every write so that `count_ones` is constant time.
///
/// # Examples
///
/// ```
/// use dynamic_cuckoo_filter::bit_vec::BitVec;
///
/// let mut bv = BitVec::new(5);
///
/// bv.set(0, true);
/// bv.set(1, true);
/// bv.set(2, true);
/// assert_eq!(
///     bv.iter().collect::<Vec<bool>>(),
///     vec![true, true, true, false, false],
/// );
/// assert_eq!(bv.count_ones(), 3);
///
/// bv.set_all(false);
/// assert_eq!(bv.count_ones(), 0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BitVec {
    blocks: Vec<u8>,
    len: usize,
    one_count: usize,
}

const BLOCK_BIT_COUNT: usize = mem::size_of::<u8>() * 8;

impl BitVec {
    fn get_block_count(len: usize) -> usize {
        (len + BLOCK_BIT_COUNT - 1) / BLOCK_BIT_COUNT
    }

    /// Constructs a new `BitVec` with `len` bits, all set to `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::bit_vec::BitVec;
    ///
    /// let bv = BitVec::new(10);
    /// assert_eq!(bv.len(), 10);
    /// ```
    pub fn new(len: usize) -> Self {
        BitVec {
            blocks: vec![0; Self::get_block_count(len)],
            len,
            one_count: 0,
        }
    }

    /// Sets the value at index `index` to `bit`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize, bit: bool) {
        assert!(index < self.len);
        let block_index = index / BLOCK_BIT_COUNT;
        let mask = 1 << (index % BLOCK_BIT_COUNT);
        let prev = self.blocks[block_index] & mask != 0;
        if prev == bit {
            return;
        }
        if bit {
            self.blocks[block_index] |= mask;
            self.one_count += 1;
        } else {
            self.blocks[block_index] &= !mask;
            self.one_count -= 1;
        }
    }

    /// Returns the value at index `index`, or `None` if `index` is out of bounds.
    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        let block = self.blocks[index / BLOCK_BIT_COUNT];
        Some(block & (1 << (index % BLOCK_BIT_COUNT)) != 0)
    }

    /// Sets all values to `bit`.
    pub fn set_all(&mut self, bit: bool) {
        let fill = if bit { !0 } else { 0 };
        for block in &mut self.blocks {
            *block = fill;
        }
        if bit {
            let extra_bits = self.len % BLOCK_BIT_COUNT;
            if extra_bits > 0 {
                if let Some(last) = self.blocks.last_mut() {
                    *last = !0 >> (BLOCK_BIT_COUNT - extra_bits);
                }
            }
            self.one_count = self.len;
        } else {
            self.one_count = 0;
        }
    }

    /// Returns an iterator over the bits.
    pub fn iter(&self) -> BitVecIter<'_> {
        BitVecIter {
            bit_vec: self,
            range: 0..self.len,
        }
    }

    /// Returns the number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the `BitVec` holds no bits.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of bits set to `true`.
    pub fn count_ones(&self) -> usize {
        self.one_count
    }

    /// Returns the number of bits set to `false`.
    pub fn count_zeros(&self) -> usize {
        self.len - self.one_count
    }

    /// Returns the number of bytes used by the underlying blocks.
    pub fn size_in_bytes(&self) -> usize {
        self.blocks.len()
    }
}

/// An iterator over the bits of a `BitVec`.
pub struct BitVecIter<'a> {
    bit_vec: &'a BitVec,
    range: Range<usize>,
}

impl<'a> Iterator for BitVecIter<'a> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        self.range.next().and_then(|index| self.bit_vec.get(index))
    }
}

impl<'a> IntoIterator for &'a BitVec {
    type IntoIter = BitVecIter<'a>;
    type Item = bool;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::BitVec;

    #[test]
    fn test_new() {
        let bv = BitVec::new(10);
        assert_eq!(bv.len(), 10);
        assert!(!bv.is_empty());
        assert_eq!(bv.count_ones(), 0);
        assert_eq!(bv.count_zeros(), 10);
        assert_eq!(bv.size_in_bytes(), 2);
    }

    #[test]
    fn test_set_get() {
        let mut bv = BitVec::new(12);
        bv.set(0, true);
        bv.set(9, true);
        bv.set(9, true);
        assert_eq!(bv.get(0), Some(true));
        assert_eq!(bv.get(1), Some(false));
        assert_eq!(bv.get(9), Some(true));
        assert_eq!(bv.get(12), None);
        assert_eq!(bv.count_ones(), 2);

        bv.set(0, false);
        bv.set(0, false);
        assert_eq!(bv.get(0), Some(false));
        assert_eq!(bv.count_ones(), 1);
    }

    #[test]
    #[should_panic]
    fn test_set_out_of_bounds() {
        let mut bv = BitVec::new(4);
        bv.set(4, true);
    }

    #[test]
    fn test_set_all() {
        let mut bv = BitVec::new(11);
        bv.set_all(true);
        assert_eq!(bv.count_ones(), 11);
        assert!(bv.iter().all(|bit| bit));

        bv.set(10, false);
        assert_eq!(bv.count_ones(), 10);

        bv.set_all(false);
        assert_eq!(bv.count_ones(), 0);
        assert!(bv.iter().all(|bit| !bit));
    }

    #[test]
    fn test_iter() {
        let mut bv = BitVec::new(4);
        bv.set(1, true);
        bv.set(3, true);
        assert_eq!(
            (&bv).into_iter().collect::<Vec<bool>>(),
            vec![false, true, false, true],
        );
    }
}
