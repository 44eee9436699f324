//! Fixed-length list of bit arrays.

use std::mem;

/// A fixed-length list of unsigned values, each `bit_count` bits wide, packed contiguously into a
/// `Vec<u64>`. Values may straddle two blocks.
///
/// # Examples
///
/// ```
/// use dynamic_cuckoo_filter::bit_array_vec::BitArrayVec;
///
/// let mut bav = BitArrayVec::new(12, 4);
///
/// bav.set(0, 0xABC);
/// bav.set(3, 0xFFF);
/// assert_eq!(bav.iter().collect::<Vec<u64>>(), vec![0xABC, 0, 0, 0xFFF]);
///
/// // bits above `bit_count` are dropped
/// bav.set(1, 0x1234);
/// assert_eq!(bav.get(1), 0x234);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BitArrayVec {
    blocks: Vec<u64>,
    bit_count: usize,
    len: usize,
}

const BLOCK_BIT_COUNT: usize = mem::size_of::<u64>() * 8;

impl BitArrayVec {
    fn get_block_count(bit_count: usize, len: usize) -> usize {
        (bit_count * len + BLOCK_BIT_COUNT - 1) / BLOCK_BIT_COUNT
    }

    #[inline]
    fn mask(&self) -> u64 {
        if self.bit_count == BLOCK_BIT_COUNT {
            !0
        } else {
            (1 << self.bit_count) - 1
        }
    }

    /// Constructs a new `BitArrayVec` holding `len` zeroed values of `bit_count` bits each.
    ///
    /// # Panics
    ///
    /// Panics if `bit_count` is zero or larger than 64.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_cuckoo_filter::bit_array_vec::BitArrayVec;
    ///
    /// let bav = BitArrayVec::new(5, 8);
    /// assert_eq!(bav.len(), 8);
    /// assert_eq!(bav.bit_count(), 5);
    /// ```
    pub fn new(bit_count: usize, len: usize) -> Self {
        assert!(bit_count > 0 && bit_count <= BLOCK_BIT_COUNT);
        BitArrayVec {
            blocks: vec![0; Self::get_block_count(bit_count, len)],
            bit_count,
            len,
        }
    }

    /// Sets the value at index `index` to the low `bit_count` bits of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: u64) {
        assert!(index < self.len);
        let mask = self.mask();
        let value = value & mask;
        let bit_offset = index * self.bit_count;
        let block_index = bit_offset / BLOCK_BIT_COUNT;
        let shift = bit_offset % BLOCK_BIT_COUNT;

        self.blocks[block_index] &= !(mask << shift);
        self.blocks[block_index] |= value << shift;

        let written_bits = BLOCK_BIT_COUNT - shift;
        if written_bits < self.bit_count {
            let next = block_index + 1;
            self.blocks[next] &= !(mask >> written_bits);
            self.blocks[next] |= value >> written_bits;
        }
    }

    /// Returns the value at index `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn get(&self, index: usize) -> u64 {
        assert!(index < self.len);
        let bit_offset = index * self.bit_count;
        let block_index = bit_offset / BLOCK_BIT_COUNT;
        let shift = bit_offset % BLOCK_BIT_COUNT;

        let mut value = self.blocks[block_index] >> shift;
        let read_bits = BLOCK_BIT_COUNT - shift;
        if read_bits < self.bit_count {
            value |= self.blocks[block_index + 1] << read_bits;
        }
        value & self.mask()
    }

    /// Zeroes every value.
    pub fn clear(&mut self) {
        for block in &mut self.blocks {
            *block = 0;
        }
    }

    /// Returns an iterator over the values.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.len).map(move |index| self.get(index))
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the `BitArrayVec` holds no values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the width of each value in bits.
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }
}

#[cfg(test)]
mod tests {
    use super::BitArrayVec;

    fn check_bit_count(bit_count: usize) {
        let len = 67;
        let max = if bit_count == 64 {
            !0
        } else {
            (1u64 << bit_count) - 1
        };
        let value = |i: usize| (i as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15) & max;
        let mut bav = BitArrayVec::new(bit_count, len);
        assert_eq!(bav.len(), len);

        for i in 0..len {
            bav.set(i, value(i));
        }
        for i in 0..len {
            assert_eq!(bav.get(i), value(i));
        }

        // overwriting one value leaves its neighbours intact
        bav.set(10, 0);
        assert_eq!(bav.get(9), value(9));
        assert_eq!(bav.get(10), 0);
        assert_eq!(bav.get(11), value(11));

        bav.clear();
        assert!(bav.iter().all(|value| value == 0));
    }

    #[test]
    fn test_bit_count_5() {
        check_bit_count(5);
    }

    #[test]
    fn test_bit_count_8() {
        check_bit_count(8);
    }

    #[test]
    fn test_bit_count_13() {
        check_bit_count(13);
    }

    #[test]
    fn test_bit_count_21() {
        check_bit_count(21);
    }

    #[test]
    fn test_bit_count_32() {
        check_bit_count(32);
    }

    #[test]
    fn test_bit_count_64() {
        check_bit_count(64);
    }

    #[test]
    fn test_truncates_value() {
        let mut bav = BitArrayVec::new(4, 2);
        bav.set(0, 0xFF);
        assert_eq!(bav.get(0), 0xF);
        assert_eq!(bav.get(1), 0);
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_bounds() {
        let bav = BitArrayVec::new(8, 2);
        bav.get(2);
    }
}
