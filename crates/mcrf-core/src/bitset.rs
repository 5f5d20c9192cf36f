//! Fixed-size bit set recording which (customer, depot) or (edge, depot)
//! combinations a column selects.

use std::fmt::Display;

const BITS_IN_BLOCK: usize = u64::BITS as usize;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MembershipBits {
    blocks: Vec<u64>,
    length: usize,
}

impl MembershipBits {
    pub fn new(length: usize) -> Self {
        let block_count = length.div_ceil(BITS_IN_BLOCK);
        Self { blocks: vec![0; block_count], length }
    }

    pub fn set(&mut self, index: usize) {
        assert!(index < self.length, "bit {index} out of range {}", self.length);
        self.blocks[index / BITS_IN_BLOCK] |= 1 << (index % BITS_IN_BLOCK);
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.length && (self.blocks[index / BITS_IN_BLOCK] >> (index % BITS_IN_BLOCK)) & 1 != 0
    }

    /// Indices of all set bits in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().enumerate().flat_map(|(block_index, &block)| {
            let mut rest = block;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(block_index * BITS_IN_BLOCK + bit)
            })
        })
    }

    pub fn count_ones(&self) -> usize {
        self.blocks.iter().map(|block| block.count_ones() as usize).sum()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl Display for MembershipBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for i in 0..self.length {
            write!(f, "{}", if self.contains(i) { 1 } else { 0 })?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_test_across_blocks() {
        let mut bits = MembershipBits::new(130);
        bits.set(0);
        bits.set(63);
        bits.set(64);
        bits.set(129);

        assert!(bits.contains(0));
        assert!(bits.contains(63));
        assert!(bits.contains(64));
        assert!(bits.contains(129));
        assert!(!bits.contains(1));
        assert!(!bits.contains(500));
        assert_eq!(bits.count_ones(), 4);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![0, 63, 64, 129]);
    }

    #[test]
    fn equal_sets_compare_equal() {
        let mut a = MembershipBits::new(10);
        let mut b = MembershipBits::new(10);
        a.set(3);
        b.set(3);
        assert_eq!(a, b);
        b.set(4);
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "[0001000000]");
    }

    #[test]
    #[should_panic]
    fn setting_out_of_range_panics() {
        MembershipBits::new(4).set(4);
    }
}
