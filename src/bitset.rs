//! Compact bitset over taxon indices.
//!
//! Bipartitions are represented as bitsets over a shared taxon namespace:
//! bit `i` set means taxon `i` is on this side of the split. One `u64` word
//! holds 64 taxa, so trees of any size fit in a short `Vec<u64>`.

/// A set of taxon indices, packed 64 per word.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bitset(pub Vec<u64>);

impl Bitset {
    /// All-zero bitset with room for `words * 64` taxa.
    pub fn zeros(words: usize) -> Self {
        Bitset(vec![0u64; words])
    }

    #[inline]
    pub fn set(&mut self, idx: usize) {
        let word = idx >> 6;
        let bit = idx & 63;
        self.0[word] |= 1u64 << bit;
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        let word = idx >> 6;
        let bit = idx & 63;
        (self.0[word] >> bit) & 1 == 1
    }

    /// `self ∪ other`, in place. Both bitsets must have the same word count.
    #[inline]
    pub fn or_assign(&mut self, other: &Bitset) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= *b;
        }
    }

    #[inline]
    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True if `self ∩ other` is non-empty.
    #[inline]
    pub fn intersects(&self, other: &Bitset) -> bool {
        self.0.iter().zip(&other.0).any(|(a, b)| a & b != 0)
    }

    /// Index of the lowest set bit, if any.
    pub fn lowest_set(&self) -> Option<usize> {
        for (w, word) in self.0.iter().enumerate() {
            if *word != 0 {
                return Some((w << 6) + word.trailing_zeros() as usize);
            }
        }
        None
    }

    /// Complement of `self` restricted to `mask`: `mask \ self`.
    ///
    /// Used to flip a bipartition to its other side within one tree's own
    /// leaf set, so that taxa outside the tree never appear in either side.
    pub fn complement_within(&self, mask: &Bitset) -> Bitset {
        Bitset(self.0.iter().zip(&mask.0).map(|(a, m)| !a & m).collect())
    }
}
