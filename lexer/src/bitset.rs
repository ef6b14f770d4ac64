use std::fmt::{self, Debug};

/// Growable bitset over small non-negative indices (alternative numbers,
/// rule indices). Grows on `set`, never shrinks.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitSet {
    words: Vec<u64>,
}

impl BitSet {
    pub fn new() -> Self {
        BitSet { words: vec![] }
    }

    pub fn set(&mut self, idx: usize, val: bool) {
        let word = idx / 64;
        if word >= self.words.len() {
            if !val {
                return;
            }
            self.words.resize(word + 1, 0);
        }
        let mask = 1u64 << (idx % 64);
        if val {
            self.words[word] |= mask;
        } else {
            self.words[word] &= !mask;
        }
        // trailing zero words would break Eq/Hash
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }

    pub fn get(&self, idx: usize) -> bool {
        let word = idx / 64;
        word < self.words.len() && self.words[word] & (1u64 << (idx % 64)) != 0
    }

    pub fn is_zero(&self) -> bool {
        self.words.is_empty()
    }

    pub fn num_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn min_set(&self) -> Option<usize> {
        for (i, w) in self.words.iter().enumerate() {
            if *w != 0 {
                return Some(i * 64 + w.trailing_zeros() as usize);
            }
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, w)| {
            (0..64).filter_map(move |b| {
                if w & (1u64 << b) != 0 {
                    Some(i * 64 + b)
                } else {
                    None
                }
            })
        })
    }
}

impl Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (n, idx) in self.iter().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", idx)?;
        }
        write!(f, "}}")
    }
}
