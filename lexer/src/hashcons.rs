use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Content-keyed interner. Each distinct value is stored once and addressed
/// by a dense `u32` handle; identity is the value's `Hash + Eq`, required at
/// compile time rather than checked at call sites. Handles are stable for
/// the interner's lifetime (append-only, no eviction).
#[derive(Clone)]
pub struct Interner<T: Hash + Eq + Clone> {
    items: Vec<T>,
    index: FxHashMap<T, u32>,
}

impl<T: Hash + Eq + Clone> Interner<T> {
    pub fn new() -> Self {
        Interner {
            items: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Handle for `item`, allocating one on first sight.
    pub fn intern(&mut self, item: T) -> u32 {
        if let Some(&id) = self.index.get(&item) {
            return id;
        }
        let id = self.items.len() as u32;
        self.items.push(item.clone());
        self.index.insert(item, id);
        id
    }

    /// Handle for `item` if it was interned before, without allocating.
    pub fn lookup(&self, item: &T) -> Option<u32> {
        self.index.get(item).copied()
    }

    pub fn get(&self, id: u32) -> &T {
        &self.items[id as usize]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Hash + Eq + Clone> Default for Interner<T> {
    fn default() -> Self {
        Self::new()
    }
}
