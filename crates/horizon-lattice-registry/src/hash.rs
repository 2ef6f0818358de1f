//! Open-addressing hash table with tombstones.
//!
//! [`HashTable`] maps arbitrary hashable keys to values using a single flat
//! slot array. Removed entries leave a tombstone behind so that probe
//! sequences running through them keep going; tombstones are discarded the
//! next time the table is rehashed.
//!
//! The table size is always a power of two. It grows when fewer than half of
//! the slots have never been used and shrinks when less than a quarter of the
//! slots hold live entries. Resizing builds a new slot array first and only
//! swaps it in once it is complete, so a failed allocation leaves the table
//! untouched.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_registry::HashTable;
//!
//! let mut table = HashTable::new();
//! table.insert("width", 800);
//! table.replace("width", 1024);
//! assert_eq!(table.find("width"), Some(&1024));
//!
//! table.remove("width");
//! assert_eq!(table.find("width"), None);
//! ```

use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Smallest slot count a table is ever given.
pub(crate) const MIN_SIZE: usize = 8;

/// The probe sequence used by all open-addressing tables in this crate.
///
/// Starting from the hash, each step computes `p = 5p + b + 1` and shifts the
/// perturbation `b` right by five bits. Once `b` reaches zero the masked
/// sequence is a full-period linear congruential walk, so every slot is
/// visited within `size` further steps.
#[derive(Debug, Clone)]
pub(crate) struct Probe {
    p: u32,
    perturb: u32,
    mask: usize,
    remaining: usize,
}

impl Probe {
    pub(crate) fn new(hash: u32, size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Self {
            p: hash,
            perturb: hash,
            mask: size - 1,
            // Seven perturbation rounds drain a 32-bit hash.
            remaining: size + 8,
        }
    }
}

impl Iterator for Probe {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let pos = self.p as usize & self.mask;
        self.p = (self.p << 2)
            .wrapping_add(self.p)
            .wrapping_add(self.perturb)
            .wrapping_add(1);
        self.perturb >>= 5;
        Some(pos)
    }
}

/// Allocates `size` slots produced by `empty`, or returns `None` if the
/// allocation cannot be satisfied.
pub(crate) fn try_alloc_slots<S>(size: usize, empty: impl Fn() -> S) -> Option<Vec<S>> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(size).ok()?;
    slots.extend((0..size).map(|_| empty()));
    Some(slots)
}

/// Rounds a requested table size to a valid one able to hold `used` entries.
pub(crate) fn valid_size(requested: usize, used: usize) -> usize {
    let mut size = requested.max(MIN_SIZE).next_power_of_two();
    while size <= used {
        size <<= 1;
    }
    size
}

#[derive(Debug, Clone)]
enum Slot<K, V> {
    Empty,
    Tombstone,
    Occupied(K, V),
}

/// An open-addressing hash table with tombstone deletion.
#[derive(Clone)]
pub struct HashTable<K, V> {
    slots: Vec<Slot<K, V>>,
    /// Number of live entries.
    used: usize,
    /// Number of never-used slots.
    free: usize,
}

impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> HashTable<K, V> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            slots: (0..MIN_SIZE).map(|_| Slot::Empty).collect(),
            used: 0,
            free: MIN_SIZE,
        }
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.used
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Returns the number of slots, always a power of two.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Removes every entry and returns the table to its minimum size.
    pub fn clear(&mut self) {
        self.slots = (0..MIN_SIZE).map(|_| Slot::Empty).collect();
        self.used = 0;
        self.free = MIN_SIZE;
    }

    /// Returns the position of the first live entry.
    pub fn first(&self) -> Option<usize> {
        self.next_from(0)
    }

    /// Returns the position of the last live entry.
    pub fn last(&self) -> Option<usize> {
        self.prev_from(self.slots.len())
    }

    /// Returns the position of the next live entry after `pos`.
    pub fn next(&self, pos: usize) -> Option<usize> {
        self.next_from(pos + 1)
    }

    /// Returns the position of the previous live entry before `pos`.
    pub fn prev(&self, pos: usize) -> Option<usize> {
        self.prev_from(pos.min(self.slots.len()))
    }

    /// Returns the key stored at `pos`, if that slot is live.
    pub fn key(&self, pos: usize) -> Option<&K> {
        match self.slots.get(pos) {
            Some(Slot::Occupied(key, _)) => Some(key),
            _ => None,
        }
    }

    /// Returns the value stored at `pos`, if that slot is live.
    pub fn value(&self, pos: usize) -> Option<&V> {
        match self.slots.get(pos) {
            Some(Slot::Occupied(_, value)) => Some(value),
            _ => None,
        }
    }

    /// Iterates over live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(key, value) => Some((key, value)),
            _ => None,
        })
    }

    fn next_from(&self, start: usize) -> Option<usize> {
        (start..self.slots.len()).find(|&pos| matches!(self.slots[pos], Slot::Occupied(..)))
    }

    fn prev_from(&self, end: usize) -> Option<usize> {
        (0..end).rev().find(|&pos| matches!(self.slots[pos], Slot::Occupied(..)))
    }
}

impl<K: Hash + Eq, V> HashTable<K, V> {
    /// Returns the value for `key`, if present.
    pub fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.locate(key).and_then(|pos| self.value(pos))
    }

    /// Returns a mutable reference to the value for `key`, if present.
    pub fn find_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.locate(key)?;
        match &mut self.slots[pos] {
            Slot::Occupied(_, value) => Some(value),
            _ => None,
        }
    }

    /// Returns true if `key` is present.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.locate(key).is_some()
    }

    /// Inserts `value` under `key` unless the key is already present.
    ///
    /// Returns the value now stored under `key`: the existing one if there was
    /// one, otherwise `value`. Returns `None` only if the table needed to grow
    /// and the allocation failed.
    pub fn insert(&mut self, key: K, value: V) -> Option<&mut V> {
        let pos = match self.locate(&key) {
            Some(pos) => pos,
            None => self.place(key, value)?,
        };
        match &mut self.slots[pos] {
            Slot::Occupied(_, value) => Some(value),
            _ => None,
        }
    }

    /// Stores `value` under `key`, overwriting any existing value.
    ///
    /// Returns `None` only if the table needed to grow and the allocation
    /// failed.
    pub fn replace(&mut self, key: K, value: V) -> Option<&mut V> {
        let pos = match self.locate(&key) {
            Some(pos) => {
                self.slots[pos] = Slot::Occupied(key, value);
                pos
            }
            None => self.place(key, value)?,
        };
        match &mut self.slots[pos] {
            Slot::Occupied(_, value) => Some(value),
            _ => None,
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.locate(key)?;
        let removed = std::mem::replace(&mut self.slots[pos], Slot::Tombstone);
        self.used -= 1;
        if self.used < self.slots.len() / 4 && self.slots.len() > MIN_SIZE {
            self.resize(self.slots.len() / 2);
        }
        match removed {
            Slot::Occupied(_, value) => Some(value),
            _ => None,
        }
    }

    /// Rehashes into a table of at least `size` slots.
    ///
    /// The size is rounded up to a power of two large enough to keep an empty
    /// slot. Returns false, leaving the table unchanged, if the new slot array
    /// cannot be allocated.
    pub fn resize(&mut self, size: usize) -> bool {
        let size = valid_size(size, self.used);
        let Some(mut slots) = try_alloc_slots(size, || Slot::Empty) else {
            return false;
        };
        for slot in std::mem::take(&mut self.slots) {
            if let Slot::Occupied(key, value) = slot {
                let pos = Probe::new(hash_key(&key), size)
                    .find(|&pos| matches!(slots[pos], Slot::Empty))
                    .unwrap_or_default();
                slots[pos] = Slot::Occupied(key, value);
            }
        }
        self.free = size - self.used;
        self.slots = slots;
        true
    }

    fn locate<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        for pos in Probe::new(hash_key(key), self.slots.len()) {
            match &self.slots[pos] {
                Slot::Empty => return None,
                Slot::Occupied(k, _) if k.borrow() == key => return Some(pos),
                _ => {}
            }
        }
        None
    }

    /// Stores a key known to be absent, growing first if needed.
    fn place(&mut self, key: K, value: V) -> Option<usize> {
        if self.free * 2 <= self.slots.len() {
            // Mostly tombstones: a same-size rehash reclaims them.
            let target = if self.used * 2 < self.slots.len() {
                self.slots.len()
            } else {
                self.slots.len() * 2
            };
            if !self.resize(target) && self.free <= 1 {
                return None;
            }
        }
        let pos = Probe::new(hash_key(&key), self.slots.len())
            .find(|&pos| !matches!(self.slots[pos], Slot::Occupied(..)))?;
        if matches!(self.slots[pos], Slot::Empty) {
            self.free -= 1;
        }
        self.slots[pos] = Slot::Occupied(key, value);
        self.used += 1;
        Some(pos)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for HashTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

fn hash_key<Q: Hash + ?Sized>(key: &Q) -> u32 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let h = hasher.finish();
    (h ^ (h >> 32)) as u32
}
