//! String-keyed open-addressing table with pluggable value ownership.
//!
//! [`Dict`] is the storage behind settings sections and the settings store.
//! Keys are owned strings; what happens to values on the way in and on the
//! way out is decided by a [`ValuePolicy`]. Every entry also carries a
//! *mark* bit recording whether it is authoritative for persistence.
//!
//! # Mark precedence
//!
//! [`Dict::replace`] only overwrites an existing entry when the incoming mark
//! is at least the stored one. An unmarked write (for instance a system-wide
//! default loaded from disk) therefore never clobbers a marked entry, while a
//! marked write always wins:
//!
//! ```
//! use horizon_lattice_registry::{Dict, StringValue};
//!
//! let mut dict: Dict<StringValue> = Dict::new();
//! dict.replace("theme", "dark", true);
//! dict.replace("theme", "light", false);
//! assert_eq!(dict.find("theme").map(String::as_str), Some("dark"));
//!
//! dict.replace("theme", "solarized", true);
//! assert_eq!(dict.find("theme").map(String::as_str), Some("solarized"));
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::hash::{try_alloc_slots, valid_size, Probe, MIN_SIZE};

/// Decides how values enter and leave a [`Dict`].
pub trait ValuePolicy {
    /// What callers hand to `insert`/`replace`.
    type Input: ?Sized;
    /// What the table keeps.
    type Stored;

    /// Produces the stored form of a newly inserted value.
    fn create(input: &Self::Input) -> Self::Stored;

    /// Disposes of a value leaving the table.
    fn delete(stored: Self::Stored) {
        drop(stored);
    }
}

/// Stores a clone of the caller's value.
#[derive(Debug)]
pub struct Cloned<T>(PhantomData<T>);

impl<T: Clone> ValuePolicy for Cloned<T> {
    type Input = T;
    type Stored = T;

    fn create(input: &T) -> T {
        input.clone()
    }
}

/// Stores an independently owned copy of a string.
#[derive(Debug)]
pub struct StringValue;

impl ValuePolicy for StringValue {
    type Input = str;
    type Stored = String;

    fn create(input: &str) -> String {
        input.to_owned()
    }
}

/// Hashes a key: `h = (h * 33) ^ byte`, kept to 31 bits.
pub fn hash_str(key: &str) -> u32 {
    key.bytes()
        .fold(0u32, |h, b| (h << 5).wrapping_add(h) ^ u32::from(b))
        & 0x7FFF_FFFF
}

struct Entry<S> {
    key: String,
    data: S,
    hash: u32,
    mark: bool,
}

enum Slot<S> {
    Empty,
    Tombstone,
    Occupied(Entry<S>),
}

impl<S> Slot<S> {
    fn entry(&self) -> Option<&Entry<S>> {
        match self {
            Slot::Occupied(entry) => Some(entry),
            _ => None,
        }
    }

    fn entry_mut(&mut self) -> Option<&mut Entry<S>> {
        match self {
            Slot::Occupied(entry) => Some(entry),
            _ => None,
        }
    }
}

/// A string-keyed hash table whose values are managed by `P`.
pub struct Dict<P: ValuePolicy> {
    slots: Vec<Slot<P::Stored>>,
    used: usize,
    free: usize,
    _policy: PhantomData<P>,
}

impl<P: ValuePolicy> Default for Dict<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ValuePolicy> Dict<P> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            slots: (0..MIN_SIZE).map(|_| Slot::Empty).collect(),
            used: 0,
            free: MIN_SIZE,
            _policy: PhantomData,
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

    /// Returns the number of slots.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Returns the value stored under `key`.
    pub fn find(&self, key: &str) -> Option<&P::Stored> {
        let pos = self.locate(key)?;
        self.data(pos)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn find_mut(&mut self, key: &str) -> Option<&mut P::Stored> {
        let pos = self.locate(key)?;
        self.data_mut(pos)
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.locate(key).is_some()
    }

    /// Returns the mark of the entry under `key`.
    pub fn is_marked(&self, key: &str) -> Option<bool> {
        let pos = self.locate(key)?;
        self.slots[pos].entry().map(|e| e.mark)
    }

    /// Creates an entry for `key` if it is absent.
    ///
    /// An existing entry is returned untouched, mark included. Returns `None`
    /// only if the table needed to grow and could not.
    pub fn insert(&mut self, key: &str, input: &P::Input, mark: bool) -> Option<&mut P::Stored> {
        let pos = match self.locate(key) {
            Some(pos) => pos,
            None => self.place(key, P::create(input), mark)?,
        };
        self.data_mut(pos)
    }

    /// Creates or overwrites the entry for `key`.
    ///
    /// An existing entry is overwritten only if `mark` is set or the existing
    /// entry is unmarked; otherwise it is kept as is. The old value is passed
    /// to [`ValuePolicy::delete`].
    pub fn replace(&mut self, key: &str, input: &P::Input, mark: bool) -> Option<&mut P::Stored> {
        let pos = match self.locate(key) {
            Some(pos) => {
                let entry = self.slots[pos].entry_mut()?;
                if mark || !entry.mark {
                    let old = std::mem::replace(&mut entry.data, P::create(input));
                    entry.mark = mark;
                    P::delete(old);
                }
                pos
            }
            None => self.place(key, P::create(input), mark)?,
        };
        self.data_mut(pos)
    }

    /// Removes the entry for `key`, returning whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(pos) = self.locate(key) else {
            return false;
        };
        if let Slot::Occupied(entry) = std::mem::replace(&mut self.slots[pos], Slot::Tombstone) {
            P::delete(entry.data);
        }
        self.used -= 1;
        if self.used < self.slots.len() / 4 && self.slots.len() > MIN_SIZE {
            self.resize(self.slots.len() / 2);
        }
        true
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        let old = std::mem::replace(&mut self.slots, (0..MIN_SIZE).map(|_| Slot::Empty).collect());
        Self::dispose(old);
        self.used = 0;
        self.free = MIN_SIZE;
    }

    /// Rehashes into at least `size` slots; false if allocation failed.
    pub fn resize(&mut self, size: usize) -> bool {
        let size = valid_size(size, self.used);
        let Some(mut slots) = try_alloc_slots(size, || Slot::Empty) else {
            return false;
        };
        for slot in std::mem::take(&mut self.slots) {
            if let Slot::Occupied(entry) = slot {
                if let Some(pos) = Probe::new(entry.hash, size).find(|&p| matches!(slots[p], Slot::Empty)) {
                    slots[pos] = Slot::Occupied(entry);
                }
            }
        }
        self.free = size - self.used;
        self.slots = slots;
        true
    }

    // ========================================================================
    // Positional access
    // ========================================================================

    /// Returns the position of the first live entry.
    pub fn first(&self) -> Option<usize> {
        (0..self.slots.len()).find(|&p| self.slots[p].entry().is_some())
    }

    /// Returns the position of the last live entry.
    pub fn last(&self) -> Option<usize> {
        (0..self.slots.len()).rev().find(|&p| self.slots[p].entry().is_some())
    }

    /// Returns the position of the next live entry after `pos`.
    pub fn next(&self, pos: usize) -> Option<usize> {
        (pos + 1..self.slots.len()).find(|&p| self.slots[p].entry().is_some())
    }

    /// Returns the position of the previous live entry before `pos`.
    pub fn prev(&self, pos: usize) -> Option<usize> {
        (0..pos.min(self.slots.len())).rev().find(|&p| self.slots[p].entry().is_some())
    }

    /// Returns the key at `pos`.
    pub fn key(&self, pos: usize) -> Option<&str> {
        self.slots.get(pos)?.entry().map(|e| e.key.as_str())
    }

    /// Returns the value at `pos`.
    pub fn data(&self, pos: usize) -> Option<&P::Stored> {
        self.slots.get(pos)?.entry().map(|e| &e.data)
    }

    /// Returns the value at `pos` mutably.
    pub fn data_mut(&mut self, pos: usize) -> Option<&mut P::Stored> {
        self.slots.get_mut(pos)?.entry_mut().map(|e| &mut e.data)
    }

    /// Returns the mark at `pos`.
    pub fn mark(&self, pos: usize) -> Option<bool> {
        self.slots.get(pos)?.entry().map(|e| e.mark)
    }

    /// Sets the mark at `pos`.
    pub fn set_mark(&mut self, pos: usize, mark: bool) {
        if let Some(entry) = self.slots.get_mut(pos).and_then(Slot::entry_mut) {
            entry.mark = mark;
        }
    }

    /// Iterates over `(key, value, mark)` in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &P::Stored, bool)> {
        self.slots
            .iter()
            .filter_map(Slot::entry)
            .map(|e| (e.key.as_str(), &e.data, e.mark))
    }

    /// Iterates mutably over `(key, value)` in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut P::Stored)> {
        self.slots
            .iter_mut()
            .filter_map(Slot::entry_mut)
            .map(|e| (e.key.as_str(), &mut e.data))
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn locate(&self, key: &str) -> Option<usize> {
        let hash = hash_str(key);
        for pos in Probe::new(hash, self.slots.len()) {
            match &self.slots[pos] {
                Slot::Empty => return None,
                Slot::Occupied(e) if e.hash == hash && e.key == key => return Some(pos),
                _ => {}
            }
        }
        None
    }

    fn place(&mut self, key: &str, data: P::Stored, mark: bool) -> Option<usize> {
        if self.free * 2 <= self.slots.len() {
            let target = if self.used * 2 < self.slots.len() {
                self.slots.len()
            } else {
                self.slots.len() * 2
            };
            if !self.resize(target) && self.free <= 1 {
                P::delete(data);
                return None;
            }
        }
        let hash = hash_str(key);
        let Some(pos) = Probe::new(hash, self.slots.len())
            .find(|&p| !matches!(self.slots[p], Slot::Occupied(_)))
        else {
            P::delete(data);
            return None;
        };
        if matches!(self.slots[pos], Slot::Empty) {
            self.free -= 1;
        }
        self.slots[pos] = Slot::Occupied(Entry {
            key: key.to_owned(),
            data,
            hash,
            mark,
        });
        self.used += 1;
        Some(pos)
    }

    fn dispose(slots: Vec<Slot<P::Stored>>) {
        for slot in slots {
            if let Slot::Occupied(entry) = slot {
                P::delete(entry.data);
            }
        }
    }
}

impl<P: ValuePolicy> Drop for Dict<P> {
    fn drop(&mut self) {
        Self::dispose(std::mem::take(&mut self.slots));
    }
}

impl<P: ValuePolicy> fmt::Debug for Dict<P>
where
    P::Stored: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v, _)| (k, v)))
            .finish()
    }
}
