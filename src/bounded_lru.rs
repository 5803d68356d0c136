//! a [BoundedLru] is an Lru cache bounded both by a number of entries and by the total byte estimate of its values.
//!
//! This is implemented as a vec-backed linked list where the items are allocated on the heap behind `Arc`, plus an
//! auxiliary hash-based index.  Head of the list is the most recently touched entry, tail is the next to be evicted.
//!
//! The newest entry is never evicted by its own insertion: if it alone is larger than the byte limit, everything else
//! goes and it is kept by itself.
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use ahash::RandomState;

struct OccupiedEntry<K, V> {
    key: Arc<K>,
    item: Arc<V>,
    prev: Option<usize>,
    next: Option<usize>,
    size_bytes: u64,
}

struct EmptyEntry {
    next_empty: Option<usize>,
}

enum Slot<K, V> {
    /// This slot is empty, possibly with a pointer at the next empty slot.
    Empty(EmptyEntry),
    /// This slot is occupied, and doubly linked to the previous and next entry.
    Occupied(OccupiedEntry<K, V>),
}

impl<K, V> Slot<K, V> {
    fn as_occupied_mut(&mut self) -> &mut OccupiedEntry<K, V> {
        match self {
            Self::Occupied(ref mut x) => x,
            _ => panic!("Entry should be occupied"),
        }
    }

    fn as_occupied(&self) -> &OccupiedEntry<K, V> {
        match self {
            Self::Occupied(ref x) => x,
            _ => panic!("Entry should be occupied"),
        }
    }

    fn as_empty_mut(&mut self) -> &mut EmptyEntry {
        match self {
            Slot::Empty(ref mut x) => x,
            _ => panic!("Entry should be empty"),
        }
    }
}

/// Read-only snapshot of a cache's occupancy.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub count: usize,
    pub max_entries: usize,
    pub bytes_used: u64,
    pub max_bytes: u64,
}

pub struct BoundedLru<K: Hash + Eq, V> {
    entries: Vec<Slot<K, V>>,
    /// Points at the slot of the key.
    index: HashMap<Arc<K>, usize, RandomState>,
    max_entries: usize,
    max_bytes: u64,
    entries_head: Option<usize>,
    entries_tail: Option<usize>,
    empty_head: Option<usize>,
    /// Sum of the sizes of the items in the cache.
    total_bytes: u64,
}

impl<K: Hash + Eq + Debug, V> BoundedLru<K, V> {
    /// A limit of zero entries is raised to one, since the newest entry is always kept.
    pub fn new(max_entries: usize, max_bytes: u64) -> BoundedLru<K, V> {
        BoundedLru {
            entries: Default::default(),
            index: Default::default(),
            max_entries: max_entries.max(1),
            max_bytes,
            entries_head: None,
            entries_tail: None,
            empty_head: None,
            total_bytes: 0,
        }
    }

    /// Entirely unlink an occupied index from the list.
    fn unlink_index(&mut self, index: usize) {
        // Easiest to handle the tail first.
        if Some(index) == self.entries_tail {
            self.entries_tail = self.entries[index].as_occupied().prev;
        }

        if Some(index) == self.entries_head {
            self.entries_head = self.entries[index].as_occupied_mut().next;
            if let Some(n) = self.entries_head {
                self.entries[n].as_occupied_mut().prev = None;
            }

            return;
        }

        let old_prev = self.entries[index]
            .as_occupied_mut()
            .prev
            .expect("Isn't the head");
        let old_next = self.entries[index].as_occupied_mut().next;
        self.entries[old_prev].as_occupied_mut().next = old_next;
        if let Some(n) = old_next {
            self.entries[n].as_occupied_mut().prev = Some(old_prev);
        }
    }

    /// Given the index of an occupied entry, make it the most recent item.
    fn make_most_recent(&mut self, index: usize) {
        self.unlink_index(index);
        let entry = self.entries[index].as_occupied_mut();
        entry.prev = None;
        entry.next = self.entries_head;
        if let Some(i) = self.entries_head {
            self.entries[i].as_occupied_mut().prev = Some(index);
        }
        self.entries_head = Some(index);

        // If this is the only entry, then unlinking it broke the tail.
        if self.entries_tail.is_none() {
            self.entries_tail = Some(index);
        }
    }

    /// Look up `key`, marking it as the most recently used entry on a hit.
    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        let ind = *self.index.get(key)?;
        self.make_most_recent(ind);
        Some(self.entries[ind].as_occupied().item.clone())
    }

    /// Look up `key` without touching its recency.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        let ind = *self.index.get(key)?;
        Some(self.entries[ind].as_occupied().item.clone())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Make a specific index of the map become empty, returning what was there.
    fn become_empty(&mut self, index: usize) -> (Arc<K>, Arc<V>) {
        self.unlink_index(index);
        let mut old = Slot::Empty(EmptyEntry {
            next_empty: self.empty_head,
        });
        std::mem::swap(&mut old, &mut self.entries[index]);
        self.empty_head = Some(index);
        match old {
            Slot::Occupied(OccupiedEntry {
                key,
                item,
                size_bytes,
                ..
            }) => {
                self.index.remove(&key);
                self.total_bytes -= size_bytes;
                (key, item)
            }
            _ => panic!("Should have been occupied"),
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<Arc<V>> {
        let ind = *self.index.get(key)?;
        Some(self.become_empty(ind).1)
    }

    /// Find an available empty index, or make one if necessary.
    fn find_empty(&mut self) -> usize {
        if let Some(e) = self.empty_head {
            self.empty_head = self.entries[e].as_empty_mut().next_empty;
            return e;
        }

        self.entries.push(Slot::Empty(EmptyEntry { next_empty: None }));
        self.entries.len() - 1
    }

    /// Add an entry to the cache.  Return the old value if this key was already present.
    pub fn insert(&mut self, key: K, value: V, size_bytes: u64) -> Option<Arc<V>> {
        self.insert_arc(key, Arc::new(value), size_bytes)
    }

    /// Like [BoundedLru::insert], for a value which is already shared.
    pub fn insert_arc(&mut self, key: K, value: Arc<V>, size_bytes: u64) -> Option<Arc<V>> {
        // Removing first subtracts the old size, so a replacement is never double counted.
        let ret = self.remove(&key);
        let key_arc = Arc::new(key);
        let ind = self.find_empty();
        let old_head = self.entries_head;

        self.entries[ind] = Slot::Occupied(OccupiedEntry {
            key: key_arc.clone(),
            item: value,
            prev: None,
            next: old_head,
            size_bytes,
        });
        self.entries_head = Some(ind);
        self.index.insert(key_arc, ind);
        self.total_bytes += size_bytes;

        if let Some(h) = old_head {
            self.entries[h].as_occupied_mut().prev = Some(ind);
        }

        // If there's no tail this was the first insert and we need one.
        if self.entries_tail.is_none() {
            self.entries_tail = Some(ind);
        }

        self.maybe_evict();
        ret
    }

    fn over_budget(&self) -> bool {
        self.index.len() > self.max_entries || self.total_bytes > self.max_bytes
    }

    /// Evict from the tail until both limits hold, never touching the head.
    fn maybe_evict(&mut self) {
        while self.over_budget() {
            let tail = match self.entries_tail {
                Some(t) if Some(t) != self.entries_head => t,
                _ => break,
            };

            let (key, _) = self.become_empty(tail);
            log::debug!(
                "evicted {:?} ({} entries, {} bytes remain)",
                key,
                self.index.len(),
                self.total_bytes
            );
        }
    }

    /// Drop every entry and reset the byte total.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.entries_head = None;
        self.entries_tail = None;
        self.empty_head = None;
        self.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            count: self.index.len(),
            max_entries: self.max_entries,
            bytes_used: self.total_bytes,
            max_bytes: self.max_bytes,
        }
    }

    /// Iterator visiting entries in most-recently-used order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        let mut ind = self.entries_head;
        std::iter::from_fn(move || {
            let next = ind?;
            let ret = self.entries[next].as_occupied();
            ind = ret.next;
            Some((&*ret.key, &*ret.item))
        })
    }
}
