//! Compute table: a direct-mapped memo of operation results.
//!
//! Each key hashes to exactly one slot and an insert simply overwrites the
//! occupant, so a lookup may miss even if the result was computed before.
//! Entries are disposable: the table may be cleared at any time without
//! affecting correctness, which is what resizing does.
//!
//! # Adaptive sizing
//!
//! The table counts recursive operator calls through [`ComputeTable::tick`].
//! Every `window` calls it compares the hit rate of the finished window with
//! the previous one and
//!
//! - doubles itself if the hit rate did not drop, or if it has fewer slots
//!   than `live_nodes * hit_rate` (up to `2^max_bits` slots);
//! - halves itself instead when live nodes exceed 7/8 of the node capacity,
//!   giving memory back to the node store.

use std::cell::Cell;

use log::debug;

use crate::reference::Ref;
use crate::types::Var;
use crate::utils::{bucket, hash3, hash4, MyHash};

/// Smallest table size the shrink policy goes down to.
const MIN_CACHE_BITS: u32 = 8;

/// Operation key. Each operator has its own tag, so operand tuples of
/// different operators never match each other.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpKey {
    And(Ref, Ref),
    Xor(Ref, Ref),
    Ite(Ref, Ref, Ref),
    Exist(Ref, Ref),
    AndExist(Ref, Ref, Ref),
    Restrict(Ref, Ref),
    Compose(Var, Ref, Ref),
}

impl MyHash for OpKey {
    fn hash(&self) -> u32 {
        match *self {
            OpKey::And(f, g) => hash3(1, f.raw(), g.raw()),
            OpKey::Xor(f, g) => hash3(2, f.raw(), g.raw()),
            OpKey::Ite(f, g, h) => hash4(3, f.raw(), g.raw(), h.raw()),
            OpKey::Exist(f, c) => hash3(4, f.raw(), c.raw()),
            OpKey::AndExist(f, g, c) => hash4(5, f.raw(), g.raw(), c.raw()),
            OpKey::Restrict(f, c) => hash3(6, f.raw(), c.raw()),
            OpKey::Compose(v, f, g) => hash4(7, v.id(), f.raw(), g.raw()),
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct Entry {
    key: OpKey,
    value: Ref,
}

pub struct ComputeTable {
    entries: Vec<Option<Entry>>,
    bits: u32,
    max_bits: u32,
    hits: Cell<u64>,
    misses: Cell<u64>,

    // Resize window state.
    window: u64,
    calls: u64,
    next_check: u64,
    lookups_at_start: u64,
    hits_at_start: u64,
    last_hit_rate: f64,
    resizes: u64,
}

impl ComputeTable {
    /// Create a table of `2^bits` slots that may grow up to `2^max_bits`.
    pub fn new(bits: u32, max_bits: u32, window: u64) -> Self {
        assert!(
            (1..=31).contains(&bits),
            "Cache bits should be in the range 1..=31, got {}",
            bits
        );
        assert!(window > 0, "Resize window must be positive");

        Self {
            entries: vec![None; 1 << bits],
            bits,
            max_bits: max_bits.clamp(bits, 31),
            hits: Cell::new(0),
            misses: Cell::new(0),
            window,
            calls: 0,
            next_check: window,
            lookups_at_start: 0,
            hits_at_start: 0,
            last_hit_rate: 0.0,
            resizes: 0,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    pub fn misses(&self) -> u64 {
        self.misses.get()
    }

    /// Number of times the table was reallocated.
    pub fn resizes(&self) -> u64 {
        self.resizes
    }

    /// Lifetime hit rate in `[0, 1]`.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits() + self.misses();
        if lookups == 0 {
            0.0
        } else {
            self.hits() as f64 / lookups as f64
        }
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    #[inline]
    fn index(&self, key: &OpKey) -> usize {
        bucket(key.hash(), self.bits)
    }

    /// Look up a result. Only an exact key match is a hit.
    #[inline]
    pub fn get(&self, key: &OpKey) -> Option<Ref> {
        match &self.entries[self.index(key)] {
            Some(entry) if entry.key == *key => {
                self.hits.set(self.hits.get() + 1);
                Some(entry.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    /// Store a result, evicting whatever occupied the slot.
    #[inline]
    pub fn insert(&mut self, key: OpKey, value: Ref) {
        let index = self.index(&key);
        self.entries[index] = Some(Entry { key, value });
    }

    /// Drop all entries. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.fill(None);
    }

    /// Drop all entries and reset statistics and the resize window.
    pub fn reset(&mut self) {
        self.clear();
        self.hits.set(0);
        self.misses.set(0);
        self.calls = 0;
        self.next_check = self.window;
        self.lookups_at_start = 0;
        self.hits_at_start = 0;
        self.last_hit_rate = 0.0;
    }

    fn reallocate(&mut self, bits: u32) {
        debug!(
            "Resizing compute table: {} -> {} slots (hit rate {:.3})",
            self.entries.len(),
            1usize << bits,
            self.hit_rate()
        );
        self.bits = bits;
        self.entries = vec![None; 1 << bits];
        self.resizes += 1;
    }

    /// Double the number of slots. Returns false at the size ceiling.
    pub fn grow(&mut self) -> bool {
        if self.bits >= self.max_bits {
            return false;
        }
        self.reallocate(self.bits + 1);
        true
    }

    /// Halve the number of slots. Returns false at the size floor.
    pub fn shrink(&mut self) -> bool {
        if self.bits <= MIN_CACHE_BITS {
            return false;
        }
        self.reallocate(self.bits - 1);
        true
    }

    /// Count one operator call and apply the resize policy at the end of a
    /// window.
    pub fn tick(&mut self, live_nodes: usize, node_capacity: usize) {
        self.calls += 1;
        if self.calls < self.next_check {
            return;
        }
        self.next_check = self.calls + self.window;

        let lookups = self.hits() + self.misses();
        let window_lookups = lookups - self.lookups_at_start;
        let window_hits = self.hits() - self.hits_at_start;
        self.lookups_at_start = lookups;
        self.hits_at_start = self.hits();
        if window_lookups == 0 {
            return;
        }
        let rate = window_hits as f64 / window_lookups as f64;

        if live_nodes > node_capacity - node_capacity / 8 {
            self.shrink();
        } else if rate >= self.last_hit_rate || (self.capacity() as f64) < live_nodes as f64 * rate {
            self.grow();
        }
        self.last_hit_rate = rate;
    }
}
