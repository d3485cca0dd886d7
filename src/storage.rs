//! Node store: a growable arena of nodes addressed by index.
//!
//! Nodes live in fixed-size slabs of `2^slab_bits` entries. Growing the store
//! appends a new slab, so existing nodes are never moved or copied and an
//! address stays valid for the lifetime of the store. Address 0 always holds
//! the terminal node.
//!
//! ```text
//! address = slab_index << slab_bits | offset
//!
//! slabs[0]: [ ⊤ | n1 | n2 | ... ]
//! slabs[1]: [ ... ]
//! ```
//!
//! There is no deletion: nodes are owned by the store until it is cleared.

use std::ops::{Index, IndexMut};

use crate::error::{AllocResult, OutOfMemory};
use crate::node::Node;
use crate::reference::MAX_ADDRESS;

pub struct NodeStore {
    slabs: Vec<Box<[Node]>>,
    slab_bits: u32,
    len: usize,
    capacity: usize,
}

impl NodeStore {
    /// Create a store with slabs of `2^slab_bits` nodes, holding at most
    /// `capacity` nodes (the terminal included).
    pub fn new(slab_bits: u32, capacity: usize) -> Self {
        assert!(
            (1..=24).contains(&slab_bits),
            "Slab bits should be in the range 1..=24, got {}",
            slab_bits
        );
        assert!(capacity >= 1, "Node capacity must leave room for the terminal");

        let mut store = Self {
            slabs: Vec::new(),
            slab_bits,
            len: 0,
            capacity: capacity.min(MAX_ADDRESS as usize + 1),
        };
        store.push(Node::terminal());
        store
    }

    /// Number of nodes in the store, the terminal included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// A store always holds at least the terminal.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Maximum number of nodes the store may hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of allocated slots across all slabs.
    pub fn allocated(&self) -> usize {
        self.slabs.len() << self.slab_bits
    }

    #[inline]
    fn locate(&self, address: u32) -> (usize, usize) {
        let address = address as usize;
        let mask = (1 << self.slab_bits) - 1;
        (address >> self.slab_bits, address & mask)
    }

    /// Append a node without the capacity check.
    pub(crate) fn push(&mut self, node: Node) -> u32 {
        assert!(self.len <= MAX_ADDRESS as usize, "Node address space exhausted");

        let address = self.len as u32;
        let (slab, offset) = self.locate(address);
        if slab == self.slabs.len() {
            log::debug!(
                "Node store: allocating slab #{} ({} nodes)",
                slab,
                1usize << self.slab_bits
            );
            let fresh = vec![Node::default(); 1 << self.slab_bits];
            self.slabs.push(fresh.into_boxed_slice());
        }
        self.slabs[slab][offset] = node;
        self.len += 1;
        address
    }

    /// Allocate the next free address and store `node` there.
    ///
    /// Fails with [`OutOfMemory`] when the store is at capacity; the store is
    /// left unchanged in that case.
    pub fn alloc(&mut self, node: Node) -> AllocResult<u32> {
        if self.len >= self.capacity {
            log::warn!("Node store is full ({} nodes)", self.capacity);
            return Err(OutOfMemory);
        }
        Ok(self.push(node))
    }

    /// Drop every node except the terminal.
    pub fn clear(&mut self) {
        self.slabs.truncate(1);
        self.len = 0;
        self.push(Node::terminal());
    }

    /// Iterate over all addresses in allocation order, the terminal first.
    pub fn addresses(&self) -> impl Iterator<Item = u32> {
        0..self.len as u32
    }
}

impl Index<u32> for NodeStore {
    type Output = Node;

    #[inline]
    fn index(&self, address: u32) -> &Self::Output {
        debug_assert!((address as usize) < self.len, "Address {} is not allocated", address);
        let (slab, offset) = self.locate(address);
        &self.slabs[slab][offset]
    }
}

impl IndexMut<u32> for NodeStore {
    #[inline]
    fn index_mut(&mut self, address: u32) -> &mut Self::Output {
        debug_assert!((address as usize) < self.len, "Address {} is not allocated", address);
        let (slab, offset) = self.locate(address);
        &mut self.slabs[slab][offset]
    }
}
