//! Per-variable subtable of the unique table, with intrusive hashing.
//!
//! Each subtable is an array of buckets holding the address of the first node
//! in a collision chain. Chains are threaded through the `Node.next` field, so
//! the nodes themselves form the linked list:
//!
//! ```text
//! Subtable for x3:
//! ┌─────────────────────────────────────────┐
//! │ buckets: [u32; 2^bits]                  │
//! │   [0] ─────► @5 ──► @12 ──► ∅           │
//! │   [1] ─────► ∅                          │
//! │   [2] ─────► @3 ──► ∅                   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! New nodes are prepended to their chain. When the number of nodes exceeds
//! four times the bucket count, the bucket array is doubled and every chain of
//! this variable is rebuilt.

use crate::node::Node;
use crate::reference::Ref;
use crate::storage::NodeStore;
use crate::types::Var;
use crate::utils::{bucket, hash3};

/// Average chain length that triggers a rehash.
const MAX_LOAD: usize = 4;

#[derive(Debug, Clone)]
pub struct Subtable {
    /// The variable of every node in this subtable.
    pub variable: Var,
    buckets: Vec<u32>,
    bits: u32,
    count: usize,
}

impl Subtable {
    pub fn new(variable: Var, bits: u32) -> Self {
        assert!(
            (1..=30).contains(&bits),
            "Subtable bits should be in the range 1..=30, got {}",
            bits
        );
        Self {
            variable,
            buckets: vec![Node::NO_NEXT; 1 << bits],
            bits,
            count: 0,
        }
    }

    #[inline]
    fn bucket_index(&self, low: Ref, high: Ref) -> usize {
        bucket(hash3(self.variable.id(), high.raw(), low.raw()), self.bits)
    }

    /// Look up the address of the node `(variable, low, high)`.
    pub fn find(&self, low: Ref, high: Ref, nodes: &NodeStore) -> Option<u32> {
        let mut current = self.buckets[self.bucket_index(low, high)];
        while current != Node::NO_NEXT {
            let node = &nodes[current];
            if node.low == low && node.high == high {
                return Some(current);
            }
            current = node.next;
        }
        None
    }

    /// Prepend the node at `address` to its collision chain.
    pub fn insert(&mut self, address: u32, nodes: &mut NodeStore) {
        let node = &nodes[address];
        debug_assert_eq!(node.variable, self.variable);
        let i = self.bucket_index(node.low, node.high);
        nodes[address].next = self.buckets[i];
        self.buckets[i] = address;
        self.count += 1;
    }

    /// Insert, doubling the bucket array first if the load is too high.
    pub fn insert_with_resize(&mut self, address: u32, nodes: &mut NodeStore) {
        if self.should_resize() {
            self.resize(nodes);
        }
        self.insert(address, nodes);
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn should_resize(&self) -> bool {
        self.count > self.buckets.len() * MAX_LOAD
    }

    /// Addresses of all nodes in this subtable.
    pub fn addresses(&self, nodes: &NodeStore) -> Vec<u32> {
        let mut result = Vec::with_capacity(self.count);
        for &head in &self.buckets {
            let mut current = head;
            while current != Node::NO_NEXT {
                result.push(current);
                current = nodes[current].next;
            }
        }
        result
    }

    /// Double the bucket count and rehash all nodes.
    pub fn resize(&mut self, nodes: &mut NodeStore) {
        log::debug!(
            "Resizing subtable for {}: {} -> {} buckets ({} nodes)",
            self.variable,
            self.buckets.len(),
            self.buckets.len() * 2,
            self.count
        );

        let addresses = self.addresses(nodes);
        self.bits += 1;
        self.buckets = vec![Node::NO_NEXT; 1 << self.bits];
        self.count = 0;
        for address in addresses {
            self.insert(address, nodes);
        }
    }

    /// Forget all chains. The nodes themselves are left in the store.
    pub fn clear(&mut self) {
        self.buckets.fill(Node::NO_NEXT);
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn make_store(n: u32) -> (NodeStore, Vec<u32>) {
        // Distinct nodes for x1: low = ~@k, high = ONE
        let mut nodes = NodeStore::new(4, 1 << 16);
        let mut addresses = Vec::new();
        for k in 0..n {
            let low = Ref::new(k, true);
            let a = nodes.alloc(Node::new(Var::new(1), low, Ref::ONE)).unwrap();
            addresses.push(a);
        }
        (nodes, addresses)
    }

    #[test]
    fn test_subtable_basic() {
        let (mut nodes, addresses) = make_store(1);
        let mut st = Subtable::new(Var::new(1), 4);
        let node = nodes[addresses[0]];

        assert!(st.find(node.low, node.high, &nodes).is_none());
        st.insert(addresses[0], &mut nodes);
        assert_eq!(st.find(node.low, node.high, &nodes), Some(addresses[0]));
        assert_eq!(st.len(), 1);
    }

    #[test]
    fn test_subtable_collision_chain() {
        // Only 2 buckets: chains are long.
        let (mut nodes, addresses) = make_store(10);
        let mut st = Subtable::new(Var::new(1), 1);
        for &a in &addresses {
            st.insert(a, &mut nodes);
        }
        assert_eq!(st.len(), 10);
        for &a in &addresses {
            let node = nodes[a];
            assert_eq!(st.find(node.low, node.high, &nodes), Some(a));
        }
        assert!(st.find(Ref::ONE, Ref::ONE, &nodes).is_none());
    }

    #[test]
    fn test_subtable_resize() {
        let (mut nodes, addresses) = make_store(100);
        let mut st = Subtable::new(Var::new(1), 2);
        for &a in &addresses {
            st.insert_with_resize(a, &mut nodes);
        }
        assert_eq!(st.len(), 100);
        assert!(st.num_buckets() >= 100 / MAX_LOAD);
        assert!(!st.should_resize());

        let mut found = st.addresses(&nodes);
        found.sort();
        assert_eq!(found, addresses);
        for &a in &addresses {
            let node = nodes[a];
            assert_eq!(st.find(node.low, node.high, &nodes), Some(a));
        }
    }

    #[test]
    fn test_subtable_clear() {
        let (mut nodes, addresses) = make_store(3);
        let mut st = Subtable::new(Var::new(1), 2);
        for &a in &addresses {
            st.insert(a, &mut nodes);
        }
        st.clear();
        assert!(st.is_empty());
        assert!(st.addresses(&nodes).is_empty());
    }
}
