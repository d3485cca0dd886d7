//! Unique table: hash-consing of decision nodes.
//!
//! Owns the [`NodeStore`] together with one [`Subtable`] per variable, and
//! guarantees that every `(variable, low, high)` triple maps to exactly one
//! address. Nodes are stored in canonical form: the high edge is never
//! complemented and the two children always differ.
//!
//! Variable indicator nodes `x_i = (x_i, 0, 1)` are created up front at
//! addresses `1..=n`, so an indicator is a plain [`Ref::positive(i)`].

use log::trace;

use crate::error::AllocResult;
use crate::node::Node;
use crate::reference::Ref;
use crate::storage::NodeStore;
use crate::subtable::Subtable;
use crate::types::Var;

pub struct UniqueTable {
    nodes: NodeStore,
    subtables: Vec<Subtable>,
    subtable_bits: u32,
    lookups: u64,
    hits: u64,
}

impl UniqueTable {
    /// Create a table for `num_vars` variables, with their indicator nodes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` cannot hold the terminal and the indicator nodes.
    pub fn new(num_vars: u32, slab_bits: u32, subtable_bits: u32, capacity: usize) -> Self {
        assert!(
            capacity > num_vars as usize,
            "Node capacity {} cannot hold {} variables",
            capacity,
            num_vars
        );
        let mut table = Self {
            nodes: NodeStore::new(slab_bits, capacity),
            subtables: Vec::new(),
            subtable_bits,
            lookups: 0,
            hits: 0,
        };
        table.init_variables(num_vars);
        table
    }

    fn init_variables(&mut self, num_vars: u32) {
        self.subtables = (1..=num_vars)
            .map(|id| Subtable::new(Var::new(id), self.subtable_bits))
            .collect();
        for id in 1..=num_vars {
            let v = Var::new(id);
            let address = self.nodes.push(Node::new(v, Ref::ZERO, Ref::ONE));
            debug_assert_eq!(address, id);
            self.subtables[v.index()].insert(address, &mut self.nodes);
        }
    }

    pub fn num_vars(&self) -> u32 {
        self.subtables.len() as u32
    }

    /// The node store.
    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    /// The node at `address`.
    #[inline]
    pub fn node(&self, address: u32) -> &Node {
        &self.nodes[address]
    }

    /// Top variable of `f`, [`Var::TERMINAL`] for constants.
    #[inline]
    pub fn variable(&self, f: Ref) -> Var {
        self.nodes[f.address()].variable
    }

    /// Number of nodes created so far, the terminal included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of nodes labelled with variable `v`.
    pub fn level_size(&self, v: Var) -> usize {
        self.subtables[v.index()].len()
    }

    /// Return the canonical handle for `v ? high : low`, creating the node
    /// if it does not exist yet.
    pub fn find_or_create(&mut self, v: Var, low: Ref, high: Ref) -> AllocResult<Ref> {
        debug_assert!(!v.is_terminal(), "Cannot create a node for the terminal variable");
        debug_assert!(v < self.variable(low), "{} must be above low child {}", v, low);
        debug_assert!(v < self.variable(high), "{} must be above high child {}", v, high);

        if low == high {
            return Ok(low);
        }

        // Keep the high edge regular: (v, ~l, ~h) = ~(v, l, h)
        let negate = high.is_complemented();
        let low = low.complement_if(negate);
        let high = high.complement_if(negate);

        self.lookups += 1;
        let subtable = &mut self.subtables[v.index()];
        if let Some(address) = subtable.find(low, high, &self.nodes) {
            self.hits += 1;
            return Ok(Ref::new(address, negate));
        }

        let address = self.nodes.alloc(Node::new(v, low, high))?;
        subtable.insert_with_resize(address, &mut self.nodes);
        trace!("new node @{} = ({}, {}, {})", address, v, low, high);
        Ok(Ref::new(address, negate))
    }

    /// Drop every node and start over with `num_vars` variables.
    pub fn clear(&mut self, num_vars: u32) {
        self.nodes.clear();
        self.lookups = 0;
        self.hits = 0;
        self.init_variables(num_vars);
    }

    /// Check the structural invariants of every stored node.
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        for address in self.nodes.addresses().skip(1) {
            let node = &self.nodes[address];
            if node.low == node.high {
                return Err(format!("@{}: both children are {}", address, node.low));
            }
            if node.high.is_complemented() {
                return Err(format!("@{}: complemented high edge {}", address, node.high));
            }
            if !(node.variable < self.variable(node.low) && node.variable < self.variable(node.high)) {
                return Err(format!("@{}: {} is not above its children", address, node.variable));
            }
        }
        let total: usize = self.subtables.iter().map(|s| s.len()).sum();
        if total + 1 != self.nodes.len() {
            return Err(format!(
                "subtables hold {} nodes, store has {}",
                total,
                self.nodes.len() - 1
            ));
        }
        Ok(())
    }
}
