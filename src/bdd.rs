use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Debug;

use log::{debug, trace};

use crate::cache::{ComputeTable, OpKey};
use crate::error::AllocResult;
use crate::node::Node;
use crate::reference::{Ref, MAX_ADDRESS};
use crate::types::Var;
use crate::unique::UniqueTable;

/// Tuning knobs of a [`Bdd`] manager.
///
/// ```
/// use symbolic_bdd::bdd::BddConfig;
///
/// let config = BddConfig::default().with_cache_bits(16).with_node_capacity(1 << 20);
/// assert_eq!(config.cache_bits, 16);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BddConfig {
    /// Maximum number of nodes, the terminal included.
    pub node_capacity: usize,
    /// Node store slab size is `2^slab_bits`.
    pub slab_bits: u32,
    /// Initial bucket count of each variable's unique subtable is `2^subtable_bits`.
    pub subtable_bits: u32,
    /// Initial compute table size is `2^cache_bits`.
    pub cache_bits: u32,
    /// The compute table never grows beyond `2^max_cache_bits` slots.
    pub max_cache_bits: u32,
    /// Operator calls between two compute table resize decisions.
    pub cache_window: u64,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            node_capacity: MAX_ADDRESS as usize,
            slab_bits: 16,
            subtable_bits: 8,
            cache_bits: 18,
            max_cache_bits: 26,
            cache_window: 1 << 21,
        }
    }
}

impl BddConfig {
    pub fn with_node_capacity(mut self, node_capacity: usize) -> Self {
        self.node_capacity = node_capacity;
        self
    }
    pub fn with_slab_bits(mut self, slab_bits: u32) -> Self {
        self.slab_bits = slab_bits;
        self
    }
    pub fn with_subtable_bits(mut self, subtable_bits: u32) -> Self {
        self.subtable_bits = subtable_bits;
        self
    }
    pub fn with_cache_bits(mut self, cache_bits: u32) -> Self {
        self.cache_bits = cache_bits;
        self.max_cache_bits = self.max_cache_bits.max(cache_bits);
        self
    }
    pub fn with_max_cache_bits(mut self, max_cache_bits: u32) -> Self {
        self.max_cache_bits = max_cache_bits;
        self
    }
    pub fn with_cache_window(mut self, cache_window: u64) -> Self {
        self.cache_window = cache_window;
        self
    }
}

/// Manager statistics, see [`Bdd::stats`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BddStats {
    pub num_vars: u32,
    pub nodes: usize,
    pub node_capacity: usize,
    pub unique_lookups: u64,
    pub unique_hits: u64,
    pub cache_capacity: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub cache_resizes: u64,
}

/// A complement-edge BDD manager over a fixed number of variables.
///
/// All operations take `&self`: the node store, unique table and compute
/// table live behind [`RefCell`]s and are only borrowed for the duration of a
/// single table access, never across a recursive call.
pub struct Bdd {
    unique: RefCell<UniqueTable>,
    cache: RefCell<ComputeTable>,
    config: BddConfig,
}

impl Bdd {
    /// Create a manager for variables `x1..=x{num_vars}`.
    pub fn new(num_vars: u32) -> Self {
        Self::with_config(num_vars, BddConfig::default())
    }

    pub fn with_config(num_vars: u32, config: BddConfig) -> Self {
        debug!("Bdd::with_config(num_vars = {}, config = {:?})", num_vars, config);
        let unique = UniqueTable::new(
            num_vars,
            config.slab_bits,
            config.subtable_bits,
            config.node_capacity,
        );
        let cache = ComputeTable::new(config.cache_bits, config.max_cache_bits, config.cache_window);
        Self {
            unique: RefCell::new(unique),
            cache: RefCell::new(cache),
            config,
        }
    }

    pub fn config(&self) -> &BddConfig {
        &self.config
    }

    pub fn num_vars(&self) -> u32 {
        self.unique.borrow().num_vars()
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(32)
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unique = self.unique.borrow();
        f.debug_struct("Bdd")
            .field("num_vars", &unique.num_vars())
            .field("nodes", &unique.num_nodes())
            .field("capacity", &unique.capacity())
            .field("cache", &self.cache.borrow().capacity())
            .finish()
    }
}

impl Bdd {
    pub fn zero(&self) -> Ref {
        Ref::ZERO
    }
    pub fn one(&self) -> Ref {
        Ref::ONE
    }

    pub fn is_zero(&self, f: Ref) -> bool {
        f == Ref::ZERO
    }
    pub fn is_one(&self, f: Ref) -> bool {
        f == Ref::ONE
    }
    pub fn is_terminal(&self, f: Ref) -> bool {
        f.is_terminal()
    }

    /// A copy of the node at `address`.
    pub fn node(&self, address: u32) -> Node {
        *self.unique.borrow().node(address)
    }

    /// Top variable of `f`, [`Var::TERMINAL`] for constants.
    pub fn variable(&self, f: Ref) -> Var {
        self.unique.borrow().variable(f)
    }

    /// Else-child of `f`, with the complement of `f` pushed down.
    pub fn low_node(&self, f: Ref) -> Ref {
        self.node(f.address()).low.complement_if(f.is_complemented())
    }
    /// Then-child of `f`, with the complement of `f` pushed down.
    pub fn high_node(&self, f: Ref) -> Ref {
        self.node(f.address()).high.complement_if(f.is_complemented())
    }

    /// Number of nodes created so far, the terminal included.
    pub fn num_nodes(&self) -> usize {
        self.unique.borrow().num_nodes()
    }

    /// The positive indicator function of `v`.
    ///
    /// Indicator nodes are created with the manager, so this never allocates.
    pub fn mk_var(&self, v: Var) -> Ref {
        assert!(!v.is_terminal(), "Variable index should not be zero");
        assert!(
            v.id() <= self.num_vars(),
            "Variable {} is out of range 1..={}",
            v,
            self.num_vars()
        );
        Ref::positive(v.id())
    }

    /// The canonical node `v ? high : low`.
    pub fn mk_node(&self, v: Var, low: Ref, high: Ref) -> AllocResult<Ref> {
        self.unique.borrow_mut().find_or_create(v, low, high)
    }

    /// Cofactors `(f|v=0, f|v=1)` of `f` with respect to a variable `v` that is
    /// not below the top variable of `f`.
    pub fn top_cofactors(&self, f: Ref, v: Var) -> (Ref, Ref) {
        let node = self.node(f.address());
        if v < node.variable {
            return (f, f);
        }
        debug_assert_eq!(v, node.variable);
        let neg = f.is_complemented();
        (node.low.complement_if(neg), node.high.complement_if(neg))
    }

    pub(crate) fn cache_get(&self, key: &OpKey) -> Option<Ref> {
        self.cache.borrow().get(key)
    }

    pub(crate) fn cache_insert(&self, key: OpKey, value: Ref) {
        self.cache.borrow_mut().insert(key, value);
    }

    /// Count one recursive call towards the compute table resize policy.
    pub(crate) fn adjust_cache(&self) {
        let (live, capacity) = {
            let unique = self.unique.borrow();
            (unique.num_nodes(), unique.capacity())
        };
        self.cache.borrow_mut().tick(live, capacity);
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, f: Ref, g: Ref) -> AllocResult<Ref> {
        debug!("apply_and(f = {}, g = {})", f, g);
        self.and_rec(f, g)
    }

    pub(crate) fn and_rec(&self, f: Ref, g: Ref) -> AllocResult<Ref> {
        trace!("and({}, {})", f, g);

        if f.address() == g.address() {
            return Ok(if f == g { f } else { Ref::ZERO });
        }
        if f.is_terminal() {
            return Ok(if f == Ref::ONE { g } else { Ref::ZERO });
        }
        if g.is_terminal() {
            return Ok(if g == Ref::ONE { f } else { Ref::ZERO });
        }

        // and(f,g) == and(g,f): order by address so both share one entry
        let (f, g) = if f.address() > g.address() { (g, f) } else { (f, g) };

        self.adjust_cache();
        let key = OpKey::And(f, g);
        if let Some(res) = self.cache_get(&key) {
            trace!("cache: and({}, {}) -> {}", f, g, res);
            return Ok(res);
        }

        let v = self.variable(f).min(self.variable(g));
        let (f0, f1) = self.top_cofactors(f, v);
        let (g0, g1) = self.top_cofactors(g, v);

        let t = self.and_rec(f1, g1)?;
        let e = self.and_rec(f0, g0)?;
        let res = self.mk_node(v, e, t)?;

        self.cache_insert(key, res);
        Ok(res)
    }

    pub fn apply_xor(&self, f: Ref, g: Ref) -> AllocResult<Ref> {
        debug!("apply_xor(f = {}, g = {})", f, g);
        self.xor_rec(f, g)
    }

    pub(crate) fn xor_rec(&self, f: Ref, g: Ref) -> AllocResult<Ref> {
        trace!("xor({}, {})", f, g);

        if f == g {
            return Ok(Ref::ZERO);
        }
        if f == -g {
            return Ok(Ref::ONE);
        }
        if f.is_terminal() {
            return Ok(g.complement_if(f == Ref::ONE));
        }
        if g.is_terminal() {
            return Ok(f.complement_if(g == Ref::ONE));
        }

        // xor(~f,g) == xor(f,~g) == ~xor(f,g)
        let negate = f.is_complemented() ^ g.is_complemented();
        let (f, g) = (f.regular(), g.regular());
        let (f, g) = if f.address() > g.address() { (g, f) } else { (f, g) };

        self.adjust_cache();
        let key = OpKey::Xor(f, g);
        if let Some(res) = self.cache_get(&key) {
            trace!("cache: xor({}, {}) -> {}", f, g, res);
            return Ok(res.complement_if(negate));
        }

        let v = self.variable(f).min(self.variable(g));
        let (f0, f1) = self.top_cofactors(f, v);
        let (g0, g1) = self.top_cofactors(g, v);

        let t = self.xor_rec(f1, g1)?;
        let e = self.xor_rec(f0, g0)?;
        let res = self.mk_node(v, e, t)?;

        self.cache_insert(key, res);
        Ok(res.complement_if(negate))
    }

    pub fn apply_or(&self, f: Ref, g: Ref) -> AllocResult<Ref> {
        debug!("apply_or(f = {}, g = {})", f, g);
        self.or_rec(f, g)
    }

    pub(crate) fn or_rec(&self, f: Ref, g: Ref) -> AllocResult<Ref> {
        Ok(-self.and_rec(-f, -g)?)
    }

    pub fn apply_nand(&self, f: Ref, g: Ref) -> AllocResult<Ref> {
        debug!("apply_nand(f = {}, g = {})", f, g);
        Ok(-self.and_rec(f, g)?)
    }

    pub fn apply_nor(&self, f: Ref, g: Ref) -> AllocResult<Ref> {
        debug!("apply_nor(f = {}, g = {})", f, g);
        self.and_rec(-f, -g)
    }

    pub fn apply_xnor(&self, f: Ref, g: Ref) -> AllocResult<Ref> {
        debug!("apply_xnor(f = {}, g = {})", f, g);
        Ok(-self.xor_rec(f, g)?)
    }

    pub fn apply_imply(&self, f: Ref, g: Ref) -> AllocResult<Ref> {
        debug!("apply_imply(f = {}, g = {})", f, g);
        Ok(-self.and_rec(f, -g)?)
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)
    /// ```
    ///
    /// # Examples
    ///
    /// ```
    /// use symbolic_bdd::bdd::Bdd;
    /// use symbolic_bdd::types::Var;
    ///
    /// let bdd = Bdd::new(3);
    /// let x = bdd.mk_var(Var::new(1));
    /// let y = bdd.mk_var(Var::new(2));
    /// let z = bdd.mk_var(Var::new(3));
    /// let f = bdd.apply_ite(x, y, z).unwrap();
    /// assert_eq!(f, bdd.mk_node(Var::new(1), z, y).unwrap());
    /// let x_and_y = bdd.apply_and(x, y).unwrap();
    /// let not_x_and_z = bdd.apply_and(-x, z).unwrap();
    /// assert_eq!(f, bdd.apply_or(x_and_y, not_x_and_z).unwrap());
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> AllocResult<Ref> {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);
        self.ite_rec(f, g, h)
    }

    pub(crate) fn ite_rec(&self, f: Ref, g: Ref, h: Ref) -> AllocResult<Ref> {
        trace!("ite({}, {}, {})", f, g, h);

        // ite(1,G,H) => G
        // ite(0,G,H) => H
        if f == Ref::ONE {
            return Ok(g);
        }
        if f == Ref::ZERO {
            return Ok(h);
        }
        // ite(F,G,G) => G
        if g == h {
            return Ok(g);
        }
        // ite(F,1,H) == ite(F,F,H) == F ∨ H
        if g == Ref::ONE || f == g {
            if h == Ref::ZERO {
                return Ok(f);
            }
            return Ok(-self.and_rec(-f, -h)?);
        }
        // ite(F,0,H) == ite(F,~F,H) == ~F ∧ H
        if g == Ref::ZERO || f == -g {
            if h == Ref::ONE {
                return Ok(-f);
            }
            return self.and_rec(-f, h);
        }
        // ite(F,~H,H) == F ⊕ H
        if g == -h {
            return self.xor_rec(f, h);
        }
        // ite(F,G,0) == ite(F,G,F) == F ∧ G
        if h == Ref::ZERO || h == f {
            return self.and_rec(f, g);
        }
        // ite(F,G,1) == ite(F,G,~F) == ~F ∨ G
        if h == Ref::ONE || h == -f {
            return Ok(-self.and_rec(f, -g)?);
        }

        self.adjust_cache();

        // ite(~F,G,H) => ite(F,H,G)
        let (f, g, h) = if f.is_complemented() { (-f, h, g) } else { (f, g, h) };
        // ite(F,~G,H) => ~ite(F,G,~H)
        let negate = g.is_complemented();
        let (g, h) = (g.complement_if(negate), h.complement_if(negate));

        let vf = self.variable(f);
        let vg = self.variable(g);
        let vh = self.variable(h);

        // F is a plain variable above G and H: build the node directly
        let node = self.node(f.address());
        if node.high == Ref::ONE && node.low == Ref::ZERO && vf < vg && vf < vh {
            let res = self.mk_node(vf, h, g)?;
            return Ok(res.complement_if(negate));
        }

        let key = OpKey::Ite(f, g, h);
        if let Some(res) = self.cache_get(&key) {
            trace!("cache: ite({}, {}, {}) -> {}", f, g, h, res);
            return Ok(res.complement_if(negate));
        }

        let v = vf.min(vg).min(vh);
        let (f0, f1) = self.top_cofactors(f, v);
        let (g0, g1) = self.top_cofactors(g, v);
        let (h0, h1) = self.top_cofactors(h, v);

        let t = self.ite_rec(f1, g1, h1)?;
        let e = self.ite_rec(f0, g0, h0)?;
        let res = self.mk_node(v, e, t)?;

        self.cache_insert(key, res);
        Ok(res.complement_if(negate))
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> AllocResult<Ref> {
        debug!("apply_and_many(...)");
        let mut res = Ref::ONE;
        for node in nodes {
            res = self.and_rec(res, node)?;
        }
        Ok(res)
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> AllocResult<Ref> {
        debug!("apply_or_many(...)");
        let mut res = Ref::ZERO;
        for node in nodes {
            res = self.or_rec(res, node)?;
        }
        Ok(res)
    }

    /// Conjunction of the positive literals of `vars`.
    pub fn cube(&self, vars: impl IntoIterator<Item = Var>) -> AllocResult<Ref> {
        let vars: BTreeSet<Var> = vars.into_iter().collect();
        debug!("cube(vars = {:?})", vars);
        let mut current = Ref::ONE;
        for &v in vars.iter().rev() {
            assert!(!v.is_terminal(), "Variable index should not be zero");
            current = self.mk_node(v, Ref::ZERO, current)?;
        }
        Ok(current)
    }

    /// Is `c` a conjunction of positive literals? The constant `1` is the
    /// empty cube.
    pub fn is_cube(&self, c: Ref) -> bool {
        let mut current = c;
        while current != Ref::ONE {
            if current.is_complemented() {
                return false;
            }
            let node = self.node(current.address());
            if node.low != Ref::ZERO {
                return false;
            }
            current = node.high;
        }
        true
    }

    /// Addresses of all decision nodes reachable from `roots`.
    pub fn descendants(&self, roots: impl IntoIterator<Item = Ref>) -> HashSet<u32> {
        let mut visited = HashSet::new();
        let mut stack: Vec<Ref> = roots.into_iter().collect();
        while let Some(f) = stack.pop() {
            if f.is_terminal() || !visited.insert(f.address()) {
                continue;
            }
            let node = self.node(f.address());
            stack.push(node.low);
            stack.push(node.high);
        }
        visited
    }

    /// Number of decision nodes of `f`. Constants have size 0.
    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    /// Variables `f` depends on, in order.
    pub fn support(&self, f: Ref) -> Vec<Var> {
        let vars: BTreeSet<Var> = self
            .descendants([f])
            .into_iter()
            .map(|address| self.node(address).variable)
            .collect();
        vars.into_iter().collect()
    }

    pub fn stats(&self) -> BddStats {
        let unique = self.unique.borrow();
        let cache = self.cache.borrow();
        BddStats {
            num_vars: unique.num_vars(),
            nodes: unique.num_nodes(),
            node_capacity: unique.capacity(),
            unique_lookups: unique.lookups(),
            unique_hits: unique.hits(),
            cache_capacity: cache.capacity(),
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
            cache_hit_rate: cache.hit_rate(),
            cache_resizes: cache.resizes(),
        }
    }

    /// Drop every node and cached result, keeping the variable count.
    ///
    /// All previously returned handles except the constants and the variable
    /// indicators become invalid.
    pub fn clear(&self) {
        debug!("clear()");
        let mut unique = self.unique.borrow_mut();
        let num_vars = unique.num_vars();
        unique.clear(num_vars);
        self.cache.borrow_mut().reset();
    }

    /// Check the structural invariants of every node in the store.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.unique.borrow().check_invariants()
    }
}
