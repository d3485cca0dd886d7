//! Facade used by symbolic search: [`DdManager`] and its [`Dd`] handles.
//!
//! The facade wraps the [`Bdd`] engine with the checks the search front end
//! relies on:
//!
//! - every operation first consults the [time budget](DdManager::set_time_limit);
//! - operators taking `max_nodes` reject operands and results with more nodes;
//! - handles carry the id of the manager that made them, and handles from
//!   another manager (or from before [`DdManager::clear`]) are rejected.
//!
//! Variables are numbered from 0 at this level; variable `i` is engine
//! variable `x{i+1}`.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, info, warn};
use num_bigint::BigUint;

use crate::bdd::{Bdd, BddConfig, BddStats};
use crate::budget::TimeBudget;
use crate::error::{AllocResult, Error, Result};
use crate::reference::Ref;
use crate::registry::HandleRegistry;
use crate::types::Var;

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

fn fresh_manager_id() -> u64 {
    NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed)
}

/// A Boolean function owned by a [`DdManager`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Dd {
    manager: u64,
    node: Ref,
}

impl Dd {
    /// The engine handle.
    pub fn node(&self) -> Ref {
        self.node
    }
}

pub struct DdManager {
    bdd: Bdd,
    id: Cell<u64>,
    budget: TimeBudget,
    registry: HandleRegistry,
}

impl DdManager {
    pub fn new(num_vars: usize) -> Self {
        Self::with_config(num_vars, BddConfig::default())
    }

    pub fn with_config(num_vars: usize, config: BddConfig) -> Self {
        let num_vars = u32::try_from(num_vars).unwrap_or(u32::MAX);
        let manager = Self {
            bdd: Bdd::with_config(num_vars, config),
            id: Cell::new(fresh_manager_id()),
            budget: TimeBudget::new(),
            registry: HandleRegistry::new(),
        };
        debug!("DdManager #{} created with {} variables", manager.id.get(), num_vars);
        manager
    }

    /// The underlying engine.
    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    pub fn num_vars(&self) -> usize {
        self.bdd.num_vars() as usize
    }

    /// Drop every node, cached result and registered handle.
    ///
    /// All handles issued so far are invalidated, including constants and
    /// variables: using them afterwards fails with [`Error::ManagerMismatch`].
    pub fn clear(&mut self) {
        self.bdd.clear();
        self.registry.clear();
        self.id.set(fresh_manager_id());
        debug!("DdManager cleared, now #{}", self.id.get());
    }

    fn wrap(&self, node: Ref) -> Dd {
        Dd {
            manager: self.id.get(),
            node,
        }
    }

    fn check(&self, f: Dd) -> Result<Ref> {
        if f.manager != self.id.get() {
            warn!(
                "Handle {} of manager #{} used with manager #{}",
                f.node,
                f.manager,
                self.id.get()
            );
            return Err(Error::ManagerMismatch);
        }
        Ok(f.node)
    }

    fn check_nodes(&self, f: Ref, max_nodes: Option<usize>) -> Result<()> {
        if let Some(limit) = max_nodes {
            let nodes = self.bdd.size(f);
            if nodes > limit {
                warn!("Node limit exceeded: {} has {} nodes, limit is {}", f, nodes, limit);
                return Err(Error::NodeLimitExceeded { limit, nodes });
            }
        }
        Ok(())
    }

    fn to_var(&self, index: usize) -> Result<Var> {
        if index >= self.num_vars() {
            warn!("Variable {} is out of range 0..{}", index, self.num_vars());
            return Err(Error::VariableOutOfRange {
                index,
                num_vars: self.num_vars(),
            });
        }
        Ok(Var::new(index as u32 + 1))
    }

    /// The variable of an indicator handle.
    fn indicator_var(&self, f: Dd) -> Result<Var> {
        let f = self.check(f)?;
        if f.is_complemented() || f.is_terminal() {
            return Err(Error::NotAVariable);
        }
        let node = self.bdd.node(f.address());
        if node.low != Ref::ZERO || node.high != Ref::ONE {
            return Err(Error::NotAVariable);
        }
        Ok(node.variable)
    }

    fn check_cube(&self, cube: Dd) -> Result<Ref> {
        let cube = self.check(cube)?;
        if !self.bdd.is_cube(cube) {
            warn!("{} is not a cube", cube);
            return Err(Error::NotACube);
        }
        Ok(cube)
    }

    fn var_lists(&self, from: &[Dd], to: &[Dd]) -> Result<(Vec<Var>, Vec<Var>)> {
        if from.len() != to.len() {
            return Err(Error::VariableListMismatch {
                from: from.len(),
                to: to.len(),
            });
        }
        let from = from.iter().map(|&v| self.indicator_var(v)).collect::<Result<Vec<_>>>()?;
        let to = to.iter().map(|&v| self.indicator_var(v)).collect::<Result<Vec<_>>>()?;
        Ok((from, to))
    }

    /// Run a binary operator with the time and node guards.
    fn binary(
        &self,
        f: Dd,
        g: Dd,
        max_nodes: Option<usize>,
        op: impl FnOnce(&Bdd, Ref, Ref) -> AllocResult<Ref>,
    ) -> Result<Dd> {
        self.budget.check()?;
        let f = self.check(f)?;
        let g = self.check(g)?;
        self.check_nodes(f, max_nodes)?;
        self.check_nodes(g, max_nodes)?;
        let res = op(&self.bdd, f, g)?;
        self.check_nodes(res, max_nodes)?;
        Ok(self.wrap(res))
    }
}

// Constants and operators
impl DdManager {
    pub fn zero(&self) -> Dd {
        self.wrap(Ref::ZERO)
    }

    pub fn one(&self) -> Dd {
        self.wrap(Ref::ONE)
    }

    /// Positive indicator of variable `index` (0-based).
    pub fn variable(&self, index: usize) -> Result<Dd> {
        let v = self.to_var(index)?;
        Ok(self.wrap(self.bdd.mk_var(v)))
    }

    pub fn not(&self, f: Dd) -> Result<Dd> {
        self.budget.check()?;
        let f = self.check(f)?;
        Ok(self.wrap(self.bdd.apply_not(f)))
    }

    pub fn and(&self, f: Dd, g: Dd, max_nodes: Option<usize>) -> Result<Dd> {
        self.binary(f, g, max_nodes, Bdd::apply_and)
    }

    pub fn or(&self, f: Dd, g: Dd, max_nodes: Option<usize>) -> Result<Dd> {
        self.binary(f, g, max_nodes, Bdd::apply_or)
    }

    pub fn xor(&self, f: Dd, g: Dd, max_nodes: Option<usize>) -> Result<Dd> {
        self.binary(f, g, max_nodes, Bdd::apply_xor)
    }

    pub fn xnor(&self, f: Dd, g: Dd, max_nodes: Option<usize>) -> Result<Dd> {
        self.binary(f, g, max_nodes, Bdd::apply_xnor)
    }

    pub fn ite(&self, f: Dd, g: Dd, h: Dd) -> Result<Dd> {
        self.budget.check()?;
        let (f, g, h) = (self.check(f)?, self.check(g)?, self.check(h)?);
        Ok(self.wrap(self.bdd.apply_ite(f, g, h)?))
    }

    /// Conjunction of the given variable indicators.
    pub fn cube(&self, vars: &[Dd]) -> Result<Dd> {
        self.budget.check()?;
        let vars = vars.iter().map(|&v| self.indicator_var(v)).collect::<Result<Vec<_>>>()?;
        Ok(self.wrap(self.bdd.cube(vars)?))
    }
}

// Quantification and substitution
impl DdManager {
    pub fn exist(&self, f: Dd, cube: Dd) -> Result<Dd> {
        self.budget.check()?;
        let f = self.check(f)?;
        let cube = self.check_cube(cube)?;
        Ok(self.wrap(self.bdd.exist(f, cube)?))
    }

    pub fn forall(&self, f: Dd, cube: Dd) -> Result<Dd> {
        self.budget.check()?;
        let f = self.check(f)?;
        let cube = self.check_cube(cube)?;
        Ok(self.wrap(self.bdd.forall(f, cube)?))
    }

    pub fn and_exist(&self, f: Dd, g: Dd, cube: Dd, max_nodes: Option<usize>) -> Result<Dd> {
        self.budget.check()?;
        let f = self.check(f)?;
        let g = self.check(g)?;
        let cube = self.check_cube(cube)?;
        self.check_nodes(f, max_nodes)?;
        self.check_nodes(g, max_nodes)?;
        let res = self.bdd.and_exist(f, g, cube)?;
        self.check_nodes(res, max_nodes)?;
        Ok(self.wrap(res))
    }

    pub fn restrict(&self, f: Dd, c: Dd) -> Result<Dd> {
        self.budget.check()?;
        let (f, c) = (self.check(f)?, self.check(c)?);
        Ok(self.wrap(self.bdd.restrict(f, c)?))
    }

    /// Substitute `g` for variable `index` in `f`.
    pub fn compose(&self, f: Dd, index: usize, g: Dd) -> Result<Dd> {
        self.budget.check()?;
        let (f, g) = (self.check(f)?, self.check(g)?);
        let v = self.to_var(index)?;
        Ok(self.wrap(self.bdd.compose(f, v, g)?))
    }

    /// Rename every variable `i` of `f` to `permutation[i]`.
    pub fn permute(&self, f: Dd, permutation: &[usize]) -> Result<Dd> {
        self.budget.check()?;
        let f = self.check(f)?;
        if permutation.len() != self.num_vars() {
            return Err(Error::VariableListMismatch {
                from: permutation.len(),
                to: self.num_vars(),
            });
        }
        let mut map = HashMap::with_capacity(permutation.len());
        for (old, &new) in permutation.iter().enumerate() {
            map.insert(self.to_var(old)?, self.to_var(new)?);
        }
        Ok(self.wrap(self.bdd.permute(f, &map)?))
    }

    /// Exchange the variables `from[i]` and `to[i]` in `f`.
    pub fn swap_variables(&self, f: Dd, from: &[Dd], to: &[Dd]) -> Result<Dd> {
        self.budget.check()?;
        let f = self.check(f)?;
        let (from, to) = self.var_lists(from, to)?;
        Ok(self.wrap(self.bdd.swap_variables(f, &from, &to)?))
    }

    /// Image of `states` under `relation`: quantify `cube` (the current-state
    /// variables) out of `states ∧ relation`, then rename the successor
    /// variables back to current-state ones.
    pub fn relation_product_next(
        &self,
        states: Dd,
        relation: Dd,
        cube: Dd,
        pre_vars: &[Dd],
        succ_vars: &[Dd],
        max_nodes: Option<usize>,
    ) -> Result<Dd> {
        debug!("relation_product_next(states = {}, relation = {})", states.node, relation.node);
        let (pre, succ) = self.var_lists(pre_vars, succ_vars)?;
        let image = self.and_exist(states, relation, cube, max_nodes)?;
        Ok(self.wrap(self.bdd.swap_variables(image.node, &pre, &succ)?))
    }

    /// Preimage of `states` under `relation`: rename current-state variables
    /// to successor ones, then quantify `cube` out of the conjunction with
    /// `relation`.
    pub fn relation_product_prev(
        &self,
        states: Dd,
        relation: Dd,
        cube: Dd,
        pre_vars: &[Dd],
        succ_vars: &[Dd],
        max_nodes: Option<usize>,
    ) -> Result<Dd> {
        debug!("relation_product_prev(states = {}, relation = {})", states.node, relation.node);
        let swapped = self.swap_variables(states, pre_vars, succ_vars)?;
        self.and_exist(swapped, relation, cube, max_nodes)
    }
}

// Queries
impl DdManager {
    /// Number of decision nodes of `f`.
    pub fn node_count(&self, f: Dd) -> Result<usize> {
        let f = self.check(f)?;
        Ok(self.bdd.size(f))
    }

    pub fn is_zero(&self, f: Dd) -> bool {
        f.manager == self.id.get() && f.node == Ref::ZERO
    }

    pub fn is_one(&self, f: Dd) -> bool {
        f.manager == self.id.get() && f.node == Ref::ONE
    }

    /// Number of satisfying assignments over all variables of the manager.
    pub fn sat_count(&self, f: Dd) -> Result<BigUint> {
        self.budget.check()?;
        let f = self.check(f)?;
        Ok(self.bdd.sat_count(f))
    }

    /// Value of `f` when variable `i` is `assignment[i]`.
    pub fn evaluate(&self, f: Dd, assignment: &[bool]) -> Result<bool> {
        let f = self.check(f)?;
        if assignment.len() != self.num_vars() {
            return Err(Error::VariableListMismatch {
                from: assignment.len(),
                to: self.num_vars(),
            });
        }
        Ok(self.bdd.evaluate(f, assignment))
    }

    /// Indices of the variables `f` depends on, in order.
    pub fn support(&self, f: Dd) -> Result<Vec<usize>> {
        let f = self.check(f)?;
        Ok(self.bdd.support(f).into_iter().map(|v| v.index()).collect())
    }
}

// Time budget
impl DdManager {
    pub fn set_time_limit(&self, ms: u64) {
        debug!("set_time_limit({} ms)", ms);
        self.budget.set_limit(Duration::from_millis(ms));
    }

    pub fn unset_time_limit(&self) {
        debug!("unset_time_limit()");
        self.budget.unset_limit();
    }

    pub fn reset_start_time(&self) {
        self.budget.reset_start();
    }
}

// Handle registry and statistics
impl DdManager {
    pub fn register(&self, f: Dd) -> Result<()> {
        let f = self.check(f)?;
        self.registry.register(f);
        Ok(())
    }

    /// Returns false if `f` was not registered.
    pub fn deregister(&self, f: Dd) -> Result<bool> {
        let f = self.check(f)?;
        Ok(self.registry.deregister(f))
    }

    /// Number of registered handles, with multiplicity.
    pub fn live_handles(&self) -> usize {
        self.registry.len()
    }

    /// Nodes not reachable from any registered handle. The terminal and the
    /// variable indicators are never counted.
    pub fn dead_node_count(&self) -> usize {
        let n = self.bdd.num_vars();
        let alive = self
            .bdd
            .descendants(self.registry.roots())
            .into_iter()
            .filter(|&address| address > n)
            .count();
        let created = self.bdd.num_nodes() - 1 - n as usize;
        created - alive
    }

    pub fn stats(&self) -> BddStats {
        self.bdd.stats()
    }

    pub fn show_info(&self) {
        let stats = self.stats();
        info!("DdManager #{}", self.id.get());
        info!("  variables:       {}", stats.num_vars);
        info!("  nodes:           {} / {}", stats.nodes, stats.node_capacity);
        info!("  dead nodes:      {}", self.dead_node_count());
        info!("  live handles:    {}", self.live_handles());
        info!("  unique lookups:  {} ({} hits)", stats.unique_lookups, stats.unique_hits);
        info!("  cache slots:     {} ({} resizes)", stats.cache_capacity, stats.cache_resizes);
        info!(
            "  cache hits:      {} / {} ({:.2}%)",
            stats.cache_hits,
            stats.cache_hits + stats.cache_misses,
            stats.cache_hit_rate * 100.0
        );
        info!("  elapsed:         {} ms", self.budget.elapsed().as_millis());
    }
}
