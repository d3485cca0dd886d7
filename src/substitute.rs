//! Cofactoring and variable substitution.

use std::collections::HashMap;

use log::{debug, trace};

use crate::bdd::Bdd;
use crate::cache::OpKey;
use crate::error::AllocResult;
use crate::reference::Ref;
use crate::types::Var;

impl Bdd {
    /// Generalized cofactor of `f` by the care set `c`.
    ///
    /// The result agrees with `f` wherever `c` holds and is usually smaller.
    /// `restrict(f, 0)` is `0`.
    pub fn restrict(&self, f: Ref, c: Ref) -> AllocResult<Ref> {
        debug!("restrict(f = {}, c = {})", f, c);
        self.restrict_rec(f, c)
    }

    fn restrict_rec(&self, f: Ref, c: Ref) -> AllocResult<Ref> {
        trace!("restrict({}, {})", f, c);

        if c == Ref::ONE || f.is_terminal() {
            return Ok(f);
        }
        if c == Ref::ZERO {
            return Ok(Ref::ZERO);
        }
        if f == c {
            return Ok(Ref::ONE);
        }
        if f == -c {
            return Ok(Ref::ZERO);
        }

        let key = OpKey::Restrict(f, c);
        if let Some(res) = self.cache_get(&key) {
            trace!("cache: restrict({}, {}) -> {}", f, c, res);
            return Ok(res);
        }

        let vf = self.variable(f);
        let vc = self.variable(c);
        let res = if vc < vf {
            // f does not depend on the top variable of c
            let (c0, c1) = self.top_cofactors(c, vc);
            let c = self.or_rec(c0, c1)?;
            self.restrict_rec(f, c)?
        } else if vf < vc {
            let (f0, f1) = self.top_cofactors(f, vf);
            let t = self.restrict_rec(f1, c)?;
            let e = self.restrict_rec(f0, c)?;
            self.mk_node(vf, e, t)?
        } else {
            let (f0, f1) = self.top_cofactors(f, vf);
            let (c0, c1) = self.top_cofactors(c, vc);
            if c0 == Ref::ZERO {
                self.restrict_rec(f1, c1)?
            } else if c1 == Ref::ZERO {
                self.restrict_rec(f0, c0)?
            } else {
                let t = self.restrict_rec(f1, c1)?;
                let e = self.restrict_rec(f0, c0)?;
                self.mk_node(vf, e, t)?
            }
        };

        self.cache_insert(key, res);
        Ok(res)
    }

    /// Substitute `g` for the variable `v` in `f`.
    pub fn compose(&self, f: Ref, v: Var, g: Ref) -> AllocResult<Ref> {
        debug!("compose(f = {}, v = {}, g = {})", f, v, g);
        self.compose_rec(f, v, g)
    }

    fn compose_rec(&self, f: Ref, v: Var, g: Ref) -> AllocResult<Ref> {
        trace!("compose({}, {}, {})", f, v, g);

        let vf = self.variable(f);
        if v < vf {
            // f does not depend on v (constants included)
            return Ok(f);
        }

        let negate = f.is_complemented();
        let f = f.regular();

        let key = OpKey::Compose(v, f, g);
        if let Some(res) = self.cache_get(&key) {
            trace!("cache: compose({}, {}, {}) -> {}", f, v, g, res);
            return Ok(res.complement_if(negate));
        }

        let res = if vf == v {
            let (f0, f1) = self.top_cofactors(f, vf);
            self.ite_rec(g, f1, f0)?
        } else {
            let top = vf.min(self.variable(g));
            let (f0, f1) = self.top_cofactors(f, top);
            let (g0, g1) = self.top_cofactors(g, top);
            let t = self.compose_rec(f1, v, g1)?;
            let e = self.compose_rec(f0, v, g0)?;
            self.ite_rec(self.mk_var(top), t, e)?
        };

        self.cache_insert(key, res);
        Ok(res.complement_if(negate))
    }

    /// Rename the variables of `f`: every `x` becomes `permutation(x)`.
    ///
    /// The mapping must be injective on the support of `f`. Variables it does
    /// not map are left in place.
    pub fn permute(&self, f: Ref, permutation: &HashMap<Var, Var>) -> AllocResult<Ref> {
        debug!("permute(f = {}, permutation = {:?})", f, permutation);
        let mut visited = HashMap::new();
        self.permute_rec(f, permutation, &mut visited)
    }

    fn permute_rec(&self, f: Ref, permutation: &HashMap<Var, Var>, visited: &mut HashMap<u32, Ref>) -> AllocResult<Ref> {
        if f.is_terminal() {
            return Ok(f);
        }
        // The map is keyed by address; the complement is re-applied on the way out.
        if let Some(&res) = visited.get(&f.address()) {
            return Ok(res.complement_if(f.is_complemented()));
        }

        let node = self.node(f.address());
        let t = self.permute_rec(node.high, permutation, visited)?;
        let e = self.permute_rec(node.low, permutation, visited)?;
        let v = permutation.get(&node.variable).copied().unwrap_or(node.variable);
        let res = self.ite_rec(self.mk_var(v), t, e)?;

        visited.insert(f.address(), res);
        Ok(res.complement_if(f.is_complemented()))
    }

    /// Exchange `from[i]` and `to[i]` for every `i`.
    ///
    /// Swapping twice with the same lists is the identity.
    pub fn swap_variables(&self, f: Ref, from: &[Var], to: &[Var]) -> AllocResult<Ref> {
        debug!("swap_variables(f = {}, from = {:?}, to = {:?})", f, from, to);
        assert_eq!(from.len(), to.len(), "Variable lists must have equal length");
        let mut permutation = HashMap::with_capacity(2 * from.len());
        for (&a, &b) in from.iter().zip(to) {
            permutation.insert(a, b);
            permutation.insert(b, a);
        }
        self.permute(f, &permutation)
    }
}
