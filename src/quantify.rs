//! Quantification: `∃`, `∀` and the fused relational product.
//!
//! A set of variables is passed as a *cube*, the conjunction of their positive
//! literals (see [`Bdd::cube`]). Walking down the `high` edges of a cube
//! enumerates its variables in order.

use log::{debug, trace};

use crate::bdd::Bdd;
use crate::cache::OpKey;
use crate::error::AllocResult;
use crate::reference::Ref;
use crate::types::Var;

impl Bdd {
    /// Skip the cube variables above `v`; they do not occur below it.
    fn advance_cube(&self, mut cube: Ref, v: Var) -> Ref {
        while !cube.is_terminal() && self.variable(cube) < v {
            cube = self.high_node(cube);
        }
        cube
    }

    /// `∃ cube. f`
    pub fn exist(&self, f: Ref, cube: Ref) -> AllocResult<Ref> {
        debug!("exist(f = {}, cube = {})", f, cube);
        debug_assert!(self.is_cube(cube), "{} is not a cube", cube);
        self.exist_rec(f, cube)
    }

    /// `∀ cube. f = ¬∃ cube. ¬f`
    pub fn forall(&self, f: Ref, cube: Ref) -> AllocResult<Ref> {
        debug!("forall(f = {}, cube = {})", f, cube);
        debug_assert!(self.is_cube(cube), "{} is not a cube", cube);
        Ok(-self.exist_rec(-f, cube)?)
    }

    pub(crate) fn exist_rec(&self, f: Ref, cube: Ref) -> AllocResult<Ref> {
        trace!("exist({}, {})", f, cube);

        if f.is_terminal() || cube == Ref::ONE {
            return Ok(f);
        }
        let vf = self.variable(f);
        let cube = self.advance_cube(cube, vf);
        if cube == Ref::ONE {
            return Ok(f);
        }

        self.adjust_cache();
        let key = OpKey::Exist(f, cube);
        if let Some(res) = self.cache_get(&key) {
            trace!("cache: exist({}, {}) -> {}", f, cube, res);
            return Ok(res);
        }

        let (f0, f1) = self.top_cofactors(f, vf);
        let res = if self.variable(cube) == vf {
            let rest = self.high_node(cube);
            if f1 == Ref::ONE || f0 == Ref::ONE || f1 == -f0 {
                Ref::ONE
            } else {
                let t = self.exist_rec(f1, rest)?;
                if t == Ref::ONE {
                    Ref::ONE
                } else {
                    let e = self.exist_rec(f0, rest)?;
                    self.or_rec(t, e)?
                }
            }
        } else {
            let t = self.exist_rec(f1, cube)?;
            let e = self.exist_rec(f0, cube)?;
            self.mk_node(vf, e, t)?
        };

        self.cache_insert(key, res);
        Ok(res)
    }

    /// `∃ cube. (f ∧ g)`, without building `f ∧ g` first.
    pub fn and_exist(&self, f: Ref, g: Ref, cube: Ref) -> AllocResult<Ref> {
        debug!("and_exist(f = {}, g = {}, cube = {})", f, g, cube);
        debug_assert!(self.is_cube(cube), "{} is not a cube", cube);
        self.and_exist_rec(f, g, cube)
    }

    pub(crate) fn and_exist_rec(&self, f: Ref, g: Ref, cube: Ref) -> AllocResult<Ref> {
        trace!("and_exist({}, {}, {})", f, g, cube);

        if f == Ref::ZERO || g == Ref::ZERO || f == -g {
            return Ok(Ref::ZERO);
        }
        if f == Ref::ONE && g == Ref::ONE {
            return Ok(Ref::ONE);
        }
        if cube == Ref::ONE {
            return self.and_rec(f, g);
        }
        if f == Ref::ONE || f == g {
            return self.exist_rec(g, cube);
        }
        if g == Ref::ONE {
            return self.exist_rec(f, cube);
        }

        let (f, g) = if f.address() > g.address() { (g, f) } else { (f, g) };
        let v = self.variable(f).min(self.variable(g));
        let cube = self.advance_cube(cube, v);
        if cube == Ref::ONE {
            return self.and_rec(f, g);
        }

        self.adjust_cache();
        let key = OpKey::AndExist(f, g, cube);
        if let Some(res) = self.cache_get(&key) {
            trace!("cache: and_exist({}, {}, {}) -> {}", f, g, cube, res);
            return Ok(res);
        }

        let (f0, f1) = self.top_cofactors(f, v);
        let (g0, g1) = self.top_cofactors(g, v);

        let res = if self.variable(cube) == v {
            let rest = self.high_node(cube);
            let t = self.and_exist_rec(f1, g1, rest)?;
            if t == Ref::ONE || t == f0 || t == g0 {
                // t already covers the else branch: f0 ∧ g0 implies t
                t
            } else {
                let e = if t == -f0 {
                    self.exist_rec(g0, rest)?
                } else if t == -g0 {
                    self.exist_rec(f0, rest)?
                } else {
                    self.and_exist_rec(f0, g0, rest)?
                };
                self.or_rec(t, e)?
            }
        } else {
            let t = self.and_exist_rec(f1, g1, cube)?;
            let e = self.and_exist_rec(f0, g0, cube)?;
            self.mk_node(v, e, t)?
        };

        self.cache_insert(key, res);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn setup(n: u32) -> (Bdd, Vec<Ref>) {
        let bdd = Bdd::new(n);
        let vars = (1..=n).map(|i| bdd.mk_var(Var::new(i))).collect();
        (bdd, vars)
    }

    #[test]
    fn test_exist_single_variable() {
        let (bdd, v) = setup(3);
        // f = x1 ∧ (x2 ∨ x3)
        let f = bdd.apply_and(v[0], bdd.apply_or(v[1], v[2]).unwrap()).unwrap();

        let cube = bdd.cube([Var::new(2)]).unwrap();
        let res = bdd.exist(f, cube).unwrap();
        assert_eq!(res, v[0]);

        let cube = bdd.cube([Var::new(1)]).unwrap();
        let res = bdd.exist(f, cube).unwrap();
        assert_eq!(res, bdd.apply_or(v[1], v[2]).unwrap());
    }

    #[test]
    fn test_exist_cube() {
        let (bdd, v) = setup(3);
        let f = bdd.apply_and(v[0], bdd.apply_or(v[1], v[2]).unwrap()).unwrap();
        let cube = bdd.cube([Var::new(2), Var::new(3)]).unwrap();
        assert_eq!(bdd.exist(f, cube), Ok(v[0]));
    }

    #[test]
    fn test_exist_trivial() {
        let (bdd, v) = setup(3);
        let f = bdd.apply_xor(v[0], v[1]).unwrap();
        assert_eq!(bdd.exist(f, bdd.one()), Ok(f));
        assert_eq!(bdd.exist(bdd.zero(), v[0]), Ok(bdd.zero()));
        // x3 does not occur in f
        assert_eq!(bdd.exist(f, v[2]), Ok(f));
        // f ⊕ x1 covers both values of x1
        assert_eq!(bdd.exist(f, v[0]), Ok(bdd.one()));
    }

    #[test]
    fn test_forall() {
        let (bdd, v) = setup(3);
        // ∀x2. (x1 ∧ x2) ∨ (x1 ∧ ¬x2 ∧ x3) = x1 ∧ x3
        let a = bdd.apply_and(v[0], v[1]).unwrap();
        let b = bdd.apply_and_many([v[0], -v[1], v[2]]).unwrap();
        let f = bdd.apply_or(a, b).unwrap();
        let res = bdd.forall(f, v[1]).unwrap();
        assert_eq!(res, bdd.apply_and(v[0], v[2]).unwrap());
    }

    #[test]
    fn test_and_exist_matches_exist_of_and() {
        let (bdd, v) = setup(6);
        let f = bdd.apply_or(bdd.apply_and(v[0], v[3]).unwrap(), bdd.apply_xor(v[1], v[4]).unwrap()).unwrap();
        let g = bdd.apply_ite(v[2], v[5], -v[0]).unwrap();
        for vars in [vec![1], vec![2, 4], vec![1, 3, 5], vec![4, 5, 6], vec![1, 2, 3, 4, 5, 6]] {
            let cube = bdd.cube(vars.iter().map(|&i| Var::new(i))).unwrap();
            let fused = bdd.and_exist(f, g, cube).unwrap();
            let separate = bdd.exist(bdd.apply_and(f, g).unwrap(), cube).unwrap();
            assert_eq!(fused, separate, "cube {:?}", vars);
        }
    }

    #[test]
    fn test_and_exist_shortcuts() {
        let (bdd, v) = setup(3);
        let f = bdd.apply_or(v[0], v[1]).unwrap();
        let cube = v[0];
        assert_eq!(bdd.and_exist(f, -f, cube), Ok(bdd.zero()));
        assert_eq!(bdd.and_exist(f, bdd.zero(), cube), Ok(bdd.zero()));
        assert_eq!(bdd.and_exist(bdd.one(), bdd.one(), cube), Ok(bdd.one()));
        assert_eq!(bdd.and_exist(f, v[2], bdd.one()), bdd.apply_and(f, v[2]));
        assert_eq!(bdd.and_exist(f, f, cube), bdd.exist(f, cube));
        assert_eq!(bdd.and_exist(bdd.one(), f, cube), Ok(bdd.one()));
    }
}
