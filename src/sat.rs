use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// Evaluate `f` under `assignment`, where `assignment[i]` is the value of
    /// variable `x{i+1}`.
    pub fn evaluate(&self, f: Ref, assignment: &[bool]) -> bool {
        let mut current = f;
        while !current.is_terminal() {
            let v = self.variable(current);
            current = if assignment[v.index()] {
                self.high_node(current)
            } else {
                self.low_node(current)
            };
        }
        current == Ref::ONE
    }

    /// Number of satisfying assignments of `f` over all variables of the
    /// manager.
    pub fn sat_count(&self, f: Ref) -> BigUint {
        let max = BigUint::from(1u32) << self.num_vars() as usize;
        let mut cache = HashMap::new();
        self.sat_count_rec(f, &max, &mut cache)
    }

    // Counts are kept over all variables: a node's count is the mean of its
    // children's counts, since its variable halves the assignment space.
    fn sat_count_rec(&self, f: Ref, max: &BigUint, cache: &mut HashMap<u32, BigUint>) -> BigUint {
        if f == Ref::ZERO {
            return BigUint::ZERO;
        } else if f == Ref::ONE {
            return max.clone();
        }

        let count = if let Some(count) = cache.get(&f.address()) {
            count.clone()
        } else {
            let node = self.node(f.address());
            let count_low = self.sat_count_rec(node.low, max, cache);
            let count_high = self.sat_count_rec(node.high, max, cache);
            let count: BigUint = (count_low + count_high) >> 1;
            cache.insert(f.address(), count.clone());
            count
        };

        if f.is_complemented() {
            max - count
        } else {
            count
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::types::Var;

    #[test]
    fn test_sat_count_terminal() {
        let bdd = Bdd::new(3);
        assert_eq!(bdd.sat_count(bdd.zero()), BigUint::from(0u32));
        assert_eq!(bdd.sat_count(bdd.one()), BigUint::from(8u32));
    }

    #[test]
    fn test_sat_count_var() {
        let bdd = Bdd::new(3);
        let x1 = bdd.mk_var(Var::new(1));
        let x3 = bdd.mk_var(Var::new(3));
        assert_eq!(bdd.sat_count(x1), BigUint::from(4u32));
        assert_eq!(bdd.sat_count(-x3), BigUint::from(4u32));
    }

    #[test]
    fn test_sat_count_cube() {
        let bdd = Bdd::new(4);
        let f = bdd.cube([Var::new(1), Var::new(2)]).unwrap();
        assert_eq!(bdd.sat_count(f), BigUint::from(4u32));
        assert_eq!(bdd.sat_count(-f), BigUint::from(12u32));
    }

    #[test]
    fn test_sat_count_clause() {
        let bdd = Bdd::new(3);
        let x1 = bdd.mk_var(Var::new(1));
        let x2 = bdd.mk_var(Var::new(2));
        let f = bdd.apply_or(x1, x2).unwrap();
        assert_eq!(bdd.sat_count(f), BigUint::from(6u32));
    }

    #[test]
    fn test_evaluate() {
        let bdd = Bdd::new(3);
        let x1 = bdd.mk_var(Var::new(1));
        let x3 = bdd.mk_var(Var::new(3));
        let f = bdd.apply_and(x1, -x3).unwrap();
        assert!(bdd.evaluate(f, &[true, false, false]));
        assert!(bdd.evaluate(f, &[true, true, false]));
        assert!(!bdd.evaluate(f, &[true, false, true]));
        assert!(!bdd.evaluate(-f, &[true, true, false]));
        assert!(bdd.evaluate(bdd.one(), &[]));
    }

    #[test]
    fn test_sat_count_wide() {
        // More assignments than fit in a u64.
        let bdd = Bdd::new(80);
        let x = bdd.mk_var(Var::new(40));
        assert_eq!(bdd.sat_count(x), BigUint::from(1u32) << 79usize);
    }
}
