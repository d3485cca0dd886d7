//! Algebraic properties of the operators, checked on random functions.

use num_bigint::BigUint;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use test_log::test;

use symbolic_bdd::error::Error;
use symbolic_bdd::manager::{Dd, DdManager};

const NUM_VARS: usize = 6;
const ROUNDS: u64 = 40;

fn setup(n: usize) -> (DdManager, Vec<Dd>) {
    let mgr = DdManager::new(n);
    let vars = (0..n).map(|i| mgr.variable(i).unwrap()).collect();
    (mgr, vars)
}

/// A random function built from a pool of literals by random operators.
fn random_function(mgr: &DdManager, vars: &[Dd], rng: &mut ChaCha8Rng, steps: usize) -> Dd {
    let mut pool: Vec<Dd> = vars
        .iter()
        .map(|&v| if rng.random_bool(0.5) { v } else { mgr.not(v).unwrap() })
        .collect();
    for _ in 0..steps {
        let f = pool[rng.random_range(0..pool.len())];
        let g = pool[rng.random_range(0..pool.len())];
        let h = pool[rng.random_range(0..pool.len())];
        let res = match rng.random_range(0..5) {
            0 => mgr.and(f, g, None),
            1 => mgr.or(f, g, None),
            2 => mgr.xor(f, g, None),
            3 => mgr.xnor(f, g, None),
            _ => mgr.ite(f, g, h),
        };
        pool.push(res.unwrap());
    }
    *pool.last().unwrap()
}

/// A random cube over a non-empty subset of `vars`.
fn random_cube(mgr: &DdManager, vars: &[Dd], rng: &mut ChaCha8Rng) -> Dd {
    let mut chosen: Vec<Dd> = vars.iter().copied().filter(|_| rng.random_bool(0.4)).collect();
    if chosen.is_empty() {
        chosen.push(vars[rng.random_range(0..vars.len())]);
    }
    mgr.cube(&chosen).unwrap()
}

fn assignments(n: usize) -> impl Iterator<Item = Vec<bool>> {
    (0..1u32 << n).map(move |bits| (0..n).map(|i| bits >> i & 1 == 1).collect())
}

/// Every node reachable from `f` is reduced and ordered.
fn assert_reduced(mgr: &DdManager, f: Dd) {
    let bdd = mgr.bdd();
    for address in bdd.descendants([f.node()]) {
        let node = bdd.node(address);
        assert_ne!(node.low, node.high, "@{} is redundant", address);
        assert!(!node.high.is_complemented(), "@{} has a complemented high edge", address);
        assert!(node.variable < bdd.variable(node.low), "@{} is not above its low child", address);
        assert!(node.variable < bdd.variable(node.high), "@{} is not above its high child", address);
    }
}

#[test]
fn test_canonicity() {
    let (mgr, vars) = setup(NUM_VARS);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for _ in 0..ROUNDS {
        let f = random_function(&mgr, &vars, &mut rng, 8);
        let g = random_function(&mgr, &vars, &mut rng, 8);
        let h = random_function(&mgr, &vars, &mut rng, 8);

        assert_eq!(mgr.and(f, g, None), mgr.and(g, f, None));
        assert_eq!(mgr.or(f, g, None), mgr.or(g, f, None));
        assert_eq!(mgr.xor(f, g, None), mgr.xor(g, f, None));

        let ite = mgr.ite(f, g, h).unwrap();
        let fg = mgr.and(f, g, None).unwrap();
        let nfh = mgr.and(mgr.not(f).unwrap(), h, None).unwrap();
        assert_eq!(ite, mgr.or(fg, nfh, None).unwrap());

        let xnor = mgr.xnor(f, g, None).unwrap();
        assert_eq!(xnor, mgr.not(mgr.xor(f, g, None).unwrap()).unwrap());
        assert_eq!(xnor, mgr.ite(f, g, mgr.not(g).unwrap()).unwrap());

        for a in assignments(NUM_VARS) {
            let (fv, gv) = (mgr.evaluate(f, &a).unwrap(), mgr.evaluate(g, &a).unwrap());
            assert_eq!(mgr.evaluate(fg, &a).unwrap(), fv && gv);
            assert_eq!(mgr.evaluate(xnor, &a).unwrap(), fv == gv);
        }
    }
}

#[test]
fn test_involution_and_idempotence() {
    let (mgr, vars) = setup(NUM_VARS);
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    for _ in 0..ROUNDS {
        let f = random_function(&mgr, &vars, &mut rng, 10);
        assert_eq!(mgr.not(mgr.not(f).unwrap()), Ok(f));
        assert_eq!(mgr.and(f, f, None), Ok(f));
        assert_eq!(mgr.or(f, f, None), Ok(f));
    }
}

#[test]
fn test_complement_laws() {
    let (mgr, vars) = setup(NUM_VARS);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for _ in 0..ROUNDS {
        let f = random_function(&mgr, &vars, &mut rng, 10);
        let nf = mgr.not(f).unwrap();
        assert_eq!(mgr.and(f, nf, None), Ok(mgr.zero()));
        assert_eq!(mgr.or(f, nf, None), Ok(mgr.one()));
        assert_eq!(mgr.xor(f, nf, None), Ok(mgr.one()));
    }
}

#[test]
fn test_de_morgan() {
    let (mgr, vars) = setup(NUM_VARS);
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    for _ in 0..ROUNDS {
        let f = random_function(&mgr, &vars, &mut rng, 8);
        let g = random_function(&mgr, &vars, &mut rng, 8);
        let lhs = mgr.not(mgr.and(f, g, None).unwrap()).unwrap();
        let rhs = mgr.or(mgr.not(f).unwrap(), mgr.not(g).unwrap(), None).unwrap();
        assert_eq!(lhs, rhs);
    }
}

#[test]
fn test_exist_is_or_of_cofactors() {
    let (mgr, vars) = setup(NUM_VARS);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    for _ in 0..ROUNDS {
        let f = random_function(&mgr, &vars, &mut rng, 10);
        let i = rng.random_range(0..NUM_VARS);
        let f1 = mgr.compose(f, i, mgr.one()).unwrap();
        let f0 = mgr.compose(f, i, mgr.zero()).unwrap();
        let expected = mgr.or(f1, f0, None).unwrap();
        assert_eq!(mgr.exist(f, vars[i]), Ok(expected));

        // Restricting by a literal is the same cofactor.
        assert_eq!(mgr.restrict(f, vars[i]), Ok(f1));
        assert_eq!(mgr.restrict(f, mgr.not(vars[i]).unwrap()), Ok(f0));

        // Universal quantification is the conjunction.
        assert_eq!(mgr.forall(f, vars[i]), mgr.and(f1, f0, None));
    }
}

#[test]
fn test_fusion_equivalence() {
    let (mgr, vars) = setup(NUM_VARS);
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    for _ in 0..ROUNDS {
        let f = random_function(&mgr, &vars, &mut rng, 10);
        let g = random_function(&mgr, &vars, &mut rng, 10);
        let cube = random_cube(&mgr, &vars, &mut rng);
        let fused = mgr.and_exist(f, g, cube, None).unwrap();
        let separate = mgr.exist(mgr.and(f, g, None).unwrap(), cube).unwrap();
        assert_eq!(fused, separate);
        assert_reduced(&mgr, fused);
    }
}

#[test]
fn test_swap_round_trip() {
    let (mgr, vars) = setup(NUM_VARS);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let a = [vars[0], vars[2], vars[4]];
    let b = [vars[1], vars[5], vars[3]];
    for _ in 0..ROUNDS {
        let f = random_function(&mgr, &vars, &mut rng, 10);
        let g = mgr.swap_variables(f, &a, &b).unwrap();
        assert_reduced(&mgr, g);
        assert_eq!(mgr.swap_variables(g, &b, &a), Ok(f));
        assert_eq!(mgr.sat_count(g), mgr.sat_count(f));
    }
}

#[test]
fn test_reduction_invariant() {
    let (mgr, vars) = setup(NUM_VARS);
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    for _ in 0..ROUNDS {
        let f = random_function(&mgr, &vars, &mut rng, 6);
        let g = random_function(&mgr, &vars, &mut rng, 6);
        let cube = random_cube(&mgr, &vars, &mut rng);
        let i = rng.random_range(0..NUM_VARS);

        let results = [
            mgr.and(f, g, None).unwrap(),
            mgr.xor(f, g, None).unwrap(),
            mgr.ite(f, g, mgr.not(g).unwrap()).unwrap(),
            mgr.exist(f, cube).unwrap(),
            mgr.and_exist(f, g, cube, None).unwrap(),
            mgr.restrict(f, g).unwrap(),
            mgr.compose(f, i, g).unwrap(),
        ];
        for r in results {
            assert_reduced(&mgr, r);
        }
    }
    assert!(mgr.bdd().check_invariants().is_ok());
}

#[test]
fn test_sat_count_matches_enumeration() {
    let (mgr, vars) = setup(NUM_VARS);
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    for _ in 0..ROUNDS {
        let f = random_function(&mgr, &vars, &mut rng, 10);
        let models = assignments(NUM_VARS).filter(|a| mgr.evaluate(f, a).unwrap()).count();
        assert_eq!(mgr.sat_count(f), Ok(BigUint::from(models)));
    }
}

#[test]
fn test_scenario_node_count_and_evaluation() {
    let (mgr, x) = setup(3);
    let f = mgr.and(x[0], mgr.or(x[1], x[2], None).unwrap(), None).unwrap();
    assert_eq!(mgr.node_count(f), Ok(3));
    for a in assignments(3) {
        assert_eq!(mgr.evaluate(f, &a), Ok(a[0] && (a[1] || a[2])));
    }
}

#[test]
fn test_scenario_exist_gives_variable() {
    let (mgr, x) = setup(3);
    let f = mgr.and(x[0], mgr.or(x[1], x[2], None).unwrap(), None).unwrap();
    let cube = mgr.and(x[1], x[2], None).unwrap();
    assert_eq!(mgr.exist(f, cube), Ok(x[0]));
}

#[test]
fn test_scenario_image_and_preimage() {
    // Interleaved order: x0, x0', x1, x1'.
    let (mgr, v) = setup(4);
    let pre = [v[0], v[2]];
    let succ = [v[1], v[3]];

    // The transition swaps the two state bits: x0' = x1, x1' = x0.
    let r0 = mgr.xnor(v[1], v[2], None).unwrap();
    let r1 = mgr.xnor(v[3], v[0], None).unwrap();
    let relation = mgr.and(r0, r1, None).unwrap();

    let states = v[0];
    let pre_cube = mgr.cube(&pre).unwrap();
    let succ_cube = mgr.cube(&succ).unwrap();

    let next = mgr
        .relation_product_next(states, relation, pre_cube, &pre, &succ, None)
        .unwrap();
    assert_eq!(next, v[2]);

    let prev = mgr
        .relation_product_prev(next, relation, succ_cube, &pre, &succ, None)
        .unwrap();
    let missing = mgr.and(states, mgr.not(prev).unwrap(), None).unwrap();
    assert!(mgr.is_zero(missing));
}

#[test]
fn test_scenario_node_limit() {
    let (mgr, v) = setup(8);
    let mut parity = mgr.zero();
    for &x in &v[..4] {
        parity = mgr.xor(parity, x, None).unwrap();
    }
    let rest = v[4..]
        .iter()
        .try_fold(mgr.zero(), |acc, &x| mgr.xor(acc, x, None))
        .unwrap();

    let res = mgr.xor(parity, rest, Some(5));
    match res {
        Err(Error::NodeLimitExceeded { limit, nodes }) => {
            assert_eq!(limit, 5);
            assert_eq!(nodes, 8);
        }
        other => panic!("expected node limit error, got {:?}", other),
    }
    assert!(mgr.xor(parity, rest, None).is_ok());

    let next = mgr.relation_product_next(parity, rest, mgr.one(), &[], &[], Some(5));
    assert!(matches!(next, Err(e) if e.is_resource_limit()));
}
