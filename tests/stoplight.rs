//! End-to-end tests on the traffic light.
//!
//! The automaton of `not (globally finally green)` is composed with both
//! variants of the light: the regular light has no accepting run, the
//! energy-saving one has a run that stops showing green.

use ltl_rs::automaton::Automaton;
use ltl_rs::checker::{model_path, Checker, CheckerConfig, Verdict};
use ltl_rs::formula::{Formula, Ltl};
use ltl_rs::ndfs::{nested_dfs, BuchiGraph};
use ltl_rs::parser::parse;
use ltl_rs::product::Product;
use ltl_rs::reach::Reach;
use ltl_rs::stoplight::{Light, Stoplight};
use ltl_rs::treeset::TreeSet;
use test_log::test;

fn not_always_eventually_green(ltl: &Ltl) -> Formula {
    parse(ltl, "not (globally finally green)").unwrap()
}

// ─── Product and NDFS ──────────────────────────────────────────────────────────

#[test]
fn regular_light_has_no_cycle() {
    let ltl = Ltl::default();
    let automaton = Automaton::from_ltl(&ltl, not_always_eventually_green(&ltl));
    let product = Product::new(&automaton, Stoplight::regular());

    assert!(!product.roots().is_empty());
    assert_eq!(nested_dfs(&product), None);
}

#[test]
fn eco_light_has_witness_cycle() {
    let ltl = Ltl::default();
    let automaton = Automaton::from_ltl(&ltl, not_always_eventually_green(&ltl));
    let product = Product::new(&automaton, Stoplight::eco());

    let witness = nested_dfs(&product).expect("eco light should violate GF green");

    // The witness is a real lasso of the product.
    assert!(product.roots().contains(&witness.path[0]));
    for w in witness.path.windows(2) {
        assert!(product.successors(&w[0]).contains(&w[1]));
    }
    let last = witness.path.last().unwrap();
    assert!(product.successors(last).contains(&witness.path[witness.cycle_start]));

    // Its cycle is accepting and never shows green.
    assert!(witness.cycle().iter().any(|s| product.is_accepting(s)));
    assert!(witness.cycle().iter().all(|s| !s.model.is_green()));
}

#[test]
fn witness_starts_in_initial_model_state() {
    let ltl = Ltl::default();
    let automaton = Automaton::from_ltl(&ltl, not_always_eventually_green(&ltl));
    let product = Product::new(&automaton, Stoplight::eco());

    let witness = nested_dfs(&product).unwrap();
    assert_eq!(witness.path[0].model, Light::RED);
    assert_eq!(witness.path[0].count, 0);
}

// ─── Checker ───────────────────────────────────────────────────────────────────

#[test]
fn checker_verdicts() {
    let ltl = Ltl::default();
    let property = parse(&ltl, "globally finally green").unwrap();

    for reduction in [false, true] {
        let checker = Checker::new(CheckerConfig { reduction });
        assert_eq!(checker.check(&ltl, property, Stoplight::regular()), Verdict::Holds);

        let verdict = checker.check(&ltl, property, Stoplight::eco());
        let trace = verdict.counterexample().unwrap();
        let path = model_path(trace);
        assert!(path[trace.cycle_start..].iter().all(|light| !light.is_green()));
    }
}

#[test]
fn find_matches_check_of_negation() {
    let ltl = Ltl::default();
    let property = parse(&ltl, "globally finally green").unwrap();
    let checker = Checker::default();

    for model in [Stoplight::regular(), Stoplight::eco()] {
        let found = checker.find(&ltl, ltl.negate(property), &model);
        let verdict = checker.check(&ltl, property, &model);
        assert_eq!(found.is_none(), verdict.holds());
    }
}

#[test]
fn light_alternates() {
    let ltl = Ltl::default();
    let checker = Checker::default();
    let property = parse(&ltl, "globally (red implies next green)");
    // `implies` is not part of the surface syntax.
    assert!(property.is_err());

    let property = parse(&ltl, "globally (not red or next green)").unwrap();
    assert!(checker.check(&ltl, property, Stoplight::regular()).holds());
    assert!(!checker.check(&ltl, property, Stoplight::eco()).holds());
}

// ─── Reachability ──────────────────────────────────────────────────────────────

#[test]
fn tree_set_matches_hash_set() {
    for model in [Stoplight::regular(), Stoplight::eco()] {
        let flat: Vec<Light> = Reach::new(&model).collect();
        let tree: Vec<Light> = Reach::with_set(&model, TreeSet::new(2)).collect();
        assert_eq!(flat, tree);
    }
}

#[test]
fn eco_light_has_no_dead_or_livelock() {
    let mut reach = Reach::new(Stoplight::eco()).track_deadlocks().track_livelocks();
    assert_eq!(reach.by_ref().count(), 3);
    assert_eq!(reach.deadlocks(), Some(&[][..]));
    // Off has two successors (itself and red), so it is no livelock.
    assert_eq!(reach.livelocks(), Some(&[][..]));
}
