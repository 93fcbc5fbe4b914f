//! Tableau translation from LTL to generalized Büchi automata.
//!
//! This is the on-the-fly construction of Gerth, Peled, Vardi and Wolper
//! ("Simple On-the-fly Automatic Verification of Linear Temporal Logic",
//! PSTV 1995). A tableau node collects the obligations (`new`) it still has
//! to process, the ones it has processed (`old`) and the ones it defers to
//! its successors (`next`). Processing an obligation may split a node in two
//! (disjunction, until, release). Once a node has nothing left to process it
//! is merged with an existing node that has the same `(old, next)` pair, or
//! registered as a new automaton state whose successor must satisfy `next`.
//!
//! Acceptance: for every subformula `a U b` there is one acceptance set,
//! holding the states that either do not promise `a U b` or already
//! satisfy `b` (trivially so when `b` is `true`). Without any until, the single acceptance set holds every
//! state.
//!
//! ```
//! use ltl_rs::automaton::Automaton;
//! use ltl_rs::formula::Ltl;
//!
//! let ltl = Ltl::default();
//! let p = ltl.mk_atom("p");
//! let automaton = Automaton::from_ltl(&ltl, ltl.mk_globally(p));
//!
//! assert_eq!(automaton.num_states(), 1);
//! assert_eq!(automaton.num_accept_sets(), 1);
//! ```

use std::collections::{BTreeSet, HashMap};

use log::{debug, info};

use crate::automaton::{Automaton, Literal, State, StateId};
use crate::bitset::BitSet;
use crate::formula::{Formula, Ltl, Node};

type Obligations = BTreeSet<Formula>;

/// Predecessor of a tableau node: `None` is the initial pseudo-node,
/// `Some(i)` the `i`-th registered node.
type Incoming = Option<usize>;

#[derive(Debug, Clone)]
struct TableauNode {
    incoming: BTreeSet<Incoming>,
    new: Obligations,
    old: Obligations,
    next: Obligations,
}

impl TableauNode {
    fn successor_of(index: usize, next: Obligations) -> Self {
        Self {
            incoming: BTreeSet::from([Some(index)]),
            new: next,
            old: Obligations::new(),
            next: Obligations::new(),
        }
    }

    /// Copy of this node with `extra` added to `new` (skipping what is in `old`)
    /// and, optionally, `deferred` added to `next`.
    fn branch(&self, extra: &[Formula], deferred: Option<Formula>) -> Self {
        let mut node = self.clone();
        node.require(extra);
        node.next.extend(deferred);
        node
    }

    fn require(&mut self, extra: &[Formula]) {
        for &f in extra {
            if !self.old.contains(&f) {
                self.new.insert(f);
            }
        }
    }

    fn is_satisfied(&self, f: Formula) -> bool {
        self.old.contains(&f)
    }
}

/// Frozen tableau node: one automaton state.
#[derive(Debug)]
struct Registered {
    incoming: BTreeSet<Incoming>,
    old: Obligations,
}

impl Automaton {
    /// Translate `formula` into a generalized Büchi automaton.
    pub fn from_ltl(ltl: &Ltl, formula: Formula) -> Automaton {
        let nodes = expand(ltl, formula);
        let automaton = extract(ltl, formula, &nodes);
        info!(
            "Translated {} into {} states, {} acceptance sets",
            ltl.display(formula),
            automaton.num_states(),
            automaton.num_accept_sets()
        );
        automaton
    }
}

fn expand(ltl: &Ltl, formula: Formula) -> Vec<Registered> {
    let mut nodes: Vec<Registered> = Vec::new();
    let mut index: HashMap<(Obligations, Obligations), usize> = HashMap::new();

    let mut stack = vec![TableauNode {
        incoming: BTreeSet::from([None]),
        new: Obligations::from([formula]),
        old: Obligations::new(),
        next: Obligations::new(),
    }];

    while let Some(mut n) = stack.pop() {
        let Some(m) = n.new.pop_first() else {
            let key = (n.old, n.next);
            if let Some(&i) = index.get(&key) {
                debug!("merge into node {}", i);
                nodes[i].incoming.extend(n.incoming);
            } else {
                let i = nodes.len();
                debug!("register node {} with {} obligations", i, key.0.len());
                stack.push(TableauNode::successor_of(i, key.1.clone()));
                nodes.push(Registered {
                    incoming: n.incoming,
                    old: key.0.clone(),
                });
                index.insert(key, i);
            }
            continue;
        };

        match ltl.node(m) {
            Node::Atom(_) | Node::NotAtom(_) => {
                if ltl.is_false(m) || n.is_satisfied(ltl.negate(m)) {
                    debug!("drop contradictory node on {}", ltl.display(m));
                    continue;
                }
                if !ltl.is_true(m) {
                    n.old.insert(m);
                }
                stack.push(n);
            }
            Node::And(a, b) => {
                n.old.insert(m);
                n.require(&[a, b]);
                stack.push(n);
            }
            Node::Or(a, b) => {
                n.old.insert(m);
                if n.is_satisfied(a) || n.is_satisfied(b) {
                    stack.push(n);
                } else {
                    stack.push(n.branch(&[a], None));
                    stack.push(n.branch(&[b], None));
                }
            }
            Node::Next(a) => {
                n.old.insert(m);
                n.next.insert(a);
                stack.push(n);
            }
            Node::Until(a, b) => {
                // a U b  ==  b  or  (a and X(a U b))
                n.old.insert(m);
                stack.push(n.branch(&[a], Some(m)));
                n.require(&[b]);
                stack.push(n);
            }
            Node::Release(a, b) => {
                // a R b  ==  (a and b)  or  (b and X(a R b))
                n.old.insert(m);
                stack.push(n.branch(&[b], Some(m)));
                n.require(&[a, b]);
                stack.push(n);
            }
        }
    }

    nodes
}

fn extract(ltl: &Ltl, formula: Formula, nodes: &[Registered]) -> Automaton {
    let mut automaton = Automaton {
        initial: Vec::new(),
        states: vec![State::default(); nodes.len()],
        accept: Vec::new(),
    };

    for (i, n) in nodes.iter().enumerate() {
        let id = StateId::new(i);

        // Convert incoming to outgoing edges.
        for inc in &n.incoming {
            match inc {
                None => automaton.initial.push(id),
                Some(j) => automaton.states[*j].outgoing.push(id),
            }
        }

        automaton.states[i].guard = n
            .old
            .iter()
            .filter_map(|&f| match ltl.node(f) {
                Node::Atom(s) => Some(Literal {
                    name: ltl.name(s),
                    positive: true,
                }),
                Node::NotAtom(a) => match ltl.node(a) {
                    Node::Atom(s) => Some(Literal {
                        name: ltl.name(s),
                        positive: false,
                    }),
                    other => panic!("Negated atom {} wraps non-atomic {:?}", f, other),
                },
                _ => None,
            })
            .collect();
    }

    for state in &mut automaton.states {
        state.outgoing.sort();
        state.outgoing.dedup();
    }
    automaton.initial.sort();

    let untils = ltl.untils(formula);
    for &u in &untils {
        let Node::Until(_, b) = ltl.node(u) else {
            unreachable!("untils() returned a non-until formula");
        };
        let set: BitSet = nodes
            .iter()
            .enumerate()
            // `true` is never recorded in `old`.
            .filter(|(_, n)| !n.old.contains(&u) || ltl.is_true(b) || n.old.contains(&b))
            .map(|(i, _)| i)
            .collect();
        automaton.accept.push(set);
    }
    if untils.is_empty() {
        // Every cycle is accepting.
        automaton.accept.push(BitSet::full(nodes.len()));
    }

    automaton
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use test_log::test;

    use super::*;
    use crate::parser::parse;

    fn translate(src: &str) -> (Ltl, Formula, Automaton) {
        let ltl = Ltl::default();
        let f = parse(&ltl, src).unwrap();
        let automaton = Automaton::from_ltl(&ltl, f);
        (ltl, f, automaton)
    }

    fn guard_names(automaton: &Automaton, id: StateId) -> Vec<String> {
        automaton.state(id).guard.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_atom() {
        let (_, _, automaton) = translate("p");

        // One state demanding p, followed by an unconstrained state looping forever.
        assert_eq!(automaton.num_states(), 2);
        assert_eq!(automaton.initial().len(), 1);
        let first = automaton.initial()[0];
        assert_eq!(guard_names(&automaton, first), vec!["p"]);

        let rest = automaton.state(first).outgoing[0];
        assert!(automaton.state(rest).guard.is_empty());
        assert_eq!(automaton.state(rest).outgoing, vec![rest]);
    }

    #[test]
    fn test_false_has_no_states() {
        let (_, _, automaton) = translate("false");
        assert_eq!(automaton.num_states(), 0);
        assert!(automaton.initial().is_empty());
        assert_eq!(automaton.num_accept_sets(), 1);
    }

    #[test]
    fn test_contradiction_is_dropped() {
        let (_, _, automaton) = translate("p and not p");
        assert_eq!(automaton.num_states(), 0);
    }

    #[test]
    fn test_globally() {
        let (_, _, automaton) = translate("globally p");

        assert_eq!(automaton.num_states(), 1);
        let q = automaton.initial()[0];
        assert_eq!(guard_names(&automaton, q), vec!["p"]);
        assert_eq!(automaton.state(q).outgoing, vec![q]);
    }

    #[test]
    fn test_next() {
        let (_, _, automaton) = translate("next p");

        let first = automaton.initial()[0];
        assert!(automaton.state(first).guard.is_empty());
        let second = automaton.state(first).outgoing[0];
        assert_eq!(guard_names(&automaton, second), vec!["p"]);
    }

    #[test]
    fn test_or_branches() {
        let (_, _, automaton) = translate("p or q");
        let guards: BTreeSet<Vec<String>> =
            automaton.initial().iter().map(|&id| guard_names(&automaton, id)).collect();
        assert_eq!(guards, BTreeSet::from([vec!["p".to_string()], vec!["q".to_string()]]));
    }

    #[test]
    fn test_until_acceptance() {
        let (ltl, f, automaton) = translate("p until q");
        let Node::Until(_, q) = ltl.node(f) else { panic!() };
        assert_eq!(automaton.num_accept_sets(), 1);

        // Every state still promising `p U q` without `q` is outside the acceptance set.
        for id in automaton.state_ids() {
            let guard = guard_names(&automaton, id);
            let accepting = automaton.is_accepting(0, id);
            if guard == vec!["p"] {
                assert!(!accepting, "{} defers q forever", id);
            } else {
                assert!(accepting, "{} ({:?}) should be accepting", id, guard);
            }
        }
        assert!(ltl.closure(f).contains(&q));
    }

    #[test]
    fn test_until_true_is_always_fulfilled() {
        for src in ["globally finally true", "globally (p until true)"] {
            let (ltl, f, automaton) = translate(src);
            assert_eq!(ltl.untils(f).len(), 1, "{}", src);
            assert!(automaton.num_states() > 0);
            assert_eq!(automaton.num_accept_sets(), 1);
            assert_eq!(automaton.accept()[0], BitSet::full(automaton.num_states()), "{}", src);
        }
    }

    #[test]
    fn test_acceptance_fallback() {
        let (_, _, automaton) = translate("globally (p or next q)");
        assert_eq!(automaton.num_accept_sets(), 1);
        assert_eq!(automaton.accept()[0], BitSet::full(automaton.num_states()));
    }

    #[test]
    fn test_one_set_per_until() {
        let (_, _, automaton) = translate("(globally finally p) and (a until b)");
        assert_eq!(automaton.num_accept_sets(), 2);
    }

    #[test]
    fn test_state_bound() {
        for src in [
            "p",
            "not (globally finally green)",
            "globally (req or next (ack until done))",
            "(a until b) release (next c and finally d)",
        ] {
            let (ltl, f, automaton) = translate(src);
            assert!(BigUint::from(automaton.num_states()) <= ltl.state_bound(f), "{}", src);
        }
    }

    #[test]
    fn test_edges_are_sorted_and_unique() {
        let (_, _, automaton) = translate("globally finally (p and next q)");
        for state in automaton.states() {
            let mut sorted = state.outgoing.clone();
            sorted.dedup();
            assert!(state.outgoing.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(sorted, state.outgoing);
        }
    }
}
