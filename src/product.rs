//! Synchronous product of a Büchi automaton and a transition system.
//!
//! The product has a transition `(q, s, i) -> (p, t, j)` when the model has
//! `s -> t`, the automaton has `q -> p`, and the labels of `t` satisfy the
//! guard of `p`. The very first step pairs the model's initial state with the
//! automaton's initial edges.
//!
//! Generalized acceptance with `N` sets is reduced to plain Büchi acceptance
//! by the counting construction: the counter `i` names the acceptance set
//! currently awaited and advances to `(i + 1) mod N` whenever the *current*
//! automaton state `q` belongs to set `i`. A product state is accepting when
//! its counter is `0` and its automaton state belongs to set `0`.

use std::fmt::{Debug, Display, Formatter};

use crate::automaton::{Automaton, StateId};
use crate::bitset::BitSet;
use crate::ndfs::BuchiGraph;
use crate::system::{ActionId, LabelId, TransitionSystem};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ProductState<S> {
    pub buchi: StateId,
    pub model: S,
    /// Index of the acceptance set awaited next.
    pub count: usize,
}

impl<S: Debug> Display for ProductState<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {:?}, {})", self.buchi, self.model, self.count)
    }
}

pub struct Product<'a, T> {
    automaton: &'a Automaton,
    system: T,
    /// Guard of every automaton state, resolved against the model's labels.
    /// `None` marks a proposition the model does not know (never true).
    guards: Vec<Vec<(Option<LabelId>, bool)>>,
}

impl<'a, T> Product<'a, T>
where
    T: TransitionSystem,
{
    pub fn new(automaton: &'a Automaton, system: T) -> Self {
        let vocabulary = system.vocabulary();
        let guards = automaton
            .states()
            .iter()
            .map(|state| {
                state
                    .guard
                    .iter()
                    .map(|lit| (vocabulary.label_id(&lit.name), lit.positive))
                    .collect()
            })
            .collect();

        Self {
            automaton,
            system,
            guards,
        }
    }

    pub fn automaton(&self) -> &Automaton {
        self.automaton
    }

    pub fn system(&self) -> &T {
        &self.system
    }

    /// Whether the model labels satisfy the guard of automaton state `q`.
    pub fn eval(&self, q: StateId, labels: &BitSet) -> bool {
        self.guards[q.index()]
            .iter()
            .all(|&(label, positive)| label.is_some_and(|l| labels.contains(l.index())) == positive)
    }

    /// Successors of `src`, or of the conceptual initial state when `src` is `None`.
    pub fn next_states(&self, src: Option<&ProductState<T::State>>) -> Vec<(ProductState<T::State>, Option<ActionId>)> {
        let (successors, outgoing, count) = match src {
            None => (
                vec![(self.system.initial_state(), None)],
                self.automaton.initial(),
                0,
            ),
            Some(src) => (
                self.system.next_states(&src.model),
                self.automaton.state(src.buchi).outgoing.as_slice(),
                self.next_count(src),
            ),
        };

        let mut result = Vec::new();
        for (model, action) in successors {
            let labels = self.system.labels(&model);
            for &q in outgoing {
                if self.eval(q, &labels) {
                    result.push((
                        ProductState {
                            buchi: q,
                            model: model.clone(),
                            count,
                        },
                        action,
                    ));
                }
            }
        }
        result
    }

    /// Counter carried by every successor of `src`.
    pub fn next_count(&self, src: &ProductState<T::State>) -> usize {
        if self.automaton.is_accepting(src.count, src.buchi) {
            (src.count + 1) % self.automaton.num_accept_sets()
        } else {
            src.count
        }
    }

    pub fn is_accepting(&self, state: &ProductState<T::State>) -> bool {
        state.count == 0 && self.automaton.is_accepting(0, state.buchi)
    }
}

impl<T> BuchiGraph for Product<'_, T>
where
    T: TransitionSystem,
{
    type Node = ProductState<T::State>;

    fn roots(&self) -> Vec<Self::Node> {
        self.next_states(None).into_iter().map(|(s, _)| s).collect()
    }

    fn successors(&self, node: &Self::Node) -> Vec<Self::Node> {
        self.next_states(Some(node)).into_iter().map(|(s, _)| s).collect()
    }

    fn is_accepting(&self, node: &Self::Node) -> bool {
        Product::is_accepting(self, node)
    }
}
