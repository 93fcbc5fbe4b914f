//! Labeled generalized Büchi automata.
//!
//! States carry the guard (a conjunction of literals over atomic
//! propositions) that the model state *entering* them must satisfy; edges
//! carry no label of their own. The automaton has an initial pseudo-state
//! which is not a real state: only its outgoing edges ([`Automaton::initial`])
//! are stored.
//!
//! Acceptance is generalized: a run is accepting when it visits every
//! acceptance set infinitely often.

use std::fmt::{Display, Formatter};

use crate::bitset::BitSet;

/// Index of an automaton state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StateId(u32);

impl StateId {
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for StateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Signed atomic proposition.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Literal {
    pub name: String,
    pub positive: bool,
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.positive {
            write!(f, "{}", self.name)
        } else {
            write!(f, "!{}", self.name)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct State {
    /// Literals the entering model state must satisfy.
    pub guard: Vec<Literal>,
    /// Successor states, sorted and without duplicates.
    pub outgoing: Vec<StateId>,
}

impl State {
    /// Evaluate the guard against the propositions that hold in a model state.
    pub fn eval(&self, holds: impl Fn(&str) -> bool) -> bool {
        self.guard.iter().all(|lit| holds(&lit.name) == lit.positive)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Automaton {
    pub(crate) initial: Vec<StateId>,
    pub(crate) states: Vec<State>,
    pub(crate) accept: Vec<BitSet>,
}

impl Automaton {
    /// Outgoing edges of the initial pseudo-state.
    pub fn initial(&self) -> &[StateId] {
        &self.initial
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateId> {
        (0..self.states.len()).map(StateId::new)
    }

    /// The ordered list of acceptance sets. Never empty.
    pub fn accept(&self) -> &[BitSet] {
        &self.accept
    }

    pub fn num_accept_sets(&self) -> usize {
        self.accept.len()
    }

    /// Whether `id` belongs to the acceptance set with index `set`.
    pub fn is_accepting(&self, set: usize, id: StateId) -> bool {
        self.accept[set].contains(id.index())
    }

    /// Indices of all acceptance sets containing `id`.
    pub fn accept_sets_of(&self, id: StateId) -> Vec<usize> {
        (0..self.accept.len()).filter(|&i| self.is_accepting(i, id)).collect()
    }
}
