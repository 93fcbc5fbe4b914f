//! Partial-order reduction with stubborn sets.
//!
//! In every state only a *stubborn* subset of the enabled actions is
//! explored. The set is closed under two rules:
//!
//! - an enabled action drags in every action it does not accord with;
//! - a disabled action drags in the necessary enabling set of one of its
//!   unsatisfied guards.
//!
//! The guard is chosen by cost: every action carries a score (low for
//! disabled actions, high for enabled ones, zero once in the set), and the
//! cost of a label is the sum of the scores of the actions enabling it. The
//! cheapest guard adds the fewest new enabled actions.
//!
//! Preserving a next-free property needs two more conditions. Once an
//! enabled *visible* action (one that may change a label the property
//! observes) joins the set, every visible action joins. And no cycle of the
//! reduced state space may consist of reduced states only: [`Por`] expands a
//! state fully when one of its reduced successors was expanded before it.

use std::cell::RefCell;
use std::collections::HashMap;

use log::debug;

use crate::bitset::BitSet;
use crate::system::{ActionId, LabelId, TransitionSystem, Vocabulary};

/// Score of a disabled action.
const DISABLED_SCORE: usize = 1;

/// Mutable state of the stubborn set computation for one vocabulary.
#[derive(Debug, Clone)]
pub struct Stubborn {
    scores: RefCell<Vec<usize>>,
    costs: RefCell<Vec<usize>>,
}

impl Stubborn {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        Self {
            scores: RefCell::new(vec![0; vocabulary.num_actions()]),
            costs: RefCell::new(vec![0; vocabulary.num_labels()]),
        }
    }

    pub fn score(&self, a: ActionId) -> usize {
        self.scores.borrow()[a.index()]
    }

    /// Sum of the scores of the actions in the necessary enabling set of `l`.
    pub fn cost(&self, l: LabelId) -> usize {
        self.costs.borrow()[l.index()]
    }

    /// Set the score of `a`, updating the cost of every label it enables.
    pub fn set_score(&self, vocabulary: &Vocabulary, a: ActionId, score: usize) {
        let old = std::mem::replace(&mut self.scores.borrow_mut()[a.index()], score);
        if old == score {
            return;
        }
        let mut costs = self.costs.borrow_mut();
        for l in vocabulary.enables(a) {
            costs[l] = costs[l] - old + score;
        }
    }

    /// Actions whose guards all hold in `labels`, and the first of them.
    ///
    /// Also resets the score of every action.
    pub fn enabled(&self, vocabulary: &Vocabulary, labels: &BitSet) -> (BitSet, Option<ActionId>) {
        let mut enabled = BitSet::empty();
        let mut some = None;
        for a in vocabulary.action_ids() {
            if !vocabulary.action(a).guards.is_subset(labels) {
                self.set_score(vocabulary, a, DISABLED_SCORE);
                continue;
            }
            self.set_score(vocabulary, a, vocabulary.num_actions());
            enabled.insert(a.index());
            some.get_or_insert(a);
        }
        (enabled, some)
    }

    /// Stubborn set of a state with the given labels, restricted to the enabled actions.
    ///
    /// Empty exactly when no action is enabled.
    pub fn stubborn(&self, vocabulary: &Vocabulary, labels: &BitSet) -> BitSet {
        self.stubborn_visible(vocabulary, labels, &BitSet::empty())
    }

    /// Like [`Stubborn::stubborn`], but an enabled action from `visible` pulls in all of `visible`.
    pub fn stubborn_visible(&self, vocabulary: &Vocabulary, labels: &BitSet, visible: &BitSet) -> BitSet {
        let mut stubborn = BitSet::empty();
        let (enabled, some) = self.enabled(vocabulary, labels);
        let Some(some) = some else {
            return stubborn;
        };

        let mut queue = BitSet::empty();
        queue.insert(some.index());
        let mut sees_visible = false;
        while let Some(i) = queue.pop_first() {
            let a = ActionId::new(i);
            self.set_score(vocabulary, a, 0);
            stubborn.insert(i);

            if enabled.contains(i) {
                queue.union_with(&vocabulary.dna(a).difference(&stubborn));
                if !sees_visible && visible.contains(i) {
                    sees_visible = true;
                    queue.union_with(&visible.difference(&stubborn));
                }
            } else {
                let guard = self.cheapest_unsatisfied_guard(vocabulary, a, labels);
                queue.union_with(&vocabulary.nes(guard).difference(&stubborn));
            }
        }

        stubborn.intersect_with(&enabled);
        debug!("stubborn set {:?} of {} enabled", stubborn, enabled.len());
        stubborn
    }

    fn cheapest_unsatisfied_guard(&self, vocabulary: &Vocabulary, a: ActionId, labels: &BitSet) -> LabelId {
        let mut best: Option<(LabelId, usize)> = None;
        for g in vocabulary.action(a).guards.iter() {
            if labels.contains(g) {
                continue;
            }
            let g = LabelId::new(g);
            let cost = self.cost(g);
            if best.map_or(true, |(_, c)| cost < c) {
                best = Some((g, cost));
            }
            if cost == 0 {
                break;
            }
        }
        match best {
            Some((g, _)) => g,
            None => panic!("Disabled action {} has no unsatisfied guard", vocabulary.action(a).name),
        }
    }
}

/// A transition system restricted to stubborn sets.
///
/// Successors without an action are always kept. States where no action of
/// the vocabulary is enabled keep all their successors.
pub struct Por<T>
where
    T: TransitionSystem,
{
    system: T,
    stubborn: Stubborn,
    /// Visible actions.
    visible: BitSet,
    /// Expanded states mapped to whether they were expanded fully.
    /// `None` when no cycle proviso applies.
    expanded: Option<RefCell<HashMap<T::State, bool>>>,
}

impl<T> Por<T>
where
    T: TransitionSystem,
{
    /// Reduction preserving deadlocks.
    pub fn new(system: T) -> Self {
        let stubborn = Stubborn::new(system.vocabulary());
        Self {
            system,
            stubborn,
            visible: BitSet::empty(),
            expanded: None,
        }
    }

    /// Reduction preserving next-free properties over `labels`.
    pub fn observing(system: T, labels: &BitSet) -> Self {
        let stubborn = Stubborn::new(system.vocabulary());
        let visible = system.vocabulary().visible(labels);
        debug!("visible actions {:?} for labels {:?}", visible, labels);
        Self {
            system,
            stubborn,
            visible,
            expanded: Some(RefCell::new(HashMap::new())),
        }
    }

    pub fn inner(&self) -> &T {
        &self.system
    }

    /// Stubborn set of `state`.
    pub fn stubborn_set(&self, state: &T::State) -> BitSet {
        let labels = self.system.labels(state);
        self.stubborn.stubborn_visible(self.system.vocabulary(), &labels, &self.visible)
    }

    /// Whether `state` must be expanded fully because its reduced successors
    /// may close a cycle. The decision is made once per state.
    fn needs_full_expansion(&self, state: &T::State, reduced: &[(T::State, Option<ActionId>)]) -> bool {
        let Some(expanded) = &self.expanded else {
            return false;
        };
        let mut expanded = expanded.borrow_mut();
        if let Some(&full) = expanded.get(state) {
            return full;
        }
        // Registered first so that a self-loop counts.
        expanded.insert(state.clone(), false);
        let full = reduced.iter().any(|(s, _)| expanded.contains_key(s));
        if full {
            debug!("fully expand {:?}", state);
            expanded.insert(state.clone(), true);
        }
        full
    }
}

impl<T> TransitionSystem for Por<T>
where
    T: TransitionSystem,
{
    type State = T::State;

    fn initial_state(&self) -> Self::State {
        self.system.initial_state()
    }

    fn next_states(&self, state: &Self::State) -> Vec<(Self::State, Option<ActionId>)> {
        let successors = self.system.next_states(state);
        let stubborn = self.stubborn_set(state);
        if stubborn.is_empty() {
            return successors;
        }
        let reduced: Vec<_> = successors
            .iter()
            .filter(|(_, action)| action.map_or(true, |a| stubborn.contains(a.index())))
            .cloned()
            .collect();
        if self.needs_full_expansion(state, &reduced) {
            return successors;
        }
        reduced
    }

    fn labels(&self, state: &Self::State) -> BitSet {
        self.system.labels(state)
    }

    fn vocabulary(&self) -> &Vocabulary {
        self.system.vocabulary()
    }
}
