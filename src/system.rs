//! The contract between the checker and a model.
//!
//! A model is a [`TransitionSystem`]: an initial state, a successor
//! function tagging each transition with the action that caused it (if
//! known), and the set of labels (atomic propositions) that hold in a state.
//!
//! The [`Vocabulary`] names the model's actions and labels and carries the
//! static relations partial-order reduction needs: action guards, read and
//! written variables, commuting actions, necessary enabling sets, coenabled
//! labels. Every relation is optional; unknown information is treated
//! conservatively by the derived relations.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

use crate::bitset::BitSet;

/// Identifier of an action in a [`Vocabulary`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ActionId(u32);

impl ActionId {
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a label (atomic proposition) in a [`Vocabulary`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LabelId(u32);

impl LabelId {
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for ActionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "a{}", self.0)
    }
}

impl Display for LabelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "l{}", self.0)
    }
}

pub trait TransitionSystem {
    type State: Clone + Eq + Hash + Debug;

    fn initial_state(&self) -> Self::State;

    /// Successors of `state`, each with the action that produced it.
    ///
    /// The result must be finite. Its order does not affect correctness.
    fn next_states(&self, state: &Self::State) -> Vec<(Self::State, Option<ActionId>)>;

    /// Labels (indices into the vocabulary) holding in `state`.
    fn labels(&self, state: &Self::State) -> BitSet;

    fn vocabulary(&self) -> &Vocabulary;
}

impl<T> TransitionSystem for &T
where
    T: TransitionSystem + ?Sized,
{
    type State = T::State;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }
    fn next_states(&self, state: &Self::State) -> Vec<(Self::State, Option<ActionId>)> {
        (**self).next_states(state)
    }
    fn labels(&self, state: &Self::State) -> BitSet {
        (**self).labels(state)
    }
    fn vocabulary(&self) -> &Vocabulary {
        (**self).vocabulary()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Action {
    pub name: String,
    /// Labels that must all hold for the action to be enabled.
    pub guards: BitSet,
    /// Variables read.
    pub reads: Option<BitSet>,
    /// Variables possibly written.
    pub writes: Option<BitSet>,
    /// Actions known to commute with this one.
    pub commute: Option<BitSet>,
    /// Explicit do-not-accord set; overrides the derived one.
    pub dna: Option<BitSet>,
}

#[derive(Debug, Clone, Default)]
pub struct Label {
    pub name: String,
    /// Explicit necessary enabling set; overrides the derived one.
    pub nes: Option<BitSet>,
    /// Necessary disabling set: actions that may make the label false.
    pub nds: Option<BitSet>,
    /// Labels that may hold together with this one.
    pub coenable: Option<BitSet>,
    /// Variables the label depends on.
    pub tests: Option<BitSet>,
}

#[derive(Debug, Clone, Default)]
struct Derived {
    tests: Vec<OnceCell<Option<BitSet>>>,
    vars: Vec<OnceCell<Option<BitSet>>>,
    coenable: Vec<OnceCell<Option<BitSet>>>,
    dna: Vec<OnceCell<BitSet>>,
    nes: Vec<OnceCell<BitSet>>,
    nds: Vec<OnceCell<BitSet>>,
    enables: OnceCell<Vec<BitSet>>,
}

impl Derived {
    fn new(num_actions: usize, num_labels: usize) -> Self {
        Self {
            tests: vec![OnceCell::new(); num_actions],
            vars: vec![OnceCell::new(); num_actions],
            coenable: vec![OnceCell::new(); num_actions],
            dna: vec![OnceCell::new(); num_actions],
            nes: vec![OnceCell::new(); num_labels],
            nds: vec![OnceCell::new(); num_labels],
            enables: OnceCell::new(),
        }
    }
}

/// Named pool of actions and labels with their static relations.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    actions: Vec<Action>,
    labels: Vec<Label>,
    action_index: HashMap<String, ActionId>,
    label_index: HashMap<String, LabelId>,
    derived: OnceCell<Derived>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the action named `name`.
    pub fn add_action(&mut self, name: &str) -> ActionId {
        if let Some(&id) = self.action_index.get(name) {
            return id;
        }
        self.invalidate();
        let id = ActionId::new(self.actions.len());
        self.actions.push(Action {
            name: name.to_string(),
            ..Action::default()
        });
        self.action_index.insert(name.to_string(), id);
        id
    }

    /// Get or create the label named `name`.
    pub fn add_label(&mut self, name: &str) -> LabelId {
        if let Some(&id) = self.label_index.get(name) {
            return id;
        }
        self.invalidate();
        let id = LabelId::new(self.labels.len());
        self.labels.push(Label {
            name: name.to_string(),
            ..Label::default()
        });
        self.label_index.insert(name.to_string(), id);
        id
    }

    fn invalidate(&mut self) {
        self.derived = OnceCell::new();
    }

    fn derived(&self) -> &Derived {
        self.derived.get_or_init(|| Derived::new(self.actions.len(), self.labels.len()))
    }

    pub fn action(&self, id: ActionId) -> &Action {
        &self.actions[id.index()]
    }
    /// Mutable access to an action. Drops every derived relation.
    pub fn action_mut(&mut self, id: ActionId) -> &mut Action {
        self.invalidate();
        &mut self.actions[id.index()]
    }
    pub fn label(&self, id: LabelId) -> &Label {
        &self.labels[id.index()]
    }
    /// Mutable access to a label. Drops every derived relation.
    pub fn label_mut(&mut self, id: LabelId) -> &mut Label {
        self.invalidate();
        &mut self.labels[id.index()]
    }

    pub fn action_id(&self, name: &str) -> Option<ActionId> {
        self.action_index.get(name).copied()
    }
    pub fn label_id(&self, name: &str) -> Option<LabelId> {
        self.label_index.get(name).copied()
    }

    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }
    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }
    pub fn action_ids(&self) -> impl Iterator<Item = ActionId> {
        (0..self.actions.len()).map(ActionId::new)
    }
    pub fn label_ids(&self) -> impl Iterator<Item = LabelId> {
        (0..self.labels.len()).map(LabelId::new)
    }

    /// Set of labels with the given names. Panics on an unknown name.
    pub fn label_set<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> BitSet {
        names
            .into_iter()
            .map(|name| match self.label_id(name) {
                Some(id) => id.index(),
                None => panic!("Unknown label {:?}", name),
            })
            .collect()
    }
}

/// Union of `sets`, or `None` as soon as one of them is unknown.
fn union_known<'a>(sets: impl IntoIterator<Item = Option<&'a BitSet>>) -> Option<BitSet> {
    let mut result = BitSet::empty();
    for set in sets {
        result.union_with(set?);
    }
    Some(result)
}

impl Vocabulary {
    /// Variables tested by the guards of `a`.
    pub fn tests(&self, a: ActionId) -> Option<&BitSet> {
        self.derived().tests[a.index()]
            .get_or_init(|| union_known(self.guards(a).map(|l| self.labels[l].tests.as_ref())))
            .as_ref()
    }

    /// All variables `a` depends on: tested, read or written.
    pub fn vars(&self, a: ActionId) -> Option<&BitSet> {
        self.derived().vars[a.index()]
            .get_or_init(|| {
                let action = &self.actions[a.index()];
                union_known([self.tests(a), action.reads.as_ref(), action.writes.as_ref()])
            })
            .as_ref()
    }

    /// Labels that may hold together with the guards of `a`.
    pub fn coenable(&self, a: ActionId) -> Option<&BitSet> {
        self.derived().coenable[a.index()]
            .get_or_init(|| union_known(self.guards(a).map(|l| self.labels[l].coenable.as_ref())))
            .as_ref()
    }

    fn guards(&self, a: ActionId) -> impl Iterator<Item = usize> + '_ {
        self.actions[a.index()].guards.iter()
    }

    /// Whether `a` and `b` can be freely reordered.
    ///
    /// Holds when the shared variables are not written by either action,
    /// when `b` is guarded by labels never coenabled with the guards of `a`,
    /// or when `b` is declared to commute with `a`.
    pub fn accords(&self, a: ActionId, b: ActionId) -> bool {
        let action = &self.actions[a.index()];
        if action.dna.as_ref().is_some_and(|dna| dna.contains(b.index())) {
            return false;
        }

        if let (Some(va), Some(vb)) = (self.vars(a), self.vars(b)) {
            if !va.is_empty() && !vb.is_empty() {
                let shared = va.intersection(vb);
                let mut written = self.actions[a.index()].writes.clone().unwrap_or_default();
                if let Some(w) = &self.actions[b.index()].writes {
                    written.union_with(w);
                }
                if shared.is_disjoint(&written) {
                    return true;
                }
            }
        }

        if let Some(coenable) = self.coenable(a) {
            if !coenable.is_empty() && self.actions[b.index()].guards.is_disjoint(coenable) {
                return true;
            }
        }

        action.commute.as_ref().is_some_and(|c| c.contains(b.index()))
    }

    /// Do-not-accord set of `a`: every action not according with it.
    pub fn dna(&self, a: ActionId) -> &BitSet {
        self.derived().dna[a.index()].get_or_init(|| match &self.actions[a.index()].dna {
            Some(dna) => dna.clone(),
            None => self
                .action_ids()
                .filter(|&b| !self.accords(a, b))
                .map(ActionId::index)
                .collect(),
        })
    }

    /// Necessary enabling set of `l`: actions that may make it true.
    ///
    /// Derived from the variables the label tests and the actions write;
    /// when either is unknown the action is assumed to be relevant.
    pub fn nes(&self, l: LabelId) -> &BitSet {
        self.derived().nes[l.index()].get_or_init(|| {
            match &self.labels[l.index()].nes {
                Some(nes) => nes.clone(),
                None => self.writers(l),
            }
        })
    }

    /// Necessary disabling set of `l`: actions that may make it false.
    pub fn nds(&self, l: LabelId) -> &BitSet {
        self.derived().nds[l.index()].get_or_init(|| match &self.labels[l.index()].nds {
            Some(nds) => nds.clone(),
            None => self.writers(l),
        })
    }

    /// Actions writing a variable `l` tests, or every action when either side is unknown.
    fn writers(&self, l: LabelId) -> BitSet {
        let tests = &self.labels[l.index()].tests;
        self.action_ids()
            .filter(|&a| match (tests, &self.actions[a.index()].writes) {
                (Some(tests), Some(writes)) => !tests.is_disjoint(writes),
                _ => true,
            })
            .map(ActionId::index)
            .collect()
    }

    /// Visible actions for the given labels: those that may change the truth of one of them.
    pub fn visible(&self, labels: &BitSet) -> BitSet {
        let mut visible = BitSet::empty();
        for l in labels.iter().map(LabelId::new) {
            visible.union_with(self.nes(l));
            visible.union_with(self.nds(l));
        }
        visible
    }

    /// Labels whose necessary enabling set contains `a`.
    pub fn enables(&self, a: ActionId) -> &BitSet {
        let enables = self.derived().enables.get_or_init(|| {
            let mut enables = vec![BitSet::empty(); self.actions.len()];
            for l in self.label_ids() {
                for b in self.nes(l) {
                    enables[b].insert(l.index());
                }
            }
            enables
        });
        &enables[a.index()]
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn set(items: &[usize]) -> BitSet {
        items.iter().copied().collect()
    }

    /// Two processes each incrementing a private variable, plus one writing a shared one.
    fn vocabulary() -> (Vocabulary, [ActionId; 3]) {
        let mut voc = Vocabulary::new();
        let a = voc.add_action("inc_x");
        let b = voc.add_action("inc_y");
        let c = voc.add_action("set_x");

        let ready = voc.add_label("ready");
        voc.label_mut(ready).tests = Some(set(&[2]));

        let mut access = |id: ActionId, reads: &[usize], writes: &[usize]| {
            let action = voc.action_mut(id);
            action.reads = Some(set(reads));
            action.writes = Some(set(writes));
        };
        access(a, &[0], &[0]);
        access(b, &[1], &[1]);
        access(c, &[], &[0]);
        (voc, [a, b, c])
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut voc = Vocabulary::new();
        let a = voc.add_action("a");
        assert_eq!(voc.add_action("a"), a);
        let l = voc.add_label("l");
        assert_eq!(voc.add_label("l"), l);
        assert_eq!(voc.label_id("l"), Some(l));
        assert_eq!(voc.action_id("missing"), None);
        assert_eq!(voc.label_set(["l"]), set(&[0]));
    }

    #[test]
    fn test_accords_by_variables() {
        let (voc, [a, b, c]) = vocabulary();
        assert!(voc.accords(a, b));
        assert!(voc.accords(b, a));
        assert!(!voc.accords(a, c));
        assert!(!voc.accords(a, a));
        assert_eq!(voc.dna(a), &set(&[a.index(), c.index()]));
        assert_eq!(voc.dna(b), &set(&[b.index()]));
    }

    #[test]
    fn test_accords_by_commute() {
        let (mut voc, [a, _, c]) = vocabulary();
        voc.action_mut(a).commute = Some(set(&[c.index()]));
        assert!(voc.accords(a, c));
        assert!(!voc.dna(a).contains(c.index()));
    }

    #[test]
    fn test_accords_by_coenable() {
        let mut voc = Vocabulary::new();
        let a = voc.add_action("a");
        let b = voc.add_action("b");
        let p = voc.add_label("p");
        let q = voc.add_label("q");
        voc.label_mut(p).coenable = Some(set(&[p.index()]));
        voc.action_mut(a).guards = set(&[p.index()]);
        voc.action_mut(b).guards = set(&[q.index()]);

        // Unknown variables, but b's guard never holds together with a's.
        assert!(voc.accords(a, b));
        assert!(!voc.accords(b, a));
    }

    #[test]
    fn test_explicit_dna_wins() {
        let (mut voc, [a, b, _]) = vocabulary();
        voc.action_mut(a).dna = Some(set(&[b.index()]));
        assert!(!voc.accords(a, b));
        assert_eq!(voc.dna(a), &set(&[b.index()]));
    }

    #[test]
    fn test_unknown_variables_do_not_accord() {
        let mut voc = Vocabulary::new();
        let a = voc.add_action("a");
        let b = voc.add_action("b");
        assert!(!voc.accords(a, b));
    }

    #[test]
    fn test_nes_derived_from_tests() {
        let (mut voc, [a, b, c]) = vocabulary();
        let ready = voc.label_id("ready").unwrap();
        voc.action_mut(c).writes = Some(set(&[0, 2]));

        assert_eq!(voc.nes(ready), &set(&[c.index()]));
        assert!(voc.enables(c).contains(ready.index()));
        assert!(voc.enables(a).is_empty());
        assert!(voc.enables(b).is_empty());
    }

    #[test]
    fn test_nes_unknown_tests_is_everything() {
        let mut voc = Vocabulary::new();
        voc.add_action("a");
        voc.add_action("b");
        let l = voc.add_label("l");
        assert_eq!(voc.nes(l), &set(&[0, 1]));
    }

    #[test]
    fn test_visible_actions() {
        let (mut voc, [a, b, c]) = vocabulary();
        let ready = voc.label_id("ready").unwrap();
        voc.action_mut(c).writes = Some(set(&[0, 2]));
        let only_a = voc.add_label("only_a");
        voc.label_mut(only_a).nds = Some(set(&[a.index()]));
        voc.label_mut(only_a).tests = Some(set(&[1]));

        assert_eq!(voc.nds(ready), &set(&[c.index()]));
        assert_eq!(voc.visible(&set(&[ready.index()])), set(&[c.index()]));
        // b writes what only_a tests, a is declared to disable it.
        assert_eq!(voc.visible(&set(&[only_a.index()])), set(&[a.index(), b.index()]));
        assert!(voc.visible(&BitSet::empty()).is_empty());
    }

    #[test]
    fn test_derived_sets() {
        let (mut voc, [a, _, c]) = vocabulary();
        let ready = voc.label_id("ready").unwrap();
        voc.action_mut(a).guards = set(&[ready.index()]);

        assert_eq!(voc.tests(a), Some(&set(&[2])));
        assert_eq!(voc.vars(a), Some(&set(&[0, 2])));
        assert_eq!(voc.coenable(a), None);
        assert_eq!(voc.tests(c), Some(&BitSet::empty()));
    }
}
