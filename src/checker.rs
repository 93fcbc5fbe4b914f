//! End-to-end model checking.
//!
//! [`Checker::check`] decides whether every run of a transition system
//! satisfies an LTL property: it translates the *negated* property into a
//! Büchi automaton, builds the product with the system (optionally reduced
//! by stubborn sets) and looks for an accepting cycle. An accepting cycle is
//! a run violating the property.
//!
//! Reduction only applies to next-free formulas. With `next` the full state
//! space is explored.
//!
//! ```
//! use ltl_rs::checker::{Checker, CheckerConfig};
//! use ltl_rs::formula::Ltl;
//! use ltl_rs::parser::parse;
//! use ltl_rs::stoplight::Stoplight;
//!
//! let ltl = Ltl::default();
//! let property = parse(&ltl, "globally finally green").unwrap();
//! let checker = Checker::new(CheckerConfig::default());
//!
//! assert!(checker.check(&ltl, property, Stoplight::regular()).holds());
//! assert!(!checker.check(&ltl, property, Stoplight::eco()).holds());
//! ```

use log::{info, warn};

use crate::automaton::Automaton;
use crate::formula::{Formula, Ltl};
use crate::ndfs::{nested_dfs, Witness};
use crate::product::{Product, ProductState};
use crate::reduction::Por;
use crate::bitset::BitSet;
use crate::system::{TransitionSystem, Vocabulary};

#[derive(Debug, Clone, Default)]
pub struct CheckerConfig {
    /// Explore only stubborn sets for next-free formulas (default: false).
    pub reduction: bool,
}

/// A lasso-shaped run through the product.
pub type Trace<S> = Witness<ProductState<S>>;

/// Outcome of [`Checker::check`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Verdict<S> {
    Holds,
    /// Counterexample: a run of the system violating the property.
    Violated(Trace<S>),
}

impl<S> Verdict<S> {
    pub fn holds(&self) -> bool {
        matches!(self, Verdict::Holds)
    }

    pub fn counterexample(&self) -> Option<&Trace<S>> {
        match self {
            Verdict::Holds => None,
            Verdict::Violated(trace) => Some(trace),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Checker {
    config: CheckerConfig,
}

impl Checker {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check that every run of `system` satisfies `property`.
    pub fn check<T: TransitionSystem>(&self, ltl: &Ltl, property: Formula, system: T) -> Verdict<T::State> {
        info!("Checking {}", ltl.display(property));
        match self.find(ltl, ltl.negate(property), system) {
            None => Verdict::Holds,
            Some(trace) => Verdict::Violated(trace),
        }
    }

    /// Look for a run of `system` satisfying `formula`.
    pub fn find<T: TransitionSystem>(&self, ltl: &Ltl, formula: Formula, system: T) -> Option<Trace<T::State>> {
        let automaton = Automaton::from_ltl(ltl, formula);
        if self.config.reduction {
            if ltl.is_next_free(formula) {
                let labels = observed_labels(ltl, formula, system.vocabulary());
                return nested_dfs(&Product::new(&automaton, Por::observing(system, &labels)));
            }
            warn!("Not reducing: {} uses next", ltl.display(formula));
        }
        nested_dfs(&Product::new(&automaton, system))
    }
}

/// Labels of `vocabulary` occurring in `formula`.
fn observed_labels(ltl: &Ltl, formula: Formula, vocabulary: &Vocabulary) -> BitSet {
    ltl.atoms(formula)
        .iter()
        .filter_map(|name| vocabulary.label_id(name))
        .map(|l| l.index())
        .collect()
}

/// The model states along a trace.
pub fn model_path<S: Clone>(trace: &Trace<S>) -> Vec<S> {
    trace.path.iter().map(|s| s.model.clone()).collect()
}
