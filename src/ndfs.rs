//! Emptiness check by nested depth-first search.
//!
//! The classic two-phase search of Courcoubetis, Vardi, Wolper and
//! Yannakakis, in the colored formulation of Schwoon and Esparza ("A Note on
//! On-The-Fly Verification Algorithms", TACAS 2005):
//!
//! - the *blue* search explores the graph depth-first; a state stays *cyan*
//!   while it is on the blue stack, and becomes *blue* when done (or *red*
//!   if it is accepting);
//! - once an accepting state is done, a *red* search from it looks for a
//!   cyan state, recoloring the blue states it passes red.
//!
//! Reaching a cyan state from an accepting one closes an accepting cycle.
//! Both phases run on an explicit stack, so the depth of the graph is not
//! limited by the native call stack.
//!
//! ```
//! use ltl_rs::ndfs::{nested_dfs, BuchiGraph};
//!
//! /// 0 -> 1 -> 2 -> 1, with 2 accepting.
//! struct Lasso;
//!
//! impl BuchiGraph for Lasso {
//!     type Node = u32;
//!     fn roots(&self) -> Vec<u32> { vec![0] }
//!     fn successors(&self, n: &u32) -> Vec<u32> { vec![if *n == 2 { 1 } else { n + 1 }] }
//!     fn is_accepting(&self, n: &u32) -> bool { *n == 2 }
//! }
//!
//! let witness = nested_dfs(&Lasso).unwrap();
//! assert_eq!(witness.prefix(), &[0]);
//! assert_eq!(witness.cycle(), &[1, 2]);
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use log::{debug, info};

/// A graph with Büchi acceptance, explored from a set of roots.
pub trait BuchiGraph {
    type Node: Clone + Eq + Hash + Debug;

    /// Successors of the conceptual initial state (which is never reported).
    fn roots(&self) -> Vec<Self::Node>;

    fn successors(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn is_accepting(&self, node: &Self::Node) -> bool;
}

/// An accepting lasso: `path[cycle_start..]` is a cycle whose last node has an
/// edge back to `path[cycle_start]`, and it contains an accepting node.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Witness<N> {
    pub path: Vec<N>,
    pub cycle_start: usize,
}

impl<N> Witness<N> {
    /// The part of the path leading to the cycle.
    pub fn prefix(&self) -> &[N] {
        &self.path[..self.cycle_start]
    }

    /// The cycle itself.
    pub fn cycle(&self) -> &[N] {
        &self.path[self.cycle_start..]
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Color {
    /// On the blue stack.
    Cyan,
    /// Explored, not accepting, not yet seen by a red search.
    Blue,
    /// Explored; no accepting cycle through it.
    Red,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Phase {
    Blue,
    /// Red search seeded at this (accepting) blue frame.
    Seed,
    Red,
}

struct Frame<N> {
    node: N,
    successors: Vec<N>,
    next: usize,
    phase: Phase,
}

/// Nested depth-first search over a [`BuchiGraph`].
pub struct NestedDfs<'g, G: BuchiGraph> {
    graph: &'g G,
    color: HashMap<G::Node, Color>,
    stack: Vec<Frame<G::Node>>,
}

impl<'g, G> NestedDfs<'g, G>
where
    G: BuchiGraph,
{
    pub fn new(graph: &'g G) -> Self {
        Self {
            graph,
            color: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Number of states colored so far.
    pub fn visited(&self) -> usize {
        self.color.len()
    }

    /// Search every root. Returns the first accepting lasso found.
    pub fn run(&mut self) -> Option<Witness<G::Node>> {
        for root in self.graph.roots() {
            if self.color.contains_key(&root) {
                continue;
            }
            if let Some(witness) = self.search(root) {
                info!(
                    "Accepting cycle found after {} states: prefix {}, cycle {}",
                    self.visited(),
                    witness.prefix().len(),
                    witness.cycle().len()
                );
                return Some(witness);
            }
        }
        info!("No accepting cycle among {} states", self.visited());
        None
    }

    fn push(&mut self, node: G::Node, phase: Phase) {
        let successors = self.graph.successors(&node);
        self.stack.push(Frame {
            node,
            successors,
            next: 0,
            phase,
        });
    }

    fn witness(&mut self, target: &G::Node) -> Witness<G::Node> {
        let cycle_start = self
            .stack
            .iter()
            .position(|f| f.phase != Phase::Red && &f.node == target)
            .unwrap_or_else(|| panic!("Cyan state {:?} is not on the blue stack", target));
        let path = self.stack.drain(..).map(|f| f.node).collect();
        Witness { path, cycle_start }
    }

    fn search(&mut self, root: G::Node) -> Option<Witness<G::Node>> {
        debug!("blue({:?})", root);
        self.color.insert(root.clone(), Color::Cyan);
        self.push(root, Phase::Blue);

        while let Some(frame) = self.stack.last_mut() {
            let Some(t) = frame.successors.get(frame.next).cloned() else {
                self.finish();
                continue;
            };
            frame.next += 1;

            let phase = frame.phase;
            let color = self.color.get(&t).copied();
            match phase {
                Phase::Blue => {
                    let s = &self.stack[self.stack.len() - 1].node;
                    if color == Some(Color::Cyan) && (self.graph.is_accepting(s) || self.graph.is_accepting(&t)) {
                        debug!("cycle closed by blue edge to {:?}", t);
                        return Some(self.witness(&t));
                    }
                    if color.is_none() {
                        debug!("blue({:?})", t);
                        self.color.insert(t.clone(), Color::Cyan);
                        self.push(t, Phase::Blue);
                    }
                }
                Phase::Seed | Phase::Red => {
                    if color == Some(Color::Cyan) {
                        debug!("cycle closed by red edge to {:?}", t);
                        return Some(self.witness(&t));
                    }
                    if color == Some(Color::Blue) {
                        debug!("red({:?})", t);
                        self.color.insert(t.clone(), Color::Red);
                        self.push(t, Phase::Red);
                    }
                }
            }
        }

        None
    }

    /// All successors of the top frame are done.
    fn finish(&mut self) {
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        match frame.phase {
            Phase::Blue if self.graph.is_accepting(&frame.node) => {
                // Run the red search before fixing the color.
                debug!("red seed {:?}", frame.node);
                frame.phase = Phase::Seed;
                frame.next = 0;
            }
            Phase::Blue => {
                let node = frame.node.clone();
                self.color.insert(node, Color::Blue);
                self.stack.pop();
            }
            Phase::Seed => {
                let node = frame.node.clone();
                self.color.insert(node, Color::Red);
                self.stack.pop();
            }
            Phase::Red => {
                self.stack.pop();
            }
        }
    }
}

/// Look for an accepting cycle reachable from the roots of `graph`.
///
/// Returns `None` when the language of the graph is empty.
pub fn nested_dfs<G: BuchiGraph>(graph: &G) -> Option<Witness<G::Node>> {
    NestedDfs::new(graph).run()
}
