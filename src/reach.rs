//! Explicit reachability over a transition system.
//!
//! [`Reach`] is an iterator yielding every state reachable from the initial
//! state exactly once, in depth-first order. Visited states are kept in a
//! pluggable [`StateSet`]: a plain [`HashSet`] or the compressed
//! [`TreeSet`][crate::treeset::TreeSet].
//!
//! ```
//! use ltl_rs::reach::Reach;
//! use ltl_rs::stoplight::Stoplight;
//!
//! let states: Vec<_> = Reach::new(Stoplight::regular()).collect();
//! assert_eq!(states.len(), 2);
//! ```

use std::collections::HashSet;
use std::hash::Hash;

use log::info;

use crate::system::TransitionSystem;

/// Set of visited states.
pub trait StateSet<S> {
    /// Add `state`; returns `true` if it was not present.
    fn insert(&mut self, state: S) -> bool;

    fn contains(&self, state: &S) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> StateSet<S> for HashSet<S>
where
    S: Eq + Hash,
{
    fn insert(&mut self, state: S) -> bool {
        HashSet::insert(self, state)
    }
    fn contains(&self, state: &S) -> bool {
        HashSet::contains(self, state)
    }
    fn len(&self) -> usize {
        HashSet::len(self)
    }
}

/// Depth-first reachability iterator.
pub struct Reach<T: TransitionSystem, V = HashSet<<T as TransitionSystem>::State>> {
    system: T,
    visited: V,
    stack: Vec<T::State>,
    deadlocks: Option<Vec<T::State>>,
    livelocks: Option<Vec<T::State>>,
}

impl<T> Reach<T>
where
    T: TransitionSystem,
{
    pub fn new(system: T) -> Self {
        Self::with_set(system, HashSet::new())
    }
}

impl<T, V> Reach<T, V>
where
    T: TransitionSystem,
    V: StateSet<T::State>,
{
    /// Explore `system`, recording visited states in `visited`.
    pub fn with_set(system: T, visited: V) -> Self {
        let stack = vec![system.initial_state()];
        Self {
            system,
            visited,
            stack,
            deadlocks: None,
            livelocks: None,
        }
    }

    /// Record states without successors.
    pub fn track_deadlocks(mut self) -> Self {
        self.deadlocks.get_or_insert_with(Vec::new);
        self
    }

    /// Record states whose only successor is themselves.
    pub fn track_livelocks(mut self) -> Self {
        self.livelocks.get_or_insert_with(Vec::new);
        self
    }

    /// Deadlocks found so far, if tracked.
    pub fn deadlocks(&self) -> Option<&[T::State]> {
        self.deadlocks.as_deref()
    }

    /// Livelocks found so far, if tracked.
    pub fn livelocks(&self) -> Option<&[T::State]> {
        self.livelocks.as_deref()
    }

    pub fn visited(&self) -> &V {
        &self.visited
    }

    pub fn system(&self) -> &T {
        &self.system
    }
}

impl<T, V> Iterator for Reach<T, V>
where
    T: TransitionSystem,
    V: StateSet<T::State>,
{
    type Item = T::State;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if self.visited.contains(&current) {
                continue;
            }

            let successors = self.system.next_states(&current);
            if successors.is_empty() {
                if let Some(deadlocks) = &mut self.deadlocks {
                    deadlocks.push(current.clone());
                }
            }
            if let [(only, _)] = successors.as_slice() {
                if *only == current {
                    if let Some(livelocks) = &mut self.livelocks {
                        livelocks.push(current.clone());
                    }
                }
            }
            self.stack.extend(successors.into_iter().map(|(s, _)| s));

            self.visited.insert(current.clone());
            return Some(current);
        }
        None
    }
}

/// Number of reachable states of `system`, logging dead- and livelocks.
pub fn count_states<T: TransitionSystem>(system: T) -> usize {
    let mut reach = Reach::new(system).track_deadlocks().track_livelocks();
    let count = reach.by_ref().count();
    info!(
        "Reached {} states, {} deadlocks, {} livelocks",
        count,
        reach.deadlocks().map_or(0, <[_]>::len),
        reach.livelocks().map_or(0, <[_]>::len),
    );
    count
}
