//! Büchi automaton to DOT (Graphviz) conversion.
//!
//! The generated DOT output follows these conventions:
//! - the **initial pseudo-state** is a point with an edge to every initial state;
//! - **states** are labelled with their name and guard, followed by the
//!   indices of the acceptance sets they belong to;
//! - states belonging to **every** acceptance set are drawn with a double border;
//! - **edges** are labelled with the guard of their target, which is what a
//!   model state must satisfy to take them.
//!
//! # Examples
//!
//! ```
//! use ltl_rs::automaton::Automaton;
//! use ltl_rs::formula::Ltl;
//!
//! let ltl = Ltl::default();
//! let green = ltl.mk_atom("green");
//! let automaton = Automaton::from_ltl(&ltl, ltl.mk_globally(ltl.mk_finally(green)));
//!
//! let dot = automaton.to_dot().unwrap();
//! assert!(dot.starts_with("digraph {"));
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! ```

use std::fmt::Write as _;

use crate::automaton::{Automaton, State};

/// Configuration options for DOT output generation.
///
/// ```
/// use ltl_rs::dot::DotConfig;
///
/// let config = DotConfig {
///     edge_labels: false,
///     ..DotConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for states (default: "circle")
    pub state_shape: &'static str,
    /// Shape for states in every acceptance set (default: "doublecircle")
    pub accepting_shape: &'static str,
    /// Label edges with the guard of their target (default: true)
    pub edge_labels: bool,
    /// Text for an empty guard (default: "true")
    pub empty_guard: &'static str,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            state_shape: "circle",
            accepting_shape: "doublecircle",
            edge_labels: true,
            empty_guard: "true",
        }
    }
}

fn guard_label(state: &State, config: &DotConfig) -> String {
    if state.guard.is_empty() {
        return config.empty_guard.to_string();
    }
    let literals: Vec<String> = state.guard.iter().map(|l| l.to_string()).collect();
    literals.join(" & ").replace('"', "\\\"")
}

impl Automaton {
    /// Converts the automaton to DOT format with the default configuration.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    /// Converts the automaton to DOT format.
    ///
    /// # Examples
    ///
    /// ```
    /// use ltl_rs::automaton::Automaton;
    /// use ltl_rs::dot::DotConfig;
    /// use ltl_rs::formula::Ltl;
    /// use ltl_rs::parser::parse;
    ///
    /// let ltl = Ltl::default();
    /// let f = parse(&ltl, "red until green").unwrap();
    /// let automaton = Automaton::from_ltl(&ltl, f);
    ///
    /// let config = DotConfig {
    ///     state_shape: "ellipse",
    ///     ..DotConfig::default()
    /// };
    /// let dot = automaton.to_dot_with_config(&config).unwrap();
    /// assert!(dot.contains("shape=ellipse"));
    /// ```
    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "init [shape=point, label=\"\"];")?;

        for id in self.state_ids() {
            let state = self.state(id);
            let sets = self.accept_sets_of(id);
            let shape = if sets.len() == self.num_accept_sets() {
                config.accepting_shape
            } else {
                config.state_shape
            };
            let mut label = format!("{}\\n{}", id, guard_label(state, config));
            if !sets.is_empty() {
                let sets: Vec<String> = sets.iter().map(|i| i.to_string()).collect();
                write!(label, "\\n{{{}}}", sets.join(", "))?;
            }
            writeln!(dot, "{} [shape={}, label=\"{}\"];", id, shape, label)?;
        }

        let edges = self
            .initial()
            .iter()
            .map(|&to| ("init".to_string(), to))
            .chain(self.state_ids().flat_map(|from| {
                self.state(from).outgoing.iter().map(move |&to| (from.to_string(), to))
            }));
        for (from, to) in edges {
            if config.edge_labels {
                let label = guard_label(self.state(to), config);
                writeln!(dot, "{} -> {} [label=\"{}\"];", from, to, label)?;
            } else {
                writeln!(dot, "{} -> {};", from, to)?;
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
