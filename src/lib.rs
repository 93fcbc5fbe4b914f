//! # ltl-rs: Explicit-state LTL model checking in Rust
//!
//! **`ltl-rs`** checks linear temporal logic properties against transition systems.
//! A property is translated into a Büchi automaton, the automaton runs in lockstep with the
//! system, and a nested depth-first search looks for an accepting cycle in the product.
//! The cycle, when found, is returned as a lasso-shaped counterexample.
//!
//! ## Key Features
//!
//! - **Manager-Centric Formulas**: All formulas live in an [`Ltl`][crate::formula::Ltl] manager.
//!   Formulas are hash-consed, always in negation normal form, and negation is a constant-time
//!   lookup after the first call.
//! - **Tableau Translation**: The on-the-fly construction of Gerth, Peled, Vardi and Wolper
//!   produces a generalized Büchi automaton with one acceptance set per `until`.
//! - **Nested DFS**: The emptiness check runs on an explicit stack and returns a witness.
//! - **Partial-Order Reduction**: Stubborn sets skip interleavings of independent actions.
//!
//! ## Basic Usage
//!
//! ```rust
//! use ltl_rs::checker::{Checker, CheckerConfig, Verdict};
//! use ltl_rs::formula::Ltl;
//! use ltl_rs::parser::parse;
//! use ltl_rs::stoplight::Stoplight;
//!
//! // 1. Initialize the manager
//! let ltl = Ltl::default();
//!
//! // 2. Build a property: the light is green infinitely often
//! let property = parse(&ltl, "globally finally green").unwrap();
//!
//! // 3. Check it against the energy-saving traffic light
//! let checker = Checker::new(CheckerConfig::default());
//! let verdict = checker.check(&ltl, property, Stoplight::eco());
//!
//! // 4. The light may stay off forever
//! let Verdict::Violated(trace) = verdict else { panic!() };
//! assert!(trace.cycle().iter().all(|s| !s.model.is_green()));
//! ```
//!
//! ## Core Components
//!
//! - **[`formula`]**: The [`Ltl`][crate::formula::Ltl] manager and formula handles.
//! - **[`tableau`]**: Translation of formulas into [`Automaton`][crate::automaton::Automaton]s.
//! - **[`system`]**: The [`TransitionSystem`][crate::system::TransitionSystem] contract models implement.
//! - **[`product`]** and **[`ndfs`]**: The product graph and its emptiness check.
//! - **[`reduction`]**: Stubborn sets and the [`Por`][crate::reduction::Por] wrapper.
//! - **[`checker`]**: Everything above, wired together.

pub mod automaton;
pub mod bitset;
pub mod checker;
pub mod dot;
pub mod formula;
pub mod ndfs;
pub mod parser;
pub mod product;
pub mod reach;
pub mod reduction;
pub mod stoplight;
pub mod system;
pub mod table;
pub mod tableau;
pub mod treeset;
pub mod utils;
