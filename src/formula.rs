//! Canonical LTL formulas in negation normal form.
//!
//! All formulas live in an [`Ltl`] manager. The manager hash-conses every
//! node, so two [`Formula`] handles are equal exactly when the formulas are
//! structurally equal, and it keeps negation in normal form: `not` is only
//! ever applied to an atomic value, everything else is rewritten to its dual
//! on construction.
//!
//! `finally φ` and `globally φ` are not operators of their own, they are
//! rewritten to `true until φ` and `false release φ`.
//!
//! ```
//! use ltl_rs::formula::Ltl;
//!
//! let ltl = Ltl::default();
//! let green = ltl.mk_atom("green");
//! let gf = ltl.mk_globally(ltl.mk_finally(green));
//!
//! // Negation is pushed inward: not G F green == F G not green.
//! let fg = ltl.mk_finally(ltl.mk_globally(ltl.mk_not(green)));
//! assert_eq!(ltl.mk_not(gf), fg);
//! assert_eq!(ltl.negate(ltl.negate(gf)), gf);
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display, Formatter};

use log::debug;
use num_bigint::BigUint;

use crate::table::Table;
use crate::utils::{pairing2, pairing3, MyHash};

/// Handle to a canonical formula inside an [`Ltl`] manager.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Formula(u32);

impl Formula {
    /// Return the index of the formula in the manager's table.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Interned atomic proposition name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Symbol(u32);

impl Symbol {
    pub const TRUE: Symbol = Symbol(0);
    pub const FALSE: Symbol = Symbol(1);

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A formula node. Children are canonical handles.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Node {
    /// Atomic value, including the constants `true` and `false`.
    Atom(Symbol),
    /// Negated atomic value. The child is always an [`Node::Atom`].
    NotAtom(Formula),
    And(Formula, Formula),
    Or(Formula, Formula),
    Next(Formula),
    Until(Formula, Formula),
    Release(Formula, Formula),
}

impl Node {
    fn tag(&self) -> u64 {
        match self {
            Node::Atom(_) => 0,
            Node::NotAtom(_) => 1,
            Node::And(..) => 2,
            Node::Or(..) => 3,
            Node::Next(_) => 4,
            Node::Until(..) => 5,
            Node::Release(..) => 6,
        }
    }

    /// Children of this node, left to right.
    pub fn children(&self) -> Vec<Formula> {
        match *self {
            Node::Atom(_) => vec![],
            Node::NotAtom(a) | Node::Next(a) => vec![a],
            Node::And(a, b) | Node::Or(a, b) | Node::Until(a, b) | Node::Release(a, b) => vec![a, b],
        }
    }

    /// Whether the node is an atomic value or a negated atomic value.
    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Atom(_) | Node::NotAtom(_))
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        match *self {
            Node::Atom(s) => pairing2(self.tag(), s.0 as u64),
            Node::NotAtom(a) | Node::Next(a) => pairing2(self.tag(), a.0 as u64),
            Node::And(a, b) | Node::Or(a, b) | Node::Until(a, b) | Node::Release(a, b) => {
                pairing3(self.tag(), a.0 as u64, b.0 as u64)
            }
        }
    }
}

/// Unary operators of the surface syntax.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UnaryOp {
    Not,
    Next,
    Finally,
    Globally,
}

/// Binary operators of the surface syntax.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BinaryOp {
    And,
    Or,
    Until,
    Release,
}

/// Formula manager: unique table, symbol table and negation links.
pub struct Ltl {
    table: RefCell<Table<Node>>,
    /// `negations[i]` is the cached dual of the formula with index `i`.
    negations: RefCell<Vec<Option<Formula>>>,
    names: RefCell<Vec<String>>,
    symbols: RefCell<HashMap<String, Symbol>>,
    pub tt: Formula,
    pub ff: Formula,
}

impl Ltl {
    pub fn new(table_bits: usize) -> Self {
        let mut ltl = Self {
            table: RefCell::new(Table::new(table_bits)),
            negations: RefCell::new(vec![None]),
            names: RefCell::new(Vec::new()),
            symbols: RefCell::new(HashMap::new()),
            tt: Formula(0),
            ff: Formula(0),
        };

        assert_eq!(ltl.intern("true"), Symbol::TRUE);
        assert_eq!(ltl.intern("false"), Symbol::FALSE);
        ltl.tt = ltl.put(Node::Atom(Symbol::TRUE));
        ltl.ff = ltl.put(Node::Atom(Symbol::FALSE));
        ltl.link(ltl.tt, ltl.ff);

        ltl
    }
}

impl Default for Ltl {
    fn default() -> Self {
        Ltl::new(10)
    }
}

impl Debug for Ltl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ltl")
            .field("formulas", &self.table.borrow().len())
            .field("symbols", &self.names.borrow().len())
            .finish()
    }
}

impl Ltl {
    fn intern(&self, name: &str) -> Symbol {
        if let Some(&s) = self.symbols.borrow().get(name) {
            return s;
        }
        let mut names = self.names.borrow_mut();
        let s = Symbol(names.len() as u32);
        names.push(name.to_string());
        self.symbols.borrow_mut().insert(name.to_string(), s);
        s
    }

    fn put(&self, node: Node) -> Formula {
        let index = self.table.borrow_mut().put(node);
        let mut negations = self.negations.borrow_mut();
        if negations.len() <= index {
            negations.resize(index + 1, None);
        }
        Formula(index as u32)
    }

    fn link(&self, f: Formula, neg: Formula) {
        let mut negations = self.negations.borrow_mut();
        negations[f.index()] = Some(neg);
        negations[neg.index()] = Some(f);
    }

    /// Number of distinct formulas created so far.
    pub fn size(&self) -> usize {
        self.table.borrow().len()
    }

    /// Get the node of a formula.
    pub fn node(&self, f: Formula) -> Node {
        assert_ne!(f.0, 0, "Formula index should not be zero");
        *self.table.borrow().value(f.index())
    }

    /// Get the name of a symbol.
    pub fn name(&self, s: Symbol) -> String {
        self.names.borrow()[s.index()].clone()
    }

    /// Look up a symbol by name without creating it.
    pub fn symbol(&self, name: &str) -> Option<Symbol> {
        self.symbols.borrow().get(name).copied()
    }

    pub fn is_true(&self, f: Formula) -> bool {
        f == self.tt
    }
    pub fn is_false(&self, f: Formula) -> bool {
        f == self.ff
    }
}

impl Ltl {
    /// Atomic proposition named `name`. The names `true` and `false` denote the constants.
    pub fn mk_atom(&self, name: &str) -> Formula {
        let s = self.intern(name);
        let f = self.put(Node::Atom(s));
        debug!("mk_atom({:?}) = {}", name, f);
        f
    }

    pub fn mk_not(&self, f: Formula) -> Formula {
        self.negate(f)
    }

    pub fn mk_and(&self, a: Formula, b: Formula) -> Formula {
        self.put(Node::And(a, b))
    }

    pub fn mk_or(&self, a: Formula, b: Formula) -> Formula {
        self.put(Node::Or(a, b))
    }

    /// `a -> b`, encoded as `not a or b`.
    pub fn mk_implies(&self, a: Formula, b: Formula) -> Formula {
        self.mk_or(self.negate(a), b)
    }

    pub fn mk_next(&self, f: Formula) -> Formula {
        self.put(Node::Next(f))
    }

    pub fn mk_until(&self, a: Formula, b: Formula) -> Formula {
        self.put(Node::Until(a, b))
    }

    pub fn mk_release(&self, a: Formula, b: Formula) -> Formula {
        self.put(Node::Release(a, b))
    }

    /// `finally f`, rewritten to `true until f`.
    pub fn mk_finally(&self, f: Formula) -> Formula {
        self.mk_until(self.tt, f)
    }

    /// `globally f`, rewritten to `false release f`.
    pub fn mk_globally(&self, f: Formula) -> Formula {
        self.mk_release(self.ff, f)
    }

    pub fn mk_unary(&self, op: UnaryOp, f: Formula) -> Formula {
        match op {
            UnaryOp::Not => self.mk_not(f),
            UnaryOp::Next => self.mk_next(f),
            UnaryOp::Finally => self.mk_finally(f),
            UnaryOp::Globally => self.mk_globally(f),
        }
    }

    pub fn mk_binary(&self, op: BinaryOp, a: Formula, b: Formula) -> Formula {
        match op {
            BinaryOp::And => self.mk_and(a, b),
            BinaryOp::Or => self.mk_or(a, b),
            BinaryOp::Until => self.mk_until(a, b),
            BinaryOp::Release => self.mk_release(a, b),
        }
    }

    /// Negation of `f` in negation normal form.
    ///
    /// The dual is computed once and linked both ways, so `negate(negate(f)) == f`.
    pub fn negate(&self, f: Formula) -> Formula {
        assert_ne!(f.0, 0, "Formula index should not be zero");

        if let Some(neg) = self.negations.borrow()[f.index()] {
            return neg;
        }

        let neg = match self.node(f) {
            Node::Atom(_) => self.put(Node::NotAtom(f)),
            Node::NotAtom(_) => panic!("Negated atom {} has no linked positive atom", f),
            Node::And(a, b) => {
                let (a, b) = (self.negate(a), self.negate(b));
                self.mk_or(a, b)
            }
            Node::Or(a, b) => {
                let (a, b) = (self.negate(a), self.negate(b));
                self.mk_and(a, b)
            }
            Node::Next(a) => {
                let a = self.negate(a);
                self.mk_next(a)
            }
            Node::Until(a, b) => {
                let (a, b) = (self.negate(a), self.negate(b));
                self.mk_release(a, b)
            }
            Node::Release(a, b) => {
                let (a, b) = (self.negate(a), self.negate(b));
                self.mk_until(a, b)
            }
        };
        debug!("negate({}) = {}", f, neg);

        self.link(f, neg);
        neg
    }
}

impl Ltl {
    /// All distinct subformulas of `f` (including `f`), in preorder.
    pub fn closure(&self, f: Formula) -> Vec<Formula> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut stack = vec![f];
        while let Some(g) = stack.pop() {
            if !seen.insert(g) {
                continue;
            }
            result.push(g);
            stack.extend(self.node(g).children().into_iter().rev());
        }
        result
    }

    /// All distinct `until` subformulas of `f`, in order of first occurrence.
    pub fn untils(&self, f: Formula) -> Vec<Formula> {
        self.closure(f)
            .into_iter()
            .filter(|&g| matches!(self.node(g), Node::Until(..)))
            .collect()
    }

    /// Names of the atomic propositions in `f`, without the constants.
    pub fn atoms(&self, f: Formula) -> Vec<String> {
        self.closure(f)
            .into_iter()
            .filter(|&g| !self.is_true(g) && !self.is_false(g))
            .filter_map(|g| match self.node(g) {
                Node::Atom(s) => Some(self.name(s)),
                _ => None,
            })
            .collect()
    }

    pub fn is_next_free(&self, f: Formula) -> bool {
        self.closure(f).into_iter().all(|g| !matches!(self.node(g), Node::Next(_)))
    }

    /// Upper bound on the number of automaton states the tableau produces for `f`.
    pub fn state_bound(&self, f: Formula) -> BigUint {
        BigUint::from(1u32) << self.closure(f).len()
    }

    /// Render `f` in the surface syntax accepted by the parser.
    pub fn display(&self, f: Formula) -> String {
        let mut out = String::new();
        self.display_into(f, &mut out);
        out
    }

    fn display_into(&self, f: Formula, out: &mut String) {
        let binary = |out: &mut String, a: Formula, op: &str, b: Formula| {
            out.push('(');
            self.display_into(a, out);
            out.push(' ');
            out.push_str(op);
            out.push(' ');
            self.display_into(b, out);
            out.push(')');
        };

        match self.node(f) {
            Node::Atom(s) => out.push_str(&quote(&self.name(s))),
            Node::NotAtom(a) => {
                out.push_str("not ");
                self.display_into(a, out);
            }
            Node::Next(a) => {
                out.push_str("next ");
                self.display_into(a, out);
            }
            Node::And(a, b) => binary(out, a, "and", b),
            Node::Or(a, b) => binary(out, a, "or", b),
            Node::Until(a, b) => binary(out, a, "until", b),
            Node::Release(a, b) => binary(out, a, "release", b),
        }
    }
}

/// Quote a predicate name unless it reads back as a plain identifier.
fn quote(name: &str) -> String {
    let plain = name.chars().next().is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
        && !crate::parser::is_keyword(name);
    if plain {
        name.to_string()
    } else {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_hash_consing() {
        let ltl = Ltl::default();

        let p = ltl.mk_atom("p");
        let q = ltl.mk_atom("q");
        assert_eq!(ltl.mk_atom("p"), p);
        assert_eq!(ltl.mk_and(p, q), ltl.mk_and(p, q));
        assert_ne!(ltl.mk_and(p, q), ltl.mk_and(q, p));
        assert_eq!(ltl.mk_until(p, q), ltl.mk_until(p, q));
    }

    #[test]
    fn test_constants() {
        let ltl = Ltl::default();

        assert_eq!(ltl.mk_atom("true"), ltl.tt);
        assert_eq!(ltl.mk_atom("false"), ltl.ff);
        assert_eq!(ltl.negate(ltl.tt), ltl.ff);
        assert_eq!(ltl.negate(ltl.ff), ltl.tt);
    }

    #[test]
    fn test_negated_atom() {
        let ltl = Ltl::default();

        let p = ltl.mk_atom("p");
        let not_p = ltl.mk_not(p);
        assert_eq!(ltl.node(not_p), Node::NotAtom(p));
        assert_eq!(ltl.negate(not_p), p);
        assert_eq!(ltl.mk_not(not_p), p);
        assert_eq!(ltl.mk_not(p), not_p);
    }

    #[test]
    fn test_double_negation_is_identity() {
        let ltl = Ltl::default();

        let p = ltl.mk_atom("p");
        let q = ltl.mk_atom("q");
        let formulas = [
            p,
            ltl.mk_and(p, q),
            ltl.mk_or(ltl.mk_not(p), q),
            ltl.mk_next(p),
            ltl.mk_until(p, ltl.mk_next(q)),
            ltl.mk_release(p, q),
            ltl.mk_globally(ltl.mk_finally(p)),
        ];
        for f in formulas {
            assert_eq!(ltl.negate(ltl.negate(f)), f);
        }
    }

    #[test]
    fn test_duality() {
        let ltl = Ltl::default();

        let a = ltl.mk_atom("a");
        let b = ltl.mk_atom("b");
        let (na, nb) = (ltl.negate(a), ltl.negate(b));

        assert_eq!(ltl.negate(ltl.mk_and(a, b)), ltl.mk_or(na, nb));
        assert_eq!(ltl.negate(ltl.mk_or(a, b)), ltl.mk_and(na, nb));
        assert_eq!(ltl.negate(ltl.mk_until(a, b)), ltl.mk_release(na, nb));
        assert_eq!(ltl.negate(ltl.mk_release(a, b)), ltl.mk_until(na, nb));
        assert_eq!(ltl.negate(ltl.mk_next(a)), ltl.mk_next(na));
    }

    #[test]
    fn test_atoms_and_next_freedom() {
        let ltl = Ltl::default();

        let (p, q) = (ltl.mk_atom("p"), ltl.mk_atom("q"));
        let f = ltl.mk_globally(ltl.mk_or(ltl.mk_not(p), ltl.mk_finally(q)));
        assert_eq!(ltl.atoms(f), vec!["p".to_string(), "q".to_string()]);
        assert!(ltl.is_next_free(f));
        assert!(!ltl.is_next_free(ltl.mk_and(f, ltl.mk_next(p))));
        assert!(ltl.atoms(ltl.tt).is_empty());
    }

    #[test]
    fn test_finally_globally_rewrite() {
        let ltl = Ltl::default();

        let p = ltl.mk_atom("p");
        assert_eq!(ltl.node(ltl.mk_finally(p)), Node::Until(ltl.tt, p));
        assert_eq!(ltl.node(ltl.mk_globally(p)), Node::Release(ltl.ff, p));
        assert_eq!(ltl.negate(ltl.mk_finally(p)), ltl.mk_globally(ltl.negate(p)));
    }

    #[test]
    fn test_unary_binary_dispatch() {
        let ltl = Ltl::default();

        let p = ltl.mk_atom("p");
        let q = ltl.mk_atom("q");
        assert_eq!(ltl.mk_unary(UnaryOp::Globally, p), ltl.mk_globally(p));
        assert_eq!(ltl.mk_unary(UnaryOp::Not, p), ltl.negate(p));
        assert_eq!(ltl.mk_binary(BinaryOp::Release, p, q), ltl.mk_release(p, q));
        assert_eq!(ltl.mk_implies(p, q), ltl.mk_or(ltl.negate(p), q));
    }

    #[test]
    fn test_closure_and_untils() {
        let ltl = Ltl::default();

        let p = ltl.mk_atom("p");
        let q = ltl.mk_atom("q");
        let u = ltl.mk_until(p, q);
        let f = ltl.mk_and(u, ltl.mk_finally(u));

        let closure = ltl.closure(f);
        assert_eq!(closure[0], f);
        assert_eq!(closure.len(), 6); // f, u, p, q, F u, true
        assert_eq!(ltl.untils(f), vec![u, ltl.mk_finally(u)]);
        assert_eq!(ltl.state_bound(f), BigUint::from(64u32));
    }

    #[test]
    fn test_display() {
        let ltl = Ltl::default();

        let green = ltl.mk_atom("green");
        let odd = ltl.mk_atom("x > 1");
        let f = ltl.mk_not(ltl.mk_globally(ltl.mk_finally(green)));
        assert_eq!(ltl.display(f), "(true until (false release not green))");
        assert_eq!(ltl.display(ltl.mk_next(odd)), "next \"x > 1\"");
        assert_eq!(ltl.display(ltl.mk_atom("until")), "\"until\"");
    }
}
