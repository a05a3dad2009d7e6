//! Logical formulas and reduction to disjunctive normal form.
//!
//! A [`Formula`] is a tree over and/or/not/implies/equivalent with atom
//! leaves. [`Formula::dnf`] reduces a formula to a disjunction of conjunctive
//! clauses of [`Literal`]s; rule construction negates the input formula first
//! and requires the result to collapse to a single clause.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::atom::Atom;
use crate::term::Variable;

/// An atom or its negation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// The underlying atom.
    pub atom: Atom,
    /// True if the atom is negated.
    pub negated: bool,
}

impl Literal {
    /// A positive literal.
    #[must_use]
    pub const fn pos(atom: Atom) -> Self {
        Self {
            atom,
            negated: false,
        }
    }

    /// A negated literal.
    #[must_use]
    pub const fn neg(atom: Atom) -> Self {
        Self {
            atom,
            negated: true,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "~{}", self.atom)
        } else {
            write!(f, "{}", self.atom)
        }
    }
}

/// A first-order formula over atoms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Formula {
    /// An atom leaf.
    Atom(Atom),
    /// Negation.
    Not(Box<Formula>),
    /// N-ary conjunction.
    And(Vec<Formula>),
    /// N-ary disjunction.
    Or(Vec<Formula>),
    /// Material implication.
    Implies(Box<Formula>, Box<Formula>),
    /// Biconditional.
    Equivalent(Box<Formula>, Box<Formula>),
}

impl Formula {
    /// Wraps an atom as a formula.
    #[must_use]
    pub const fn atom(atom: Atom) -> Self {
        Self::Atom(atom)
    }

    /// Negates this formula.
    #[must_use]
    pub fn negated(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// `lhs → rhs`.
    #[must_use]
    pub fn implies(lhs: Formula, rhs: Formula) -> Self {
        Self::Implies(Box::new(lhs), Box::new(rhs))
    }

    /// `lhs ↔ rhs`.
    #[must_use]
    pub fn equivalent(lhs: Formula, rhs: Formula) -> Self {
        Self::Equivalent(Box::new(lhs), Box::new(rhs))
    }

    /// Collects the distinct variables of this formula in first-occurrence
    /// order.
    #[must_use]
    pub fn variables(&self) -> Vec<Variable> {
        let mut out: Vec<Variable> = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<Variable>) {
        match self {
            Self::Atom(atom) => {
                for v in atom.variables() {
                    if !out.contains(v) {
                        out.push(v.clone());
                    }
                }
            }
            Self::Not(inner) => inner.collect_variables(out),
            Self::And(parts) | Self::Or(parts) => {
                for part in parts {
                    part.collect_variables(out);
                }
            }
            Self::Implies(lhs, rhs) | Self::Equivalent(lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }

    /// Reduces this formula to disjunctive normal form.
    ///
    /// The result is a disjunction of clauses, each clause a conjunction of
    /// literals. Duplicate literals within a clause are dropped; every input
    /// produces at least one clause.
    #[must_use]
    pub fn dnf(&self) -> Vec<Vec<Literal>> {
        let mut clauses = self.dnf_inner(false);
        for clause in &mut clauses {
            let mut seen: Vec<Literal> = Vec::with_capacity(clause.len());
            clause.retain(|lit| {
                if seen.contains(lit) {
                    false
                } else {
                    seen.push(lit.clone());
                    true
                }
            });
        }
        clauses
    }

    /// DNF with negation pushed to the leaves on the fly. `negated` tracks
    /// the parity of enclosing negations.
    fn dnf_inner(&self, negated: bool) -> Vec<Vec<Literal>> {
        match self {
            Self::Atom(atom) => {
                let lit = if negated {
                    Literal::neg(atom.clone())
                } else {
                    Literal::pos(atom.clone())
                };
                vec![vec![lit]]
            }
            Self::Not(inner) => inner.dnf_inner(!negated),
            Self::And(parts) => {
                if negated {
                    // ¬(a ∧ b) = ¬a ∨ ¬b
                    Self::union(parts.iter().map(|p| p.dnf_inner(true)))
                } else {
                    Self::cross(parts.iter().map(|p| p.dnf_inner(false)))
                }
            }
            Self::Or(parts) => {
                if negated {
                    // ¬(a ∨ b) = ¬a ∧ ¬b
                    Self::cross(parts.iter().map(|p| p.dnf_inner(true)))
                } else {
                    Self::union(parts.iter().map(|p| p.dnf_inner(false)))
                }
            }
            Self::Implies(lhs, rhs) => {
                if negated {
                    // ¬(a → b) = a ∧ ¬b
                    Self::cross([lhs.dnf_inner(false), rhs.dnf_inner(true)].into_iter())
                } else {
                    // a → b = ¬a ∨ b
                    Self::union([lhs.dnf_inner(true), rhs.dnf_inner(false)].into_iter())
                }
            }
            Self::Equivalent(lhs, rhs) => {
                if negated {
                    // ¬(a ↔ b) = (a ∧ ¬b) ∨ (b ∧ ¬a)
                    Self::union(
                        [
                            Self::cross([lhs.dnf_inner(false), rhs.dnf_inner(true)].into_iter()),
                            Self::cross([rhs.dnf_inner(false), lhs.dnf_inner(true)].into_iter()),
                        ]
                        .into_iter(),
                    )
                } else {
                    // a ↔ b = (¬a ∨ b) ∧ (¬b ∨ a)
                    Self::cross(
                        [
                            Self::union([lhs.dnf_inner(true), rhs.dnf_inner(false)].into_iter()),
                            Self::union([rhs.dnf_inner(true), lhs.dnf_inner(false)].into_iter()),
                        ]
                        .into_iter(),
                    )
                }
            }
        }
    }

    /// Disjunction of clause sets: concatenation.
    fn union(parts: impl Iterator<Item = Vec<Vec<Literal>>>) -> Vec<Vec<Literal>> {
        let mut out = Vec::new();
        for clauses in parts {
            out.extend(clauses);
        }
        out
    }

    /// Conjunction of clause sets: pairwise clause concatenation
    /// (distribution of ∧ over ∨).
    fn cross(parts: impl Iterator<Item = Vec<Vec<Literal>>>) -> Vec<Vec<Literal>> {
        let mut out: Vec<Vec<Literal>> = vec![Vec::new()];
        for clauses in parts {
            let mut next = Vec::with_capacity(out.len() * clauses.len());
            for prefix in &out {
                for clause in &clauses {
                    let mut merged = prefix.clone();
                    merged.extend(clause.iter().cloned());
                    next.push(merged);
                }
            }
            out = next;
        }
        out
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(atom) => write!(f, "{atom}"),
            Self::Not(inner) => write!(f, "~({inner})"),
            Self::And(parts) => {
                write!(f, "(")?;
                for (i, p) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")
            }
            Self::Or(parts) => {
                write!(f, "(")?;
                for (i, p) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")
            }
            Self::Implies(lhs, rhs) => write!(f, "({lhs} -> {rhs})"),
            Self::Equivalent(lhs, rhs) => write!(f, "({lhs} <-> {rhs})"),
        }
    }
}

impl From<Atom> for Formula {
    fn from(atom: Atom) -> Self {
        Self::Atom(atom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{PredicateId, PredicateRegistry};
    use crate::term::Term;

    struct Fixture {
        p: PredicateId,
        q: PredicateId,
        r: PredicateId,
    }

    fn fixture() -> Fixture {
        let registry = PredicateRegistry::new();
        Fixture {
            p: registry.standard("P", 1).unwrap(),
            q: registry.standard("Q", 1).unwrap(),
            r: registry.standard("R", 1).unwrap(),
        }
    }

    fn at(p: PredicateId, v: &str) -> Atom {
        Atom::new(p, vec![Term::var(v)])
    }

    #[test]
    fn test_dnf_single_atom() {
        let f = fixture();
        let clauses = Formula::atom(at(f.p, "X")).dnf();
        assert_eq!(clauses, vec![vec![Literal::pos(at(f.p, "X"))]]);
    }

    #[test]
    fn test_dnf_double_negation() {
        let f = fixture();
        let formula = Formula::atom(at(f.p, "X")).negated().negated();
        assert_eq!(formula.dnf(), vec![vec![Literal::pos(at(f.p, "X"))]]);
    }

    #[test]
    fn test_dnf_negated_implication_is_single_clause() {
        // ¬(P(X) → Q(X)) = P(X) ∧ ¬Q(X)
        let f = fixture();
        let formula =
            Formula::implies(Formula::atom(at(f.p, "X")), Formula::atom(at(f.q, "X"))).negated();
        let clauses = formula.dnf();
        assert_eq!(clauses.len(), 1);
        assert_eq!(
            clauses[0],
            vec![Literal::pos(at(f.p, "X")), Literal::neg(at(f.q, "X"))]
        );
    }

    #[test]
    fn test_dnf_negated_disjunction_is_single_clause() {
        // ¬(¬P(X) ∨ ¬Q(X)) = P(X) ∧ Q(X)
        let f = fixture();
        let formula = Formula::Or(vec![
            Formula::atom(at(f.p, "X")).negated(),
            Formula::atom(at(f.q, "X")).negated(),
        ])
        .negated();
        let clauses = formula.dnf();
        assert_eq!(clauses.len(), 1);
        assert_eq!(
            clauses[0],
            vec![Literal::pos(at(f.p, "X")), Literal::pos(at(f.q, "X"))]
        );
    }

    #[test]
    fn test_dnf_negated_conjunction_splits_clauses() {
        // ¬(P(X) ∧ Q(X)) = ¬P(X) ∨ ¬Q(X): two clauses.
        let f = fixture();
        let formula = Formula::And(vec![
            Formula::atom(at(f.p, "X")),
            Formula::atom(at(f.q, "X")),
        ])
        .negated();
        assert_eq!(formula.dnf().len(), 2);
    }

    #[test]
    fn test_dnf_distribution() {
        // P(X) ∧ (Q(X) ∨ R(X)) = (P∧Q) ∨ (P∧R)
        let f = fixture();
        let formula = Formula::And(vec![
            Formula::atom(at(f.p, "X")),
            Formula::Or(vec![
                Formula::atom(at(f.q, "X")),
                Formula::atom(at(f.r, "X")),
            ]),
        ]);
        let clauses = formula.dnf();
        assert_eq!(clauses.len(), 2);
        assert_eq!(
            clauses[0],
            vec![Literal::pos(at(f.p, "X")), Literal::pos(at(f.q, "X"))]
        );
        assert_eq!(
            clauses[1],
            vec![Literal::pos(at(f.p, "X")), Literal::pos(at(f.r, "X"))]
        );
    }

    #[test]
    fn test_dnf_negated_equivalence() {
        // ¬(P ↔ Q) = (P ∧ ¬Q) ∨ (Q ∧ ¬P)
        let f = fixture();
        let formula =
            Formula::equivalent(Formula::atom(at(f.p, "X")), Formula::atom(at(f.q, "X"))).negated();
        let clauses = formula.dnf();
        assert_eq!(clauses.len(), 2);
        assert_eq!(
            clauses[0],
            vec![Literal::pos(at(f.p, "X")), Literal::neg(at(f.q, "X"))]
        );
        assert_eq!(
            clauses[1],
            vec![Literal::pos(at(f.q, "X")), Literal::neg(at(f.p, "X"))]
        );
    }

    #[test]
    fn test_dnf_duplicate_literals_dropped() {
        let f = fixture();
        let formula = Formula::And(vec![
            Formula::atom(at(f.p, "X")),
            Formula::atom(at(f.p, "X")),
        ]);
        let clauses = formula.dnf();
        assert_eq!(clauses, vec![vec![Literal::pos(at(f.p, "X"))]]);
    }

    #[test]
    fn test_variables_first_occurrence_order() {
        let f = fixture();
        let formula = Formula::implies(
            Formula::And(vec![Formula::atom(at(f.p, "Y")), Formula::atom(at(f.q, "X"))]),
            Formula::atom(at(f.r, "Y")),
        );
        let vars: Vec<_> = formula
            .variables()
            .into_iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(vars, vec!["Y", "X"]);
    }

    #[test]
    fn test_display_round_trip_shape() {
        let f = fixture();
        let formula = Formula::implies(Formula::atom(at(f.p, "X")), Formula::atom(at(f.q, "X")));
        let shown = formula.to_string();
        assert!(shown.contains("->"));
    }
}
