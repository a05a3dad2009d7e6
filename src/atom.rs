//! Atoms: predicates applied to term tuples.
//!
//! [`Atom`] is the templated form used inside formulas and queries; its
//! arguments may be variables. [`GroundAtom`] is fully ground and is the unit
//! the atom manager interns: equal identity means the same `Arc`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::predicate::PredicateId;
use crate::term::{Constant, Term, Variable};

/// A predicate applied to an arity-sized tuple of terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atom {
    /// The predicate this atom is over.
    pub predicate: PredicateId,
    /// Argument terms, one per predicate argument position.
    pub args: Vec<Term>,
}

impl Atom {
    /// Creates an atom over `predicate` with the given arguments.
    #[must_use]
    pub fn new(predicate: PredicateId, args: Vec<Term>) -> Self {
        Self { predicate, args }
    }

    /// Returns the number of argument positions.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Returns true if every argument is ground.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        self.args.iter().all(Term::is_ground)
    }

    /// Iterates the distinct variables of this atom in first-occurrence order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        let mut seen: Vec<&Variable> = Vec::new();
        self.args.iter().filter_map(move |t| {
            let v = t.as_variable()?;
            if seen.contains(&v) {
                None
            } else {
                seen.push(v);
                Some(v)
            }
        })
    }

    /// Unifies this atom's arguments against a tuple of constants.
    ///
    /// Constant arguments must match exactly; variable arguments bind to the
    /// corresponding constant. Returns the variable bindings on success, in
    /// argument order, or `None` when unification fails (including on arity
    /// mismatch or when one variable would bind two different constants).
    #[must_use]
    pub fn unify(&self, values: &[Constant]) -> Option<Vec<(Variable, Constant)>> {
        if self.args.len() != values.len() {
            return None;
        }

        let mut bindings: Vec<(Variable, Constant)> = Vec::new();
        for (term, value) in self.args.iter().zip(values.iter()) {
            match term {
                Term::Constant(c) => {
                    if c != value {
                        return None;
                    }
                }
                Term::Variable(v) => {
                    if let Some((_, bound)) = bindings.iter().find(|(b, _)| b == v) {
                        if bound != value {
                            return None;
                        }
                    } else {
                        bindings.push((v.clone(), value.clone()));
                    }
                }
            }
        }
        Some(bindings)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.predicate)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// A fully ground atom.
///
/// Identity is `(predicate, args)`. The atom manager guarantees interning:
/// two ground atoms with equal identity are the same `Arc` allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroundAtom {
    /// The predicate this atom is over.
    pub predicate: PredicateId,
    /// Ground argument values.
    pub args: Vec<Constant>,
}

impl GroundAtom {
    /// Creates a ground atom.
    #[must_use]
    pub fn new(predicate: PredicateId, args: Vec<Constant>) -> Self {
        Self { predicate, args }
    }

    /// Returns the number of argument positions.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Returns the interning key for this atom.
    #[must_use]
    pub fn key(&self) -> AtomKey {
        AtomKey {
            predicate: self.predicate,
            args: self.args.clone(),
        }
    }
}

impl fmt::Display for GroundAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.predicate)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// Identity key of a ground atom: `(predicate, tuple-of-values)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtomKey {
    /// Predicate id.
    pub predicate: PredicateId,
    /// Ground argument values.
    pub args: Vec<Constant>,
}
