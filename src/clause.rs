//! Clause analysis: from a formula to a validated, queriable DNF clause.
//!
//! Rule construction negates the input formula and reduces it to DNF. The
//! result must collapse to a single conjunctive clause whose positive
//! literals form a well-formed conjunctive query binding every variable.
//! The analysis here enforces that, splits the clause by polarity, and
//! supports the two grounding paths: the full query and per-atom trace
//! assignments for incremental grounding.

use crate::atom::{Atom, GroundAtom};
use crate::error::RuleError;
use crate::formula::Formula;
use crate::predicate::{PredicateId, PredicateRegistry};
use crate::query::{ConjunctiveQuery, VariableAssignment};
use crate::term::Variable;

/// A validated single-clause normal form of a rule.
///
/// Invariants established at construction:
/// - `dnf(¬F)` has exactly one clause;
/// - every variable occurs in at least one positive (queried) literal over a
///   standard predicate;
/// - the clause has at least one variable;
/// - every positive literal is over a standard predicate.
#[derive(Debug, Clone)]
pub struct DnfClause {
    pos_literals: Vec<Atom>,
    neg_literals: Vec<Atom>,
    variables: Vec<Variable>,
}

impl DnfClause {
    /// Analyzes `formula`, producing the clause of `¬formula` in DNF.
    ///
    /// # Errors
    /// - `UnknownPredicate` / `ArityMismatch` for malformed atoms;
    /// - `MultipleClauses` if `¬formula` does not reduce to one clause;
    /// - `UnboundVariable` if a variable is never bound by a queried literal
    ///   over a standard predicate;
    /// - `GroundFormula` if the formula has no variables;
    /// - `NotQueriable` if the positive literals do not form a conjunctive
    ///   query.
    pub fn analyze(formula: &Formula, registry: &PredicateRegistry) -> Result<Self, RuleError> {
        check_atoms(formula, registry)?;

        let clauses = formula.clone().negated().dnf();
        if clauses.len() > 1 {
            return Err(RuleError::MultipleClauses);
        }
        let clause = clauses.into_iter().next().unwrap_or_default();

        let mut pos_literals: Vec<Atom> = Vec::new();
        let mut neg_literals: Vec<Atom> = Vec::new();
        for literal in clause {
            if literal.negated {
                neg_literals.push(literal.atom);
            } else {
                pos_literals.push(literal.atom);
            }
        }

        // Clause variable order: first occurrence across positive then
        // negative literals. The projection below reuses it.
        let mut variables: Vec<Variable> = Vec::new();
        for atom in pos_literals.iter().chain(neg_literals.iter()) {
            for v in atom.variables() {
                if !variables.contains(v) {
                    variables.push(v.clone());
                }
            }
        }

        // Binding invariant: every variable is enumerable through some
        // queried literal backed by a relation.
        for v in &variables {
            let bound = pos_literals.iter().any(|atom| {
                registry.is_standard(atom.predicate) && atom.variables().any(|av| av == v)
            });
            if !bound {
                return Err(RuleError::UnboundVariable {
                    variable: v.clone(),
                });
            }
        }

        if variables.is_empty() {
            return Err(RuleError::GroundFormula);
        }

        if pos_literals.is_empty() {
            return Err(RuleError::NotQueriable {
                reason: "clause has no queried literals".to_string(),
            });
        }
        for atom in &pos_literals {
            if !registry.is_standard(atom.predicate) {
                let name = registry
                    .get(atom.predicate)
                    .map_or_else(|| atom.predicate.to_string(), |p| p.name);
                return Err(RuleError::NotQueriable {
                    reason: format!("queried literal over derived predicate {name}"),
                });
            }
        }

        Ok(Self {
            pos_literals,
            neg_literals,
            variables,
        })
    }

    /// Positive (queried) literals, in clause order.
    #[must_use]
    pub fn pos_literals(&self) -> &[Atom] {
        &self.pos_literals
    }

    /// Negated literals, in clause order.
    #[must_use]
    pub fn neg_literals(&self) -> &[Atom] {
        &self.neg_literals
    }

    /// Clause variables in first-occurrence order.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Builds the grounding query: the conjunction of the positive literals.
    ///
    /// The same query template is reused for every grounding pass; partial
    /// groundings are attached per pass.
    #[must_use]
    pub fn query(&self) -> ConjunctiveQuery {
        ConjunctiveQuery::new(self.pos_literals.clone())
    }

    /// Distinct standard predicates occurring anywhere in the clause, in
    /// clause order. This is the event-registration set.
    #[must_use]
    pub fn standard_predicates(&self, registry: &PredicateRegistry) -> Vec<PredicateId> {
        let mut out: Vec<PredicateId> = Vec::new();
        for atom in self.pos_literals.iter().chain(self.neg_literals.iter()) {
            if registry.is_standard(atom.predicate) && !out.contains(&atom.predicate) {
                out.push(atom.predicate);
            }
        }
        out
    }

    /// Every way `atom` unifies with a literal of this clause.
    ///
    /// One partial assignment per successful unification, positive literals
    /// first, clause order within each polarity. Duplicates are preserved:
    /// a rule instance reachable through several unifications merges into
    /// multiplicity downstream.
    #[must_use]
    pub fn trace_atom(&self, atom: &GroundAtom) -> Vec<VariableAssignment> {
        let mut out = Vec::new();
        for literal in self.pos_literals.iter().chain(self.neg_literals.iter()) {
            if literal.predicate != atom.predicate {
                continue;
            }
            if let Some(bindings) = literal.unify(&atom.args) {
                out.push(bindings.into_iter().collect());
            }
        }
        out
    }
}

/// Validates every atom of `formula` against the registry.
fn check_atoms(formula: &Formula, registry: &PredicateRegistry) -> Result<(), RuleError> {
    match formula {
        Formula::Atom(atom) => {
            let Some(pred) = registry.get(atom.predicate) else {
                return Err(RuleError::UnknownPredicate { id: atom.predicate });
            };
            if pred.arity != atom.arity() {
                return Err(RuleError::ArityMismatch {
                    predicate: pred.name,
                    expected: pred.arity,
                    actual: atom.arity(),
                });
            }
            Ok(())
        }
        Formula::Not(inner) => check_atoms(inner, registry),
        Formula::And(parts) | Formula::Or(parts) => {
            for part in parts {
                check_atoms(part, registry)?;
            }
            Ok(())
        }
        Formula::Implies(lhs, rhs) | Formula::Equivalent(lhs, rhs) => {
            check_atoms(lhs, registry)?;
            check_atoms(rhs, registry)
        }
    }
}
