//! Ground rules: fully ground instances of a rule.
//!
//! A ground rule carries its positive and negative ground atoms in clause
//! literal order, an optional weight, and a grounding multiplicity. Identity
//! is the unordered multiset of signed atoms; weight and multiplicity do not
//! participate.

use std::fmt;
use std::sync::Arc;

use crate::atom::{AtomKey, GroundAtom};

/// Identity key of a ground rule: the sorted multiset of signed ground
/// atoms. Two ground rules with equal keys are the same rule instance and
/// merge by multiplicity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroundRuleKey {
    literals: Vec<(bool, AtomKey)>,
}

/// A predicate-free, fully ground instance of a rule.
#[derive(Debug, Clone)]
pub struct GroundRule {
    pos: Vec<Arc<GroundAtom>>,
    neg: Vec<Arc<GroundAtom>>,
    weight: Option<f64>,
    groundings: u64,
}

impl GroundRule {
    /// Creates a weighted (soft) ground rule with multiplicity 1.
    #[must_use]
    pub fn weighted(pos: Vec<Arc<GroundAtom>>, neg: Vec<Arc<GroundAtom>>, weight: f64) -> Self {
        Self {
            pos,
            neg,
            weight: Some(weight),
            groundings: 1,
        }
    }

    /// Creates an unweighted (hard constraint) ground rule with
    /// multiplicity 1.
    #[must_use]
    pub fn constraint(pos: Vec<Arc<GroundAtom>>, neg: Vec<Arc<GroundAtom>>) -> Self {
        Self {
            pos,
            neg,
            weight: None,
            groundings: 1,
        }
    }

    /// Positive ground atoms, in clause literal order.
    #[must_use]
    pub fn pos_atoms(&self) -> &[Arc<GroundAtom>] {
        &self.pos
    }

    /// Negative ground atoms, in clause literal order.
    #[must_use]
    pub fn neg_atoms(&self) -> &[Arc<GroundAtom>] {
        &self.neg
    }

    /// The rule weight; `None` for hard constraints.
    #[must_use]
    pub const fn weight(&self) -> Option<f64> {
        self.weight
    }

    /// How many distinct groundings collapsed into this instance. Always
    /// at least 1.
    #[must_use]
    pub const fn groundings(&self) -> u64 {
        self.groundings
    }

    /// Multiplicity bookkeeping: records one more grounding of this rule.
    pub fn increase_groundings(&mut self) {
        self.groundings += 1;
    }

    /// The identity key: signed atoms as an order-insensitive multiset.
    #[must_use]
    pub fn key(&self) -> GroundRuleKey {
        let mut literals: Vec<(bool, AtomKey)> = self
            .pos
            .iter()
            .map(|a| (false, a.key()))
            .chain(self.neg.iter().map(|a| (true, a.key())))
            .collect();
        literals.sort();
        GroundRuleKey { literals }
    }
}

impl fmt::Display for GroundRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for atom in &self.pos {
            if !first {
                write!(f, " & ")?;
            }
            write!(f, "{atom}")?;
            first = false;
        }
        for atom in &self.neg {
            if !first {
                write!(f, " & ")?;
            }
            write!(f, "~{atom}")?;
            first = false;
        }
        write!(f, " [x{}]", self.groundings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::PredicateRegistry;
    use crate::term::Constant;

    fn atom(p: crate::predicate::PredicateId, s: &str) -> Arc<GroundAtom> {
        Arc::new(GroundAtom::new(p, vec![Constant::from(s)]))
    }

    #[test]
    fn test_identity_ignores_order_and_weight() {
        let registry = PredicateRegistry::new();
        let p = registry.standard("P", 1).unwrap();
        let q = registry.standard("Q", 1).unwrap();

        let a = GroundRule::weighted(vec![atom(p, "a"), atom(q, "a")], vec![], 1.0);
        let b = GroundRule::constraint(vec![atom(q, "a"), atom(p, "a")], vec![]);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_identity_distinguishes_polarity() {
        let registry = PredicateRegistry::new();
        let p = registry.standard("P", 1).unwrap();

        let a = GroundRule::constraint(vec![atom(p, "a")], vec![]);
        let b = GroundRule::constraint(vec![], vec![atom(p, "a")]);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_multiset_counts_duplicates() {
        let registry = PredicateRegistry::new();
        let p = registry.standard("P", 1).unwrap();

        let once = GroundRule::constraint(vec![atom(p, "a")], vec![]);
        let twice = GroundRule::constraint(vec![atom(p, "a"), atom(p, "a")], vec![]);
        assert_ne!(once.key(), twice.key());
    }

    #[test]
    fn test_groundings_bookkeeping() {
        let registry = PredicateRegistry::new();
        let p = registry.standard("P", 1).unwrap();

        let mut rule = GroundRule::weighted(vec![atom(p, "a")], vec![], 2.0);
        assert_eq!(rule.groundings(), 1);
        rule.increase_groundings();
        assert_eq!(rule.groundings(), 2);
        assert_eq!(rule.weight(), Some(2.0));
    }
}
