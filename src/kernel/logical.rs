//! Logical rule instantiators: weighted (soft) rules and hard constraints.

use std::sync::Arc;

use crate::atom::GroundAtom;
use crate::error::RuleError;
use crate::formula::Formula;
use crate::groundrule::GroundRule;
use crate::kernel::base::{GroundInstantiator, RuleKernel};
use crate::predicate::PredicateRegistry;

/// Instantiator for soft rules: every ground instance carries the rule's
/// weight.
#[derive(Debug, Clone, Copy)]
pub struct WeightedInstantiator {
    weight: f64,
}

impl WeightedInstantiator {
    /// Creates an instantiator with the given rule weight.
    #[must_use]
    pub const fn new(weight: f64) -> Self {
        Self { weight }
    }

    /// The rule weight.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }
}

impl GroundInstantiator for WeightedInstantiator {
    fn ground_instance(&self, pos: &[Arc<GroundAtom>], neg: &[Arc<GroundAtom>]) -> GroundRule {
        GroundRule::weighted(pos.to_vec(), neg.to_vec(), self.weight)
    }
}

/// Instantiator for hard constraints: ground instances carry no weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintInstantiator;

impl GroundInstantiator for ConstraintInstantiator {
    fn ground_instance(&self, pos: &[Arc<GroundAtom>], neg: &[Arc<GroundAtom>]) -> GroundRule {
        GroundRule::constraint(pos.to_vec(), neg.to_vec())
    }
}

/// Builds a kernel for a weighted (soft) logical rule.
///
/// # Errors
/// Validation errors from [`RuleKernel::new`].
pub fn weighted_rule(
    formula: Formula,
    registry: &PredicateRegistry,
    weight: f64,
) -> Result<RuleKernel, RuleError> {
    RuleKernel::new(formula, registry, Box::new(WeightedInstantiator::new(weight)))
}

/// Builds a kernel for a hard logical constraint.
///
/// # Errors
/// Validation errors from [`RuleKernel::new`].
pub fn constraint_rule(
    formula: Formula,
    registry: &PredicateRegistry,
) -> Result<RuleKernel, RuleError> {
    RuleKernel::new(formula, registry, Box::new(ConstraintInstantiator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::term::{Constant, Term};

    fn ground(p: crate::predicate::PredicateId, s: &str) -> Arc<GroundAtom> {
        Arc::new(GroundAtom::new(p, vec![Constant::from(s)]))
    }

    #[test]
    fn test_weighted_instance_copies_buffers() {
        let registry = PredicateRegistry::new();
        let p = registry.standard("P", 1).unwrap();

        let mut pos = vec![ground(p, "a")];
        let neg = vec![ground(p, "b")];
        let inst = WeightedInstantiator::new(0.5);
        let rule = inst.ground_instance(&pos, &neg);

        // Mutating the scratch buffer afterwards must not affect the rule.
        pos.clear();
        assert_eq!(rule.pos_atoms().len(), 1);
        assert_eq!(rule.neg_atoms().len(), 1);
        assert_eq!(rule.weight(), Some(0.5));
    }

    #[test]
    fn test_constraint_instance_is_unweighted() {
        let registry = PredicateRegistry::new();
        let p = registry.standard("P", 1).unwrap();
        let rule = ConstraintInstantiator.ground_instance(&[ground(p, "a")], &[]);
        assert_eq!(rule.weight(), None);
    }

    #[test]
    fn test_rule_builders_validate() {
        let registry = PredicateRegistry::new();
        let p = registry.standard("P", 1).unwrap();
        let q = registry.standard("Q", 1).unwrap();

        let formula = Formula::implies(
            Formula::atom(Atom::new(p, vec![Term::var("X")])),
            Formula::atom(Atom::new(q, vec![Term::var("X")])),
        );
        let kernel = weighted_rule(formula.clone(), &registry, 2.0).unwrap();
        assert_eq!(kernel.clause().pos_literals().len(), 1);

        let kernel = constraint_rule(formula, &registry).unwrap();
        assert_eq!(kernel.clause().neg_literals().len(), 1);

        // A ground formula is rejected by either builder.
        let ground_formula = Formula::atom(Atom::new(p, vec![Term::Constant(Constant::from("a"))]));
        assert!(weighted_rule(ground_formula, &registry, 1.0).is_err());
    }
}
