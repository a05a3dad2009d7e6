//! Rule kernels: validated clauses plus the grounding driver.
//!
//! A [`RuleKernel`] owns the validated clause of one rule and drives both
//! grounding paths: [`ground_all`](RuleKernel::ground_all) enumerates every
//! ground rule the clause induces against the current store view, and the
//! [`AtomEventHandler`] impl regrounds exactly the instances newly enabled
//! by an atom activation.
//!
//! How two literal lists become a concrete [`GroundRule`] is the one point
//! of variation between rule kinds; it is supplied at construction as a
//! [`GroundInstantiator`] capability rather than by subtyping. Kernels are
//! identity-stable: they carry a [`KernelId`] and deliberately do not
//! implement `Clone`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::atom::{Atom, GroundAtom};
use crate::clause::DnfClause;
use crate::error::{GroundingError, RuleError};
use crate::events::{
    AtomEvent, AtomEventFramework, AtomEventHandler, RegistrationId, ACTIVATED_EVENT_SET,
};
use crate::formula::Formula;
use crate::groundrule::GroundRule;
use crate::groundstore::GroundRuleStore;
use crate::manager::AtomManager;
use crate::predicate::PredicateRegistry;
use crate::query::{ResultList, VariableAssignment};
use crate::term::Term;

/// Stable identity of a rule kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KernelId(Uuid);

impl KernelId {
    /// Creates a new random kernel id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KernelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for KernelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds a concrete ground rule from two literal lists.
///
/// `pos` and `neg` are transient buffers owned by the grounder, passed as
/// immutable snapshots in clause literal order. Implementations clone the
/// `Arc`s they retain.
pub trait GroundInstantiator: Send + Sync {
    /// Produces the candidate ground rule for one query result row.
    fn ground_instance(&self, pos: &[Arc<GroundAtom>], neg: &[Arc<GroundAtom>]) -> GroundRule;
}

/// A validated rule plus its grounding machinery.
pub struct RuleKernel {
    id: KernelId,
    formula: Formula,
    clause: DnfClause,
    instantiator: Box<dyn GroundInstantiator>,
}

impl fmt::Debug for RuleKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleKernel")
            .field("id", &self.id)
            .field("formula", &self.formula)
            .finish_non_exhaustive()
    }
}

impl RuleKernel {
    /// Validates `formula` and builds a kernel around its clause.
    ///
    /// The formula is negated and DNF-normalized; see
    /// [`DnfClause::analyze`] for the validation rules and error tags. No
    /// partial kernel is leaked on error.
    pub fn new(
        formula: Formula,
        registry: &PredicateRegistry,
        instantiator: Box<dyn GroundInstantiator>,
    ) -> Result<Self, RuleError> {
        let clause = DnfClause::analyze(&formula, registry)?;
        Ok(Self {
            id: KernelId::new(),
            formula,
            clause,
            instantiator,
        })
    }

    /// This kernel's stable identity.
    #[must_use]
    pub const fn id(&self) -> KernelId {
        self.id
    }

    /// The original formula the kernel was built from.
    #[must_use]
    pub const fn formula(&self) -> &Formula {
        &self.formula
    }

    /// The validated clause.
    #[must_use]
    pub const fn clause(&self) -> &DnfClause {
        &self.clause
    }

    /// Enumerates every ground rule the clause induces against `manager`'s
    /// current view and inserts each into `store`, merging duplicates into
    /// multiplicity. Returns the number of result rows expanded.
    ///
    /// Rows are expanded in store result order, so ground rules land in a
    /// reproducible order when the store is deterministic.
    pub fn ground_all(
        &self,
        manager: &AtomManager,
        store: &mut GroundRuleStore,
    ) -> Result<usize, GroundingError> {
        let results = manager.execute_query(&self.clause.query())?;
        self.ground_rows(manager, store, &results, None)
    }

    /// Expands each result row into a ground rule. `partial`, when present,
    /// takes precedence over row values during substitution so that an
    /// activating atom's constants appear in the produced rules.
    fn ground_rows(
        &self,
        manager: &AtomManager,
        store: &mut GroundRuleStore,
        results: &ResultList,
        partial: Option<&VariableAssignment>,
    ) -> Result<usize, GroundingError> {
        let mut pos: Vec<Arc<GroundAtom>> = Vec::with_capacity(self.clause.pos_literals().len());
        let mut neg: Vec<Arc<GroundAtom>> = Vec::with_capacity(self.clause.neg_literals().len());

        for row in 0..results.len() {
            for literal in self.clause.pos_literals() {
                pos.push(self.ground_atom(manager, literal, results, row, partial)?);
            }
            for literal in self.clause.neg_literals() {
                neg.push(self.ground_atom(manager, literal, results, row, partial)?);
            }

            let candidate = self.instantiator.ground_instance(&pos, &neg);
            store.merge_or_insert(candidate);

            pos.clear();
            neg.clear();
        }
        Ok(results.len())
    }

    /// Substitutes one literal into a canonical ground atom for result row
    /// `row`. Ground terms pass through; variables resolve through `partial`
    /// first, then the row.
    fn ground_atom(
        &self,
        manager: &AtomManager,
        literal: &Atom,
        results: &ResultList,
        row: usize,
        partial: Option<&VariableAssignment>,
    ) -> Result<Arc<GroundAtom>, GroundingError> {
        let mut args = Vec::with_capacity(literal.arity());
        for term in &literal.args {
            match term {
                Term::Constant(c) => args.push(c.clone()),
                Term::Variable(v) => {
                    let value = partial
                        .and_then(|p| p.get(v))
                        .or_else(|| results.get(row, v))
                        .ok_or_else(|| GroundingError::UnboundQueryVariable {
                            variable: v.clone(),
                        })?;
                    args.push(value.clone());
                }
            }
        }
        manager.get_atom(literal.predicate, args)
    }

    /// Registers this kernel for activation events on every standard
    /// predicate of its clause.
    pub fn register_for_events(
        self: &Arc<Self>,
        framework: &AtomEventFramework,
    ) -> Result<RegistrationId, GroundingError> {
        let handler: Arc<dyn AtomEventHandler> = Arc::clone(self) as Arc<dyn AtomEventHandler>;
        framework.register_clause(&self.clause, handler, ACTIVATED_EVENT_SET)
    }

    /// Removes a registration made by [`register_for_events`](Self::register_for_events).
    pub fn unregister_from_events(
        &self,
        framework: &AtomEventFramework,
        id: RegistrationId,
    ) -> Result<(), GroundingError> {
        framework.unregister(id)
    }
}

impl AtomEventHandler for RuleKernel {
    /// Incremental grounding: for every way the activated atom unifies with
    /// a clause literal, reruns the query restricted by that partial
    /// assignment and expands the rows, merging into `store`.
    fn on_atom_activated(
        &self,
        event: &AtomEvent,
        manager: &AtomManager,
        store: &mut GroundRuleStore,
    ) -> Result<usize, GroundingError> {
        let mut expanded = 0;
        for partial in self.clause.trace_atom(&event.atom) {
            let query = self.clause.query().with_partial(partial.clone());
            let results = manager.execute_query(&query)?;
            expanded += self.ground_rows(manager, store, &results, Some(&partial))?;
        }
        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::logical::WeightedInstantiator;
    use crate::predicate::PredicateId;
    use crate::store::{DataStore, Inserter as _, MemoryDataStore, Partition};
    use crate::term::Constant;

    struct Fixture {
        manager: AtomManager,
        registry: Arc<PredicateRegistry>,
        friend: PredicateId,
        likes: PredicateId,
    }

    fn c(s: &str) -> Constant {
        Constant::from(s)
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(PredicateRegistry::new());
        let friend = registry.standard("Friend", 2).unwrap();
        let likes = registry.standard("Likes", 2).unwrap();

        let store = MemoryDataStore::new(Arc::clone(&registry));
        store.register_predicate(friend).unwrap();
        store.register_predicate(likes).unwrap();

        let obs = Partition::new(0);
        let friends = store.inserter(friend, obs).unwrap();
        friends.insert(vec![c("alice"), c("bob")]).unwrap();
        friends.insert(vec![c("bob"), c("carol")]).unwrap();
        let liked = store.inserter(likes, obs).unwrap();
        liked.insert(vec![c("alice"), c("tea")]).unwrap();
        liked.insert(vec![c("bob"), c("coffee")]).unwrap();

        let db = store.open_database(Partition::new(1), &[obs], &[]).unwrap();
        Fixture {
            manager: AtomManager::new(Arc::clone(&registry), db),
            registry,
            friend,
            likes,
        }
    }

    fn transitive_rule(f: &Fixture) -> RuleKernel {
        let formula = Formula::implies(
            Formula::And(vec![
                Formula::atom(Atom::new(f.friend, vec![Term::var("X"), Term::var("Y")])),
                Formula::atom(Atom::new(f.likes, vec![Term::var("X"), Term::var("Z")])),
            ]),
            Formula::atom(Atom::new(f.likes, vec![Term::var("Y"), Term::var("Z")])),
        );
        RuleKernel::new(formula, &f.registry, Box::new(WeightedInstantiator::new(1.0))).unwrap()
    }

    #[test]
    fn test_ground_all_expands_every_row() {
        let f = fixture();
        let kernel = transitive_rule(&f);
        let mut store = GroundRuleStore::new();

        let expanded = kernel.ground_all(&f.manager, &mut store).unwrap();
        assert_eq!(expanded, 2);
        assert_eq!(store.len(), 2);

        // Row order: (alice,bob,tea) then (bob,carol,coffee).
        let rules: Vec<&GroundRule> = store.iter().collect();
        assert_eq!(rules[0].pos_atoms()[0].args, vec![c("alice"), c("bob")]);
        assert_eq!(rules[0].neg_atoms()[0].args, vec![c("bob"), c("tea")]);
        assert_eq!(rules[1].pos_atoms()[0].args, vec![c("bob"), c("carol")]);
        assert_eq!(rules[1].neg_atoms()[0].args, vec![c("carol"), c("coffee")]);
    }

    #[test]
    fn test_ground_atoms_are_interned_handles() {
        let f = fixture();
        let kernel = transitive_rule(&f);
        let mut store = GroundRuleStore::new();
        kernel.ground_all(&f.manager, &mut store).unwrap();

        // Friend(alice,bob) in the first rule is the canonical atom.
        let canonical = f
            .manager
            .get_atom(f.friend, vec![c("alice"), c("bob")])
            .unwrap();
        let first = store.iter().next().unwrap();
        assert!(Arc::ptr_eq(&first.pos_atoms()[0], &canonical));
    }

    #[test]
    fn test_regrounding_only_increases_multiplicity() {
        let f = fixture();
        let kernel = transitive_rule(&f);
        let mut store = GroundRuleStore::new();

        kernel.ground_all(&f.manager, &mut store).unwrap();
        kernel.ground_all(&f.manager, &mut store).unwrap();

        assert_eq!(store.len(), 2);
        for rule in store.iter() {
            assert_eq!(rule.groundings(), 2);
        }
    }

    #[test]
    fn test_kernel_ids_are_distinct() {
        let f = fixture();
        let a = transitive_rule(&f);
        let b = transitive_rule(&f);
        assert_ne!(a.id(), b.id());
    }
}
