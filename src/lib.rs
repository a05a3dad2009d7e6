//! # groundling - Rule Grounding for Probabilistic Logic
//!
//! groundling is the grounding core of a probabilistic-logic reasoning
//! engine. A model is a set of first-order rules over predicates; grounding
//! instantiates those rules against a partitioned relational store of known
//! and candidate atoms, producing the ground rules downstream inference
//! consumes.
//!
//! ## Core Concepts
//!
//! - **Formula**: a tree over and/or/not/implies/equivalent with atom leaves
//! - **Clause**: the single-disjunction normal form a rule reduces to
//! - **Rule kernel**: a validated clause plus the grounding driver
//! - **Ground rule**: a fully ground rule instance with merge-on-duplicate
//!   multiplicity
//! - **Activation**: incremental regrounding when a new atom becomes
//!   relevant
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use groundling::{
//!     weighted_rule, Atom, AtomManager, DataStore, Formula, GroundRuleStore,
//!     MemoryDataStore, Partition, PredicateRegistry, Term,
//! };
//!
//! let registry = Arc::new(PredicateRegistry::new());
//! let friend = registry.standard("Friend", 2)?;
//! let likes = registry.standard("Likes", 2)?;
//!
//! // Friend(X,Y) & Likes(X,Z) -> Likes(Y,Z)
//! let formula = Formula::implies(
//!     Formula::And(vec![
//!         Formula::atom(Atom::new(friend, vec![Term::var("X"), Term::var("Y")])),
//!         Formula::atom(Atom::new(likes, vec![Term::var("X"), Term::var("Z")])),
//!     ]),
//!     Formula::atom(Atom::new(likes, vec![Term::var("Y"), Term::var("Z")])),
//! );
//!
//! let store = MemoryDataStore::new(Arc::clone(&registry));
//! let db = store.open_database(Partition::new(1), &[Partition::new(0)], &[])?;
//! let manager = AtomManager::new(Arc::clone(&registry), db);
//!
//! let kernel = weighted_rule(formula, &registry, 1.0)?;
//! let mut ground_rules = GroundRuleStore::new();
//! kernel.ground_all(&manager, &mut ground_rules)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Model types
pub mod atom;
pub mod error;
pub mod formula;
pub mod predicate;
pub mod term;

// Clause analysis and queries
pub mod clause;
pub mod query;

// Grounding runtime
pub mod events;
pub mod groundrule;
pub mod groundstore;
pub mod kernel;
pub mod manager;
pub mod store;

// Re-export primary types at crate root for convenience
pub use atom::{Atom, AtomKey, GroundAtom};
pub use clause::DnfClause;
pub use error::{Error, GroundingError, Result, RuleError, StoreError};
pub use events::{
    AtomEvent, AtomEventFramework, AtomEventHandler, AtomEventKind, EventFrameworkConfig,
    RegistrationId, ACTIVATED_EVENT_SET,
};
pub use formula::{Formula, Literal};
pub use groundrule::{GroundRule, GroundRuleKey};
pub use groundstore::{GroundRuleStore, MergeOutcome};
pub use kernel::{
    constraint_rule, weighted_rule, ConstraintInstantiator, GroundInstantiator, KernelId,
    RuleKernel, WeightedInstantiator,
};
pub use manager::AtomManager;
pub use predicate::{Predicate, PredicateId, PredicateKind, PredicateRegistry};
pub use query::{ConjunctiveQuery, ResultList, VariableAssignment};
pub use store::{DataStore, Database, Inserter, MemoryDataStore, Partition};
pub use term::{Constant, Term, Variable};
