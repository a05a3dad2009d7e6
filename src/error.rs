//! Error types for groundling.
//!
//! Errors are strongly typed with thiserror and split by failure family:
//! rule construction/validation, runtime grounding, and storage. The
//! top-level [`Error`] wraps all three for callers that do not need to
//! distinguish.

use thiserror::Error;

use crate::term::Variable;

/// Errors raised while validating a formula into a rule kernel.
///
/// Construction errors are fatal to the rule being built; no partial kernel
/// is ever returned.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The negated formula does not reduce to a single DNF clause.
    #[error("formula must be equivalent to a single disjunction of literals")]
    MultipleClauses,

    /// A variable is never bound by a queried literal over a standard predicate.
    #[error("variable {variable} must appear in at least one queried literal over a standard predicate")]
    UnboundVariable {
        /// The offending variable.
        variable: Variable,
    },

    /// The formula contains no variables.
    #[error("formula has no variables")]
    GroundFormula,

    /// The clause cannot be mapped to a conjunctive query.
    #[error("clause is not queriable: {reason}")]
    NotQueriable {
        /// Why query construction failed.
        reason: String,
    },

    /// An atom uses a predicate id unknown to the registry.
    #[error("unregistered predicate: {id}")]
    UnknownPredicate {
        /// The unregistered id.
        id: crate::predicate::PredicateId,
    },

    /// An atom's argument count disagrees with its predicate's arity.
    #[error("atom over {predicate} has {actual} arguments, expected {expected}")]
    ArityMismatch {
        /// Predicate name.
        predicate: String,
        /// Declared arity.
        expected: usize,
        /// Argument count found.
        actual: usize,
    },
}

/// Errors raised while grounding a validated kernel.
#[derive(Debug, Error)]
pub enum GroundingError {
    /// A clause variable was absent from both the partial assignment and the
    /// query result row. Internal invariant breach.
    #[error("query result is missing a binding for variable {variable}")]
    UnboundQueryVariable {
        /// The unbound variable.
        variable: Variable,
    },

    /// The activation event queue is at capacity.
    #[error("activation queue is full (capacity={capacity})")]
    QueueFull {
        /// Queue capacity.
        capacity: usize,
    },

    /// The event framework worker side disconnected.
    #[error("event framework disconnected")]
    Disconnected,

    /// A handler was unregistered with a token the framework does not know.
    #[error("unknown event registration: {id}")]
    UnknownRegistration {
        /// The missing registration token.
        id: crate::events::RegistrationId,
    },

    /// Store failure during a grounding query. Propagated unchanged; the
    /// grounder performs no retries.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised by the partitioned data store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Predicate name registered with a conflicting arity or kind.
    #[error("predicate {name} is already registered with a different signature")]
    PredicateMismatch {
        /// Conflicting name.
        name: String,
    },

    /// Predicate id not registered with this store.
    #[error("predicate not registered with data store: {id}")]
    UnknownPredicate {
        /// The unregistered id.
        id: crate::predicate::PredicateId,
    },

    /// Row arity disagrees with the predicate's relation.
    #[error("row for {predicate} has {actual} argument columns, expected {expected}")]
    RowArityMismatch {
        /// Predicate name.
        predicate: String,
        /// Declared arity.
        expected: usize,
        /// Column count found.
        actual: usize,
    },

    /// The requested write partition is already in use by an open database.
    #[error("write partition {partition} is already in use by another open database")]
    WritePartitionInUse {
        /// The contested partition.
        partition: crate::store::Partition,
    },

    /// A requested read partition is another open database's write partition.
    #[error("read partition {partition} is being written by another open database")]
    ReadPartitionInUse {
        /// The contested partition.
        partition: crate::store::Partition,
    },

    /// A partition cannot take bulk inserts while a database holds it.
    #[error("partition {partition} is in use by an open database, cannot insert into it")]
    PartitionInUse {
        /// The contested partition.
        partition: crate::store::Partition,
    },

    /// A queried predicate is derived and has no relation.
    #[error("derived predicate {name} cannot be queried")]
    DerivedNotQueriable {
        /// Predicate name.
        name: String,
    },

    /// Backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Top-level error type for groundling.
#[derive(Debug, Error)]
pub enum Error {
    /// Rule construction/validation failed.
    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    /// Grounding failed at runtime.
    #[error("grounding error: {0}")]
    Grounding(#[from] GroundingError),

    /// Storage failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    /// Returns true if this is a rule validation error.
    #[must_use]
    pub const fn is_rule(&self) -> bool {
        matches!(self, Self::Rule(_))
    }

    /// Returns true if this is a runtime grounding error.
    #[must_use]
    pub const fn is_grounding(&self) -> bool {
        matches!(self, Self::Grounding(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Result alias for groundling operations.
pub type Result<T> = std::result::Result<T, Error>;
