//! Abstract storage traits for the grounding pipeline.
//!
//! These traits define the contract the grounder requires of a data store:
//! parameterized conjunctive queries over a pinned read-partition view, and
//! writes confined to a single write partition. Using traits keeps the
//! in-memory backend, tests, and any persistent backend interchangeable.

use crate::atom::GroundAtom;
use crate::error::StoreError;
use crate::predicate::PredicateId;
use crate::query::{ConjunctiveQuery, ResultList};
use crate::store::Partition;

/// A partitioned relational store of ground-atom rows.
///
/// Each standard predicate corresponds to one relation with columns
/// `(arg_1, …, arg_k, partition_id, value, confidence?)`. The store promises
/// selections on argument columns, equi-joins across shared variables, and
/// partition restriction; nothing else.
pub trait DataStore: Send + Sync {
    /// Creates the relation for a standard predicate. Idempotent.
    ///
    /// # Errors
    /// `DerivedNotQueriable` if the predicate is derived;
    /// `UnknownPredicate` if the id is not in the registry.
    fn register_predicate(&self, predicate: PredicateId) -> Result<(), StoreError>;

    /// Opens a database view over `write` plus the given read partitions.
    ///
    /// Partition exclusivity: the write partition must not be a read or
    /// write partition of any other open database, and no read partition may
    /// be another open database's write partition. Violations fail
    /// deterministically; nothing is acquired on error.
    fn open_database(
        &self,
        write: Partition,
        read: &[Partition],
        closed_predicates: &[PredicateId],
    ) -> Result<Box<dyn Database>, StoreError>;

    /// Returns a bulk-loading handle for `(predicate, partition)`.
    ///
    /// # Errors
    /// `PartitionInUse` if the partition belongs to an open database.
    fn inserter(
        &self,
        predicate: PredicateId,
        partition: Partition,
    ) -> Result<Box<dyn Inserter>, StoreError>;
}

/// A view over one write partition and a set of read partitions.
///
/// Dropping the database releases its partitions for reuse; release happens
/// on all exit paths.
pub trait Database: Send + Sync + std::fmt::Debug {
    /// Executes a conjunctive query over the read partitions plus the write
    /// partition, in that order, materializing all rows.
    ///
    /// The query's partial assignment is applied as additional equality
    /// selections. Row order is deterministic for a deterministic backend:
    /// partitions in view order, rows in insertion order.
    fn execute_query(&self, query: &ConjunctiveQuery) -> Result<ResultList, StoreError>;

    /// Writes (or overwrites) a ground atom's row in the write partition.
    fn commit_atom(
        &self,
        atom: &GroundAtom,
        value: f64,
        confidence: Option<f64>,
    ) -> Result<(), StoreError>;

    /// The pinned write partition.
    fn write_partition(&self) -> Partition;

    /// The pinned read partitions, in view order.
    fn read_partitions(&self) -> Vec<Partition>;

    /// True if `predicate` was opened as closed-world in this view.
    fn is_closed(&self, predicate: PredicateId) -> bool;
}

/// Bulk loader bound to a `(predicate, partition)` pair.
pub trait Inserter: Send + std::fmt::Debug {
    /// Inserts a row with value 1.0 and no confidence.
    fn insert(&self, args: Vec<crate::term::Constant>) -> Result<(), StoreError>;

    /// Inserts a row with an explicit value and optional confidence.
    fn insert_value(
        &self,
        args: Vec<crate::term::Constant>,
        value: f64,
        confidence: Option<f64>,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure traits are object-safe.
    fn _assert_data_store_object_safe(_: &dyn DataStore) {}
    fn _assert_database_object_safe(_: &dyn Database) {}
    fn _assert_inserter_object_safe(_: &dyn Inserter) {}
}
