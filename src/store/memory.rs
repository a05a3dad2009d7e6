//! In-memory partitioned data store.
//!
//! Thread-safe reference implementation of the storage traits, intended for
//! embedded usage and tests. Rows are kept per predicate in insertion order;
//! queries run as nested-loop joins in literal order, so result order is
//! fully deterministic.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use crate::atom::GroundAtom;
use crate::error::StoreError;
use crate::predicate::{PredicateId, PredicateRegistry};
use crate::query::{ConjunctiveQuery, ResultList, VariableAssignment};
use crate::store::traits::{DataStore, Database, Inserter};
use crate::store::Partition;
use crate::term::{Constant, Term};

fn lock_err(context: &'static str) -> StoreError {
    StoreError::Backend(format!("poisoned lock: {context}"))
}

#[derive(Debug, Clone)]
struct StoredRow {
    partition: Partition,
    args: Vec<Constant>,
    value: f64,
    confidence: Option<f64>,
}

#[derive(Debug, Default)]
struct OpenState {
    write_partitions: HashSet<Partition>,
    read_counts: HashMap<Partition, usize>,
}

#[derive(Debug)]
struct Inner {
    registry: Arc<PredicateRegistry>,
    tables: RwLock<HashMap<PredicateId, Vec<StoredRow>>>,
    open: Mutex<OpenState>,
}

impl Inner {
    fn standard_arity(&self, predicate: PredicateId) -> Result<usize, StoreError> {
        let Some(pred) = self.registry.get(predicate) else {
            return Err(StoreError::UnknownPredicate { id: predicate });
        };
        if !pred.is_standard() {
            return Err(StoreError::DerivedNotQueriable { name: pred.name });
        }
        Ok(pred.arity)
    }

    fn check_row_arity(&self, predicate: PredicateId, args: &[Constant]) -> Result<(), StoreError> {
        let arity = self.standard_arity(predicate)?;
        if args.len() != arity {
            let name = self
                .registry
                .get(predicate)
                .map_or_else(|| predicate.to_string(), |p| p.name);
            return Err(StoreError::RowArityMismatch {
                predicate: name,
                expected: arity,
                actual: args.len(),
            });
        }
        Ok(())
    }

    fn partition_in_use(&self, partition: Partition) -> Result<bool, StoreError> {
        let open = self.open.lock().map_err(|_| lock_err("open.partition_in_use"))?;
        Ok(open.write_partitions.contains(&partition)
            || open.read_counts.contains_key(&partition))
    }

    fn push_row(&self, predicate: PredicateId, row: StoredRow) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| lock_err("tables.push_row"))?;
        let Some(table) = tables.get_mut(&predicate) else {
            return Err(StoreError::UnknownPredicate { id: predicate });
        };
        table.push(row);
        Ok(())
    }
}

/// Thread-safe in-memory data store.
///
/// Open databases and their partition claims are tracked internally; the
/// exclusivity invariants are enforced at `open_database` time and released
/// when the database is dropped.
#[derive(Debug)]
pub struct MemoryDataStore {
    inner: Arc<Inner>,
}

impl MemoryDataStore {
    /// Creates an empty store over the given predicate registry.
    #[must_use]
    pub fn new(registry: Arc<PredicateRegistry>) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                tables: RwLock::new(HashMap::new()),
                open: Mutex::new(OpenState::default()),
            }),
        }
    }

    /// The predicate registry this store resolves ids against.
    #[must_use]
    pub fn registry(&self) -> &Arc<PredicateRegistry> {
        &self.inner.registry
    }

    /// Total row count for a predicate across all partitions.
    #[must_use]
    pub fn row_count(&self, predicate: PredicateId) -> usize {
        self.inner
            .tables
            .read()
            .ok()
            .and_then(|t| t.get(&predicate).map(Vec::len))
            .unwrap_or(0)
    }

    /// Deletes every row in `partition`, returning the number removed.
    ///
    /// # Errors
    /// `PartitionInUse` if an open database holds the partition.
    pub fn delete_partition(&self, partition: Partition) -> Result<usize, StoreError> {
        if self.inner.partition_in_use(partition)? {
            return Err(StoreError::PartitionInUse { partition });
        }
        let mut tables = self
            .inner
            .tables
            .write()
            .map_err(|_| lock_err("tables.delete_partition"))?;
        let mut removed = 0;
        for table in tables.values_mut() {
            let before = table.len();
            table.retain(|row| row.partition != partition);
            removed += before - table.len();
        }
        Ok(removed)
    }
}

impl DataStore for MemoryDataStore {
    fn register_predicate(&self, predicate: PredicateId) -> Result<(), StoreError> {
        self.inner.standard_arity(predicate)?;
        let mut tables = self
            .inner
            .tables
            .write()
            .map_err(|_| lock_err("tables.register"))?;
        tables.entry(predicate).or_default();
        Ok(())
    }

    fn open_database(
        &self,
        write: Partition,
        read: &[Partition],
        closed_predicates: &[PredicateId],
    ) -> Result<Box<dyn Database>, StoreError> {
        // Dedupe while preserving view order.
        let mut read_view: Vec<Partition> = Vec::with_capacity(read.len());
        for &p in read {
            if p == write {
                return Err(StoreError::Backend(format!(
                    "{p} cannot be both the write and a read partition of one database"
                )));
            }
            if !read_view.contains(&p) {
                read_view.push(p);
            }
        }

        let mut open = self.inner.open.lock().map_err(|_| lock_err("open.acquire"))?;
        if open.write_partitions.contains(&write) || open.read_counts.contains_key(&write) {
            return Err(StoreError::WritePartitionInUse { partition: write });
        }
        for &p in &read_view {
            if open.write_partitions.contains(&p) {
                return Err(StoreError::ReadPartitionInUse { partition: p });
            }
        }

        open.write_partitions.insert(write);
        for &p in &read_view {
            *open.read_counts.entry(p).or_insert(0) += 1;
        }
        drop(open);

        Ok(Box::new(MemoryDatabase {
            inner: Arc::clone(&self.inner),
            write,
            read: read_view,
            closed: closed_predicates.iter().copied().collect(),
        }))
    }

    fn inserter(
        &self,
        predicate: PredicateId,
        partition: Partition,
    ) -> Result<Box<dyn Inserter>, StoreError> {
        self.inner.standard_arity(predicate)?;
        if self.inner.partition_in_use(partition)? {
            return Err(StoreError::PartitionInUse { partition });
        }
        self.register_predicate(predicate)?;
        Ok(Box::new(MemoryInserter {
            inner: Arc::clone(&self.inner),
            predicate,
            partition,
        }))
    }
}

/// Database view produced by [`MemoryDataStore::open_database`].
#[derive(Debug)]
pub struct MemoryDatabase {
    inner: Arc<Inner>,
    write: Partition,
    read: Vec<Partition>,
    closed: HashSet<PredicateId>,
}

impl MemoryDatabase {
    /// Partitions visible to queries: reads in view order, then the write
    /// partition.
    fn view(&self) -> Vec<Partition> {
        let mut view = self.read.clone();
        view.push(self.write);
        view
    }
}

impl Database for MemoryDatabase {
    fn execute_query(&self, query: &ConjunctiveQuery) -> Result<ResultList, StoreError> {
        for atom in &query.atoms {
            let arity = self.inner.standard_arity(atom.predicate)?;
            if atom.arity() != arity {
                let name = self
                    .inner
                    .registry
                    .get(atom.predicate)
                    .map_or_else(|| atom.predicate.to_string(), |p| p.name);
                return Err(StoreError::RowArityMismatch {
                    predicate: name,
                    expected: arity,
                    actual: atom.arity(),
                });
            }
        }

        let tables = self.inner.tables.read().map_err(|_| lock_err("tables.query"))?;
        for atom in &query.atoms {
            if !tables.contains_key(&atom.predicate) {
                return Err(StoreError::UnknownPredicate { id: atom.predicate });
            }
        }

        let view = self.view();
        let mut results = ResultList::new(&query.projection);
        join_atoms(
            &tables,
            &view,
            &query.atoms,
            &query.partial,
            &query.projection,
            &mut results,
        )?;
        Ok(results)
    }

    fn commit_atom(
        &self,
        atom: &GroundAtom,
        value: f64,
        confidence: Option<f64>,
    ) -> Result<(), StoreError> {
        self.inner.check_row_arity(atom.predicate, &atom.args)?;

        let mut tables = self.inner.tables.write().map_err(|_| lock_err("tables.commit"))?;
        let Some(table) = tables.get_mut(&atom.predicate) else {
            return Err(StoreError::UnknownPredicate {
                id: atom.predicate,
            });
        };
        if let Some(row) = table
            .iter_mut()
            .find(|r| r.partition == self.write && r.args == atom.args)
        {
            row.value = value;
            row.confidence = confidence;
        } else {
            table.push(StoredRow {
                partition: self.write,
                args: atom.args.clone(),
                value,
                confidence,
            });
        }
        Ok(())
    }

    fn write_partition(&self) -> Partition {
        self.write
    }

    fn read_partitions(&self) -> Vec<Partition> {
        self.read.clone()
    }

    fn is_closed(&self, predicate: PredicateId) -> bool {
        self.closed.contains(&predicate)
    }
}

impl Drop for MemoryDatabase {
    fn drop(&mut self) {
        // Release the partition claims. A poisoned lock means the process is
        // already failing; nothing sensible to do here.
        let Ok(mut open) = self.inner.open.lock() else {
            return;
        };
        open.write_partitions.remove(&self.write);
        for p in &self.read {
            if let Some(count) = open.read_counts.get_mut(p) {
                *count -= 1;
                if *count == 0 {
                    open.read_counts.remove(p);
                }
            }
        }
    }
}

/// Bulk loader produced by [`MemoryDataStore::inserter`].
#[derive(Debug)]
pub struct MemoryInserter {
    inner: Arc<Inner>,
    predicate: PredicateId,
    partition: Partition,
}

impl Inserter for MemoryInserter {
    fn insert(&self, args: Vec<Constant>) -> Result<(), StoreError> {
        self.insert_value(args, 1.0, None)
    }

    fn insert_value(
        &self,
        args: Vec<Constant>,
        value: f64,
        confidence: Option<f64>,
    ) -> Result<(), StoreError> {
        self.inner.check_row_arity(self.predicate, &args)?;
        self.inner.push_row(
            self.predicate,
            StoredRow {
                partition: self.partition,
                args,
                value,
                confidence,
            },
        )
    }
}

/// Nested-loop join over the queried atoms, in literal order. Emits one
/// result row per total assignment, partitions in view order and stored rows
/// in insertion order.
fn join_atoms(
    tables: &HashMap<PredicateId, Vec<StoredRow>>,
    view: &[Partition],
    atoms: &[crate::atom::Atom],
    bindings: &VariableAssignment,
    projection: &[crate::term::Variable],
    out: &mut ResultList,
) -> Result<(), StoreError> {
    let Some((atom, rest)) = atoms.split_first() else {
        let mut row = Vec::with_capacity(projection.len());
        for v in projection {
            let value = bindings
                .get(v)
                .ok_or_else(|| StoreError::Backend(format!("projection variable {v} unbound")))?;
            row.push(value.clone());
        }
        out.push_row(row);
        return Ok(());
    };

    let Some(table) = tables.get(&atom.predicate) else {
        return Err(StoreError::UnknownPredicate { id: atom.predicate });
    };

    for &partition in view {
        for stored in table.iter().filter(|r| r.partition == partition) {
            if let Some(extended) = extend_bindings(atom, &stored.args, bindings) {
                join_atoms(tables, view, rest, &extended, projection, out)?;
            }
        }
    }
    Ok(())
}

/// Matches one atom against one stored row under the current bindings.
/// Constants are selections; variables either agree with their binding or
/// extend it.
fn extend_bindings(
    atom: &crate::atom::Atom,
    values: &[Constant],
    bindings: &VariableAssignment,
) -> Option<VariableAssignment> {
    if atom.args.len() != values.len() {
        return None;
    }
    let mut extended = bindings.clone();
    for (term, value) in atom.args.iter().zip(values.iter()) {
        match term {
            Term::Constant(c) => {
                if c != value {
                    return None;
                }
            }
            Term::Variable(v) => match extended.get(v) {
                Some(bound) if bound != value => return None,
                Some(_) => {}
                None => extended.bind(v.clone(), value.clone()),
            },
        }
    }
    Some(extended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::term::Variable;

    struct Fixture {
        store: MemoryDataStore,
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
        let store = MemoryDataStore::new(registry);
        store.register_predicate(friend).unwrap();
        store.register_predicate(likes).unwrap();
        Fixture {
            store,
            friend,
            likes,
        }
    }

    fn load_social_graph(f: &Fixture, partition: Partition) {
        let friends = f.store.inserter(f.friend, partition).unwrap();
        friends.insert(vec![c("alice"), c("bob")]).unwrap();
        friends.insert(vec![c("bob"), c("carol")]).unwrap();

        let likes = f.store.inserter(f.likes, partition).unwrap();
        likes.insert(vec![c("alice"), c("tea")]).unwrap();
        likes.insert(vec![c("bob"), c("coffee")]).unwrap();
    }

    #[test]
    fn test_join_query() {
        let f = fixture();
        let obs = Partition::new(0);
        load_social_graph(&f, obs);

        let db = f
            .store
            .open_database(Partition::new(1), &[obs], &[])
            .unwrap();
        let query = ConjunctiveQuery::new(vec![
            Atom::new(f.friend, vec![Term::var("X"), Term::var("Y")]),
            Atom::new(f.likes, vec![Term::var("X"), Term::var("Z")]),
        ]);
        let res = db.execute_query(&query).unwrap();

        assert_eq!(res.len(), 2);
        let x = Variable::new("X");
        let z = Variable::new("Z");
        assert_eq!(res.get(0, &x), Some(&c("alice")));
        assert_eq!(res.get(0, &z), Some(&c("tea")));
        assert_eq!(res.get(1, &x), Some(&c("bob")));
        assert_eq!(res.get(1, &z), Some(&c("coffee")));
    }

    #[test]
    fn test_query_with_partial_assignment() {
        let f = fixture();
        let obs = Partition::new(0);
        load_social_graph(&f, obs);

        let db = f
            .store
            .open_database(Partition::new(1), &[obs], &[])
            .unwrap();
        let mut partial = VariableAssignment::new();
        partial.bind(Variable::new("X"), c("bob"));

        let query = ConjunctiveQuery::new(vec![Atom::new(
            f.friend,
            vec![Term::var("X"), Term::var("Y")],
        )])
        .with_partial(partial);
        let res = db.execute_query(&query).unwrap();

        assert_eq!(res.len(), 1);
        assert_eq!(res.get(0, &Variable::new("Y")), Some(&c("carol")));
        // Bound variables stay projected.
        assert_eq!(res.get(0, &Variable::new("X")), Some(&c("bob")));
    }

    #[test]
    fn test_constant_selection() {
        let f = fixture();
        let obs = Partition::new(0);
        load_social_graph(&f, obs);

        let db = f
            .store
            .open_database(Partition::new(1), &[obs], &[])
            .unwrap();
        let query = ConjunctiveQuery::new(vec![Atom::new(
            f.likes,
            vec![Term::var("W"), Term::Constant(c("coffee"))],
        )]);
        let res = db.execute_query(&query).unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res.get(0, &Variable::new("W")), Some(&c("bob")));
    }

    #[test]
    fn test_write_partition_visible_to_queries() {
        let f = fixture();
        let db = f
            .store
            .open_database(Partition::new(1), &[Partition::new(0)], &[])
            .unwrap();

        let atom = GroundAtom::new(f.friend, vec![c("dan"), c("erin")]);
        db.commit_atom(&atom, 1.0, None).unwrap();

        let query = ConjunctiveQuery::new(vec![Atom::new(
            f.friend,
            vec![Term::var("X"), Term::var("Y")],
        )]);
        assert_eq!(db.execute_query(&query).unwrap().len(), 1);
    }

    #[test]
    fn test_commit_overwrites_existing_row() {
        let f = fixture();
        let db = f
            .store
            .open_database(Partition::new(1), &[], &[])
            .unwrap();
        let atom = GroundAtom::new(f.friend, vec![c("dan"), c("erin")]);
        db.commit_atom(&atom, 1.0, None).unwrap();
        db.commit_atom(&atom, 0.5, Some(0.9)).unwrap();
        assert_eq!(f.store.row_count(f.friend), 1);
    }

    #[test]
    fn test_partition_exclusivity() {
        let f = fixture();
        let write = Partition::new(1);
        let obs = Partition::new(0);

        let _db = f.store.open_database(write, &[obs], &[]).unwrap();

        // Same write partition again.
        assert!(matches!(
            f.store.open_database(write, &[], &[]).unwrap_err(),
            StoreError::WritePartitionInUse { .. }
        ));
        // Another database's read partition as write.
        assert!(matches!(
            f.store.open_database(obs, &[], &[]).unwrap_err(),
            StoreError::WritePartitionInUse { .. }
        ));
        // Another database's write partition as read.
        assert!(matches!(
            f.store
                .open_database(Partition::new(2), &[write], &[])
                .unwrap_err(),
            StoreError::ReadPartitionInUse { .. }
        ));
    }

    #[test]
    fn test_partitions_released_on_drop() {
        let f = fixture();
        let write = Partition::new(1);
        {
            let _db = f.store.open_database(write, &[Partition::new(0)], &[]).unwrap();
        }
        // Released; reopening succeeds.
        let _db = f.store.open_database(write, &[Partition::new(0)], &[]).unwrap();
    }

    #[test]
    fn test_inserter_refused_for_open_partition() {
        let f = fixture();
        let write = Partition::new(1);
        let obs = Partition::new(0);
        let _db = f.store.open_database(write, &[obs], &[]).unwrap();

        assert!(matches!(
            f.store.inserter(f.friend, write).unwrap_err(),
            StoreError::PartitionInUse { .. }
        ));
        assert!(matches!(
            f.store.inserter(f.friend, obs).unwrap_err(),
            StoreError::PartitionInUse { .. }
        ));
    }

    #[test]
    fn test_row_arity_checked() {
        let f = fixture();
        let ins = f.store.inserter(f.friend, Partition::new(0)).unwrap();
        assert!(matches!(
            ins.insert(vec![c("alice")]).unwrap_err(),
            StoreError::RowArityMismatch { .. }
        ));
    }

    #[test]
    fn test_delete_partition() {
        let f = fixture();
        let obs = Partition::new(0);
        load_social_graph(&f, obs);
        assert_eq!(f.store.delete_partition(obs).unwrap(), 4);
        assert_eq!(f.store.row_count(f.friend), 0);

        let _db = f.store.open_database(Partition::new(1), &[obs], &[]).unwrap();
        assert!(matches!(
            f.store.delete_partition(obs).unwrap_err(),
            StoreError::PartitionInUse { .. }
        ));
    }

    #[test]
    fn test_closed_predicates_recorded() {
        let f = fixture();
        let db = f
            .store
            .open_database(Partition::new(1), &[], &[f.friend])
            .unwrap();
        assert!(db.is_closed(f.friend));
        assert!(!db.is_closed(f.likes));
    }
}
