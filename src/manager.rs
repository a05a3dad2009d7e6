//! Atom manager: canonical ground atoms and query dispatch.
//!
//! The atom manager interns ground atoms so that equal identity means the
//! same `Arc`, and forwards grounding queries to the database view it wraps.
//! Ground rules share atom handles through it; only the manager mutates the
//! interning table.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::atom::{AtomKey, GroundAtom};
use crate::error::{GroundingError, StoreError};
use crate::predicate::{PredicateId, PredicateRegistry};
use crate::query::{ConjunctiveQuery, ResultList};
use crate::store::Database;
use crate::term::Constant;

/// Canonical atom table plus query dispatch over one database view.
pub struct AtomManager {
    registry: Arc<PredicateRegistry>,
    database: Box<dyn Database>,
    interned: RwLock<HashMap<AtomKey, Arc<GroundAtom>>>,
}

impl std::fmt::Debug for AtomManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomManager")
            .field("interned", &self.interned_count())
            .finish_non_exhaustive()
    }
}

impl AtomManager {
    /// Creates a manager over a database view.
    #[must_use]
    pub fn new(registry: Arc<PredicateRegistry>, database: Box<dyn Database>) -> Self {
        Self {
            registry,
            database,
            interned: RwLock::new(HashMap::new()),
        }
    }

    /// The predicate registry shared with the store.
    #[must_use]
    pub fn registry(&self) -> &Arc<PredicateRegistry> {
        &self.registry
    }

    /// The underlying database view.
    #[must_use]
    pub fn database(&self) -> &dyn Database {
        self.database.as_ref()
    }

    /// Runs `query` over the current database view, materializing rows.
    ///
    /// # Errors
    /// Store failures propagate unchanged; no retries.
    pub fn execute_query(&self, query: &ConjunctiveQuery) -> Result<ResultList, GroundingError> {
        Ok(self.database.execute_query(query)?)
    }

    /// Interning constructor: returns the canonical atom for
    /// `(predicate, args)`, creating it if absent.
    ///
    /// # Errors
    /// `Store(Backend)` only on a poisoned interning lock.
    pub fn get_atom(
        &self,
        predicate: PredicateId,
        args: Vec<Constant>,
    ) -> Result<Arc<GroundAtom>, GroundingError> {
        let key = AtomKey {
            predicate,
            args: args.clone(),
        };

        {
            let interned = self
                .interned
                .read()
                .map_err(|_| StoreError::Backend("poisoned atom table lock".to_string()))?;
            if let Some(atom) = interned.get(&key) {
                return Ok(Arc::clone(atom));
            }
        }

        let mut interned = self
            .interned
            .write()
            .map_err(|_| StoreError::Backend("poisoned atom table lock".to_string()))?;
        // Another thread may have interned between the read and write locks.
        if let Some(atom) = interned.get(&key) {
            return Ok(Arc::clone(atom));
        }
        let atom = Arc::new(GroundAtom::new(predicate, args));
        interned.insert(key, Arc::clone(&atom));
        Ok(atom)
    }

    /// Number of canonical atoms currently interned.
    #[must_use]
    pub fn interned_count(&self) -> usize {
        self.interned.read().map(|t| t.len()).unwrap_or(0)
    }
}
