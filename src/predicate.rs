//! Predicates and the predicate registry.
//!
//! Predicates are named, arity-typed symbols. They are owned by a
//! [`PredicateRegistry`] and referenced everywhere else by [`PredicateId`],
//! which keeps atoms, clauses, and ground rules free of back-pointers.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Stable identifier for a registered predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredicateId(u32);

impl PredicateId {
    /// Returns the raw id.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pred:{}", self.0)
    }
}

/// Whether a predicate is backed by a relation in the data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    /// Backed by a table; may appear in queried literals.
    Standard,
    /// Computed; never queried directly.
    Derived,
}

/// A named, arity-typed predicate symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Registry-issued id.
    pub id: PredicateId,
    /// Symbol name, unique within a registry.
    pub name: String,
    /// Number of argument positions.
    pub arity: usize,
    /// Standard or derived.
    pub kind: PredicateKind,
}

impl Predicate {
    /// Returns true if this predicate is backed by a store relation.
    #[must_use]
    pub const fn is_standard(&self) -> bool {
        matches!(self.kind, PredicateKind::Standard)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    predicates: Vec<Predicate>,
    by_name: HashMap<String, PredicateId>,
}

/// Owner of all predicate symbols.
///
/// Ids are issued in registration order and never reused. Registering the
/// same name twice returns the existing id when name, arity, and kind agree,
/// and fails otherwise.
#[derive(Debug, Default)]
pub struct PredicateRegistry {
    state: RwLock<RegistryState>,
}

impl PredicateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a standard predicate, returning its id.
    ///
    /// # Errors
    /// `StoreError::PredicateMismatch` if the name is already registered with
    /// a different arity or kind.
    pub fn standard(&self, name: &str, arity: usize) -> Result<PredicateId, StoreError> {
        self.register(name, arity, PredicateKind::Standard)
    }

    /// Registers a derived predicate, returning its id.
    ///
    /// # Errors
    /// `StoreError::PredicateMismatch` if the name is already registered with
    /// a different arity or kind.
    pub fn derived(&self, name: &str, arity: usize) -> Result<PredicateId, StoreError> {
        self.register(name, arity, PredicateKind::Derived)
    }

    fn register(
        &self,
        name: &str,
        arity: usize,
        kind: PredicateKind,
    ) -> Result<PredicateId, StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Backend("poisoned registry lock".to_string()))?;

        if let Some(&id) = state.by_name.get(name) {
            let existing = &state.predicates[id.0 as usize];
            if existing.arity != arity || existing.kind != kind {
                return Err(StoreError::PredicateMismatch {
                    name: name.to_string(),
                });
            }
            return Ok(id);
        }

        let id = PredicateId(u32::try_from(state.predicates.len()).map_err(|_| {
            StoreError::Backend("predicate registry capacity exceeded".to_string())
        })?);
        state.predicates.push(Predicate {
            id,
            name: name.to_string(),
            arity,
            kind,
        });
        state.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Looks up a predicate by id.
    #[must_use]
    pub fn get(&self, id: PredicateId) -> Option<Predicate> {
        let state = self.state.read().ok()?;
        state.predicates.get(id.0 as usize).cloned()
    }

    /// Looks up a predicate id by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<PredicateId> {
        let state = self.state.read().ok()?;
        state.by_name.get(name).copied()
    }

    /// Returns true if `id` names a standard predicate.
    #[must_use]
    pub fn is_standard(&self, id: PredicateId) -> bool {
        self.get(id).is_some_and(|p| p.is_standard())
    }

    /// Returns the arity of `id`, if registered.
    #[must_use]
    pub fn arity(&self, id: PredicateId) -> Option<usize> {
        self.get(id).map(|p| p.arity)
    }

    /// All registered standard predicates, in registration order.
    #[must_use]
    pub fn standard_predicates(&self) -> Vec<Predicate> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        state
            .predicates
            .iter()
            .filter(|p| p.is_standard())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = PredicateRegistry::new();
        let friend = registry.standard("Friend", 2).unwrap();
        let likes = registry.standard("Likes", 2).unwrap();
        assert_ne!(friend, likes);

        let p = registry.get(friend).unwrap();
        assert_eq!(p.name, "Friend");
        assert_eq!(p.arity, 2);
        assert!(p.is_standard());
        assert_eq!(registry.by_name("Friend"), Some(friend));
    }

    #[test]
    fn test_reregister_same_signature_is_idempotent() {
        let registry = PredicateRegistry::new();
        let a = registry.standard("P", 1).unwrap();
        let b = registry.standard("P", 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reregister_conflicting_signature_fails() {
        let registry = PredicateRegistry::new();
        registry.standard("P", 1).unwrap();
        assert!(registry.standard("P", 2).is_err());
        assert!(registry.derived("P", 1).is_err());
    }

    #[test]
    fn test_derived_predicates_are_not_standard() {
        let registry = PredicateRegistry::new();
        let sim = registry.derived("Similar", 2).unwrap();
        assert!(!registry.is_standard(sim));
        assert!(registry.standard_predicates().is_empty());
    }

    #[test]
    fn test_display() {
        let registry = PredicateRegistry::new();
        let id = registry.standard("Friend", 2).unwrap();
        assert_eq!(registry.get(id).unwrap().to_string(), "Friend/2");
    }
}
