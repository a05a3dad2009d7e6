//! Conjunctive grounding queries and their results.
//!
//! A [`ConjunctiveQuery`] is the relational form of a clause's positive
//! literals: shared variables are equi-joins, constants are selections, and
//! the projection covers every clause variable exactly once. A
//! [`VariableAssignment`] can be attached as a partial grounding, which the
//! store applies as additional equality selections.

use indexmap::IndexMap;

use crate::atom::Atom;
use crate::term::{Constant, Variable};

/// A partial or total mapping from variables to constants.
///
/// Iteration order is insertion order, which keeps query restriction and row
/// expansion deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableAssignment {
    bindings: IndexMap<Variable, Constant>,
}

impl VariableAssignment {
    /// Creates an empty assignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `variable` to `value`, replacing any previous binding.
    pub fn bind(&mut self, variable: Variable, value: Constant) {
        self.bindings.insert(variable, value);
    }

    /// Returns the binding for `variable`, if any.
    #[must_use]
    pub fn get(&self, variable: &Variable) -> Option<&Constant> {
        self.bindings.get(variable)
    }

    /// Returns true if `variable` is bound.
    #[must_use]
    pub fn contains(&self, variable: &Variable) -> bool {
        self.bindings.contains_key(variable)
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if no variable is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Constant)> {
        self.bindings.iter()
    }
}

impl FromIterator<(Variable, Constant)> for VariableAssignment {
    fn from_iter<T: IntoIterator<Item = (Variable, Constant)>>(iter: T) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

/// A conjunctive query over standard-predicate relations.
///
/// Executed by a [`Database`](crate::store::Database) over its read
/// partitions plus its write partition. The partial assignment, when
/// non-empty, restricts matching rows without changing the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConjunctiveQuery {
    /// Queried atoms, in clause literal order.
    pub atoms: Vec<Atom>,
    /// Projected variables, first-occurrence order across `atoms`.
    pub projection: Vec<Variable>,
    /// Extra equality selections from a partial grounding.
    pub partial: VariableAssignment,
}

impl ConjunctiveQuery {
    /// Builds a query from atoms, projecting each variable at its first
    /// occurrence.
    #[must_use]
    pub fn new(atoms: Vec<Atom>) -> Self {
        let mut projection: Vec<Variable> = Vec::new();
        for atom in &atoms {
            for v in atom.variables() {
                if !projection.contains(v) {
                    projection.push(v.clone());
                }
            }
        }
        Self {
            atoms,
            projection,
            partial: VariableAssignment::new(),
        }
    }

    /// Returns this query restricted by a partial grounding.
    #[must_use]
    pub fn with_partial(mut self, partial: VariableAssignment) -> Self {
        self.partial = partial;
        self
    }
}

/// Materialized rows of a grounding query.
///
/// An indexed mapping from `(row_index, variable)` to the ground value. Row
/// order is the store's result order.
#[derive(Debug, Clone, Default)]
pub struct ResultList {
    columns: IndexMap<Variable, usize>,
    rows: Vec<Vec<Constant>>,
}

impl ResultList {
    /// Creates an empty result list with the given projected columns.
    #[must_use]
    pub fn new(columns: &[Variable]) -> Self {
        Self {
            columns: columns
                .iter()
                .enumerate()
                .map(|(i, v)| (v.clone(), i))
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. The row must have one value per projected column.
    pub fn push_row(&mut self, row: Vec<Constant>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the result is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Projected columns in projection order.
    pub fn columns(&self) -> impl Iterator<Item = &Variable> {
        self.columns.keys()
    }

    /// The value of `variable` in row `row_index`, if both exist.
    #[must_use]
    pub fn get(&self, row_index: usize, variable: &Variable) -> Option<&Constant> {
        let col = *self.columns.get(variable)?;
        self.rows.get(row_index)?.get(col)
    }
}
