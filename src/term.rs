//! Terms: the arguments of atoms.
//!
//! A term is either a named variable or a ground constant. Constants come in
//! four kinds (integer, unique identifier, text, double); equality, ordering,
//! and hashing are total so constants can key interning tables and ground-rule
//! identity without caveats.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named logic variable.
///
/// Variables are compared by name within a formula scope. Two occurrences of
/// `X` in the same formula denote the same variable.
///
/// # Examples
///
/// ```
/// use groundling::Variable;
///
/// let x = Variable::new("X");
/// assert_eq!(x, Variable::new("X"));
/// assert_ne!(x, Variable::new("Y"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable(String);

impl Variable {
    /// Creates a variable with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the variable's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A ground constant value.
///
/// `Double` compares and hashes by IEEE-754 bit pattern, so `NaN == NaN` and
/// `0.0 != -0.0` for identity purposes. This keeps `Eq`, `Ord`, and `Hash`
/// total, which ground-atom interning and ground-rule identity rely on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Constant {
    /// Signed integer id.
    Int(i64),
    /// Globally unique identifier.
    UniqueId(Uuid),
    /// UTF-8 text.
    Text(String),
    /// Double-precision float.
    Double(f64),
}

impl Constant {
    /// Returns a human-readable kind name.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::UniqueId(_) => "unique_id",
            Self::Text(_) => "text",
            Self::Double(_) => "double",
        }
    }

    const fn kind_rank(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::UniqueId(_) => 1,
            Self::Text(_) => 2,
            Self::Double(_) => 3,
        }
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UniqueId(a), Self::UniqueId(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Constant {}

impl Hash for Constant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self {
            Self::Int(v) => v.hash(state),
            Self::UniqueId(v) => v.hash(state),
            Self::Text(v) => v.hash(state),
            Self::Double(v) => v.to_bits().hash(state),
        }
    }
}

impl PartialOrd for Constant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Constant {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::UniqueId(a), Self::UniqueId(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::UniqueId(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Constant {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Constant {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<Uuid> for Constant {
    fn from(v: Uuid) -> Self {
        Self::UniqueId(v)
    }
}

impl From<&str> for Constant {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Constant {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<f64> for Constant {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

/// An argument position in an atom: a variable or a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Term {
    /// A named variable.
    Variable(Variable),
    /// A ground constant.
    Constant(Constant),
}

impl Term {
    /// Shorthand for a variable term.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(Variable::new(name))
    }

    /// Returns true if this term is a variable.
    #[must_use]
    pub const fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// Returns true if this term is ground.
    #[must_use]
    pub const fn is_ground(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// Returns the variable, if this term is one.
    #[must_use]
    pub const fn as_variable(&self) -> Option<&Variable> {
        match self {
            Self::Variable(v) => Some(v),
            Self::Constant(_) => None,
        }
    }

    /// Returns the constant, if this term is ground.
    #[must_use]
    pub const fn as_constant(&self) -> Option<&Constant> {
        match self {
            Self::Constant(c) => Some(c),
            Self::Variable(_) => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(v) => write!(f, "{v}"),
            Self::Constant(c) => write!(f, "{c}"),
        }
    }
}

impl From<Variable> for Term {
    fn from(v: Variable) -> Self {
        Self::Variable(v)
    }
}

impl From<Constant> for Term {
    fn from(c: Constant) -> Self {
        Self::Constant(c)
    }
}
