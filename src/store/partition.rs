//! Partition identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier tagging rows in the data store.
///
/// Partitions segregate rows without implying any physical layout. A
/// [`Database`](crate::store::Database) pins exactly one write partition and
/// a set of read partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition(u32);

impl Partition {
    /// Creates a partition id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "partition:{}", self.0)
    }
}

impl From<u32> for Partition {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
