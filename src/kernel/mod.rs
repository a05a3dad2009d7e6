//! Rule kernels: the grounding drivers and their instantiators.

mod base;
pub mod logical;

pub use base::{GroundInstantiator, KernelId, RuleKernel};
pub use logical::{constraint_rule, weighted_rule, ConstraintInstantiator, WeightedInstantiator};
