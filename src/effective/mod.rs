//! The effective model: the immutable result of a build.
//!
//! Once every phase completed without errors, the settled context tree
//! goes through a last round of well-formedness checks and is frozen into
//! [`EffectiveStatement`]s. Removed and unsupported contexts are left out;
//! choice shorthand nodes are wrapped into the case they imply.

mod assemble;
mod checks;
mod model;
mod statement;

pub(crate) use assemble::assemble;
pub use model::{EffectiveModel, EffectiveModule, EffectiveSubmodule, GroupingUsage};
pub use statement::{EffectiveStatement, Resolved};
