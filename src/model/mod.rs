//! Statement vocabulary: kinds, parsed arguments, qualified names.

mod argument;
mod if_feature;
mod kind;
mod qname;
pub mod restriction;

pub use argument::{Argument, DeviateKind, MaxElements, OrderedBy, Status};
pub use if_feature::IfFeatureExpr;
pub use kind::{BUILTIN_TYPES, StatementKind, YangVersion, is_builtin_type};
pub use qname::{PrefixedName, QName, QNameModule, Revision, SchemaNodeId};
