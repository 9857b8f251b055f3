//! Parsed statement arguments.

use std::fmt;

use smol_str::SmolStr;

use super::if_feature::IfFeatureExpr;
use super::kind::{StatementKind, YangVersion};
use super::qname::{PrefixedName, Revision, SchemaNodeId};
use crate::parser::is_identifier;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Status {
    #[default]
    Current,
    Deprecated,
    Obsolete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaxElements {
    Unbounded,
    Bounded(u64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderedBy {
    System,
    User,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviateKind {
    NotSupported,
    Add,
    Replace,
    Delete,
}

/// The semantic value of a statement argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Argument {
    None,
    Text(SmolStr),
    Identifier(SmolStr),
    PrefixedName(PrefixedName),
    SchemaNodeId(SchemaNodeId),
    Revision(Revision),
    Bool(bool),
    Uint(u64),
    Int(i64),
    MaxElements(MaxElements),
    Status(Status),
    OrderedBy(OrderedBy),
    Deviate(DeviateKind),
    IfFeature(IfFeatureExpr),
    YangVersion(YangVersion),
}

impl Argument {
    /// Parses `raw` as the argument of a `kind` statement in a module of
    /// the given language version.
    pub fn parse(kind: StatementKind, raw: Option<&str>, version: YangVersion) -> Result<Self, String> {
        use StatementKind as K;

        let text = match (kind, raw) {
            (K::Input | K::Output, None) => return Ok(Argument::None),
            (K::Input | K::Output, Some(_)) => {
                return Err(format!("'{kind}' does not take an argument"));
            }
            (K::Unknown, None) => return Ok(Argument::None),
            (_, None) => return Err(format!("'{kind}' requires an argument")),
            (_, Some(text)) => text,
        };

        let parsed = match kind {
            K::Module
            | K::Submodule
            | K::Import
            | K::Include
            | K::BelongsTo
            | K::Prefix
            | K::Container
            | K::Leaf
            | K::LeafList
            | K::List
            | K::Choice
            | K::Case
            | K::Anydata
            | K::Anyxml
            | K::Grouping
            | K::Typedef
            | K::Feature
            | K::Identity
            | K::Extension
            | K::Argument
            | K::Rpc
            | K::Action
            | K::Notification
            | K::Bit => {
                if !is_identifier(text) {
                    return Err(format!("'{text}' is not a valid identifier"));
                }
                Argument::Identifier(SmolStr::new(text))
            }
            K::Type | K::Uses | K::Base => Argument::PrefixedName(PrefixedName::parse(text)?),
            K::Augment | K::Refine | K::Deviation => Argument::SchemaNodeId(SchemaNodeId::parse(text)?),
            K::Revision | K::RevisionDate => Argument::Revision(text.parse()?),
            K::Config | K::Mandatory | K::RequireInstance | K::YinElement => match text {
                "true" => Argument::Bool(true),
                "false" => Argument::Bool(false),
                _ => return Err(format!("'{text}' is not a valid boolean")),
            },
            K::MinElements | K::FractionDigits | K::Position => Argument::Uint(
                text.parse()
                    .map_err(|_| format!("'{text}' is not a non-negative integer"))?,
            ),
            K::Value => Argument::Int(
                text.parse()
                    .map_err(|_| format!("'{text}' is not an integer"))?,
            ),
            K::MaxElements => match text {
                "unbounded" => Argument::MaxElements(MaxElements::Unbounded),
                _ => match text.parse::<u64>() {
                    Ok(n) if n > 0 => Argument::MaxElements(MaxElements::Bounded(n)),
                    _ => return Err(format!("'{text}' is not a valid max-elements value")),
                },
            },
            K::Status => Argument::Status(match text {
                "current" => Status::Current,
                "deprecated" => Status::Deprecated,
                "obsolete" => Status::Obsolete,
                _ => return Err(format!("'{text}' is not a valid status")),
            }),
            K::OrderedBy => Argument::OrderedBy(match text {
                "system" => OrderedBy::System,
                "user" => OrderedBy::User,
                _ => return Err(format!("'{text}' is not a valid ordered-by value")),
            }),
            K::Deviate => Argument::Deviate(match text {
                "not-supported" => DeviateKind::NotSupported,
                "add" => DeviateKind::Add,
                "replace" => DeviateKind::Replace,
                "delete" => DeviateKind::Delete,
                _ => return Err(format!("'{text}' is not a valid deviate argument")),
            }),
            K::YangVersion => Argument::YangVersion(
                YangVersion::parse(text).ok_or_else(|| format!("unsupported yang-version '{text}'"))?,
            ),
            K::IfFeature => Argument::IfFeature(IfFeatureExpr::parse(text, version)?),
            K::Modifier => {
                if text != "invert-match" {
                    return Err(format!("'{text}' is not a valid modifier"));
                }
                Argument::Text(SmolStr::new(text))
            }
            K::Namespace
            | K::Organization
            | K::Contact
            | K::Description
            | K::Reference
            | K::Units
            | K::Default
            | K::Key
            | K::Unique
            | K::Presence
            | K::Must
            | K::When
            | K::Range
            | K::Length
            | K::Pattern
            | K::Path
            | K::Enum
            | K::ErrorMessage
            | K::ErrorAppTag
            | K::Input
            | K::Output
            | K::Unknown => Argument::Text(SmolStr::new(text)),
        };
        Ok(parsed)
    }

    pub fn as_identifier(&self) -> Option<&SmolStr> {
        match self {
            Argument::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_prefixed_name(&self) -> Option<&PrefixedName> {
        match self {
            Argument::PrefixedName(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_schema_node_id(&self) -> Option<&SchemaNodeId> {
        match self {
            Argument::SchemaNodeId(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_revision(&self) -> Option<Revision> {
        match self {
            Argument::Revision(rev) => Some(*rev),
            _ => None,
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::None => Ok(()),
            Argument::Text(text) | Argument::Identifier(text) => f.write_str(text),
            Argument::PrefixedName(name) => write!(f, "{name}"),
            Argument::SchemaNodeId(path) => write!(f, "{path}"),
            Argument::Revision(rev) => write!(f, "{rev}"),
            Argument::Bool(value) => write!(f, "{value}"),
            Argument::Uint(value) => write!(f, "{value}"),
            Argument::Int(value) => write!(f, "{value}"),
            Argument::MaxElements(MaxElements::Unbounded) => f.write_str("unbounded"),
            Argument::MaxElements(MaxElements::Bounded(n)) => write!(f, "{n}"),
            Argument::Status(status) => write!(f, "{status:?}"),
            Argument::OrderedBy(order) => write!(f, "{order:?}"),
            Argument::Deviate(kind) => write!(f, "{kind:?}"),
            Argument::IfFeature(expr) => write!(f, "{expr}"),
            Argument::YangVersion(version) => write!(f, "{version}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kind: StatementKind, raw: &str) -> Result<Argument, String> {
        Argument::parse(kind, Some(raw), YangVersion::V1_1)
    }

    #[test]
    fn test_parse_typed_arguments() {
        assert_eq!(parse(StatementKind::MinElements, "3"), Ok(Argument::Uint(3)));
        assert_eq!(
            parse(StatementKind::MaxElements, "unbounded"),
            Ok(Argument::MaxElements(MaxElements::Unbounded))
        );
        assert_eq!(parse(StatementKind::Config, "false"), Ok(Argument::Bool(false)));
        assert_eq!(
            parse(StatementKind::Deviate, "not-supported"),
            Ok(Argument::Deviate(DeviateKind::NotSupported))
        );
        assert_eq!(parse(StatementKind::Value, "-4"), Ok(Argument::Int(-4)));
    }

    #[test]
    fn test_parse_rejects_malformed_arguments() {
        assert!(parse(StatementKind::MaxElements, "0").is_err());
        assert!(parse(StatementKind::Mandatory, "yes").is_err());
        assert!(parse(StatementKind::Leaf, "bad name").is_err());
        assert!(parse(StatementKind::Status, "retired").is_err());
        assert!(Argument::parse(StatementKind::Leaf, None, YangVersion::V1).is_err());
        assert!(Argument::parse(StatementKind::Input, Some("x"), YangVersion::V1).is_err());
    }

    #[test]
    fn test_parse_references() {
        let arg = parse(StatementKind::Type, "t:counter").unwrap();
        assert_eq!(arg.as_prefixed_name().map(|n| n.to_string()), Some("t:counter".to_string()));

        let arg = parse(StatementKind::Augment, "/foo:top").unwrap();
        assert!(arg.as_schema_node_id().is_some_and(|p| p.absolute));
    }
}
