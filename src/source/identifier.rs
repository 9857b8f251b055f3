//! Source identity and declared dependencies.

use std::fmt;

use smol_str::SmolStr;

use crate::model::Revision;

/// Stable identity of a source: module or submodule name plus optional
/// revision.
///
/// Ordered by name, then revision; a missing revision sorts before any
/// concrete one.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourceIdentifier {
    pub name: SmolStr,
    pub revision: Option<Revision>,
}

impl SourceIdentifier {
    pub fn new(name: impl Into<SmolStr>, revision: Option<Revision>) -> Self {
        Self {
            name: name.into(),
            revision,
        }
    }

    /// Whether this identifier satisfies a dependency on `name`, pinned to
    /// `revision` when one is given.
    pub fn satisfies(&self, name: &str, revision: Option<Revision>) -> bool {
        self.name == name && (revision.is_none() || self.revision == revision)
    }
}

impl fmt::Display for SourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.revision {
            Some(rev) => write!(f, "{}@{}", self.name, rev),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Debug for SourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceIdentifier({self})")
    }
}

/// An edge from one source to another.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceDependency {
    Import {
        name: SmolStr,
        prefix: SmolStr,
        revision: Option<Revision>,
    },
    Include {
        name: SmolStr,
        revision: Option<Revision>,
    },
    BelongsTo {
        name: SmolStr,
        prefix: SmolStr,
    },
}

impl SourceDependency {
    /// Name of the source this edge points at.
    pub fn target(&self) -> &str {
        match self {
            SourceDependency::Import { name, .. }
            | SourceDependency::Include { name, .. }
            | SourceDependency::BelongsTo { name, .. } => name,
        }
    }

    /// Pinned revision, if any.
    pub fn revision(&self) -> Option<Revision> {
        match self {
            SourceDependency::Import { revision, .. } | SourceDependency::Include { revision, .. } => {
                *revision
            }
            SourceDependency::BelongsTo { .. } => None,
        }
    }

    /// The local prefix bound by this edge.
    pub fn prefix(&self) -> Option<&str> {
        match self {
            SourceDependency::Import { prefix, .. } | SourceDependency::BelongsTo { prefix, .. } => {
                Some(prefix)
            }
            SourceDependency::Include { .. } => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SourceDependency::Import { .. } => "import",
            SourceDependency::Include { .. } => "include",
            SourceDependency::BelongsTo { .. } => "belongs-to",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rev(text: &str) -> Option<Revision> {
        Some(text.parse().unwrap())
    }

    #[test]
    fn test_identifier_order() {
        let mut ids = vec![
            SourceIdentifier::new("b", None),
            SourceIdentifier::new("a", rev("2020-01-01")),
            SourceIdentifier::new("a", None),
            SourceIdentifier::new("a", rev("2019-01-01")),
        ];
        ids.sort();
        let shown: Vec<_> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(shown, ["a", "a@2019-01-01", "a@2020-01-01", "b"]);
    }

    #[test]
    fn test_satisfies() {
        let id = SourceIdentifier::new("foo", rev("2020-01-01"));
        assert!(id.satisfies("foo", None));
        assert!(id.satisfies("foo", rev("2020-01-01")));
        assert!(!id.satisfies("foo", rev("2021-01-01")));
        assert!(!id.satisfies("bar", None));
    }

    #[test]
    fn test_dependency_accessors() {
        let import = SourceDependency::Import {
            name: "foo".into(),
            prefix: "f".into(),
            revision: None,
        };
        assert_eq!(import.target(), "foo");
        assert_eq!(import.prefix(), Some("f"));
        let include = SourceDependency::Include {
            name: "sub".into(),
            revision: rev("2020-01-01"),
        };
        assert_eq!(include.prefix(), None);
        assert_eq!(include.revision(), rev("2020-01-01"));
    }
}
