//! Source descriptors: identity, text, parsed statements and declared
//! dependencies of one module or submodule.

use std::sync::Arc;

use smol_str::SmolStr;

use super::identifier::{SourceDependency, SourceIdentifier};
use crate::model::{Revision, YangVersion};
use crate::parser::{self, RawStatement, SyntaxError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SourceKind {
    Module,
    Submodule,
}

/// One parsed source, ready for registration.
#[derive(Clone, Debug)]
pub struct SourceDescriptor {
    identifier: SourceIdentifier,
    kind: SourceKind,
    version: YangVersion,
    name: Arc<str>,
    text: Arc<str>,
    root: Arc<RawStatement>,
    dependencies: Vec<SourceDependency>,
}

impl SourceDescriptor {
    /// Parses `text` and discovers identity and dependencies from its
    /// header statements. `name` is the symbolic source name used in
    /// diagnostics.
    pub fn parse(name: &str, text: impl Into<Arc<str>>) -> Result<Self, SyntaxError> {
        let text = text.into();
        let root = parser::parse(name, &text)?;
        Self::from_statement(text, root)
    }

    /// Parses many sources in parallel; results keep the input order.
    pub fn parse_many<S: AsRef<str> + Sync>(inputs: &[(S, S)]) -> Vec<Result<Self, SyntaxError>> {
        parser::parse_all(inputs)
            .into_iter()
            .zip(inputs)
            .map(|(parsed, (_, text))| {
                parsed.and_then(|root| Self::from_statement(Arc::from(text.as_ref()), root))
            })
            .collect()
    }

    /// Builds a descriptor from an already parsed top-level statement.
    pub fn from_statement(text: Arc<str>, root: RawStatement) -> Result<Self, SyntaxError> {
        let kind = match root.keyword.as_str() {
            "module" => SourceKind::Module,
            _ => SourceKind::Submodule,
        };
        let module_name = root
            .argument
            .clone()
            .ok_or_else(|| header_error(&root, format!("'{}' statement requires a name", root.keyword)))?;

        let revision = root
            .children_named("revision")
            .filter_map(|r| r.argument.as_deref())
            .filter_map(|r| r.parse::<Revision>().ok())
            .max();
        let version = root
            .child_argument("yang-version")
            .and_then(YangVersion::parse)
            .unwrap_or_default();

        let mut dependencies = Vec::new();
        for child in &root.children {
            let dependency = match child.keyword.as_str() {
                "import" => SourceDependency::Import {
                    name: required_argument(child)?,
                    prefix: required_prefix(child)?,
                    revision: pinned_revision(child),
                },
                "include" => SourceDependency::Include {
                    name: required_argument(child)?,
                    revision: pinned_revision(child),
                },
                "belongs-to" => SourceDependency::BelongsTo {
                    name: required_argument(child)?,
                    prefix: required_prefix(child)?,
                },
                _ => continue,
            };
            dependencies.push(dependency);
        }

        Ok(Self {
            identifier: SourceIdentifier::new(module_name, revision),
            kind,
            version,
            name: root.reference.source.clone(),
            text,
            root: Arc::new(root),
            dependencies,
        })
    }

    pub fn identifier(&self) -> &SourceIdentifier {
        &self.identifier
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn version(&self) -> YangVersion {
        self.version
    }

    /// Symbolic source name (usually the file name).
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    pub fn root(&self) -> &Arc<RawStatement> {
        &self.root
    }

    pub fn dependencies(&self) -> &[SourceDependency] {
        &self.dependencies
    }

    /// The module this submodule belongs to.
    pub fn belongs_to(&self) -> Option<&str> {
        self.dependencies.iter().find_map(|d| match d {
            SourceDependency::BelongsTo { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Same identity and same text.
    pub fn same_content(&self, other: &SourceDescriptor) -> bool {
        self.identifier == other.identifier && self.text == other.text
    }
}

fn header_error(statement: &RawStatement, message: String) -> SyntaxError {
    SyntaxError {
        source_name: statement.reference.source.clone(),
        position: statement.reference.position,
        message,
    }
}

fn required_argument(statement: &RawStatement) -> Result<SmolStr, SyntaxError> {
    statement
        .argument
        .clone()
        .ok_or_else(|| header_error(statement, format!("'{}' requires a module name", statement.keyword)))
}

fn required_prefix(statement: &RawStatement) -> Result<SmolStr, SyntaxError> {
    statement
        .child_argument("prefix")
        .map(SmolStr::new)
        .ok_or_else(|| header_error(statement, format!("'{}' requires a prefix", statement.keyword)))
}

fn pinned_revision(statement: &RawStatement) -> Option<Revision> {
    statement
        .child_argument("revision-date")
        .and_then(|r| r.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_discovers_header() {
        let text = r#"
            module foo {
              yang-version 1.1;
              namespace "urn:foo";
              prefix foo;
              import bar { prefix b; revision-date 2020-02-02; }
              include foo-sub;
              revision 2019-01-01;
              revision 2021-06-30;
            }"#;
        let source = SourceDescriptor::parse("foo.yang", text).unwrap();

        assert_eq!(source.identifier().to_string(), "foo@2021-06-30");
        assert_eq!(source.kind(), SourceKind::Module);
        assert_eq!(source.version(), YangVersion::V1_1);
        assert_eq!(source.dependencies().len(), 2);
        assert_eq!(
            source.dependencies()[0],
            SourceDependency::Import {
                name: "bar".into(),
                prefix: "b".into(),
                revision: "2020-02-02".parse().ok(),
            }
        );
    }

    #[test]
    fn test_submodule_belongs_to() {
        let text = "submodule foo-sub { belongs-to foo { prefix foo; } }";
        let source = SourceDescriptor::parse("foo-sub.yang", text).unwrap();
        assert_eq!(source.kind(), SourceKind::Submodule);
        assert_eq!(source.belongs_to(), Some("foo"));
        assert_eq!(source.identifier().revision, None);
    }

    #[test]
    fn test_import_without_prefix_is_rejected() {
        let err = SourceDescriptor::parse("a.yang", "module a { import b; }").unwrap_err();
        assert!(err.message.contains("requires a prefix"));
    }

    #[test]
    fn test_parse_many_reports_each_source() {
        let inputs = [
            ("a.yang", "module a { prefix a; }"),
            ("b.yang", "module b { prefix b"),
        ];
        let results = SourceDescriptor::parse_many(&inputs);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
