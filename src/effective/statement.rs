use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::StatementRef;
use crate::model::{Argument, QName, StatementKind};
use crate::reactor::CopyHistory;
use crate::source::SourceIdentifier;

/// What a referencing statement resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    /// `import`, `include` or `belongs-to` target.
    Source(SourceIdentifier),
    /// `type` naming a typedef.
    Typedef(QName),
    /// `base` naming an identity.
    Identity(QName),
    /// `uses` naming a grouping.
    Grouping(QName),
    /// Extension instance.
    Extension(QName),
    /// Target node of an `augment` or `deviation`.
    Target(QName),
    /// Value of an `if-feature` condition.
    Condition(bool),
}

/// A statement after every rewrite and resolution. Immutable; children
/// are shared between a module and the submodule that declared them.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveStatement {
    pub(crate) kind: StatementKind,
    pub(crate) keyword: SmolStr,
    pub(crate) argument: Argument,
    pub(crate) raw_argument: Option<SmolStr>,
    pub(crate) qname: Option<QName>,
    pub(crate) reference: StatementRef,
    pub(crate) history: CopyHistory,
    pub(crate) resolved: Option<Resolved>,
    pub(crate) substatements: Vec<Arc<EffectiveStatement>>,
}

impl EffectiveStatement {
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Keyword as written, `prefix:name` for extension instances.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    pub fn raw_argument(&self) -> Option<&str> {
        self.raw_argument.as_deref()
    }

    /// Qualified name of schema nodes and named definitions.
    pub fn qname(&self) -> Option<&QName> {
        self.qname.as_ref()
    }

    pub fn local_name(&self) -> Option<&str> {
        self.qname.as_ref().map(|q| q.local.as_str())
    }

    pub fn reference(&self) -> &StatementRef {
        &self.reference
    }

    /// How the statement got here: declared, or copied by a rewrite.
    pub fn history(&self) -> CopyHistory {
        self.history
    }

    pub fn resolved(&self) -> Option<&Resolved> {
        self.resolved.as_ref()
    }

    pub fn substatements(&self) -> &[Arc<EffectiveStatement>] {
        &self.substatements
    }

    pub fn children_of_kind(&self, kind: StatementKind) -> impl Iterator<Item = &Arc<EffectiveStatement>> + '_ {
        self.substatements.iter().filter(move |s| s.kind == kind)
    }

    pub fn child_of_kind(&self, kind: StatementKind) -> Option<&Arc<EffectiveStatement>> {
        self.children_of_kind(kind).next()
    }

    /// Child schema nodes (containers, leaves, choices, cases, input...).
    pub fn schema_children(&self) -> impl Iterator<Item = &Arc<EffectiveStatement>> + '_ {
        self.substatements.iter().filter(|s| s.kind.is_schema_node())
    }

    pub fn schema_child(&self, qname: &QName) -> Option<&Arc<EffectiveStatement>> {
        self.schema_children().find(|s| s.qname.as_ref() == Some(qname))
    }

    /// Data nodes in this node's data namespace; choices and cases are
    /// looked through.
    pub fn data_children(&self) -> Vec<&Arc<EffectiveStatement>> {
        let mut found = Vec::new();
        for child in self.schema_children() {
            if child.kind.is_transparent() {
                found.extend(child.data_children());
            } else if child.kind.is_data_node() {
                found.push(child);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{LineCol, TextRange, TextSize};
    use crate::model::QNameModule;

    fn node(kind: StatementKind, name: &str, substatements: Vec<Arc<EffectiveStatement>>) -> Arc<EffectiveStatement> {
        Arc::new(EffectiveStatement {
            kind,
            keyword: kind.keyword().into(),
            argument: Argument::Identifier(name.into()),
            raw_argument: Some(name.into()),
            qname: Some(QName::new(QNameModule::new("urn:t", None), name)),
            reference: StatementRef::new("t.yang".into(), TextRange::empty(TextSize::from(0)), LineCol::new(0, 0)),
            history: CopyHistory::ORIGINAL,
            resolved: None,
            substatements,
        })
    }

    #[test]
    fn test_data_children_look_through_choice_and_case() {
        let a = node(StatementKind::Leaf, "a", Vec::new());
        let b = node(StatementKind::Leaf, "b", Vec::new());
        let case = node(StatementKind::Case, "one", vec![b]);
        let choice = node(StatementKind::Choice, "ch", vec![case]);
        let top = node(StatementKind::Container, "top", vec![a, choice]);

        let names: Vec<_> = top.data_children().iter().filter_map(|c| c.local_name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(top.schema_children().count(), 2);
    }
}
