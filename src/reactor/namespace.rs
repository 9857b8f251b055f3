//! Typed symbol tables.
//!
//! Every binding lives in one table keyed by `(kind, owner, key)`. The
//! owner encodes the scope:
//!
//! - `None` for build-wide kinds (modules by identifier, name, namespace)
//! - the source root for prefixes and module-wide definitions
//! - the declaring statement's parent for typedefs and groupings, so
//!   that nested definitions stay visible only below their declaration
//!
//! Walking scopes (ancestors, then the module group) is the reactor's
//! job; this module only stores and compares.

use std::fmt;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use thiserror::Error;

use super::context::StmtId;
use crate::model::QNameModule;
use crate::source::SourceIdentifier;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum NamespaceKind {
    /// SourceIdentifier → module root.
    Module,
    /// Module name → root of its latest revision.
    ModuleName,
    /// Module namespace → module root.
    ModuleNamespace,
    /// SourceIdentifier → submodule root.
    Submodule,
    /// Submodule name → root of its latest revision.
    SubmoduleName,
    /// Prefix → root of the module it names.
    Prefix,
    Grouping,
    Typedef,
    Feature,
    Identity,
    Extension,
}

impl NamespaceKind {
    pub fn describe(self) -> &'static str {
        match self {
            NamespaceKind::Module | NamespaceKind::ModuleName => "module",
            NamespaceKind::ModuleNamespace => "module namespace",
            NamespaceKind::Submodule | NamespaceKind::SubmoduleName => "submodule",
            NamespaceKind::Prefix => "prefix",
            NamespaceKind::Grouping => "grouping",
            NamespaceKind::Typedef => "typedef",
            NamespaceKind::Feature => "feature",
            NamespaceKind::Identity => "identity",
            NamespaceKind::Extension => "extension",
        }
    }

    /// Kinds visible across the whole build.
    pub fn is_global(self) -> bool {
        matches!(
            self,
            NamespaceKind::Module
                | NamespaceKind::ModuleName
                | NamespaceKind::ModuleNamespace
                | NamespaceKind::Submodule
                | NamespaceKind::SubmoduleName
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum NamespaceKey {
    Name(SmolStr),
    Source(SourceIdentifier),
    Module(QNameModule),
}

impl NamespaceKey {
    pub fn name(name: impl Into<SmolStr>) -> Self {
        NamespaceKey::Name(name.into())
    }
}

impl fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceKey::Name(name) => f.write_str(name),
            NamespaceKey::Source(id) => write!(f, "{id}"),
            NamespaceKey::Module(module) => f.write_str(&module.namespace),
        }
    }
}

/// A different value bound under an occupied key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} '{key}' is already bound", .kind.describe())]
pub(crate) struct NamespaceCollision {
    pub kind: NamespaceKind,
    pub key: NamespaceKey,
    pub existing: StmtId,
}

#[derive(Debug, Default)]
pub(crate) struct Namespaces {
    bindings: FxHashMap<(NamespaceKind, Option<StmtId>, NamespaceKey), StmtId>,
}

impl Namespaces {
    /// Binds `key` to `value`. Rebinding the same value is a no-op.
    pub fn bind(
        &mut self,
        kind: NamespaceKind,
        owner: Option<StmtId>,
        key: NamespaceKey,
        value: StmtId,
    ) -> Result<(), NamespaceCollision> {
        let slot = (kind, owner, key);
        match self.bindings.get(&slot) {
            Some(&existing) if existing != value => Err(NamespaceCollision {
                kind,
                key: slot.2,
                existing,
            }),
            Some(_) => Ok(()),
            None => {
                self.bindings.insert(slot, value);
                Ok(())
            }
        }
    }

    pub fn get(&self, kind: NamespaceKind, owner: Option<StmtId>, key: &NamespaceKey) -> Option<StmtId> {
        self.bindings.get(&(kind, owner, key.clone())).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{LineCol, StatementRef, TextRange, TextSize};
    use crate::model::StatementKind;
    use crate::reactor::context::ContextTree;

    fn ids(count: usize) -> Vec<StmtId> {
        let mut tree = ContextTree::default();
        let reference = StatementRef::new("t.yang".into(), TextRange::empty(TextSize::from(0)), LineCol::new(0, 0));
        (0..count)
            .map(|_| tree.create(StatementKind::Module, "module".into(), None, reference.clone(), None))
            .collect()
    }

    #[test]
    fn test_rebinding_same_value_is_noop() {
        let ids = ids(2);
        let mut ns = Namespaces::default();
        ns.bind(NamespaceKind::Typedef, Some(ids[0]), NamespaceKey::name("t"), ids[1])
            .unwrap();
        ns.bind(NamespaceKind::Typedef, Some(ids[0]), NamespaceKey::name("t"), ids[1])
            .unwrap();
        assert_eq!(ns.len(), 1);
        assert_eq!(
            ns.get(NamespaceKind::Typedef, Some(ids[0]), &NamespaceKey::name("t")),
            Some(ids[1])
        );
    }

    #[test]
    fn test_different_value_collides() {
        let ids = ids(3);
        let mut ns = Namespaces::default();
        ns.bind(NamespaceKind::Feature, Some(ids[0]), NamespaceKey::name("f"), ids[1])
            .unwrap();
        let err = ns
            .bind(NamespaceKind::Feature, Some(ids[0]), NamespaceKey::name("f"), ids[2])
            .unwrap_err();
        assert_eq!(err.existing, ids[1]);
        assert_eq!(err.to_string(), "feature 'f' is already bound");
    }

    #[test]
    fn test_owners_and_kinds_are_separate_scopes() {
        let ids = ids(3);
        let mut ns = Namespaces::default();
        ns.bind(NamespaceKind::Grouping, Some(ids[0]), NamespaceKey::name("g"), ids[1])
            .unwrap();
        ns.bind(NamespaceKind::Grouping, Some(ids[1]), NamespaceKey::name("g"), ids[2])
            .unwrap();
        ns.bind(NamespaceKind::Typedef, Some(ids[0]), NamespaceKey::name("g"), ids[2])
            .unwrap();
        assert_eq!(ns.get(NamespaceKind::Identity, Some(ids[0]), &NamespaceKey::name("g")), None);
        assert!(NamespaceKind::ModuleName.is_global());
        assert!(!NamespaceKind::Prefix.is_global());
    }
}
