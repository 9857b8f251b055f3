//! The mutable statement context tree.
//!
//! Contexts live in an arena and refer to each other by [`StmtId`], so
//! parent links, rewrite provenance and namespace targets are plain
//! handles. Contexts are never freed during a build; rewrites that drop a
//! statement mark it removed.

use std::fmt;

use smol_str::SmolStr;

use super::phase::Phase;
use crate::base::StatementRef;
use crate::model::{Argument, QNameModule, StatementKind};
use crate::parser::RawStatement;

/// Handle of a statement context.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(u32);

impl StmtId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stmt#{}", self.0)
    }
}

/// How a statement came to be where it is. A copy of a copy carries the
/// union of both histories.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CopyHistory(u8);

impl CopyHistory {
    pub const ORIGINAL: CopyHistory = CopyHistory(0);
    pub const ADDED_BY_USES: CopyHistory = CopyHistory(1);
    pub const ADDED_BY_AUGMENTATION: CopyHistory = CopyHistory(1 << 1);
    pub const ADDED_BY_USES_AUGMENTATION: CopyHistory = CopyHistory(1 << 2);
    pub const ADDED_BY_DEVIATION: CopyHistory = CopyHistory(1 << 3);
    pub const ADDED_BY_REFINE: CopyHistory = CopyHistory(1 << 4);
    /// Synthesized wrapper (implicit `case`).
    pub const IMPLICIT: CopyHistory = CopyHistory(1 << 5);

    const NAMES: [(CopyHistory, &'static str); 6] = [
        (Self::ADDED_BY_USES, "added-by-uses"),
        (Self::ADDED_BY_AUGMENTATION, "added-by-augmentation"),
        (Self::ADDED_BY_USES_AUGMENTATION, "added-by-uses-augmentation"),
        (Self::ADDED_BY_DEVIATION, "added-by-deviation"),
        (Self::ADDED_BY_REFINE, "added-by-refine"),
        (Self::IMPLICIT, "implicit"),
    ];

    #[inline]
    pub const fn with(self, other: CopyHistory) -> CopyHistory {
        CopyHistory(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(self, other: CopyHistory) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_original(self) -> bool {
        self.0 == 0
    }

    pub fn is_added_by_uses(self) -> bool {
        self.contains(Self::ADDED_BY_USES)
    }

    pub fn is_added_by_augmentation(self) -> bool {
        self.contains(Self::ADDED_BY_AUGMENTATION) || self.contains(Self::ADDED_BY_USES_AUGMENTATION)
    }
}

impl fmt::Debug for CopyHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_original() {
            return f.write_str("original");
        }
        let names: Vec<_> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}

/// One statement during the build.
#[derive(Clone, Debug)]
pub(crate) struct StatementContext {
    pub kind: StatementKind,
    pub keyword: SmolStr,
    pub raw_argument: Option<SmolStr>,
    /// Parsed during statement definition.
    pub argument: Argument,
    pub reference: StatementRef,
    pub parent: Option<StmtId>,
    /// Declared children first, rewrite products appended in the order
    /// they were applied.
    pub children: Vec<StmtId>,
    /// Source root (module or submodule) this context lives in.
    pub root: StmtId,
    /// Last phase whose local step ran for this context.
    pub phase: Option<Phase>,
    pub history: CopyHistory,
    pub copied_from: Option<StmtId>,
    /// Namespace override for copies placed into another module.
    pub qname_module: Option<QNameModule>,
    /// Target of the reference this statement makes (typedef, grouping,
    /// identity, extension, imported module...).
    pub resolved: Option<StmtId>,
    /// Value of an evaluated `if-feature`.
    pub condition: Option<bool>,
    /// Excluded by a false `if-feature`.
    pub unsupported: bool,
    /// Removed by refine, deviation or deviate replace.
    pub removed: bool,
    /// Target of at least one augmentation.
    pub augmented: bool,
}

impl StatementContext {
    /// Identifier argument, if the statement has one.
    pub fn name(&self) -> Option<&SmolStr> {
        self.argument.as_identifier()
    }

    /// Whether the context takes part in the effective model.
    pub fn is_live(&self) -> bool {
        !self.removed && !self.unsupported
    }
}

/// Arena of statement contexts for one build.
#[derive(Debug, Default)]
pub(crate) struct ContextTree {
    nodes: Vec<StatementContext>,
}

impl ContextTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: StmtId) -> &StatementContext {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: StmtId) -> &mut StatementContext {
        &mut self.nodes[id.index()]
    }

    /// Ids created at or after `from`.
    pub fn ids_from(&self, from: usize) -> impl Iterator<Item = StmtId> + use<> {
        (from..self.nodes.len()).map(|i| StmtId(i as u32))
    }

    fn alloc(&mut self, node: StatementContext) -> StmtId {
        let id = StmtId(self.nodes.len() as u32);
        let parent = node.parent;
        self.nodes.push(node);
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }

    /// Creates a fresh context under `parent` (or a new root).
    pub fn create(
        &mut self,
        kind: StatementKind,
        keyword: SmolStr,
        raw_argument: Option<SmolStr>,
        reference: StatementRef,
        parent: Option<StmtId>,
    ) -> StmtId {
        let root = match parent {
            Some(parent) => self.get(parent).root,
            None => StmtId(self.nodes.len() as u32),
        };
        self.alloc(StatementContext {
            kind,
            keyword,
            raw_argument,
            argument: Argument::None,
            reference,
            parent,
            children: Vec::new(),
            root,
            phase: None,
            history: CopyHistory::ORIGINAL,
            copied_from: None,
            qname_module: None,
            resolved: None,
            condition: None,
            unsupported: false,
            removed: false,
            augmented: false,
        })
    }

    /// Builds the contexts of one source. Statements with unknown
    /// keywords are skipped and handed back for reporting.
    pub fn add_source<'r>(&mut self, raw: &'r RawStatement, unknown: &mut Vec<&'r RawStatement>) -> StmtId {
        let root = self.create(
            StatementKind::classify(&raw.keyword).unwrap_or(StatementKind::Module),
            raw.keyword.clone(),
            raw.argument.clone(),
            raw.reference.clone(),
            None,
        );
        for child in &raw.children {
            self.add_statement(child, root, unknown);
        }
        root
    }

    fn add_statement<'r>(&mut self, raw: &'r RawStatement, parent: StmtId, unknown: &mut Vec<&'r RawStatement>) {
        let Some(kind) = StatementKind::classify(&raw.keyword) else {
            unknown.push(raw);
            return;
        };
        let id = self.create(
            kind,
            raw.keyword.clone(),
            raw.argument.clone(),
            raw.reference.clone(),
            Some(parent),
        );
        for child in &raw.children {
            self.add_statement(child, id, unknown);
        }
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: StmtId) -> impl Iterator<Item = StmtId> + '_ {
        std::iter::successors(self.get(id).parent, |&p| self.get(p).parent)
    }

    /// Whether an `if-feature` excluded the context or one of its
    /// ancestors.
    pub fn is_excluded(&self, id: StmtId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .any(|a| self.get(a).unsupported)
    }

    /// Children that were not removed.
    pub fn live_children(&self, id: StmtId) -> impl Iterator<Item = StmtId> + '_ {
        self.get(id)
            .children
            .iter()
            .copied()
            .filter(|&c| !self.get(c).removed)
    }

    /// First non-removed child of the given kind.
    pub fn child_of_kind(&self, id: StmtId, kind: StatementKind) -> Option<StmtId> {
        self.live_children(id).find(|&c| self.get(c).kind == kind)
    }

    /// Nearest ancestor of the given kind.
    pub fn enclosing(&self, id: StmtId, kind: StatementKind) -> Option<StmtId> {
        self.ancestors(id).find(|&a| self.get(a).kind == kind)
    }

    /// Deep structural copy of `source` appended under `parent`. Removed
    /// descendants are not copied. The copy is an independent context
    /// that remembers its origin.
    pub fn deep_copy(
        &mut self,
        source: StmtId,
        parent: StmtId,
        history: CopyHistory,
        qname_module: Option<QNameModule>,
    ) -> StmtId {
        let root = self.get(parent).root;
        let origin = self.get(source);
        let node = StatementContext {
            parent: Some(parent),
            children: Vec::new(),
            root,
            history: origin.history.with(history),
            copied_from: Some(source),
            qname_module: qname_module.clone().or_else(|| origin.qname_module.clone()),
            ..origin.clone()
        };
        let children: Vec<StmtId> = origin.children.clone();
        let id = self.alloc(node);
        for child in children {
            if !self.get(child).removed {
                self.deep_copy(child, id, history, qname_module.clone());
            }
        }
        id
    }
}
