//! Deferred inference actions.
//!
//! A handler that cannot finish its work locally parks an
//! [`InferenceAction`] listing what it waits for. The scheduler keeps them
//! in registration order and re-evaluates the pending list until no
//! action becomes ready.

use std::fmt;

use super::context::StmtId;
use super::namespace::{NamespaceKey, NamespaceKind};
use super::phase::Phase;
use crate::model::QName;

/// Something an action waits for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Prerequisite {
    /// A namespace entry is visible from `scope`.
    Bound {
        kind: NamespaceKind,
        scope: StmtId,
        key: NamespaceKey,
    },
    /// A namespace entry is visible and its target reached `phase`.
    Ready {
        kind: NamespaceKind,
        scope: StmtId,
        key: NamespaceKey,
        phase: Phase,
    },
    /// A context (and everything below it) reached `phase`.
    Phase { ctx: StmtId, phase: Phase },
    /// A grouping was instantiated at this `uses`.
    Expanded { uses: StmtId },
    /// A schema node path resolves. Absolute paths start at the module
    /// of their first step. With `settled`, the target must also have no
    /// pending grouping expansion into it.
    SchemaPath {
        start: Option<StmtId>,
        steps: Vec<QName>,
        settled: bool,
    },
    /// No augmentation is pending anywhere in the build.
    AugmentsApplied,
}

/// What an action does once ready.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ActionKind {
    ResolveImport,
    ResolveInclude,
    ResolveBelongsTo,
    ResolveType,
    ResolveBase,
    ResolveIfFeature,
    ResolveExtension,
    InstantiateGrouping,
    UsesAugment,
    Augment,
    Deviate,
}

impl ActionKind {
    pub fn describe(self) -> &'static str {
        match self {
            ActionKind::ResolveImport => "import",
            ActionKind::ResolveInclude => "include",
            ActionKind::ResolveBelongsTo => "belongs-to",
            ActionKind::ResolveType => "type",
            ActionKind::ResolveBase => "base",
            ActionKind::ResolveIfFeature => "if-feature",
            ActionKind::ResolveExtension => "extension instance",
            ActionKind::InstantiateGrouping => "uses",
            ActionKind::UsesAugment => "uses augment",
            ActionKind::Augment => "augment",
            ActionKind::Deviate => "deviation",
        }
    }

    /// Import, include and belongs-to failures are linkage errors rather
    /// than inference stalls.
    pub fn is_linkage(self) -> bool {
        matches!(
            self,
            ActionKind::ResolveImport | ActionKind::ResolveInclude | ActionKind::ResolveBelongsTo
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ActionId(u32);

impl fmt::Debug for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct InferenceAction {
    pub id: ActionId,
    /// Phase the action belongs to; it must run before that phase ends.
    pub phase: Phase,
    pub kind: ActionKind,
    /// The statement that registered the action.
    pub owner: StmtId,
    pub prerequisites: Vec<Prerequisite>,
    /// Context whose children the action adds to. The context cannot
    /// reach the action's phase while the action is pending.
    pub mutates: Option<StmtId>,
}

/// Pending actions in registration order.
#[derive(Debug, Default)]
pub(crate) struct ActionQueue {
    pending: Vec<InferenceAction>,
    next_id: u32,
    executed: usize,
}

impl ActionQueue {
    pub fn push(
        &mut self,
        phase: Phase,
        kind: ActionKind,
        owner: StmtId,
        prerequisites: Vec<Prerequisite>,
        mutates: Option<StmtId>,
    ) -> ActionId {
        let id = ActionId(self.next_id);
        self.next_id += 1;
        self.pending.push(InferenceAction {
            id,
            phase,
            kind,
            owner,
            prerequisites,
            mutates,
        });
        id
    }

    /// Index of the first action due by `phase` for which `ready` holds.
    pub fn find_ready(&self, phase: Phase, mut ready: impl FnMut(&InferenceAction) -> bool) -> Option<usize> {
        self.pending
            .iter()
            .position(|action| action.phase <= phase && ready(action))
    }

    pub fn take(&mut self, index: usize) -> InferenceAction {
        self.executed += 1;
        self.pending.remove(index)
    }

    /// Removes every action due by `phase`; these stalled.
    pub fn drain_due(&mut self, phase: Phase) -> Vec<InferenceAction> {
        let (due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|action| action.phase <= phase);
        self.pending = rest;
        due
    }

    pub fn pending(&self) -> &[InferenceAction] {
        &self.pending
    }

    /// Pending actions adding children to `ctx`.
    pub fn mutating(&self, ctx: StmtId) -> impl Iterator<Item = &InferenceAction> + '_ {
        self.pending.iter().filter(move |a| a.mutates == Some(ctx))
    }

    pub fn executed(&self) -> usize {
        self.executed
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{LineCol, StatementRef, TextRange, TextSize};
    use crate::model::StatementKind;
    use crate::reactor::context::ContextTree;

    fn ctx() -> StmtId {
        let mut tree = ContextTree::default();
        let reference = StatementRef::new("t.yang".into(), TextRange::empty(TextSize::from(0)), LineCol::new(0, 0));
        tree.create(StatementKind::Module, "module".into(), None, reference, None)
    }

    #[test]
    fn test_find_ready_respects_order_and_phase() {
        let owner = ctx();
        let mut queue = ActionQueue::default();
        let late = queue.push(Phase::EffectiveModel, ActionKind::Augment, owner, Vec::new(), None);
        let first = queue.push(Phase::FullDeclaration, ActionKind::ResolveType, owner, Vec::new(), None);
        let second = queue.push(Phase::FullDeclaration, ActionKind::ResolveBase, owner, Vec::new(), None);

        let index = queue.find_ready(Phase::FullDeclaration, |_| true).unwrap();
        assert_eq!(queue.take(index).id, first);
        assert!(
            queue
                .find_ready(Phase::FullDeclaration, |a| a.kind != ActionKind::ResolveBase)
                .is_none()
        );
        assert_eq!(queue.drain_due(Phase::FullDeclaration)[0].id, second);
        assert_eq!(queue.pending()[0].id, late);
        assert_eq!(queue.executed(), 1);
    }

    #[test]
    fn test_mutating_filter() {
        let owner = ctx();
        let mut queue = ActionQueue::default();
        queue.push(Phase::EffectiveModel, ActionKind::InstantiateGrouping, owner, Vec::new(), Some(owner));
        queue.push(Phase::EffectiveModel, ActionKind::Augment, owner, Vec::new(), None);
        assert_eq!(queue.mutating(owner).count(), 1);
        assert_eq!(queue.len(), 2);
        assert!(ActionKind::ResolveInclude.is_linkage());
        assert!(!ActionKind::InstantiateGrouping.is_linkage());
    }
}
