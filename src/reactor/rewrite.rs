//! Structural rewrites: grouping instantiation, refine, augmentation and
//! deviation.
//!
//! Rewrites never move statements. Added statements are deep copies that
//! remember their origin and history; dropped statements are marked
//! removed and stay in the arena.

use smol_str::SmolStr;
use tracing::{trace, warn};

use super::Reactor;
use super::action::InferenceAction;
use super::context::{CopyHistory, StmtId};
use crate::diagnostics::{Diagnostic, ErrorKind, codes};
use crate::model::{Argument, DeviateKind, QNameModule, StatementKind};

type K = StatementKind;

/// Refine substatements that replace the target's own.
const REFINE_REPLACES: [StatementKind; 9] = [
    K::Description,
    K::Reference,
    K::Config,
    K::Default,
    K::Mandatory,
    K::Presence,
    K::MinElements,
    K::MaxElements,
    K::Units,
];

/// Substatements a node may carry at most once, as far as `deviate add`
/// is concerned.
const DEVIATE_SINGLETONS: [StatementKind; 5] = [K::Units, K::Config, K::Mandatory, K::MinElements, K::MaxElements];

impl Reactor<'_> {
    // ========================================================================
    // USES
    // ========================================================================

    /// Copies the grouping's schema nodes next to the `uses`, then applies
    /// its refines.
    pub(super) fn apply_uses(&mut self, action: &InferenceAction) {
        let uses = action.owner;
        let Some(grouping) = self.prerequisite_target(action) else {
            return;
        };
        let Some(parent) = self.tree.get(uses).parent else {
            return;
        };
        self.tree.get_mut(uses).resolved = Some(grouping);

        let module = self.module_of(parent);
        let unsupported = self.tree.get(uses).unsupported;
        let templates: Vec<StmtId> = self
            .tree
            .live_children(grouping)
            .filter(|&c| self.tree.get(c).kind.is_instantiated_by_uses())
            .collect();
        for template in templates {
            let copy = self
                .tree
                .deep_copy(template, parent, CopyHistory::ADDED_BY_USES, module.clone());
            if unsupported {
                self.tree.get_mut(copy).unsupported = true;
            }
        }
        if let Err(error) = self.sites.record(grouping, uses) {
            warn!(%error, uses = ?uses, "instantiation site not recorded");
        }
        self.expanded.insert(uses);
        trace!(uses = ?uses, grouping = ?grouping, "grouping instantiated");

        let refines: Vec<StmtId> = self
            .tree
            .live_children(uses)
            .filter(|&c| self.tree.get(c).kind == K::Refine)
            .collect();
        for refine in refines {
            self.apply_refine(refine, parent);
        }
    }

    fn apply_refine(&mut self, refine: StmtId, parent: StmtId) {
        let Some(path) = self.tree.get(refine).argument.as_schema_node_id().cloned() else {
            return;
        };
        let Some(steps) = self.qualify_path(refine, &path.steps) else {
            return;
        };
        let Some(target) = self.resolve_path(Some(parent), &steps) else {
            self.constraint(refine, codes::ILLEGAL_TARGET, format!("refine target '{path}' not found"));
            return;
        };

        let properties: Vec<StmtId> = self.tree.live_children(refine).collect();
        for property in properties {
            let kind = self.tree.get(property).kind;
            if REFINE_REPLACES.contains(&kind) {
                self.remove_children_of_kind(target, kind);
            }
            self.tree
                .deep_copy(property, target, CopyHistory::ADDED_BY_REFINE, None);
            if kind == K::IfFeature && self.tree.get(property).condition == Some(false) {
                self.tree.get_mut(target).unsupported = true;
            }
        }
    }

    fn remove_children_of_kind(&mut self, ctx: StmtId, kind: StatementKind) {
        let existing: Vec<StmtId> = self
            .tree
            .live_children(ctx)
            .filter(|&c| self.tree.get(c).kind == kind)
            .collect();
        for child in existing {
            self.tree.get_mut(child).removed = true;
        }
    }

    // ========================================================================
    // AUGMENT
    // ========================================================================

    pub(super) fn apply_uses_augment(&mut self, action: &InferenceAction) {
        let Some(target) = self.prerequisite_target(action) else {
            return;
        };
        self.tree.get_mut(action.owner).resolved = Some(target);
        self.augment_target(action.owner, target, CopyHistory::ADDED_BY_USES_AUGMENTATION);
    }

    pub(super) fn apply_augment(&mut self, action: &InferenceAction) {
        let Some(target) = self.prerequisite_target(action) else {
            return;
        };
        if self.tree.enclosing(target, K::Grouping).is_some() {
            self.constraint(
                action.owner,
                codes::ILLEGAL_TARGET,
                "a grouping cannot be augmented".to_string(),
            );
            return;
        }
        self.tree.get_mut(action.owner).resolved = Some(target);
        self.augment_target(action.owner, target, CopyHistory::ADDED_BY_AUGMENTATION);
    }

    /// Copies an augment's schema nodes into `target`. Non-case nodes
    /// added to a choice share one implicit case named after the first.
    fn augment_target(&mut self, augment: StmtId, target: StmtId, history: CopyHistory) {
        let target_kind = self.tree.get(target).kind;
        if !target_kind.accepts_augmentation() {
            let path = self.tree.get(augment).raw_argument.clone().unwrap_or_default();
            self.constraint(
                augment,
                codes::ILLEGAL_TARGET,
                format!("augment target '{path}' is a {target_kind}, which cannot be augmented"),
            );
            return;
        }
        if self.tree.get(augment).unsupported {
            trace!(augment = ?augment, "augment excluded by if-feature");
            return;
        }
        if self.tree.is_excluded(target) {
            trace!(augment = ?augment, target = ?target, "augment target excluded by if-feature");
            self.tree.get_mut(augment).unsupported = true;
            return;
        }

        let module = self.module_of(augment);
        let nodes: Vec<StmtId> = self
            .tree
            .live_children(augment)
            .filter(|&c| self.tree.get(c).kind.is_instantiated_by_uses())
            .collect();
        let mut implicit_case: Option<StmtId> = None;
        for node in nodes {
            let wrap = target_kind == K::Choice && self.tree.get(node).kind != K::Case;
            let parent = if wrap {
                match implicit_case {
                    Some(case) => case,
                    None => {
                        let case = self.implicit_case(target, node, history, module.clone());
                        implicit_case = Some(case);
                        case
                    }
                }
            } else {
                target
            };
            self.tree.deep_copy(node, parent, history, module.clone());
        }
        self.tree.get_mut(target).augmented = true;
        trace!(augment = ?augment, target = ?target, "augmentation applied");
    }

    /// A synthesized `case` under `choice`, named after `first`. It runs
    /// its local steps through catch-up.
    fn implicit_case(
        &mut self,
        choice: StmtId,
        first: StmtId,
        history: CopyHistory,
        module: Option<QNameModule>,
    ) -> StmtId {
        let name = self.tree.get(first).raw_argument.clone();
        let reference = self.tree.get(first).reference.clone();
        let case = self.tree.create(
            K::Case,
            SmolStr::new_static("case"),
            name,
            reference,
            Some(choice),
        );
        let node = self.tree.get_mut(case);
        node.history = history.with(CopyHistory::IMPLICIT);
        node.qname_module = module;
        case
    }

    // ========================================================================
    // DEVIATION
    // ========================================================================

    pub(super) fn apply_deviation(&mut self, action: &InferenceAction) {
        let deviation = action.owner;
        let Some(target) = self.prerequisite_target(action) else {
            return;
        };
        self.tree.get_mut(deviation).resolved = Some(target);
        let target_module = self.module_name(self.tree.get(target).root);
        let deviating_module = self.module_name(self.tree.get(deviation).root);
        if !self.options.deviation_allowed(&target_module, &deviating_module) {
            let path = self.tree.get(deviation).raw_argument.clone().unwrap_or_default();
            warn!(
                target = %path,
                module = %deviating_module,
                "deviation ignored: module may not deviate '{target_module}'"
            );
            let reference = self.tree.get(deviation).reference.clone();
            self.diagnostics.add(Diagnostic::warning(
                ErrorKind::Constraint,
                codes::IGNORED_DEVIATION,
                Some(reference),
                format!("deviation of '{path}' by module '{deviating_module}' is not permitted and was ignored"),
            ));
            return;
        }
        if self.tree.get(deviation).unsupported {
            return;
        }

        let deviates: Vec<StmtId> = self
            .tree
            .live_children(deviation)
            .filter(|&c| self.tree.get(c).kind == K::Deviate)
            .collect();
        for deviate in deviates {
            let Argument::Deviate(kind) = self.tree.get(deviate).argument else {
                continue;
            };
            if kind == DeviateKind::NotSupported {
                self.tree.get_mut(target).removed = true;
                trace!(target = ?target, "target deviated to not-supported");
                return;
            }
            let properties: Vec<StmtId> = self.tree.live_children(deviate).collect();
            for property in properties {
                if self.deviation_applies(deviate, property, target) {
                    self.apply_deviate(kind, deviate, property, target);
                }
            }
        }
    }

    /// Whether `property` may be deviated on `target`'s kind.
    fn deviation_applies(&mut self, deviate: StmtId, property: StmtId, target: StmtId) -> bool {
        let kind = self.tree.get(property).kind;
        let target_kind = self.tree.get(target).kind;
        let applicable = match kind {
            K::Units | K::Type => matches!(target_kind, K::Leaf | K::LeafList),
            K::Config => matches!(
                target_kind,
                K::Container | K::Leaf | K::LeafList | K::List | K::Choice | K::Anydata | K::Anyxml
            ),
            K::Mandatory => matches!(target_kind, K::Leaf | K::Choice | K::Anydata | K::Anyxml),
            K::MinElements | K::MaxElements => matches!(target_kind, K::List | K::LeafList),
            K::Default => matches!(target_kind, K::Leaf | K::LeafList | K::Choice),
            K::Must => matches!(
                target_kind,
                K::Container | K::Leaf | K::LeafList | K::List | K::Anydata | K::Anyxml
            ),
            K::Unique => target_kind == K::List,
            K::Unknown => true,
            _ => false,
        };
        if !applicable {
            self.constraint(
                deviate,
                codes::INVALID_DEVIATION,
                format!("'{}' cannot be deviated on a {target_kind}", self.tree.get(property).keyword),
            );
        }
        applicable
    }

    fn apply_deviate(&mut self, kind: DeviateKind, deviate: StmtId, property: StmtId, target: StmtId) {
        let property_kind = self.tree.get(property).kind;
        let keyword = self.tree.get(property).keyword.clone();
        let existing: Vec<StmtId> = self
            .tree
            .live_children(target)
            .filter(|&c| self.tree.get(c).kind == property_kind)
            .collect();

        match kind {
            DeviateKind::Add => {
                let singleton = DEVIATE_SINGLETONS.contains(&property_kind)
                    || (property_kind == K::Default && self.tree.get(target).kind != K::LeafList);
                if singleton && !existing.is_empty() {
                    self.constraint(
                        deviate,
                        codes::INVALID_DEVIATION,
                        format!("cannot add '{keyword}': the target already has one"),
                    );
                    return;
                }
                self.tree
                    .deep_copy(property, target, CopyHistory::ADDED_BY_DEVIATION, None);
            }
            DeviateKind::Replace => {
                if existing.is_empty() {
                    self.constraint(
                        deviate,
                        codes::INVALID_DEVIATION,
                        format!("cannot replace '{keyword}': the target has none"),
                    );
                    return;
                }
                for old in existing {
                    self.tree.get_mut(old).removed = true;
                }
                self.tree
                    .deep_copy(property, target, CopyHistory::ADDED_BY_DEVIATION, None);
            }
            DeviateKind::Delete => {
                let argument = self.tree.get(property).raw_argument.clone();
                let matching = existing
                    .into_iter()
                    .find(|&old| self.tree.get(old).raw_argument == argument);
                match matching {
                    Some(old) => self.tree.get_mut(old).removed = true,
                    None => {
                        let shown = argument.unwrap_or_default();
                        warn!(statement = %keyword, argument = %shown, "deviate delete found nothing to delete");
                        let reference = self.tree.get(property).reference.clone();
                        self.diagnostics.add(Diagnostic::warning(
                            ErrorKind::Constraint,
                            codes::NOTHING_TO_DELETE,
                            Some(reference),
                            format!("target has no '{keyword} {shown}' to delete"),
                        ));
                    }
                }
            }
            DeviateKind::NotSupported => {}
        }
    }
}
