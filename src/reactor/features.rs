//! `if-feature` evaluation.

use super::Reactor;
use super::context::StmtId;
use super::namespace::{NamespaceKey, NamespaceKind};
use crate::model::{Argument, IfFeatureExpr, PrefixedName, StatementKind};

impl Reactor<'_> {
    /// Evaluates a resolved `if-feature` and excludes its parent when the
    /// condition is false. Under `refine` the statement is only carried
    /// to the refined node.
    pub(super) fn apply_if_feature(&mut self, ctx: StmtId) {
        let Argument::IfFeature(expr) = &self.tree.get(ctx).argument else {
            return;
        };
        let value = self.evaluate(ctx, expr, &mut Vec::new());
        let node = self.tree.get_mut(ctx);
        node.condition = Some(value);
        let parent = node.parent;
        if value {
            return;
        }
        if let Some(parent) = parent {
            if self.tree.get(parent).kind != StatementKind::Refine {
                self.tree.get_mut(parent).unsupported = true;
            }
        }
    }

    fn evaluate(&self, site: StmtId, expr: &IfFeatureExpr, visiting: &mut Vec<StmtId>) -> bool {
        expr.evaluate(&mut |name| {
            self.resolve_feature(site, name)
                .is_some_and(|feature| self.feature_supported(feature, visiting))
        })
    }

    fn resolve_feature(&self, site: StmtId, name: &PrefixedName) -> Option<StmtId> {
        let scope = self.scope_for(site, name)?;
        self.lookup(NamespaceKind::Feature, scope, &NamespaceKey::name(name.name.clone()))
    }

    /// A feature is supported when the build enables it and all of its
    /// own `if-feature` conditions hold. Features depending on themselves
    /// are unsupported.
    pub(crate) fn feature_supported(&self, feature: StmtId, visiting: &mut Vec<StmtId>) -> bool {
        if visiting.contains(&feature) {
            return false;
        }
        let node = self.tree.get(feature);
        let Some(name) = node.name() else {
            return false;
        };
        if !self.options.features.contains(&self.module_name(node.root), name) {
            return false;
        }

        visiting.push(feature);
        let conditions: Vec<StmtId> = self
            .tree
            .live_children(feature)
            .filter(|&c| self.tree.get(c).kind == StatementKind::IfFeature)
            .collect();
        let supported = conditions.into_iter().all(|condition| match &self.tree.get(condition).argument {
            Argument::IfFeature(expr) => self.evaluate(condition, expr, visiting),
            _ => true,
        });
        visiting.pop();
        supported
    }
}
