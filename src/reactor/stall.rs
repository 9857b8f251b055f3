//! Stall reporting.
//!
//! Whatever is still pending when a phase reaches its fixpoint can never
//! run. Each such action becomes one diagnostic naming the prerequisite
//! that was not met. Groupings waiting on each other are reported once
//! per cycle instead.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use super::Reactor;
use super::action::{ActionKind, InferenceAction, Prerequisite};
use super::context::StmtId;
use super::phase::Phase;
use crate::diagnostics::{Diagnostic, ErrorKind, codes};
use crate::graph::{is_cycle, strongly_connected};
use crate::model::StatementKind;

impl Reactor<'_> {
    pub(super) fn report_stalls(&mut self, phase: Phase) {
        let stalled = self.actions.drain_due(phase);
        if stalled.is_empty() {
            return;
        }
        let in_cycles = self.report_grouping_cycles(&stalled);
        for action in &stalled {
            if in_cycles.contains(&action.owner) {
                continue;
            }
            let diagnostic = self.stall_diagnostic(action);
            self.diagnostics.add(diagnostic);
        }
        tracing::debug!(%phase, stalled = stalled.len(), "phase stalled");
    }

    fn stall_diagnostic(&self, action: &InferenceAction) -> Diagnostic {
        let reference = self.tree.get(action.owner).reference.clone();
        let argument = self
            .tree
            .get(action.owner)
            .raw_argument
            .clone()
            .unwrap_or_default();
        let unmet = action.prerequisites.iter().find(|p| !self.satisfied(p));

        let (kind, code, message) = match action.kind {
            ActionKind::ResolveImport => (
                ErrorKind::Linkage,
                codes::MISSING_DEPENDENCY,
                format!("import target module '{}' never registered", self.linkage_target(unmet, &argument)),
            ),
            ActionKind::ResolveInclude => (
                ErrorKind::Linkage,
                codes::MISSING_DEPENDENCY,
                format!("included submodule '{}' never registered", self.linkage_target(unmet, &argument)),
            ),
            ActionKind::ResolveBelongsTo => (
                ErrorKind::Linkage,
                codes::MISSING_DEPENDENCY,
                format!("module '{argument}' of belongs-to never registered"),
            ),
            ActionKind::ResolveType => unresolved(format!("typedef '{argument}' never defined")),
            ActionKind::ResolveBase => unresolved(format!("identity '{argument}' never defined")),
            ActionKind::ResolveIfFeature => {
                let missing = match unmet {
                    Some(Prerequisite::Bound { key, .. }) => key.to_string(),
                    _ => argument.to_string(),
                };
                unresolved(format!("feature '{missing}' never defined"))
            }
            ActionKind::ResolveExtension => {
                let keyword = &self.tree.get(action.owner).keyword;
                unresolved(format!("extension '{keyword}' never defined"))
            }
            ActionKind::InstantiateGrouping => match self.prerequisite_target(action) {
                Some(_) => unresolved(format!("grouping '{argument}' never became complete")),
                None => unresolved(format!("grouping '{argument}' never defined")),
            },
            ActionKind::UsesAugment | ActionKind::Augment | ActionKind::Deviate => {
                let what = if action.kind == ActionKind::Deviate {
                    "deviation"
                } else {
                    "augment"
                };
                match unmet {
                    Some(Prerequisite::SchemaPath { .. }) => {
                        unresolved(format!("{what} target '{argument}' not found"))
                    }
                    _ => unresolved(format!("{what} '{argument}' never became complete")),
                }
            }
        };
        Diagnostic::error(kind, code, Some(reference), message)
    }

    fn linkage_target(&self, unmet: Option<&Prerequisite>, fallback: &str) -> String {
        match unmet {
            Some(Prerequisite::Bound { key, .. }) => key.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Reports groupings whose `uses` wait on each other. Edges run from
    /// the grouping enclosing a stalled `uses` to the grouping it names.
    /// Returns the `uses` statements covered by a cycle diagnostic.
    fn report_grouping_cycles(&mut self, stalled: &[InferenceAction]) -> FxHashSet<StmtId> {
        let mut edges: Vec<(StmtId, StmtId, StmtId)> = Vec::new();
        for action in stalled {
            if action.kind != ActionKind::InstantiateGrouping {
                continue;
            }
            let Some(target) = self.prerequisite_target(action) else {
                continue;
            };
            if let Some(enclosing) = self.tree.enclosing(action.owner, StatementKind::Grouping) {
                edges.push((enclosing, target, action.owner));
            }
        }
        let successors = |node: StmtId| -> Vec<StmtId> {
            edges
                .iter()
                .filter(|(from, _, _)| *from == node)
                .map(|(_, to, _)| *to)
                .collect()
        };
        let nodes: BTreeSet<StmtId> = edges.iter().flat_map(|(from, to, _)| [*from, *to]).collect();

        let mut covered = FxHashSet::default();
        let mut diagnostics = Vec::new();
        for component in strongly_connected(nodes.iter().copied(), successors) {
            if !is_cycle(&component, successors) {
                continue;
            }
            let names: Vec<String> = component
                .iter()
                .map(|&g| format!("'{}'", self.tree.get(g).raw_argument.clone().unwrap_or_default()))
                .collect();
            let message = match names.as_slice() {
                [single] => format!("grouping {single} uses itself"),
                _ => format!("groupings {} use each other", names.join(", ")),
            };
            let mut diagnostic = Diagnostic::error(
                ErrorKind::InferenceStall,
                codes::CIRCULAR_DEPENDENCY,
                Some(self.tree.get(component[0]).reference.clone()),
                message,
            );
            for (from, to, uses) in &edges {
                if component.contains(from) && component.contains(to) {
                    covered.insert(*uses);
                    diagnostic = diagnostic.with_related(self.tree.get(*uses).reference.clone(), "used here");
                }
            }
            diagnostics.push(diagnostic);
        }
        self.diagnostics.extend(diagnostics);
        covered
    }
}

fn unresolved(message: String) -> (ErrorKind, &'static str, String) {
    (ErrorKind::InferenceStall, codes::UNRESOLVED_REFERENCE, message)
}
