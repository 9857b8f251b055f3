//! Freezing the context tree into effective statements.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::debug;

use super::checks;
use super::model::{EffectiveModel, EffectiveModule, EffectiveSubmodule, GroupingUsage};
use super::statement::{EffectiveStatement, Resolved};
use crate::error::BuildError;
use crate::model::{Argument, QName, StatementKind};
use crate::reactor::context::StmtId;
use crate::reactor::{CopyHistory, Reactor};

type K = StatementKind;

/// Runs the final checks and freezes every live context.
pub(crate) fn assemble(reactor: &Reactor<'_>) -> Result<EffectiveModel, BuildError> {
    let warnings: Vec<_> = reactor
        .diagnostics
        .diagnostics()
        .iter()
        .filter(|d| !d.is_error())
        .cloned()
        .collect();

    let errors = checks::run(reactor);
    if !errors.is_empty() {
        debug!(errors = errors.len(), "final checks failed");
        let mut diagnostics = warnings;
        diagnostics.extend(errors);
        return Err(BuildError::new(diagnostics));
    }

    let mut assembler = Assembler {
        reactor,
        frozen: FxHashMap::default(),
    };
    let mut modules = Vec::new();
    for &root in &reactor.roots {
        if reactor.tree.get(root).kind == K::Module {
            if let Some(module) = assembler.module(root) {
                modules.push(module);
            }
        }
    }
    modules.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    Ok(EffectiveModel {
        modules,
        groupings: grouping_usages(reactor),
        warnings,
    })
}

struct Assembler<'r, 'a> {
    reactor: &'r Reactor<'a>,
    /// Statements already frozen, shared between a submodule and the
    /// module including it.
    frozen: FxHashMap<StmtId, Arc<EffectiveStatement>>,
}

impl Assembler<'_, '_> {
    fn module(&mut self, root: StmtId) -> Option<EffectiveModule> {
        let reactor = self.reactor;
        let source = reactor.sources.get(&root)?;
        let namespace = reactor.root_module(root)?.clone();
        let prefix = reactor
            .tree
            .child_of_kind(root, K::Prefix)
            .and_then(|p| reactor.tree.get(p).raw_argument.clone())
            .unwrap_or_default();

        let mut submodules = Vec::new();
        let mut body = Vec::new();
        for member in reactor.module_group(root) {
            if member == root {
                continue;
            }
            let Some(submodule) = reactor.sources.get(&member) else {
                continue;
            };
            let statement = self.freeze(member);
            body.extend(
                statement
                    .substatements
                    .iter()
                    .filter(|s| is_body_statement(s.kind))
                    .cloned(),
            );
            submodules.push(EffectiveSubmodule {
                identifier: submodule.identifier().clone(),
                statement,
            });
        }

        let own = self.freeze(root);
        let statement = if body.is_empty() {
            own
        } else {
            let mut merged = (*own).clone();
            merged.substatements.extend(body);
            Arc::new(merged)
        };
        Some(EffectiveModule {
            identifier: source.identifier().clone(),
            namespace,
            prefix,
            yang_version: source.version(),
            statement,
            submodules,
        })
    }

    fn freeze(&mut self, ctx: StmtId) -> Arc<EffectiveStatement> {
        if let Some(done) = self.frozen.get(&ctx) {
            return done.clone();
        }
        let reactor = self.reactor;
        let tree = &reactor.tree;
        let node = tree.get(ctx);
        let children: Vec<StmtId> = tree
            .live_children(ctx)
            .filter(|&c| !tree.get(c).unsupported)
            .collect();
        let mut substatements = Vec::with_capacity(children.len());
        for child in children {
            let frozen = self.freeze(child);
            let shorthand = node.kind == K::Choice && frozen.kind.is_schema_node() && frozen.kind != K::Case;
            substatements.push(if shorthand { implicit_case(frozen) } else { frozen });
        }

        let statement = Arc::new(EffectiveStatement {
            kind: node.kind,
            keyword: node.keyword.clone(),
            argument: node.argument.clone(),
            raw_argument: node.raw_argument.clone(),
            qname: self.qname(ctx),
            reference: node.reference.clone(),
            history: node.history,
            resolved: self.resolved(ctx),
            substatements,
        });
        self.frozen.insert(ctx, statement.clone());
        statement
    }

    fn qname(&self, ctx: StmtId) -> Option<QName> {
        let kind = self.reactor.tree.get(ctx).kind;
        let named = kind.is_schema_node()
            || matches!(kind, K::Typedef | K::Grouping | K::Feature | K::Identity | K::Extension);
        if named { self.reactor.qname_of(ctx) } else { None }
    }

    fn resolved(&self, ctx: StmtId) -> Option<Resolved> {
        let node = self.reactor.tree.get(ctx);
        if node.kind == K::IfFeature {
            return node.condition.map(Resolved::Condition);
        }
        let target = node.resolved?;
        Some(match node.kind {
            K::Import | K::Include | K::BelongsTo => {
                Resolved::Source(self.reactor.sources.get(&target)?.identifier().clone())
            }
            K::Type => Resolved::Typedef(self.reactor.qname_of(target)?),
            K::Base => Resolved::Identity(self.reactor.qname_of(target)?),
            K::Uses => Resolved::Grouping(self.reactor.qname_of(target)?),
            K::Unknown => Resolved::Extension(self.reactor.qname_of(target)?),
            K::Augment | K::Deviation => Resolved::Target(self.reactor.qname_of(target)?),
            _ => return None,
        })
    }
}

/// Statements of a submodule that become part of its module.
fn is_body_statement(kind: StatementKind) -> bool {
    kind.is_schema_node()
        || matches!(
            kind,
            K::Typedef
                | K::Grouping
                | K::Feature
                | K::Identity
                | K::Extension
                | K::Augment
                | K::Deviation
                | K::Uses
                | K::Unknown
        )
}

/// Wraps a choice shorthand node into the case it implies.
fn implicit_case(node: Arc<EffectiveStatement>) -> Arc<EffectiveStatement> {
    let name: Option<SmolStr> = node.qname.as_ref().map(|q| q.local.clone());
    Arc::new(EffectiveStatement {
        kind: K::Case,
        keyword: SmolStr::new_static("case"),
        argument: name.clone().map_or(Argument::None, Argument::Identifier),
        raw_argument: name,
        qname: node.qname.clone(),
        reference: node.reference.clone(),
        history: node.history.with(CopyHistory::IMPLICIT),
        resolved: None,
        substatements: vec![node],
    })
}

fn grouping_usages(reactor: &Reactor<'_>) -> Vec<GroupingUsage> {
    let tree = &reactor.tree;
    let enclosing = |uses: StmtId| tree.enclosing(uses, K::Grouping);
    reactor
        .sites
        .groupings()
        .filter_map(|grouping| {
            Some(GroupingUsage {
                grouping: reactor.qname_of(grouping)?,
                reference: reactor.reference(grouping).clone(),
                direct: reactor
                    .sites
                    .direct(grouping)
                    .map(|uses| reactor.reference(uses).clone())
                    .collect(),
                indirect: reactor
                    .sites
                    .indirect(grouping, enclosing)
                    .into_iter()
                    .map(|uses| reactor.reference(uses).clone())
                    .collect(),
            })
        })
        .collect()
}
