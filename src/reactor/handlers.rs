//! Local steps, one per phase and statement kind.
//!
//! Local steps only look at the statement itself and at what earlier
//! phases bound. Anything that depends on other statements is parked as
//! an action.

use smol_str::SmolStr;

use super::action::{ActionKind, InferenceAction, Prerequisite};
use super::context::StmtId;
use super::namespace::{NamespaceKey, NamespaceKind};
use super::{Phase, Reactor};
use crate::diagnostics::{ErrorKind, codes};
use crate::model::{Argument, PrefixedName, QNameModule, StatementKind, YangVersion, is_builtin_type};
use crate::source::SourceIdentifier;

type K = StatementKind;

impl Reactor<'_> {
    pub(super) fn local_step(&mut self, ctx: StmtId, phase: Phase) {
        match phase {
            Phase::SourceLinkage => self.link(ctx),
            Phase::StatementDefinition => self.define(ctx),
            Phase::FullDeclaration => self.declare(ctx),
            Phase::EffectiveModel => {}
        }
    }

    fn child_raw(&self, ctx: StmtId, kind: StatementKind) -> Option<SmolStr> {
        self.tree
            .child_of_kind(ctx, kind)
            .and_then(|child| self.tree.get(child).raw_argument.clone())
    }

    pub(super) fn constraint(&mut self, ctx: StmtId, code: &'static str, message: String) {
        let reference = self.tree.get(ctx).reference.clone();
        self.diagnostics.error(ErrorKind::Constraint, code, &reference, message);
    }

    // ========================================================================
    // SOURCE LINKAGE
    // ========================================================================

    fn link(&mut self, ctx: StmtId) {
        let node = self.tree.get(ctx);
        let (kind, is_root) = (node.kind, node.parent.is_none());
        match kind {
            K::Module if is_root => self.link_module(ctx),
            K::Submodule if is_root => self.link_submodule(ctx),
            K::Import => self.register_linkage(ctx, ActionKind::ResolveImport),
            K::Include => self.register_linkage(ctx, ActionKind::ResolveInclude),
            K::BelongsTo => self.register_linkage(ctx, ActionKind::ResolveBelongsTo),
            _ => {}
        }
    }

    fn check_supported_version(&mut self, root: StmtId) {
        let version = self.version_of(root);
        if !self.options.supported_versions.contains(&version) {
            self.constraint(
                root,
                codes::VERSION_MISMATCH,
                format!("yang-version {version} is not supported by this build"),
            );
        }
    }

    fn link_module(&mut self, root: StmtId) {
        let Some(identifier) = self.sources.get(&root).map(|s| s.identifier().clone()) else {
            return;
        };
        self.check_supported_version(root);
        self.bind(
            NamespaceKind::Module,
            None,
            NamespaceKey::Source(identifier.clone()),
            root,
            root,
        );
        if self.latest.get(&identifier.name) == Some(&identifier) {
            self.bind(
                NamespaceKind::ModuleName,
                None,
                NamespaceKey::name(identifier.name.clone()),
                root,
                root,
            );
        }

        let Some(namespace) = self.child_raw(root, K::Namespace) else {
            self.constraint(
                root,
                codes::INVALID_ARGUMENT,
                format!("module '{}' declares no namespace", identifier.name),
            );
            return;
        };
        let module = QNameModule::new(namespace.as_str(), identifier.revision);
        self.bind(
            NamespaceKind::ModuleNamespace,
            None,
            NamespaceKey::Module(module.clone()),
            root,
            root,
        );
        self.modules.insert(root, module);

        match self.child_raw(root, K::Prefix) {
            Some(prefix) => self.bind(NamespaceKind::Prefix, Some(root), NamespaceKey::name(prefix), root, root),
            None => self.constraint(
                root,
                codes::INVALID_ARGUMENT,
                format!("module '{}' declares no prefix", identifier.name),
            ),
        }
    }

    fn link_submodule(&mut self, root: StmtId) {
        let Some(identifier) = self.sources.get(&root).map(|s| s.identifier().clone()) else {
            return;
        };
        self.check_supported_version(root);
        self.bind(
            NamespaceKind::Submodule,
            None,
            NamespaceKey::Source(identifier.clone()),
            root,
            root,
        );
        if self.latest.get(&identifier.name) == Some(&identifier) {
            self.bind(
                NamespaceKind::SubmoduleName,
                None,
                NamespaceKey::name(identifier.name.clone()),
                root,
                root,
            );
        }
    }

    /// Parks the resolution of an import, include or belongs-to. A pinned
    /// revision asks for that exact source; otherwise the latest wins.
    fn register_linkage(&mut self, ctx: StmtId, kind: ActionKind) {
        let Some(name) = self.tree.get(ctx).raw_argument.clone() else {
            return;
        };
        let revision = self
            .child_raw(ctx, K::RevisionDate)
            .and_then(|text| text.parse().ok());
        let (by_identifier, by_name) = match kind {
            ActionKind::ResolveInclude => (NamespaceKind::Submodule, NamespaceKind::SubmoduleName),
            _ => (NamespaceKind::Module, NamespaceKind::ModuleName),
        };
        let prerequisite = match revision {
            Some(revision) if kind != ActionKind::ResolveBelongsTo => Prerequisite::Bound {
                kind: by_identifier,
                scope: ctx,
                key: NamespaceKey::Source(SourceIdentifier::new(name, Some(revision))),
            },
            _ => Prerequisite::Bound {
                kind: by_name,
                scope: ctx,
                key: NamespaceKey::name(name),
            },
        };
        self.actions
            .push(Phase::SourceLinkage, kind, ctx, vec![prerequisite], None);
    }

    pub(super) fn apply_import(&mut self, action: &InferenceAction) {
        let Some(target) = self.prerequisite_target(action) else {
            return;
        };
        let ctx = action.owner;
        self.tree.get_mut(ctx).resolved = Some(target);
        if let Some(prefix) = self.child_raw(ctx, K::Prefix) {
            let root = self.tree.get(ctx).root;
            self.bind(NamespaceKind::Prefix, Some(root), NamespaceKey::name(prefix), target, ctx);
        }
    }

    pub(super) fn apply_include(&mut self, action: &InferenceAction) {
        let Some(target) = self.prerequisite_target(action) else {
            return;
        };
        let ctx = action.owner;
        let root = self.tree.get(ctx).root;
        self.tree.get_mut(ctx).resolved = Some(target);
        self.includes.entry(root).or_default().push(target);

        let Some(submodule) = self.sources.get(&target).cloned() else {
            return;
        };
        let expected = self.module_name(root);
        if submodule.belongs_to() != Some(expected.as_str()) {
            let reference = self.tree.get(ctx).reference.clone();
            self.diagnostics.error(
                ErrorKind::Linkage,
                codes::MISSING_DEPENDENCY,
                &reference,
                format!(
                    "submodule '{}' does not belong to module '{expected}'",
                    submodule.identifier().name
                ),
            );
        }
        let version = self.version_of(root);
        if submodule.version() != version {
            self.constraint(
                ctx,
                codes::VERSION_MISMATCH,
                format!(
                    "submodule '{}' has yang-version {} but is included from yang-version {version}",
                    submodule.identifier().name,
                    submodule.version()
                ),
            );
        }
    }

    pub(super) fn apply_belongs_to(&mut self, action: &InferenceAction) {
        let Some(target) = self.prerequisite_target(action) else {
            return;
        };
        let ctx = action.owner;
        let root = self.tree.get(ctx).root;
        self.tree.get_mut(ctx).resolved = Some(target);
        self.belongs_to.insert(root, target);
        if let Some(module) = self.modules.get(&target).cloned() {
            self.modules.insert(root, module);
        }
        if let Some(prefix) = self.child_raw(ctx, K::Prefix) {
            self.bind(NamespaceKind::Prefix, Some(root), NamespaceKey::name(prefix), target, ctx);
        }
    }

    // ========================================================================
    // STATEMENT DEFINITION
    // ========================================================================

    fn define(&mut self, ctx: StmtId) {
        let root = self.tree.get(ctx).root;
        let version = self.version_of(root);
        let node = self.tree.get(ctx);
        let kind = node.kind;
        let nested = node.parent.is_some_and(|p| p != root);

        match Argument::parse(kind, node.raw_argument.as_deref(), version) {
            Ok(argument) => self.tree.get_mut(ctx).argument = argument,
            Err(message) => self.constraint(ctx, codes::INVALID_ARGUMENT, message),
        }

        if kind.introduced_in() > version {
            self.constraint(
                ctx,
                codes::VERSION_MISMATCH,
                format!("'{kind}' requires yang-version {}", kind.introduced_in()),
            );
        } else if kind == K::Notification && nested && version == YangVersion::V1 {
            self.constraint(
                ctx,
                codes::VERSION_MISMATCH,
                "nested 'notification' requires yang-version 1.1".to_string(),
            );
        }

        self.check_placement(ctx);

        match kind {
            K::Typedef => {
                let builtin = self.tree.get(ctx).name().filter(|n| is_builtin_type(n)).cloned();
                match builtin {
                    Some(name) => self.constraint(
                        ctx,
                        codes::INVALID_ARGUMENT,
                        format!("typedef '{name}' reuses the name of a built-in type"),
                    ),
                    None => self.define_name(ctx, NamespaceKind::Typedef),
                }
            }
            K::Grouping => self.define_name(ctx, NamespaceKind::Grouping),
            K::Feature => self.define_name(ctx, NamespaceKind::Feature),
            K::Identity => self.define_name(ctx, NamespaceKind::Identity),
            K::Extension => self.define_name(ctx, NamespaceKind::Extension),
            _ => {}
        }
    }

    /// Copies land where the rewrite that made them put them; only
    /// statements as written are checked.
    fn check_placement(&mut self, ctx: StmtId) {
        let node = self.tree.get(ctx);
        let Some(parent) = node.parent else {
            return;
        };
        let (kind, keyword) = (node.kind, node.keyword.clone());
        if !node.history.is_original() {
            return;
        }
        let parent = self.tree.get(parent);
        if !parent.kind.allows_substatement(kind) {
            let message = format!("'{keyword}' is not allowed under '{}'", parent.keyword);
            self.constraint(ctx, codes::ILLEGAL_SUBSTATEMENT, message);
        }
    }

    /// Binds a definition. Typedefs and groupings are scoped to their
    /// parent; shadowing an outer definition is checked once every scope
    /// is populated. Other definitions are module-wide.
    fn define_name(&mut self, ctx: StmtId, kind: NamespaceKind) {
        let node = self.tree.get(ctx);
        let Some(name) = node.name().cloned() else {
            return;
        };
        let parent = node.parent.unwrap_or(ctx);
        if matches!(kind, NamespaceKind::Grouping | NamespaceKind::Typedef) {
            self.bind(kind, Some(parent), NamespaceKey::name(name), ctx, ctx);
            return;
        }
        let key = NamespaceKey::name(name.clone());
        if let Some(existing) = self.lookup(kind, parent, &key) {
            if existing != ctx {
                let duplicate = self.tree.get(ctx).reference.clone();
                let existing = self.tree.get(existing).reference.clone();
                self.diagnostics
                    .duplicate_definition(kind.describe(), &name, &duplicate, &existing);
            }
            return;
        }
        self.bind(kind, Some(node.root), key, ctx, ctx);
    }

    /// A typedef or grouping may not reuse the name of one defined in an
    /// enclosing scope or at the top level of its module or submodules.
    /// The nested definition is the one reported; between top-level
    /// definitions of different sources, the one later in dependency
    /// order.
    fn check_shadowing(&mut self, ctx: StmtId, kind: NamespaceKind) {
        let node = self.tree.get(ctx);
        if !node.history.is_original() {
            return;
        }
        let (Some(name), Some(parent)) = (node.name().cloned(), node.parent) else {
            return;
        };
        let root = node.root;
        let key = NamespaceKey::name(name.clone());
        let outer = self
            .tree
            .ancestors(parent)
            .find_map(|owner| self.namespaces.get(kind, Some(owner), &key));
        let rank = |id: StmtId| self.roots.iter().position(|&r| r == self.tree.get(id).root);
        let shadowed = outer.or_else(|| {
            self.module_group(root)
                .into_iter()
                .filter(|&member| member != root)
                .find_map(|member| self.namespaces.get(kind, Some(member), &key))
                .filter(|&other| parent != root || rank(other) < rank(ctx))
        });
        if let Some(existing) = shadowed {
            let duplicate = self.tree.get(ctx).reference.clone();
            let existing = self.tree.get(existing).reference.clone();
            self.diagnostics
                .duplicate_definition(kind.describe(), &name, &duplicate, &existing);
        }
    }

    // ========================================================================
    // FULL DECLARATION
    // ========================================================================

    fn declare(&mut self, ctx: StmtId) {
        let kind = self.tree.get(ctx).kind;
        match kind {
            K::Type => self.register_type(ctx),
            K::Typedef => self.check_shadowing(ctx, NamespaceKind::Typedef),
            K::Grouping => self.check_shadowing(ctx, NamespaceKind::Grouping),
            K::Base => self.register_reference(ctx, NamespaceKind::Identity, ActionKind::ResolveBase),
            K::IfFeature => self.register_if_feature(ctx),
            K::Unknown => self.register_extension_instance(ctx),
            K::Uses => self.register_uses(ctx),
            K::Augment => self.register_augment(ctx),
            K::Deviation => self.register_deviation(ctx),
            _ => {}
        }
    }

    fn prefixed_argument(&self, ctx: StmtId) -> Option<PrefixedName> {
        self.tree.get(ctx).argument.as_prefixed_name().cloned()
    }

    fn register_type(&mut self, ctx: StmtId) {
        let Some(name) = self.prefixed_argument(ctx) else {
            return;
        };
        if name.prefix.is_none() && is_builtin_type(&name.name) {
            return;
        }
        self.register_reference(ctx, NamespaceKind::Typedef, ActionKind::ResolveType);
    }

    fn register_reference(&mut self, ctx: StmtId, kind: NamespaceKind, action: ActionKind) {
        let Some(name) = self.prefixed_argument(ctx) else {
            return;
        };
        let Some(scope) = self.scope_or_report(ctx, &name) else {
            return;
        };
        let prerequisite = Prerequisite::Bound {
            kind,
            scope,
            key: NamespaceKey::name(name.name),
        };
        self.actions
            .push(Phase::FullDeclaration, action, ctx, vec![prerequisite], None);
    }

    fn register_if_feature(&mut self, ctx: StmtId) {
        let Argument::IfFeature(expr) = self.tree.get(ctx).argument.clone() else {
            return;
        };
        let mut prerequisites = Vec::new();
        for feature in expr.features() {
            let Some(scope) = self.scope_or_report(ctx, feature) else {
                return;
            };
            prerequisites.push(Prerequisite::Bound {
                kind: NamespaceKind::Feature,
                scope,
                key: NamespaceKey::name(feature.name.clone()),
            });
        }
        self.actions.push(
            Phase::FullDeclaration,
            ActionKind::ResolveIfFeature,
            ctx,
            prerequisites,
            None,
        );
    }

    fn register_extension_instance(&mut self, ctx: StmtId) {
        let keyword = self.tree.get(ctx).keyword.clone();
        let Ok(name) = PrefixedName::parse(&keyword) else {
            self.constraint(
                ctx,
                codes::INVALID_ARGUMENT,
                format!("'{keyword}' is not a valid extension keyword"),
            );
            return;
        };
        let Some(scope) = self.scope_or_report(ctx, &name) else {
            return;
        };
        let prerequisite = Prerequisite::Bound {
            kind: NamespaceKind::Extension,
            scope,
            key: NamespaceKey::name(name.name),
        };
        self.actions.push(
            Phase::FullDeclaration,
            ActionKind::ResolveExtension,
            ctx,
            vec![prerequisite],
            None,
        );
    }

    /// The grouping must be complete (every nested `uses` expanded) before
    /// it is copied; the `uses`' parent is not complete until then.
    fn register_uses(&mut self, ctx: StmtId) {
        let Some(name) = self.prefixed_argument(ctx) else {
            return;
        };
        let Some(parent) = self.tree.get(ctx).parent else {
            return;
        };
        let Some(scope) = self.scope_or_report(ctx, &name) else {
            return;
        };
        let prerequisite = Prerequisite::Ready {
            kind: NamespaceKind::Grouping,
            scope,
            key: NamespaceKey::name(name.name),
            phase: Phase::EffectiveModel,
        };
        self.actions.push(
            Phase::EffectiveModel,
            ActionKind::InstantiateGrouping,
            ctx,
            vec![prerequisite],
            Some(parent),
        );
    }

    fn register_augment(&mut self, ctx: StmtId) {
        let Some(parent) = self.tree.get(ctx).parent else {
            return;
        };
        let Some(path) = self.tree.get(ctx).argument.as_schema_node_id().cloned() else {
            return;
        };
        let under_uses = self.tree.get(parent).kind == K::Uses;
        if under_uses == path.absolute {
            let message = if under_uses {
                format!("augment '{path}' inside 'uses' must use a descendant path")
            } else {
                format!("augment '{path}' must use an absolute path")
            };
            self.constraint(ctx, codes::ILLEGAL_TARGET, message);
            return;
        }
        let Some(steps) = self.qualify_path(ctx, &path.steps) else {
            return;
        };

        if under_uses {
            let Some(target_parent) = self.tree.get(parent).parent else {
                return;
            };
            let prerequisites = vec![
                Prerequisite::Phase {
                    ctx,
                    phase: Phase::EffectiveModel,
                },
                Prerequisite::Expanded { uses: parent },
                Prerequisite::SchemaPath {
                    start: Some(target_parent),
                    steps,
                    settled: false,
                },
            ];
            self.actions.push(
                Phase::EffectiveModel,
                ActionKind::UsesAugment,
                ctx,
                prerequisites,
                Some(target_parent),
            );
        } else {
            let prerequisites = vec![
                Prerequisite::Phase {
                    ctx,
                    phase: Phase::EffectiveModel,
                },
                Prerequisite::SchemaPath {
                    start: None,
                    steps,
                    settled: true,
                },
            ];
            self.actions
                .push(Phase::EffectiveModel, ActionKind::Augment, ctx, prerequisites, None);
        }
    }

    /// Deviations wait for every augmentation, so they see the final
    /// shape of their target.
    fn register_deviation(&mut self, ctx: StmtId) {
        let Some(path) = self.tree.get(ctx).argument.as_schema_node_id().cloned() else {
            return;
        };
        if !path.absolute {
            self.constraint(
                ctx,
                codes::ILLEGAL_TARGET,
                format!("deviation '{path}' must use an absolute path"),
            );
            return;
        }
        let Some(steps) = self.qualify_path(ctx, &path.steps) else {
            return;
        };
        let prerequisites = vec![
            Prerequisite::Phase {
                ctx,
                phase: Phase::EffectiveModel,
            },
            Prerequisite::SchemaPath {
                start: None,
                steps,
                settled: true,
            },
            Prerequisite::AugmentsApplied,
        ];
        self.actions
            .push(Phase::EffectiveModel, ActionKind::Deviate, ctx, prerequisites, None);
    }
}
