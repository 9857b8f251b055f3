//! The multi-phase statement reactor.
//!
//! A build turns a closed set of sources into an [`EffectiveModel`]:
//!
//! ```text
//! sources → dependency order → context tree
//!         → for each phase: local steps, then deferred actions to a fixpoint
//!         → freeze → effective model
//! ```
//!
//! # Phases
//!
//! Every context runs one local step per [`Phase`]. A step may bind names
//! into the namespaces or park an inference action waiting for names,
//! phases or schema paths that are not there yet. The scheduler reruns
//! the pending list in registration order until nothing becomes ready.
//! Anything still pending at the end of its phase is a stall and fails
//! the build with one diagnostic per action.
//!
//! # Rewrites
//!
//! `uses`, `augment` and `deviation` run as actions of the last phase and
//! rewrite the tree in place: grouping contents are deep-copied next to
//! the `uses`, augment contents are copied into their target, deviations
//! edit the target's substatements.

mod action;
pub(crate) mod context;
mod features;
mod groupings;
mod handlers;
mod namespace;
mod phase;
mod rewrite;
mod stall;

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, debug_span, info, info_span, trace};

use crate::base::StatementRef;
use crate::config::BuildOptions;
use crate::diagnostics::{Diagnostic, DiagnosticCollector, ErrorKind, codes};
use crate::effective::EffectiveModel;
use crate::error::BuildError;
use crate::model::{PrefixedName, QName, QNameModule, StatementKind, YangVersion};
use crate::source::linkage::{dependency_order, involved_sources};
use crate::source::{SourceDescriptor, SourceIdentifier, SourceKind};
use action::{ActionKind, ActionQueue, InferenceAction, Prerequisite};
use context::{ContextTree, StmtId};
use namespace::{NamespaceCollision, NamespaceKey, NamespaceKind, Namespaces};

pub use context::CopyHistory;
pub use groupings::InstantiationError;
pub(crate) use groupings::GroupingSites;
pub use phase::Phase;

/// Builds the effective model of `sources` with default options.
pub fn build(sources: &[Arc<SourceDescriptor>]) -> Result<EffectiveModel, BuildError> {
    build_with_options(sources, &BuildOptions::default())
}

/// Builds the effective model of `sources`.
///
/// Library sources from `options` join the build only when a main source
/// depends on them. The result does not depend on the order of `sources`.
pub fn build_with_options(
    sources: &[Arc<SourceDescriptor>],
    options: &BuildOptions,
) -> Result<EffectiveModel, BuildError> {
    let span = info_span!("build", sources = sources.len());
    let _enter = span.enter();

    let mut reactor = Reactor::new(options);
    reactor.add_sources(sources);
    reactor.check_errors()?;

    for phase in Phase::ALL {
        reactor.run_phase(phase);
        reactor.check_errors()?;
    }

    reactor.sites.freeze();
    let model = crate::effective::assemble(&reactor)?;
    info!(
        modules = model.modules().len(),
        contexts = reactor.tree.len(),
        actions = reactor.actions.executed(),
        "build complete"
    );
    Ok(model)
}

/// State of one build.
pub(crate) struct Reactor<'a> {
    pub(crate) options: &'a BuildOptions,
    pub(crate) tree: ContextTree,
    namespaces: Namespaces,
    actions: ActionQueue,
    pub(crate) diagnostics: DiagnosticCollector,
    /// Source roots in dependency order.
    pub(crate) roots: Vec<StmtId>,
    pub(crate) sources: FxHashMap<StmtId, Arc<SourceDescriptor>>,
    /// Latest revision per module or submodule name.
    latest: FxHashMap<SmolStr, SourceIdentifier>,
    /// Source root → namespace of the module it belongs to.
    modules: FxHashMap<StmtId, QNameModule>,
    /// Submodule root → module root.
    belongs_to: FxHashMap<StmtId, StmtId>,
    /// Root → included submodule roots.
    includes: FxHashMap<StmtId, Vec<StmtId>>,
    /// `uses` statements whose grouping was copied in.
    expanded: FxHashSet<StmtId>,
    pub(crate) sites: GroupingSites,
    phase: Option<Phase>,
    /// Contexts below this index went through catch-up already.
    caught_up: usize,
}

impl<'a> Reactor<'a> {
    fn new(options: &'a BuildOptions) -> Self {
        Self {
            options,
            tree: ContextTree::default(),
            namespaces: Namespaces::default(),
            actions: ActionQueue::default(),
            diagnostics: DiagnosticCollector::new(),
            roots: Vec::new(),
            sources: FxHashMap::default(),
            latest: FxHashMap::default(),
            modules: FxHashMap::default(),
            belongs_to: FxHashMap::default(),
            includes: FxHashMap::default(),
            expanded: FxHashSet::default(),
            sites: GroupingSites::default(),
            phase: None,
            caught_up: 0,
        }
    }

    fn check_errors(&mut self) -> Result<(), BuildError> {
        if self.diagnostics.has_errors() {
            debug!(errors = self.diagnostics.error_count(), phase = ?self.phase, "build failed");
            return Err(BuildError::new(self.diagnostics.take()));
        }
        Ok(())
    }

    // ========================================================================
    // SOURCES
    // ========================================================================

    /// Selects the involved sources, drops duplicates and creates the
    /// context trees in dependency order.
    fn add_sources(&mut self, main: &[Arc<SourceDescriptor>]) {
        let mut unique: Vec<Arc<SourceDescriptor>> = Vec::new();
        for source in involved_sources(main, &self.options.library) {
            match unique.iter().find(|u| u.identifier() == source.identifier()) {
                Some(existing) if existing.same_content(&source) => {}
                Some(existing) => {
                    let diagnostic = Diagnostic::error(
                        ErrorKind::Registration,
                        codes::SOURCE_CONFLICT,
                        Some(source.root().reference.clone()),
                        format!("source {} is provided twice with different content", source.identifier()),
                    )
                    .with_related(existing.root().reference.clone(), "other definition");
                    self.diagnostics.add(diagnostic);
                }
                None => unique.push(source),
            }
        }

        let order = dependency_order(&unique);
        for cycle in &order.cycles {
            let names: Vec<String> = cycle
                .iter()
                .map(|&i| format!("'{}'", unique[i].identifier().name))
                .collect();
            let mut diagnostic = Diagnostic::error(
                ErrorKind::Linkage,
                codes::CIRCULAR_DEPENDENCY,
                Some(unique[cycle[0]].root().reference.clone()),
                format!("circular import among {}", names.join(", ")),
            );
            for &member in &cycle[1..] {
                diagnostic = diagnostic.with_related(unique[member].root().reference.clone(), "part of the cycle");
            }
            self.diagnostics.add(diagnostic);
        }

        for source in &unique {
            let id = source.identifier();
            let newer = self
                .latest
                .get(&id.name)
                .is_none_or(|current| current < id);
            if newer {
                self.latest.insert(id.name.clone(), id.clone());
            }
        }

        for index in order.order {
            let source = unique[index].clone();
            let mut unknown = Vec::new();
            let root = self.tree.add_source(source.root(), &mut unknown);
            for raw in unknown {
                self.diagnostics.error(
                    ErrorKind::Syntax,
                    codes::SYNTAX,
                    &raw.reference,
                    format!("unknown statement '{}'", raw.keyword),
                );
            }
            debug!(source = %source.identifier(), root = ?root, "source added");
            self.sources.insert(root, source);
            self.roots.push(root);
        }
    }

    // ========================================================================
    // PHASE LOOP
    // ========================================================================

    fn run_phase(&mut self, phase: Phase) {
        let span = debug_span!("phase", %phase);
        let _enter = span.enter();
        self.phase = Some(phase);
        let executed = self.actions.executed();

        for id in self.tree.ids_from(0) {
            self.advance(id, phase);
        }
        self.caught_up = self.tree.len();
        debug!(contexts = self.tree.len(), pending = self.actions.len(), "local steps done");

        self.fixpoint(phase);
        self.report_stalls(phase);
        debug!(
            executed = self.actions.executed() - executed,
            contexts = self.tree.len(),
            "phase complete"
        );
    }

    /// Runs the local steps `ctx` has not run yet, up to `phase`.
    fn advance(&mut self, ctx: StmtId, phase: Phase) {
        for step in Phase::ALL {
            if step > phase || self.tree.get(ctx).phase.is_some_and(|done| done >= step) {
                continue;
            }
            self.local_step(ctx, step);
            self.tree.get_mut(ctx).phase = Some(step);
        }
    }

    fn fixpoint(&mut self, phase: Phase) {
        while let Some(index) = self.actions.find_ready(phase, |action| self.is_ready(action)) {
            let action = self.actions.take(index);
            trace!(action = ?action.id, kind = action.kind.describe(), owner = ?action.owner, "action ready");
            self.apply(action);
            self.catch_up(phase);
        }
    }

    /// Contexts synthesized by an action run the local steps they missed.
    fn catch_up(&mut self, phase: Phase) {
        for id in self.tree.ids_from(self.caught_up) {
            if self.tree.get(id).phase.is_none() {
                self.advance(id, phase);
            }
        }
        self.caught_up = self.tree.len();
    }

    fn apply(&mut self, action: InferenceAction) {
        match action.kind {
            ActionKind::ResolveImport => self.apply_import(&action),
            ActionKind::ResolveInclude => self.apply_include(&action),
            ActionKind::ResolveBelongsTo => self.apply_belongs_to(&action),
            ActionKind::ResolveType | ActionKind::ResolveBase | ActionKind::ResolveExtension => {
                let target = self.prerequisite_target(&action);
                self.tree.get_mut(action.owner).resolved = target;
            }
            ActionKind::ResolveIfFeature => self.apply_if_feature(action.owner),
            ActionKind::InstantiateGrouping => self.apply_uses(&action),
            ActionKind::UsesAugment => self.apply_uses_augment(&action),
            ActionKind::Augment => self.apply_augment(&action),
            ActionKind::Deviate => self.apply_deviation(&action),
        }
    }

    // ========================================================================
    // READINESS
    // ========================================================================

    fn is_ready(&self, action: &InferenceAction) -> bool {
        action.prerequisites.iter().all(|p| self.satisfied(p))
    }

    fn satisfied(&self, prerequisite: &Prerequisite) -> bool {
        match prerequisite {
            Prerequisite::Bound { kind, scope, key } => self.lookup(*kind, *scope, key).is_some(),
            Prerequisite::Ready {
                kind,
                scope,
                key,
                phase,
            } => self
                .lookup(*kind, *scope, key)
                .is_some_and(|target| self.reached(target, *phase)),
            Prerequisite::Phase { ctx, phase } => self.reached(*ctx, *phase),
            Prerequisite::Expanded { uses } => self.expanded.contains(uses),
            Prerequisite::SchemaPath { start, steps, settled } => self
                .resolve_path(*start, steps)
                .is_some_and(|target| !settled || self.settled(target)),
            Prerequisite::AugmentsApplied => !self
                .actions
                .pending()
                .iter()
                .any(|a| matches!(a.kind, ActionKind::Augment | ActionKind::UsesAugment)),
        }
    }

    /// `ctx` and its whole subtree ran the local step of `phase`, and no
    /// action of that phase or earlier still adds to any of them.
    pub(crate) fn reached(&self, ctx: StmtId, phase: Phase) -> bool {
        let node = self.tree.get(ctx);
        node.phase.is_some_and(|done| done >= phase)
            && !self.actions.mutating(ctx).any(|a| a.phase <= phase)
            && node.children.iter().all(|&child| self.reached(child, phase))
    }

    /// No pending grouping expansion adds children to `ctx`.
    fn settled(&self, ctx: StmtId) -> bool {
        self.actions.mutating(ctx).next().is_none()
    }

    /// Target of the first namespace or path prerequisite.
    fn prerequisite_target(&self, action: &InferenceAction) -> Option<StmtId> {
        action.prerequisites.iter().find_map(|p| match p {
            Prerequisite::Bound { kind, scope, key } | Prerequisite::Ready { kind, scope, key, .. } => {
                self.lookup(*kind, *scope, key)
            }
            Prerequisite::SchemaPath { start, steps, .. } => self.resolve_path(*start, steps),
            _ => None,
        })
    }

    // ========================================================================
    // NAMESPACES
    // ========================================================================

    /// Looks `key` up as visible from `scope`.
    pub(crate) fn lookup(&self, kind: NamespaceKind, scope: StmtId, key: &NamespaceKey) -> Option<StmtId> {
        if kind.is_global() {
            return self.namespaces.get(kind, None, key);
        }
        let root = self.tree.get(scope).root;
        match kind {
            NamespaceKind::Prefix => self.namespaces.get(kind, Some(root), key),
            NamespaceKind::Grouping | NamespaceKind::Typedef => std::iter::once(scope)
                .chain(self.tree.ancestors(scope))
                .find_map(|owner| self.namespaces.get(kind, Some(owner), key))
                .or_else(|| self.lookup_module_wide(kind, root, key)),
            _ => self.lookup_module_wide(kind, root, key),
        }
    }

    fn lookup_module_wide(&self, kind: NamespaceKind, root: StmtId, key: &NamespaceKey) -> Option<StmtId> {
        self.module_group(root)
            .into_iter()
            .find_map(|member| self.namespaces.get(kind, Some(member), key))
    }

    /// Binds a name, reporting a collision against the statement `site`.
    fn bind(&mut self, kind: NamespaceKind, owner: Option<StmtId>, key: NamespaceKey, value: StmtId, site: StmtId) {
        if let Err(collision) = self.namespaces.bind(kind, owner, key, value) {
            self.report_collision(&collision, site);
        }
    }

    fn report_collision(&mut self, collision: &NamespaceCollision, site: StmtId) {
        let duplicate = self.tree.get(site).reference.clone();
        let existing = self.tree.get(collision.existing).reference.clone();
        if collision.kind == NamespaceKind::Prefix {
            let diagnostic = Diagnostic::error(
                ErrorKind::Linkage,
                codes::PREFIX_COLLISION,
                Some(duplicate),
                format!("prefix '{}' is already in use", collision.key),
            )
            .with_related(existing, "prefix bound here");
            self.diagnostics.add(diagnostic);
        } else {
            self.diagnostics.duplicate_definition(
                collision.kind.describe(),
                &collision.key.to_string(),
                &duplicate,
                &existing,
            );
        }
    }

    // ========================================================================
    // MODULES
    // ========================================================================

    /// The module root a source root belongs to plus every submodule
    /// included from it, transitively. The queried root is always part of
    /// its own group.
    pub(crate) fn module_group(&self, root: StmtId) -> Vec<StmtId> {
        let main = self.belongs_to.get(&root).copied().unwrap_or(root);
        let mut group = vec![main];
        let mut next = 0;
        while next < group.len() {
            if let Some(included) = self.includes.get(&group[next]) {
                for &sub in included {
                    if !group.contains(&sub) {
                        group.push(sub);
                    }
                }
            }
            next += 1;
        }
        if !group.contains(&root) {
            group.push(root);
        }
        group
    }

    /// Name of the module a source root belongs to.
    pub(crate) fn module_name(&self, root: StmtId) -> SmolStr {
        match self.sources.get(&root) {
            Some(source) => match (source.kind(), source.belongs_to()) {
                (SourceKind::Submodule, Some(module)) => SmolStr::new(module),
                _ => source.identifier().name.clone(),
            },
            None => SmolStr::default(),
        }
    }

    pub(crate) fn version_of(&self, root: StmtId) -> YangVersion {
        self.sources
            .get(&root)
            .map_or(YangVersion::V1, |source| source.version())
    }

    /// Namespace of the module a source root belongs to.
    pub(crate) fn root_module(&self, root: StmtId) -> Option<&QNameModule> {
        self.modules.get(&root)
    }

    /// Namespace the statement's name lives in: the copy's override, or
    /// the module it was written in.
    pub(crate) fn module_of(&self, ctx: StmtId) -> Option<QNameModule> {
        let node = self.tree.get(ctx);
        node.qname_module
            .clone()
            .or_else(|| self.modules.get(&node.root).cloned())
    }

    /// Local name of a schema node; `input` and `output` are named after
    /// their keyword.
    pub(crate) fn local_name(&self, ctx: StmtId) -> Option<SmolStr> {
        let node = self.tree.get(ctx);
        match node.kind {
            StatementKind::Input | StatementKind::Output => Some(node.keyword.clone()),
            _ => node.name().cloned(),
        }
    }

    pub(crate) fn qname_of(&self, ctx: StmtId) -> Option<QName> {
        Some(QName::new(self.module_of(ctx)?, self.local_name(ctx)?))
    }

    // ========================================================================
    // REFERENCES AND PATHS
    // ========================================================================

    /// Scope to look a prefixed definition name up from: the statement
    /// itself for local names, the imported module's root otherwise.
    fn scope_for(&self, ctx: StmtId, name: &PrefixedName) -> Option<StmtId> {
        let Some(prefix) = &name.prefix else {
            return Some(ctx);
        };
        let target = self.lookup(NamespaceKind::Prefix, ctx, &NamespaceKey::name(prefix.clone()))?;
        let root = self.tree.get(ctx).root;
        if self.module_group(root).contains(&target) {
            Some(ctx)
        } else {
            Some(target)
        }
    }

    /// Like [`Self::scope_for`], reporting an unknown prefix.
    fn scope_or_report(&mut self, ctx: StmtId, name: &PrefixedName) -> Option<StmtId> {
        let scope = self.scope_for(ctx, name);
        if scope.is_none() {
            self.unknown_prefix(ctx, name);
        }
        scope
    }

    fn unknown_prefix(&mut self, ctx: StmtId, name: &PrefixedName) {
        let reference = self.tree.get(ctx).reference.clone();
        self.diagnostics.error(
            ErrorKind::Linkage,
            codes::UNRESOLVED_REFERENCE,
            &reference,
            format!("unknown prefix in '{name}'"),
        );
    }

    /// Qualifies a path step written in `ctx`'s source. Unprefixed steps
    /// belong to that source's module.
    fn qualify(&self, ctx: StmtId, step: &PrefixedName) -> Option<QName> {
        let root = self.tree.get(ctx).root;
        let module = match &step.prefix {
            None => self.modules.get(&root)?,
            Some(prefix) => {
                let target = self.lookup(NamespaceKind::Prefix, ctx, &NamespaceKey::name(prefix.clone()))?;
                self.modules.get(&target)?
            }
        };
        Some(QName::new(module.clone(), step.name.clone()))
    }

    /// Qualifies every step of a path, reporting the first unknown prefix.
    fn qualify_path(&mut self, ctx: StmtId, steps: &[PrefixedName]) -> Option<Vec<QName>> {
        let mut qualified = Vec::with_capacity(steps.len());
        for step in steps {
            match self.qualify(ctx, step) {
                Some(qname) => qualified.push(qname),
                None => {
                    self.unknown_prefix(ctx, step);
                    return None;
                }
            }
        }
        Some(qualified)
    }

    /// Walks a schema node path. Absolute paths (`start == None`) begin
    /// among the top-level nodes of the first step's module.
    pub(crate) fn resolve_path(&self, start: Option<StmtId>, steps: &[QName]) -> Option<StmtId> {
        let (mut current, rest) = match start {
            Some(start) => (start, steps),
            None => {
                let (first, rest) = steps.split_first()?;
                let module = self.namespaces.get(
                    NamespaceKind::ModuleNamespace,
                    None,
                    &NamespaceKey::Module(first.module.clone()),
                )?;
                let top = self
                    .module_group(module)
                    .into_iter()
                    .find_map(|root| self.schema_child(root, first))?;
                (top, rest)
            }
        };
        for step in rest {
            current = self.schema_child(current, step)?;
        }
        Some(current)
    }

    /// Schema node child of `parent` named `step`. A choice shorthand node
    /// also answers for its implicit case, so `/choice/x/x` reaches `x`.
    pub(crate) fn schema_child(&self, parent: StmtId, step: &QName) -> Option<StmtId> {
        let found = self
            .tree
            .live_children(parent)
            .filter(|&child| self.tree.get(child).kind.is_schema_node())
            .find(|&child| self.qname_of(child).as_ref() == Some(step));
        if found.is_some() {
            return found;
        }
        let node = self.tree.get(parent);
        let in_choice = node
            .parent
            .is_some_and(|p| self.tree.get(p).kind == StatementKind::Choice);
        (in_choice && node.kind != StatementKind::Case && self.qname_of(parent).as_ref() == Some(step))
            .then_some(parent)
    }

    /// Source reference of a context.
    pub(crate) fn reference(&self, ctx: StmtId) -> &StatementRef {
        &self.tree.get(ctx).reference
    }
}
