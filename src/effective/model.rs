use std::sync::Arc;

use smol_str::SmolStr;

use super::statement::EffectiveStatement;
use crate::base::StatementRef;
use crate::diagnostics::Diagnostic;
use crate::model::{QName, QNameModule, Revision, SchemaNodeId, YangVersion};
use crate::source::SourceIdentifier;

/// A compiled module. Its statement also carries the body statements of
/// every submodule it includes.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveModule {
    pub(crate) identifier: SourceIdentifier,
    pub(crate) namespace: QNameModule,
    pub(crate) prefix: SmolStr,
    pub(crate) yang_version: YangVersion,
    pub(crate) statement: Arc<EffectiveStatement>,
    pub(crate) submodules: Vec<EffectiveSubmodule>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveSubmodule {
    pub(crate) identifier: SourceIdentifier,
    pub(crate) statement: Arc<EffectiveStatement>,
}

impl EffectiveSubmodule {
    pub fn identifier(&self) -> &SourceIdentifier {
        &self.identifier
    }

    pub fn statement(&self) -> &Arc<EffectiveStatement> {
        &self.statement
    }
}

impl EffectiveModule {
    pub fn identifier(&self) -> &SourceIdentifier {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.identifier.name
    }

    pub fn namespace(&self) -> &QNameModule {
        &self.namespace
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn yang_version(&self) -> YangVersion {
        self.yang_version
    }

    pub fn statement(&self) -> &Arc<EffectiveStatement> {
        &self.statement
    }

    pub fn submodules(&self) -> &[EffectiveSubmodule] {
        &self.submodules
    }

    /// Top-level schema node named `qname`.
    pub fn find_top(&self, qname: &QName) -> Option<&Arc<EffectiveStatement>> {
        self.statement.schema_child(qname)
    }
}

/// Where a grouping was instantiated.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupingUsage {
    pub grouping: QName,
    pub reference: StatementRef,
    /// `uses` statements naming the grouping.
    pub direct: Vec<StatementRef>,
    /// `uses` statements copying it through other groupings.
    pub indirect: Vec<StatementRef>,
}

/// The result of a successful build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectiveModel {
    pub(crate) modules: Vec<EffectiveModule>,
    pub(crate) groupings: Vec<GroupingUsage>,
    pub(crate) warnings: Vec<Diagnostic>,
}

impl EffectiveModel {
    /// Modules sorted by identifier.
    pub fn modules(&self) -> &[EffectiveModule] {
        &self.modules
    }

    /// Module by name and revision; without a revision the latest one.
    pub fn find_module(&self, name: &str, revision: Option<Revision>) -> Option<&EffectiveModule> {
        let mut candidates = self.modules.iter().filter(|m| m.identifier.name == name);
        match revision {
            Some(revision) => candidates.find(|m| m.identifier.revision == Some(revision)),
            None => candidates.next_back(),
        }
    }

    pub fn find_module_by_namespace(&self, namespace: &QNameModule) -> Option<&EffectiveModule> {
        self.modules.iter().find(|m| &m.namespace == namespace)
    }

    /// Schema node at an absolute path of qualified names. Choice
    /// shorthand nodes sit inside their implicit case, so they are
    /// reached as `choice/node/node`.
    pub fn find_schema_node(&self, path: &[QName]) -> Option<&Arc<EffectiveStatement>> {
        let (first, rest) = path.split_first()?;
        let module = self.find_module_by_namespace(&first.module)?;
        let mut current = module.find_top(first)?;
        for step in rest {
            current = current.schema_child(step)?;
        }
        Some(current)
    }

    /// Like [`Self::find_schema_node`], for a path written with module
    /// prefixes (`/foo:top/foo:x`). Unprefixed steps stay in the module
    /// of the previous step.
    pub fn find_schema_path(&self, path: &str) -> Option<&Arc<EffectiveStatement>> {
        let path = SchemaNodeId::parse(path).ok()?;
        if !path.absolute {
            return None;
        }
        let mut module: Option<&QNameModule> = None;
        let mut qnames = Vec::with_capacity(path.steps.len());
        for step in &path.steps {
            if let Some(prefix) = &step.prefix {
                module = Some(&self.modules.iter().rev().find(|m| &m.prefix == prefix)?.namespace);
            }
            qnames.push(QName::new(module?.clone(), step.name.clone()));
        }
        self.find_schema_node(&qnames)
    }

    /// Instantiation sites of every grouping named `grouping`.
    pub fn grouping_sites(&self, grouping: &QName) -> Vec<&GroupingUsage> {
        self.groupings.iter().filter(|g| &g.grouping == grouping).collect()
    }

    /// Non-fatal diagnostics of the build (ignored deviations...).
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}
