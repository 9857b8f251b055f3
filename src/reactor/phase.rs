//! Reactor phases.

use std::fmt;

/// Processing phases, in execution order. No phase is re-entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Module identities, prefixes, import/include/belongs-to.
    SourceLinkage,
    /// Arguments parsed, definitions bound into namespaces.
    StatementDefinition,
    /// Cross references resolved, rewrites scheduled.
    FullDeclaration,
    /// Rewrites applied; contexts ready to freeze.
    EffectiveModel,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::SourceLinkage,
        Phase::StatementDefinition,
        Phase::FullDeclaration,
        Phase::EffectiveModel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::SourceLinkage => "source-linkage",
            Phase::StatementDefinition => "statement-definition",
            Phase::FullDeclaration => "full-declaration",
            Phase::EffectiveModel => "effective-model",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
