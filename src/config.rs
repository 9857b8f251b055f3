//! Build configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use smol_str::SmolStr;

use crate::model::YangVersion;
use crate::source::SourceDescriptor;

/// Which features count as supported when evaluating `if-feature`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FeatureSet {
    /// Every declared feature is supported.
    #[default]
    All,
    /// Only the listed `(module name, feature name)` pairs are supported.
    Only(BTreeSet<(SmolStr, SmolStr)>),
}

impl FeatureSet {
    pub fn only<'a>(features: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        FeatureSet::Only(
            features
                .into_iter()
                .map(|(module, feature)| (SmolStr::new(module), SmolStr::new(feature)))
                .collect(),
        )
    }

    pub fn contains(&self, module: &str, feature: &str) -> bool {
        match self {
            FeatureSet::All => true,
            FeatureSet::Only(set) => set.contains(&(SmolStr::new(module), SmolStr::new(feature))),
        }
    }
}

/// Options for one build.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub features: FeatureSet,
    /// Language versions sources may declare.
    pub supported_versions: BTreeSet<YangVersion>,
    /// Sources only taking part when some main source depends on them.
    pub library: Vec<Arc<SourceDescriptor>>,
    /// When set, a deviation only applies if its module is listed for the
    /// target module (target module name → deviating module names).
    pub deviations: Option<BTreeMap<SmolStr, BTreeSet<SmolStr>>>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            features: FeatureSet::All,
            supported_versions: [YangVersion::V1, YangVersion::V1_1].into_iter().collect(),
            library: Vec::new(),
            deviations: None,
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    pub fn with_supported_versions(mut self, versions: impl IntoIterator<Item = YangVersion>) -> Self {
        self.supported_versions = versions.into_iter().collect();
        self
    }

    pub fn with_library_sources(mut self, library: impl IntoIterator<Item = Arc<SourceDescriptor>>) -> Self {
        self.library = library.into_iter().collect();
        self
    }

    /// Restricts deviations: `target` may only be deviated by `deviating`.
    pub fn with_deviation<'a>(mut self, target: &str, deviating: impl IntoIterator<Item = &'a str>) -> Self {
        self.deviations
            .get_or_insert_with(BTreeMap::new)
            .entry(SmolStr::new(target))
            .or_default()
            .extend(deviating.into_iter().map(SmolStr::new));
        self
    }

    pub fn deviation_allowed(&self, target_module: &str, deviating_module: &str) -> bool {
        match &self.deviations {
            None => true,
            Some(map) => map
                .get(target_module)
                .is_some_and(|allowed| allowed.iter().any(|m| m == deviating_module)),
        }
    }
}
