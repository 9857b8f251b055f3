//! Shared, reference-counted source registry.
//!
//! Several registrants may contribute the same source; the registry keeps
//! one descriptor per identifier and counts registrations. Every mutation
//! happens under a single lock. The dependency-ordered snapshot and the
//! effective model built from it are cached and keyed by the set of
//! registered identifiers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use super::descriptor::SourceDescriptor;
use super::identifier::SourceIdentifier;
use super::linkage::{DependencyOrder, dependency_order};
use crate::config::BuildOptions;
use crate::effective::EffectiveModel;
use crate::error::BuildError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("source {identifier} from '{new}' conflicts with the already registered '{existing}'")]
    Conflict {
        identifier: SourceIdentifier,
        existing: Arc<str>,
        new: Arc<str>,
    },
}

/// Outcome of an unregistration.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// Other registrants still hold the source.
    Released {
        identifier: SourceIdentifier,
        refcount: usize,
    },
    /// The last registration went away; the source is evicted.
    Removed {
        identifier: SourceIdentifier,
        descriptor: Arc<SourceDescriptor>,
    },
}

/// Registered sources in dependency order.
#[derive(Debug)]
pub struct SourceSnapshot {
    key: BTreeSet<SourceIdentifier>,
    sources: Vec<Arc<SourceDescriptor>>,
    cycles: Vec<Vec<SourceIdentifier>>,
}

impl SourceSnapshot {
    fn new(sources: Vec<Arc<SourceDescriptor>>) -> Self {
        let DependencyOrder { order, cycles } = dependency_order(&sources);
        let key = sources.iter().map(|s| s.identifier().clone()).collect();
        let cycles = cycles
            .into_iter()
            .map(|group| group.into_iter().map(|i| sources[i].identifier().clone()).collect())
            .collect();
        let sources = order.into_iter().map(|i| sources[i].clone()).collect();
        Self { key, sources, cycles }
    }

    /// The identifier set this snapshot was computed from.
    pub fn key(&self) -> &BTreeSet<SourceIdentifier> {
        &self.key
    }

    /// Sources, dependencies before dependents.
    pub fn sources(&self) -> &[Arc<SourceDescriptor>] {
        &self.sources
    }

    /// Import/include cycles among the registered sources.
    pub fn cycles(&self) -> &[Vec<SourceIdentifier>] {
        &self.cycles
    }
}

struct Entry {
    descriptor: Arc<SourceDescriptor>,
    refcount: usize,
}

#[derive(Default)]
struct RegistryInner {
    entries: BTreeMap<SourceIdentifier, Entry>,
    /// Bumped on every change of the identifier set.
    generation: u64,
    snapshot: Option<Arc<SourceSnapshot>>,
    model: Option<(BTreeSet<SourceIdentifier>, Arc<EffectiveModel>)>,
}

#[derive(Default)]
pub struct SourceRegistry {
    options: BuildOptions,
    inner: Mutex<RegistryInner>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose effective models are built with `options`.
    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            options,
            inner: Mutex::default(),
        }
    }

    /// Registers a source, returning its new reference count.
    ///
    /// Registering an equal source again only bumps the count; a different
    /// source under an already registered identifier is rejected.
    pub fn register(&self, source: impl Into<Arc<SourceDescriptor>>) -> Result<usize, RegistryError> {
        let source = source.into();
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.get_mut(source.identifier()) {
            if !entry.descriptor.same_content(&source) {
                return Err(RegistryError::Conflict {
                    identifier: source.identifier().clone(),
                    existing: entry.descriptor.name().clone(),
                    new: source.name().clone(),
                });
            }
            entry.refcount += 1;
            let refcount = entry.refcount;
            debug!(source = %source.identifier(), refcount, "source registration shared");
            return Ok(refcount);
        }

        debug!(source = %source.identifier(), "source registered");
        inner.entries.insert(
            source.identifier().clone(),
            Entry {
                descriptor: source,
                refcount: 1,
            },
        );
        inner.invalidate();
        Ok(1)
    }

    /// Drops one registration. Returns `None` if the source is unknown.
    pub fn unregister(&self, identifier: &SourceIdentifier) -> Option<RegistryEvent> {
        let mut inner = self.inner.lock();
        let entry = inner.entries.get_mut(identifier)?;
        entry.refcount -= 1;
        if entry.refcount > 0 {
            return Some(RegistryEvent::Released {
                identifier: identifier.clone(),
                refcount: entry.refcount,
            });
        }

        let entry = inner.entries.remove(identifier)?;
        inner.invalidate();
        debug!(source = %identifier, "source evicted");
        Some(RegistryEvent::Removed {
            identifier: identifier.clone(),
            descriptor: entry.descriptor,
        })
    }

    pub fn refcount(&self, identifier: &SourceIdentifier) -> usize {
        self.inner
            .lock()
            .entries
            .get(identifier)
            .map_or(0, |e| e.refcount)
    }

    pub fn contains(&self, identifier: &SourceIdentifier) -> bool {
        self.inner.lock().entries.contains_key(identifier)
    }

    pub fn get(&self, identifier: &SourceIdentifier) -> Option<Arc<SourceDescriptor>> {
        self.inner
            .lock()
            .entries
            .get(identifier)
            .map(|e| e.descriptor.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dependency-ordered view of the registered sources.
    ///
    /// The ordering is computed outside the lock over a consistent copy of
    /// the entry table, and only cached if nothing changed meanwhile.
    pub fn snapshot(&self) -> Arc<SourceSnapshot> {
        let (generation, sources) = {
            let inner = self.inner.lock();
            if let Some(snapshot) = &inner.snapshot {
                return snapshot.clone();
            }
            let sources: Vec<_> = inner.entries.values().map(|e| e.descriptor.clone()).collect();
            (inner.generation, sources)
        };

        let snapshot = Arc::new(SourceSnapshot::new(sources));
        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.snapshot = Some(snapshot.clone());
        }
        snapshot
    }

    /// Effective model of the registered sources, rebuilt only when the
    /// set of registered identifiers changed since the last build.
    pub fn effective_model(&self) -> Result<Arc<EffectiveModel>, BuildError> {
        let snapshot = self.snapshot();
        if let Some((key, model)) = &self.inner.lock().model {
            if key == snapshot.key() {
                return Ok(model.clone());
            }
        }

        let model = Arc::new(crate::reactor::build_with_options(snapshot.sources(), &self.options)?);
        let mut inner = self.inner.lock();
        if inner.snapshot.as_ref().is_some_and(|s| Arc::ptr_eq(s, &snapshot)) {
            inner.model = Some((snapshot.key().clone(), model.clone()));
        }
        Ok(model)
    }
}

impl RegistryInner {
    fn invalidate(&mut self) {
        self.generation += 1;
        self.snapshot = None;
        self.model = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str, text: &str) -> SourceDescriptor {
        SourceDescriptor::parse(name, text).unwrap()
    }

    #[test]
    fn test_register_twice_shares_one_descriptor() {
        let registry = SourceRegistry::new();
        let text = "module a { namespace urn:a; prefix a; }";
        let first = Arc::new(source("a.yang", text));

        assert_eq!(registry.register(first.clone()).unwrap(), 1);
        assert_eq!(registry.register(source("a.yang", text)).unwrap(), 2);

        let id = first.identifier().clone();
        assert_eq!(registry.refcount(&id), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&id).is_some_and(|d| Arc::ptr_eq(&d, &first)));
    }

    #[test]
    fn test_unregister_evicts_at_zero() {
        let registry = SourceRegistry::new();
        let text = "module a { namespace urn:a; prefix a; }";
        registry.register(source("a.yang", text)).unwrap();
        registry.register(source("a.yang", text)).unwrap();
        let id = SourceIdentifier::new("a", None);

        assert!(matches!(
            registry.unregister(&id),
            Some(RegistryEvent::Released { refcount: 1, .. })
        ));
        assert!(registry.contains(&id));
        assert!(matches!(registry.unregister(&id), Some(RegistryEvent::Removed { .. })));
        assert!(!registry.contains(&id));
        assert!(registry.unregister(&id).is_none());
    }

    #[test]
    fn test_conflicting_content_is_rejected() {
        let registry = SourceRegistry::new();
        registry
            .register(source("a1.yang", "module a { namespace urn:a; prefix a; }"))
            .unwrap();
        let err = registry
            .register(source("a2.yang", "module a { namespace urn:other; prefix a; }"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { ref new, .. } if &**new == "a2.yang"));
        assert_eq!(registry.refcount(&SourceIdentifier::new("a", None)), 1);
    }

    #[test]
    fn test_snapshot_cached_until_set_changes() {
        let registry = SourceRegistry::new();
        registry
            .register(source("b.yang", "module b { namespace urn:b; prefix b; import a { prefix a; } }"))
            .unwrap();
        registry
            .register(source("a.yang", "module a { namespace urn:a; prefix a; }"))
            .unwrap();

        let first = registry.snapshot();
        let order: Vec<_> = first.sources().iter().map(|s| s.identifier().name.to_string()).collect();
        assert_eq!(order, ["a", "b"]);
        assert!(Arc::ptr_eq(&first, &registry.snapshot()));

        registry.unregister(&SourceIdentifier::new("a", None));
        let second = registry.snapshot();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.key().len(), 1);
    }
}
