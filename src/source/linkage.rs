//! Source-level linkage: which source satisfies which dependency, the
//! dependencies-first registration order, and library source selection.
//!
//! Missing dependencies are not errors here; the reactor reports them
//! once every registered source had its chance to supply them.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::descriptor::SourceDescriptor;
use super::identifier::{SourceDependency, SourceIdentifier};
use crate::graph::{is_cycle, strongly_connected};
use crate::model::Revision;

/// Picks the source satisfying a dependency on `name`: the exact revision
/// when pinned, otherwise the latest available revision.
pub fn resolve_dependency<'a>(
    name: &str,
    revision: Option<Revision>,
    candidates: impl IntoIterator<Item = &'a SourceIdentifier>,
) -> Option<&'a SourceIdentifier> {
    candidates
        .into_iter()
        .filter(|id| id.satisfies(name, revision))
        .max()
}

/// Dependencies-first order of a source set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOrder {
    /// Indices into the input slice, dependencies before dependents.
    pub order: Vec<usize>,
    /// Import/include cycles, as index groups sorted by identifier.
    pub cycles: Vec<Vec<usize>>,
}

/// Orders sources so that every source comes after the sources it
/// imports, includes or belongs to. Ties are broken by identifier, so the
/// result does not depend on the input order.
pub fn dependency_order(sources: &[Arc<SourceDescriptor>]) -> DependencyOrder {
    let mut sorted: Vec<usize> = (0..sources.len()).collect();
    sorted.sort_by(|&a, &b| sources[a].identifier().cmp(sources[b].identifier()));

    let edges = |index: usize| -> Vec<usize> {
        let mut targets: Vec<usize> = sources[index]
            .dependencies()
            .iter()
            .filter(|dep| !matches!(dep, SourceDependency::BelongsTo { .. }))
            .filter_map(|dep| {
                let ids = sources.iter().map(|s| s.identifier());
                let target = resolve_dependency(dep.target(), dep.revision(), ids)?;
                sources.iter().position(|s| s.identifier() == target)
            })
            .collect();
        targets.sort_by(|&a, &b| sources[a].identifier().cmp(sources[b].identifier()));
        targets.dedup();
        targets
    };

    let components = strongly_connected(sorted.iter().copied(), edges);
    let mut order = Vec::with_capacity(sources.len());
    let mut cycles = Vec::new();
    for mut component in components {
        component.sort_by(|&a, &b| sources[a].identifier().cmp(sources[b].identifier()));
        if is_cycle(&component, edges) {
            cycles.push(component.clone());
        }
        order.extend(component);
    }
    DependencyOrder { order, cycles }
}

/// Selects the sources taking part in a build: every main source, plus
/// each library source transitively referenced from them.
pub fn involved_sources(
    main: &[Arc<SourceDescriptor>],
    library: &[Arc<SourceDescriptor>],
) -> Vec<Arc<SourceDescriptor>> {
    let mut selected: Vec<Arc<SourceDescriptor>> = main.to_vec();
    let mut known: BTreeSet<SourceIdentifier> = main.iter().map(|s| s.identifier().clone()).collect();
    let mut frontier: Vec<Arc<SourceDescriptor>> = main.to_vec();

    while let Some(source) = frontier.pop() {
        for dependency in source.dependencies() {
            let Some(target) = resolve_dependency(
                dependency.target(),
                dependency.revision(),
                library.iter().map(|s| s.identifier()),
            ) else {
                continue;
            };
            // A main source already satisfying the dependency wins.
            let satisfied_by_main = resolve_dependency(
                dependency.target(),
                dependency.revision(),
                main.iter().map(|s| s.identifier()),
            )
            .is_some();
            if satisfied_by_main || known.contains(target) {
                continue;
            }
            if let Some(lib) = library.iter().find(|s| s.identifier() == target) {
                known.insert(target.clone());
                selected.push(lib.clone());
                frontier.push(lib.clone());
            }
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> Arc<SourceDescriptor> {
        Arc::new(SourceDescriptor::parse("test.yang", text).unwrap())
    }

    fn names(sources: &[Arc<SourceDescriptor>], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| sources[i].identifier().to_string()).collect()
    }

    #[test]
    fn test_resolve_latest_or_pinned() {
        let ids = [
            SourceIdentifier::new("a", "2020-01-01".parse().ok()),
            SourceIdentifier::new("a", "2021-01-01".parse().ok()),
            SourceIdentifier::new("b", None),
        ];
        assert_eq!(resolve_dependency("a", None, &ids), Some(&ids[1]));
        assert_eq!(resolve_dependency("a", "2020-01-01".parse().ok(), &ids), Some(&ids[0]));
        assert_eq!(resolve_dependency("c", None, &ids), None);
    }

    #[test]
    fn test_dependency_order_is_input_independent() {
        let a = source("module a { prefix a; import b { prefix b; } }");
        let b = source("module b { prefix b; import c { prefix c; } }");
        let c = source("module c { prefix c; }");

        let forward = vec![a.clone(), b.clone(), c.clone()];
        let backward = vec![c, b, a];
        let first = dependency_order(&forward);
        let second = dependency_order(&backward);

        assert_eq!(names(&forward, &first.order), ["c", "b", "a"]);
        assert_eq!(names(&backward, &second.order), ["c", "b", "a"]);
        assert!(first.cycles.is_empty());
    }

    #[test]
    fn test_import_cycle_reported() {
        let sources = vec![
            source("module a { prefix a; import b { prefix b; } }"),
            source("module b { prefix b; import a { prefix a; } }"),
        ];
        let order = dependency_order(&sources);
        assert_eq!(order.cycles.len(), 1);
        assert_eq!(names(&sources, &order.cycles[0]), ["a", "b"]);
    }

    #[test]
    fn test_library_sources_only_when_referenced() {
        let main = vec![source("module app { prefix app; import types { prefix t; } }")];
        let library = vec![
            source("module types { prefix t; import base { prefix b; } }"),
            source("module base { prefix b; }"),
            source("module unused { prefix u; }"),
        ];
        let involved = involved_sources(&main, &library);
        let mut names: Vec<_> = involved.iter().map(|s| s.identifier().to_string()).collect();
        names.sort();
        assert_eq!(names, ["app", "base", "types"]);
    }
}
