//! Strongly connected components over small dependency graphs.
//!
//! Used for source ordering (imports/includes), grouping cycles and
//! typedef chains.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

/// Tarjan's algorithm. Components come out in reverse topological order:
/// a component is emitted after every component it points to, so with
/// "depends on" edges dependencies come first.
pub(crate) fn strongly_connected<N, F, I>(nodes: impl IntoIterator<Item = N>, successors: F) -> Vec<Vec<N>>
where
    N: Copy + Eq + Hash,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
{
    let mut finder = SccFinder {
        successors,
        index: 0,
        stack: Vec::new(),
        on_stack: IndexSet::new(),
        indices: IndexMap::new(),
        lowlinks: IndexMap::new(),
        sccs: Vec::new(),
    };
    for node in nodes {
        if !finder.indices.contains_key(&node) {
            finder.strongconnect(node);
        }
    }
    finder.sccs
}

/// True if the component is a cycle: several members, or one member
/// pointing at itself.
pub(crate) fn is_cycle<N, I>(component: &[N], successors: impl FnOnce(N) -> I) -> bool
where
    N: Copy + Eq,
    I: IntoIterator<Item = N>,
{
    match component {
        [single] => successors(*single).into_iter().any(|n| n == *single),
        members => members.len() > 1,
    }
}

struct SccFinder<N, F> {
    successors: F,
    index: usize,
    stack: Vec<N>,
    on_stack: IndexSet<N>,
    indices: IndexMap<N, usize>,
    lowlinks: IndexMap<N, usize>,
    sccs: Vec<Vec<N>>,
}

impl<N, F, I> SccFinder<N, F>
where
    N: Copy + Eq + Hash,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
{
    fn strongconnect(&mut self, node: N) {
        self.indices.insert(node, self.index);
        self.lowlinks.insert(node, self.index);
        self.index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        let next: Vec<N> = (self.successors)(node).into_iter().collect();
        for succ in next {
            if let Some(&succ_index) = self.indices.get(&succ) {
                if self.on_stack.contains(&succ) {
                    self.lower(node, succ_index);
                }
            } else {
                self.strongconnect(succ);
                let succ_low = self.lowlinks[&succ];
                self.lower(node, succ_low);
            }
        }

        if self.lowlinks[&node] == self.indices[&node] {
            let mut scc = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack.swap_remove(&member);
                scc.push(member);
                if member == node {
                    break;
                }
            }
            scc.reverse();
            self.sccs.push(scc);
        }
    }

    fn lower(&mut self, node: N, value: usize) {
        if let Some(low) = self.lowlinks.get_mut(&node) {
            *low = (*low).min(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges<'a>(graph: &'a [&'a [usize]]) -> impl FnMut(usize) -> Vec<usize> + 'a {
        move |n| graph[n].to_vec()
    }

    #[test]
    fn test_dependencies_come_first() {
        // 0 -> 1 -> 2
        let graph: &[&[usize]] = &[&[1], &[2], &[]];
        let sccs = strongly_connected(0..3, edges(graph));
        assert_eq!(sccs, vec![vec![2], vec![1], vec![0]]);
    }

    #[test]
    fn test_mutual_cycle_is_one_component() {
        // 0 <-> 1, 2 -> 0
        let graph: &[&[usize]] = &[&[1], &[0], &[0]];
        let sccs = strongly_connected(0..3, edges(graph));
        assert_eq!(sccs.len(), 2);
        assert_eq!(sccs[0].len(), 2);
        assert!(is_cycle(&sccs[0], edges(graph)));
        assert!(!is_cycle(&sccs[1], edges(graph)));
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let graph: &[&[usize]] = &[&[0]];
        let sccs = strongly_connected(0..1, edges(graph));
        assert!(is_cycle(&sccs[0], edges(graph)));
    }
}
