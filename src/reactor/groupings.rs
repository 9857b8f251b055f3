//! Grouping instantiation sites.
//!
//! Every `uses` that copies a grouping is recorded as a direct site. A
//! `uses` sitting inside another grouping makes every site of that outer
//! grouping an indirect site of the inner one. The set is frozen once the
//! last phase ends.

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use super::context::StmtId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InstantiationError {
    #[error("grouping instantiation sites are frozen")]
    Frozen,
}

#[derive(Debug, Default)]
pub(crate) struct GroupingSites {
    direct: IndexMap<StmtId, IndexSet<StmtId>>,
    frozen: bool,
}

impl GroupingSites {
    pub fn record(&mut self, grouping: StmtId, uses: StmtId) -> Result<(), InstantiationError> {
        if self.frozen {
            return Err(InstantiationError::Frozen);
        }
        self.direct.entry(grouping).or_default().insert(uses);
        Ok(())
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn groupings(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.direct.keys().copied()
    }

    pub fn direct(&self, grouping: StmtId) -> impl Iterator<Item = StmtId> + '_ {
        self.direct.get(&grouping).into_iter().flatten().copied()
    }

    /// Sites reaching `grouping` through other groupings. `enclosing`
    /// maps a `uses` to the grouping it is written in, if any.
    pub fn indirect(&self, grouping: StmtId, enclosing: impl Fn(StmtId) -> Option<StmtId>) -> Vec<StmtId> {
        let mut seen: IndexSet<StmtId> = IndexSet::new();
        let mut visited: IndexSet<StmtId> = IndexSet::new();
        let mut outer: Vec<StmtId> = self.direct(grouping).filter_map(&enclosing).collect();
        while let Some(current) = outer.pop() {
            if !visited.insert(current) {
                continue;
            }
            for uses in self.direct(current) {
                seen.insert(uses);
                if let Some(next) = enclosing(uses) {
                    outer.push(next);
                }
            }
        }
        seen.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{LineCol, StatementRef, TextRange, TextSize};
    use crate::model::StatementKind;
    use crate::reactor::context::ContextTree;

    fn ids(count: usize) -> Vec<StmtId> {
        let mut tree = ContextTree::default();
        let reference = StatementRef::new("t.yang".into(), TextRange::empty(TextSize::from(0)), LineCol::new(0, 0));
        (0..count)
            .map(|_| tree.create(StatementKind::Uses, "uses".into(), None, reference.clone(), None))
            .collect()
    }

    #[test]
    fn test_record_after_freeze_fails() {
        let ids = ids(3);
        let mut sites = GroupingSites::default();
        sites.record(ids[0], ids[1]).unwrap();
        sites.record(ids[0], ids[1]).unwrap();
        sites.freeze();

        assert!(sites.is_frozen());
        assert_eq!(sites.record(ids[0], ids[2]), Err(InstantiationError::Frozen));
        assert_eq!(sites.direct(ids[0]).collect::<Vec<_>>(), vec![ids[1]]);
    }

    #[test]
    fn test_indirect_sites_follow_enclosing_groupings() {
        // inner is used at u1 inside outer; outer is used at u2 (top level)
        // and at u3 inside outermost; outermost is used at u4.
        let ids = ids(7);
        let (inner, outer, outermost) = (ids[0], ids[1], ids[2]);
        let (u1, u2, u3, u4) = (ids[3], ids[4], ids[5], ids[6]);
        let mut sites = GroupingSites::default();
        sites.record(inner, u1).unwrap();
        sites.record(outer, u2).unwrap();
        sites.record(outer, u3).unwrap();
        sites.record(outermost, u4).unwrap();
        let enclosing = |uses: StmtId| match uses {
            u if u == u1 => Some(outer),
            u if u == u3 => Some(outermost),
            _ => None,
        };

        let indirect = sites.indirect(inner, enclosing);
        assert_eq!(indirect, vec![u2, u3, u4]);
        assert!(sites.indirect(outermost, enclosing).is_empty());
    }
}
