// line-of-descent bookkeeping
//
// parents are weak references: an id into this archive, never an owned value.
// the archive outlives removal from the active population, so a walk can still
// read the raw fitness of an ancestor that was selected away generations ago.
use std::collections::{HashMap, HashSet};

use crate::individual::IndividualId;

/// running "benefit to offspring" statistics of one individual.
/// kept per id so every copy of a selected individual shares them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OffspringStats {
    /// sum of (w_eff(offspring) - w_eff(self)) over all reproduction events
    pub acc_delta: f64,
    pub count: u64,
}

impl OffspringStats {
    /// mean benefit per offspring (0.0 for an individual that never reproduced)
    pub fn mean_delta(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.acc_delta / self.count as f64
        }
    }
}

/// what the archive remembers about one individual
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineageRecord {
    pub id: IndividualId,
    /// `None` is the "no ancestry" sentinel (injected founders)
    pub generation: Option<u32>,
    pub parent: Option<IndividualId>,
    /// raw fitness recorded when this individual was evaluated
    pub w_real: Option<f64>,
    pub offspring: OffspringStats,
}

impl LineageRecord {
    /// founders (generation 0) and sentinel individuals have no ancestor to follow
    #[inline]
    pub fn has_ancestry(&self) -> bool {
        matches!(self.generation, Some(g) if g > 0)
    }

    #[inline]
    pub fn w_real_or_default(&self) -> f64 {
        self.w_real.unwrap_or(0.0)
    }
}

#[derive(Debug, Default)]
pub struct LineageArchive {
    records: HashMap<IndividualId, LineageRecord>,
    next_id: u64,
}

impl LineageArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// issue a fresh id and remember its generation and lineage parent
    pub fn register(&mut self, generation: Option<u32>, parent: Option<IndividualId>) -> IndividualId {
        let id = IndividualId(self.next_id);
        self.next_id += 1;
        self.records.insert(
            id,
            LineageRecord { id, generation, parent, w_real: None, offspring: OffspringStats::default() },
        );
        id
    }

    #[inline]
    pub fn get(&self, id: IndividualId) -> Option<&LineageRecord> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn records(&self) -> impl Iterator<Item = &LineageRecord> {
        self.records.values()
    }

    /// store the raw fitness of an evaluated individual so descendants can read it later
    pub fn record_w_real(&mut self, id: IndividualId, w_real: f64) {
        match self.records.get_mut(&id) {
            Some(rec) => rec.w_real = Some(w_real),
            None => panic!("raw fitness recorded for unregistered individual {id:?}"),
        }
    }

    /// fold one reproduction event into a parent's offspring statistics
    pub fn record_offspring(&mut self, id: IndividualId, delta: f64) {
        match self.records.get_mut(&id) {
            Some(rec) => {
                rec.offspring.acc_delta += delta;
                rec.offspring.count += 1;
            }
            None => panic!("offspring recorded for unregistered individual {id:?}"),
        }
    }

    /// offspring statistics of `id` (zeroed for unknown ids)
    pub fn offspring_stats(&self, id: IndividualId) -> OffspringStats {
        self.records.get(&id).map(|rec| rec.offspring).unwrap_or_default()
    }

    /// rewrite the weak parent reference (`None` clears the lineage)
    pub fn set_parent(&mut self, id: IndividualId, parent: Option<IndividualId>) {
        if let Some(rec) = self.records.get_mut(&id) {
            rec.parent = parent;
        }
    }

    /// immediate ancestor, or `None` for founders, sentinel individuals and missing parents
    pub fn ancestor(&self, id: IndividualId) -> Option<&LineageRecord> {
        let rec = self.records.get(&id)?;
        if !rec.has_ancestry() {
            return None;
        }
        self.records.get(&rec.parent?)
    }

    /// lazily walk at most `depth` ancestors. stops early at a sentinel generation
    /// or a missing parent; the depth cap also bounds malformed (cyclic) chains.
    pub fn walk(&self, id: IndividualId, depth: u32) -> Walk<'_> {
        Walk { archive: self, cursor: Some(id), remaining: depth }
    }

    /// drop records that no walk of depth `depth` from a living individual can reach.
    /// returns the number of records removed.
    pub fn prune(&mut self, living: impl IntoIterator<Item = IndividualId>, depth: u32) -> usize {
        profiling::scope!("LineageArchive::prune");
        let mut keep: HashSet<IndividualId> = HashSet::new();
        for id in living {
            if !keep.insert(id) {
                continue; // duplicates (elites) share a chain
            }
            keep.extend(self.walk(id, depth).map(|rec| rec.id));
        }

        let before = self.records.len();
        self.records.retain(|id, _| keep.contains(id));
        before - self.records.len()
    }
}

/// iterator over the ancestor chain, nearest first
pub struct Walk<'a> {
    archive: &'a LineageArchive,
    cursor: Option<IndividualId>,
    remaining: u32,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a LineageRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let from = self.cursor.take()?;
        let ancestor = self.archive.ancestor(from)?;
        if ancestor.generation.is_none() {
            return None;
        }
        self.remaining -= 1;
        self.cursor = Some(ancestor.id);
        Some(ancestor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// founder (gen 0) -> child (gen 1) -> grandchild (gen 2), raw fitness 9, 2, 5
    fn three_generation_chain() -> (LineageArchive, [IndividualId; 3]) {
        let mut archive = LineageArchive::new();
        let grandparent = archive.register(Some(0), None);
        let parent = archive.register(Some(1), Some(grandparent));
        let ind = archive.register(Some(2), Some(parent));
        archive.record_w_real(grandparent, 9.0);
        archive.record_w_real(parent, 2.0);
        archive.record_w_real(ind, 5.0);
        (archive, [ind, parent, grandparent])
    }

    #[test]
    fn test_ancestor_of_founder_is_none() {
        let (archive, [ind, parent, grandparent]) = three_generation_chain();
        assert_eq!(archive.ancestor(ind).map(|r| r.id), Some(parent));
        assert_eq!(archive.ancestor(parent).map(|r| r.id), Some(grandparent));
        assert!(archive.ancestor(grandparent).is_none());
    }

    #[test]
    fn test_walk_respects_depth() {
        let (archive, [ind, parent, grandparent]) = three_generation_chain();
        let ids: Vec<_> = archive.walk(ind, 1).map(|r| r.id).collect();
        assert_eq!(ids, vec![parent]);
        let ids: Vec<_> = archive.walk(ind, 10).map(|r| r.id).collect();
        assert_eq!(ids, vec![parent, grandparent]);
        assert_eq!(archive.walk(ind, 0).count(), 0);
    }

    #[test]
    fn test_walk_stops_at_sentinel_generation() {
        let mut archive = LineageArchive::new();
        let injected = archive.register(None, None);
        let child = archive.register(Some(1), Some(injected));
        assert!(archive.ancestor(child).is_some());
        assert_eq!(archive.walk(child, 5).count(), 0);
    }

    #[test]
    fn test_walk_stops_at_missing_parent() {
        let mut archive = LineageArchive::new();
        let orphan = archive.register(Some(4), None);
        assert!(archive.ancestor(orphan).is_none());
        assert_eq!(archive.walk(orphan, 5).count(), 0);
    }

    #[test]
    fn test_cyclic_chain_is_capped() {
        let mut archive = LineageArchive::new();
        let a = archive.register(Some(3), None);
        let b = archive.register(Some(4), Some(a));
        // corrupt the chain so a points back at b
        archive.set_parent(a, Some(b));
        assert_eq!(archive.walk(b, 7).count(), 7);
        assert_eq!(archive.walk(b, 1000).count(), 1000);
    }

    #[test]
    fn test_set_parent_clears_lineage() {
        let (mut archive, [ind, parent, _]) = three_generation_chain();
        assert_eq!(archive.get(ind).and_then(|r| r.parent), Some(parent));
        archive.set_parent(ind, None);
        assert!(archive.ancestor(ind).is_none());
    }

    #[test]
    fn test_prune_keeps_reachable_records() {
        let (mut archive, [ind, parent, grandparent]) = three_generation_chain();
        let stray = archive.register(Some(0), None);
        let removed = archive.prune([ind], 1);
        assert_eq!(removed, 2);
        assert!(archive.get(ind).is_some());
        assert!(archive.get(parent).is_some());
        assert!(archive.get(grandparent).is_none());
        assert!(archive.get(stray).is_none());
        // walk beyond the pruned horizon simply ends early
        assert_eq!(archive.walk(ind, 5).count(), 1);
    }

    #[test]
    fn test_offspring_stats_accumulate_per_id() {
        let (mut archive, [ind, parent, _]) = three_generation_chain();
        archive.record_offspring(parent, 1.5);
        archive.record_offspring(parent, -0.5);
        let stats = archive.offspring_stats(parent);
        assert_eq!(stats.count, 2);
        assert!((stats.acc_delta - 1.0).abs() < 1e-12);
        assert!((stats.mean_delta() - 0.5).abs() < 1e-12);
        assert_eq!(archive.offspring_stats(ind), OffspringStats::default());
        assert_eq!(archive.offspring_stats(ind).mean_delta(), 0.0);
    }

    #[test]
    #[should_panic(expected = "unregistered individual")]
    fn test_recording_unknown_id_panics() {
        let mut archive = LineageArchive::new();
        archive.record_w_real(IndividualId(42), 1.0);
    }
}
