//! Species node — one vertex of the phylogenic tree
//!
//! Nodes live in the tree's arena and reference each other by [`SpeciesId`],
//! so navigation works both ways without owning back-pointers. Each node
//! keeps a bounded enveloppe of representative genomes plus a cache of the
//! pairwise compatibility scores between them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a species node in the tree arena, doubling as its public
/// identity: ids are assigned densely in creation order and never reused.
pub type SpeciesId = usize;

/// Lifetime statistics of a species.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesStats {
    /// Step at which the species first appeared
    pub first_appearance: u64,
    /// Step at which a member was last reported alive
    pub last_appearance: u64,
    /// Cumulative number of genomes ever classified into this species
    pub count: u64,
    /// Leftmost position a member was observed at (layout hint for viewers)
    pub xmin: i64,
    /// Rightmost position a member was observed at
    pub xmax: i64,
}

impl SpeciesStats {
    /// Folds one observation into the stats. The first observation seeds
    /// the positional extremes; later ones only widen them.
    pub(crate) fn record(&mut self, step: u64, x: i64) {
        if self.count == 0 {
            self.xmin = x;
            self.xmax = x;
        } else {
            self.xmin = self.xmin.min(x);
            self.xmax = self.xmax.max(x);
        }
        self.count += 1;
        self.last_appearance = step;
    }
}

/// Cache of pairwise compatibility scores between enveloppe slots.
///
/// Keys are unordered: `(5, 2)` and `(2, 5)` address the same entry. Only
/// pairs of currently occupied slots are ever present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceCache {
    scores: BTreeMap<(usize, usize), f64>,
}

impl DistanceCache {
    /// Cached score between two slots, if present.
    pub fn get(&self, a: usize, b: usize) -> Option<f64> {
        self.scores.get(&Self::key(a, b)).copied()
    }

    /// Records (or overwrites) the score between two slots.
    pub fn set(&mut self, a: usize, b: usize, score: f64) {
        self.scores.insert(Self::key(a, b), score);
    }

    /// Number of cached pairs.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Iterates cached pairs as `(slot_a, slot_b, score)` triples with
    /// `slot_a <= slot_b`, in deterministic key order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.scores.iter().map(|(&(a, b), &score)| (a, b, score))
    }

    fn key(a: usize, b: usize) -> (usize, usize) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// One species (or the synthetic root, which may hold no genomes).
#[derive(Debug, Clone)]
pub struct SpeciesNode<G> {
    pub(crate) id: SpeciesId,
    pub(crate) parent: Option<SpeciesId>,
    pub(crate) children: Vec<SpeciesId>,
    pub(crate) enveloppe: Vec<G>,
    pub(crate) distances: DistanceCache,
    pub(crate) stats: SpeciesStats,
}

impl<G> SpeciesNode<G> {
    pub(crate) fn new(id: SpeciesId, parent: Option<SpeciesId>) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            enveloppe: Vec::new(),
            distances: DistanceCache::default(),
            stats: SpeciesStats::default(),
        }
    }

    pub fn id(&self) -> SpeciesId {
        self.id
    }

    /// Parent species; `None` for the root.
    pub fn parent(&self) -> Option<SpeciesId> {
        self.parent
    }

    /// Child species in insertion order. The order is semantically
    /// meaningful: classification tests children first-match.
    pub fn children(&self) -> &[SpeciesId] {
        &self.children
    }

    /// Current representative genomes, in slot order.
    pub fn enveloppe(&self) -> &[G] {
        &self.enveloppe
    }

    pub fn distances(&self) -> &DistanceCache {
        &self.distances
    }

    pub fn stats(&self) -> &SpeciesStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys_are_unordered() {
        let mut cache = DistanceCache::default();
        cache.set(5, 2, 0.4);
        assert_eq!(cache.get(2, 5), Some(0.4));
        assert_eq!(cache.get(5, 2), Some(0.4));
        assert_eq!(cache.len(), 1);

        cache.set(2, 5, 0.6);
        assert_eq!(cache.get(5, 2), Some(0.6));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_iter_normalizes_pairs() {
        let mut cache = DistanceCache::default();
        cache.set(3, 1, 0.9);
        cache.set(0, 2, 0.1);
        let triples: Vec<_> = cache.iter().collect();
        assert_eq!(triples, vec![(0, 2, 0.1), (1, 3, 0.9)]);
    }

    #[test]
    fn test_new_node_is_zeroed() {
        let node: SpeciesNode<()> = SpeciesNode::new(3, Some(0));
        assert_eq!(node.id(), 3);
        assert_eq!(node.parent(), Some(0));
        assert!(node.enveloppe().is_empty());
        assert!(node.children().is_empty());
        assert_eq!(*node.stats(), SpeciesStats::default());
    }

    #[test]
    fn test_first_record_seeds_extremes() {
        let mut stats = SpeciesStats::default();
        stats.record(1, 5);
        assert_eq!(stats.xmin, 5);
        assert_eq!(stats.xmax, 5);
        stats.record(2, 8);
        assert_eq!(stats.xmin, 5);
        assert_eq!(stats.xmax, 8);
    }

    #[test]
    fn test_stats_record_widens_extremes() {
        let mut stats = SpeciesStats::default();
        stats.record(3, -4);
        stats.record(7, 9);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.last_appearance, 7);
        assert_eq!(stats.xmin, -4);
        assert_eq!(stats.xmax, 9);
    }
}
