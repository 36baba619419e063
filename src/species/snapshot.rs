//! Snapshot codec — round-trips the tree through its nested wire format
//!
//! The persisted form is `[step, root]`, where every node is the 5-tuple
//! `[id, stats, enveloppe, distances, children]` and stats are
//! `[first, last, count, xmin, xmax]`. Cache keys are unordered slot pairs,
//! which JSON maps cannot express, so distances travel as
//! `[slot_a, slot_b, score]` triples.
//!
//! Decoding rebuilds the arena top-down, preserves every id, and leaves the
//! implicit id counter (the arena length) strictly above the highest id
//! seen, so species created after a restore cannot collide with restored
//! ones. The genome index is not part of the wire format: a restored tree
//! serves structural queries, not genome-ownership lookups.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::genome::Genome;

use super::config::TreeConfig;
use super::error::SnapshotError;
use super::node::{DistanceCache, SpeciesId, SpeciesNode, SpeciesStats};
use super::tree::{SpeciesTree, ROOT_SPECIES};

/// Wire form of [`SpeciesStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StatsRecord(u64, u64, u64, i64, i64);

impl From<SpeciesStats> for StatsRecord {
    fn from(s: SpeciesStats) -> Self {
        Self(s.first_appearance, s.last_appearance, s.count, s.xmin, s.xmax)
    }
}

impl From<StatsRecord> for SpeciesStats {
    fn from(r: StatsRecord) -> Self {
        Self {
            first_appearance: r.0,
            last_appearance: r.1,
            count: r.2,
            xmin: r.3,
            xmax: r.4,
        }
    }
}

/// Wire form of one species node.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRecord<G>(
    SpeciesId,
    StatsRecord,
    Vec<G>,
    Vec<(usize, usize, f64)>,
    Vec<NodeRecord<G>>,
);

/// Wire form of a whole tree: `[step, root]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSnapshot<G>(u64, NodeRecord<G>);

impl<G: Genome + Clone> SpeciesTree<G> {
    /// Captures the tree as its persisted nested-record form.
    pub fn to_snapshot(&self) -> TreeSnapshot<G> {
        TreeSnapshot(self.step(), encode_node(self, ROOT_SPECIES))
    }

    /// Serializes the tree to its JSON wire format.
    pub fn to_json(&self) -> Result<String, SnapshotError>
    where
        G: Serialize,
    {
        Ok(serde_json::to_string(&self.to_snapshot())?)
    }

    /// Rebuilds a tree from a snapshot, validating its structure.
    pub fn from_snapshot(
        config: TreeConfig,
        snapshot: TreeSnapshot<G>,
    ) -> Result<Self, SnapshotError> {
        let TreeSnapshot(step, root) = snapshot;
        if root.0 != ROOT_SPECIES {
            return Err(SnapshotError::BadRootId(root.0));
        }

        let mut slots: Vec<Option<SpeciesNode<G>>> = Vec::new();
        collect_node(root, None, &mut slots)?;

        let mut nodes = Vec::with_capacity(slots.len());
        for (id, slot) in slots.into_iter().enumerate() {
            nodes.push(slot.ok_or(SnapshotError::MissingId(id))?);
        }
        Ok(SpeciesTree::from_parts(config, nodes, step))
    }

    /// Deserializes a tree from its JSON wire format.
    pub fn from_json(config: TreeConfig, json: &str) -> Result<Self, SnapshotError>
    where
        G: DeserializeOwned,
    {
        let snapshot: TreeSnapshot<G> = serde_json::from_str(json)?;
        Self::from_snapshot(config, snapshot)
    }
}

fn encode_node<G: Genome + Clone>(tree: &SpeciesTree<G>, species: SpeciesId) -> NodeRecord<G> {
    let node = &tree.nodes[species];
    NodeRecord(
        node.id(),
        (*node.stats()).into(),
        node.enveloppe().to_vec(),
        node.distances().iter().collect(),
        node.children().iter().map(|&c| encode_node(tree, c)).collect(),
    )
}

/// Depth-first reconstruction: places each record in its id slot, re-keys
/// the distance triples, then recurses into the children.
fn collect_node<G>(
    record: NodeRecord<G>,
    parent: Option<SpeciesId>,
    slots: &mut Vec<Option<SpeciesNode<G>>>,
) -> Result<(), SnapshotError> {
    let NodeRecord(id, stats, enveloppe, triples, children) = record;

    let mut distances = DistanceCache::default();
    for (a, b, score) in triples {
        let slot = a.max(b);
        if slot >= enveloppe.len() {
            return Err(SnapshotError::DistanceSlot { species: id, slot });
        }
        distances.set(a, b, score);
    }

    if slots.len() <= id {
        slots.resize_with(id + 1, || None);
    }
    if slots[id].is_some() {
        return Err(SnapshotError::IdCollision(id));
    }
    slots[id] = Some(SpeciesNode {
        id,
        parent,
        children: children.iter().map(|c| c.0).collect(),
        enveloppe,
        distances,
        stats: stats.into(),
    });

    for child in children {
        collect_node(child, Some(id), slots)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::testing::LineGenome;
    use crate::species::HybridPolicy;

    fn populated_tree() -> SpeciesTree<LineGenome> {
        let config = TreeConfig {
            compatibility_threshold: 0.5,
            similarity_threshold: 1.0,
            enveloppe_capacity: 2,
            outperformance_threshold: 0.5,
            hybrid_policy: HybridPolicy::Ignore,
        };
        let mut tree = SpeciesTree::new(config);
        tree.classify(0, &LineGenome::orphan(1, 0.0)).unwrap();
        tree.classify(1, &LineGenome::orphan(2, 0.1)).unwrap();
        tree.advance_step(3, &[1, 2]).unwrap();
        tree.classify(-2, &LineGenome::orphan(3, -0.8)).unwrap();
        tree.classify(5, &LineGenome::orphan(4, 0.9)).unwrap();
        tree
    }

    fn assert_same_shape(a: &SpeciesTree<LineGenome>, b: &SpeciesTree<LineGenome>) {
        assert_eq!(a.step(), b.step());
        assert_eq!(a.species_count(), b.species_count());
        for id in 0..a.species_count() {
            let (na, nb) = (a.node(id).unwrap(), b.node(id).unwrap());
            assert_eq!(na.id(), nb.id());
            assert_eq!(na.parent(), nb.parent());
            assert_eq!(na.children(), nb.children());
            assert_eq!(na.enveloppe(), nb.enveloppe());
            assert_eq!(na.stats(), nb.stats());
            assert_eq!(na.distances(), nb.distances());
        }
    }

    #[test]
    fn test_json_round_trip_is_identity() {
        let tree = populated_tree();
        let json = tree.to_json().unwrap();
        let back = SpeciesTree::from_json(tree.config().clone(), &json).unwrap();
        assert_same_shape(&tree, &back);
    }

    #[test]
    fn test_wire_format_is_nested_arrays() {
        let tree = populated_tree();
        let value: serde_json::Value = serde_json::from_str(&tree.to_json().unwrap()).unwrap();

        // [step, root]
        let outer = value.as_array().unwrap();
        assert_eq!(outer.len(), 2);
        assert_eq!(outer[0], serde_json::json!(3));

        // root record: [id, stats, enveloppe, distances, children]
        let root = outer[1].as_array().unwrap();
        assert_eq!(root.len(), 5);
        assert_eq!(root[0], serde_json::json!(0));
        assert_eq!(root[1].as_array().unwrap().len(), 5);
        assert_eq!(root[2].as_array().unwrap().len(), 2);
        // one cached pair in the root: [[0, 1, 0.9]]
        assert_eq!(root[3], serde_json::json!([[0, 1, 0.9]]));
        assert_eq!(root[4].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_restored_tree_continues_id_sequence() {
        let tree = populated_tree();
        let count = tree.species_count();
        let json = tree.to_json().unwrap();

        let mut back: SpeciesTree<LineGenome> =
            SpeciesTree::from_json(tree.config().clone(), &json).unwrap();
        let fresh = back.classify(0, &LineGenome::orphan(50, 12.0)).unwrap();
        assert_eq!(fresh, count);
    }

    #[test]
    fn test_bad_root_id_is_rejected() {
        let json = r#"[0,[3,[0,0,0,0,0],[],[],[]]]"#;
        let err = SpeciesTree::<LineGenome>::from_json(TreeConfig::default(), json).unwrap_err();
        assert!(matches!(err, SnapshotError::BadRootId(3)));
    }

    #[test]
    fn test_id_collision_is_rejected() {
        let json = r#"[0,[0,[0,0,0,0,0],[],[],[
            [1,[0,0,0,0,0],[],[],[]],
            [1,[0,0,0,0,0],[],[],[]]
        ]]]"#;
        let err = SpeciesTree::<LineGenome>::from_json(TreeConfig::default(), json).unwrap_err();
        assert!(matches!(err, SnapshotError::IdCollision(1)));
    }

    #[test]
    fn test_sparse_ids_are_rejected() {
        let json = r#"[0,[0,[0,0,0,0,0],[],[],[
            [2,[0,0,0,0,0],[],[],[]]
        ]]]"#;
        let err = SpeciesTree::<LineGenome>::from_json(TreeConfig::default(), json).unwrap_err();
        assert!(matches!(err, SnapshotError::MissingId(1)));
    }

    #[test]
    fn test_dangling_distance_slot_is_rejected() {
        // One enveloppe member but a triple referencing slot 1.
        let json = format!(
            r#"[0,[0,[0,0,1,0,0],[{}],[[0,1,0.5]],[]]]"#,
            serde_json::to_string(&LineGenome::orphan(1, 0.0)).unwrap()
        );
        let err = SpeciesTree::<LineGenome>::from_json(TreeConfig::default(), &json).unwrap_err();
        assert!(matches!(err, SnapshotError::DistanceSlot { species: 0, slot: 1 }));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = SpeciesTree::<LineGenome>::from_json(TreeConfig::default(), "[1,").unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));
    }
}
