//! Genome contract — what the tree needs to know about an evolving entity
//!
//! The tree never looks inside a genome. It relies on a stable identity, an
//! optional mother/father lineage, and two functions the genome itself
//! supplies: a symmetric distance and a one-sided acceptance score.

use serde::{Deserialize, Serialize};

/// Stable external identity of a genome, assigned by the evolutionary process.
pub type GenomeId = u64;

/// Role of a recorded parent in a genome's lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentRole {
    Mother,
    Father,
}

/// An evolving entity that can be classified into species.
///
/// `distance` must be symmetric; `acceptance` maps a distance to this
/// genome's willingness to mate at that distance (higher is more willing).
pub trait Genome {
    /// Stable identity of this genome.
    fn id(&self) -> GenomeId;

    /// Recorded parent for the given role, if lineage is tracked.
    fn parent(&self, role: ParentRole) -> Option<GenomeId>;

    /// Symmetric distance to another genome.
    fn distance(&self, other: &Self) -> f64;

    /// One-sided acceptance score for a mate at the given distance.
    fn acceptance(&self, distance: f64) -> f64;

    /// Symmetric compatibility with another genome: the less accepting
    /// side of the pair decides.
    fn compatibility(&self, other: &Self) -> f64 {
        let d = self.distance(other);
        self.acceptance(d).min(other.acceptance(d))
    }

    /// Whether this genome carries a full recorded lineage.
    fn has_lineage(&self) -> bool {
        self.parent(ParentRole::Mother).is_some() && self.parent(ParentRole::Father).is_some()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// One-dimensional test genome: distance is the difference between
    /// trait values and acceptance decays linearly with distance, so
    /// `compatibility(a, b) == 1 - |a.value - b.value|`.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct LineGenome {
        pub id: GenomeId,
        pub value: f64,
        pub mother: Option<GenomeId>,
        pub father: Option<GenomeId>,
    }

    impl LineGenome {
        pub fn orphan(id: GenomeId, value: f64) -> Self {
            Self { id, value, mother: None, father: None }
        }

        pub fn child(id: GenomeId, value: f64, mother: GenomeId, father: GenomeId) -> Self {
            Self { id, value, mother: Some(mother), father: Some(father) }
        }
    }

    impl Genome for LineGenome {
        fn id(&self) -> GenomeId {
            self.id
        }

        fn parent(&self, role: ParentRole) -> Option<GenomeId> {
            match role {
                ParentRole::Mother => self.mother,
                ParentRole::Father => self.father,
            }
        }

        fn distance(&self, other: &Self) -> f64 {
            (self.value - other.value).abs()
        }

        fn acceptance(&self, distance: f64) -> f64 {
            1.0 - distance
        }
    }
}
