//! phylogeny-core — incremental speciation tracking
//!
//! Classifies a stream of evolving genomes into a growing tree of species.
//! Each species keeps a bounded "enveloppe" of representative genomes used
//! to test newcomers for compatibility; the tree records when species
//! appeared, how long they persisted and how large they grew.

pub mod genome;
pub mod species;
pub mod storage;

pub use genome::{Genome, GenomeId, ParentRole};
pub use species::{
    ClassificationError, HybridPolicy, NoopObserver, SnapshotError, SpeciesId, SpeciesNode,
    SpeciesObserver, SpeciesStats, SpeciesTree, TreeConfig, TreeSnapshot, ROOT_SPECIES,
};
pub use storage::{SnapshotMeta, StoreError, TreeArchive};
