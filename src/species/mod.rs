//! Species tree core — classification, enveloppe maintenance, persistence
//!
//! A species = a node of the tree + a bounded enveloppe of representative
//! genomes + lifetime statistics. The tree classifies each incoming genome
//! into an existing species or forks a new one.

mod config;
mod error;
mod node;
mod observer;
mod snapshot;
mod tree;

pub use config::{HybridPolicy, TreeConfig};
pub use error::{ClassificationError, SnapshotError};
pub use node::{DistanceCache, SpeciesId, SpeciesNode, SpeciesStats};
pub use observer::{NoopObserver, SpeciesObserver};
pub use snapshot::TreeSnapshot;
pub use tree::{SpeciesTree, ROOT_SPECIES};
