//! Typed failures of the phylogenic core
//!
//! Precondition violations the original process treated as fatal are
//! recoverable here: the caller can skip the genome, log it, or abort.

use crate::genome::GenomeId;

use super::node::SpeciesId;

/// A genome could not be classified, or an alive-report referenced an
/// unknown genome.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    /// A recorded parent was never classified in this timeline.
    #[error("parent genome {parent} of genome {genome} was never classified")]
    UnknownParent { genome: GenomeId, parent: GenomeId },

    /// The genome's parents belong to different species and the configured
    /// policy forbids merging lineages.
    #[error(
        "genome {genome} is a hybrid: mother in species {mother_species}, \
         father in species {father_species}"
    )]
    HybridForbidden {
        genome: GenomeId,
        mother_species: SpeciesId,
        father_species: SpeciesId,
    },

    /// A genome was reported alive without having been classified first.
    #[error("genome {0} reported alive but never classified")]
    UnknownGenome(GenomeId),
}

/// A persisted snapshot is structurally corrupt; the whole load fails.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("duplicate species id in snapshot: {0}")]
    IdCollision(SpeciesId),

    #[error("species ids are not dense: no node with id {0}")]
    MissingId(SpeciesId),

    #[error("root species has id {0}, expected 0")]
    BadRootId(SpeciesId),

    #[error("species {species}: distance entry references unoccupied slot {slot}")]
    DistanceSlot { species: SpeciesId, slot: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
