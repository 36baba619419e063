//! Observer hooks — synchronous notifications of structural events
//!
//! The observer is handed explicitly to each mutating call rather than
//! stored inside the tree; hooks fire in the same call stack, before the
//! mutating operation returns.

use crate::genome::GenomeId;

use super::node::SpeciesId;

/// Sink for speciation and enveloppe-churn events. All hooks default to
/// no-ops, so an observer implements only what it cares about.
pub trait SpeciesObserver {
    /// A speciation event created the given species.
    fn on_new_species(&mut self, species: SpeciesId) {
        let _ = species;
    }

    /// A genome became a representative of the given species.
    fn on_genome_enters_enveloppe(&mut self, species: SpeciesId, genome: GenomeId) {
        let _ = (species, genome);
    }

    /// A genome was ejected from the given species' enveloppe.
    fn on_genome_leaves_enveloppe(&mut self, species: SpeciesId, genome: GenomeId) {
        let _ = (species, genome);
    }
}

/// Observer that ignores every event; used when none is registered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SpeciesObserver for NoopObserver {}
