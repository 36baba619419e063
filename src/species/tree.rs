//! The phylogenic tree — incremental classification of a genome stream
//!
//! The owning evolutionary process calls [`SpeciesTree::classify`] once per
//! new genome and [`SpeciesTree::advance_step`] once per generation. The
//! tree routes each genome through its parents' species, tests it against
//! enveloppes top-down, and forks a new species when nothing accepts it.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fmt::Write as _;

use log::{debug, info};

use crate::genome::{Genome, GenomeId, ParentRole};

use super::config::{HybridPolicy, TreeConfig};
use super::error::ClassificationError;
use super::node::{SpeciesId, SpeciesNode};
use super::observer::{NoopObserver, SpeciesObserver};

/// Id of the synthetic root species, created at tree construction.
pub const ROOT_SPECIES: SpeciesId = 0;

/// The growing tree of species.
///
/// Nodes live in an arena indexed by [`SpeciesId`]; they are created by
/// speciation events and never destroyed. The genome index is append-only:
/// a genome stays mapped to its species even after it dies.
#[derive(Debug)]
pub struct SpeciesTree<G> {
    config: TreeConfig,
    pub(crate) nodes: Vec<SpeciesNode<G>>,
    genome_to_species: HashMap<GenomeId, SpeciesId>,
    hybrids: u64,
    step: u64,
}

impl<G: Genome + Clone> SpeciesTree<G> {
    /// Creates a tree holding only the root species (id 0, empty
    /// enveloppe, zeroed stats) at step 0.
    pub fn new(config: TreeConfig) -> Self {
        let mut tree = Self {
            config,
            nodes: Vec::new(),
            genome_to_species: HashMap::new(),
            hybrids: 0,
            step: 0,
        };
        tree.make_node(None);
        tree
    }

    pub(crate) fn from_parts(config: TreeConfig, nodes: Vec<SpeciesNode<G>>, step: u64) -> Self {
        Self { config, nodes, genome_to_species: HashMap::new(), hybrids: 0, step }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Current step, as last reported through [`SpeciesTree::advance_step`].
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Number of hybrid genomes seen so far (under [`HybridPolicy::Ignore`]).
    pub fn hybrids(&self) -> u64 {
        self.hybrids
    }

    /// Total number of species, root included.
    pub fn species_count(&self) -> usize {
        self.nodes.len()
    }

    /// Species node by id, if it exists.
    pub fn node(&self, species: SpeciesId) -> Option<&SpeciesNode<G>> {
        self.nodes.get(species)
    }

    /// The root species node.
    pub fn root(&self) -> &SpeciesNode<G> {
        &self.nodes[ROOT_SPECIES]
    }

    /// Species the given genome was last classified into.
    pub fn species_of(&self, genome: GenomeId) -> Option<SpeciesId> {
        self.genome_to_species.get(&genome).copied()
    }

    /// Refreshes `last_appearance` of every species with an alive member,
    /// then records `step` as the tree's current step.
    ///
    /// Every reported genome must have been classified earlier in the same
    /// timeline; an unknown id fails the whole call without mutating.
    pub fn advance_step(&mut self, step: u64, alive: &[GenomeId]) -> Result<(), ClassificationError> {
        let mut alive_species = BTreeSet::new();
        for &genome in alive {
            let species = self
                .genome_to_species
                .get(&genome)
                .copied()
                .ok_or(ClassificationError::UnknownGenome(genome))?;
            alive_species.insert(species);
        }

        for species in alive_species {
            self.nodes[species].stats.last_appearance = step;
        }
        self.step = step;
        Ok(())
    }

    /// Records the death of a genome at `step` by refreshing its species'
    /// `last_appearance`. Unknown genomes are ignored; the genome index
    /// keeps the entry (append-only).
    pub fn mark_dead(&mut self, step: u64, genome: GenomeId) {
        if let Some(&species) = self.genome_to_species.get(&genome) {
            debug!("species {species} last seen at step {step} (genome {genome} died)");
            self.nodes[species].stats.last_appearance = step;
        }
    }

    /// Classifies a genome without an observer.
    ///
    /// `x` is the genome's external position, used only to widen the
    /// accepting species' `xmin`/`xmax` layout hints.
    pub fn classify(&mut self, x: i64, genome: &G) -> Result<SpeciesId, ClassificationError> {
        self.classify_observed(x, genome, &mut NoopObserver)
    }

    /// Classifies a genome, notifying `observer` of speciation and
    /// enveloppe churn before returning.
    ///
    /// Genomes with fewer than two recorded parents go straight to the
    /// root. Otherwise both parents must already be classified; the genome
    /// enters the classification at its parents' species (the mother's,
    /// for a hybrid under [`HybridPolicy::Ignore`]).
    pub fn classify_observed(
        &mut self,
        x: i64,
        genome: &G,
        observer: &mut dyn SpeciesObserver,
    ) -> Result<SpeciesId, ClassificationError> {
        let parents = (genome.parent(ParentRole::Mother), genome.parent(ParentRole::Father));
        let (Some(mother), Some(father)) = parents else {
            // First-generation genomes, or untracked lineage, go to the root.
            return Ok(self.place(x, genome, ROOT_SPECIES, observer));
        };

        let mother_species = self.parent_species(genome.id(), mother)?;
        let father_species = self.parent_species(genome.id(), father)?;

        if mother_species == father_species {
            return Ok(self.place(x, genome, mother_species, observer));
        }

        match self.config.hybrid_policy {
            HybridPolicy::Ignore => {
                debug!("linking hybrid genome {} to mother species {mother_species}", genome.id());
                self.hybrids += 1;
                Ok(self.place(x, genome, mother_species, observer))
            }
            HybridPolicy::Reject => Err(ClassificationError::HybridForbidden {
                genome: genome.id(),
                mother_species,
                father_species,
            }),
        }
    }

    /// Plain-text digraph description for the external viewer: one
    /// declaration line per species, one edge line per parent→child link,
    /// depth-first.
    pub fn export_graph(&self) -> String {
        let mut out = String::from("digraph {\n");
        self.write_edges(ROOT_SPECIES, &mut out);
        out.push_str("}\n");
        out
    }

    fn write_edges(&self, species: SpeciesId, out: &mut String) {
        let _ = writeln!(out, "\t{species};");
        for &child in &self.nodes[species].children {
            let _ = writeln!(out, "\t{species} -> {child};");
            self.write_edges(child, out);
        }
    }

    fn parent_species(&self, genome: GenomeId, parent: GenomeId) -> Result<SpeciesId, ClassificationError> {
        self.genome_to_species
            .get(&parent)
            .copied()
            .ok_or(ClassificationError::UnknownParent { genome, parent })
    }

    fn make_node(&mut self, parent: Option<SpeciesId>) -> SpeciesId {
        let id = self.nodes.len();
        self.nodes.push(SpeciesNode::new(id, parent));
        id
    }

    /// Runs the self-test / child-search / speciation cascade starting at
    /// `entry`, and indexes the genome to whichever species accepted it.
    fn place(
        &mut self,
        x: i64,
        genome: &G,
        entry: SpeciesId,
        observer: &mut dyn SpeciesObserver,
    ) -> SpeciesId {
        debug!("adding genome {} under species {entry}", genome.id());

        if let Some(scores) = self.matching_scores(entry, genome) {
            self.insert_into(entry, x, genome, &scores, observer);
            self.genome_to_species.insert(genome.id(), entry);
            return entry;
        }
        debug!("genome {} incompatible with species {entry}", genome.id());

        // First child to accept wins; later siblings are never consulted.
        for i in 0..self.nodes[entry].children.len() {
            let child = self.nodes[entry].children[i];
            if let Some(scores) = self.matching_scores(child, genome) {
                self.insert_into(child, x, genome, &scores, observer);
                self.genome_to_species.insert(genome.id(), child);
                return child;
            }
        }

        // Nothing accepted the genome: fork a new species under the entry node.
        let species = self.make_node(Some(entry));
        self.nodes[species].stats.first_appearance = self.step;
        self.nodes[entry].children.push(species);
        self.insert_into(species, x, genome, &[], observer);
        observer.on_new_species(species);
        self.genome_to_species.insert(genome.id(), species);
        info!("speciation: {species} forked from {entry} at step {}", self.step);
        species
    }

    /// Tests the genome against a species' enveloppe. Returns the per-slot
    /// compatibility scores when enough members accept it, `None` otherwise.
    /// An empty enveloppe accepts everything.
    fn matching_scores(&self, species: SpeciesId, genome: &G) -> Option<Vec<f64>> {
        let node = &self.nodes[species];
        let mut scores = Vec::with_capacity(node.enveloppe.len());
        let mut matable = 0usize;
        for member in &node.enveloppe {
            let score = genome.compatibility(member);
            if score >= self.config.compatibility_threshold {
                matable += 1;
            }
            scores.push(score);
        }
        let required = self.config.similarity_threshold * node.enveloppe.len() as f64;
        (matable as f64 >= required).then_some(scores)
    }

    /// Admits an accepted genome into a species: updates stats and either
    /// grows the enveloppe or holds a replacement vote against the slot the
    /// genome resembles most. `scores` are the compatibilities computed by
    /// the acceptance test, one per occupied slot.
    fn insert_into(
        &mut self,
        species: SpeciesId,
        x: i64,
        genome: &G,
        scores: &[f64],
        observer: &mut dyn SpeciesObserver,
    ) {
        // a zero capacity would make every species reject its own members
        let capacity = self.config.enveloppe_capacity.max(1);
        let node = &mut self.nodes[species];
        let k = node.enveloppe.len();

        if k < capacity {
            debug!("appending genome {} to enveloppe of species {species}", genome.id());
            node.enveloppe.push(genome.clone());
            observer.on_genome_enters_enveloppe(species, genome.id());
            for (i, &score) in scores.iter().enumerate() {
                node.distances.set(i, k, score);
            }
        } else {
            // The slot whose occupant the newcomer resembles most is the
            // only one eligible for ejection.
            let mut ejectable = 0;
            for i in 1..k {
                if scores[ejectable] < scores[i] {
                    ejectable = i;
                }
            }

            // Every other member votes: is the newcomer stranger to me than
            // the current occupant of the ejectable slot?
            let mut votes = 0usize;
            for i in (0..k).filter(|&i| i != ejectable) {
                let cached = node.distances.get(i, ejectable).unwrap_or(0.0);
                if scores[i] < cached {
                    votes += 1;
                }
            }

            if (votes as f64) < self.config.outperformance_threshold * (k - 1) as f64 {
                debug!(
                    "genome {} deemed unremarkable with {votes} votes of {}",
                    genome.id(),
                    k - 1
                );
            } else {
                debug!(
                    "genome {} replaces slot {ejectable} of species {species} ({votes} votes of {})",
                    genome.id(),
                    k - 1
                );
                observer.on_genome_leaves_enveloppe(species, node.enveloppe[ejectable].id());
                observer.on_genome_enters_enveloppe(species, genome.id());
                node.enveloppe[ejectable] = genome.clone();
                for i in (0..k).filter(|&i| i != ejectable) {
                    node.distances.set(i, ejectable, scores[i]);
                }
            }
        }

        node.stats.record(self.step, x);
    }

    fn dump(&self, species: SpeciesId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.nodes[species];

        let mut spacing = String::from("> ");
        let mut ancestor = node.parent;
        while let Some(id) = ancestor {
            spacing.push_str("  ");
            ancestor = self.nodes[id].parent;
        }

        write!(f, "{spacing}[{}] ( ", node.id)?;
        for member in &node.enveloppe {
            write!(f, "{} ", member.id())?;
        }
        writeln!(f, ")")?;

        for &child in &node.children {
            self.dump(child, f)?;
        }
        Ok(())
    }
}

/// Human-readable dump: hybrid count, then the hierarchy with each
/// species' enveloppe membership, indented by depth.
impl<G: Genome + Clone> fmt::Display for SpeciesTree<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Hybrids;", self.hybrids)?;
        self.dump(ROOT_SPECIES, f)
    }
}
