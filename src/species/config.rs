//! Tree configuration — the thresholds driving the phylogenic process
//!
//! One value object, constructed up front and handed to the tree; every
//! threshold read in the algorithm is a plain field access.

use serde::{Deserialize, Serialize};

/// What to do with a hybrid, i.e. a genome whose recorded parents belong to
/// two different species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HybridPolicy {
    /// Count the hybrid and classify it into its mother's species.
    Ignore,
    /// Refuse to classify the genome; the caller decides how to proceed.
    Reject,
}

/// Thresholds governing classification and enveloppe maintenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Minimum symmetric acceptance score for an enveloppe member to count
    /// as a viable mate of the candidate genome
    pub compatibility_threshold: f64,
    /// Fraction of the enveloppe that must be matable for the candidate to
    /// belong to the species
    pub similarity_threshold: f64,
    /// Maximum number of representative genomes kept per species (at least 1)
    pub enveloppe_capacity: usize,
    /// Fraction of votes required to eject an enveloppe member in favour of
    /// a more novel candidate
    pub outperformance_threshold: f64,
    /// How hybrid lineages are handled
    pub hybrid_policy: HybridPolicy,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            compatibility_threshold: 0.5,
            similarity_threshold: 0.8,
            enveloppe_capacity: 10,
            outperformance_threshold: 0.5,
            hybrid_policy: HybridPolicy::Ignore,
        }
    }
}

impl TreeConfig {
    /// High bar for membership: species split readily and the enveloppe is
    /// slow to churn.
    pub fn strict() -> Self {
        Self {
            compatibility_threshold: 0.75,
            similarity_threshold: 1.0,
            enveloppe_capacity: 25,
            outperformance_threshold: 0.75,
            hybrid_policy: HybridPolicy::Reject,
        }
    }

    /// Low bar for membership: few, broad species.
    pub fn permissive() -> Self {
        Self {
            compatibility_threshold: 0.25,
            similarity_threshold: 0.5,
            enveloppe_capacity: 10,
            outperformance_threshold: 0.25,
            hybrid_policy: HybridPolicy::Ignore,
        }
    }
}
