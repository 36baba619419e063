use criterion::{criterion_group, criterion_main, Criterion};
use phylogeny_core::{Genome, GenomeId, ParentRole, SpeciesTree, TreeConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

#[derive(Clone, Serialize)]
struct PointGenome {
    id: GenomeId,
    value: f64,
}

impl Genome for PointGenome {
    fn id(&self) -> GenomeId {
        self.id
    }

    fn parent(&self, _role: ParentRole) -> Option<GenomeId> {
        None
    }

    fn distance(&self, other: &Self) -> f64 {
        (self.value - other.value).abs()
    }

    fn acceptance(&self, distance: f64) -> f64 {
        1.0 - distance
    }
}

fn bench_classify(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let genomes: Vec<PointGenome> = (0..1000u64)
        .map(|id| PointGenome { id, value: rng.gen_range(-5.0..5.0) })
        .collect();

    c.bench_function("classify_1000_orphans", |b| {
        b.iter(|| {
            let mut tree = SpeciesTree::new(TreeConfig::default());
            for (x, genome) in genomes.iter().enumerate() {
                tree.classify(x as i64, genome).unwrap();
            }
            tree.species_count()
        })
    });

    let mut tree = SpeciesTree::new(TreeConfig::default());
    for (x, genome) in genomes.iter().enumerate() {
        tree.classify(x as i64, genome).unwrap();
    }

    c.bench_function("export_graph_1000", |b| b.iter(|| tree.export_graph()));

    c.bench_function("snapshot_encode_1000", |b| b.iter(|| tree.to_json().unwrap()));
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
