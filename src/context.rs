// run-wide state threaded through every hook
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::individual::Individual;
use crate::lineage::LineageArchive;
use crate::settings::RunSettings;

/// everything a hook may read or write besides the population itself:
/// read-only settings, the adaptive mutation probability, the lineage archive
/// and the run's random source.
pub struct RunContext {
    pub settings: RunSettings,
    /// steady-state update index (a "generation" for the end-of-generation hooks)
    pub update: u64,
    /// per-site mutation probability, kept in [1/(2*representation_size), 0.5]
    pub mutation_p: f64,
    pub lineage: LineageArchive,
    pub rng: Pcg32,
}

impl RunContext {
    pub fn new(settings: RunSettings) -> Self {
        let rng = Pcg32::seed_from_u64(settings.rng_seed);
        let mutation_p = settings.initial_mutation_p;
        Self { settings, update: 0, mutation_p, lineage: LineageArchive::new(), rng }
    }

    /// initial population member: generation 0, no parent
    pub fn founder<G>(&mut self, genome: G) -> Individual<G> {
        let id = self.lineage.register(Some(0), None);
        Individual::new(id, Some(0), genome)
    }

    /// migrant without tracked ancestry (sentinel generation)
    pub fn injected<G>(&mut self, genome: G) -> Individual<G> {
        let id = self.lineage.register(None, None);
        Individual::new(id, None, genome)
    }

    /// child of `parents`. the first parent is the line-of-descent parent and the
    /// generation is one past the oldest parent generation (sentinel counts as 0).
    pub fn offspring<G>(&mut self, genome: G, parents: &[&Individual<G>]) -> Individual<G> {
        assert!(!parents.is_empty(), "offspring needs at least one parent");
        let generation = parents
            .iter()
            .map(|p| p.generation.unwrap_or(0))
            .max()
            .map_or(1, |g| g + 1);
        let id = self.lineage.register(Some(generation), Some(parents[0].id));
        Individual::new(id, Some(generation), genome)
    }
}
