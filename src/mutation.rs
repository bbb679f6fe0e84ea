// adaptive per-site mutation probability, driven by genotypic diversity
use std::collections::BTreeMap;

use crate::context::RunContext;
use crate::individual::{Genome, Individual};

/// upper clamp: at most half the sites mutate on average
pub const MUTATION_CEILING: f64 = 0.5;

/// normalized Shannon entropy of the distinct-genome distribution, in [0, 1].
/// 0 for an empty population, a single individual or identical genomes;
/// 1 when every genome is distinct.
pub fn genotypic_entropy<G: Genome>(population: &[Individual<G>]) -> f64 {
    profiling::scope!("genotypic_entropy");
    let n = population.len();
    if n <= 1 {
        return 0.0;
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for ind in population {
        *counts.entry(ind.genome.symbols()).or_default() += 1;
    }

    let total = n as f64;
    let entropy: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum();
    (entropy / total.log2()).clamp(0.0, 1.0)
}

/// closed-loop controller: tighten when diversity is high, loosen otherwise,
/// always clamped to [1/(2*representation_size), 0.5]
#[derive(Clone, Debug, PartialEq)]
pub struct MutationRateController {
    pub entropy_threshold: f64,
    pub tighten: f64,
    pub loosen: f64,
    pub representation_size: usize,
}

impl Default for MutationRateController {
    fn default() -> Self {
        Self { entropy_threshold: 0.8, tighten: 0.99, loosen: 1.01, representation_size: 32 }
    }
}

impl MutationRateController {
    /// about half a mutation per genome on average
    pub fn floor(&self) -> f64 {
        assert!(self.representation_size > 0, "representation size must be positive");
        1.0 / (2.0 * self.representation_size as f64)
    }

    #[inline]
    pub fn ceiling(&self) -> f64 {
        MUTATION_CEILING
    }

    /// one control step from `current` given the measured diversity
    pub fn next_rate(&self, current: f64, diversity: f64) -> f64 {
        let scaled = if diversity > self.entropy_threshold {
            current * self.tighten
        } else {
            current * self.loosen
        };
        scaled.clamp(self.floor(), self.ceiling())
    }

    /// end-of-generation hook: measure the population and write the new rate to `ctx`
    pub fn adapt<G: Genome>(&self, population: &[Individual<G>], ctx: &mut RunContext) -> f64 {
        profiling::scope!("MutationRateController::adapt");
        let diversity = genotypic_entropy(population);
        let rate = self.next_rate(ctx.mutation_p, diversity);
        assert!(
            rate >= self.floor() && rate <= self.ceiling(),
            "mutation probability {rate} escaped [{}, {}]",
            self.floor(),
            self.ceiling()
        );
        tracing::debug!(
            update = ctx.update,
            diversity,
            from = ctx.mutation_p,
            to = rate,
            "adapted mutation probability"
        );
        ctx.mutation_p = rate;
        rate
    }
}
