// random injection of fresh founders (migration) at the end of an update
use rand_pcg::Pcg32;

use crate::context::RunContext;
use crate::individual::Population;

/// source of freshly sampled genomes for founders and migrants
pub trait AncestorGenerator<G> {
    fn generate(&self, rng: &mut Pcg32) -> G;
}

/// append `round(random_insert_fraction * population_size)` migrants with the
/// sentinel generation. returns how many were inserted.
pub fn inject_random<G>(
    population: &mut Population<G>,
    generator: &impl AncestorGenerator<G>,
    ctx: &mut RunContext,
) -> usize {
    profiling::scope!("inject_random");
    let count = ctx.settings.random_insert_count();
    if count == 0 {
        return 0;
    }
    population.reserve(count);
    for _ in 0..count {
        let genome = generator.generate(&mut ctx.rng);
        let migrant = ctx.injected(genome);
        population.push(migrant);
    }
    tracing::debug!(update = ctx.update, count, "injected random founders");
    count
}
