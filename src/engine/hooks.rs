use crate::dna::Heritable;
use crate::fitness::FitnessFunction;
use crate::injection::{inject_random, AncestorGenerator};
use crate::metrics::DominantRecord;

use super::Engine;

impl<G, F, A> Engine<G, F, A>
where
    G: Heritable,
    F: FitnessFunction<G>,
    A: AncestorGenerator<G>,
{
    /// end-of-update hooks, in order: adapt the mutation probability on the fully
    /// evaluated survivors, inject migrants (scored immediately so snapshots see
    /// them), then forget lineage no living individual can reach.
    pub(super) fn end_of_update(&mut self, dominant: &mut Vec<DominantRecord>) {
        profiling::scope!("Engine::end_of_update");

        if self.ctx.settings.adaptive_mutation {
            self.controller.adapt(&self.population, &mut self.ctx);
        }

        if inject_random(&mut self.population, &self.generator, &mut self.ctx) > 0 {
            let fresh = self.fitness.evaluate_pending(&mut self.population, &mut self.ctx);
            self.observe_dominant(&fresh, dominant);
        }

        if self.ctx.settings.prune_lineage {
            let depth = self.ctx.settings.delay_generations;
            let living = self.population.iter().map(|ind| ind.id);
            let removed = self.ctx.lineage.prune(living, depth);
            if removed > 0 {
                tracing::trace!(update = self.ctx.update, removed, "pruned lineage records");
            }
        }
    }
}
