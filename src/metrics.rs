// read-only statistics exported once per recorded update
use serde::Serialize;

use crate::context::RunContext;
use crate::fitness::Direction;
use crate::individual::{Genome, Individual};

/// per-update snapshot of the population and the adaptive parameter.
/// every mean over an empty population is 0.0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GenerationSnapshot {
    pub update: u64,
    pub mutation_p: f64,
    /// mean over individuals of acc_delta / count from the lineage archive (0 without offspring)
    pub mean_offspring_benefit: f64,
    pub mean_offspring_count: f64,
    pub mean_w_real: f64,
    pub max_w_real: f64,
    pub mean_w_eff: f64,
    pub population_size: usize,
    /// lineage records still reachable (after pruning)
    pub lineage_records: usize,
}

impl GenerationSnapshot {
    pub fn capture<G>(population: &[Individual<G>], ctx: &RunContext) -> Self {
        profiling::scope!("GenerationSnapshot::capture");
        let mut snap = Self {
            update: ctx.update,
            mutation_p: ctx.mutation_p,
            population_size: population.len(),
            lineage_records: ctx.lineage.len(),
            ..Self::default()
        };
        if population.is_empty() {
            return snap;
        }

        let n = population.len() as f64;
        let mut max_w_real = f64::NEG_INFINITY;
        for ind in population {
            let s = &ind.state;
            let offspring = ctx.lineage.offspring_stats(ind.id);
            snap.mean_offspring_benefit += offspring.mean_delta();
            snap.mean_offspring_count += offspring.count as f64;
            snap.mean_w_real += s.w_real_or_default();
            snap.mean_w_eff += s.w_eff_or_default();
            max_w_real = max_w_real.max(s.w_real_or_default());
        }
        snap.mean_offspring_benefit /= n;
        snap.mean_offspring_count /= n;
        snap.mean_w_real /= n;
        snap.mean_w_eff /= n;
        snap.max_w_real = max_w_real;
        snap
    }
}

/// lineage-free copy of a dominant individual
#[derive(Clone, Debug)]
pub struct DominantEntry<G> {
    pub update: u64,
    pub generation: Option<u32>,
    pub w_real: f64,
    pub genome: G,
}

/// emitted whenever the dominant archive grows
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DominantRecord {
    pub update: u64,
    /// -1 for migrants without tracked ancestry
    pub generation: i64,
    pub w_real: f64,
    /// genome symbols of the new dominant
    pub genome: String,
}

/// keeps every individual whose raw fitness strictly improved on the previous dominant
#[derive(Clone, Debug)]
pub struct DominantArchive<G> {
    direction: Direction,
    entries: Vec<DominantEntry<G>>,
}

impl<G: Genome> DominantArchive<G> {
    pub fn new(direction: Direction) -> Self {
        Self { direction, entries: Vec::new() }
    }

    /// fitness-evaluated hook. returns a record if `ind` became the new dominant.
    pub fn observe(&mut self, ind: &Individual<G>, update: u64) -> Option<DominantRecord> {
        let w_real = ind.state.w_real?;
        let improves = match self.entries.last() {
            Some(last) => self.direction.is_better(w_real, last.w_real),
            None => true,
        };
        if !improves {
            return None;
        }
        self.entries.push(DominantEntry {
            update,
            generation: ind.generation,
            w_real,
            genome: ind.genome.clone(),
        });
        Some(DominantRecord {
            update,
            generation: ind.generation_or_sentinel(),
            w_real,
            genome: ind.genome.symbols(),
        })
    }

    pub fn best(&self) -> Option<&DominantEntry<G>> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[DominantEntry<G>] {
        &self.entries
    }
}

/// one line of the exported statistics stream
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatsRecord {
    Generation(GenerationSnapshot),
    Dominant(DominantRecord),
}
