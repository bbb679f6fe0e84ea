// Engine module organization
// mod.rs drives one steady-state update, hooks.rs holds the end-of-update hooks

mod hooks;

use crate::context::RunContext;
use crate::error::SettingsError;
use crate::dna::{Bitstring, Heritable, RandomBitstring};
use crate::fitness::{DelayedFitness, FitnessFunction, Landscape, Noisy};
use crate::individual::{Individual, Population};
use crate::inheritance::record_inheritance;
use crate::injection::AncestorGenerator;
use crate::metrics::{DominantArchive, DominantRecord, GenerationSnapshot};
use crate::mutation::MutationRateController;
use crate::selection::{DelayedElitism, ProportionateSelection, RandomSelection, SelectionStrategy};
use crate::settings::RunSettings;

/// what one update produced for the statistics stream
#[derive(Clone, Debug, Default)]
pub struct StepReport {
    pub update: u64,
    /// present every `recording_period` updates
    pub snapshot: Option<GenerationSnapshot>,
    /// new dominant individuals found during this update, in evaluation order
    pub dominant: Vec<DominantRecord>,
}

/// engine configuration used by the binary: bitstrings on a (possibly noisy) landscape
pub type BitstringEngine = Engine<Bitstring, Noisy<Landscape>, RandomBitstring>;

pub struct Engine<G, F, A> {
    pub(self) ctx: RunContext,
    pub(self) population: Population<G>,
    pub(self) fitness: DelayedFitness<F>,
    pub(self) survivors: DelayedElitism<RandomSelection>,
    pub(self) controller: MutationRateController,
    pub(self) generator: A,
    pub(self) dominant: DominantArchive<G>,
}

impl BitstringEngine {
    /// validates first, the NK tables assume `nk_k < representation_size`
    pub fn from_settings(settings: RunSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let landscape = Noisy::new(Landscape::from_settings(&settings), settings.fitness_noise);
        let generator = RandomBitstring { len: settings.representation_size };
        Engine::new(settings, landscape, generator)
    }
}

impl<G, F, A> Engine<G, F, A>
where
    G: Heritable,
    F: FitnessFunction<G>,
    A: AncestorGenerator<G>,
{
    /// seed `population_size` founders from `generator`. nothing is evaluated
    /// until the first step. settings that fail `validate` are rejected here.
    pub fn new(settings: RunSettings, inner: F, generator: A) -> Result<Self, SettingsError> {
        profiling::scope!("Engine::new");
        settings.validate()?;
        let fitness = DelayedFitness::new(settings.delay_policy, inner);
        let direction = fitness.direction();
        let controller = settings.to_mutation_controller();
        let population_size = settings.population_size;

        let mut ctx = RunContext::new(settings);
        let population = (0..population_size)
            .map(|_| {
                let genome = generator.generate(&mut ctx.rng);
                ctx.founder(genome)
            })
            .collect();

        Ok(Self {
            ctx,
            population,
            fitness,
            survivors: DelayedElitism::new(RandomSelection, direction),
            controller,
            generator,
            dominant: DominantArchive::new(direction),
        })
    }

    pub fn population(&self) -> &[Individual<G>] {
        &self.population
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn dominant(&self) -> &DominantArchive<G> {
        &self.dominant
    }

    pub fn fitness(&self) -> &DelayedFitness<F> {
        &self.fitness
    }

    /// one steady-state update: evaluate, reproduce, select survivors, run the
    /// end-of-update hooks, then snapshot
    pub fn step(&mut self) -> StepReport {
        profiling::scope!("Engine::step");
        let update = self.ctx.update;
        let mut dominant = Vec::new();

        // evaluation phase (only founders and migrants are unevaluated here)
        let fresh = self.fitness.evaluate_pending(&mut self.population, &mut self.ctx);
        self.observe_dominant(&fresh, &mut dominant);

        // reproduction phase
        let offspring = self.reproduce(&mut dominant);

        // survivor selection back down to population_size
        self.population.extend(offspring);
        let src = std::mem::take(&mut self.population);
        let mut dst = Vec::with_capacity(self.ctx.settings.population_size);
        self.survivors.select(&src, &mut dst, self.ctx.settings.population_size, &mut self.ctx);
        self.population = dst;

        self.end_of_update(&mut dominant);

        let snapshot = (update % self.ctx.settings.recording_period == 0)
            .then(|| GenerationSnapshot::capture(&self.population, &self.ctx));
        self.ctx.update += 1;

        StepReport { update, snapshot, dominant }
    }

    /// produce `offspring_per_update` children from roulette-selected parent pairs,
    /// evaluate them as one batch, then fire the reproduction hook for each
    fn reproduce(&mut self, dominant: &mut Vec<DominantRecord>) -> Population<G> {
        profiling::scope!("Engine::reproduce");
        let lambda = self.ctx.settings.offspring_per_update;
        let mut parents = Vec::with_capacity(lambda);
        let mut offspring = Vec::with_capacity(lambda);

        for _ in 0..lambda {
            let i = ProportionateSelection::pick_index(&self.population, &mut self.ctx.rng);
            let j = ProportionateSelection::pick_index(&self.population, &mut self.ctx.rng);
            let (a, b) = (&self.population[i], &self.population[j]);

            let mut genome = a.genome.recombine(&b.genome, &mut self.ctx.rng);
            genome.mutate(self.ctx.mutation_p, &mut self.ctx.rng);
            offspring.push(self.ctx.offspring(genome, &[a, b]));
            parents.push([i, j]);
        }

        // parents are all evaluated and immutable here, so children may be
        // scored together without racing their ancestors
        self.fitness.evaluate_population(&mut offspring, &mut self.ctx);

        for (child, &[i, j]) in offspring.iter().zip(&parents) {
            record_inheritance([&self.population[i], &self.population[j]], child, &mut self.ctx);
            if let Some(record) = self.dominant.observe(child, self.ctx.update) {
                dominant.push(record);
            }
        }
        offspring
    }

    fn observe_dominant(&mut self, positions: &[usize], out: &mut Vec<DominantRecord>) {
        for &i in positions {
            if let Some(record) = self.dominant.observe(&self.population[i], self.ctx.update) {
                out.push(record);
            }
        }
    }

    /// run `run_updates` updates, handing each report to `on_report`.
    /// stops at the first error the callback returns.
    pub fn run<E>(&mut self, mut on_report: impl FnMut(&StepReport) -> Result<(), E>) -> Result<(), E> {
        let updates = self.ctx.settings.run_updates;
        tracing::info!(
            updates,
            population = self.ctx.settings.population_size,
            policy = ?self.fitness.policy(),
            delay_generations = self.ctx.settings.delay_generations,
            elitism = self.ctx.settings.elitism_n,
            "starting run"
        );
        for _ in 0..updates {
            let report = self.step();
            on_report(&report)?;
        }
        tracing::info!(
            updates = self.ctx.update,
            best_w_real = self.dominant.best().map(|e| e.w_real),
            mutation_p = self.ctx.mutation_p,
            "run finished"
        );
        Ok(())
    }
}
