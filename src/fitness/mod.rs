// Fitness module organization
// delay holds the lineage-based transforms, landscape the raw evaluators used by the driver

pub mod delay;
pub mod landscape;

// Re-export commonly used types and functions
pub use delay::{effective_fitness, generation_delay, mean_delay, peak_delay};
pub use landscape::{AllOnes, Landscape, NkModel, Noisy};

use std::cmp::Ordering;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::context::RunContext;
use crate::individual::Individual;
use crate::settings::DelayPolicy;

/// comparison direction of a run, fixed when the fitness function is chosen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// the better of two fitness values
    #[inline]
    pub fn best(self, x: f64, y: f64) -> f64 {
        match self {
            Direction::Maximize => x.max(y),
            Direction::Minimize => x.min(y),
        }
    }

    /// strict improvement of `candidate` over `incumbent`
    #[inline]
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Maximize => candidate > incumbent,
            Direction::Minimize => candidate < incumbent,
        }
    }

    /// total ordering that sorts the best value first. NaN sorts last in
    /// either direction.
    #[inline]
    pub fn best_first(self, a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match self {
                Direction::Maximize => b.total_cmp(&a),
                Direction::Minimize => a.total_cmp(&b),
            },
        }
    }
}

/// optimization direction of an evaluator (maximizing unless stated otherwise)
pub trait Objective {
    fn direction(&self) -> Direction {
        Direction::Maximize
    }
}

/// raw evaluator wrapped by the delay transform.
/// deterministic functions simply ignore the rng.
pub trait FitnessFunction<G>: Objective + Send + Sync {
    fn evaluate(&self, genome: &G, rng: &mut Pcg32) -> f64;
}

/// lineage-delayed fitness: evaluates the wrapped function exactly once per call,
/// records the raw value, then derives effective fitness from the ancestors'
/// already-recorded raw values.
pub struct DelayedFitness<F> {
    policy: DelayPolicy,
    direction: Direction,
    inner: F,
}

impl<F> DelayedFitness<F> {
    pub fn new(policy: DelayPolicy, inner: F) -> Self
    where
        F: Objective,
    {
        let direction = inner.direction();
        Self { policy, direction, inner }
    }

    #[inline]
    pub fn policy(&self) -> DelayPolicy {
        self.policy
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// fitness-evaluation hook for a single individual; returns w_eff
    pub fn evaluate<G>(&self, ind: &mut Individual<G>, rng: &mut Pcg32, ctx: &mut RunContext) -> f64
    where
        F: FitnessFunction<G>,
    {
        profiling::scope!("DelayedFitness::evaluate");
        let w_real = self.inner.evaluate(&ind.genome, rng);
        self.apply(ind, w_real, ctx)
    }

    /// store `w_real` on the individual and in the lineage archive, then compute and store w_eff
    pub fn apply<G>(&self, ind: &mut Individual<G>, w_real: f64, ctx: &mut RunContext) -> f64 {
        profiling::scope!("DelayedFitness::apply");
        ind.state.w_real = Some(w_real);
        ctx.lineage.record_w_real(ind.id, w_real);

        let depth = ctx.settings.delay_generations;
        let w_eff = effective_fitness(
            self.policy,
            self.direction,
            w_real,
            ctx.lineage.walk(ind.id, depth),
            depth,
        );
        ind.state.w_eff = Some(w_eff);
        w_eff
    }

    /// evaluate every individual in `population`
    pub fn evaluate_population<G>(&self, population: &mut [Individual<G>], ctx: &mut RunContext)
    where
        F: FitnessFunction<G>,
        G: Sync,
    {
        self.evaluate_batch(population.iter_mut().collect(), ctx);
    }

    /// evaluate only individuals without a raw fitness yet; returns their positions
    pub fn evaluate_pending<G>(&self, population: &mut [Individual<G>], ctx: &mut RunContext) -> Vec<usize>
    where
        F: FitnessFunction<G>,
        G: Sync,
    {
        let positions: Vec<usize> = population
            .iter()
            .enumerate()
            .filter(|(_, ind)| !ind.state.is_evaluated())
            .map(|(i, _)| i)
            .collect();
        let batch: Vec<&mut Individual<G>> = population
            .iter_mut()
            .filter(|ind| !ind.state.is_evaluated())
            .collect();
        self.evaluate_batch(batch, ctx);
        positions
    }

    /// raw fitness in parallel (one seeded rng per individual, for reproducibility),
    /// then the delay transform sequentially so every ancestor value is final before use
    fn evaluate_batch<G>(&self, batch: Vec<&mut Individual<G>>, ctx: &mut RunContext)
    where
        F: FitnessFunction<G>,
        G: Sync,
    {
        profiling::scope!("DelayedFitness::evaluate_batch");
        if batch.is_empty() {
            return;
        }

        let seeds: Vec<u64> = (0..batch.len()).map(|_| ctx.rng.random::<u64>()).collect();
        let raw: Vec<f64> = batch
            .par_iter()
            .zip(seeds.par_iter())
            .map(|(ind, &seed)| {
                let mut rng = Pcg32::seed_from_u64(seed);
                self.inner.evaluate(&ind.genome, &mut rng)
            })
            .collect();

        for (ind, w_real) in batch.into_iter().zip(raw) {
            self.apply(ind, w_real, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RunSettings;

    /// genome is its own raw fitness
    struct Identity;

    impl Objective for Identity {}

    impl FitnessFunction<f64> for Identity {
        fn evaluate(&self, genome: &f64, _rng: &mut Pcg32) -> f64 {
            *genome
        }
    }

    /// counts evaluations so tests can check the inner function runs once per call
    struct Counting(std::sync::atomic::AtomicUsize);

    impl Objective for Counting {
        fn direction(&self) -> Direction {
            Direction::Minimize
        }
    }

    impl FitnessFunction<f64> for Counting {
        fn evaluate(&self, genome: &f64, _rng: &mut Pcg32) -> f64 {
            self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            *genome
        }
    }

    fn context(depth: u32) -> RunContext {
        RunContext::new(RunSettings { delay_generations: depth, ..RunSettings::default() })
    }

    /// grandparent (9) -> parent (2) -> individual (5), each evaluated in birth order
    fn evaluated_chain(fitness: &DelayedFitness<Identity>, ctx: &mut RunContext) -> Individual<f64> {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut grandparent = ctx.founder(9.0);
        fitness.evaluate(&mut grandparent, &mut rng, ctx);
        let mut parent = ctx.offspring(2.0, &[&grandparent]);
        fitness.evaluate(&mut parent, &mut rng, ctx);
        let mut ind = ctx.offspring(5.0, &[&parent]);
        fitness.evaluate(&mut ind, &mut rng, ctx);
        ind
    }

    #[test]
    fn test_direction_best() {
        assert_eq!(Direction::Maximize.best(1.0, 3.0), 3.0);
        assert_eq!(Direction::Minimize.best(1.0, 3.0), 1.0);
        assert!(Direction::Maximize.is_better(2.0, 1.0));
        assert!(!Direction::Minimize.is_better(2.0, 1.0));
        assert_eq!(Direction::Maximize.best_first(2.0, 1.0), Ordering::Less);
    }

    #[test]
    fn test_best_first_puts_nan_last() {
        for direction in [Direction::Maximize, Direction::Minimize] {
            assert_eq!(direction.best_first(f64::NAN, 1.0), Ordering::Greater);
            assert_eq!(direction.best_first(-1.0, f64::NAN), Ordering::Less);
            assert_eq!(direction.best_first(f64::NAN, f64::NAN), Ordering::Equal);
        }
        let mut values = vec![2.0, f64::NAN, 5.0, f64::NEG_INFINITY];
        values.sort_by(|a, b| Direction::Minimize.best_first(*a, *b));
        assert_eq!(&values[..3], &[f64::NEG_INFINITY, 2.0, 5.0]);
        assert!(values[3].is_nan());
    }

    #[test]
    fn test_peak_delay_on_chain() {
        let fitness = DelayedFitness::new(DelayPolicy::Peak, Identity);
        let mut ctx = context(2);
        let ind = evaluated_chain(&fitness, &mut ctx);
        assert_eq!(ind.state.w_real, Some(5.0));
        assert_eq!(ind.state.w_eff, Some(9.0));
        assert_eq!(ctx.lineage.get(ind.id).and_then(|r| r.w_real), Some(5.0));
    }

    #[test]
    fn test_mean_delay_on_chain() {
        let fitness = DelayedFitness::new(DelayPolicy::Mean, Identity);
        let mut ctx = context(2);
        let ind = evaluated_chain(&fitness, &mut ctx);
        let w_eff = ind.state.w_eff_or_default();
        assert!((w_eff - 16.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_generation_delay_on_chain() {
        let fitness = DelayedFitness::new(DelayPolicy::Generation, Identity);
        let mut ctx = context(2);
        let ind = evaluated_chain(&fitness, &mut ctx);
        assert_eq!(ind.state.w_eff, Some(9.0));
    }

    #[test]
    fn test_generation_delay_short_chain_falls_back_to_self() {
        // a chain shorter than the delay yields the individual's own value,
        // not the deepest ancestor available
        let fitness = DelayedFitness::new(DelayPolicy::Generation, Identity);
        let mut ctx = context(5);
        let ind = evaluated_chain(&fitness, &mut ctx);
        assert_eq!(ind.state.w_eff, Some(5.0));
    }

    #[test]
    fn test_founders_keep_raw_fitness() {
        for policy in [DelayPolicy::Mean, DelayPolicy::Generation, DelayPolicy::Peak] {
            let fitness = DelayedFitness::new(policy, Identity);
            let mut ctx = context(3);
            let mut rng = Pcg32::seed_from_u64(3);
            let mut founder = ctx.founder(4.5);
            let mut injected = ctx.injected(7.5);
            assert_eq!(fitness.evaluate(&mut founder, &mut rng, &mut ctx), 4.5);
            assert_eq!(fitness.evaluate(&mut injected, &mut rng, &mut ctx), 7.5);
        }
    }

    #[test]
    fn test_inner_evaluated_once_per_call() {
        let fitness = DelayedFitness::new(DelayPolicy::Peak, Counting(Default::default()));
        assert_eq!(fitness.direction(), Direction::Minimize);
        let mut ctx = context(4);
        let mut rng = Pcg32::seed_from_u64(5);
        let mut a = ctx.founder(3.0);
        fitness.evaluate(&mut a, &mut rng, &mut ctx);
        let mut b = ctx.offspring(8.0, &[&a]);
        let w_eff = fitness.evaluate(&mut b, &mut rng, &mut ctx);
        assert_eq!(fitness.inner().0.load(std::sync::atomic::Ordering::Relaxed), 2);
        // minimizing peak picks the lowest value on the window
        assert_eq!(w_eff, 3.0);
    }

    #[test]
    fn test_evaluate_pending_skips_evaluated() {
        let fitness = DelayedFitness::new(DelayPolicy::Mean, Identity);
        let mut ctx = context(2);
        let mut population: Vec<Individual<f64>> = (0..6).map(|i| ctx.founder(i as f64)).collect();
        population[2].state.w_real = Some(100.0);
        population[2].state.w_eff = Some(100.0);

        let evaluated = fitness.evaluate_pending(&mut population, &mut ctx);
        assert_eq!(evaluated, vec![0, 1, 3, 4, 5]);
        assert_eq!(population[2].state.w_real, Some(100.0));
        assert_eq!(population[4].state.w_eff, Some(4.0));
        assert!(population.iter().all(|ind| ind.state.is_evaluated()));
    }
}
