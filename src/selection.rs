// selection strategies and the elitist wrapper that composes with any of them
use std::cmp::Ordering;

use rand::Rng;
use rand_pcg::Pcg32;

use crate::context::RunContext;
use crate::fitness::Direction;
use crate::individual::{Individual, Population};

/// base selection contract: append `n` individuals chosen from `src` to `dst`
pub trait SelectionStrategy<G> {
    fn select(&mut self, src: &[Individual<G>], dst: &mut Population<G>, n: usize, ctx: &mut RunContext);
}

/// uniform selection with replacement
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSelection;

impl<G: Clone> SelectionStrategy<G> for RandomSelection {
    fn select(&mut self, src: &[Individual<G>], dst: &mut Population<G>, n: usize, ctx: &mut RunContext) {
        profiling::scope!("RandomSelection::select");
        if n == 0 {
            return;
        }
        assert!(!src.is_empty(), "cannot select {n} individuals from an empty population");
        dst.reserve(n);
        for _ in 0..n {
            let i = ctx.rng.random_range(0..src.len());
            dst.push(src[i].clone());
        }
    }
}

/// roulette-wheel selection on effective fitness (maximizing). negative values
/// shift the whole wheel so the worst individual sits at zero; an all-zero wheel
/// degrades to uniform.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProportionateSelection;

impl ProportionateSelection {
    /// position of one roulette draw from `src`
    pub fn pick_index<G>(src: &[Individual<G>], rng: &mut Pcg32) -> usize {
        assert!(!src.is_empty(), "cannot pick from an empty population");
        let min = src
            .iter()
            .map(|ind| ind.state.w_eff_or_default())
            .fold(f64::INFINITY, f64::min);
        let shift = if min < 0.0 { -min } else { 0.0 };
        let weight = |ind: &Individual<G>| ind.state.w_eff_or_default() + shift;

        let total: f64 = src.iter().map(&weight).sum();
        if !(total > 0.0) || !total.is_finite() {
            return rng.random_range(0..src.len());
        }

        let target = rng.random::<f64>() * total;
        let mut running = 0.0;
        for (i, ind) in src.iter().enumerate() {
            running += weight(ind);
            if running > target {
                return i;
            }
        }
        src.len() - 1
    }
}

impl<G: Clone> SelectionStrategy<G> for ProportionateSelection {
    fn select(&mut self, src: &[Individual<G>], dst: &mut Population<G>, n: usize, ctx: &mut RunContext) {
        profiling::scope!("ProportionateSelection::select");
        dst.reserve(n);
        for _ in 0..n {
            let i = Self::pick_index(src, &mut ctx.rng);
            dst.push(src[i].clone());
        }
    }
}

/// positions of the `e` best individuals by raw fitness (best first).
/// NaN raw fitness ranks after every finite value, unevaluated individuals after that.
pub fn elite_indices<G>(src: &[Individual<G>], e: usize, direction: Direction) -> Vec<usize> {
    let mut order: Vec<usize> = (0..src.len()).collect();
    order.sort_by(|&a, &b| match (src[a].state.w_real, src[b].state.w_real) {
        (Some(x), Some(y)) => direction.best_first(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    order.truncate(e);
    order
}

/// elitist selection folded into an embedded base strategy: the base fills
/// `n - e` slots, then the top `e` of the *source* by raw fitness are appended,
/// whether or not the base already picked them.
#[derive(Clone, Debug)]
pub struct DelayedElitism<S> {
    embedded: S,
    direction: Direction,
}

impl<S> DelayedElitism<S> {
    pub fn new(embedded: S, direction: Direction) -> Self {
        Self { embedded, direction }
    }
}

impl<G: Clone, S: SelectionStrategy<G>> SelectionStrategy<G> for DelayedElitism<S> {
    fn select(&mut self, src: &[Individual<G>], dst: &mut Population<G>, n: usize, ctx: &mut RunContext) {
        profiling::scope!("DelayedElitism::select");
        let e = ctx.settings.elitism_n;
        assert!(n > e, "elitism count {e} must be smaller than the selection count {n}");

        // ranking is taken from the source before the base strategy runs
        let elites = elite_indices(src, e, self.direction);
        self.embedded.select(src, dst, n - e, ctx);
        dst.extend(elites.into_iter().map(|i| src[i].clone()));
    }
}
