// raw fitness landscapes for bitstring genomes
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{Direction, FitnessFunction, Objective};
use crate::dna::Bitstring;
use crate::settings::{LandscapeKind, RunSettings};

/// Kauffman NK landscape. each locus contributes a value looked up from its own
/// random table, indexed by the locus and its `k` right-hand neighbours (wrapping).
#[derive(Clone, Debug)]
pub struct NkModel {
    n: usize,
    k: usize,
    /// n tables of 2^(k+1) contributions in [0, 1)
    tables: Vec<Vec<f64>>,
}

impl NkModel {
    pub fn new(n: usize, k: usize, seed: u64) -> Self {
        profiling::scope!("NkModel::new");
        assert!(n > 0, "NK model needs at least one locus");
        assert!(k < n, "NK model needs k < n (k = {k}, n = {n})");
        let mut rng = Pcg32::seed_from_u64(seed);
        let entries = 1usize << (k + 1);
        let tables = (0..n)
            .map(|_| (0..entries).map(|_| rng.random::<f64>()).collect())
            .collect();
        Self { n, k, tables }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// contribution of locus `i` given the whole genome
    #[inline]
    fn contribution(&self, bits: &[bool], i: usize) -> f64 {
        let mut index = 0usize;
        for offset in 0..=self.k {
            index = (index << 1) | bits[(i + offset) % self.n] as usize;
        }
        self.tables[i][index]
    }

    /// mean per-locus contribution, in [0, 1)
    pub fn fitness(&self, genome: &Bitstring) -> f64 {
        profiling::scope!("NkModel::fitness");
        let bits = genome.bits();
        assert_eq!(bits.len(), self.n, "genome length does not match the NK landscape");
        let total: f64 = (0..self.n).map(|i| self.contribution(bits, i)).sum();
        total / self.n as f64
    }
}

impl Objective for NkModel {}

impl FitnessFunction<Bitstring> for NkModel {
    fn evaluate(&self, genome: &Bitstring, _rng: &mut Pcg32) -> f64 {
        self.fitness(genome)
    }
}

/// fraction of set bits
#[derive(Clone, Copy, Debug, Default)]
pub struct AllOnes;

impl Objective for AllOnes {}

impl FitnessFunction<Bitstring> for AllOnes {
    fn evaluate(&self, genome: &Bitstring, _rng: &mut Pcg32) -> f64 {
        if genome.bits().is_empty() {
            return 0.0;
        }
        genome.count_ones() as f64 / genome.bits().len() as f64
    }
}

/// landscape chosen at configuration time
#[derive(Clone, Debug)]
pub enum Landscape {
    Nk(NkModel),
    AllOnes(AllOnes),
}

impl Landscape {
    pub fn from_settings(settings: &RunSettings) -> Self {
        match settings.landscape {
            LandscapeKind::Nk => Landscape::Nk(NkModel::new(
                settings.representation_size,
                settings.nk_k,
                settings.landscape_seed,
            )),
            LandscapeKind::AllOnes => Landscape::AllOnes(AllOnes),
        }
    }
}

impl Objective for Landscape {}

impl FitnessFunction<Bitstring> for Landscape {
    fn evaluate(&self, genome: &Bitstring, rng: &mut Pcg32) -> f64 {
        match self {
            Landscape::Nk(nk) => nk.evaluate(genome, rng),
            Landscape::AllOnes(ones) => ones.evaluate(genome, rng),
        }
    }
}

/// adds uniform noise in [-amplitude, amplitude] to every evaluation of `inner`
#[derive(Clone, Debug)]
pub struct Noisy<F> {
    inner: F,
    amplitude: f64,
}

impl<F> Noisy<F> {
    pub fn new(inner: F, amplitude: f64) -> Self {
        assert!(amplitude >= 0.0, "noise amplitude must be non-negative, got {amplitude}");
        Self { inner, amplitude }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }
}

impl<F: Objective> Objective for Noisy<F> {
    fn direction(&self) -> Direction {
        self.inner.direction()
    }
}

impl<G, F: FitnessFunction<G>> FitnessFunction<G> for Noisy<F> {
    fn evaluate(&self, genome: &G, rng: &mut Pcg32) -> f64 {
        let w = self.inner.evaluate(genome, rng);
        if self.amplitude == 0.0 {
            return w;
        }
        w + rng.random_range(-self.amplitude..=self.amplitude)
    }
}
