use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::individual::Genome;
use crate::injection::AncestorGenerator;

/// variation operators the engine needs from a genome
pub trait Heritable: Genome {
    /// child genome recombined from `self` and `other`
    fn recombine(&self, other: &Self, rng: &mut Pcg32) -> Self;

    /// independent per-site mutation with probability `p`; returns the number of sites changed
    fn mutate(&mut self, p: f64, rng: &mut Pcg32) -> usize;
}

/// fixed-length bitstring genome
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bitstring {
    bits: Vec<bool>,
}

impl Bitstring {
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn zeros(len: usize) -> Self {
        Self { bits: vec![false; len] }
    }

    pub fn random(len: usize, rng: &mut Pcg32) -> Self {
        Self { bits: (0..len).map(|_| rng.random::<bool>()).collect() }
    }

    #[inline]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

impl Genome for Bitstring {
    fn symbols(&self) -> String {
        self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
    }

    fn len(&self) -> usize {
        self.bits.len()
    }
}

impl Heritable for Bitstring {
    /// two-point crossover: the child takes `other`'s bits in [lo, hi) and `self`'s elsewhere
    fn recombine(&self, other: &Self, rng: &mut Pcg32) -> Self {
        profiling::scope!("Bitstring::recombine");
        assert_eq!(self.bits.len(), other.bits.len(), "crossover needs equal-length parents");
        let n = self.bits.len();
        if n < 2 {
            return self.clone();
        }
        let a = rng.random_range(0..=n);
        let b = rng.random_range(0..=n);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let mut bits = self.bits.clone();
        bits[lo..hi].copy_from_slice(&other.bits[lo..hi]);
        Self { bits }
    }

    fn mutate(&mut self, p: f64, rng: &mut Pcg32) -> usize {
        profiling::scope!("Bitstring::mutate");
        let mut flips = 0;
        for bit in self.bits.iter_mut() {
            if rng.random::<f64>() < p {
                *bit = !*bit;
                flips += 1;
            }
        }
        flips
    }
}

/// uniform random bitstrings of a fixed length
#[derive(Clone, Copy, Debug)]
pub struct RandomBitstring {
    pub len: usize,
}

impl AncestorGenerator<Bitstring> for RandomBitstring {
    fn generate(&self, rng: &mut Pcg32) -> Bitstring {
        Bitstring::random(self.len, rng)
    }
}
