use serde::{Deserialize, Serialize};

/// identifier issued by the lineage archive. ids are never reused within a run,
/// so a stale id simply stops resolving instead of pointing at someone else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndividualId(pub(crate) u64);

impl IndividualId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// anything that can be evolved: exposes a comparable symbol string for the
/// diversity measure and its locus count.
pub trait Genome: Clone + Send + Sync {
    /// genome rendered as a symbol string; equal genomes must render equally
    fn symbols(&self) -> String;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// per-individual fitness bookkeeping. unset values read back as 0.0 because
/// founders legitimately have no history yet. offspring statistics live in the
/// lineage archive so that copies of one individual share them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessState {
    /// raw evaluation, written once per evaluation call
    pub w_real: Option<f64>,
    /// lineage-derived fitness used by selection, rewritten on every evaluation
    pub w_eff: Option<f64>,
}

impl FitnessState {
    #[inline]
    pub fn w_real_or_default(&self) -> f64 {
        self.w_real.unwrap_or(0.0)
    }

    #[inline]
    pub fn w_eff_or_default(&self) -> f64 {
        self.w_eff.unwrap_or(0.0)
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.w_real.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct Individual<G> {
    pub id: IndividualId,
    /// `None` marks an individual without tracked ancestry (injected founder)
    pub generation: Option<u32>,
    pub genome: G,
    pub state: FitnessState,
}

impl<G> Individual<G> {
    /// build an individual around an id already registered with the lineage archive
    pub fn new(id: IndividualId, generation: Option<u32>, genome: G) -> Self {
        Self { id, generation, genome, state: FitnessState::default() }
    }

    /// generation as an integer, with the sentinel mapped to -1
    #[inline]
    pub fn generation_or_sentinel(&self) -> i64 {
        self.generation.map_or(-1, i64::from)
    }
}

/// ordered collection of individuals, owned by the generational loop
pub type Population<G> = Vec<Individual<G>>;
