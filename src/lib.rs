// lineage-delayed fitness and diversity-adaptive mutation for evolutionary search.
// the core is fitness::delay, inheritance, mutation, selection and injection;
// dna, fitness::landscape and engine are the thin driver that runs it end to end.

pub mod context;
pub mod dna;
pub mod engine;
pub mod error;
pub mod fitness;
pub mod individual;
pub mod inheritance;
pub mod injection;
pub mod lineage;
pub mod metrics;
pub mod mutation;
pub mod selection;
pub mod settings;

pub use context::RunContext;
pub use engine::{BitstringEngine, Engine, StepReport};
pub use error::SettingsError;
pub use fitness::{DelayedFitness, Direction, FitnessFunction, Objective};
pub use individual::{FitnessState, Genome, Individual, IndividualId, Population};
pub use lineage::LineageArchive;
pub use metrics::{DominantRecord, GenerationSnapshot, StatsRecord};
pub use settings::{DelayPolicy, LandscapeKind, RunSettings};
