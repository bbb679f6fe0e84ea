/// run settings for a lineage-delayed evolutionary run
/// these are read once at startup and stay read-only to the core afterwards
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::mutation::MutationRateController;

/// default location of the persisted settings file
pub const SETTINGS_FILE: &str = "settings.json";

/// how effective fitness is derived from the line of descent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelayPolicy {
    /// mean raw fitness over the individual and its walked ancestors
    Mean,
    /// raw fitness of the ancestor exactly `delay_generations` back (self if the chain is shorter)
    Generation,
    /// best raw fitness over the individual and its walked ancestors
    Peak,
}

/// raw fitness landscape used by the reference driver
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandscapeKind {
    /// NK model with `nk_k` epistatic neighbours per locus
    Nk,
    /// count of set bits, normalized by length
    AllOnes,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    // population shape
    pub population_size: usize,
    /// offspring produced per steady-state update (lambda)
    pub offspring_per_update: usize,
    /// number of loci per genome (also sets the mutation-probability floor)
    pub representation_size: usize,

    // landscape
    pub landscape: LandscapeKind,
    pub nk_k: usize,
    pub landscape_seed: u64,
    /// amplitude of uniform noise added to every raw evaluation (0 disables)
    pub fitness_noise: f64,

    // run control
    pub rng_seed: u64,
    pub run_updates: u64,
    /// emit a statistics snapshot every N updates
    pub recording_period: u64,

    // fitness delay
    pub delay_policy: DelayPolicy,
    /// lineage-walk depth limit
    pub delay_generations: u32,
    /// top raw-fitness individuals copied forward each survivor selection
    pub elitism_n: usize,
    /// fraction of population_size injected as fresh founders every update
    pub random_insert_fraction: f64,

    // adaptive mutation
    pub initial_mutation_p: f64,
    pub adaptive_mutation: bool,
    /// normalized genotypic entropy above which mutation is tightened
    pub entropy_threshold: f64,
    pub mutation_tighten: f64,
    pub mutation_loosen: f64,

    // housekeeping
    /// drop lineage records that no living individual can reach any more
    pub prune_lineage: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            population_size: 100,
            offspring_per_update: 10,
            representation_size: 32,

            landscape: LandscapeKind::Nk,
            nk_k: 4,
            landscape_seed: 0xC0FFEE,
            fitness_noise: 0.0,

            rng_seed: 0xDEADBEEF,
            run_updates: 1000,
            recording_period: 1,

            delay_policy: DelayPolicy::Peak,
            delay_generations: 5,
            elitism_n: 1,
            random_insert_fraction: 0.0,

            initial_mutation_p: 0.01,
            adaptive_mutation: true,
            entropy_threshold: 0.8,
            mutation_tighten: 0.99,
            mutation_loosen: 1.01,

            prune_lineage: true,
        }
    }
}

impl RunSettings {
    /// save settings to `settings.json` in the working directory
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(SETTINGS_FILE)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// load settings from `settings.json`, or return defaults if the file is missing or unreadable
    pub fn load() -> Self {
        match Self::load_from(SETTINGS_FILE) {
            Ok(settings) => settings,
            Err(SettingsError::Io(_)) => {
                // file doesn't exist or can't be read - use defaults
                Self::default()
            }
            Err(e) => {
                tracing::warn!("failed to parse {SETTINGS_FILE}: {e}. using defaults.");
                Self::default()
            }
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// reject configurations that would violate core preconditions once the run starts
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.population_size == 0 {
            return Err(SettingsError::invalid("population_size", "must be > 0"));
        }
        if self.representation_size == 0 {
            return Err(SettingsError::invalid("representation_size", "must be > 0"));
        }
        if self.elitism_n >= self.population_size {
            return Err(SettingsError::invalid(
                "elitism_n",
                format!("{} must be < population_size {}", self.elitism_n, self.population_size),
            ));
        }
        if !(0.0..=1.0).contains(&self.random_insert_fraction) {
            return Err(SettingsError::invalid(
                "random_insert_fraction",
                format!("{} is outside [0, 1]", self.random_insert_fraction),
            ));
        }
        if !(self.initial_mutation_p > 0.0 && self.initial_mutation_p <= 0.5) {
            return Err(SettingsError::invalid(
                "initial_mutation_p",
                format!("{} is outside (0, 0.5]", self.initial_mutation_p),
            ));
        }
        if self.landscape == LandscapeKind::Nk && self.nk_k >= self.representation_size {
            return Err(SettingsError::invalid(
                "nk_k",
                format!("{} must be < representation_size {}", self.nk_k, self.representation_size),
            ));
        }
        if !(self.fitness_noise >= 0.0) {
            return Err(SettingsError::invalid("fitness_noise", "must be >= 0"));
        }
        if self.recording_period == 0 {
            return Err(SettingsError::invalid("recording_period", "must be > 0"));
        }
        if self.mutation_tighten <= 0.0 || self.mutation_loosen <= 0.0 {
            return Err(SettingsError::invalid(
                "mutation_tighten/mutation_loosen",
                "scale factors must be positive",
            ));
        }
        Ok(())
    }

    /// number of founders injected per update (rounded)
    pub fn random_insert_count(&self) -> usize {
        (self.random_insert_fraction * self.population_size as f64).round() as usize
    }

    /// convert to the controller used by the end-of-generation hook
    pub fn to_mutation_controller(&self) -> MutationRateController {
        MutationRateController {
            entropy_threshold: self.entropy_threshold,
            tighten: self.mutation_tighten,
            loosen: self.mutation_loosen,
            representation_size: self.representation_size,
        }
    }
}
