use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be greater than 0")]
    NotPositive { name: &'static str },
    #[error("predictor_size_ratio must be in (0, 1], got {0}")]
    PredictorSizeRatioOutOfRange(f64),
    #[error("predictor_computation_ratio must be in [0, 1), got {0}")]
    PredictorComputationRatioOutOfRange(f64),
    #[error("invalid configuration document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

/// Parameters of the coevolutionary fitness predictor scheduler.
///
/// All fields except `population_size` have defaults, so a configuration document only
/// needs to name the values it changes:
///
/// ```rust
/// use fx_fitness_predictors::FitnessPredictorConfig;
///
/// let config = FitnessPredictorConfig::from_json(r#"{ "population_size": 64 }"#).unwrap();
/// assert_eq!(config.predictor_population_size, 16);
///
/// let config = FitnessPredictorConfig::new(64)
///     .with_predictor_size_ratio(0.2)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessPredictorConfig {
    /// Size of the main population.
    pub population_size: usize,
    /// Size of the population of fitness predictors.
    #[serde(default = "defaults::predictor_population_size")]
    pub predictor_population_size: usize,
    /// Main generations between adoptions of the best predictor.
    #[serde(default = "defaults::predictor_update_frequency")]
    pub predictor_update_frequency: u64,
    /// Fraction of the training data sampled by each predictor, in (0, 1].
    #[serde(default = "defaults::predictor_size_ratio")]
    pub predictor_size_ratio: f64,
    /// Minimum share of total point evaluations spent on predictors, in [0, 1).
    #[serde(default = "defaults::predictor_computation_ratio")]
    pub predictor_computation_ratio: f64,
    /// Number of trainers sampled from the main population at construction.
    #[serde(default = "defaults::trainer_population_size")]
    pub trainer_population_size: usize,
    /// Main generations between trainer additions.
    #[serde(default = "defaults::trainer_update_frequency")]
    pub trainer_update_frequency: u64,
    /// Upper bound on predictor generations run per main generation while the
    /// computation ratio is below target.
    #[serde(default = "defaults::max_predictor_steps_per_generation")]
    pub max_predictor_steps_per_generation: u64,
    /// Seeds every random number generator of the scheduler. Unseeded runs draw
    /// from the operating system.
    #[serde(default)]
    pub seed: Option<u64>,
}

mod defaults {
    pub(super) fn predictor_population_size() -> usize {
        16
    }

    pub(super) fn predictor_update_frequency() -> u64 {
        50
    }

    pub(super) fn predictor_size_ratio() -> f64 {
        0.1
    }

    pub(super) fn predictor_computation_ratio() -> f64 {
        0.1
    }

    pub(super) fn trainer_population_size() -> usize {
        16
    }

    pub(super) fn trainer_update_frequency() -> u64 {
        50
    }

    pub(super) fn max_predictor_steps_per_generation() -> u64 {
        1000
    }
}

impl FitnessPredictorConfig {
    pub fn new(population_size: usize) -> Self {
        Self {
            population_size,
            predictor_population_size: defaults::predictor_population_size(),
            predictor_update_frequency: defaults::predictor_update_frequency(),
            predictor_size_ratio: defaults::predictor_size_ratio(),
            predictor_computation_ratio: defaults::predictor_computation_ratio(),
            trainer_population_size: defaults::trainer_population_size(),
            trainer_update_frequency: defaults::trainer_update_frequency(),
            max_predictor_steps_per_generation: defaults::max_predictor_steps_per_generation(),
            seed: None,
        }
    }

    /// Parses and validates a JSON configuration document.
    #[instrument(level = "debug", skip(json))]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_predictor_population_size(mut self, size: usize) -> Self {
        self.predictor_population_size = size;
        self
    }

    pub fn with_predictor_update_frequency(mut self, frequency: u64) -> Self {
        self.predictor_update_frequency = frequency;
        self
    }

    pub fn with_predictor_size_ratio(mut self, ratio: f64) -> Self {
        self.predictor_size_ratio = ratio;
        self
    }

    pub fn with_predictor_computation_ratio(mut self, ratio: f64) -> Self {
        self.predictor_computation_ratio = ratio;
        self
    }

    pub fn with_trainer_population_size(mut self, size: usize) -> Self {
        self.trainer_population_size = size;
        self
    }

    pub fn with_trainer_update_frequency(mut self, frequency: u64) -> Self {
        self.trainer_update_frequency = frequency;
        self
    }

    pub fn with_max_predictor_steps_per_generation(mut self, steps: u64) -> Self {
        self.max_predictor_steps_per_generation = steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks every parameter against its valid range. NaN ratios are rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.predictor_update_frequency == 0 {
            return Err(ConfigError::NotPositive {
                name: "predictor_update_frequency",
            });
        }

        if self.trainer_update_frequency == 0 {
            return Err(ConfigError::NotPositive {
                name: "trainer_update_frequency",
            });
        }

        if self.max_predictor_steps_per_generation == 0 {
            return Err(ConfigError::NotPositive {
                name: "max_predictor_steps_per_generation",
            });
        }

        let size_ratio = self.predictor_size_ratio;
        if !(size_ratio > 0.0 && size_ratio <= 1.0) {
            return Err(ConfigError::PredictorSizeRatioOutOfRange(size_ratio));
        }

        let computation_ratio = self.predictor_computation_ratio;
        if !(0.0..1.0).contains(&computation_ratio) {
            return Err(ConfigError::PredictorComputationRatioOutOfRange(
                computation_ratio,
            ));
        }

        Ok(())
    }
}
