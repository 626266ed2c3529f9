//! Polynomial regression with coevolved fitness predictors.
//!
//! Fits the coefficients of a quadratic to noisy samples of `1.5x² - 2x + 0.5`. The main
//! population is scored on a small predictor-chosen subset of the samples, and the best
//! candidate is finally scored on all of them.
//!
//! Usage: `coevolve [config.json]`. Without a configuration file a seeded default
//! configuration is used.

use anyhow::{Context, Result};
use fx_fitness_predictors::{
    EvolutionaryLoop, FitnessPredictorConfig, FitnessPredictorIsland,
    algorithms::DeterministicCrowding,
    models::{
        Crossover, Fitness, FitnessFunction, FitnessGoal, MultipleValueGenerator,
        SinglePointMutation, TrainingDataFitness, ValueGenerator, mean,
    },
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::env;
use tracing::Level;

const SAMPLES: usize = 1_000;
const NOISE: f64 = 0.1;
const TARGET_COEFFICIENTS: [f64; 3] = [0.5, -2.0, 1.5];
const FITNESS_TARGET: f64 = 0.1;
const MAX_GENERATIONS: u64 = 2_000;

#[derive(Debug, Clone, Copy)]
struct Coefficient;

impl ValueGenerator<f64> for Coefficient {
    fn random_value<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.random_range(-5.0..5.0)
    }
}

/// Mean absolute error of a polynomial, given by its coefficients in ascending order of
/// degree, over `(x, y)` samples.
#[derive(Debug, Clone)]
struct PolynomialError {
    samples: Vec<(f64, f64)>,
    evaluations: u64,
}

fn polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

impl FitnessFunction<Vec<f64>> for PolynomialError {
    fn evaluate(&mut self, coefficients: &Vec<f64>) -> Fitness {
        self.evaluations += 1;

        let errors: Vec<Fitness> = self
            .samples
            .iter()
            .map(|&(x, y)| Fitness::new((polynomial(coefficients, x) - y).abs()))
            .collect();

        mean(&errors)
    }

    fn eval_count(&self) -> u64 {
        self.evaluations
    }
}

impl TrainingDataFitness<Vec<f64>> for PolynomialError {
    type Data = Vec<(f64, f64)>;

    fn training_data(&self) -> &Self::Data {
        &self.samples
    }

    fn set_training_data(&mut self, data: Self::Data) {
        self.samples = data;
    }
}

fn noisy_samples(rng: &mut StdRng) -> Vec<(f64, f64)> {
    (0..SAMPLES)
        .map(|_| {
            let x = rng.random_range(-3.0..3.0);
            let noise = rng.random_range(-NOISE..NOISE);
            (x, polynomial(&TARGET_COEFFICIENTS, x) + noise)
        })
        .collect()
}

fn load_config() -> Result<FitnessPredictorConfig> {
    match env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read configuration file {path}"))?;
            FitnessPredictorConfig::from_json(&json)
                .with_context(|| format!("Invalid configuration in {path}"))
        }
        None => Ok(FitnessPredictorConfig::new(128)
            .with_predictor_size_ratio(0.05)
            .with_seed(42)),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = load_config()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let fitness_function = PolynomialError {
        samples: noisy_samples(&mut rng),
        evaluations: 0,
    };

    let algorithm = DeterministicCrowding::new(
        fitness_function,
        Crossover::uniform(0.5)?,
        SinglePointMutation::new(Coefficient),
        0.7,
        0.3,
        FitnessGoal::minimize(),
    )?;

    let generator = MultipleValueGenerator::new(Coefficient, TARGET_COEFFICIENTS.len());
    let mut island = FitnessPredictorIsland::new(algorithm, generator, config)?;

    let goal = FitnessGoal::minimize_to(FITNESS_TARGET)?;
    let report = island.evolve_until_convergence(MAX_GENERATIONS, &goal)?;

    let best = island
        .best_individual()
        .context("Population is empty, nothing to report")?;

    let mut full_data_fitness = island.main_fitness_function().clone();
    full_data_fitness.set_training_data(island.full_training_data().clone());
    let full_fitness = full_data_fitness.evaluate(best.chromosome());

    tracing::info!(
        report = %serde_json::to_string(&report)?,
        coefficients = ?best.chromosome(),
        predicted_fitness = %best.fitness_or_undefined(),
        full_fitness = %full_fitness,
        main_evaluations = island.main_fitness_function().eval_count(),
        computation_ratio = island.computation_ratio(),
        trainer_count = island.trainer_count(),
        "Coevolution finished"
    );

    Ok(())
}
