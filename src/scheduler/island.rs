//! Coevolution of a main population with a population of fitness predictors.
//!
//! The main population is evaluated on a small subset of the training data chosen by the
//! best predictor. Predictors are evolved in the background to estimate the full-data
//! fitness of a set of trainers taken from the main population. New trainers are picked
//! where the predictors disagree the most.

use super::FitnessPredictorConfig;
use crate::Error;
use crate::algorithms::EvolutionaryAlgorithm;
use crate::island::{EvolutionaryLoop, Island};
use crate::models::{
    Fitness, FitnessFunction, Generator, Individual, TrainingData, TrainingDataFitness, variance,
};
use crate::predictor::{PredictorFitnessFunction, PredictorIsland, predictor_island};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::instrument;

type DataOf<C, F> = <F as TrainingDataFitness<C>>::Data;

/// Index of the individual whose predictions vary the most across predictors.
///
/// Starts from the first individual with a maximum of zero. Only a strictly greater,
/// defined variance takes over. Returns `None` for an empty input.
pub(crate) fn most_contested(variances: impl IntoIterator<Item = Fitness>) -> Option<usize> {
    let mut best = None;
    let mut max_variance = 0.0;

    for (index, variance) in variances.into_iter().enumerate() {
        if best.is_none() {
            best = Some(index);
        }

        if let Fitness::Value(variance) = variance {
            if variance > max_variance {
                best = Some(index);
                max_variance = variance;
            }
        }
    }

    best
}

/// Samples up to `amount` distinct individuals from `population`.
fn sample_trainers<'a, C, R: Rng>(
    rng: &mut R,
    population: &'a [Individual<C>],
    amount: usize,
) -> Vec<&'a Individual<C>> {
    if amount > population.len() {
        tracing::warn!(
            trainer_population_size = amount,
            population_size = population.len(),
            "Not enough individuals to sample trainers from, using the whole population"
        );
    }

    population.choose_multiple(rng, amount).collect()
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// An island whose fitness function is driven by coevolved fitness predictors.
///
/// Implements [`EvolutionaryLoop`] so that it can stand in for a plain [`Island`]:
///
/// 1. The main island advances one generation.
/// 2. The predictor island advances until the share of point evaluations spent on
///    predictors reaches `predictor_computation_ratio`.
/// 3. Every `predictor_update_frequency` generations the best predictor's subset is
///    installed on the main fitness function and the main population is re-evaluated.
/// 4. Every `trainer_update_frequency` generations the main individual with the most
///    contested prediction becomes a trainer and all predictors are re-evaluated.
pub struct FitnessPredictorIsland<C, A, G>
where
    A: EvolutionaryAlgorithm<C>,
    A::Fitness: TrainingDataFitness<C>,
{
    island: Island<C, A, G>,
    predictor_island: PredictorIsland<C, A::Fitness>,
    full_training_data: Arc<DataOf<C, A::Fitness>>,
    predictor_size: usize,
    config: FitnessPredictorConfig,
}

impl<C, A, G> FitnessPredictorIsland<C, A, G>
where
    C: Clone,
    A: EvolutionaryAlgorithm<C>,
    A::Fitness: TrainingDataFitness<C> + Clone,
    G: Generator<C>,
{
    /// Validates `config`, builds both islands and installs the initial best predictor.
    ///
    /// The training data held by the algorithm's fitness function at this point is the
    /// full data set every predictor samples from.
    #[instrument(
        level = "info",
        skip(algorithm, generator),
        fields(population_size = config.population_size, seed = ?config.seed)
    )]
    pub fn new(algorithm: A, generator: G, config: FitnessPredictorConfig) -> Result<Self, Error> {
        config.validate()?;

        let mut island = Island::new(algorithm, generator, config.population_size, config.seed);
        island.evaluate_population();

        let full_training_data = Arc::new(island.fitness_function().training_data().clone());
        let full_data_size = full_training_data.len();
        let predictor_size = (config.predictor_size_ratio * full_data_size as f64).floor() as usize;

        let mut rng = seeded_rng(config.seed.map(|seed| seed.wrapping_add(2)));
        let trainers =
            sample_trainers(&mut rng, island.population(), config.trainer_population_size);
        let predictor_fitness = PredictorFitnessFunction::new(
            full_training_data.clone(),
            island.fitness_function(),
            trainers,
        );

        let predictor_island = predictor_island(
            predictor_fitness,
            full_data_size,
            predictor_size,
            config.predictor_population_size,
            config.seed.map(|seed| seed.wrapping_add(1)),
        )?;

        let mut scheduler = Self {
            island,
            predictor_island,
            full_training_data,
            predictor_size,
            config,
        };

        // Costs one main evaluation per individual on top of the initial full-data pass
        if scheduler.adopt_best_predictor() {
            scheduler.island.invalidate_population();
            scheduler.island.evaluate_population();
        }

        tracing::info!(
            full_data_size,
            predictor_size,
            trainer_count = scheduler.trainer_count(),
            "Fitness predictor island created"
        );

        Ok(scheduler)
    }

    pub fn config(&self) -> &FitnessPredictorConfig {
        &self.config
    }

    /// The main island.
    pub fn island(&self) -> &Island<C, A, G> {
        &self.island
    }

    pub fn predictor_island(&self) -> &PredictorIsland<C, A::Fitness> {
        &self.predictor_island
    }

    pub fn main_fitness_function(&self) -> &A::Fitness {
        self.island.fitness_function()
    }

    /// The training data captured at construction.
    pub fn full_training_data(&self) -> &DataOf<C, A::Fitness> {
        &self.full_training_data
    }

    pub fn full_data_size(&self) -> usize {
        self.full_training_data.len()
    }

    /// Number of rows indexed by every predictor.
    pub fn predictor_size(&self) -> usize {
        self.predictor_size
    }

    pub fn trainer_count(&self) -> usize {
        self.predictor_island.fitness_function().trainers().len()
    }

    /// Share of point evaluations spent on predictors, `0.0` before any evaluation.
    ///
    /// Each main evaluation is counted as `predictor_size` point evaluations.
    pub fn computation_ratio(&self) -> f64 {
        let predictor_expense = self.predictor_island.fitness_function().point_eval_count() as f64;
        let main_expense =
            self.island.fitness_function().eval_count() as f64 * self.predictor_size as f64;

        let total = predictor_expense + main_expense;
        if total == 0.0 {
            0.0
        } else {
            predictor_expense / total
        }
    }

    /// Installs the subset of the best predictor on the main fitness function.
    ///
    /// Returns `false` and keeps the current training data when there is no predictor.
    fn adopt_best_predictor(&mut self) -> bool {
        let Some(best) = self.predictor_island.best_individual() else {
            tracing::warn!("No fitness predictor available, keeping current training data");
            return false;
        };

        let subset = self.full_training_data.subset(best.chromosome());
        tracing::debug!(
            predictor_id = %best.id(),
            predictor_fitness = %best.fitness_or_undefined(),
            "Adopting fitness predictor"
        );

        self.island.fitness_function_mut().set_training_data(subset);
        true
    }

    /// Steps the predictor island until the computation ratio reaches its target.
    ///
    /// Returns the number of predictor generations executed.
    #[instrument(
        level = "debug",
        skip(self),
        fields(target = self.config.predictor_computation_ratio)
    )]
    fn maintain_computation_ratio(&mut self) -> Result<u64, Error> {
        let target = self.config.predictor_computation_ratio;
        let limit = self.config.max_predictor_steps_per_generation;

        // Without rows, trainers or predictors no predictor step can add any cost
        let can_accrue_cost = self.predictor_size > 0
            && self.trainer_count() > 0
            && !self.predictor_island.population().is_empty();

        let mut steps = 0;
        while self.computation_ratio() < target {
            if !can_accrue_cost {
                tracing::warn!(
                    ratio = self.computation_ratio(),
                    target,
                    "Predictor computation ratio cannot be reached"
                );
                break;
            }

            if steps >= limit {
                tracing::warn!(
                    steps,
                    ratio = self.computation_ratio(),
                    target,
                    "Predictor computation ratio not reached within the step limit"
                );
                break;
            }

            self.predictor_island.execute_generational_step()?;
            steps += 1;
        }

        Ok(steps)
    }

    fn refresh_predictor(&mut self) {
        tracing::info!(
            generational_age = self.island.generational_age(),
            "Updating fitness predictor"
        );

        self.adopt_best_predictor();
        self.island.invalidate_population();
        self.island.evaluate_population();
    }

    fn refresh_trainers(&mut self) -> Result<(), Error> {
        let index = self.find_best_new_trainer()?;
        let trainer = self.island.population()[index].clone();

        tracing::info!(
            generational_age = self.island.generational_age(),
            trainer_id = %trainer.id(),
            trainer_count = self.trainer_count() + 1,
            "Updating trainers"
        );

        self.predictor_island
            .fitness_function_mut()
            .add_trainer(&trainer);
        self.predictor_island.invalidate_population();
        self.predictor_island.evaluate_population();

        Ok(())
    }

    /// Index of the main individual whose predicted fitness varies the most across the
    /// current predictors.
    fn find_best_new_trainer(&mut self) -> Result<usize, Error> {
        let predictors: Vec<Vec<usize>> = self
            .predictor_island
            .population()
            .iter()
            .map(|predictor| predictor.chromosome().clone())
            .collect();

        let predictor_fitness = self.predictor_island.fitness_function_mut();
        let variances: Vec<Fitness> = self
            .island
            .population()
            .iter()
            .map(|individual| {
                let predictions: Vec<Fitness> = predictors
                    .iter()
                    .map(|predictor| {
                        predictor_fitness.predict_fitness_for_trainer(predictor, individual)
                    })
                    .collect();
                variance(&predictions)
            })
            .collect();

        most_contested(variances).ok_or(Error::EmptyPopulation("selecting a new trainer"))
    }
}

impl<C, A, G> EvolutionaryLoop<C> for FitnessPredictorIsland<C, A, G>
where
    C: Clone,
    A: EvolutionaryAlgorithm<C>,
    A::Fitness: TrainingDataFitness<C> + Clone,
    G: Generator<C>,
{
    #[instrument(
        level = "info",
        skip(self),
        fields(generational_age = self.island.generational_age() + 1)
    )]
    fn execute_generational_step(&mut self) -> Result<(), Error> {
        self.island.execute_generational_step()?;

        let predictor_steps = self.maintain_computation_ratio()?;
        tracing::debug!(
            predictor_steps,
            ratio = self.computation_ratio(),
            "Computation ratio maintained"
        );

        let age = self.island.generational_age();
        if age % self.config.predictor_update_frequency == 0 {
            self.refresh_predictor();
        }

        if age % self.config.trainer_update_frequency == 0 {
            self.refresh_trainers()?;
        }

        Ok(())
    }

    fn evaluate_population(&mut self) {
        self.island.evaluate_population();
    }

    fn best_individual(&self) -> Option<&Individual<C>> {
        self.island.best_individual()
    }

    fn population(&self) -> &[Individual<C>] {
        self.island.population()
    }

    fn generational_age(&self) -> u64 {
        self.island.generational_age()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::DeterministicCrowding;
    use crate::models::{
        Crossover, FitnessGoal, MultipleValueGenerator, SinglePointMutation, ValueGenerator, mean,
    };

    /// Chromosome `[slope]`, fitness is the mean absolute error of `slope * x` over
    /// rows `(x, y)` sampled from `y = 3x`.
    #[derive(Debug, Clone)]
    struct SlopeError {
        rows: Vec<(f64, f64)>,
        evaluations: u64,
    }

    impl FitnessFunction<Vec<f64>> for SlopeError {
        fn evaluate(&mut self, chromosome: &Vec<f64>) -> Fitness {
            self.evaluations += 1;
            let errors: Vec<Fitness> = self
                .rows
                .iter()
                .map(|(x, y)| Fitness::new((chromosome[0] * x - y).abs()))
                .collect();
            mean(&errors)
        }

        fn eval_count(&self) -> u64 {
            self.evaluations
        }
    }

    impl TrainingDataFitness<Vec<f64>> for SlopeError {
        type Data = Vec<(f64, f64)>;

        fn training_data(&self) -> &Self::Data {
            &self.rows
        }

        fn set_training_data(&mut self, data: Self::Data) {
            self.rows = data;
        }
    }

    #[derive(Debug, Clone, Copy)]
    struct Slope;

    impl ValueGenerator<f64> for Slope {
        fn random_value<R: Rng>(&self, rng: &mut R) -> f64 {
            rng.random_range(-10.0..10.0)
        }
    }

    type SlopeScheduler = FitnessPredictorIsland<
        Vec<f64>,
        DeterministicCrowding<SlopeError, Crossover, SinglePointMutation<Slope>>,
        MultipleValueGenerator<Slope>,
    >;

    fn rows(count: usize) -> Vec<(f64, f64)> {
        (0..count)
            .map(|i| {
                let x = i as f64 / 10.0;
                (x, 3.0 * x)
            })
            .collect()
    }

    fn scheduler(rows: Vec<(f64, f64)>, config: FitnessPredictorConfig) -> SlopeScheduler {
        scheduler_with_operators(rows, config, 0.5, 0.5)
    }

    fn scheduler_with_operators(
        rows: Vec<(f64, f64)>,
        config: FitnessPredictorConfig,
        crossover_probability: f64,
        mutation_probability: f64,
    ) -> SlopeScheduler {
        let algorithm = DeterministicCrowding::new(
            SlopeError {
                rows,
                evaluations: 0,
            },
            Crossover::single_point(),
            SinglePointMutation::new(Slope),
            crossover_probability,
            mutation_probability,
            FitnessGoal::minimize(),
        )
        .unwrap();

        FitnessPredictorIsland::new(algorithm, MultipleValueGenerator::new(Slope, 1), config)
            .unwrap()
    }

    #[test]
    fn it_selects_the_individual_with_the_largest_prediction_variance() {
        let predictions = [
            [1.0, 1.0, 1.0],
            [0.0, 5.0, 10.0],
            [2.0, 2.0, 2.0],
        ];

        let variances = predictions.iter().map(|values| {
            let values: Vec<Fitness> = values.iter().copied().map(Fitness::new).collect();
            variance(&values)
        });

        assert_eq!(most_contested(variances), Some(1));
    }

    #[test]
    fn it_keeps_the_earliest_individual_on_ties() {
        let variances = [Fitness::Value(0.0), Fitness::Value(2.0), Fitness::Value(2.0)];
        assert_eq!(most_contested(variances), Some(1));

        let variances = [Fitness::Value(0.0), Fitness::Value(0.0)];
        assert_eq!(most_contested(variances), Some(0));
    }

    #[test]
    fn it_never_selects_an_undefined_variance() {
        let variances = [Fitness::Value(0.5), Fitness::Undefined, Fitness::Value(0.25)];
        assert_eq!(most_contested(variances), Some(0));

        let variances = [Fitness::Undefined, Fitness::Undefined];
        assert_eq!(most_contested(variances), Some(0));

        assert_eq!(most_contested(Vec::new()), None);
    }

    #[test]
    fn it_samples_distinct_trainers_up_to_the_population_size() {
        let mut rng = StdRng::seed_from_u64(42);
        let population: Vec<_> = (0..5).map(Individual::new).collect();

        let trainers = sample_trainers(&mut rng, &population, 3);
        assert_eq!(trainers.len(), 3);
        for (i, trainer) in trainers.iter().enumerate() {
            assert!(!trainers[i + 1..].iter().any(|other| other.is_same(trainer)));
        }

        assert_eq!(sample_trainers(&mut rng, &population, 10).len(), 5);
    }

    #[test]
    fn it_derives_predictor_size_from_the_ratio() {
        let config = FitnessPredictorConfig::new(8)
            .with_predictor_size_ratio(0.25)
            .with_seed(1);
        let scheduler = scheduler(rows(20), config);

        assert_eq!(scheduler.full_data_size(), 20);
        assert_eq!(scheduler.predictor_size(), 5);
        assert_eq!(scheduler.trainer_count(), 8);
    }

    #[test]
    fn it_installs_the_best_predictor_on_construction() {
        let config = FitnessPredictorConfig::new(8).with_seed(2);
        let scheduler = scheduler(rows(40), config);

        let best = scheduler.predictor_island().best_individual().unwrap();
        let expected = scheduler.full_training_data().subset(best.chromosome());

        assert_eq!(scheduler.main_fitness_function().training_data(), &expected);
        assert_eq!(scheduler.main_fitness_function().training_data().len(), 4);
        assert!(scheduler.population().iter().all(|i| i.is_fitness_valid()));

        // One pass on the full data and one on the adopted subset
        assert_eq!(scheduler.main_fitness_function().eval_count(), 16);
    }

    #[test]
    fn it_reaches_the_computation_ratio_every_generation() {
        let config = FitnessPredictorConfig::new(10)
            .with_predictor_computation_ratio(0.3)
            .with_seed(3);
        let mut scheduler = scheduler(rows(50), config);

        for _ in 0..5 {
            scheduler.execute_generational_step().unwrap();
            let ratio = scheduler.computation_ratio();
            assert!(ratio >= 0.3, "ratio {ratio} below target");
            assert!(ratio < 1.0);
        }
    }

    #[test]
    fn it_stops_at_the_predictor_step_limit() {
        let config = FitnessPredictorConfig::new(10)
            .with_predictor_computation_ratio(0.99)
            .with_max_predictor_steps_per_generation(2)
            .with_seed(4);
        let mut scheduler = scheduler(rows(50), config);
        let age_before = scheduler.predictor_island().generational_age();

        scheduler.execute_generational_step().unwrap();

        assert_eq!(scheduler.predictor_island().generational_age(), age_before + 2);
        assert!(scheduler.computation_ratio() < 0.99);
    }

    #[test]
    fn it_adds_a_trainer_every_trainer_update_frequency_generations() {
        let config = FitnessPredictorConfig::new(6)
            .with_trainer_population_size(2)
            .with_trainer_update_frequency(3)
            .with_seed(5);
        let mut scheduler = scheduler(rows(30), config);

        let mut counts = Vec::new();
        for _ in 0..7 {
            scheduler.execute_generational_step().unwrap();
            counts.push(scheduler.trainer_count());
        }

        assert_eq!(counts, vec![2, 2, 3, 3, 3, 4, 4]);
    }

    #[test]
    fn it_refreshes_the_predictor_every_predictor_update_frequency_generations() {
        // Without crossover or mutation every child inherits its parent's fitness, so main
        // evaluations only happen when a refresh re-evaluates the population
        let config = FitnessPredictorConfig::new(6)
            .with_predictor_update_frequency(3)
            .with_seed(6);
        let mut scheduler = scheduler_with_operators(rows(30), config, 0.0, 0.0);

        let mut main_evaluations = Vec::new();
        for _ in 0..7 {
            let before = scheduler.main_fitness_function().eval_count();
            scheduler.execute_generational_step().unwrap();
            main_evaluations.push(scheduler.main_fitness_function().eval_count() - before);

            if scheduler.generational_age() % 3 == 0 {
                let best = scheduler.predictor_island().best_individual().unwrap();
                let expected = scheduler.full_training_data().subset(best.chromosome());
                assert_eq!(scheduler.main_fitness_function().training_data(), &expected);
            }
            assert!(scheduler.population().iter().all(|i| i.is_fitness_valid()));
        }

        assert_eq!(main_evaluations, vec![0, 0, 6, 0, 0, 6, 0]);
    }

    #[test]
    fn it_adds_the_individual_predictors_disagree_on_most_as_trainer() {
        let config = FitnessPredictorConfig::new(8)
            .with_predictor_size_ratio(0.2)
            .with_seed(10);
        let mut scheduler = scheduler(rows(30), config);
        scheduler.evolve(1).unwrap();

        let predictors: Vec<Vec<usize>> = scheduler
            .predictor_island()
            .population()
            .iter()
            .map(|predictor| predictor.chromosome().clone())
            .collect();

        let variances: Vec<Fitness> = scheduler
            .population()
            .iter()
            .map(|individual| {
                let predictions: Vec<Fitness> = predictors
                    .iter()
                    .map(|predictor| {
                        let mut on_subset = SlopeError {
                            rows: scheduler.full_training_data().subset(predictor),
                            evaluations: 0,
                        };
                        on_subset.evaluate(individual.chromosome())
                    })
                    .collect();
                variance(&predictions)
            })
            .collect();

        let mut expected = 0;
        let mut largest = 0.0;
        for (index, spread) in variances.iter().enumerate() {
            match *spread {
                Fitness::Value(spread) if spread > largest => {
                    largest = spread;
                    expected = index;
                }
                _ => {}
            }
        }

        let candidate = scheduler.population()[expected].clone();
        let trainers_before = scheduler.trainer_count();

        scheduler.refresh_trainers().unwrap();

        let trainers = scheduler.predictor_island().fitness_function().trainers();
        assert_eq!(trainers.len(), trainers_before + 1);

        let added = trainers.last().unwrap();
        assert!(added.individual().is_same(&candidate));

        let mut on_full_data = SlopeError {
            rows: scheduler.full_training_data().clone(),
            evaluations: 0,
        };
        assert_eq!(added.true_fitness(), on_full_data.evaluate(candidate.chromosome()));

        // The main population is left alone
        let member = &scheduler.population()[expected];
        assert!(member.is_same(&candidate));
        assert_eq!(member.fitness(), candidate.fitness());

        let predictor_population = scheduler.predictor_island().population();
        assert!(predictor_population.iter().all(|p| p.is_fitness_valid()));
    }

    #[test]
    fn it_accepts_empty_populations() {
        let config = FitnessPredictorConfig::new(0)
            .with_predictor_population_size(0)
            .with_trainer_update_frequency(1000)
            .with_seed(7);
        let mut scheduler = scheduler(rows(10), config);

        assert!(scheduler.best_individual().is_none());
        assert_eq!(scheduler.trainer_count(), 0);
        assert_eq!(scheduler.computation_ratio(), 0.0);

        // Nothing to adopt, the full data stays active
        assert_eq!(scheduler.main_fitness_function().training_data().len(), 10);

        scheduler.evolve(3).unwrap();
        assert_eq!(scheduler.generational_age(), 3);
    }

    #[test]
    fn it_reports_an_empty_population_when_selecting_a_trainer() {
        let config = FitnessPredictorConfig::new(0)
            .with_trainer_update_frequency(1)
            .with_seed(8);
        let mut scheduler = scheduler(rows(10), config);

        let result = scheduler.execute_generational_step();
        assert!(matches!(result, Err(Error::EmptyPopulation(_))));
    }

    #[test]
    fn it_is_reproducible_with_a_seed() {
        let run = || {
            let config = FitnessPredictorConfig::new(8).with_seed(9);
            let mut scheduler = scheduler(rows(30), config);
            scheduler.evolve(5).unwrap();
            scheduler
                .population()
                .iter()
                .map(|i| i.chromosome().clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }
}
