use super::{IndexGenerator, PredictorFitnessFunction};
use crate::Error;
use crate::algorithms::DeterministicCrowding;
use crate::island::{EvolutionaryLoop, Island};
use crate::models::{
    Crossover, FitnessGoal, MultipleValueGenerator, SinglePointMutation, TrainingDataFitness,
};
use tracing::instrument;

/// Per-pair crossover probability of the predictor population.
pub const PREDICTOR_CROSSOVER_PROBABILITY: f64 = 0.5;
/// Per-offspring mutation probability of the predictor population.
pub const PREDICTOR_MUTATION_PROBABILITY: f64 = 0.2;

pub type PredictorAlgorithm<C, F> = DeterministicCrowding<
    PredictorFitnessFunction<C, F>,
    Crossover,
    SinglePointMutation<IndexGenerator>,
>;

/// Population of fixed-length index subsets evolved to minimize prediction error.
pub type PredictorIsland<C, F> =
    Island<Vec<usize>, PredictorAlgorithm<C, F>, MultipleValueGenerator<IndexGenerator>>;

/// Builds the predictor island and executes its first generational step, so that the
/// population is evaluated and a best predictor exists from the start.
#[instrument(level = "debug", skip(fitness_function))]
pub(crate) fn predictor_island<C, F>(
    fitness_function: PredictorFitnessFunction<C, F>,
    full_data_size: usize,
    predictor_size: usize,
    population_size: usize,
    seed: Option<u64>,
) -> Result<PredictorIsland<C, F>, Error>
where
    C: Clone,
    F: TrainingDataFitness<C> + Clone,
{
    let index_generator = IndexGenerator::new(full_data_size);

    let algorithm = DeterministicCrowding::new(
        fitness_function,
        Crossover::single_point(),
        SinglePointMutation::new(index_generator),
        PREDICTOR_CROSSOVER_PROBABILITY,
        PREDICTOR_MUTATION_PROBABILITY,
        FitnessGoal::minimize(),
    )?;

    let mut island = Island::new(
        algorithm,
        MultipleValueGenerator::new(index_generator, predictor_size),
        population_size,
        seed,
    );
    island.execute_generational_step()?;

    Ok(island)
}
