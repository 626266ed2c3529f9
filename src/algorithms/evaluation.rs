use crate::models::{FitnessFunction, Individual};
use tracing::instrument;

/// Applies a fitness function to the stale members of a population.
#[derive(Debug, Clone)]
pub struct Evaluation<F> {
    fitness_function: F,
}

impl<F> Evaluation<F> {
    pub fn new(fitness_function: F) -> Self {
        Self { fitness_function }
    }

    pub fn fitness_function(&self) -> &F {
        &self.fitness_function
    }

    pub fn fitness_function_mut(&mut self) -> &mut F {
        &mut self.fitness_function
    }

    /// Evaluates every individual whose fitness is invalid. Valid fitness is left as is.
    #[instrument(
        level = "debug",
        skip(self, population),
        fields(population_size = population.len())
    )]
    pub fn evaluate<C>(&mut self, population: &mut [Individual<C>])
    where
        F: FitnessFunction<C>,
    {
        for individual in population.iter_mut().filter(|i| !i.is_fitness_valid()) {
            let fitness = self.fitness_function.evaluate(individual.chromosome());
            individual.set_fitness(fitness);
        }
    }
}
