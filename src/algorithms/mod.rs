mod crowding;
mod evaluation;

pub use crowding::DeterministicCrowding;
pub use evaluation::Evaluation;

use crate::models::{FitnessFunction, FitnessGoal, Individual};
use rand::Rng;

/// Advances a population by one generation: evaluate, vary, replace.
///
/// Implementations mutate the population in place and keep its size unchanged.
pub trait EvolutionaryAlgorithm<C> {
    type Fitness: FitnessFunction<C>;

    fn generational_step<R: Rng>(&mut self, rng: &mut R, population: &mut [Individual<C>]);

    fn evaluation(&self) -> &Evaluation<Self::Fitness>;

    fn evaluation_mut(&mut self) -> &mut Evaluation<Self::Fitness>;

    /// Ordering used to rank individuals of this population.
    fn goal(&self) -> &FitnessGoal;
}
