mod crossover;
mod evaluator;
mod fitness;
mod generator;
mod goal;
mod individual;
mod mutation;
mod training_data;

pub use crossover::{Crossover, ProbabilityOutOfRangeError, Recombination};
pub use evaluator::{FitnessFunction, TrainingDataFitness};
pub use fitness::{Fitness, mean, variance};
pub use generator::{Generator, MultipleValueGenerator, ValueGenerator};
pub use goal::{FitnessGoal, InvalidThreshold};
pub use individual::{Individual, invalidate_all};
pub use mutation::{Mutation, SinglePointMutation};
pub use training_data::TrainingData;

pub(crate) use generator::random_population;
