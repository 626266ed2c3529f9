//! Fitness predictors: small index subsets of the training data, evolved so that a
//! fitness measured on the subset tracks the fitness measured on all rows.

pub(crate) mod fitness;
mod index_generator;
mod island;

pub use fitness::{PredictorFitnessFunction, Trainer};
pub use index_generator::IndexGenerator;
pub use island::{
    PREDICTOR_CROSSOVER_PROBABILITY, PREDICTOR_MUTATION_PROBABILITY, PredictorAlgorithm,
    PredictorIsland,
};

pub(crate) use island::predictor_island;
