use super::{Fitness, TrainingData};

/// Objective function returning the fitness of a chromosome.
///
/// Implementations count every call so that callers can budget computation. Numeric
/// failures must be reported as [`Fitness::Undefined`] rather than by panicking.
pub trait FitnessFunction<C> {
    fn evaluate(&mut self, chromosome: &C) -> Fitness;

    /// Cumulative number of evaluations performed.
    fn eval_count(&self) -> u64;
}

/// A fitness function scored against a swappable set of training rows.
pub trait TrainingDataFitness<C>: FitnessFunction<C> {
    type Data: TrainingData;

    /// The rows currently used for evaluation.
    fn training_data(&self) -> &Self::Data;

    /// Replaces the rows used by subsequent evaluations.
    fn set_training_data(&mut self, data: Self::Data);
}
