//! Coevolution of fitness predictors.
//!
//! An evolutionary search whose fitness function scores candidates against a training
//! data set can often be driven by a small subset of that data. This crate evolves such
//! subsets ("fitness predictors") alongside the main population and keeps the main
//! fitness function pointed at the best one found so far.
//!
//! - [`Island`] evolves a single population with any [`algorithms::EvolutionaryAlgorithm`].
//! - [`FitnessPredictorIsland`] wraps an island and coevolves its fitness predictors.
//!
//! Both implement [`EvolutionaryLoop`].

pub mod algorithms;
mod error;
mod island;
pub mod models;
pub mod predictor;
pub mod scheduler;

pub use error::Error;
pub use island::{ConvergenceReport, EvolutionaryLoop, Island};
pub use scheduler::{ConfigError, FitnessPredictorConfig, FitnessPredictorIsland};
