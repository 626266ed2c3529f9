use crate::models::ProbabilityOutOfRangeError;
use crate::scheduler::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("OperatorError: {0}")]
    Operator(#[from] ProbabilityOutOfRangeError),
    #[error("EmptyPopulation: {0}")]
    EmptyPopulation(&'static str),
}
