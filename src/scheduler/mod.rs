mod config;
mod island;

pub use config::{ConfigError, FitnessPredictorConfig};
pub use island::FitnessPredictorIsland;
