use super::Fitness;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Defines the optimization direction and optional convergence threshold of a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FitnessGoal {
    /// Lower fitness is better. Converged when fitness drops to or below the threshold.
    Minimize { threshold: Option<f64> },
    /// Higher fitness is better. Converged when fitness reaches or exceeds the threshold.
    Maximize { threshold: Option<f64> },
}

#[derive(Debug, thiserror::Error)]
#[error("fitness goal threshold must be finite, got {0}")]
pub struct InvalidThreshold(f64);

impl FitnessGoal {
    /// Minimization without a convergence threshold.
    pub fn minimize() -> Self {
        Self::Minimize { threshold: None }
    }

    /// Maximization without a convergence threshold.
    pub fn maximize() -> Self {
        Self::Maximize { threshold: None }
    }

    /// Minimization that is considered converged at `threshold`.
    pub fn minimize_to(threshold: f64) -> Result<Self, InvalidThreshold> {
        let threshold = Self::validate(threshold)?;

        Ok(Self::Minimize {
            threshold: Some(threshold),
        })
    }

    /// Maximization that is considered converged at `threshold`.
    pub fn maximize_to(threshold: f64) -> Result<Self, InvalidThreshold> {
        let threshold = Self::validate(threshold)?;

        Ok(Self::Maximize {
            threshold: Some(threshold),
        })
    }

    /// Returns `true` when `lhs` is strictly better than `rhs`.
    ///
    /// An undefined fitness is never better than anything, and any defined fitness is
    /// better than an undefined one.
    pub fn is_better(&self, lhs: Fitness, rhs: Fitness) -> bool {
        match (lhs, rhs) {
            (Fitness::Undefined, _) => false,
            (Fitness::Value(_), Fitness::Undefined) => true,
            (Fitness::Value(lhs), Fitness::Value(rhs)) => match self {
                Self::Minimize { .. } => lhs < rhs,
                Self::Maximize { .. } => lhs > rhs,
            },
        }
    }

    /// Returns `true` when `lhs` is better than or equal to `rhs`. Undefined never qualifies.
    pub fn is_at_least_as_good(&self, lhs: Fitness, rhs: Fitness) -> bool {
        match (lhs, rhs) {
            (Fitness::Undefined, _) => false,
            (Fitness::Value(_), Fitness::Undefined) => true,
            (Fitness::Value(lhs), Fitness::Value(rhs)) => match self {
                Self::Minimize { .. } => lhs <= rhs,
                Self::Maximize { .. } => lhs >= rhs,
            },
        }
    }

    /// Checks if the given fitness value has reached the goal threshold.
    /// Always `false` without a threshold or for an undefined fitness.
    #[instrument(level = "debug", skip(self), fields(goal = ?self))]
    pub fn is_reached(&self, fitness: Fitness) -> bool {
        let Fitness::Value(fitness) = fitness else {
            return false;
        };

        match self {
            Self::Minimize {
                threshold: Some(threshold),
            } => fitness <= *threshold,
            Self::Maximize {
                threshold: Some(threshold),
            } => fitness >= *threshold,
            _ => false,
        }
    }

    fn validate(threshold: f64) -> Result<f64, InvalidThreshold> {
        if !threshold.is_finite() {
            return Err(InvalidThreshold(threshold));
        }

        Ok(threshold)
    }
}

impl Default for FitnessGoal {
    fn default() -> Self {
        Self::minimize()
    }
}
