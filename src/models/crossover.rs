use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Combines two parent chromosomes into two offspring chromosomes.
///
/// The first offspring is derived from `lhs` and the second from `rhs`; deterministic
/// crowding relies on that pairing when deciding which parent an offspring competes with.
pub trait Recombination<C> {
    fn recombine<R: Rng>(&self, rng: &mut R, lhs: &C, rhs: &C) -> (C, C);
}

/// Performs uniform crossover, taking each gene of the first child from `lhs` with the
/// given probability. The second child receives the complementary genes.
fn crossover_uniform<T: Clone, R: Rng>(
    rng: &mut R,
    lhs: &[T],
    rhs: &[T],
    probability: f64,
) -> (Vec<T>, Vec<T>) {
    lhs.iter()
        .zip(rhs.iter())
        .map(|(lhs, rhs)| {
            if rng.random_bool(probability) {
                (lhs.clone(), rhs.clone())
            } else {
                (rhs.clone(), lhs.clone())
            }
        })
        .unzip()
}

/// Performs single-point crossover at the specified cut point, swapping the tails.
fn crossover_single_point<T: Clone>(lhs: &[T], rhs: &[T], point: usize) -> (Vec<T>, Vec<T>) {
    let mut first = Vec::with_capacity(lhs.len());
    first.extend_from_slice(&lhs[..point]);
    first.extend_from_slice(&rhs[point..]);

    let mut second = Vec::with_capacity(rhs.len());
    second.extend_from_slice(&rhs[..point]);
    second.extend_from_slice(&lhs[point..]);

    (first, second)
}

/// Crossover strategy over fixed-length value sequences.
///
/// ```rust
/// use fx_fitness_predictors::models::Crossover;
///
/// // Swap tails at a random cut point
/// let single_point = Crossover::single_point();
///
/// // Mix genes position by position, 60% from the first parent
/// let uniform = Crossover::uniform(0.6)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub enum Crossover {
    /// Each gene of the first child comes from the first parent with `probability`.
    Uniform { probability: f64 },
    /// Cuts both parents at a random point in `1..len` and swaps the tails.
    ///
    /// Chromosomes shorter than two genes have no interior cut point and are copied.
    SinglePoint,
}

/// Error returned when an operator probability lies outside [0.0, 1.0].
#[derive(Debug, thiserror::Error)]
#[error("{name} must be between 0.0 and 1.0, got {value}")]
pub struct ProbabilityOutOfRangeError {
    pub(crate) name: &'static str,
    pub(crate) value: f64,
}

impl ProbabilityOutOfRangeError {
    pub(crate) fn check(name: &'static str, value: f64) -> Result<f64, Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(Self { name, value });
        }

        Ok(value)
    }
}

impl Crossover {
    /// Creates a uniform crossover strategy. Fails when `probability` is outside [0.0, 1.0].
    pub fn uniform(probability: f64) -> Result<Self, ProbabilityOutOfRangeError> {
        let probability =
            ProbabilityOutOfRangeError::check("uniform crossover probability", probability)?;

        Ok(Self::Uniform { probability })
    }

    pub fn single_point() -> Self {
        Self::SinglePoint
    }
}

impl<T: Clone> Recombination<Vec<T>> for Crossover {
    #[instrument(
        level = "debug",
        skip(self, rng, lhs, rhs),
        fields(crossover_type = ?self, genome_length = lhs.len())
    )]
    fn recombine<R: Rng>(&self, rng: &mut R, lhs: &Vec<T>, rhs: &Vec<T>) -> (Vec<T>, Vec<T>) {
        match self {
            Self::Uniform { probability } => crossover_uniform(rng, lhs, rhs, *probability),
            Self::SinglePoint => {
                let length = lhs.len().min(rhs.len());
                if length < 2 {
                    return (lhs.clone(), rhs.clone());
                }
                let point = rng.random_range(1..length); // Cut point
                crossover_single_point(lhs, rhs, point)
            }
        }
    }
}
