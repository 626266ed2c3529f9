use crate::models::ValueGenerator;
use rand::Rng;

/// Draws uniform row indices in `[0, full_data_size)`.
///
/// Only used to build predictor genomes of positive length, which requires a
/// non-empty data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexGenerator {
    full_data_size: usize,
}

impl IndexGenerator {
    pub fn new(full_data_size: usize) -> Self {
        Self { full_data_size }
    }

    pub fn full_data_size(&self) -> usize {
        self.full_data_size
    }
}

impl ValueGenerator<usize> for IndexGenerator {
    fn random_value<R: Rng>(&self, rng: &mut R) -> usize {
        rng.random_range(0..self.full_data_size)
    }
}
