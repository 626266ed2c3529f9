use super::ValueGenerator;
use rand::Rng;
use tracing::instrument;

/// Produces a mutated copy of a chromosome.
pub trait Mutation<C> {
    fn mutate<R: Rng>(&self, rng: &mut R, chromosome: &C) -> C;
}

/// Replaces one randomly chosen gene with a freshly generated value.
#[derive(Debug, Clone)]
pub struct SinglePointMutation<G> {
    value_generator: G,
}

impl<G> SinglePointMutation<G> {
    pub fn new(value_generator: G) -> Self {
        Self { value_generator }
    }
}

impl<T: Clone, G: ValueGenerator<T>> Mutation<Vec<T>> for SinglePointMutation<G> {
    #[instrument(
        level = "debug",
        skip(self, rng, chromosome),
        fields(genome_length = chromosome.len())
    )]
    fn mutate<R: Rng>(&self, rng: &mut R, chromosome: &Vec<T>) -> Vec<T> {
        let mut mutated = chromosome.clone();
        if mutated.is_empty() {
            return mutated;
        }

        let position = rng.random_range(0..mutated.len());
        mutated[position] = self.value_generator.random_value(rng);
        mutated
    }
}
