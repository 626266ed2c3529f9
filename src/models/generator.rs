use rand::Rng;
use tracing::instrument;

/// Produces whole chromosomes for the initial population of an island.
pub trait Generator<C> {
    fn generate<R: Rng>(&self, rng: &mut R) -> C;
}

/// Produces a single random gene value.
pub trait ValueGenerator<T> {
    fn random_value<R: Rng>(&self, rng: &mut R) -> T;
}

/// Generates fixed-length chromosomes by drawing every gene from a [`ValueGenerator`].
#[derive(Debug, Clone)]
pub struct MultipleValueGenerator<G> {
    value_generator: G,
    length: usize,
}

impl<G> MultipleValueGenerator<G> {
    pub fn new(value_generator: G, length: usize) -> Self {
        Self {
            value_generator,
            length,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl<T, G: ValueGenerator<T>> Generator<Vec<T>> for MultipleValueGenerator<G> {
    #[instrument(level = "debug", skip(self, rng), fields(length = self.length))]
    fn generate<R: Rng>(&self, rng: &mut R) -> Vec<T> {
        (0..self.length)
            .map(|_| self.value_generator.random_value(rng))
            .collect()
    }
}

/// Builds `size` chromosomes from a generator.
pub(crate) fn random_population<C, G: Generator<C>, R: Rng>(
    generator: &G,
    size: usize,
    rng: &mut R,
) -> Vec<C> {
    let mut chromosomes = Vec::with_capacity(size);

    for _ in 0..size {
        chromosomes.push(generator.generate(rng));
    }

    chromosomes
}
