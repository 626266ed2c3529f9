//! Deterministic crowding.
//!
//! Each generation pairs up the population at random, breeds two offspring per pair and
//! lets every offspring compete against the single parent it was derived from. The
//! offspring takes the parent's slot when its fitness is at least as good; otherwise the
//! parent survives. There is no population-wide tournament, so distinct niches of the
//! population survive side by side.

use super::{Evaluation, EvolutionaryAlgorithm};
use crate::models::{
    FitnessFunction, FitnessGoal, Individual, Mutation, ProbabilityOutOfRangeError, Recombination,
};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::instrument;

/// Replaces each parent by its offspring when the offspring is at least as fit.
///
/// `offspring` pairs each child with the index of the parent it was derived from.
/// Returns the number of replacements.
pub(crate) fn crowd<C>(
    goal: &FitnessGoal,
    population: &mut [Individual<C>],
    offspring: Vec<(usize, Individual<C>)>,
) -> usize {
    let mut replaced = 0;

    for (parent_index, child) in offspring {
        let parent = &population[parent_index];
        if goal.is_at_least_as_good(child.fitness_or_undefined(), parent.fitness_or_undefined()) {
            population[parent_index] = child;
            replaced += 1;
        }
    }

    replaced
}

/// Evolutionary algorithm using random mating and deterministic crowding replacement.
#[derive(Debug, Clone)]
pub struct DeterministicCrowding<F, X, M> {
    evaluation: Evaluation<F>,
    crossover: X,
    mutation: M,
    crossover_probability: f64,
    mutation_probability: f64,
    goal: FitnessGoal,
}

impl<F, X, M> DeterministicCrowding<F, X, M> {
    /// Creates the algorithm.
    ///
    /// `crossover_probability` applies once per mating pair, `mutation_probability` once
    /// per offspring. Both must lie in [0.0, 1.0].
    pub fn new(
        fitness_function: F,
        crossover: X,
        mutation: M,
        crossover_probability: f64,
        mutation_probability: f64,
        goal: FitnessGoal,
    ) -> Result<Self, ProbabilityOutOfRangeError> {
        let crossover_probability =
            ProbabilityOutOfRangeError::check("crossover probability", crossover_probability)?;
        let mutation_probability =
            ProbabilityOutOfRangeError::check("mutation probability", mutation_probability)?;

        Ok(Self {
            evaluation: Evaluation::new(fitness_function),
            crossover,
            mutation,
            crossover_probability,
            mutation_probability,
            goal,
        })
    }

    fn maybe_mutate<C, R: Rng>(&self, rng: &mut R, child: Individual<C>) -> Individual<C>
    where
        M: Mutation<C>,
    {
        if rng.random_bool(self.mutation_probability) {
            Individual::new(self.mutation.mutate(rng, child.chromosome()))
        } else {
            child
        }
    }

    /// Breeds one offspring per population member, each tagged with its parent's index.
    fn breed<C, R: Rng>(
        &self,
        rng: &mut R,
        population: &[Individual<C>],
    ) -> (Vec<usize>, Vec<Individual<C>>)
    where
        C: Clone,
        X: Recombination<C>,
        M: Mutation<C>,
    {
        let mut order: Vec<usize> = (0..population.len()).collect();
        order.shuffle(rng);

        let mut parents = Vec::with_capacity(population.len());
        let mut children = Vec::with_capacity(population.len());

        for pair in order.chunks(2) {
            if let &[lhs, rhs] = pair {
                let (child_lhs, child_rhs) = if rng.random_bool(self.crossover_probability) {
                    let (lhs_chromosome, rhs_chromosome) = self.crossover.recombine(
                        rng,
                        population[lhs].chromosome(),
                        population[rhs].chromosome(),
                    );
                    (Individual::new(lhs_chromosome), Individual::new(rhs_chromosome))
                } else {
                    (population[lhs].offspring(), population[rhs].offspring())
                };

                parents.push(lhs);
                children.push(self.maybe_mutate(rng, child_lhs));
                parents.push(rhs);
                children.push(self.maybe_mutate(rng, child_rhs));
            } else {
                // Odd one out has no mate
                let index = pair[0];
                parents.push(index);
                children.push(self.maybe_mutate(rng, population[index].offspring()));
            }
        }

        (parents, children)
    }
}

impl<C, F, X, M> EvolutionaryAlgorithm<C> for DeterministicCrowding<F, X, M>
where
    C: Clone,
    F: FitnessFunction<C>,
    X: Recombination<C>,
    M: Mutation<C>,
{
    type Fitness = F;

    #[instrument(
        level = "debug",
        skip(self, rng, population),
        fields(population_size = population.len())
    )]
    fn generational_step<R: Rng>(&mut self, rng: &mut R, population: &mut [Individual<C>]) {
        self.evaluation.evaluate(population);

        let (parents, mut children) = self.breed(rng, population);
        self.evaluation.evaluate(&mut children);

        let replaced = crowd(&self.goal, population, parents.into_iter().zip(children).collect());
        tracing::debug!(replaced, "Deterministic crowding complete");
    }

    fn evaluation(&self) -> &Evaluation<F> {
        &self.evaluation
    }

    fn evaluation_mut(&mut self) -> &mut Evaluation<F> {
        &mut self.evaluation
    }

    fn goal(&self) -> &FitnessGoal {
        &self.goal
    }
}
