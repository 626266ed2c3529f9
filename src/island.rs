use crate::Error;
use crate::algorithms::EvolutionaryAlgorithm;
use crate::models::{Fitness, FitnessGoal, Generator, Individual, invalidate_all, random_population};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::instrument;

/// Returns the fittest individual under `goal`, or `None` for an empty population.
///
/// Ties keep the earliest individual. Individuals with invalid or undefined fitness
/// never displace anyone, so the first individual is returned when nothing is defined.
pub(crate) fn best_of<'a, C>(
    goal: &FitnessGoal,
    population: &'a [Individual<C>],
) -> Option<&'a Individual<C>> {
    population.iter().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(best) => {
            if goal.is_better(candidate.fitness_or_undefined(), best.fitness_or_undefined()) {
                Some(candidate)
            } else {
                Some(best)
            }
        }
    })
}

/// Outcome of [`EvolutionaryLoop::evolve_until_convergence`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceReport {
    pub converged: bool,
    /// Generational steps executed by this call.
    pub generations: u64,
    pub best_fitness: Option<Fitness>,
}

/// A population advanced one generation at a time.
pub trait EvolutionaryLoop<C> {
    /// Advances the population by one generation and increments the generational age.
    fn execute_generational_step(&mut self) -> Result<(), Error>;

    /// Evaluates every individual whose fitness is invalid.
    fn evaluate_population(&mut self);

    /// The fittest individual, `None` when the population is empty.
    fn best_individual(&self) -> Option<&Individual<C>>;

    fn population(&self) -> &[Individual<C>];

    /// Number of generational steps executed so far.
    fn generational_age(&self) -> u64;

    /// Executes `num_generations` generational steps.
    fn evolve(&mut self, num_generations: u64) -> Result<(), Error> {
        for _ in 0..num_generations {
            self.execute_generational_step()?;
        }

        Ok(())
    }

    /// Steps until the best individual reaches the threshold of `goal` or
    /// `max_generations` steps have been executed.
    fn evolve_until_convergence(
        &mut self,
        max_generations: u64,
        goal: &FitnessGoal,
    ) -> Result<ConvergenceReport, Error> {
        self.evaluate_population();
        let best_fitness =
            |this: &Self| this.best_individual().map(|best| best.fitness_or_undefined());

        let mut generations = 0;
        let mut converged = best_fitness(&*self).is_some_and(|fitness| goal.is_reached(fitness));

        while !converged && generations < max_generations {
            self.execute_generational_step()?;
            generations += 1;
            converged = best_fitness(&*self).is_some_and(|fitness| goal.is_reached(fitness));
        }

        Ok(ConvergenceReport {
            converged,
            generations,
            best_fitness: best_fitness(&*self),
        })
    }
}

/// A single population evolved by an [`EvolutionaryAlgorithm`].
#[derive(Debug)]
pub struct Island<C, A, G> {
    algorithm: A,
    generator: G,
    population: Vec<Individual<C>>,
    generational_age: u64,
    rng: StdRng,
}

impl<C, A, G> Island<C, A, G>
where
    A: EvolutionaryAlgorithm<C>,
    G: Generator<C>,
{
    /// Generates a population of `population_size` individuals. Fitness stays invalid
    /// until the first evaluation. Passing a seed makes the island reproducible.
    #[instrument(level = "debug", skip(algorithm, generator))]
    pub fn new(algorithm: A, generator: G, population_size: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let population = random_population(&generator, population_size, &mut rng)
            .into_iter()
            .map(Individual::new)
            .collect();

        Self {
            algorithm,
            generator,
            population,
            generational_age: 0,
            rng,
        }
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn fitness_function(&self) -> &A::Fitness {
        self.algorithm.evaluation().fitness_function()
    }

    pub fn fitness_function_mut(&mut self) -> &mut A::Fitness {
        self.algorithm.evaluation_mut().fitness_function_mut()
    }

    /// Marks every individual's fitness as stale.
    pub fn invalidate_population(&mut self) {
        invalidate_all(&mut self.population);
    }
}

impl<C, A, G> EvolutionaryLoop<C> for Island<C, A, G>
where
    A: EvolutionaryAlgorithm<C>,
    G: Generator<C>,
{
    #[instrument(level = "debug", skip(self), fields(generational_age = self.generational_age + 1))]
    fn execute_generational_step(&mut self) -> Result<(), Error> {
        self.algorithm
            .generational_step(&mut self.rng, &mut self.population);
        self.generational_age += 1;

        Ok(())
    }

    fn evaluate_population(&mut self) {
        self.algorithm
            .evaluation_mut()
            .evaluate(&mut self.population);
    }

    fn best_individual(&self) -> Option<&Individual<C>> {
        best_of(self.algorithm.goal(), &self.population)
    }

    fn population(&self) -> &[Individual<C>] {
        &self.population
    }

    fn generational_age(&self) -> u64 {
        self.generational_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::DeterministicCrowding;
    use crate::models::{
        Crossover, FitnessFunction, MultipleValueGenerator, SinglePointMutation, ValueGenerator,
    };
    use rand::Rng;

    #[derive(Clone)]
    struct Bit;

    impl ValueGenerator<u8> for Bit {
        fn random_value<R: Rng>(&self, rng: &mut R) -> u8 {
            rng.random_range(0..2)
        }
    }

    /// Counts zeros; minimizing it drives the population towards all ones.
    #[derive(Default)]
    struct CountZeros {
        evaluations: u64,
    }

    impl FitnessFunction<Vec<u8>> for CountZeros {
        fn evaluate(&mut self, chromosome: &Vec<u8>) -> Fitness {
            self.evaluations += 1;
            Fitness::new(chromosome.iter().filter(|&&b| b == 0).count() as f64)
        }

        fn eval_count(&self) -> u64 {
            self.evaluations
        }
    }

    type OneMaxIsland = Island<
        Vec<u8>,
        DeterministicCrowding<CountZeros, Crossover, SinglePointMutation<Bit>>,
        MultipleValueGenerator<Bit>,
    >;

    fn one_max_island(population_size: usize) -> OneMaxIsland {
        let algorithm = DeterministicCrowding::new(
            CountZeros::default(),
            Crossover::single_point(),
            SinglePointMutation::new(Bit),
            0.5,
            0.2,
            FitnessGoal::minimize(),
        )
        .expect("probabilities are in range");

        Island::new(algorithm, MultipleValueGenerator::new(Bit, 16), population_size, Some(42))
    }

    fn evaluated(fitness: Fitness) -> Individual<()> {
        let mut individual = Individual::new(());
        individual.set_fitness(fitness);
        individual
    }

    #[test]
    fn it_picks_the_best_individual() {
        let population = vec![
            evaluated(Fitness::Value(3.0)),
            evaluated(Fitness::Value(1.0)),
            evaluated(Fitness::Undefined),
            evaluated(Fitness::Value(1.0)),
        ];

        let best = best_of(&FitnessGoal::minimize(), &population).unwrap();
        assert!(best.is_same(&population[1]));

        let best = best_of(&FitnessGoal::maximize(), &population).unwrap();
        assert!(best.is_same(&population[0]));
    }

    #[test]
    fn it_falls_back_to_the_first_individual_when_nothing_is_defined() {
        let population = vec![evaluated(Fitness::Undefined), evaluated(Fitness::Undefined)];
        let best = best_of(&FitnessGoal::minimize(), &population).unwrap();
        assert!(best.is_same(&population[0]));
    }

    #[test]
    fn it_returns_none_for_an_empty_population() {
        let island = one_max_island(0);
        assert!(island.best_individual().is_none());
        assert!(island.population().is_empty());
    }

    #[test]
    fn it_steps_an_empty_population() {
        let mut island = one_max_island(0);
        island.execute_generational_step().unwrap();
        assert_eq!(island.generational_age(), 1);
    }

    #[test]
    fn it_increments_generational_age_once_per_step() {
        let mut island = one_max_island(10);
        assert_eq!(island.generational_age(), 0);

        island.evolve(5).unwrap();

        assert_eq!(island.generational_age(), 5);
        assert_eq!(island.population().len(), 10);
    }

    #[test]
    fn it_evaluates_idempotently() {
        let mut island = one_max_island(10);
        island.evaluate_population();

        island.invalidate_population();
        island.evaluate_population();
        let first: Vec<_> = island.population().iter().map(|i| i.fitness()).collect();

        island.invalidate_population();
        island.evaluate_population();
        let second: Vec<_> = island.population().iter().map(|i| i.fitness()).collect();

        assert_eq!(first, second);
        assert!(first.iter().all(|f| f.is_some()));
    }

    #[test]
    fn it_evolves_until_convergence() {
        let mut island = one_max_island(20);
        let goal = FitnessGoal::minimize_to(0.0).unwrap();

        let report = island.evolve_until_convergence(2_000, &goal).unwrap();

        assert!(report.converged);
        assert_eq!(report.best_fitness, Some(Fitness::Value(0.0)));
        assert_eq!(report.generations, island.generational_age());
    }

    #[test]
    fn it_stops_at_max_generations() {
        let mut island = one_max_island(4);
        let goal = FitnessGoal::minimize_to(-1.0).unwrap();

        let report = island.evolve_until_convergence(3, &goal).unwrap();

        assert!(!report.converged);
        assert_eq!(report.generations, 3);
    }
}
