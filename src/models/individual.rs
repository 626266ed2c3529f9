use super::Fitness;
use uuid::Uuid;

/// A member of a population: a chromosome plus its cached fitness.
///
/// The identity is minted when the individual is generated or bred and is kept by
/// `Clone`, so a snapshot of an individual (e.g. a trainer) can be traced back to the
/// population member it was taken from.
#[derive(Debug, Clone)]
pub struct Individual<C> {
    id: Uuid,
    chromosome: C,
    fitness: Option<Fitness>,
}

impl<C> Individual<C> {
    /// Creates an individual with a fresh identity and invalid fitness.
    pub fn new(chromosome: C) -> Self {
        Self {
            id: Uuid::now_v7(),
            chromosome,
            fitness: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chromosome(&self) -> &C {
        &self.chromosome
    }

    /// Cached fitness, `None` while the fitness is invalid.
    pub fn fitness(&self) -> Option<Fitness> {
        self.fitness
    }

    /// Cached fitness, treating an invalid one as undefined for comparisons.
    pub fn fitness_or_undefined(&self) -> Fitness {
        self.fitness.unwrap_or(Fitness::Undefined)
    }

    pub fn is_fitness_valid(&self) -> bool {
        self.fitness.is_some()
    }

    pub fn set_fitness(&mut self, fitness: Fitness) {
        self.fitness = Some(fitness);
    }

    /// Marks the cached fitness as stale so the next evaluation recomputes it.
    pub fn invalidate_fitness(&mut self) {
        self.fitness = None;
    }

    /// Returns `true` when both refer to the same population member, regardless of value.
    pub fn is_same(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C: Clone> Individual<C> {
    /// Copies this individual under a new identity, keeping the cached fitness.
    ///
    /// Used for offspring that were not altered by any operator.
    pub fn offspring(&self) -> Self {
        Self {
            id: Uuid::now_v7(),
            chromosome: self.chromosome.clone(),
            fitness: self.fitness,
        }
    }
}

/// Marks every individual's fitness as stale.
pub fn invalidate_all<C>(population: &mut [Individual<C>]) {
    for individual in population.iter_mut() {
        individual.invalidate_fitness();
    }
}
