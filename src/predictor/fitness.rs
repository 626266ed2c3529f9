use crate::models::{Fitness, FitnessFunction, Individual, TrainingData, TrainingDataFitness, mean};
use std::sync::Arc;
use tracing::instrument;

/// A main-population individual used to calibrate predictors, together with its
/// fitness on the full training data.
#[derive(Debug, Clone)]
pub struct Trainer<C> {
    individual: Individual<C>,
    true_fitness: Fitness,
}

impl<C> Trainer<C> {
    pub fn individual(&self) -> &Individual<C> {
        &self.individual
    }

    /// Fitness on the full training data, computed when the trainer was added.
    pub fn true_fitness(&self) -> Fitness {
        self.true_fitness
    }
}

/// Scores predictor genomes (index subsets of the full training data) by how closely the
/// subset reproduces the true fitness of every trainer.
///
/// The fitness is the mean absolute difference between a trainer's fitness on the subset
/// and its fitness on the full data, so lower is better. Every trainer scored on a subset
/// costs one point evaluation per row of that subset; the cumulative cost is reported by
/// [`PredictorFitnessFunction::point_eval_count`].
#[derive(Debug)]
pub struct PredictorFitnessFunction<C, F>
where
    F: TrainingDataFitness<C>,
{
    full_training_data: Arc<F::Data>,
    baseline: F,
    subset: F,
    trainers: Vec<Trainer<C>>,
    point_eval_count: u64,
    eval_count: u64,
}

impl<C, F> PredictorFitnessFunction<C, F>
where
    C: Clone,
    F: TrainingDataFitness<C> + Clone,
{
    /// Creates the function from a copy of the main fitness function and registers the
    /// given individuals as initial trainers.
    #[instrument(level = "debug", skip_all, fields(full_data_size = full_training_data.len()))]
    pub fn new<'a>(
        full_training_data: Arc<F::Data>,
        fitness_function: &F,
        trainers: impl IntoIterator<Item = &'a Individual<C>>,
    ) -> Self
    where
        C: 'a,
    {
        let mut baseline = fitness_function.clone();
        baseline.set_training_data(full_training_data.as_ref().clone());

        let mut function = Self {
            full_training_data,
            baseline,
            subset: fitness_function.clone(),
            trainers: Vec::new(),
            point_eval_count: 0,
            eval_count: 0,
        };

        for trainer in trainers {
            function.add_trainer(trainer);
        }

        function
    }

    /// Registers an independent copy of `individual` as a trainer.
    #[instrument(
        level = "debug",
        skip_all,
        fields(trainer_id = %individual.id(), trainer_count = self.trainers.len() + 1)
    )]
    pub fn add_trainer(&mut self, individual: &Individual<C>) {
        let true_fitness = self.baseline.evaluate(individual.chromosome());

        self.trainers.push(Trainer {
            individual: individual.clone(),
            true_fitness,
        });
    }

    /// Fitness `individual` would receive when evaluated on the rows named by `predictor`.
    ///
    /// Leaves the trainers and the individual's cached fitness untouched. The rows touched
    /// are added to the point evaluation count.
    pub fn predict_fitness_for_trainer(
        &mut self,
        predictor: &[usize],
        individual: &Individual<C>,
    ) -> Fitness {
        self.use_subset(predictor);
        self.point_eval_count += predictor.len() as u64;

        self.subset.evaluate(individual.chromosome())
    }

    pub fn trainers(&self) -> &[Trainer<C>] {
        &self.trainers
    }

    /// Cumulative number of data rows touched while scoring trainers on subsets.
    pub fn point_eval_count(&self) -> u64 {
        self.point_eval_count
    }

    fn use_subset(&mut self, predictor: &[usize]) {
        self.subset.set_training_data(self.full_training_data.subset(predictor));
    }
}

impl<C, F> FitnessFunction<Vec<usize>> for PredictorFitnessFunction<C, F>
where
    C: Clone,
    F: TrainingDataFitness<C> + Clone,
{
    #[instrument(
        level = "debug",
        skip_all,
        fields(predictor_size = predictor.len(), trainer_count = self.trainers.len())
    )]
    fn evaluate(&mut self, predictor: &Vec<usize>) -> Fitness {
        self.use_subset(predictor);

        let errors: Vec<Fitness> = self
            .trainers
            .iter()
            .map(|trainer| {
                let predicted = self.subset.evaluate(trainer.individual.chromosome());
                match (predicted, trainer.true_fitness) {
                    (Fitness::Value(predicted), Fitness::Value(actual)) => {
                        Fitness::new((actual - predicted).abs())
                    }
                    _ => Fitness::Undefined,
                }
            })
            .collect();

        self.point_eval_count += (predictor.len() * self.trainers.len()) as u64;
        self.eval_count += 1;

        mean(&errors)
    }

    fn eval_count(&self) -> u64 {
        self.eval_count
    }
}
