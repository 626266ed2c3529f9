/// Indexable collection of labeled rows that a fitness function is evaluated against.
pub trait TrainingData: Clone {
    /// Number of rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows at `indices`, in that order. Indices may repeat.
    ///
    /// Callers guarantee every index is below [`TrainingData::len`].
    fn subset(&self, indices: &[usize]) -> Self;
}

impl<T: Clone> TrainingData for Vec<T> {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn subset(&self, indices: &[usize]) -> Self {
        indices.iter().map(|&index| self[index].clone()).collect()
    }
}
