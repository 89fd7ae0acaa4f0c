use log::debug;

use super::Neighborhood;
use super::Selection;
use crate::basic_types::Random;
use crate::basic_types::SolverSolution;

/// Serves the neighbors of another neighborhood in a shuffled order.
///
/// The order is a uniformly random permutation of the offsets of the wrapped neighborhood, drawn
/// again whenever the initial solution changes.
#[derive(Debug)]
pub struct RandomizedNeighborhood<N> {
    name: String,
    inner: N,
    permutation: Vec<usize>,
}

impl<N: Neighborhood> RandomizedNeighborhood<N> {
    /// Wraps `inner`; until the first initial solution is set the neighbors are served in their
    /// original order.
    pub fn new(name: impl Into<String>, inner: N) -> Self {
        let permutation = (0..inner.size()).collect();
        RandomizedNeighborhood {
            name: name.into(),
            inner,
            permutation,
        }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    /// The offset of the wrapped neighborhood served at `offset`.
    pub fn permuted(&self, offset: usize) -> Option<usize> {
        self.permutation.get(offset).copied()
    }
}

impl<N: Neighborhood> Neighborhood for RandomizedNeighborhood<N> {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_initial_solution(&mut self, initial: &SolverSolution, random: &mut dyn Random) {
        self.inner.set_initial_solution(initial, random);
        self.permutation = random.generate_permutation(self.inner.size());
        debug!(
            "Shuffled the {} neighbor(s) of '{}'",
            self.permutation.len(),
            self.name
        );
    }

    fn size(&self) -> usize {
        self.permutation.len()
    }

    fn neighbor(&mut self, offset: usize) -> Option<SolverSolution> {
        let inner_offset = self.permuted(offset)?;
        self.inner.neighbor(inner_offset)
    }

    fn last_selected(&self) -> Option<Selection> {
        self.inner.last_selected()
    }
}
