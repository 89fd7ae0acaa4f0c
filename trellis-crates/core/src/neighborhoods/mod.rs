//! Candidate generation for local search.
//!
//! A [`Neighborhood`] serves a finite sequence of [`SolverSolution`]s "near" an initial solution.
//! Neighborhoods compose: a [`UnifiedNeighborhood`] concatenates several of them, a
//! [`RandomizedNeighborhood`] serves one in shuffled order, and a
//! [`WeightedRandomizedNeighborhood`] interleaves several according to their weights. Every
//! neighborhood reports which leaf neighborhood produced the most recently served neighbor through
//! [`Neighborhood::last_selected`].
mod randomized;
mod simple;
mod unified;
mod weighted;

use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;

pub use randomized::RandomizedNeighborhood;
pub use simple::SimpleNeighborhood;
pub use unified::UnifiedNeighborhood;
pub use weighted::WeightedRandomizedNeighborhood;

use crate::basic_types::Random;
use crate::basic_types::SolverSolution;

/// The leaf neighborhood and the offset within it which produced a neighbor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Selection {
    pub neighborhood: String,
    pub offset: usize,
}

impl Display for Selection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.neighborhood, self.offset)
    }
}

pub trait Neighborhood: Debug {
    fn name(&self) -> &str;

    /// Sets the solution around which neighbors are generated. Randomised neighborhoods draw their
    /// order from `random` here.
    fn set_initial_solution(&mut self, initial: &SolverSolution, random: &mut dyn Random);

    /// The number of neighbors of the current initial solution.
    fn size(&self) -> usize;

    /// Returns the neighbor at `offset`, or [`None`] if `offset >= self.size()`. A served neighbor
    /// becomes the [`Neighborhood::last_selected`] one.
    fn neighbor(&mut self, offset: usize) -> Option<SolverSolution>;

    /// The provenance of the most recently served neighbor.
    fn last_selected(&self) -> Option<Selection>;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl<N: Neighborhood + ?Sized> Neighborhood for Box<N> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn set_initial_solution(&mut self, initial: &SolverSolution, random: &mut dyn Random) {
        self.as_mut().set_initial_solution(initial, random)
    }

    fn size(&self) -> usize {
        self.as_ref().size()
    }

    fn neighbor(&mut self, offset: usize) -> Option<SolverSolution> {
        self.as_mut().neighbor(offset)
    }

    fn last_selected(&self) -> Option<Selection> {
        self.as_ref().last_selected()
    }
}
