use std::fmt::Debug;
use std::fmt::Formatter;

use super::Neighborhood;
use super::Selection;
use crate::basic_types::Random;
use crate::basic_types::SolverSolution;

type Generator = Box<dyn Fn(&SolverSolution) -> Vec<SolverSolution>>;

/// A list of neighbors, either fixed or generated from each initial solution.
pub struct SimpleNeighborhood {
    name: String,
    neighbors: Vec<SolverSolution>,
    generator: Option<Generator>,
    last_selected: Option<usize>,
}

impl SimpleNeighborhood {
    pub fn new(name: impl Into<String>, neighbors: Vec<SolverSolution>) -> Self {
        SimpleNeighborhood {
            name: name.into(),
            neighbors,
            generator: None,
            last_selected: None,
        }
    }

    /// A neighborhood whose neighbors are computed by `generator` whenever the initial solution is
    /// set. It is empty until then.
    pub fn generated(
        name: impl Into<String>,
        generator: impl Fn(&SolverSolution) -> Vec<SolverSolution> + 'static,
    ) -> Self {
        SimpleNeighborhood {
            name: name.into(),
            neighbors: vec![],
            generator: Some(Box::new(generator)),
            last_selected: None,
        }
    }

    pub fn neighbors(&self) -> &[SolverSolution] {
        &self.neighbors
    }
}

impl Debug for SimpleNeighborhood {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleNeighborhood")
            .field("name", &self.name)
            .field("size", &self.neighbors.len())
            .field("generated", &self.generator.is_some())
            .field("last_selected", &self.last_selected)
            .finish()
    }
}

impl Neighborhood for SimpleNeighborhood {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_initial_solution(&mut self, initial: &SolverSolution, _: &mut dyn Random) {
        if let Some(generator) = &self.generator {
            self.neighbors = generator(initial);
        }
        self.last_selected = None;
    }

    fn size(&self) -> usize {
        self.neighbors.len()
    }

    fn neighbor(&mut self, offset: usize) -> Option<SolverSolution> {
        let neighbor = self.neighbors.get(offset)?.clone();
        self.last_selected = Some(offset);
        Some(neighbor)
    }

    fn last_selected(&self) -> Option<Selection> {
        self.last_selected.map(|offset| Selection {
            neighborhood: self.name.clone(),
            offset,
        })
    }
}
