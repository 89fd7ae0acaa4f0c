use log::debug;

use super::Neighborhood;
use super::Selection;
use crate::basic_types::Random;
use crate::basic_types::SolverSolution;

/// Interleaves several neighborhoods, drawing from each with a probability proportional to its
/// weight.
///
/// When the initial solution is set, the complete draw sequence is computed: at every position a
/// child is drawn according to the normalised weights of the children which still have unserved
/// neighbors, and its next neighbor (in the child's own order) takes that position. A child which
/// runs out of neighbors gets weight zero and the remaining weights are normalised again.
#[derive(Debug)]
pub struct WeightedRandomizedNeighborhood {
    name: String,
    children: Vec<Box<dyn Neighborhood>>,
    weights: Vec<f64>,
    /// The child and the offset within it of every position.
    draws: Vec<(usize, usize)>,
    last_selected: Option<usize>,
}

impl WeightedRandomizedNeighborhood {
    /// Creates the neighborhood; negative weights are treated as zero. It is empty until the
    /// initial solution is set.
    pub fn new(name: impl Into<String>, children: Vec<(Box<dyn Neighborhood>, f64)>) -> Self {
        let (children, weights) = children
            .into_iter()
            .map(|(child, weight)| (child, weight.max(0.0)))
            .unzip();
        WeightedRandomizedNeighborhood {
            name: name.into(),
            children,
            weights,
            draws: vec![],
            last_selected: None,
        }
    }

    pub fn children(&self) -> &[Box<dyn Neighborhood>] {
        &self.children
    }

    /// The configured weights normalised over the children which have at least one neighbor.
    pub fn normalised_weights(&self) -> Vec<f64> {
        let mut weights = self
            .children
            .iter()
            .zip(&self.weights)
            .map(|(child, &weight)| if child.is_empty() { 0.0 } else { weight })
            .collect::<Vec<_>>();
        normalise(&mut weights);
        weights
    }

    /// The child and the offset within it which serve `offset`.
    pub fn resolve(&self, offset: usize) -> Option<(usize, usize)> {
        self.draws.get(offset).copied()
    }

    fn draw_sequence(&mut self, random: &mut dyn Random) {
        let mut weights = self.normalised_weights();
        let mut served = vec![0; self.children.len()];
        self.draws.clear();

        while let Some(child) = random.get_weighted_choice(&weights) {
            self.draws.push((child, served[child]));
            served[child] += 1;

            if served[child] == self.children[child].size() {
                debug!(
                    "Neighborhood '{}' is exhausted after {} draw(s)",
                    self.children[child].name(),
                    self.draws.len()
                );
                weights[child] = 0.0;
                normalise(&mut weights);
            }
        }
    }
}

fn normalise(weights: &mut [f64]) {
    let sum = weights.iter().sum::<f64>();
    if sum > 0.0 {
        weights.iter_mut().for_each(|weight| *weight /= sum);
    }
}

impl Neighborhood for WeightedRandomizedNeighborhood {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_initial_solution(&mut self, initial: &SolverSolution, random: &mut dyn Random) {
        for child in self.children.iter_mut() {
            child.set_initial_solution(initial, random);
        }
        self.draw_sequence(random);
        self.last_selected = None;
    }

    fn size(&self) -> usize {
        self.draws.len()
    }

    fn neighbor(&mut self, offset: usize) -> Option<SolverSolution> {
        let (child, internal) = self.resolve(offset)?;
        let neighbor = self.children[child].neighbor(internal)?;
        self.last_selected = Some(child);
        Some(neighbor)
    }

    fn last_selected(&self) -> Option<Selection> {
        self.last_selected
            .and_then(|child| self.children[child].last_selected())
    }
}
