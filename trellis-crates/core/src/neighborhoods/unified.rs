use super::Neighborhood;
use super::Selection;
use crate::basic_types::Random;
use crate::basic_types::SolverSolution;

/// Concatenates several neighborhoods behind one range of offsets.
///
/// The neighbors of the first child come first, followed by those of the second, and so on.
#[derive(Debug)]
pub struct UnifiedNeighborhood {
    name: String,
    children: Vec<Box<dyn Neighborhood>>,
    /// `starts[i]` is the first offset served by child `i`; the last element is the total size.
    starts: Vec<usize>,
    last_selected: Option<usize>,
}

impl UnifiedNeighborhood {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Neighborhood>>) -> Self {
        let mut unified = UnifiedNeighborhood {
            name: name.into(),
            children,
            starts: vec![],
            last_selected: None,
        };
        unified.compute_starts();
        unified
    }

    pub fn children(&self) -> &[Box<dyn Neighborhood>] {
        &self.children
    }

    /// Maps an offset of the unified neighborhood to the child serving it and the offset within
    /// that child.
    pub fn resolve(&self, offset: usize) -> Option<(usize, usize)> {
        if offset >= self.size() {
            return None;
        }
        // The child is the last one starting at or before `offset`; empty children share their
        // start with the next child and are skipped by taking the last match.
        let child = self.starts.partition_point(|&start| start <= offset) - 1;
        Some((child, offset - self.starts[child]))
    }

    fn compute_starts(&mut self) {
        self.starts.clear();
        let mut start = 0;
        for child in &self.children {
            self.starts.push(start);
            start += child.size();
        }
        self.starts.push(start);
    }
}

impl Neighborhood for UnifiedNeighborhood {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_initial_solution(&mut self, initial: &SolverSolution, random: &mut dyn Random) {
        for child in self.children.iter_mut() {
            child.set_initial_solution(initial, random);
        }
        self.compute_starts();
        self.last_selected = None;
    }

    fn size(&self) -> usize {
        self.starts.last().copied().unwrap_or_default()
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
