use crate::basic_types::SolverSolution;
use crate::neighborhoods::Selection;
#[cfg(doc)]
use crate::search::SearchLimit;
#[cfg(doc)]
use crate::Solver;

/// The result of a call to [`Solver::solve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveResult {
    /// The search tree was exhausted by a complete technique while optimising; the solution is
    /// the best one.
    Optimal(SolverSolution),
    /// A solution was found; for an optimisation it is the best one found before the search
    /// stopped.
    Satisfiable(SolverSolution),
    /// The search tree was exhausted by a complete technique without finding a solution.
    Unsatisfiable,
    /// It is not known whether a solution exists, e.g. because the [`SearchLimit`] stopped the
    /// search.
    Unknown,
}

impl SolveResult {
    pub fn solution(&self) -> Option<&SolverSolution> {
        match self {
            SolveResult::Optimal(solution) | SolveResult::Satisfiable(solution) => Some(solution),
            SolveResult::Unsatisfiable | SolveResult::Unknown => None,
        }
    }
}

/// The result of a call to [`Solver::next_solution`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IteratedSolution {
    Solution(SolverSolution),
    /// There are no more solutions.
    Finished,
    /// The search stopped before it was exhausted.
    Unknown,
}

/// The result of a call to [`Solver::improve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Improvement {
    /// The best solution found, which is the initial solution if no neighbor improved on it.
    pub solution: SolverSolution,
    /// The neighbor which produced each accepted improvement, in order.
    pub steps: Vec<Option<Selection>>,
    /// Whether the search stopped at a local optimum rather than because of the limit.
    pub local_optimum: bool,
}
