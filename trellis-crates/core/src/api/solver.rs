use log::debug;
use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::Improvement;
use super::IteratedSolution;
use super::Preprocessor;
use super::SolveResult;
use super::SolverOptions;
use crate::basic_types::IllegalStateError;
use crate::basic_types::PropagationFailure;
use crate::basic_types::PropagationStatus;
use crate::basic_types::Random;
use crate::basic_types::SolverError;
use crate::basic_types::SolverSolution;
use crate::choice_point::StackDelta;
use crate::constraints::Constraint;
use crate::constraints::ConstraintId;
use crate::containers::StorageKey;
use crate::engine::ConstraintStore;
use crate::engine::VariableId;
use crate::neighborhoods::Neighborhood;
use crate::search::ActionRef;
use crate::search::DepthFirst;
use crate::search::FirstSolution;
use crate::search::NoLimit;
use crate::search::ObjectiveGoal;
use crate::search::SearchContext;
use crate::search::SearchGoal;
use crate::search::SearchLimit;
use crate::search::SearchResult;
use crate::search::SearchStatistics;
use crate::search::SearchTechnique;
use crate::search::SearchTree;
use crate::statistics::log_statistic_postfix;
use crate::statistics::Statistic;
use crate::statistics::StatisticScope;

/// The propagated state of an initial solution, kept as the changes relative to the frame below it.
#[derive(Debug)]
struct NeighborBase {
    initial: SolverSolution,
    delta: StackDelta,
    /// The domains of the frame below.
    below: SolverSolution,
    depth: usize,
}

/// The main interaction point which allows the creation of variables, the addition of constraints,
/// and solving problems.
///
/// # Example
/// ```rust
/// # use trellis_core::constraints::ArithmeticConstraint;
/// # use trellis_core::search::generate;
/// # use trellis_core::search::ValueOrder;
/// # use trellis_core::search::VariableOrder;
/// # use trellis_core::SolveResult;
/// # use trellis_core::Solver;
/// let mut solver = Solver::default();
/// let x = solver.add_variable("x", 0, 5).unwrap();
/// let y = solver.add_variable("y", 0, 5).unwrap();
/// // x + 3 <= y
/// let _ = solver
///     .add_constraint(ArithmeticConstraint::less_or_equal(x, 3, y), false)
///     .unwrap();
///
/// let action = generate(vec![x, y], VariableOrder::InputOrder, ValueOrder::Max);
/// let result = solver.solve_action(action).unwrap();
///
/// let solution = result.solution().unwrap();
/// assert_eq!(Some(2), solution.value(x));
/// assert_eq!(Some(5), solution.value(y));
/// ```
#[derive(Debug)]
pub struct Solver {
    store: ConstraintStore,
    options: SolverOptions,
    random: SmallRng,
    /// The search which can be continued with [`Solver::next_solution`].
    search: Option<SearchTree>,
    search_statistics: SearchStatistics,
    preprocessors: Vec<Box<dyn Preprocessor>>,
    neighbor_base: Option<NeighborBase>,
    /// The depth of the frame holding the restored neighbor.
    neighbor_frame: Option<usize>,
}

impl Default for Solver {
    fn default() -> Self {
        Solver::with_options(SolverOptions::default())
    }
}

impl Solver {
    /// Creates a solver with the provided [`SolverOptions`].
    pub fn with_options(options: SolverOptions) -> Self {
        Solver {
            store: ConstraintStore::new(options.queue_order),
            options,
            random: SmallRng::seed_from_u64(options.random_seed),
            search: None,
            search_statistics: SearchStatistics::default(),
            preprocessors: vec![],
            neighbor_base: None,
            neighbor_frame: None,
        }
    }

    pub fn options(&self) -> SolverOptions {
        self.options
    }

    /// The underlying store, e.g. to inspect the constraint graph.
    pub fn store(&self) -> &ConstraintStore {
        &self.store
    }

    /// The random generator of the solver, seeded with [`SolverOptions::random_seed`].
    pub fn random(&mut self) -> &mut dyn Random {
        &mut self.random
    }

    pub fn set_auto_propagate(&mut self, auto_propagate: bool) {
        self.options.auto_propagate = auto_propagate;
    }

    /// The statistics of the most recent search.
    pub fn search_statistics(&self) -> SearchStatistics {
        self.search_statistics
    }

    /// Logs the statistics currently present in the solver.
    pub fn log_statistics(&self) {
        self.store
            .statistics()
            .log(StatisticScope::component("propagation"));
        self.search_statistics.log(StatisticScope::component("search"));
        log_statistic_postfix();
    }
}

/// Methods to retrieve information about variables
impl Solver {
    pub fn num_variables(&self) -> usize {
        self.store.num_variables()
    }

    /// Whether the root was found to be infeasible since the last reset.
    pub fn is_infeasible(&self) -> bool {
        self.store.is_infeasible()
    }

    pub fn variable_name(&self, variable: VariableId) -> &str {
        self.store.variable_name(variable)
    }

    /// Get the lower-bound of the given variable in the current state.
    pub fn lower_bound(&self, variable: VariableId) -> i64 {
        self.store.lower_bound(variable)
    }

    /// Get the upper-bound of the given variable in the current state.
    pub fn upper_bound(&self, variable: VariableId) -> i64 {
        self.store.upper_bound(variable)
    }

    pub fn contains(&self, variable: VariableId, value: i64) -> bool {
        self.store.contains(variable, value)
    }

    pub fn is_fixed(&self, variable: VariableId) -> bool {
        self.store.is_fixed(variable)
    }

    /// The value of the variable if its domain is a single value.
    pub fn value(&self, variable: VariableId) -> Option<i64> {
        self.store.value(variable)
    }
}

/// Functions for creating variables and posting constraints. These end any active search and
/// return to the root first.
impl Solver {
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        min: i64,
        max: i64,
    ) -> Result<VariableId, SolverError> {
        self.return_to_root()?;
        self.store.add_variable(name, min, max)
    }

    pub fn add_boolean(&mut self, name: impl Into<String>) -> Result<VariableId, SolverError> {
        self.return_to_root()?;
        self.store.add_boolean(name)
    }

    /// Posts `constraint`, and propagates the root if [`SolverOptions::auto_propagate`] is set.
    ///
    /// Constraints posted with `keep_after_reset` survive [`Solver::reset`].
    pub fn add_constraint(
        &mut self,
        constraint: impl Constraint + 'static,
        keep_after_reset: bool,
    ) -> Result<ConstraintId, SolverError> {
        self.return_to_root()?;
        let id = self.store.add_constraint(constraint, keep_after_reset)?;
        if self.options.auto_propagate {
            self.store.propagate()?;
        }
        Ok(id)
    }

    /// Propagates the current state to a fixpoint.
    pub fn propagate(&mut self) -> PropagationStatus {
        self.store.propagate()
    }

    /// Registers a preprocessor which is run on every [`Solver::reset`].
    pub fn add_preprocessor(&mut self, preprocessor: impl Preprocessor + 'static) {
        self.preprocessors.push(Box::new(preprocessor));
    }

    /// Removes the constraints which were not kept, restores the declared domains, and runs the
    /// preprocessors.
    pub fn reset(&mut self) -> Result<(), SolverError> {
        self.search = None;
        self.neighbor_frame = None;
        self.neighbor_base = None;
        self.store.reset()?;

        for preprocessor in self.preprocessors.iter_mut() {
            if let Err(failure) = preprocessor.preprocess(&mut self.store) {
                info!(
                    "Preprocessor '{}' made the problem infeasible",
                    preprocessor.name()
                );
                self.store.mark_infeasible();
                return Err(failure.into());
            }
            debug!("Ran preprocessor '{}'", preprocessor.name());
        }

        if self.options.auto_propagate {
            self.store.propagate()?;
        }
        Ok(())
    }

    /// Removes every variable, constraint and preprocessor.
    pub fn clear(&mut self) {
        self.store.clear();
        self.search = None;
        self.search_statistics = SearchStatistics::default();
        self.preprocessors.clear();
        self.neighbor_base = None;
        self.neighbor_frame = None;
    }

    fn return_to_root(&mut self) -> Result<(), SolverError> {
        self.finish_search()?;
        self.neighbor_frame = None;
        self.neighbor_base = None;
        self.store.pop_to(0)?;
        Ok(())
    }

    fn finish_search(&mut self) -> Result<(), SolverError> {
        self.release_neighbor()?;
        if let Some(mut search) = self.search.take() {
            search.finish(&mut SearchContext {
                store: &mut self.store,
                random: &mut self.random,
            })?;
        }
        Ok(())
    }
}

/// Functions for solving.
impl Solver {
    /// Explores the tree spanned by `action` from the root.
    ///
    /// Without `continually_improve` the search stops at the first accepted solution; its state
    /// stays visible through the domain queries and [`Solver::next_solution`] continues the search.
    /// Otherwise the search runs until the tree is exhausted or the `limit` stops it, and the last
    /// accepted solution is reported. With `reset` the solver is [reset](Solver::reset) first.
    pub fn solve(
        &mut self,
        action: ActionRef,
        goal: impl SearchGoal + 'static,
        technique: impl SearchTechnique + 'static,
        limit: impl SearchLimit + 'static,
        continually_improve: bool,
        reset: bool,
    ) -> Result<SolveResult, SolverError> {
        if reset {
            self.reset()?;
        } else {
            self.return_to_root()?;
        }
        if self.store.propagate().is_err() {
            return Ok(SolveResult::Unsatisfiable);
        }

        let mut search = SearchTree::new(action, goal, technique, limit);
        let mut best = None;
        let exhausted = loop {
            let result = search.next_solution(&mut SearchContext {
                store: &mut self.store,
                random: &mut self.random,
            })?;
            self.search_statistics = search.statistics();

            match result {
                SearchResult::Solution(solution) if !continually_improve => {
                    self.search = Some(search);
                    return Ok(SolveResult::Satisfiable(solution));
                }
                SearchResult::Solution(solution) => best = Some(solution),
                SearchResult::Exhausted => break true,
                SearchResult::LimitReached => break false,
            }
        };

        let proven = exhausted && search.is_complete();
        let optimising = search.goal().best_objective_value().is_some();
        let result = match best {
            Some(solution) if proven && optimising => SolveResult::Optimal(solution),
            Some(solution) => SolveResult::Satisfiable(solution),
            None if proven => SolveResult::Unsatisfiable,
            None => SolveResult::Unknown,
        };
        info!(
            "Search finished after {} node(s): {}",
            self.search_statistics.num_activations,
            match &result {
                SolveResult::Optimal(_) => "optimal",
                SolveResult::Satisfiable(_) => "satisfiable",
                SolveResult::Unsatisfiable => "unsatisfiable",
                SolveResult::Unknown => "unknown",
            }
        );
        Ok(result)
    }

    /// Looks for the first solution in depth-first order.
    pub fn solve_action(&mut self, action: ActionRef) -> Result<SolveResult, SolverError> {
        self.solve(
            action,
            FirstSolution::new(),
            DepthFirst::new(),
            NoLimit,
            false,
            false,
        )
    }

    /// Looks for a solution with the least value of `objective`.
    pub fn minimize(
        &mut self,
        action: ActionRef,
        objective: VariableId,
        technique: impl SearchTechnique + 'static,
        limit: impl SearchLimit + 'static,
    ) -> Result<SolveResult, SolverError> {
        self.solve(
            action,
            ObjectiveGoal::minimize(objective),
            technique,
            limit,
            true,
            false,
        )
    }

    /// Looks for a solution with the largest value of `objective`.
    pub fn maximize(
        &mut self,
        action: ActionRef,
        objective: VariableId,
        technique: impl SearchTechnique + 'static,
        limit: impl SearchLimit + 'static,
    ) -> Result<SolveResult, SolverError> {
        self.solve(
            action,
            ObjectiveGoal::maximize(objective),
            technique,
            limit,
            true,
            false,
        )
    }

    /// Continues the search started by the last [`Solver::solve`] which stopped at a solution.
    pub fn next_solution(&mut self) -> Result<IteratedSolution, SolverError> {
        self.release_neighbor()?;
        let Some(search) = self.search.as_mut() else {
            return Err(IllegalStateError::NoActiveSearch.into());
        };

        let result = search.next_solution(&mut SearchContext {
            store: &mut self.store,
            random: &mut self.random,
        })?;
        self.search_statistics = search.statistics();

        match result {
            SearchResult::Solution(solution) => Ok(IteratedSolution::Solution(solution)),
            SearchResult::Exhausted => {
                self.search = None;
                Ok(IteratedSolution::Finished)
            }
            SearchResult::LimitReached => {
                self.search = None;
                Ok(IteratedSolution::Unknown)
            }
        }
    }
}

/// Functions for storing and restoring solutions.
impl Solver {
    /// Captures the domains of the variables in `scope`.
    pub fn store_solution(&self, scope: impl IntoIterator<Item = VariableId>) -> SolverSolution {
        self.store.capture(scope)
    }

    /// Captures the domains of all variables.
    pub fn current_solution(&self) -> SolverSolution {
        self.store.capture_all()
    }

    /// Narrows the current domains to those of `solution`, and propagates if
    /// [`SolverOptions::auto_propagate`] is set. A failure at the root makes the problem
    /// infeasible until the next reset.
    pub fn restore_solution(&mut self, solution: &SolverSolution) -> PropagationStatus {
        self.neighbor_base = None;
        let result = if self.options.auto_propagate {
            self.store.restore(solution)
        } else {
            self.store.narrow(solution)
        };
        if result.is_err() && self.store.depth() == 0 {
            self.store.mark_infeasible();
        }
        result
    }

    /// Moves to the state of `neighbor`, a solution which differs from `initial` in a few
    /// variables, in a new frame on top of the current state.
    ///
    /// The propagated state of `initial` is computed once and kept as a delta; consecutive calls
    /// with the same `initial` re-apply that delta and overwrite the domains which differ from
    /// the neighbor. Variables outside the scope of `neighbor` get the domain they have in the
    /// frame below, so that their consequences of `initial` are derived again. Only the arcs of
    /// overwritten variables run.
    ///
    /// Returns whether the neighbor is consistent; an inconsistent neighbor leaves no frame
    /// behind. The neighbor stays in place until [`Solver::release_neighbor`] or the next call.
    pub fn restore_neighboring_solution(
        &mut self,
        initial: &SolverSolution,
        neighbor: &SolverSolution,
    ) -> Result<bool, SolverError> {
        self.release_neighbor()?;
        let depth = self.store.depth();

        let base = match self.neighbor_base.take() {
            Some(base) if base.depth == depth && base.initial == *initial => base,
            _ => {
                let below = self.store.capture_all();
                self.store.push();
                let restored = self.store.restore(initial);
                let delta = self.store.pop_delta()?;
                if let Err(failure) = restored {
                    debug!("The initial solution is inconsistent: {failure}");
                    return Ok(false);
                }
                NeighborBase {
                    initial: initial.clone(),
                    delta,
                    below,
                    depth,
                }
            }
        };

        self.store.push_delta(&base.delta)?;
        self.neighbor_frame = Some(depth + 1);
        debug!(
            "Restoring a neighbor which differs in {} variable(s)",
            initial.differences(neighbor).count()
        );

        for index in 0..self.store.num_variables() {
            let variable = VariableId::create_from_index(index);
            if let Some(domain) = neighbor.get(variable).or_else(|| base.below.get(variable)) {
                self.store.overwrite(variable, domain);
            }
        }
        self.neighbor_base = Some(base);

        match self.store.propagate() {
            Ok(()) => Ok(true),
            Err(failure) => {
                debug!("The neighbor is inconsistent: {failure}");
                self.release_neighbor()?;
                Ok(false)
            }
        }
    }

    /// Pops the frame of the neighbor restored by [`Solver::restore_neighboring_solution`].
    pub fn release_neighbor(&mut self) -> Result<(), SolverError> {
        if let Some(depth) = self.neighbor_frame.take() {
            self.store.pop_to(depth.saturating_sub(1))?;
        }
        Ok(())
    }

    /// Hill climbing from `initial`: serves the neighbors of the current solution and moves to the
    /// first complete one which the `goal` accepts, until no neighbor is accepted or the `limit`
    /// stops the search.
    ///
    /// The goal judges the initial solution first, so an [`ObjectiveGoal`] only accepts neighbors
    /// which improve on it; a goal which accepts equal values may cycle until the limit stops it.
    pub fn improve(
        &mut self,
        initial: &SolverSolution,
        neighborhood: &mut dyn Neighborhood,
        mut goal: impl SearchGoal,
        mut limit: impl SearchLimit,
    ) -> Result<Improvement, SolverError> {
        self.return_to_root()?;
        goal.initialize(&self.store);

        if !self.restore_neighboring_solution(initial, initial)? {
            return Err(PropagationFailure::new()
                .detected_by("initial solution")
                .into());
        }
        let _ = goal.solution_found(&self.store);

        let mut current = initial.clone();
        let mut steps = vec![];
        let local_optimum = 'climb: loop {
            self.release_neighbor()?;
            neighborhood.set_initial_solution(&current, &mut self.random);

            let mut accepted = None;
            for offset in 0..neighborhood.size() {
                if limit.should_stop() {
                    break 'climb false;
                }
                limit.node_activated();

                let Some(neighbor) = neighborhood.neighbor(offset) else {
                    continue;
                };
                let consistent = self.restore_neighboring_solution(&current, &neighbor)?
                    && goal
                        .restrict(&mut self.store)
                        .and_then(|_| self.store.propagate())
                        .is_ok();
                if !consistent {
                    limit.failure_occurred();
                    continue;
                }

                let candidate = self.store.capture_all();
                if candidate.is_complete() && goal.solution_found(&self.store) {
                    limit.solution_found();
                    accepted = Some(candidate);
                    break;
                }
            }

            let Some(solution) = accepted else {
                break true;
            };
            let selection = neighborhood.last_selected();
            match &selection {
                Some(selection) => info!("Improved the solution with neighbor {selection}"),
                None => info!("Improved the solution"),
            }
            steps.push(selection);
            current = solution;
        };

        self.release_neighbor()?;
        self.neighbor_base = None;
        Ok(Improvement {
            solution: current,
            steps,
            local_optimum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ArithmeticConstraint;
    use crate::search::generate;
    use crate::search::ValueOrder;
    use crate::search::VariableOrder;

    #[derive(Debug)]
    struct AtLeast {
        variable: VariableId,
        value: i64,
    }

    impl Preprocessor for AtLeast {
        fn name(&self) -> &str {
            "at least"
        }

        fn preprocess(&mut self, store: &mut ConstraintStore) -> PropagationStatus {
            store.set_lower_bound(self.variable, self.value)
        }
    }

    #[test]
    fn next_solution_without_a_search_is_an_error() {
        let mut solver = Solver::default();

        assert_eq!(
            Err(SolverError::IllegalState(IllegalStateError::NoActiveSearch)),
            solver.next_solution()
        );
    }

    #[test]
    fn reset_drops_constraints_which_are_not_kept_and_runs_preprocessors() {
        let mut solver = Solver::default();
        let x = solver.add_variable("x", 0, 10).unwrap();
        let y = solver.add_variable("y", 0, 10).unwrap();
        let _ = solver
            .add_constraint(ArithmeticConstraint::equal(y, x, 2), true)
            .unwrap();
        assert!(solver
            .add_constraint(ArithmeticConstraint::less_or_equal(y, 0, x), false)
            .is_err());
        assert!(solver.is_infeasible());

        solver.add_preprocessor(AtLeast {
            variable: x,
            value: 3,
        });
        solver.reset().unwrap();

        assert!(!solver.is_infeasible());
        assert_eq!(3, solver.lower_bound(x));
        assert_eq!(5, solver.lower_bound(y));
    }

    #[test]
    fn a_failing_preprocessor_makes_the_problem_infeasible() {
        let mut solver = Solver::default();
        let x = solver.add_variable("x", 0, 10).unwrap();
        solver.add_preprocessor(AtLeast {
            variable: x,
            value: 11,
        });

        assert!(matches!(solver.reset(), Err(SolverError::Infeasible(_))));
        let action = generate(vec![x], VariableOrder::InputOrder, ValueOrder::Min);
        assert_eq!(SolveResult::Unsatisfiable, solver.solve_action(action).unwrap());
    }

    #[test]
    fn neighbors_are_restored_on_top_of_the_initial_state() {
        let mut solver = Solver::default();
        let x = solver.add_variable("x", 0, 10).unwrap();
        let y = solver.add_variable("y", 0, 10).unwrap();
        let _ = solver
            .add_constraint(ArithmeticConstraint::equal(y, x, 1), false)
            .unwrap();

        let initial = solver.store_solution([x]).with_value(x, 2);
        assert!(solver
            .restore_neighboring_solution(&initial, &initial.with_value(x, 4))
            .unwrap());
        assert_eq!(Some(5), solver.value(y));
        assert_eq!(1, solver.store().depth());

        assert!(solver
            .restore_neighboring_solution(&initial, &initial.with_value(x, 7))
            .unwrap());
        assert_eq!(Some(8), solver.value(y));
        assert_eq!(1, solver.store().depth());

        assert!(!solver
            .restore_neighboring_solution(&initial, &initial.with_value(x, 10))
            .unwrap());
        assert_eq!(0, solver.store().depth());

        solver.release_neighbor().unwrap();
        assert_eq!(None, solver.value(x));
        assert_eq!(1, solver.lower_bound(y));
    }
}
