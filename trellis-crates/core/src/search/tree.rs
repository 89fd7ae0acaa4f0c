use std::rc::Rc;

use log::debug;
use log::info;

use super::action::perform_chain;
use super::node::Trace;
use super::ActionError;
use super::ActionOutcome;
use super::ActionRef;
use super::SearchContext;
use super::SearchGoal;
use super::SearchLimit;
use super::SearchNode;
use super::SearchTechnique;
use crate::basic_types::SolverError;
use crate::basic_types::SolverSolution;
use crate::create_statistics_struct;

create_statistics_struct!(
    /// Statistics of a single search.
    SearchStatistics {
        /// The number of activated nodes.
        num_activations: u64,
        /// The number of nodes which branched.
        num_choice_points: u64,
        /// The number of nodes which failed.
        num_failures: u64,
        /// The number of accepted solutions.
        num_solutions: u64,
        /// The depth of the deepest activated node.
        max_depth: u64,
        /// The number of ancestor actions which were performed again to reactivate a node.
        num_replayed_actions: u64,
});

/// The outcome of [`SearchTree::next_solution`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchResult {
    Solution(SolverSolution),
    /// No open nodes remain.
    Exhausted,
    /// The [`SearchLimit`] stopped the search; open nodes may remain.
    LimitReached,
}

enum Activation {
    Failed,
    Branched,
    Completed,
}

/// Explores the tree spanned by a root [`ActionRef`].
///
/// Every activated node gets its own frame on the choice-point stack. The frames of the path to the
/// most recently activated node stay on the stack; activating a node elsewhere in the tree pops to
/// the deepest common ancestor and replays the actions of the remaining ancestors.
#[derive(Debug)]
pub struct SearchTree {
    goal: Box<dyn SearchGoal>,
    technique: Box<dyn SearchTechnique>,
    limit: Box<dyn SearchLimit>,
    /// The nodes whose frames are on the stack, from the root down.
    applied: Vec<Rc<Trace>>,
    /// The depth of the stack when the search started.
    base_depth: Option<usize>,
    statistics: SearchStatistics,
}

impl SearchTree {
    pub fn new(
        action: ActionRef,
        goal: impl SearchGoal + 'static,
        mut technique: impl SearchTechnique + 'static,
        limit: impl SearchLimit + 'static,
    ) -> Self {
        technique.add_open_nodes(vec![SearchNode::root(action)]);

        SearchTree {
            goal: Box::new(goal),
            technique: Box::new(technique),
            limit: Box::new(limit),
            applied: vec![],
            base_depth: None,
            statistics: SearchStatistics::default(),
        }
    }

    pub fn goal(&self) -> &dyn SearchGoal {
        self.goal.as_ref()
    }

    pub fn statistics(&self) -> SearchStatistics {
        self.statistics
    }

    /// Whether exhausting the tree proves that there are no (better) solutions left.
    pub fn is_complete(&self) -> bool {
        self.technique.is_complete()
    }

    /// Activates nodes until a solution is found, no open node remains, or the limit stops the
    /// search.
    ///
    /// After a solution the frames of the solution node stay on the stack, so that the domains can
    /// be inspected; the next call continues from there. Otherwise the stack is back at the depth
    /// at which the search started.
    pub fn next_solution(
        &mut self,
        context: &mut SearchContext<'_>,
    ) -> Result<SearchResult, SolverError> {
        let base_depth = match self.base_depth {
            Some(depth) => depth,
            None => {
                self.goal.initialize(context.store);
                *self.base_depth.insert(context.store.depth())
            }
        };

        loop {
            if self.statistics.num_solutions > 0 && !self.goal.wants_more_solutions() {
                self.technique.clear();
            }

            if self.technique.is_empty() {
                self.unwind(context, base_depth)?;
                info!(
                    "Search exhausted after {} node(s)",
                    self.statistics.num_activations
                );
                return Ok(SearchResult::Exhausted);
            }

            if self.limit.should_stop() {
                self.unwind(context, base_depth)?;
                info!(
                    "Search limit reached after {} node(s)",
                    self.statistics.num_activations
                );
                return Ok(SearchResult::LimitReached);
            }

            let Some(node) = self.technique.next_node() else {
                continue;
            };
            self.limit.node_activated();
            self.statistics.num_activations += 1;

            match self.activate(node, context, base_depth)? {
                Activation::Failed => {
                    self.limit.failure_occurred();
                    self.statistics.num_failures += 1;
                }
                Activation::Branched => {}
                Activation::Completed => {
                    if self.goal.solution_found(context.store) {
                        self.limit.solution_found();
                        self.statistics.num_solutions += 1;
                        info!(
                            "Solution {} found at depth {}",
                            self.statistics.num_solutions,
                            self.applied.len()
                        );
                        return Ok(SearchResult::Solution(context.store.capture_all()));
                    }
                }
            }
        }
    }

    /// Pops every frame of the search and drops the open nodes.
    pub fn finish(&mut self, context: &mut SearchContext<'_>) -> Result<(), SolverError> {
        self.technique.clear();
        if let Some(base_depth) = self.base_depth {
            self.unwind(context, base_depth)?;
        }
        Ok(())
    }

    fn unwind(
        &mut self,
        context: &mut SearchContext<'_>,
        base_depth: usize,
    ) -> Result<(), SolverError> {
        context.store.pop_to(base_depth)?;
        self.applied.clear();
        Ok(())
    }

    fn activate(
        &mut self,
        node: SearchNode,
        context: &mut SearchContext<'_>,
        base_depth: usize,
    ) -> Result<Activation, SolverError> {
        let path = node.path();
        let common = self
            .applied
            .iter()
            .zip(&path)
            .take_while(|(applied, ancestor)| Rc::ptr_eq(applied, ancestor))
            .count();
        context.store.pop_to(base_depth + common)?;
        self.applied.truncate(common);

        for ancestor in &path[common..] {
            context.store.push();
            self.applied.push(Rc::clone(ancestor));
            self.statistics.num_replayed_actions += 1;

            match perform_chain(&ancestor.action, context) {
                Ok(_) => {}
                Err(ActionError::Failure(failure)) => {
                    debug!("Replaying depth {} failed: {failure}", ancestor.depth);
                    context.store.pop()?;
                    let _ = self.applied.pop();
                    return Ok(Activation::Failed);
                }
                Err(ActionError::Fatal(error)) => return Err(error),
            }
        }

        context.store.push();
        let trace = Rc::new(Trace {
            action: Rc::clone(node.action()),
            depth: node.depth(),
            parent: path.last().cloned(),
        });
        self.applied.push(Rc::clone(&trace));
        self.statistics.max_depth = self.statistics.max_depth.max(node.depth() as u64);

        let outcome = self
            .goal
            .restrict(context.store)
            .and_then(|_| context.store.propagate())
            .map_err(ActionError::from)
            .and_then(|_| perform_chain(node.action(), context));

        match outcome {
            Ok(ActionOutcome::Choice(alternatives)) => {
                self.statistics.num_choice_points += 1;
                let children = alternatives
                    .into_iter()
                    .enumerate()
                    .map(|(index, action)| SearchNode::child(&node, &trace, action, index))
                    .collect();
                self.technique.add_open_nodes(children);
                Ok(Activation::Branched)
            }
            Ok(_) => Ok(Activation::Completed),
            Err(ActionError::Failure(failure)) => {
                debug!("Node at depth {} failed: {failure}", node.depth());
                context.store.pop()?;
                let _ = self.applied.pop();
                Ok(Activation::Failed)
            }
            Err(ActionError::Fatal(error)) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::constraints::ArithmeticConstraint;
    use crate::engine::ConstraintStore;
    use crate::engine::VariableId;
    use crate::search::generate;
    use crate::search::AnySolution;
    use crate::search::BreadthFirst;
    use crate::search::DepthFirst;
    use crate::search::FirstSolution;
    use crate::search::NoLimit;
    use crate::search::NodeLimit;
    use crate::search::ObjectiveGoal;
    use crate::search::ValueOrder;
    use crate::search::VariableOrder;

    fn two_variables() -> (ConstraintStore, VariableId, VariableId) {
        let mut store = ConstraintStore::default();
        let x = store.add_variable("x", 0, 2).unwrap();
        let y = store.add_variable("y", 0, 2).unwrap();
        let _ = store
            .add_constraint(ArithmeticConstraint::less_or_equal(x, 1, y), false)
            .unwrap();
        store.propagate().unwrap();
        (store, x, y)
    }

    fn all_solutions(
        store: &mut ConstraintStore,
        tree: &mut SearchTree,
        variables: &[VariableId],
    ) -> Vec<Vec<i64>> {
        let mut random = SmallRng::seed_from_u64(42);
        let mut context = SearchContext::new(store, &mut random);
        let mut solutions = vec![];
        while let SearchResult::Solution(solution) = tree.next_solution(&mut context).unwrap() {
            solutions.push(
                variables
                    .iter()
                    .map(|&variable| solution.value(variable).unwrap())
                    .collect(),
            );
        }
        solutions
    }

    #[test]
    fn depth_first_enumerates_every_solution() {
        let (mut store, x, y) = two_variables();
        let mut tree = SearchTree::new(
            generate([x, y], VariableOrder::InputOrder, ValueOrder::Min),
            AnySolution,
            DepthFirst::new(),
            NoLimit,
        );

        let solutions = all_solutions(&mut store, &mut tree, &[x, y]);

        assert_eq!(vec![vec![0, 1], vec![0, 2], vec![1, 2]], solutions);
        assert_eq!(0, store.depth());
        assert_eq!(2, store.upper_bound(y));
    }

    #[test]
    fn breadth_first_finds_the_same_solutions_by_replaying() {
        let (mut store, x, y) = two_variables();
        let mut tree = SearchTree::new(
            generate([x, y], VariableOrder::InputOrder, ValueOrder::Min),
            AnySolution,
            BreadthFirst::new(),
            NoLimit,
        );

        let mut solutions = all_solutions(&mut store, &mut tree, &[x, y]);
        solutions.sort();

        assert_eq!(vec![vec![0, 1], vec![0, 2], vec![1, 2]], solutions);
        assert!(tree.statistics().num_replayed_actions > 0);
        assert_eq!(0, store.depth());
    }

    #[test]
    fn node_limit_stops_after_exactly_its_budget() {
        let mut store = ConstraintStore::default();
        let variables = (0..4)
            .map(|index| store.add_variable(format!("v{index}"), 0, 2).unwrap())
            .collect::<Vec<_>>();
        // Four pairwise different values out of three: no node is a solution.
        for (index, &first) in variables.iter().enumerate() {
            for &second in &variables[index + 1..] {
                let _ = store
                    .add_constraint(ArithmeticConstraint::not_equal(first, second, 0), false)
                    .unwrap();
            }
        }
        store.propagate().unwrap();
        let mut tree = SearchTree::new(
            generate(variables.clone(), VariableOrder::InputOrder, ValueOrder::Min),
            AnySolution,
            DepthFirst::new(),
            NodeLimit::new(10),
        );
        let mut random = SmallRng::seed_from_u64(42);
        let mut context = SearchContext::new(&mut store, &mut random);

        let result = tree.next_solution(&mut context).unwrap();

        assert_eq!(SearchResult::LimitReached, result);
        assert_eq!(10, tree.statistics().num_activations);
    }

    #[test]
    fn first_solution_stops_the_search() {
        let (mut store, x, y) = two_variables();
        let mut tree = SearchTree::new(
            generate([x, y], VariableOrder::InputOrder, ValueOrder::Max),
            FirstSolution::new(),
            DepthFirst::new(),
            NoLimit,
        );

        let solutions = all_solutions(&mut store, &mut tree, &[x, y]);

        assert_eq!(vec![vec![1, 2]], solutions);
    }

    #[test]
    fn minimisation_only_reports_improving_solutions() {
        let (mut store, x, y) = two_variables();
        let mut tree = SearchTree::new(
            generate([y, x], VariableOrder::InputOrder, ValueOrder::Max),
            ObjectiveGoal::minimize(y),
            DepthFirst::new(),
            NoLimit,
        );

        let solutions = all_solutions(&mut store, &mut tree, &[x, y]);

        assert_eq!(vec![vec![1, 2], vec![0, 1]], solutions);
        assert_eq!(Some(1), tree.goal().best_objective_value());
    }
}
