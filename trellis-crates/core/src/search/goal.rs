use std::fmt::Debug;

use log::info;

use crate::basic_types::EmptyDomain;
use crate::basic_types::PropagationStatus;
use crate::engine::ConstraintStore;
use crate::engine::VariableId;

/// Decides which complete nodes are solutions and restricts the search towards better ones.
pub trait SearchGoal: Debug {
    /// Called once, before the first node is activated.
    fn initialize(&mut self, _store: &ConstraintStore) {}

    /// Tightens the domains before a node is activated, e.g. to require an improvement of the
    /// objective.
    fn restrict(&self, _store: &mut ConstraintStore) -> PropagationStatus {
        Ok(())
    }

    /// Called for every complete node; returns whether it is accepted as a solution.
    fn solution_found(&mut self, store: &ConstraintStore) -> bool;

    /// The objective value of the best accepted solution, for goals which have an objective.
    fn best_objective_value(&self) -> Option<i64> {
        None
    }

    /// Whether the search should look for more solutions after one was accepted.
    fn wants_more_solutions(&self) -> bool {
        true
    }
}

/// Accepts every complete node.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnySolution;

impl SearchGoal for AnySolution {
    fn solution_found(&mut self, _: &ConstraintStore) -> bool {
        true
    }
}

/// Accepts the first complete node and then stops the search.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstSolution {
    found: bool,
}

impl FirstSolution {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchGoal for FirstSolution {
    fn solution_found(&mut self, _: &ConstraintStore) -> bool {
        self.found = true;
        true
    }

    fn wants_more_solutions(&self) -> bool {
        !self.found
    }
}

/// The direction of the optimisation, either maximising or minimising.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptimisationDirection {
    Minimise,
    Maximise,
}

/// Looks for solutions which improve the objective variable.
///
/// Once a solution is found, every subsequent node is restricted to improve on it: by at least
/// `step` when the goal is strict, or to be at least as good otherwise.
#[derive(Clone, Copy, Debug)]
pub struct ObjectiveGoal {
    objective: VariableId,
    direction: OptimisationDirection,
    strict: bool,
    step: i64,
    use_current_state: bool,
    best: Option<i64>,
}

impl ObjectiveGoal {
    pub fn minimize(objective: VariableId) -> Self {
        ObjectiveGoal::new(objective, OptimisationDirection::Minimise)
    }

    pub fn maximize(objective: VariableId) -> Self {
        ObjectiveGoal::new(objective, OptimisationDirection::Maximise)
    }

    fn new(objective: VariableId, direction: OptimisationDirection) -> Self {
        ObjectiveGoal {
            objective,
            direction,
            strict: true,
            step: 1,
            use_current_state: false,
            best: None,
        }
    }

    /// Whether a new solution has to improve on the best one (default `true`).
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The least improvement of a strict goal (default `1`).
    pub fn with_step(mut self, step: i64) -> Self {
        self.step = step.max(1);
        self
    }

    /// Treats the bound of the objective at the start of the search as the value to improve on.
    pub fn with_use_current_state(mut self, use_current_state: bool) -> Self {
        self.use_current_state = use_current_state;
        self
    }

    pub fn objective(&self) -> VariableId {
        self.objective
    }

    pub fn direction(&self) -> OptimisationDirection {
        self.direction
    }

    /// The objective value of the current state, as far as it is known.
    fn current_value(&self, store: &ConstraintStore) -> i64 {
        match self.direction {
            OptimisationDirection::Minimise => store.lower_bound(self.objective),
            OptimisationDirection::Maximise => store.upper_bound(self.objective),
        }
    }

    fn improvement(&self) -> i64 {
        if self.strict {
            self.step
        } else {
            0
        }
    }

    /// The value an objective must reach to be accepted after `best`, or [`None`] if no `i64`
    /// reaches it.
    fn threshold(&self, best: i64) -> Option<i64> {
        match self.direction {
            OptimisationDirection::Minimise => best.checked_sub(self.improvement()),
            OptimisationDirection::Maximise => best.checked_add(self.improvement()),
        }
    }
}

impl SearchGoal for ObjectiveGoal {
    fn initialize(&mut self, store: &ConstraintStore) {
        if self.use_current_state {
            self.best = Some(match self.direction {
                OptimisationDirection::Minimise => store.upper_bound(self.objective),
                OptimisationDirection::Maximise => store.lower_bound(self.objective),
            });
        }
    }

    fn restrict(&self, store: &mut ConstraintStore) -> PropagationStatus {
        let Some(best) = self.best else {
            return Ok(());
        };
        let Some(threshold) = self.threshold(best) else {
            return Err(EmptyDomain(self.objective).into());
        };

        match self.direction {
            OptimisationDirection::Minimise => store.set_upper_bound(self.objective, threshold),
            OptimisationDirection::Maximise => store.set_lower_bound(self.objective, threshold),
        }
    }

    fn solution_found(&mut self, store: &ConstraintStore) -> bool {
        let value = self.current_value(store);
        let improves = match self.best.map(|best| self.threshold(best)) {
            None => true,
            Some(None) => false,
            Some(Some(threshold)) => match self.direction {
                OptimisationDirection::Minimise => value <= threshold,
                OptimisationDirection::Maximise => value >= threshold,
            },
        };

        if improves {
            info!("Found a solution with objective value {value}");
            self.best = Some(value);
        }
        improves
    }

    fn best_objective_value(&self) -> Option<i64> {
        self.best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_minimisation_requires_a_step() {
        let mut store = ConstraintStore::default();
        let objective = store.add_variable("cost", 0, 20).unwrap();
        let mut goal = ObjectiveGoal::minimize(objective).with_step(3);

        store.push();
        store.assign(objective, 10).unwrap();
        assert!(goal.solution_found(&store));
        store.pop().unwrap();

        store.push();
        goal.restrict(&mut store).unwrap();
        assert_eq!(7, store.upper_bound(objective));
        store.pop().unwrap();
        assert_eq!(Some(10), goal.best_objective_value());
    }

    #[test]
    fn non_strict_goal_accepts_equal_values() {
        let mut store = ConstraintStore::default();
        let objective = store.add_variable("profit", 0, 20).unwrap();
        let mut goal = ObjectiveGoal::maximize(objective).with_strict(false);

        store.assign(objective, 5).unwrap();
        assert!(goal.solution_found(&store));
        assert!(goal.solution_found(&store));
    }

    #[test]
    fn current_state_is_the_incumbent() {
        let mut store = ConstraintStore::default();
        let objective = store.add_variable("cost", 0, 20).unwrap();
        store.set_upper_bound(objective, 12).unwrap();
        let mut goal = ObjectiveGoal::minimize(objective).with_use_current_state(true);

        goal.initialize(&store);

        assert_eq!(Some(12), goal.best_objective_value());
        store.push();
        goal.restrict(&mut store).unwrap();
        assert_eq!(11, store.upper_bound(objective));
    }

    #[test]
    fn nothing_improves_on_the_smallest_value() {
        let mut store = ConstraintStore::default();
        let objective = store.add_variable("cost", i64::MIN, 0).unwrap();
        let mut goal = ObjectiveGoal::minimize(objective);

        store.push();
        store.assign(objective, i64::MIN).unwrap();
        assert!(goal.solution_found(&store));
        assert!(!goal.solution_found(&store));
        store.pop().unwrap();

        store.push();
        assert!(goal.restrict(&mut store).is_err());
    }

    #[test]
    fn first_solution_wants_no_more() {
        let store = ConstraintStore::default();
        let mut goal = FirstSolution::new();

        assert!(goal.wants_more_solutions());
        assert!(goal.solution_found(&store));
        assert!(!goal.wants_more_solutions());
    }
}
