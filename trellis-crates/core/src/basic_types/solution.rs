use std::collections::BTreeMap;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::engine::VariableId;

/// The captured domain of a single variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableSolution {
    pub name: String,
    pub min: i64,
    pub max: i64,
    /// Values strictly between `min` and `max` which are not part of the domain, sorted.
    pub holes: Vec<i64>,
}

impl VariableSolution {
    pub fn fixed(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            min: value,
            max: value,
            holes: vec![],
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// The value of the variable if its captured domain is a single value.
    pub fn value(&self) -> Option<i64> {
        self.is_fixed().then_some(self.min)
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max && self.holes.binary_search(&value).is_err()
    }

    pub fn size(&self) -> u64 {
        (self.max - self.min + 1) as u64 - self.holes.len() as u64
    }
}

impl Display for VariableSolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{} = {value}", self.name),
            None if self.holes.is_empty() => {
                write!(f, "{} in [{}, {}]", self.name, self.min, self.max)
            }
            None => write!(
                f,
                "{} in [{}, {}] \\ {:?}",
                self.name, self.min, self.max, self.holes
            ),
        }
    }
}

/// A named capture of the domains of a scope of variables.
///
/// A solution lives independently of the solver that produced it; it can be restored later (see
/// [`crate::Solver::restore_solution`]) or used to describe a neighbor in local search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SolverSolution {
    variables: BTreeMap<VariableId, VariableSolution>,
}

impl SolverSolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variable: VariableId, solution: VariableSolution) {
        let _ = self.variables.insert(variable, solution);
    }

    pub fn get(&self, variable: VariableId) -> Option<&VariableSolution> {
        self.variables.get(&variable)
    }

    /// Returns the value of `variable` if it is part of the solution and fixed.
    pub fn value(&self, variable: VariableId) -> Option<i64> {
        self.get(variable).and_then(VariableSolution::value)
    }

    /// Fixes `variable` to `value` in this solution, keeping the captured name if there is one.
    pub fn set_value(&mut self, variable: VariableId, value: i64) {
        let name = self
            .variables
            .get(&variable)
            .map(|solution| solution.name.clone())
            .unwrap_or_else(|| variable.to_string());
        self.insert(variable, VariableSolution::fixed(name, value));
    }

    /// Returns a copy of this solution in which `variable` is fixed to `value`.
    pub fn with_value(&self, variable: VariableId, value: i64) -> Self {
        let mut solution = self.clone();
        solution.set_value(variable, value);
        solution
    }

    pub fn contains(&self, variable: VariableId) -> bool {
        self.variables.contains_key(&variable)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Whether every captured variable is fixed.
    pub fn is_complete(&self) -> bool {
        self.variables.values().all(VariableSolution::is_fixed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, &VariableSolution)> + '_ {
        self.variables
            .iter()
            .map(|(&variable, solution)| (variable, solution))
    }

    /// The variables on which the two solutions disagree, including variables captured by only one
    /// of them.
    pub fn differences<'a>(&'a self, other: &'a SolverSolution) -> impl Iterator<Item = VariableId> + 'a {
        let changed = self
            .iter()
            .filter(|(variable, solution)| other.get(*variable) != Some(*solution))
            .map(|(variable, _)| variable);
        let added = other
            .iter()
            .filter(|(variable, _)| !self.contains(*variable))
            .map(|(variable, _)| variable);
        changed.chain(added)
    }
}

impl Display for SolverSolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, (_, solution)) in self.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{solution}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;

    fn var(index: usize) -> VariableId {
        VariableId::create_from_index(index)
    }

    #[test]
    fn holes_are_excluded_from_size_and_membership() {
        let solution = VariableSolution {
            name: "x".to_owned(),
            min: 1,
            max: 5,
            holes: vec![2, 4],
        };

        assert_eq!(3, solution.size());
        assert!(solution.contains(3));
        assert!(!solution.contains(4));
        assert_eq!(None, solution.value());
    }

    #[test]
    fn set_value_keeps_the_name() {
        let mut solution = SolverSolution::new();
        solution.insert(
            var(0),
            VariableSolution {
                name: "x".to_owned(),
                min: 0,
                max: 9,
                holes: vec![],
            },
        );

        solution.set_value(var(0), 4);

        assert_eq!(Some(4), solution.value(var(0)));
        assert_eq!("x = 4", solution.get(var(0)).unwrap().to_string());
    }

    #[test]
    fn differences_report_changed_and_added_variables() {
        let mut base = SolverSolution::new();
        base.insert(var(0), VariableSolution::fixed("x", 1));
        base.insert(var(1), VariableSolution::fixed("y", 2));

        let neighbor = base.with_value(var(1), 3).with_value(var(2), 0);

        assert_eq!(
            vec![var(1), var(2)],
            base.differences(&neighbor).collect::<Vec<_>>()
        );
    }
}
