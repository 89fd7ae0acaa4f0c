//! The search algebra: combinators over [`SearchAction`]s and the built-in actions which modify
//! the domains.
use std::rc::Rc;

use log::trace;

use super::action::perform_chain;
use super::fn_action;
use super::ActionError;
use super::ActionOutcome;
use super::ActionRef;
use super::ActionResult;
use super::SearchAction;
use super::SearchContext;
use crate::basic_types::PropagationFailure;
use crate::basic_types::SolverSolution;
use crate::engine::VariableId;
use crate::propagation::ReadDomains;

/// Runs `actions` one after the other in the same node.
///
/// When one of them branches, the remaining actions are appended to every alternative, so that
/// they run in each of the child nodes.
pub fn combine(actions: impl IntoIterator<Item = ActionRef>) -> ActionRef {
    Rc::new(Combine {
        head: None,
        rest: actions.into_iter().collect(),
        start: 0,
    })
}

#[derive(Debug)]
struct Combine {
    /// Runs before `rest[start..]`; set when an alternative is distributed over the remainder.
    head: Option<ActionRef>,
    rest: Rc<[ActionRef]>,
    start: usize,
}

impl Combine {
    fn followed_by_rest(&self, action: ActionRef, start: usize) -> ActionRef {
        if start >= self.rest.len() {
            return action;
        }
        Rc::new(Combine {
            head: Some(action),
            rest: Rc::clone(&self.rest),
            start,
        })
    }
}

impl SearchAction for Combine {
    fn perform(&self, context: &mut SearchContext<'_>) -> ActionResult {
        let pending = self
            .head
            .iter()
            .map(|head| (head, self.start))
            .chain(
                self.rest[self.start..]
                    .iter()
                    .enumerate()
                    .map(|(offset, action)| (action, self.start + offset + 1)),
            );

        for (action, continue_at) in pending {
            match action.perform(context)? {
                ActionOutcome::Complete => {}
                ActionOutcome::Next(next) => {
                    return Ok(ActionOutcome::Next(self.followed_by_rest(next, continue_at)));
                }
                ActionOutcome::Choice(alternatives) => {
                    return Ok(ActionOutcome::Choice(
                        alternatives
                            .into_iter()
                            .map(|alternative| self.followed_by_rest(alternative, continue_at))
                            .collect(),
                    ));
                }
            }
        }

        Ok(ActionOutcome::Complete)
    }
}

/// Branches into one child node per alternative.
pub fn choice(alternatives: impl IntoIterator<Item = ActionRef>) -> ActionRef {
    Rc::new(Choice {
        alternatives: alternatives.into_iter().collect(),
    })
}

#[derive(Debug)]
struct Choice {
    alternatives: Vec<ActionRef>,
}

impl SearchAction for Choice {
    fn perform(&self, _: &mut SearchContext<'_>) -> ActionResult {
        Ok(ActionOutcome::Choice(self.alternatives.clone()))
    }
}

/// Tentatively runs `trial` inside a new frame, which is always popped, and then continues with
/// `on_success` or `on_failure` depending on whether the trial failed.
///
/// A trial which branches counts as a success.
pub fn look_ahead(trial: ActionRef, on_success: ActionRef, on_failure: ActionRef) -> ActionRef {
    Rc::new(LookAhead {
        trial,
        on_success,
        on_failure,
    })
}

#[derive(Debug)]
struct LookAhead {
    trial: ActionRef,
    on_success: ActionRef,
    on_failure: ActionRef,
}

impl SearchAction for LookAhead {
    fn perform(&self, context: &mut SearchContext<'_>) -> ActionResult {
        context.store.push();
        let result = perform_chain(&self.trial, context);
        context.store.pop()?;

        match result {
            Ok(_) => Ok(ActionOutcome::Next(Rc::clone(&self.on_success))),
            Err(ActionError::Failure(failure)) => {
                trace!("Look-ahead trial failed: {failure}");
                Ok(ActionOutcome::Next(Rc::clone(&self.on_failure)))
            }
            Err(fatal) => Err(fatal),
        }
    }
}

/// Fixes `variable` to `value` and propagates.
pub fn assign(variable: VariableId, value: i64) -> ActionRef {
    fn_action(format!("{variable} = {value}"), move |context| {
        context.store.assign(variable, value)?;
        context.store.propagate()?;
        Ok(ActionOutcome::Complete)
    })
}

/// Raises the lower bound of `variable` to `value` and propagates.
pub fn set_min(variable: VariableId, value: i64) -> ActionRef {
    fn_action(format!("{variable} >= {value}"), move |context| {
        context.store.set_lower_bound(variable, value)?;
        context.store.propagate()?;
        Ok(ActionOutcome::Complete)
    })
}

/// Lowers the upper bound of `variable` to `value` and propagates.
pub fn set_max(variable: VariableId, value: i64) -> ActionRef {
    fn_action(format!("{variable} <= {value}"), move |context| {
        context.store.set_upper_bound(variable, value)?;
        context.store.propagate()?;
        Ok(ActionOutcome::Complete)
    })
}

/// Removes `value` from the domain of `variable` and propagates.
pub fn remove_value(variable: VariableId, value: i64) -> ActionRef {
    fn_action(format!("{variable} != {value}"), move |context| {
        context.store.remove_value(variable, value)?;
        context.store.propagate()?;
        Ok(ActionOutcome::Complete)
    })
}

pub fn propagate() -> ActionRef {
    fn_action("propagate", |context| {
        context.store.propagate()?;
        Ok(ActionOutcome::Complete)
    })
}

/// Narrows the domains to the captured ones and propagates.
pub fn restore(solution: SolverSolution) -> ActionRef {
    fn_action("restore", move |context| {
        context.store.restore(&solution)?;
        Ok(ActionOutcome::Complete)
    })
}

/// Always fails.
pub fn fail() -> ActionRef {
    fn_action("fail", |_| {
        Err(ActionError::Failure(
            PropagationFailure::new().detected_by("fail"),
        ))
    })
}

/// Does nothing; a node which only runs this action is a leaf.
pub fn complete() -> ActionRef {
    fn_action("complete", |_| Ok(ActionOutcome::Complete))
}

/// Which unfixed variable [`generate`] branches on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VariableOrder {
    /// The first unfixed variable in the given order.
    #[default]
    InputOrder,
    /// The unfixed variable with the fewest values; ties go to the earliest.
    SmallestDomain,
}

/// Which value of the selected variable [`generate`] tries first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ValueOrder {
    #[default]
    Min,
    Max,
    /// A uniformly random value of the domain.
    Random,
}

/// Labelling: branches on an unfixed variable of `variables` with the binary choice
/// `variable = value` or `variable != value`, until every variable is fixed.
pub fn generate(
    variables: impl IntoIterator<Item = VariableId>,
    variable_order: VariableOrder,
    value_order: ValueOrder,
) -> ActionRef {
    Rc::new(Generate {
        variables: variables.into_iter().collect(),
        variable_order,
        value_order,
    })
}

#[derive(Debug)]
struct Generate {
    variables: Rc<[VariableId]>,
    variable_order: VariableOrder,
    value_order: ValueOrder,
}

impl Generate {
    fn select_variable(&self, context: &SearchContext<'_>) -> Option<VariableId> {
        let domains = context.store.domains();
        let mut unfixed = self
            .variables
            .iter()
            .copied()
            .filter(|&variable| !domains.is_fixed(variable));

        match self.variable_order {
            VariableOrder::InputOrder => unfixed.next(),
            VariableOrder::SmallestDomain => {
                unfixed.min_by_key(|&variable| domains.size(variable))
            }
        }
    }

    fn select_value(&self, variable: VariableId, context: &mut SearchContext<'_>) -> i64 {
        match self.value_order {
            ValueOrder::Min => context.store.lower_bound(variable),
            ValueOrder::Max => context.store.upper_bound(variable),
            ValueOrder::Random => {
                let size = usize::try_from(context.store.domains().size(variable))
                    .unwrap_or(usize::MAX);
                let n = context.random.generate_usize_in_range(0..size);
                context
                    .store
                    .domains()
                    .nth_value(variable, n as u64)
                    .unwrap_or_else(|| context.store.lower_bound(variable))
            }
        }
    }
}

impl SearchAction for Generate {
    fn perform(&self, context: &mut SearchContext<'_>) -> ActionResult {
        let Some(variable) = self.select_variable(context) else {
            return Ok(ActionOutcome::Complete);
        };
        let value = self.select_value(variable, context);
        trace!("Branching on {variable} = {value}");

        let remainder: ActionRef = Rc::new(Generate {
            variables: Rc::clone(&self.variables),
            variable_order: self.variable_order,
            value_order: self.value_order,
        });
        Ok(ActionOutcome::Choice(vec![
            combine([assign(variable, value), Rc::clone(&remainder)]),
            combine([remove_value(variable, value), remainder]),
        ]))
    }
}
