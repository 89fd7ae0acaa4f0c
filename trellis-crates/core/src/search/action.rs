use std::fmt::Debug;
use std::fmt::Formatter;
use std::rc::Rc;

use thiserror::Error;

use crate::basic_types::IllegalStateError;
use crate::basic_types::PropagationFailure;
use crate::basic_types::Random;
use crate::basic_types::SolverError;
use crate::engine::ConstraintStore;

/// What a [`SearchAction`] has access to while it runs.
pub struct SearchContext<'a> {
    pub store: &'a mut ConstraintStore,
    pub random: &'a mut dyn Random,
}

impl<'a> SearchContext<'a> {
    pub fn new(store: &'a mut ConstraintStore, random: &'a mut dyn Random) -> Self {
        SearchContext { store, random }
    }
}

impl Debug for SearchContext<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("depth", &self.store.depth())
            .finish_non_exhaustive()
    }
}

/// Why a [`SearchAction`] did not produce an outcome.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ActionError {
    /// The current branch is infeasible; the search backtracks.
    #[error(transparent)]
    Failure(#[from] PropagationFailure),
    /// The search cannot continue.
    #[error(transparent)]
    Fatal(#[from] SolverError),
}

impl From<IllegalStateError> for ActionError {
    fn from(error: IllegalStateError) -> Self {
        ActionError::Fatal(error.into())
    }
}

pub type ActionRef = Rc<dyn SearchAction>;

/// How the search continues after an action ran.
#[derive(Clone, Debug)]
pub enum ActionOutcome {
    /// The node is a leaf which is consistent with every constraint.
    Complete,
    /// Continue with the given action in the same node.
    Next(ActionRef),
    /// The node branches: every alternative becomes an open child node.
    Choice(Vec<ActionRef>),
}

pub type ActionResult = Result<ActionOutcome, ActionError>;

/// A lazy unit of search work.
///
/// Actions are only performed when the node they belong to is activated, and may be performed more
/// than once when a search technique revisits a node; they should therefore only depend on the
/// state of the [`SearchContext`].
pub trait SearchAction: Debug {
    fn perform(&self, context: &mut SearchContext<'_>) -> ActionResult;
}

/// Performs `action` and every action it continues with, until it completes or branches.
pub(crate) fn perform_chain(
    action: &ActionRef,
    context: &mut SearchContext<'_>,
) -> ActionResult {
    let mut current = Rc::clone(action);
    loop {
        match current.perform(context)? {
            ActionOutcome::Next(next) => current = next,
            outcome => return Ok(outcome),
        }
    }
}

/// A [`SearchAction`] defined by a closure.
pub struct FnAction<F> {
    name: String,
    function: F,
}

impl<F> Debug for FnAction<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FnAction").field(&self.name).finish()
    }
}

impl<F> SearchAction for FnAction<F>
where
    F: Fn(&mut SearchContext<'_>) -> ActionResult,
{
    fn perform(&self, context: &mut SearchContext<'_>) -> ActionResult {
        (self.function)(context)
    }
}

/// Wraps a closure into an action; `name` is only used for debugging.
pub fn fn_action<F>(name: impl Into<String>, function: F) -> ActionRef
where
    F: Fn(&mut SearchContext<'_>) -> ActionResult + 'static,
{
    Rc::new(FnAction {
        name: name.into(),
        function,
    })
}
