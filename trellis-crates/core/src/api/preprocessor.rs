use std::fmt::Debug;

use crate::basic_types::PropagationStatus;
use crate::engine::ConstraintStore;
#[cfg(doc)]
use crate::Solver;

/// Tightens the root domains every time the [`Solver`] is reset, before the root is propagated.
///
/// A failure makes the problem infeasible until the next reset.
pub trait Preprocessor: Debug {
    fn name(&self) -> &str;

    fn preprocess(&mut self, store: &mut ConstraintStore) -> PropagationStatus;
}
