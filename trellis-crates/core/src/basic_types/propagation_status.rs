use thiserror::Error;

use crate::engine::VariableId;

/// The result of running an arc or a full propagation pass. A pass either reaches a fixpoint or
/// detects that the current branch of the search space is infeasible.
pub type PropagationStatus = Result<(), PropagationFailure>;

/// Signals that the current branch of the search space is infeasible.
///
/// This is expected control flow rather than a defect; the search layer handles it by popping the
/// choice-point stack and trying another alternative.
#[derive(Error, Clone, Debug, Default, PartialEq, Eq)]
#[error("propagation failed (variable: {variable:?}, detected by: {detected_by:?})")]
pub struct PropagationFailure {
    /// The variable whose domain would have become empty, if it is known.
    pub variable: Option<VariableId>,
    /// The name of the arc or constraint which detected the failure.
    pub detected_by: Option<String>,
}

impl PropagationFailure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_variable(variable: VariableId) -> Self {
        Self {
            variable: Some(variable),
            detected_by: None,
        }
    }

    /// Attributes the failure to `name`, unless it was already attributed.
    pub fn detected_by(mut self, name: impl Into<String>) -> Self {
        if self.detected_by.is_none() {
            self.detected_by = Some(name.into());
        }
        self
    }
}

/// Returned by the domain mutators when a change would leave the domain of the contained variable
/// without values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmptyDomain(pub VariableId);

impl From<EmptyDomain> for PropagationFailure {
    fn from(EmptyDomain(variable): EmptyDomain) -> Self {
        PropagationFailure::on_variable(variable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;

    #[test]
    fn first_attribution_is_kept() {
        let failure = PropagationFailure::from(EmptyDomain(VariableId::create_from_index(3)))
            .detected_by("and")
            .detected_by("sum");

        assert_eq!(Some(VariableId::create_from_index(3)), failure.variable);
        assert_eq!(Some("and"), failure.detected_by.as_deref());
    }
}
