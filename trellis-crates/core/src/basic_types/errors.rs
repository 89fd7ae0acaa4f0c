use thiserror::Error;

use super::PropagationFailure;
use crate::choice_point::EntryId;

/// Errors caused by using the choice-point layer (or a structure registered with it) in a way that
/// violates its protocol. These indicate a programming mistake rather than a search outcome.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum IllegalStateError {
    /// A pop was requested while no frame is open.
    #[error("cannot pop the choice-point stack at depth 0")]
    PopWithoutPush,
    /// An entry was closed while it still had frames open.
    #[error("entry {entry} cannot be closed while it has {open_frames} open frame(s)")]
    EntryHasOpenFrames { entry: EntryId, open_frames: usize },
    /// The entry is not (or no longer) registered with the stack.
    #[error("entry {0} is not registered with this stack")]
    UnknownEntry(EntryId),
    /// A delta was applied to a stack other than the one which produced it.
    #[error("the delta was produced by a different choice-point stack")]
    ForeignDelta,
    /// Variables and constraints can only be added when no frame is open.
    #[error("this operation is only allowed at the root, but the depth is {depth}")]
    NotAtRoot { depth: usize },
    /// A search continuation was requested while no search is active.
    #[error("there is no active search")]
    NoActiveSearch,
}

/// Errors caused by malformed requests on generic (tensor indexed) expressions.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum GenericIndexError {
    #[error("index '{0}' is not spanned by the expression")]
    UnknownIndex(String),
    #[error("coordinate {coordinate} is out of range for index '{index}' of size {size}")]
    CoordinateOutOfRange {
        index: String,
        coordinate: usize,
        size: usize,
    },
    #[error("index '{0}' has no current value")]
    UnboundIndex(String),
    #[error("index '{0}' occurs more than once")]
    DuplicateIndex(String),
    #[error("expected {expected} element(s) but {actual} were provided")]
    ShapeMismatch { expected: usize, actual: usize },
}

/// The error returned by the operations of the [`crate::Solver`] and the
/// [`crate::engine::ConstraintStore`].
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SolverError {
    /// The operation led to infeasibility at the root.
    #[error("the problem is infeasible at the root: {0}")]
    Infeasible(#[from] PropagationFailure),
    #[error(transparent)]
    IllegalState(#[from] IllegalStateError),
    #[error(transparent)]
    GenericIndex(#[from] GenericIndexError),
}
