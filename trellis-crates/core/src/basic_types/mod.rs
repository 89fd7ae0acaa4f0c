mod errors;
mod propagation_status;
mod random;
mod solution;
mod undo_log;

pub use errors::*;
pub use propagation_status::*;
pub use random::Random;
#[cfg(test)]
pub(crate) use random::tests::TestRandom;
pub use solution::*;
pub(crate) use undo_log::UndoLog;
