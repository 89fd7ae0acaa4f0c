use crate::engine::QueueOrder;

/// Options for the [`crate::Solver`] which determine how it behaves.
#[derive(Clone, Copy, Debug)]
pub struct SolverOptions {
    /// Whether the root is propagated after every posted constraint, restored solution and reset.
    pub auto_propagate: bool,
    /// The seed of the random generator handed to randomised search actions and neighborhoods.
    pub random_seed: u64,
    /// The order in which scheduled arcs are run.
    pub queue_order: QueueOrder,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            auto_propagate: true,
            random_seed: 42,
            queue_order: QueueOrder::default(),
        }
    }
}
