//! The propagation engine: the domains of the variables, the [`ConstraintGraph`] which runs arcs
//! to a fixpoint, and the [`ConstraintStore`] which ties both to the choice-point stack.
mod change_queue;
mod constraint_store;
mod domains;
mod graph;
mod variables;

pub use change_queue::QueueOrder;
pub(crate) use change_queue::ChangeQueue;
pub(crate) use change_queue::PendingChange;
pub use constraint_store::ConstraintStore;
pub use domains::DomainView;
pub(crate) use domains::DomainEvent;
pub(crate) use domains::Domains;
pub use graph::ConstraintGraph;
pub use graph::PropagationStatistics;
pub use variables::VariableId;
