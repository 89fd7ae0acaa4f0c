//! # Trellis
//! A constraint propagation and search engine.
//!
//! Variables have integer domains which only narrow. Constraints post arcs into a
//! [`engine::ConstraintGraph`], which runs them until a fixpoint or until a domain becomes empty.
//! All mutable state lives in entries of a [`choice_point::ChoicePointStack`], so that a search
//! can undo any amount of narrowing with a single pop.
//!
//! The search is driven by lazily evaluated [`search::SearchAction`]s: an action narrows domains
//! and then completes its node, continues with another action, or branches. A
//! [`search::SearchTechnique`] decides the order in which open nodes are activated, a
//! [`search::SearchGoal`] which complete nodes are solutions, and a [`search::SearchLimit`] when to
//! stop. Found solutions can be improved with local search over [`neighborhoods`].
//!
//! # Example
//! ```rust
//! # use trellis_core::constraints::BooleanConstraint;
//! # use trellis_core::constraints::BooleanOperator;
//! # use trellis_core::Solver;
//! let mut solver = Solver::default();
//! let x = solver.add_boolean("x").unwrap();
//! let y = solver.add_boolean("y").unwrap();
//! let z = solver.add_boolean("z").unwrap();
//!
//! // z = x and y
//! let _ = solver
//!     .add_constraint(BooleanConstraint::new(BooleanOperator::And, x, y, z), false)
//!     .unwrap();
//!
//! let z_true = solver.store_solution([z]).with_value(z, 1);
//! solver.restore_solution(&z_true).unwrap();
//! assert_eq!(Some(1), solver.value(x));
//! assert_eq!(Some(1), solver.value(y));
//! ```
pub(crate) mod basic_types;
pub mod choice_point;
pub mod constraints;
pub mod containers;
pub mod engine;
pub mod generic;
pub mod neighborhoods;
pub mod propagation;
pub mod search;
pub mod statistics;

#[doc(hidden)]
pub mod asserts;

pub use convert_case;
pub use rand;

// We declare a private module with public use, so that all exports from API are exports directly
// from the crate.
mod api;

pub use api::*;

pub use crate::api::solver::Solver;
pub use crate::basic_types::EmptyDomain;
pub use crate::basic_types::GenericIndexError;
pub use crate::basic_types::IllegalStateError;
pub use crate::basic_types::PropagationFailure;
pub use crate::basic_types::PropagationStatus;
pub use crate::basic_types::Random;
pub use crate::basic_types::SolverError;
pub use crate::basic_types::SolverSolution;
pub use crate::basic_types::VariableSolution;
