//! # Trellis
//! Trellis is a constraint propagation and search engine. Problems are stated over integer
//! variables, constraints narrow their domains through arc consistency, and solutions are found by
//! a backtracking search whose state is kept entirely on a choice-point stack.
//!
//! # Using Trellis
//! The first step is **adding variables** and **posting constraints**:
//! ```rust
//! # use trellis_solver::constraints::ArithmeticConstraint;
//! # use trellis_solver::Solver;
//! let mut solver = Solver::default();
//!
//! let x = solver.add_variable("x", 0, 10).unwrap();
//! let y = solver.add_variable("y", 0, 10).unwrap();
//! let cost = solver.add_variable("cost", 0, 20).unwrap();
//!
//! // x + y = cost
//! let _ = solver
//!     .add_constraint(ArithmeticConstraint::sum(x, y, cost), false)
//!     .unwrap();
//! // x + 4 <= y
//! let _ = solver
//!     .add_constraint(ArithmeticConstraint::less_or_equal(x, 4, y), false)
//!     .unwrap();
//! ```
//!
//! Then a search is described by an action, which here labels the variables:
//! ```rust
//! # use trellis_solver::constraints::ArithmeticConstraint;
//! # use trellis_solver::search::generate;
//! # use trellis_solver::search::DepthFirst;
//! # use trellis_solver::search::NoLimit;
//! # use trellis_solver::search::ValueOrder;
//! # use trellis_solver::search::VariableOrder;
//! # use trellis_solver::SolveResult;
//! # use trellis_solver::Solver;
//! # let mut solver = Solver::default();
//! # let x = solver.add_variable("x", 0, 10).unwrap();
//! # let y = solver.add_variable("y", 0, 10).unwrap();
//! # let cost = solver.add_variable("cost", 0, 20).unwrap();
//! # let _ = solver.add_constraint(ArithmeticConstraint::sum(x, y, cost), false).unwrap();
//! # let _ = solver.add_constraint(ArithmeticConstraint::less_or_equal(x, 4, y), false).unwrap();
//! let action = generate(vec![x, y], VariableOrder::InputOrder, ValueOrder::Max);
//! let result = solver
//!     .minimize(action, cost, DepthFirst::new(), NoLimit)
//!     .unwrap();
//!
//! let SolveResult::Optimal(solution) = result else {
//!     panic!("the search space is small enough to be exhausted");
//! };
//! assert_eq!(Some(4), solution.value(cost));
//! ```
pub use trellis_core::*;
