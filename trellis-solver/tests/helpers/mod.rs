//! Shared set-up for the integration tests.
#![allow(
    dead_code,
    reason = "is used in integration tests but unable to find a way to silence these warnings"
)]

use trellis_solver::engine::VariableId;
use trellis_solver::Solver;
use trellis_solver::SolverSolution;

/// Routes the log output of the solver through the test harness.
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn variables(
    solver: &mut Solver,
    prefix: &str,
    count: usize,
    min: i64,
    max: i64,
) -> Vec<VariableId> {
    (0..count)
        .map(|index| {
            solver
                .add_variable(format!("{prefix}{index}"), min, max)
                .expect("variables can be added at the root")
        })
        .collect()
}

pub(crate) fn values(solution: &SolverSolution, variables: &[VariableId]) -> Vec<i64> {
    variables
        .iter()
        .map(|&variable| {
            solution
                .value(variable)
                .expect("every variable of a solution is fixed")
        })
        .collect()
}
