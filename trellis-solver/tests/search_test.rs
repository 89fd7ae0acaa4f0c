#![cfg(test)] // workaround for https://github.com/rust-lang/rust-clippy/issues/11024

mod helpers;

use std::rc::Rc;

use helpers::init_logging;
use helpers::values;
use helpers::variables;
use trellis_solver::constraints::ArithmeticConstraint;
use trellis_solver::engine::VariableId;
use trellis_solver::search::assign;
use trellis_solver::search::combine;
use trellis_solver::search::generate;
use trellis_solver::search::look_ahead;
use trellis_solver::search::AnySolution;
use trellis_solver::search::BreadthFirst;
use trellis_solver::search::DepthFirst;
use trellis_solver::search::LimitedDiscrepancy;
use trellis_solver::search::NoLimit;
use trellis_solver::search::NodeLimit;
use trellis_solver::search::ValueOrder;
use trellis_solver::search::VariableOrder;
use trellis_solver::IteratedSolution;
use trellis_solver::SolveResult;
use trellis_solver::Solver;

fn all_different(solver: &mut Solver, variables: &[VariableId]) {
    for (index, &first) in variables.iter().enumerate() {
        for &second in &variables[index + 1..] {
            let _ = solver
                .add_constraint(ArithmeticConstraint::not_equal(first, second, 0), false)
                .unwrap();
        }
    }
}

#[test]
fn node_limit_stops_after_exactly_that_many_activations() {
    init_logging();
    let mut solver = Solver::default();
    // Five pairwise different values out of four: the tree has no solution and more than ten
    // nodes.
    let pigeons = variables(&mut solver, "p", 5, 0, 3);
    all_different(&mut solver, &pigeons);

    let result = solver
        .solve(
            generate(pigeons, VariableOrder::InputOrder, ValueOrder::Min),
            AnySolution,
            DepthFirst::new(),
            NodeLimit::new(10),
            true,
            false,
        )
        .unwrap();

    assert_eq!(SolveResult::Unknown, result);
    assert_eq!(10, solver.search_statistics().num_activations);
    assert_eq!(0, solver.store().depth());
    assert!(!solver.is_infeasible());
}

#[test]
fn exhausting_the_tree_without_solutions_is_unsatisfiable() {
    init_logging();
    let mut solver = Solver::default();
    let pigeons = variables(&mut solver, "p", 4, 0, 2);
    all_different(&mut solver, &pigeons);

    let result = solver
        .solve_action(generate(pigeons, VariableOrder::InputOrder, ValueOrder::Min))
        .unwrap();

    assert_eq!(SolveResult::Unsatisfiable, result);
}

#[test]
fn iterating_finds_every_solution_once() {
    init_logging();
    let mut solver = Solver::default();
    let xs = variables(&mut solver, "x", 3, 0, 2);
    all_different(&mut solver, &xs);

    let first = solver
        .solve(
            generate(xs.clone(), VariableOrder::SmallestDomain, ValueOrder::Min),
            AnySolution,
            DepthFirst::new(),
            NoLimit,
            false,
            false,
        )
        .unwrap();
    let SolveResult::Satisfiable(first) = first else {
        panic!("the problem has solutions");
    };
    // The state of the solution stays visible until the search continues.
    assert_eq!(Some(values(&first, &xs)[0]), solver.value(xs[0]));

    let mut known = vec![values(&first, &xs)];
    loop {
        match solver.next_solution().unwrap() {
            IteratedSolution::Solution(solution) => {
                let found = values(&solution, &xs);
                assert!(found[0] != found[1] && found[0] != found[2] && found[1] != found[2]);
                assert!(!known.contains(&found));
                known.push(found);
            }
            IteratedSolution::Finished => break,
            IteratedSolution::Unknown => panic!("the search has no limit"),
        }
    }

    assert_eq!(6, known.len());
    assert!(solver.next_solution().is_err());
}

#[test]
fn breadth_first_finds_the_same_solutions() {
    init_logging();
    let mut solver = Solver::default();
    let xs = variables(&mut solver, "x", 3, 0, 2);
    all_different(&mut solver, &xs);

    let mut found = vec![];
    let mut result = solver
        .solve(
            generate(xs.clone(), VariableOrder::InputOrder, ValueOrder::Max),
            AnySolution,
            BreadthFirst::new(),
            NoLimit,
            false,
            false,
        )
        .unwrap()
        .solution()
        .map(|solution| values(solution, &xs));
    while let Some(solution) = result {
        found.push(solution);
        result = match solver.next_solution().unwrap() {
            IteratedSolution::Solution(solution) => Some(values(&solution, &xs)),
            _ => None,
        };
    }

    found.sort();
    assert_eq!(
        vec![
            vec![0, 1, 2],
            vec![0, 2, 1],
            vec![1, 0, 2],
            vec![1, 2, 0],
            vec![2, 0, 1],
            vec![2, 1, 0]
        ],
        found
    );
    assert!(solver.search_statistics().num_replayed_actions > 0);
}

#[test]
fn minimisation_proves_optimality() {
    init_logging();
    let mut solver = Solver::default();
    let x = solver.add_variable("x", 0, 10).unwrap();
    let y = solver.add_variable("y", 0, 10).unwrap();
    let cost = solver.add_variable("cost", 0, 20).unwrap();
    let _ = solver
        .add_constraint(ArithmeticConstraint::sum(x, y, cost), false)
        .unwrap();
    let _ = solver
        .add_constraint(ArithmeticConstraint::less_or_equal(x, 4, y), false)
        .unwrap();

    let result = solver
        .minimize(
            generate(vec![x, y], VariableOrder::InputOrder, ValueOrder::Max),
            cost,
            DepthFirst::new(),
            NoLimit,
        )
        .unwrap();

    let SolveResult::Optimal(solution) = result else {
        panic!("expected an optimal solution, got {result:?}");
    };
    assert_eq!(vec![0, 4, 4], values(&solution, &[x, y, cost]));
    assert!(solver.search_statistics().num_solutions > 1);
    assert_eq!(0, solver.store().depth());
}

#[test]
fn maximisation_respects_the_objective_domain() {
    init_logging();
    let mut solver = Solver::default();
    let x = solver.add_variable("x", 0, 5).unwrap();
    let y = solver.add_variable("y", 0, 5).unwrap();
    let total = solver.add_variable("total", 0, 7).unwrap();
    let _ = solver
        .add_constraint(ArithmeticConstraint::sum(x, y, total), false)
        .unwrap();

    let result = solver
        .maximize(
            generate(vec![x, y], VariableOrder::InputOrder, ValueOrder::Min),
            total,
            DepthFirst::new(),
            NoLimit,
        )
        .unwrap();

    let SolveResult::Optimal(solution) = result else {
        panic!("expected an optimal solution, got {result:?}");
    };
    assert_eq!(Some(7), solution.value(total));
}

#[test]
fn pruning_technique_does_not_claim_optimality() {
    init_logging();
    let mut solver = Solver::default();
    let x = solver.add_variable("x", 0, 10).unwrap();
    let y = solver.add_variable("y", 0, 10).unwrap();
    let cost = solver.add_variable("cost", 0, 20).unwrap();
    let _ = solver
        .add_constraint(ArithmeticConstraint::sum(x, y, cost), false)
        .unwrap();
    let _ = solver
        .add_constraint(ArithmeticConstraint::less_or_equal(x, 4, y), false)
        .unwrap();

    let result = solver
        .minimize(
            generate(vec![x, y], VariableOrder::InputOrder, ValueOrder::Max),
            cost,
            LimitedDiscrepancy::new(0),
            NoLimit,
        )
        .unwrap();

    // Without discrepancies only the first branch of every choice is explored.
    let SolveResult::Satisfiable(solution) = result else {
        panic!("expected a non-proven solution, got {result:?}");
    };
    assert_eq!(vec![6, 10, 16], values(&solution, &[x, y, cost]));
}

#[test]
fn look_ahead_takes_the_failure_branch_for_an_inconsistent_trial() {
    init_logging();
    let mut solver = Solver::default();
    let x = solver.add_variable("x", 0, 5).unwrap();
    let y = solver.add_variable("y", 0, 5).unwrap();
    // y = x + 3
    let _ = solver
        .add_constraint(ArithmeticConstraint::equal(y, x, 3), false)
        .unwrap();

    let label = generate(vec![x, y], VariableOrder::InputOrder, ValueOrder::Min);
    let action = look_ahead(
        assign(x, 4),
        combine([assign(x, 4), Rc::clone(&label)]),
        combine([assign(x, 1), label]),
    );
    let result = solver.solve_action(action).unwrap();

    let solution = result.solution().expect("the failure branch is consistent");
    assert_eq!(vec![1, 4], values(solution, &[x, y]));
}

#[test]
fn solving_with_reset_drops_temporary_constraints() {
    init_logging();
    let mut solver = Solver::default();
    let x = solver.add_variable("x", 0, 3).unwrap();
    let y = solver.add_variable("y", 0, 3).unwrap();
    let _ = solver
        .add_constraint(ArithmeticConstraint::less_or_equal(x, 1, y), true)
        .unwrap();
    let _ = solver
        .add_constraint(ArithmeticConstraint::equal(y, x, 3), false)
        .unwrap();
    assert_eq!(Some(0), solver.value(x));

    let result = solver
        .solve(
            generate(vec![x, y], VariableOrder::InputOrder, ValueOrder::Max),
            AnySolution,
            DepthFirst::new(),
            NoLimit,
            false,
            true,
        )
        .unwrap();

    let solution = result.solution().expect("the kept constraint is satisfiable");
    assert_eq!(vec![2, 3], values(solution, &[x, y]));
}
