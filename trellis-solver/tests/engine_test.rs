#![cfg(test)] // workaround for https://github.com/rust-lang/rust-clippy/issues/11024

mod helpers;

use helpers::init_logging;
use helpers::variables;
use trellis_solver::constraints::ArithmeticConstraint;
use trellis_solver::constraints::BoolTerm;
use trellis_solver::constraints::BooleanConstraint;
use trellis_solver::constraints::BooleanOperator;
use trellis_solver::constraints::GenericBooleanConstraint;
use trellis_solver::engine::ConstraintStore;
use trellis_solver::engine::VariableId;
use trellis_solver::generic::Fragment;
use trellis_solver::generic::GenericExpr;
use trellis_solver::generic::GenericIndex;
use trellis_solver::Solver;
use trellis_solver::SolverError;

fn and_gate() -> (Solver, [VariableId; 3]) {
    init_logging();
    let mut solver = Solver::default();
    let x = solver.add_boolean("x").unwrap();
    let y = solver.add_boolean("y").unwrap();
    let z = solver.add_boolean("z").unwrap();
    let _ = solver
        .add_constraint(BooleanConstraint::new(BooleanOperator::And, x, y, z), false)
        .unwrap();
    (solver, [x, y, z])
}

#[test]
fn and_with_a_false_input_is_false() {
    let (mut solver, [x, y, z]) = and_gate();

    let assignment = solver.store_solution([x]).with_value(x, 0);
    solver.restore_solution(&assignment).unwrap();

    assert_eq!(Some(0), solver.value(z));
    assert_eq!(None, solver.value(y));
}

#[test]
fn and_with_true_inputs_is_true() {
    let (mut solver, [x, y, z]) = and_gate();

    let assignment = solver
        .store_solution([x, y])
        .with_value(x, 1)
        .with_value(y, 1);
    solver.restore_solution(&assignment).unwrap();

    assert_eq!(Some(1), solver.value(z));
}

#[test]
fn true_and_forces_both_inputs() {
    let (mut solver, [x, y, z]) = and_gate();

    let assignment = solver.store_solution([z]).with_value(z, 1);
    solver.restore_solution(&assignment).unwrap();

    assert_eq!(Some(1), solver.value(x));
    assert_eq!(Some(1), solver.value(y));
}

#[test]
fn bound_change_inside_a_frame_is_undone_by_pop() {
    init_logging();
    let mut store = ConstraintStore::default();
    let x = store.add_variable("x", 0, 10).unwrap();
    let y = store.add_variable("y", 0, 10).unwrap();
    let _ = store
        .add_constraint(ArithmeticConstraint::less_or_equal(x, 2, y), false)
        .unwrap();
    store.propagate().unwrap();
    assert_eq!(2, store.lower_bound(y));

    store.push();
    store.set_lower_bound(x, 5).unwrap();
    store.propagate().unwrap();
    assert_eq!(7, store.lower_bound(y));
    store.pop().unwrap();

    assert_eq!(0, store.lower_bound(x));
    assert_eq!(2, store.lower_bound(y));
}

#[test]
fn propagating_a_fixpoint_again_changes_nothing() {
    init_logging();
    let mut store = ConstraintStore::default();
    let x = store.add_variable("x", 0, 10).unwrap();
    let y = store.add_variable("y", 0, 10).unwrap();
    let z = store.add_variable("z", 0, 10).unwrap();
    let _ = store
        .add_constraint(ArithmeticConstraint::sum(x, y, z), false)
        .unwrap();
    let _ = store
        .add_constraint(ArithmeticConstraint::less_or_equal(x, 3, y), false)
        .unwrap();
    store.propagate().unwrap();
    let fixpoint = store.capture_all();
    let runs = store.statistics().num_arc_executions;

    store.propagate().unwrap();

    assert_eq!(fixpoint, store.capture_all());
    assert_eq!(runs, store.statistics().num_arc_executions);
}

#[test]
fn fragment_of_a_variable_grid_selects_the_row_major_element() {
    let mut solver = Solver::default();
    let cells = variables(&mut solver, "m", 8, 0, 1);
    let i = GenericIndex::new("i", 4);
    let j = GenericIndex::new("j", 2);
    let grid = GenericExpr::new(vec![i.clone(), j.clone()], cells.clone()).unwrap();

    let fragment = grid.create_fragment(&[(i, 2), (j, 1)]).unwrap();

    assert_eq!(Fragment::Scalar(cells[5]), fragment);
}

#[test]
fn generic_family_propagates_every_row() {
    init_logging();
    let mut solver = Solver::default();
    let i = GenericIndex::new("i", 3);
    let inputs = variables(&mut solver, "a", 3, 0, 1);
    let outputs = variables(&mut solver, "b", 3, 0, 1);
    let enabled = solver.add_boolean("enabled").unwrap();
    let to_terms = |variables: &[VariableId]| {
        GenericExpr::new(
            vec![i.clone()],
            variables.iter().copied().map(BoolTerm::from).collect(),
        )
        .unwrap()
    };

    // b[i] = a[i] -> enabled
    let _ = solver
        .add_constraint(
            GenericBooleanConstraint::new(
                BooleanOperator::Implies,
                to_terms(&inputs),
                enabled,
                to_terms(&outputs),
            ),
            false,
        )
        .unwrap();

    let assignment = solver
        .store_solution([enabled, inputs[1]])
        .with_value(enabled, 0)
        .with_value(inputs[1], 1);
    solver.restore_solution(&assignment).unwrap();

    assert_eq!(None, solver.value(outputs[0]));
    assert_eq!(Some(0), solver.value(outputs[1]));
    assert_eq!(None, solver.value(outputs[2]));
}

#[test]
fn a_violated_constraint_makes_the_root_infeasible() {
    init_logging();
    let mut solver = Solver::default();
    let x = solver.add_variable("x", 0, 3).unwrap();
    let y = solver.add_variable("y", 0, 3).unwrap();

    let result = solver.add_constraint(ArithmeticConstraint::less_or_equal(x, 4, y), false);

    assert!(matches!(result, Err(SolverError::Infeasible(_))));
    assert!(solver.is_infeasible());
}

#[test]
fn unpropagated_changes_survive_a_model_edit() {
    init_logging();
    let mut solver = Solver::default();
    solver.set_auto_propagate(false);
    let xy = variables(&mut solver, "v", 2, 0, 10);
    let (x, y) = (xy[0], xy[1]);
    let _ = solver
        .add_constraint(ArithmeticConstraint::less_or_equal(x, 1, y), false)
        .unwrap();
    solver.propagate().unwrap();

    let assignment = solver.store_solution([x]).with_value(x, 5);
    solver.restore_solution(&assignment).unwrap();
    let _ = solver.add_boolean("flag").unwrap();
    solver.propagate().unwrap();

    assert_eq!(6, solver.lower_bound(y));
}

#[test]
fn equality_over_wide_domains_propagates() {
    init_logging();
    let mut solver = Solver::default();
    let xy = variables(&mut solver, "v", 2, 0, 1_000_000_000);
    let (x, y) = (xy[0], xy[1]);
    let _ = solver
        .add_constraint(ArithmeticConstraint::equal(x, y, 0), false)
        .unwrap();
    solver.propagate().unwrap();

    let assignment = solver.store_solution([y]).with_value(y, 123_456_789);
    solver.restore_solution(&assignment).unwrap();

    assert_eq!(Some(123_456_789), solver.value(x));
}
