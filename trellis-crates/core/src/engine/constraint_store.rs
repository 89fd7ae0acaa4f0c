use log::debug;
use log::info;

use super::ConstraintGraph;
use super::DomainEvent;
use super::DomainView;
use super::Domains;
use super::PropagationStatistics;
use super::QueueOrder;
use super::VariableId;
use crate::basic_types::IllegalStateError;
use crate::basic_types::PropagationFailure;
use crate::basic_types::PropagationStatus;
use crate::basic_types::SolverError;
use crate::basic_types::SolverSolution;
use crate::basic_types::VariableSolution;
use crate::choice_point::ChoicePointStack;
use crate::choice_point::EntryHandle;
use crate::choice_point::ReversibleArray;
use crate::choice_point::StackDelta;
use crate::constraints::Constraint;
use crate::constraints::ConstraintId;
use crate::constraints::Truth;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::propagation::ArcId;
use crate::propagation::ReadDomains;
use crate::trellis_assert_eq_simple;

#[derive(Debug)]
struct PostedConstraint {
    constraint: Box<dyn Constraint>,
    arcs: Vec<ArcId>,
    keep_after_reset: bool,
}

/// Owns the variables, the constraints and the choice-point stack on which their state lives.
///
/// Variables and constraints can only be added at the root (depth 0). Changes made through the
/// store are recorded for the next call to [`ConstraintStore::propagate`]. A pop forgets the
/// unpropagated changes made inside the popped frame and reinstates those which were pending when
/// the frame was opened.
#[derive(Debug)]
pub struct ConstraintStore {
    stack: ChoicePointStack,
    domains: Domains,
    graph: ConstraintGraph,
    constraints: KeyedVec<ConstraintId, Option<PostedConstraint>>,
    /// The cached truth of every constraint; reversible so that a decided truth is forgotten once
    /// the stack pops past the frame in which it was decided.
    truths: EntryHandle<ReversibleArray<Truth>>,
    infeasible: bool,
    queue_order: QueueOrder,
}

impl Default for ConstraintStore {
    fn default() -> Self {
        ConstraintStore::new(QueueOrder::default())
    }
}

impl ConstraintStore {
    pub fn new(queue_order: QueueOrder) -> Self {
        let mut stack = ChoicePointStack::new();
        let domains = Domains::new(&mut stack);
        let truths = stack.register(ReversibleArray::default());

        ConstraintStore {
            stack,
            domains,
            graph: ConstraintGraph::new(queue_order),
            constraints: KeyedVec::default(),
            truths,
            infeasible: false,
            queue_order,
        }
    }

    pub fn stack(&self) -> &ChoicePointStack {
        &self.stack
    }

    /// Direct access to the stack, e.g. to register additional entries.
    ///
    /// Frames pushed through the returned reference do not save the pending changes of the store;
    /// when such a frame is popped through the store, nothing is left pending.
    pub fn stack_mut(&mut self) -> &mut ChoicePointStack {
        &mut self.stack
    }

    pub fn graph(&self) -> &ConstraintGraph {
        &self.graph
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn push(&mut self) {
        self.graph.save_pending(self.stack.depth());
        self.stack.push();
    }

    pub fn pop(&mut self) -> Result<(), IllegalStateError> {
        self.stack.pop()?;
        self.graph.restore_pending(self.stack.depth());
        Ok(())
    }

    /// Pops frames until the stack is at `depth`; does nothing if it is not deeper than that.
    pub fn pop_to(&mut self, depth: usize) -> Result<(), IllegalStateError> {
        if self.stack.depth() <= depth {
            return Ok(());
        }
        self.stack.pop_to(depth)?;
        self.graph.restore_pending(depth);
        Ok(())
    }

    /// Pops the innermost frame and returns the changes made inside it.
    pub fn pop_delta(&mut self) -> Result<StackDelta, IllegalStateError> {
        let delta = self.stack.pop_delta()?;
        self.graph.restore_pending(self.stack.depth());
        Ok(delta)
    }

    /// Opens a frame in which `delta` is re-applied. The re-applied state is assumed to be
    /// propagated already, so no arcs are triggered by it.
    pub fn push_delta(&mut self, delta: &StackDelta) -> Result<(), IllegalStateError> {
        let depth = self.stack.depth();
        self.stack.push_delta(delta)?;
        self.graph.save_pending(depth);
        Ok(())
    }

    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        min: i64,
        max: i64,
    ) -> Result<VariableId, SolverError> {
        self.check_at_root()?;

        let name = name.into();
        if min > max {
            return Err(SolverError::Infeasible(
                PropagationFailure::new().detected_by(format!("declaration of '{name}'")),
            ));
        }

        let variable = self.domains.add_variable(&mut self.stack, name, min, max);
        self.graph.add_variable(variable);
        Ok(variable)
    }

    pub fn add_boolean(&mut self, name: impl Into<String>) -> Result<VariableId, SolverError> {
        self.add_variable(name, 0, 1)
    }

    pub fn num_variables(&self) -> usize {
        self.domains.num_variables()
    }

    pub fn variables(&self) -> impl Iterator<Item = VariableId> {
        self.domains.variables()
    }

    pub fn variable_name(&self, variable: VariableId) -> &str {
        self.domains.name(variable)
    }

    pub fn domains(&self) -> DomainView<'_> {
        self.domains.view(&self.stack)
    }

    pub fn lower_bound(&self, variable: VariableId) -> i64 {
        self.domains.lower_bound(&self.stack, variable)
    }

    pub fn upper_bound(&self, variable: VariableId) -> i64 {
        self.domains.upper_bound(&self.stack, variable)
    }

    pub fn contains(&self, variable: VariableId, value: i64) -> bool {
        self.domains().contains(variable, value)
    }

    pub fn is_fixed(&self, variable: VariableId) -> bool {
        self.domains().is_fixed(variable)
    }

    /// The value of `variable` if its domain is a single value.
    pub fn value(&self, variable: VariableId) -> Option<i64> {
        self.domains().fixed_value(variable)
    }

    pub fn set_lower_bound(&mut self, variable: VariableId, value: i64) -> PropagationStatus {
        let event = self
            .domains
            .set_lower_bound(&mut self.stack, variable, value)?;
        self.record(event);
        Ok(())
    }

    pub fn set_upper_bound(&mut self, variable: VariableId, value: i64) -> PropagationStatus {
        let event = self
            .domains
            .set_upper_bound(&mut self.stack, variable, value)?;
        self.record(event);
        Ok(())
    }

    pub fn remove_value(&mut self, variable: VariableId, value: i64) -> PropagationStatus {
        let event = self.domains.remove_value(&mut self.stack, variable, value)?;
        self.record(event);
        Ok(())
    }

    pub fn assign(&mut self, variable: VariableId, value: i64) -> PropagationStatus {
        let event = self.domains.assign(&mut self.stack, variable, value)?;
        self.record(event);
        Ok(())
    }

    /// Replaces the domain of `variable`, which may widen it within the current frame.
    pub(crate) fn overwrite(&mut self, variable: VariableId, domain: &VariableSolution) {
        let event = self.domains.overwrite(&mut self.stack, variable, domain);
        self.record(event);
    }

    /// Posts `constraint`; its arcs run in the next propagation pass.
    ///
    /// Constraints posted with `keep_after_reset` survive [`ConstraintStore::reset`]. Posting a
    /// constraint which is already violated by the root domains makes the store infeasible.
    pub fn add_constraint(
        &mut self,
        constraint: impl Constraint + 'static,
        keep_after_reset: bool,
    ) -> Result<ConstraintId, SolverError> {
        self.check_at_root()?;

        let name = constraint.name().to_owned();
        if self.infeasible {
            return Err(SolverError::Infeasible(
                PropagationFailure::new().detected_by(name),
            ));
        }

        let arcs = constraint.arcs()?;
        let truth = constraint.truth(&self.domains.view(&self.stack));
        let arcs = arcs
            .into_iter()
            .map(|arc| self.graph.add_arc(arc))
            .collect::<Vec<_>>();
        debug!("Posted '{name}' with {} arc(s)", arcs.len());

        let id = self.constraints.push(Some(PostedConstraint {
            constraint: Box::new(constraint),
            arcs,
            keep_after_reset,
        }));
        let index = self.stack.entry_mut(&self.truths).append(truth);
        trellis_assert_eq_simple!(index, id.index());

        if truth == Truth::False {
            self.infeasible = true;
            return Err(SolverError::Infeasible(
                PropagationFailure::new().detected_by(name),
            ));
        }

        Ok(id)
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.iter().filter(|posted| posted.is_some()).count()
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&dyn Constraint> {
        self.constraints
            .get(id)
            .and_then(Option::as_ref)
            .map(|posted| posted.constraint.as_ref())
    }

    /// The truth of the constraint under the current domains. A decided truth is cached until the
    /// stack pops past the current frame.
    pub fn truth(&mut self, id: ConstraintId) -> Truth {
        let Some(Some(posted)) = self.constraints.get(id) else {
            return Truth::Undetermined;
        };

        let cached = self
            .stack
            .entry(&self.truths)
            .get(id.index())
            .copied()
            .unwrap_or_default();
        if cached.is_determined() {
            return cached;
        }

        let truth = posted
            .constraint
            .truth(&self.domains.view(&self.stack));
        if truth.is_determined() {
            self.stack.entry_mut(&self.truths).set(id.index(), truth);
        }
        truth
    }

    /// Runs the arcs until a fixpoint. A failure at the root makes the store infeasible.
    pub fn propagate(&mut self) -> PropagationStatus {
        if self.infeasible {
            return Err(PropagationFailure::new().detected_by("infeasible root"));
        }

        let result = self.graph.propagate(&mut self.stack, &self.domains);
        if result.is_err() && self.stack.depth() == 0 {
            info!("The problem is infeasible at the root");
            self.infeasible = true;
        }
        result
    }

    pub fn is_infeasible(&self) -> bool {
        self.infeasible
    }

    /// Records a failure which happened at the root outside of propagation.
    pub(crate) fn mark_infeasible(&mut self) {
        self.graph.clear_pending();
        self.infeasible = true;
    }

    /// Captures the domains of the variables in `scope`.
    pub fn capture(&self, scope: impl IntoIterator<Item = VariableId>) -> SolverSolution {
        let mut solution = SolverSolution::new();
        for variable in scope {
            solution.insert(variable, self.domains.capture(&self.stack, variable));
        }
        solution
    }

    pub fn capture_all(&self) -> SolverSolution {
        self.capture(self.variables())
    }

    /// Narrows the domains to the captured ones and propagates.
    ///
    /// Narrowing only: a captured domain wider than the current one does not widen it.
    pub fn restore(&mut self, solution: &SolverSolution) -> PropagationStatus {
        let result = self.narrow(solution);
        if result.is_err() {
            self.graph.clear_pending();
            return result;
        }
        self.propagate()
    }

    /// Narrows the domains to the captured ones without propagating.
    pub(crate) fn narrow(&mut self, solution: &SolverSolution) -> PropagationStatus {
        for (variable, domain) in solution.iter() {
            if variable.index() >= self.num_variables() {
                continue;
            }
            self.set_lower_bound(variable, domain.min)?;
            self.set_upper_bound(variable, domain.max)?;
            for &hole in &domain.holes {
                self.remove_value(variable, hole)?;
            }
        }
        Ok(())
    }

    /// Returns to the root, removes the constraints which were not posted with
    /// `keep_after_reset`, and restores the declared domains of all variables.
    pub fn reset(&mut self) -> Result<(), IllegalStateError> {
        self.stack.pop_to(0)?;
        self.graph.clear_pending();
        self.graph.forget_saved();

        for id in self.constraints.keys() {
            let keep = self.constraints[id]
                .as_ref()
                .is_some_and(|posted| posted.keep_after_reset);
            if keep {
                continue;
            }
            if let Some(posted) = self.constraints[id].take() {
                for arc in posted.arcs {
                    self.graph.remove_arc(arc);
                }
            }
        }

        self.domains.restore_initial(&mut self.stack);
        let truths = self.stack.entry_mut(&self.truths);
        for index in 0..truths.len() {
            truths.set(index, Truth::Undetermined);
        }
        self.infeasible = false;
        self.graph.schedule_all();

        debug!("Reset the store; {} constraint(s) kept", self.num_constraints());
        Ok(())
    }

    /// Removes every variable and constraint.
    pub fn clear(&mut self) {
        *self = ConstraintStore::new(self.queue_order);
    }

    pub fn statistics(&self) -> PropagationStatistics {
        self.graph.statistics()
    }

    fn record(&mut self, event: Option<DomainEvent>) {
        if let Some(event) = event {
            self.graph.notify(event);
        }
    }

    fn check_at_root(&self) -> Result<(), IllegalStateError> {
        if self.stack.depth() == 0 {
            Ok(())
        } else {
            Err(IllegalStateError::NotAtRoot {
                depth: self.stack.depth(),
            })
        }
    }
}
