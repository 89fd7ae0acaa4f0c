use std::collections::VecDeque;

use enum_map::EnumMap;
use log::debug;
use log::trace;

use super::ChangeQueue;
use super::DomainEvent;
use super::Domains;
use super::PendingChange;
use super::QueueOrder;
use super::VariableId;
use crate::basic_types::PropagationStatus;
use crate::choice_point::ChoicePointStack;
use crate::containers::KeyedVec;
use crate::create_statistics_struct;
use crate::propagation::Arc;
use crate::propagation::ArcId;
use crate::propagation::ChangeType;
use crate::propagation::DomainDelta;
use crate::propagation::PropagationContext;
use crate::trellis_assert_advanced;

create_statistics_struct!(
    /// Statistics of the propagation engine.
    PropagationStatistics {
        /// The number of propagation passes.
        num_propagation_calls: u64,
        /// The number of times an arc ran.
        num_arc_executions: u64,
        /// The number of domain changes made by arcs.
        num_narrowings: u64,
        /// The number of propagation passes which ended with an empty domain.
        num_failures: u64,
});

/// The arc-consistency engine.
///
/// The graph owns every arc and an index from each variable to the arcs which depend on it, per
/// [`ChangeType`]. Changes to domains are collected in a [`ChangeQueue`]; propagation drains the
/// queue, running the arcs which depend on each changed variable, until the queue is empty.
#[derive(Debug)]
pub struct ConstraintGraph {
    arcs: KeyedVec<ArcId, Option<Box<dyn Arc>>>,
    /// For every variable, the arcs subscribed to changes of at least the given severity.
    dependencies: KeyedVec<VariableId, EnumMap<ChangeType, Vec<ArcId>>>,
    changes: ChangeQueue,
    /// Arcs which should run regardless of changes, e.g. because they were just added.
    scheduled: VecDeque<ArcId>,
    is_scheduled: KeyedVec<ArcId, bool>,
    /// The work that was pending when a frame was opened, with the depth before the push. Sorted
    /// by depth.
    saved: Vec<(usize, PendingWork)>,
    statistics: PropagationStatistics,
}

/// Changes and scheduled arcs which had not been propagated when a frame was opened.
#[derive(Debug)]
struct PendingWork {
    changes: Vec<(VariableId, PendingChange)>,
    scheduled: Vec<ArcId>,
}

impl ConstraintGraph {
    pub(crate) fn new(order: QueueOrder) -> Self {
        ConstraintGraph {
            arcs: KeyedVec::default(),
            dependencies: KeyedVec::default(),
            changes: ChangeQueue::new(order),
            scheduled: VecDeque::new(),
            is_scheduled: KeyedVec::default(),
            saved: vec![],
            statistics: PropagationStatistics::default(),
        }
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.iter().filter(|arc| arc.is_some()).count()
    }

    pub fn arc(&self, id: ArcId) -> Option<&dyn Arc> {
        self.arcs.get(id).and_then(|arc| arc.as_deref())
    }

    /// The arcs which run when `variable` changes with severity `change`.
    pub fn dependents(&self, variable: VariableId, change: ChangeType) -> Vec<ArcId> {
        self.dependencies
            .get(variable)
            .into_iter()
            .flat_map(|subscriptions| subscriptions.iter())
            .filter(|(trigger, _)| *trigger <= change)
            .flat_map(|(_, arcs)| arcs.iter().copied())
            .collect()
    }

    pub fn statistics(&self) -> PropagationStatistics {
        self.statistics
    }

    /// Whether there are changes or scheduled arcs which have not been propagated yet.
    pub fn has_pending(&self) -> bool {
        !self.changes.is_empty() || !self.scheduled.is_empty()
    }

    pub(crate) fn add_variable(&mut self, variable: VariableId) {
        self.dependencies.accomodate(variable, EnumMap::default());
    }

    /// Adds the arc and schedules it to run in the next propagation pass.
    pub(crate) fn add_arc(&mut self, arc: Box<dyn Arc>) -> ArcId {
        let trigger = arc.trigger();
        let sources = arc.sources().to_vec();
        let id = self.arcs.push(Some(arc));

        for source in sources {
            self.add_variable(source);
            self.dependencies[source][trigger].push(id);
        }
        self.schedule(id);

        id
    }

    pub(crate) fn remove_arc(&mut self, id: ArcId) {
        let Some(arc) = self.arcs.get_mut(id).and_then(Option::take) else {
            return;
        };

        for &source in arc.sources() {
            self.dependencies[source][arc.trigger()].retain(|&dependent| dependent != id);
        }
        if self.is_scheduled.get(id).copied().unwrap_or_default() {
            self.is_scheduled[id] = false;
            self.scheduled.retain(|&scheduled| scheduled != id);
        }
    }

    pub(crate) fn schedule(&mut self, id: ArcId) {
        self.is_scheduled.accomodate(id, false);
        if !self.is_scheduled[id] {
            self.is_scheduled[id] = true;
            self.scheduled.push_back(id);
        }
    }

    pub(crate) fn schedule_all(&mut self) {
        for id in self.arcs.keys() {
            if self.arcs[id].is_some() {
                self.schedule(id);
            }
        }
    }

    /// Records a change which was made outside of propagation.
    pub(crate) fn notify(&mut self, event: DomainEvent) {
        self.changes.record(event);
    }

    /// Forgets every pending change and scheduled arc.
    pub(crate) fn clear_pending(&mut self) {
        self.changes.clear();
        for id in self.scheduled.drain(..) {
            self.is_scheduled[id] = false;
        }
    }

    /// Remembers the pending work before a frame is opened at `depth`, so that it is not lost when
    /// that frame is popped.
    pub(crate) fn save_pending(&mut self, depth: usize) {
        // Entries at or above `depth` belong to frames which were popped outside of the store.
        let stale = self.saved.partition_point(|(saved, _)| *saved < depth);
        self.saved.truncate(stale);

        self.saved.push((
            depth,
            PendingWork {
                changes: self.changes.snapshot(),
                scheduled: self.scheduled.iter().copied().collect(),
            },
        ));
    }

    /// Reinstates the pending work saved when the frame at `depth` was opened, discarding the work
    /// of every frame above it. If that frame was opened without saving, nothing is pending.
    pub(crate) fn restore_pending(&mut self, depth: usize) {
        trellis_assert_advanced!(self.saved.windows(2).all(|pair| pair[0].0 < pair[1].0));
        let position = self.saved.partition_point(|(saved, _)| *saved < depth);
        let restored = self.saved.drain(position..).next();

        self.clear_pending();
        let Some((saved, work)) = restored else {
            return;
        };
        if saved != depth {
            return;
        }

        self.changes.restore(work.changes);
        for id in work.scheduled {
            self.schedule(id);
        }
    }

    /// Forgets the pending work of every open frame.
    pub(crate) fn forget_saved(&mut self) {
        self.saved.clear();
    }

    /// Runs arcs until no arc can narrow a domain any further, or until a domain becomes empty.
    ///
    /// On failure the pass is aborted immediately and every pending change is dropped; the domains
    /// are left partially narrowed and the caller is expected to pop the choice-point stack.
    pub(crate) fn propagate(
        &mut self,
        stack: &mut ChoicePointStack,
        domains: &Domains,
    ) -> PropagationStatus {
        self.statistics.num_propagation_calls += 1;

        let result = self.run_to_fixpoint(stack, domains);
        if let Err(failure) = &result {
            debug!("Propagation failed: {failure}");
            self.statistics.num_failures += 1;
            self.clear_pending();
        }

        result
    }

    fn run_to_fixpoint(
        &mut self,
        stack: &mut ChoicePointStack,
        domains: &Domains,
    ) -> PropagationStatus {
        loop {
            if let Some(id) = self.scheduled.pop_front() {
                self.is_scheduled[id] = false;
                self.run_arc(id, stack, domains, None)?;
                continue;
            }

            let Some((variable, pending)) = self.changes.pop() else {
                return Ok(());
            };

            for id in self.dependents(variable, pending.change) {
                self.run_arc(id, stack, domains, Some(&pending.delta))?;
            }
        }
    }

    fn run_arc(
        &mut self,
        id: ArcId,
        stack: &mut ChoicePointStack,
        domains: &Domains,
        delta: Option<&DomainDelta>,
    ) -> PropagationStatus {
        let Some(arc) = self.arcs[id].as_deref() else {
            return Ok(());
        };
        trace!("Running arc '{}' targeting {}", arc.name(), arc.target());

        let delta = delta.filter(|_| arc.uses_delta());
        let mut context = PropagationContext::new(stack, domains, &mut self.changes);
        let result = arc.propagate(&mut context, delta);

        self.statistics.num_arc_executions += 1;
        self.statistics.num_narrowings += context.num_narrowings();

        result.map_err(|failure| failure.detected_by(arc.name()))
    }
}
