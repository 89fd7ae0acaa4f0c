use std::collections::VecDeque;

use super::DomainEvent;
use super::VariableId;
use crate::containers::KeyedVec;
use crate::propagation::ChangeType;
use crate::propagation::DomainDelta;

/// The order in which variables with pending changes are processed during propagation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QueueOrder {
    /// The variable which changed first is processed first.
    #[default]
    Fifo,
    /// The variable which changed last is processed first.
    Lifo,
}

/// The changes of a variable which have not been processed yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PendingChange {
    /// The most severe change since the variable was last processed.
    pub(crate) change: ChangeType,
    pub(crate) delta: DomainDelta,
}

/// Holds the variables whose domains changed since their dependent arcs last ran.
///
/// A variable is queued at most once; further changes are merged into its pending entry.
#[derive(Debug, Default)]
pub(crate) struct ChangeQueue {
    order: QueueOrder,
    queue: VecDeque<VariableId>,
    pending: KeyedVec<VariableId, Option<PendingChange>>,
}

impl ChangeQueue {
    pub(crate) fn new(order: QueueOrder) -> Self {
        ChangeQueue {
            order,
            ..Default::default()
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn record(&mut self, event: DomainEvent) {
        self.pending.accomodate(event.variable, None);

        if let Some(pending) = self.pending[event.variable].as_mut() {
            pending.change = pending.change.max(event.change);
            pending.delta.removed.extend(event.removed);
        } else {
            self.pending[event.variable] = Some(PendingChange {
                change: event.change,
                delta: DomainDelta {
                    old_min: event.old_min,
                    old_max: event.old_max,
                    removed: event.removed.into_iter().collect(),
                },
            });
            self.queue.push_back(event.variable);
        }
    }

    pub(crate) fn pop(&mut self) -> Option<(VariableId, PendingChange)> {
        let variable = match self.order {
            QueueOrder::Fifo => self.queue.pop_front(),
            QueueOrder::Lifo => self.queue.pop_back(),
        }?;

        self.pending[variable]
            .take()
            .map(|pending| (variable, pending))
    }

    pub(crate) fn clear(&mut self) {
        for variable in self.queue.drain(..) {
            self.pending[variable] = None;
        }
    }

    /// The pending changes in queue order.
    pub(crate) fn snapshot(&self) -> Vec<(VariableId, PendingChange)> {
        self.queue
            .iter()
            .filter_map(|&variable| {
                self.pending[variable]
                    .clone()
                    .map(|pending| (variable, pending))
            })
            .collect()
    }

    /// Replaces the pending changes with a snapshot taken earlier.
    pub(crate) fn restore(&mut self, snapshot: Vec<(VariableId, PendingChange)>) {
        self.clear();
        for (variable, pending) in snapshot {
            self.pending.accomodate(variable, None);
            self.pending[variable] = Some(pending);
            self.queue.push_back(variable);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;

    fn event(variable: usize, change: ChangeType, removed: Option<i64>) -> DomainEvent {
        DomainEvent {
            variable: VariableId::create_from_index(variable),
            change,
            old_min: 0,
            old_max: 10,
            removed,
        }
    }

    #[test]
    fn changes_of_one_variable_are_merged() {
        let mut queue = ChangeQueue::new(QueueOrder::Fifo);

        queue.record(event(0, ChangeType::Domain, Some(4)));
        queue.record(event(0, ChangeType::Range, None));
        queue.record(event(0, ChangeType::Domain, Some(6)));
        assert_eq!(1, queue.len());

        let (variable, pending) = queue.pop().unwrap();
        assert_eq!(VariableId::create_from_index(0), variable);
        assert_eq!(ChangeType::Range, pending.change);
        assert_eq!(vec![4, 6], pending.delta.removed);
        assert!(queue.is_empty());
    }

    #[test]
    fn order_determines_which_variable_comes_first() {
        let mut fifo = ChangeQueue::new(QueueOrder::Fifo);
        let mut lifo = ChangeQueue::new(QueueOrder::Lifo);
        for queue in [&mut fifo, &mut lifo] {
            queue.record(event(0, ChangeType::Value, None));
            queue.record(event(1, ChangeType::Value, None));
        }

        assert_eq!(VariableId::create_from_index(0), fifo.pop().unwrap().0);
        assert_eq!(VariableId::create_from_index(1), lifo.pop().unwrap().0);
    }

    #[test]
    fn restoring_a_snapshot_replaces_the_pending_changes() {
        let mut queue = ChangeQueue::new(QueueOrder::Fifo);
        queue.record(event(1, ChangeType::Range, None));
        queue.record(event(0, ChangeType::Domain, Some(5)));
        let snapshot = queue.snapshot();

        queue.record(event(3, ChangeType::Value, None));
        queue.restore(snapshot);

        assert_eq!(2, queue.len());
        assert_eq!(VariableId::create_from_index(1), queue.pop().unwrap().0);
        let (variable, pending) = queue.pop().unwrap();
        assert_eq!(VariableId::create_from_index(0), variable);
        assert_eq!(vec![5], pending.delta.removed);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn cleared_variables_can_be_queued_again() {
        let mut queue = ChangeQueue::new(QueueOrder::Fifo);
        queue.record(event(2, ChangeType::Range, None));

        queue.clear();
        assert!(queue.pop().is_none());

        queue.record(event(2, ChangeType::Domain, Some(3)));
        assert_eq!(ChangeType::Domain, queue.pop().unwrap().1.change);
    }
}
