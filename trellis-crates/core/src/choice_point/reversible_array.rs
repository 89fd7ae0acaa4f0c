use std::fmt::Debug;
use std::ops::Index;

use log::warn;

use super::ChoicePointEntry;
use super::EntryDelta;
use crate::basic_types::UndoLog;
use crate::trellis_assert_simple;

#[derive(Clone, Debug)]
enum ArrayChange<T> {
    Set { index: usize, old: T, new: T },
    Push { value: T },
}

#[derive(Debug)]
struct ReversibleArrayDelta<T> {
    changes: Vec<ArrayChange<T>>,
}

impl<T: Debug + 'static> EntryDelta for ReversibleArrayDelta<T> {}

/// A reversible indexed vector.
///
/// When popped without an open frame of its own, the array returns to the contents it was created
/// with.
#[derive(Debug)]
pub struct ReversibleArray<T> {
    initial: Vec<T>,
    values: Vec<T>,
    log: UndoLog<ArrayChange<T>>,
}

impl<T: Clone> ReversibleArray<T> {
    pub fn new(initial: Vec<T>) -> Self {
        Self {
            values: initial.clone(),
            initial,
            log: UndoLog::default(),
        }
    }
}

impl<T: Clone> Default for ReversibleArray<T> {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl<T: Clone + Debug + 'static> ReversibleArray<T> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.values.iter()
    }

    pub fn set(&mut self, index: usize, value: T) {
        let old = std::mem::replace(&mut self.values[index], value.clone());
        self.log.record(ArrayChange::Set {
            index,
            old,
            new: value,
        });
    }

    /// Appends `value` and returns its index.
    pub fn append(&mut self, value: T) -> usize {
        self.values.push(value.clone());
        self.log.record(ArrayChange::Push { value });
        self.values.len() - 1
    }

    fn undo_frame(&mut self, mut on_undo: impl FnMut(ArrayChange<T>)) {
        let values = &mut self.values;
        let Some(changes) = self.log.close_frame() else {
            warn!("Popping a reversible array without an open frame, resetting it");
            *values = self.initial.clone();
            return;
        };

        for change in changes {
            match &change {
                ArrayChange::Set { index, old, .. } => values[*index] = old.clone(),
                ArrayChange::Push { .. } => {
                    let _ = values.pop();
                }
            }
            on_undo(change);
        }
    }
}

impl<T> Index<usize> for ReversibleArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl<T: Clone + Debug + 'static> ChoicePointEntry for ReversibleArray<T> {
    fn push(&mut self) {
        self.log.open_frame();
    }

    fn pop(&mut self) {
        self.undo_frame(|_| {});
    }

    fn pop_delta(&mut self) -> Option<Box<dyn EntryDelta>> {
        let mut changes = vec![];
        self.undo_frame(|change| changes.push(change));
        changes.reverse();

        if changes.is_empty() {
            None
        } else {
            Some(Box::new(ReversibleArrayDelta { changes }))
        }
    }

    fn push_delta(&mut self, delta: Option<&dyn EntryDelta>) {
        self.push();

        let Some(delta) = delta else {
            return;
        };
        let delta = delta.downcast_ref::<ReversibleArrayDelta<T>>();
        trellis_assert_simple!(
            delta.is_some(),
            "A reversible array can only apply its own deltas"
        );

        for change in delta.into_iter().flat_map(|delta| delta.changes.iter()) {
            match change {
                ArrayChange::Set { index, new, .. } => self.set(*index, new.clone()),
                ArrayChange::Push { value } => {
                    let _ = self.append(value.clone());
                }
            }
        }
    }

    fn open_frames(&self) -> usize {
        self.log.num_frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_frames_are_undone_one_at_a_time() {
        let mut array = ReversibleArray::new(vec![0, 0]);

        array.push();
        array.set(0, 1);
        array.push();
        array.set(1, 2);
        let _ = array.append(3);

        array.pop();
        assert_eq!(vec![1, 0], array.iter().copied().collect::<Vec<_>>());

        array.pop();
        assert_eq!(vec![0, 0], array.iter().copied().collect::<Vec<_>>());
    }

    #[test]
    fn pop_without_own_frame_returns_to_initial_contents() {
        let mut array = ReversibleArray::new(vec!['a']);
        let _ = array.append('b');

        array.pop();

        assert_eq!(1, array.len());
        assert_eq!('a', array[0]);
    }

    #[test]
    fn delta_replays_sets_and_pushes() {
        let mut array = ReversibleArray::new(vec![1]);

        array.push();
        array.set(0, 5);
        let _ = array.append(6);
        let delta = array.pop_delta();

        array.push_delta(delta.as_deref());
        assert_eq!(vec![5, 6], array.iter().copied().collect::<Vec<_>>());
    }
}
