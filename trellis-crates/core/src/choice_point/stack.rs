use std::fmt::Debug;
use std::fmt::Formatter;
use std::marker::PhantomData;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use log::trace;

use super::ChoicePointEntry;
use super::EntryDelta;
use super::EntryId;
use crate::basic_types::IllegalStateError;
use crate::containers::KeyedVec;

static NEXT_STACK_ID: AtomicU32 = AtomicU32::new(0);

/// The moments at which the listeners of a [`ChoicePointStack`] are notified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StackEvent {
    BeforePush,
    AfterPush,
    BeforePop,
    AfterPop,
}

/// A callback invoked by the [`ChoicePointStack`] around every push and pop, e.g. to
/// resynchronise caches derived from registered entries.
///
/// The depth passed along is the depth of the stack at the moment of the event.
pub trait StackListener {
    fn on_event(&mut self, event: StackEvent, depth: usize);
}

impl<F: FnMut(StackEvent, usize)> StackListener for F {
    fn on_event(&mut self, event: StackEvent, depth: usize) {
        self(event, depth)
    }
}

/// A typed reference to an entry registered with a [`ChoicePointStack`].
///
/// The handle is consumed by [`ChoicePointStack::close`], after which the entry can no longer be
/// reached.
pub struct EntryHandle<E> {
    id: EntryId,
    entry: PhantomData<fn() -> E>,
}

impl<E> EntryHandle<E> {
    pub fn id(&self) -> EntryId {
        self.id
    }
}

impl<E> Debug for EntryHandle<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EntryHandle").field(&self.id).finish()
    }
}

/// The forward changes of one frame of a [`ChoicePointStack`], as returned by
/// [`ChoicePointStack::pop_delta`]; only entries which changed are part of the delta.
#[derive(Debug)]
pub struct StackDelta {
    stack: u32,
    changes: Vec<(EntryId, Box<dyn EntryDelta>)>,
}

impl StackDelta {
    /// Whether no entry changed in the frame.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The number of entries which changed.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    fn delta_of(&self, entry: EntryId) -> Option<&dyn EntryDelta> {
        self.changes
            .iter()
            .find(|(id, _)| *id == entry)
            .map(|(_, delta)| delta.as_ref())
    }
}

/// The transactional undo log shared by every reversible structure.
///
/// Entries are owned by the stack and reached through their [`EntryHandle`]. A push or pop is fanned
/// out to all entries in registration order. The stack itself never goes below depth 0; popping
/// there is an [`IllegalStateError`].
pub struct ChoicePointStack {
    id: u32,
    depth: usize,
    entries: KeyedVec<EntryId, Option<Box<dyn ChoicePointEntry>>>,
    listeners: Vec<Box<dyn StackListener>>,
}

impl Default for ChoicePointStack {
    fn default() -> Self {
        Self {
            id: NEXT_STACK_ID.fetch_add(1, Ordering::Relaxed),
            depth: 0,
            entries: KeyedVec::default(),
            listeners: vec![],
        }
    }
}

impl Debug for ChoicePointStack {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChoicePointStack")
            .field("id", &self.id)
            .field("depth", &self.depth)
            .field("entries", &self.entries)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ChoicePointStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of frames which are currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The number of entries which are currently registered.
    pub fn num_entries(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// Registers `entry`; it takes part in every push and pop from now on.
    pub fn register<E: ChoicePointEntry>(&mut self, entry: E) -> EntryHandle<E> {
        let id = self.entries.push(Some(Box::new(entry)));
        trace!("Registered entry {id} at depth {}", self.depth);

        EntryHandle {
            id,
            entry: PhantomData,
        }
    }

    pub fn entry<E: ChoicePointEntry>(&self, handle: &EntryHandle<E>) -> &E {
        self.entries[handle.id]
            .as_deref()
            .and_then(|entry| entry.downcast_ref::<E>())
            .expect("handles can only refer to registered entries of their own type")
    }

    pub fn entry_mut<E: ChoicePointEntry>(&mut self, handle: &EntryHandle<E>) -> &mut E {
        self.entries[handle.id]
            .as_deref_mut()
            .and_then(|entry| entry.downcast_mut::<E>())
            .expect("handles can only refer to registered entries of their own type")
    }

    /// Deregisters the entry and hands it back.
    ///
    /// An entry can only be closed once all of its frames have been popped; if it still has open
    /// frames it stays registered and keeps taking part in pushes and pops.
    pub fn close<E: ChoicePointEntry>(
        &mut self,
        handle: EntryHandle<E>,
    ) -> Result<E, IllegalStateError> {
        let slot = self
            .entries
            .get_mut(handle.id)
            .ok_or(IllegalStateError::UnknownEntry(handle.id))?;

        let open_frames = slot
            .as_ref()
            .ok_or(IllegalStateError::UnknownEntry(handle.id))?
            .open_frames();
        if open_frames > 0 {
            return Err(IllegalStateError::EntryHasOpenFrames {
                entry: handle.id,
                open_frames,
            });
        }

        let entry = slot
            .take()
            .ok_or(IllegalStateError::UnknownEntry(handle.id))?;
        trace!("Closed entry {}", handle.id);

        entry
            .downcast::<E>()
            .map(|entry| *entry)
            .map_err(|_| IllegalStateError::UnknownEntry(handle.id))
    }

    pub fn add_listener(&mut self, listener: impl StackListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Opens a frame in every registered entry.
    pub fn push(&mut self) {
        self.notify(StackEvent::BeforePush);
        for entry in self.entries.iter_mut().flatten() {
            entry.push();
        }
        self.depth += 1;
        trace!("Pushed to depth {}", self.depth);
        self.notify(StackEvent::AfterPush);
    }

    /// Restores every registered entry to its state at the matching [`ChoicePointStack::push`].
    pub fn pop(&mut self) -> Result<(), IllegalStateError> {
        if self.depth == 0 {
            return Err(IllegalStateError::PopWithoutPush);
        }

        self.notify(StackEvent::BeforePop);
        for entry in self.entries.iter_mut().flatten() {
            entry.pop();
        }
        self.depth -= 1;
        trace!("Popped to depth {}", self.depth);
        self.notify(StackEvent::AfterPop);

        Ok(())
    }

    /// Pops frames until the stack is at `depth`; does nothing if it is already at or below it.
    pub fn pop_to(&mut self, depth: usize) -> Result<(), IllegalStateError> {
        while self.depth > depth {
            self.pop()?;
        }
        Ok(())
    }

    /// Pops the innermost frame like [`ChoicePointStack::pop`], and returns the changes that were
    /// made inside it so they can be re-applied elsewhere with [`ChoicePointStack::push_delta`].
    pub fn pop_delta(&mut self) -> Result<StackDelta, IllegalStateError> {
        if self.depth == 0 {
            return Err(IllegalStateError::PopWithoutPush);
        }

        self.notify(StackEvent::BeforePop);
        let mut changes = vec![];
        for id in self.entries.keys() {
            if let Some(entry) = self.entries[id].as_mut() {
                if let Some(delta) = entry.pop_delta() {
                    changes.push((id, delta));
                }
            }
        }
        self.depth -= 1;
        trace!(
            "Popped to depth {} with {} changed entries",
            self.depth,
            changes.len()
        );
        self.notify(StackEvent::AfterPop);

        Ok(StackDelta {
            stack: self.id,
            changes,
        })
    }

    /// Opens a frame and re-applies `delta` in it. An empty delta results in a frame without
    /// changes.
    pub fn push_delta(&mut self, delta: &StackDelta) -> Result<(), IllegalStateError> {
        if delta.stack != self.id {
            return Err(IllegalStateError::ForeignDelta);
        }
        if let Some((id, _)) = delta
            .changes
            .iter()
            .find(|(id, _)| !matches!(self.entries.get(*id), Some(Some(_))))
        {
            return Err(IllegalStateError::UnknownEntry(*id));
        }

        self.notify(StackEvent::BeforePush);
        for id in self.entries.keys() {
            if let Some(entry) = self.entries[id].as_mut() {
                entry.push_delta(delta.delta_of(id));
            }
        }
        self.depth += 1;
        trace!(
            "Pushed to depth {} re-applying {} changed entries",
            self.depth,
            delta.len()
        );
        self.notify(StackEvent::AfterPush);

        Ok(())
    }

    fn notify(&mut self, event: StackEvent) {
        let depth = self.depth;
        for listener in self.listeners.iter_mut() {
            listener.on_event(event, depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use proptest::prelude::*;

    use super::*;
    use crate::choice_point::DataMap;
    use crate::choice_point::NumArraySet;
    use crate::choice_point::ReversibleArray;

    #[test]
    fn pop_at_root_is_an_error() {
        let mut stack = ChoicePointStack::new();

        assert_eq!(Err(IllegalStateError::PopWithoutPush), stack.pop());
        assert!(matches!(
            stack.pop_delta(),
            Err(IllegalStateError::PopWithoutPush)
        ));
    }

    #[test]
    fn push_and_pop_reach_every_entry() {
        let mut stack = ChoicePointStack::new();
        let map = stack.register(DataMap::<u32, u32>::new());
        let array = stack.register(ReversibleArray::new(vec![0]));

        stack.push();
        let _ = stack.entry_mut(&map).insert(1, 1);
        stack.entry_mut(&array).set(0, 7);
        assert_eq!(1, stack.entry(&map).open_frames());

        stack.pop().unwrap();
        assert!(stack.entry(&map).is_empty());
        assert_eq!(Some(&0), stack.entry(&array).get(0));
        assert_eq!(0, stack.depth());
    }

    #[test]
    fn entry_registered_mid_search_resets_when_popped_past_its_registration() {
        let mut stack = ChoicePointStack::new();
        stack.push();
        let map = stack.register(DataMap::<u32, u32>::new());
        let _ = stack.entry_mut(&map).insert(1, 1);

        stack.pop().unwrap();

        assert!(stack.entry(&map).is_empty());
    }

    #[test]
    fn closing_requires_all_frames_to_be_popped() {
        let mut stack = ChoicePointStack::new();
        let map = stack.register(DataMap::<u32, u32>::new());
        let id = map.id();
        stack.push();

        let error = stack.close(map).unwrap_err();
        assert_eq!(
            IllegalStateError::EntryHasOpenFrames {
                entry: id,
                open_frames: 1
            },
            error
        );
        assert_eq!(1, stack.num_entries());

        stack.pop().unwrap();
        let map = EntryHandle::<DataMap<u32, u32>> {
            id,
            entry: PhantomData,
        };
        assert!(stack.close(map).is_ok());
        assert_eq!(0, stack.num_entries());
    }

    #[test]
    fn listeners_are_notified_in_registration_order() {
        let events = Rc::new(RefCell::new(vec![]));
        let mut stack = ChoicePointStack::new();
        for name in ["first", "second"] {
            let events = Rc::clone(&events);
            stack.add_listener(move |event: StackEvent, depth: usize| {
                events.borrow_mut().push((name, event, depth))
            });
        }

        stack.push();
        stack.pop().unwrap();

        assert_eq!(
            vec![
                ("first", StackEvent::BeforePush, 0),
                ("second", StackEvent::BeforePush, 0),
                ("first", StackEvent::AfterPush, 1),
                ("second", StackEvent::AfterPush, 1),
                ("first", StackEvent::BeforePop, 1),
                ("second", StackEvent::BeforePop, 1),
                ("first", StackEvent::AfterPop, 0),
                ("second", StackEvent::AfterPop, 0),
            ],
            *events.borrow()
        );
    }

    #[test]
    fn delta_moves_a_frame_to_a_sibling() {
        let mut stack = ChoicePointStack::new();
        let numbers = stack.register(NumArraySet::<i64>::new());
        let unchanged = stack.register(DataMap::<u32, u32>::new());
        let array = stack.entry_mut(&numbers).create_array(2);
        let _ = stack.entry_mut(&numbers).append_row(array, &[0, 10]);

        stack.push();
        stack.entry_mut(&numbers).set(array, 0, 0, 4);
        let delta = stack.pop_delta().unwrap();
        assert_eq!(1, delta.len());
        assert_eq!(0, stack.entry(&numbers).get(array, 0, 0));

        stack.push_delta(&delta).unwrap();
        assert_eq!(1, stack.depth());
        assert_eq!(4, stack.entry(&numbers).get(array, 0, 0));
        assert_eq!(1, stack.entry(&unchanged).open_frames());

        stack.pop().unwrap();
        assert_eq!(0, stack.entry(&numbers).get(array, 0, 0));
    }

    #[test]
    fn empty_delta_still_advances_depth() {
        let mut stack = ChoicePointStack::new();
        stack.push();
        let delta = stack.pop_delta().unwrap();
        assert!(delta.is_empty());

        stack.push_delta(&delta).unwrap();

        assert_eq!(1, stack.depth());
    }

    #[test]
    fn delta_of_another_stack_is_rejected() {
        let mut first = ChoicePointStack::new();
        let mut second = ChoicePointStack::new();
        first.push();
        let delta = first.pop_delta().unwrap();

        assert_eq!(Err(IllegalStateError::ForeignDelta), second.push_delta(&delta));
        assert_eq!(0, second.depth());
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Insert(u8, i32),
        Remove(u8),
        Append(i64),
        Set(i64),
    }

    fn operation() -> impl Strategy<Value = Operation> {
        prop_oneof![
            (any::<u8>(), any::<i32>()).prop_map(|(key, value)| Operation::Insert(key, value)),
            any::<u8>().prop_map(Operation::Remove),
            any::<i64>().prop_map(Operation::Append),
            any::<i64>().prop_map(Operation::Set),
        ]
    }

    proptest! {
        #[test]
        fn n_pushes_followed_by_n_pops_restore_the_observable_state(
            setup in prop::collection::vec(operation(), 0..20),
            frames in prop::collection::vec(prop::collection::vec(operation(), 0..10), 0..6),
        ) {
            let mut stack = ChoicePointStack::new();
            let map = stack.register(DataMap::<u8, i32>::new());
            let numbers = stack.register(NumArraySet::<i64>::new());
            let array = stack.entry_mut(&numbers).create_array(1);

            let apply = |stack: &mut ChoicePointStack, operation: &Operation| match operation {
                Operation::Insert(key, value) => {
                    let _ = stack.entry_mut(&map).insert(*key, *value);
                }
                Operation::Remove(key) => {
                    let _ = stack.entry_mut(&map).remove(key);
                }
                Operation::Append(value) => {
                    let _ = stack.entry_mut(&numbers).append_row(array, &[*value]);
                }
                Operation::Set(value) => {
                    if stack.entry(&numbers).num_rows(array) > 0 {
                        stack.entry_mut(&numbers).set(array, 0, 0, *value);
                    }
                }
            };

            for operation in setup.iter() {
                apply(&mut stack, operation);
            }

            let observe = |stack: &ChoicePointStack| {
                let mut pairs = stack
                    .entry(&map)
                    .iter()
                    .map(|(key, value)| (*key, *value))
                    .collect::<Vec<_>>();
                pairs.sort_unstable();
                let entries = stack.entry(&numbers);
                let rows = (0..entries.num_rows(array))
                    .map(|row| entries.get(array, row, 0))
                    .collect::<Vec<_>>();
                (pairs, rows)
            };
            let before = observe(&stack);

            for frame in frames.iter() {
                stack.push();
                for operation in frame.iter() {
                    apply(&mut stack, operation);
                }
            }
            for _ in frames.iter() {
                stack.pop().unwrap();
            }

            prop_assert_eq!(before, observe(&stack));
            prop_assert_eq!(0, stack.depth());
        }
    }
}
