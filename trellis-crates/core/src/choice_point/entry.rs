use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;

use downcast_rs::impl_downcast;
use downcast_rs::Downcast;

use crate::containers::StorageKey;

/// The identity of an entry registered with a [`super::ChoicePointStack`]; identities are never
/// reused by the same stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    id: u32,
}

impl StorageKey for EntryId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        EntryId { id: index as u32 }
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.id)
    }
}

/// The forward changes made to a single entry within one frame, as returned by
/// [`ChoicePointEntry::pop_delta`].
pub trait EntryDelta: Downcast + Debug {}

impl_downcast!(EntryDelta);

/// A structure whose state can be saved and restored by a [`super::ChoicePointStack`].
///
/// An entry keeps its own nested frames: after `n` calls to [`ChoicePointEntry::push`] followed by
/// `n` calls to [`ChoicePointEntry::pop`] its observable state is identical to the state before
/// the pushes.
pub trait ChoicePointEntry: Downcast + Debug {
    /// Opens a frame; changes made from now on are undone by the matching pop.
    fn push(&mut self);

    /// Undoes every change made since the matching push.
    ///
    /// An entry without an open frame of its own (e.g. because it was registered while frames were
    /// open on the stack) resets to its empty or initial state.
    fn pop(&mut self);

    /// Like [`ChoicePointEntry::pop`], but returns the forward changes which were undone, or
    /// [`None`] if nothing changed in the frame.
    fn pop_delta(&mut self) -> Option<Box<dyn EntryDelta>>;

    /// Opens a frame and re-applies `delta`, which was produced by [`ChoicePointEntry::pop_delta`]
    /// on an entry of the same type. Opening a frame without a delta is equivalent to a push.
    fn push_delta(&mut self, delta: Option<&dyn EntryDelta>);

    /// The number of frames which are currently open in this entry.
    fn open_frames(&self) -> usize;
}

impl_downcast!(ChoicePointEntry);
