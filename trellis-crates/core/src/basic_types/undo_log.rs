use std::iter::Rev;
use std::vec::Drain;

/// The changes made to a choice-point entry, grouped per open frame.
///
/// Changes are only recorded while at least one frame is open; outside of a frame there is nothing
/// to return to, so changes are permanent.
#[derive(Clone, Debug)]
pub(crate) struct UndoLog<T> {
    /// The position in `changes` at which every open frame starts, innermost last.
    frame_starts: Vec<usize>,
    changes: Vec<T>,
}

impl<T> Default for UndoLog<T> {
    fn default() -> Self {
        UndoLog {
            frame_starts: vec![],
            changes: vec![],
        }
    }
}

impl<T> UndoLog<T> {
    pub(crate) fn open_frame(&mut self) {
        self.frame_starts.push(self.changes.len());
    }

    pub(crate) fn num_frames(&self) -> usize {
        self.frame_starts.len()
    }

    pub(crate) fn is_recording(&self) -> bool {
        !self.frame_starts.is_empty()
    }

    pub(crate) fn record(&mut self, change: T) {
        if self.is_recording() {
            self.changes.push(change);
        }
    }

    /// Closes the innermost frame and yields its changes, most recent first, so that they can be
    /// undone in order. Returns [`None`] if no frame is open.
    pub(crate) fn close_frame(&mut self) -> Option<Rev<Drain<'_, T>>> {
        let start = self.frame_starts.pop()?;
        Some(self.changes.drain(start..).rev())
    }
}
