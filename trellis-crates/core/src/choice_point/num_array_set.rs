use std::fmt::Debug;

use log::warn;

use super::ChoicePointEntry;
use super::EntryDelta;
use crate::basic_types::UndoLog;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::trellis_assert_moderate;
use crate::trellis_assert_simple;

/// The primitive element types which can be stored in a [`NumArraySet`].
pub trait NumElement: Copy + Debug + Default + PartialEq + 'static {}

impl NumElement for i32 {}
impl NumElement for i64 {}
impl NumElement for f32 {}
impl NumElement for f64 {}

/// Identifies one array of a [`NumArraySet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArrayId {
    id: u32,
}

impl StorageKey for ArrayId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        ArrayId { id: index as u32 }
    }
}

/// A growable array of rows with a fixed number of columns, stored row-major.
#[derive(Clone, Debug)]
struct NumArray<T> {
    columns: usize,
    rows: usize,
    /// Always holds `capacity * columns` elements; slots beyond `rows` are unused.
    data: Vec<T>,
}

impl<T: NumElement> NumArray<T> {
    fn capacity(&self) -> usize {
        self.data.len() / self.columns
    }

    fn position(&self, row: usize, column: usize) -> usize {
        trellis_assert_simple!(
            row < self.rows && column < self.columns,
            "Position ({row}, {column}) is outside of an array with {} rows and {} columns",
            self.rows,
            self.columns
        );
        row * self.columns + column
    }

    fn row(&self, row: usize) -> &[T] {
        let start = self.position(row, 0);
        &self.data[start..start + self.columns]
    }

    /// Makes room for at least `required` rows; grows with a quarter of headroom and never
    /// shrinks.
    fn reserve(&mut self, required: usize) {
        if required <= self.capacity() {
            return;
        }

        let new_capacity = required + required / 4 + 1;
        self.data.resize(new_capacity * self.columns, T::default());
    }

    fn insert_row(&mut self, row: usize, values: &[T]) {
        trellis_assert_simple!(values.len() == self.columns);
        trellis_assert_simple!(row <= self.rows);

        self.reserve(self.rows + 1);
        let start = row * self.columns;
        let end = self.rows * self.columns;
        self.data.copy_within(start..end, start + self.columns);
        self.data[start..start + self.columns].copy_from_slice(values);
        self.rows += 1;
    }

    fn remove_row(&mut self, row: usize) -> Vec<T> {
        let start = self.position(row, 0);
        let removed = self.data[start..start + self.columns].to_vec();

        let end = self.rows * self.columns;
        self.data.copy_within(start + self.columns..end, start);
        self.rows -= 1;
        removed
    }
}

#[derive(Clone, Debug)]
enum NumArrayChange<T> {
    Create {
        array: ArrayId,
        columns: usize,
    },
    Append {
        array: ArrayId,
        values: Vec<T>,
    },
    RemoveRow {
        array: ArrayId,
        row: usize,
        values: Vec<T>,
    },
    Set {
        array: ArrayId,
        row: usize,
        column: usize,
        old: T,
        new: T,
    },
}

/// The forward changes of one frame of a [`NumArraySet`].
#[derive(Debug)]
struct NumArraySetDelta<T> {
    changes: Vec<NumArrayChange<T>>,
}

impl<T: NumElement> EntryDelta for NumArraySetDelta<T> {}

/// A reversible set of growable primitive arrays, each with one or more columns.
///
/// Arrays grow with roughly 25% headroom when a row is appended to a full array and never release
/// capacity; removing a row shifts the rows after it down by one.
#[derive(Debug)]
pub struct NumArraySet<T> {
    arrays: KeyedVec<ArrayId, NumArray<T>>,
    log: UndoLog<NumArrayChange<T>>,
}

impl<T> Default for NumArraySet<T> {
    fn default() -> Self {
        Self {
            arrays: KeyedVec::default(),
            log: UndoLog::default(),
        }
    }
}

impl<T: NumElement> NumArraySet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty array in which every row has `columns` elements.
    pub fn create_array(&mut self, columns: usize) -> ArrayId {
        trellis_assert_simple!(columns > 0, "An array needs at least one column");

        let array = self.arrays.push(NumArray {
            columns,
            rows: 0,
            data: vec![],
        });
        self.log.record(NumArrayChange::Create { array, columns });
        array
    }

    pub fn num_arrays(&self) -> usize {
        self.arrays.len()
    }

    pub fn columns(&self, array: ArrayId) -> usize {
        self.arrays[array].columns
    }

    pub fn num_rows(&self, array: ArrayId) -> usize {
        self.arrays[array].rows
    }

    /// The number of rows the array can hold before it has to grow.
    pub fn capacity(&self, array: ArrayId) -> usize {
        self.arrays[array].capacity()
    }

    pub fn get(&self, array: ArrayId, row: usize, column: usize) -> T {
        let array = &self.arrays[array];
        array.data[array.position(row, column)]
    }

    pub fn row(&self, array: ArrayId, row: usize) -> &[T] {
        self.arrays[array].row(row)
    }

    pub fn set(&mut self, array: ArrayId, row: usize, column: usize, value: T) {
        let numbers = &mut self.arrays[array];
        let position = numbers.position(row, column);
        let old = numbers.data[position];
        if old == value {
            return;
        }

        numbers.data[position] = value;
        self.log.record(NumArrayChange::Set {
            array,
            row,
            column,
            old,
            new: value,
        });
    }

    /// Appends a row and returns its index.
    pub fn append_row(&mut self, array: ArrayId, values: &[T]) -> usize {
        let numbers = &mut self.arrays[array];
        let row = numbers.rows;
        numbers.insert_row(row, values);

        if self.log.is_recording() {
            self.log.record(NumArrayChange::Append {
                array,
                values: values.to_vec(),
            });
        }
        row
    }

    /// Removes a row; the rows after it shift down by one.
    pub fn remove_row(&mut self, array: ArrayId, row: usize) {
        let values = self.arrays[array].remove_row(row);
        self.log.record(NumArrayChange::RemoveRow { array, row, values });
    }

    fn apply(&mut self, change: &NumArrayChange<T>) {
        match change {
            NumArrayChange::Create { array, columns } => {
                let created = self.create_array(*columns);
                trellis_assert_moderate!(
                    created == *array,
                    "A delta can only be applied to the state it was taken from"
                );
            }
            NumArrayChange::Append { array, values } => {
                let _ = self.append_row(*array, values);
            }
            NumArrayChange::RemoveRow { array, row, .. } => self.remove_row(*array, *row),
            NumArrayChange::Set {
                array,
                row,
                column,
                new,
                ..
            } => self.set(*array, *row, *column, *new),
        }
    }

    fn undo_frame(&mut self, mut on_undo: impl FnMut(NumArrayChange<T>)) {
        let arrays = &mut self.arrays;
        let Some(changes) = self.log.close_frame() else {
            warn!("Popping a numeric array set without an open frame, resetting it");
            arrays.clear();
            return;
        };

        for change in changes {
            match &change {
                NumArrayChange::Create { array, .. } => {
                    trellis_assert_simple!(array.index() + 1 == arrays.len());
                    arrays.truncate(array.index());
                }
                NumArrayChange::Append { array, .. } => arrays[*array].rows -= 1,
                NumArrayChange::RemoveRow { array, row, values } => {
                    arrays[*array].insert_row(*row, values)
                }
                NumArrayChange::Set {
                    array,
                    row,
                    column,
                    old,
                    ..
                } => {
                    let numbers = &mut arrays[*array];
                    let position = numbers.position(*row, *column);
                    numbers.data[position] = *old;
                }
            }
            on_undo(change);
        }
    }
}

impl<T: NumElement> ChoicePointEntry for NumArraySet<T> {
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
            Some(Box::new(NumArraySetDelta { changes }))
        }
    }

    fn push_delta(&mut self, delta: Option<&dyn EntryDelta>) {
        self.push();

        let Some(delta) = delta else {
            return;
        };
        let delta = delta.downcast_ref::<NumArraySetDelta<T>>();
        trellis_assert_simple!(
            delta.is_some(),
            "A numeric array set can only apply its own deltas"
        );

        for change in delta.into_iter().flat_map(|delta| delta.changes.iter()) {
            self.apply(change);
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
    fn capacity_grows_with_headroom_and_never_shrinks() {
        let mut set = NumArraySet::<i32>::new();
        let array = set.create_array(1);
        assert_eq!(0, set.capacity(array));

        let _ = set.append_row(array, &[1]);
        assert_eq!(2, set.capacity(array));

        for value in 2..=8 {
            let _ = set.append_row(array, &[value]);
        }
        assert_eq!(8, set.num_rows(array));
        let capacity = set.capacity(array);
        assert!(capacity >= 8);

        for _ in 0..8 {
            set.remove_row(array, 0);
        }
        assert_eq!(0, set.num_rows(array));
        assert_eq!(capacity, set.capacity(array));
    }

    #[test]
    fn removal_shifts_trailing_rows_down() {
        let mut set = NumArraySet::<i64>::new();
        let array = set.create_array(2);
        let _ = set.append_row(array, &[1, 10]);
        let _ = set.append_row(array, &[2, 20]);
        let _ = set.append_row(array, &[3, 30]);

        set.remove_row(array, 1);

        assert_eq!(2, set.num_rows(array));
        assert_eq!(&[1, 10], set.row(array, 0));
        assert_eq!(&[3, 30], set.row(array, 1));
    }

    #[test]
    fn pop_restores_rows_and_values() {
        let mut set = NumArraySet::<f64>::new();
        let array = set.create_array(2);
        let _ = set.append_row(array, &[0.5, 1.5]);
        let _ = set.append_row(array, &[2.5, 3.5]);

        set.push();
        set.set(array, 0, 1, 9.0);
        set.remove_row(array, 0);
        let _ = set.append_row(array, &[4.5, 5.5]);
        let extra = set.create_array(1);
        let _ = set.append_row(extra, &[7.0]);
        set.pop();

        assert_eq!(1, set.num_arrays());
        assert_eq!(2, set.num_rows(array));
        assert_eq!(&[0.5, 1.5], set.row(array, 0));
        assert_eq!(&[2.5, 3.5], set.row(array, 1));
    }

    #[test]
    fn delta_is_reapplied_in_order() {
        let mut set = NumArraySet::<i32>::new();
        let array = set.create_array(1);
        let _ = set.append_row(array, &[1]);

        set.push();
        set.set(array, 0, 0, 4);
        let _ = set.append_row(array, &[5]);
        set.remove_row(array, 0);
        let delta = set.pop_delta();
        assert_eq!(1, set.num_rows(array));
        assert_eq!(1, set.get(array, 0, 0));

        set.push_delta(delta.as_deref());
        assert_eq!(1, set.num_rows(array));
        assert_eq!(5, set.get(array, 0, 0));
    }

    #[test]
    fn single_precision_columns_are_supported() {
        let mut set = NumArraySet::<f32>::new();
        let array = set.create_array(3);

        let row = set.append_row(array, &[1.0, 2.0, 3.0]);

        assert_eq!(0, row);
        assert_eq!(2.0, set.get(array, 0, 1));
    }
}
