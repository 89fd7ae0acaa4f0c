use std::fmt::Debug;
use std::hash::Hash;

use log::warn;

use super::ChoicePointEntry;
use super::EntryDelta;
use crate::basic_types::UndoLog;
use crate::containers::HashMap;
use crate::trellis_assert_simple;

/// A reversible key-value map.
///
/// Changes are only recorded while a frame is open; changes made without an open frame are
/// permanent.
#[derive(Debug)]
pub struct DataMap<K, V> {
    values: HashMap<K, V>,
    log: UndoLog<DataMapChange<K, V>>,
}

#[derive(Clone, Debug)]
struct DataMapChange<K, V> {
    key: K,
    old: Option<V>,
    new: Option<V>,
}

/// The forward changes of one frame of a [`DataMap`], in the order in which they were made.
#[derive(Debug)]
struct DataMapDelta<K, V> {
    changes: Vec<(K, Option<V>)>,
}

impl<K: Debug + 'static, V: Debug + 'static> EntryDelta for DataMapDelta<K, V> {}

impl<K, V> Default for DataMap<K, V> {
    fn default() -> Self {
        Self {
            values: HashMap::default(),
            log: UndoLog::default(),
        }
    }
}

impl<K, V> DataMap<K, V>
where
    K: Hash + Eq + Clone + Debug + 'static,
    V: Clone + Debug + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.values.iter()
    }

    /// Associates `value` with `key`, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let old = self.values.insert(key.clone(), value.clone());
        if self.is_recording() {
            self.log.record(DataMapChange {
                key,
                old: old.clone(),
                new: Some(value),
            });
        }
        old
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let old = self.values.remove(key);
        if old.is_some() && self.is_recording() {
            self.log.record(DataMapChange {
                key: key.clone(),
                old: old.clone(),
                new: None,
            });
        }
        old
    }

    fn is_recording(&self) -> bool {
        self.log.is_recording()
    }

    /// Undoes the changes of the innermost frame, passing each undone change to `on_undo` in the
    /// order in which they are undone.
    fn undo_frame(&mut self, mut on_undo: impl FnMut(DataMapChange<K, V>)) {
        let values = &mut self.values;
        let Some(changes) = self.log.close_frame() else {
            warn!("Popping a data map without an open frame, resetting it");
            values.clear();
            return;
        };

        for change in changes {
            match &change.old {
                Some(old) => {
                    let _ = values.insert(change.key.clone(), old.clone());
                }
                None => {
                    let _ = values.remove(&change.key);
                }
            }
            on_undo(change);
        }
    }
}

impl<K, V> ChoicePointEntry for DataMap<K, V>
where
    K: Hash + Eq + Clone + Debug + 'static,
    V: Clone + Debug + 'static,
{
    fn push(&mut self) {
        self.log.open_frame();
    }

    fn pop(&mut self) {
        self.undo_frame(|_| {});
    }

    fn pop_delta(&mut self) -> Option<Box<dyn EntryDelta>> {
        let mut changes = vec![];
        self.undo_frame(|change| changes.push((change.key, change.new)));
        changes.reverse();

        if changes.is_empty() {
            None
        } else {
            Some(Box::new(DataMapDelta { changes }))
        }
    }

    fn push_delta(&mut self, delta: Option<&dyn EntryDelta>) {
        self.push();

        let Some(delta) = delta else {
            return;
        };
        let delta = delta.downcast_ref::<DataMapDelta<K, V>>();
        trellis_assert_simple!(delta.is_some(), "A data map can only apply its own deltas");

        for (key, value) in delta.into_iter().flat_map(|delta| delta.changes.iter()) {
            let _ = match value {
                Some(value) => self.insert(key.clone(), value.clone()),
                None => self.remove(key),
            };
        }
    }

    fn open_frames(&self) -> usize {
        self.log.num_frames()
    }
}
