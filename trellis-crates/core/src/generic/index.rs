use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::rc::Rc;

use crate::basic_types::GenericIndexError;
use crate::containers::HashMap;

#[derive(Debug)]
struct IndexInfo {
    name: String,
    size: usize,
}

/// A named dimension of fixed size.
///
/// Indices have identity: two indices are equal only if one is a clone of the other, even when
/// their names and sizes coincide. Expressions spanning the same logical dimension share the index
/// by cloning it.
#[derive(Clone)]
pub struct GenericIndex(Rc<IndexInfo>);

impl GenericIndex {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        GenericIndex(Rc::new(IndexInfo {
            name: name.into(),
            size,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn size(&self) -> usize {
        self.0.size
    }

    pub(crate) fn check(&self, coordinate: usize) -> Result<(), GenericIndexError> {
        if coordinate < self.size() {
            Ok(())
        } else {
            Err(GenericIndexError::CoordinateOutOfRange {
                index: self.name().to_owned(),
                coordinate,
                size: self.size(),
            })
        }
    }
}

impl PartialEq for GenericIndex {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for GenericIndex {}

impl Hash for GenericIndex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state)
    }
}

impl Debug for GenericIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name(), self.size())
    }
}

impl Display for GenericIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The current values of a set of [`GenericIndex`]es; an index without a value is unbound, which
/// means that all of its coordinates are of interest.
#[derive(Clone, Debug, Default)]
pub struct IndexBindings {
    values: HashMap<GenericIndex, usize>,
}

impl IndexBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, index: &GenericIndex, value: usize) -> Result<(), GenericIndexError> {
        index.check(value)?;
        let _ = self.values.insert(index.clone(), value);
        Ok(())
    }

    /// Returns these bindings extended with `index = value`.
    pub fn with(mut self, index: &GenericIndex, value: usize) -> Result<Self, GenericIndexError> {
        self.bind(index, value)?;
        Ok(self)
    }

    pub fn unbind(&mut self, index: &GenericIndex) {
        let _ = self.values.remove(index);
    }

    pub fn value(&self, index: &GenericIndex) -> Option<usize> {
        self.values.get(index).copied()
    }

    pub fn is_bound(&self, index: &GenericIndex) -> bool {
        self.values.contains_key(index)
    }

    /// The bound indices, in no particular order.
    pub fn indices(&self) -> impl Iterator<Item = &GenericIndex> + '_ {
        self.values.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_equal_by_identity() {
        let i = GenericIndex::new("i", 3);
        let same = i.clone();
        let lookalike = GenericIndex::new("i", 3);

        assert_eq!(i, same);
        assert_ne!(i, lookalike);
    }

    #[test]
    fn binding_out_of_range_is_rejected() {
        let i = GenericIndex::new("i", 3);
        let mut bindings = IndexBindings::new();

        assert_eq!(
            Err(GenericIndexError::CoordinateOutOfRange {
                index: "i".to_owned(),
                coordinate: 3,
                size: 3
            }),
            bindings.bind(&i, 3)
        );
        assert!(!bindings.is_bound(&i));

        bindings.bind(&i, 2).unwrap();
        assert_eq!(Some(2), bindings.value(&i));
        bindings.unbind(&i);
        assert_eq!(None, bindings.value(&i));
    }
}
